//! 领域模型：用户、画像、选校清单、待办、对话消息
//!
//! 所有实体都归属单个用户，不跨用户共享；持久化细节见 store 模块。

pub mod chat;
pub mod profile;
pub mod shortlist;
pub mod todo;
pub mod user;

pub use chat::{ChatMessage, ChatRole, ExecutedAction};
pub use profile::{ExamRecord, Profile, ProfileUpdate};
pub use shortlist::{ShortlistEntry, ShortlistRequest};
pub use todo::{Todo, TodoRequest, TodoUpdate};
pub use user::User;

/// 生成新的实体 ID（UUID v4 字符串）
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
