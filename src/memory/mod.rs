//! 记忆层：发给模型的对话窗口（长期记录由 store 持久化）

pub mod conversation;

pub use conversation::{ConversationWindow, Message, Role};
