//! 存储抽象层
//!
//! 定义统一的数据访问接口，支持内存和 SQLite 两种实现。
//! 写操作统一走 `apply`：一批有序的 Mutation 在单个事务内全部生效或全部不生效，
//! 一轮对话的用户消息、动作写入、助手消息就是一批。
//! 每条写操作都有一个提交结果；助手消息上的动作记录在同一事务内按这些结果结算。
//! 级联删除（删除选校条目 → 删除其待办）在这里显式完成，不依赖数据库外键级联。

pub mod memory;
pub mod sqlite;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ChatMessage, ExecutedAction, Profile, ShortlistEntry, Todo, User};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 唯一约束冲突（如邮箱已注册）
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 库中数据无法还原为模型（如时间戳格式损坏）
    #[error("Decode error: {0}")]
    Decode(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// 单条写操作；由 `CounsellorStore::apply` 按顺序在一个事务内执行
#[derive(Clone, Debug)]
pub enum Mutation {
    InsertShortlist(ShortlistEntry),
    /// 提交时再次校验 shortlist_id 归属，失效引用置空（与动作执行器的降级规则一致）
    InsertTodo(Todo),
    /// 锁定 / 解锁。仅当提交时条目仍未锁定且尚未生成过清单，才写入 checklist；
    /// 条目已不存在（被并发删除）则整条跳过
    SetLock {
        user_id: String,
        shortlist_id: String,
        locked: bool,
        checklist: Vec<Todo>,
    },
    UpdateTodo(Todo),
    InsertMessage(ChatMessage),
    /// 助手消息：`actions` 按本批中此前写操作的实际结果结算后写入 message.actions
    InsertReply {
        message: ChatMessage,
        actions: Vec<PendingAction>,
    },
}

/// 一条待结算的动作记录：`mutation` 为决定其结果的写操作在本批中的下标
#[derive(Clone, Debug, PartialEq)]
pub struct PendingAction {
    pub action: ExecutedAction,
    pub mutation: usize,
}

/// 单条写操作的提交结果，与 apply 的输入按下标一一对应
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied,
    /// 待办实际写入的选校引用（失效引用已置空）
    TodoInserted { shortlist_id: Option<String> },
    /// 锁定状态已写入；checklist_created 为本次实际生成的待办数
    LockApplied { checklist_created: usize },
    /// 目标条目在提交时已不存在
    LockSkipped,
}

/// apply 的执行结果
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ApplyReport {
    pub shortlist_inserted: usize,
    pub todos_inserted: usize,
    pub checklist_todos_created: usize,
    pub locks_skipped: usize,
    pub messages_inserted: usize,
    pub outcomes: Vec<MutationOutcome>,
    /// 本批写入的助手消息（actions 已结算）
    pub reply: Option<ChatMessage>,
}

/// 按已提交写操作的结果结算动作记录
///
/// 锁定被跳过的动作不出现在结果中；锁定的清单数与待办的选校引用取提交时的实际值。
pub fn settle_actions(pending: &[PendingAction], outcomes: &[MutationOutcome]) -> Vec<ExecutedAction> {
    pending
        .iter()
        .filter_map(|p| {
            let outcome = outcomes.get(p.mutation)?;
            match (&p.action, outcome) {
                (_, MutationOutcome::LockSkipped) => None,
                (ExecutedAction::Lock { shortlist_id, .. }, MutationOutcome::LockApplied { checklist_created }) => {
                    Some(ExecutedAction::Lock {
                        shortlist_id: shortlist_id.clone(),
                        checklist_created: *checklist_created,
                    })
                }
                (ExecutedAction::TodoAdd { todo_id, title, .. }, MutationOutcome::TodoInserted { shortlist_id }) => {
                    Some(ExecutedAction::TodoAdd {
                        todo_id: todo_id.clone(),
                        title: title.clone(),
                        shortlist_id: shortlist_id.clone(),
                    })
                }
                (action, _) => Some(action.clone()),
            }
        })
        .collect()
}

/// 结算助手消息的动作；没有动作时不附带 actions
pub(crate) fn settle_reply(
    message: &ChatMessage,
    pending: &[PendingAction],
    outcomes: &[MutationOutcome],
) -> ChatMessage {
    let executed = settle_actions(pending, outcomes);
    let mut message = message.clone();
    message.actions = (!executed.is_empty()).then_some(executed);
    message
}

/// 存储接口
#[async_trait]
pub trait CounsellorStore: Send + Sync {
    /// 创建用户并在同一事务中创建空画像；邮箱已存在返回 Conflict
    async fn create_user(&self, user: &User) -> StoreResult<Profile>;

    async fn get_user(&self, user_id: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// 删除用户及其全部数据；返回用户是否存在
    async fn delete_user(&self, user_id: &str) -> StoreResult<bool>;

    async fn get_profile(&self, user_id: &str) -> StoreResult<Option<Profile>>;

    /// 覆盖保存画像（按 user_id 定位）
    async fn save_profile(&self, profile: &Profile) -> StoreResult<()>;

    /// 用户的全部选校条目，按创建顺序
    async fn list_shortlist(&self, user_id: &str) -> StoreResult<Vec<ShortlistEntry>>;

    /// 按 ID 查询且必须属于该用户
    async fn get_shortlist_entry(
        &self,
        user_id: &str,
        shortlist_id: &str,
    ) -> StoreResult<Option<ShortlistEntry>>;

    /// 删除条目并显式清理关联待办；返回条目是否存在
    async fn delete_shortlist_entry(&self, user_id: &str, shortlist_id: &str) -> StoreResult<bool>;

    /// 用户的全部待办，按创建顺序
    async fn list_todos(&self, user_id: &str) -> StoreResult<Vec<Todo>>;

    async fn get_todo(&self, user_id: &str, todo_id: &str) -> StoreResult<Option<Todo>>;

    async fn delete_todo(&self, user_id: &str, todo_id: &str) -> StoreResult<bool>;

    /// 最近 limit 条消息，最新的在前
    async fn recent_messages(&self, user_id: &str, limit: usize) -> StoreResult<Vec<ChatMessage>>;

    /// 全部消息，按时间正序
    async fn list_messages(&self, user_id: &str) -> StoreResult<Vec<ChatMessage>>;

    /// 原子地按顺序执行一批写操作
    async fn apply(&self, mutations: &[Mutation]) -> StoreResult<ApplyReport>;
}

/// 创建存储
///
/// 提供 db_path 且能打开时使用 SQLite，否则回退到内存存储
pub async fn create_store(db_path: Option<&Path>) -> Arc<dyn CounsellorStore> {
    if let Some(path) = db_path {
        match SqliteStore::new(path).await {
            Ok(store) => {
                tracing::info!("Using SQLite store: {:?}", path);
                return Arc::new(store);
            }
            Err(e) => {
                tracing::warn!("Failed to open SQLite store, falling back to memory: {}", e);
            }
        }
    }

    tracing::info!("Using in-memory store");
    Arc::new(MemoryStore::new())
}
