//! 内存存储：进程内 RwLock 保护的表，用于测试与未配置数据库时
//!
//! apply 在持有写锁期间执行整批操作；单条操作不会失败，因此整批要么全部可见要么尚未开始，
//! 与 SQLite 实现的事务语义一致。

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{settle_reply, ApplyReport, CounsellorStore, Mutation, MutationOutcome, StoreError, StoreResult};
use crate::models::{ChatMessage, Profile, ShortlistEntry, Todo, User};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    profiles: Vec<Profile>,
    shortlists: Vec<ShortlistEntry>,
    todos: Vec<Todo>,
    messages: Vec<ChatMessage>,
}

impl Tables {
    fn owns_shortlist(&self, user_id: &str, shortlist_id: &str) -> bool {
        self.shortlists
            .iter()
            .any(|s| s.id == shortlist_id && s.user_id == user_id)
    }

    fn apply_one(&mut self, mutation: &Mutation, report: &mut ApplyReport) {
        let outcome = match mutation {
            Mutation::InsertShortlist(entry) => {
                self.shortlists.push(entry.clone());
                report.shortlist_inserted += 1;
                MutationOutcome::Applied
            }
            Mutation::InsertTodo(todo) => {
                let todo = self.verified(todo);
                let shortlist_id = todo.shortlist_id.clone();
                self.todos.push(todo);
                report.todos_inserted += 1;
                MutationOutcome::TodoInserted { shortlist_id }
            }
            Mutation::SetLock {
                user_id,
                shortlist_id,
                locked,
                checklist,
            } => {
                match self
                    .shortlists
                    .iter_mut()
                    .find(|s| &s.id == shortlist_id && &s.user_id == user_id)
                {
                    None => {
                        report.locks_skipped += 1;
                        MutationOutcome::LockSkipped
                    }
                    Some(entry) => {
                        let generate = *locked
                            && !entry.locked
                            && !entry.checklist_created
                            && !checklist.is_empty();
                        entry.locked = *locked;
                        if generate {
                            entry.checklist_created = true;
                            self.todos.extend(checklist.iter().cloned());
                            report.checklist_todos_created += checklist.len();
                        }
                        MutationOutcome::LockApplied {
                            checklist_created: if generate { checklist.len() } else { 0 },
                        }
                    }
                }
            }
            Mutation::UpdateTodo(todo) => {
                let todo = self.verified(todo);
                if let Some(slot) = self
                    .todos
                    .iter_mut()
                    .find(|t| t.id == todo.id && t.user_id == todo.user_id)
                {
                    *slot = todo;
                }
                MutationOutcome::Applied
            }
            Mutation::InsertMessage(msg) => {
                self.messages.push(msg.clone());
                report.messages_inserted += 1;
                MutationOutcome::Applied
            }
            Mutation::InsertReply { message, actions } => {
                let reply = settle_reply(message, actions, &report.outcomes);
                self.messages.push(reply.clone());
                report.messages_inserted += 1;
                report.reply = Some(reply);
                MutationOutcome::Applied
            }
        };
        report.outcomes.push(outcome);
    }

    /// 失效或越权的选校引用置空
    fn verified(&self, todo: &Todo) -> Todo {
        let mut todo = todo.clone();
        if let Some(sid) = &todo.shortlist_id {
            if !self.owns_shortlist(&todo.user_id, sid) {
                todo.shortlist_id = None;
            }
        }
        todo
    }
}

/// 内存存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounsellorStore for MemoryStore {
    async fn create_user(&self, user: &User) -> StoreResult<Profile> {
        let mut t = self.tables.write().await;
        if t.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("email {}", user.email)));
        }
        let profile = Profile::empty_for(&user.id);
        t.users.push(user.clone());
        t.profiles.push(profile.clone());
        Ok(profile)
    }

    async fn get_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn delete_user(&self, user_id: &str) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        let before = t.users.len();
        t.users.retain(|u| u.id != user_id);
        if t.users.len() == before {
            return Ok(false);
        }
        t.messages.retain(|m| m.user_id != user_id);
        t.todos.retain(|x| x.user_id != user_id);
        t.shortlists.retain(|s| s.user_id != user_id);
        t.profiles.retain(|p| p.user_id != user_id);
        Ok(true)
    }

    async fn get_profile(&self, user_id: &str) -> StoreResult<Option<Profile>> {
        let t = self.tables.read().await;
        Ok(t.profiles.iter().find(|p| p.user_id == user_id).cloned())
    }

    async fn save_profile(&self, profile: &Profile) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        match t.profiles.iter_mut().find(|p| p.user_id == profile.user_id) {
            Some(slot) => *slot = profile.clone(),
            None => t.profiles.push(profile.clone()),
        }
        Ok(())
    }

    async fn list_shortlist(&self, user_id: &str) -> StoreResult<Vec<ShortlistEntry>> {
        let t = self.tables.read().await;
        Ok(t.shortlists
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_shortlist_entry(
        &self,
        user_id: &str,
        shortlist_id: &str,
    ) -> StoreResult<Option<ShortlistEntry>> {
        let t = self.tables.read().await;
        Ok(t.shortlists
            .iter()
            .find(|s| s.id == shortlist_id && s.user_id == user_id)
            .cloned())
    }

    async fn delete_shortlist_entry(&self, user_id: &str, shortlist_id: &str) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        if !t.owns_shortlist(user_id, shortlist_id) {
            return Ok(false);
        }
        t.todos
            .retain(|x| !(x.user_id == user_id && x.shortlist_id.as_deref() == Some(shortlist_id)));
        t.shortlists
            .retain(|s| !(s.id == shortlist_id && s.user_id == user_id));
        Ok(true)
    }

    async fn list_todos(&self, user_id: &str) -> StoreResult<Vec<Todo>> {
        let t = self.tables.read().await;
        Ok(t.todos.iter().filter(|x| x.user_id == user_id).cloned().collect())
    }

    async fn get_todo(&self, user_id: &str, todo_id: &str) -> StoreResult<Option<Todo>> {
        let t = self.tables.read().await;
        Ok(t.todos
            .iter()
            .find(|x| x.id == todo_id && x.user_id == user_id)
            .cloned())
    }

    async fn delete_todo(&self, user_id: &str, todo_id: &str) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        let before = t.todos.len();
        t.todos.retain(|x| !(x.id == todo_id && x.user_id == user_id));
        Ok(t.todos.len() != before)
    }

    async fn recent_messages(&self, user_id: &str, limit: usize) -> StoreResult<Vec<ChatMessage>> {
        let t = self.tables.read().await;
        Ok(t.messages
            .iter()
            .rev()
            .filter(|m| m.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_messages(&self, user_id: &str) -> StoreResult<Vec<ChatMessage>> {
        let t = self.tables.read().await;
        Ok(t.messages
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn apply(&self, mutations: &[Mutation]) -> StoreResult<ApplyReport> {
        let mut tables = self.tables.write().await;
        let mut report = ApplyReport::default();
        for mutation in mutations {
            tables.apply_one(mutation, &mut report);
        }
        Ok(report)
    }
}
