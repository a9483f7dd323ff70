//! 顾问对话消息与已执行动作记录
//!
//! 持久化形状为 {id, role, content, actions?}：actions 只出现在至少执行了一个动作的 assistant 消息上，
//! 记录的是实际落库的结果，而不是模型输出里解析到的全部动作。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(ChatRole::User),
            "assistant" => Some(ChatRole::Assistant),
            _ => None,
        }
    }
}

/// 实际执行成功的动作（审计 / 前端展示用）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutedAction {
    ShortlistAdd {
        shortlist_id: String,
        name: String,
        country: String,
        category: String,
    },
    TodoAdd {
        todo_id: String,
        title: String,
        shortlist_id: Option<String>,
    },
    Lock {
        shortlist_id: String,
        /// 本次锁定生成的待办数；已锁定条目再次锁定时为 0
        checklist_created: usize,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    #[serde(skip_serializing)]
    pub user_id: String,
    pub role: ChatRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<ExecutedAction>>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(user_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: super::new_id(),
            user_id: user_id.into(),
            role: ChatRole::User,
            content: content.into(),
            actions: None,
            created_at: Utc::now(),
        }
    }

    /// assistant 消息；executed 为空时不附带 actions
    pub fn assistant(
        user_id: impl Into<String>,
        content: impl Into<String>,
        executed: Vec<ExecutedAction>,
    ) -> Self {
        Self {
            id: super::new_id(),
            user_id: user_id.into(),
            role: ChatRole::Assistant,
            content: content.into(),
            actions: if executed.is_empty() { None } else { Some(executed) },
            created_at: Utc::now(),
        }
    }
}
