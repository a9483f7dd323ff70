//! 短期记忆：发给模型的对话窗口
//!
//! 从存储中取最近 N 条对话（最新在前），翻转为时间正序，当前用户消息追加在末尾。

use serde::{Deserialize, Serialize};

use crate::models::{ChatMessage, ChatRole};

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
    System,
}

/// 单条消息
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

impl From<&ChatMessage> for Message {
    fn from(m: &ChatMessage) -> Self {
        match m.role {
            ChatRole::User => Message::user(m.content.clone()),
            ChatRole::Assistant => Message::assistant(m.content.clone()),
        }
    }
}

/// 对话窗口（时间正序）
#[derive(Clone, Debug, Default)]
pub struct ConversationWindow {
    messages: Vec<Message>,
}

impl ConversationWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由「最新在前」的存储记录构建；超出上限时丢弃最旧的部分
    pub fn from_newest_first(records: &[ChatMessage], max_messages: usize) -> Self {
        let mut window = Self::new();
        for record in records.iter().take(max_messages).rev() {
            window.messages.push(Message::from(record));
        }
        window
    }

    pub fn push(&mut self, msg: Message) {
        self.messages.push(msg);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_is_chronological_and_capped() {
        // 存储返回最新在前：m4, m3, m2, m1, m0
        let records: Vec<ChatMessage> = (0..5)
            .rev()
            .map(|i| {
                if i % 2 == 0 {
                    ChatMessage::user("u1", format!("m{i}"))
                } else {
                    ChatMessage::assistant("u1", format!("m{i}"), vec![])
                }
            })
            .collect();

        let mut window = ConversationWindow::from_newest_first(&records, 3);
        window.push(Message::user("now"));

        let contents: Vec<_> = window.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4", "now"]);
        assert_eq!(window.messages()[1].role, Role::Assistant);
    }
}
