use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 待办事项；shortlist_id 可空，指向所属选校条目（条目删除时一并清理）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub user_id: String,
    pub shortlist_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    /// sop / lor / documents / exams / forms / finance / strategy ...
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Todo {
    pub fn new(user_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: super::new_id(),
            user_id: user_id.into(),
            shortlist_id: None,
            title: title.into(),
            description: None,
            completed: false,
            category: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_shortlist(mut self, shortlist_id: Option<String>) -> Self {
        self.shortlist_id = shortlist_id;
        self
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TodoRequest {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub shortlist_id: Option<String>,
}

/// 待办的部分更新：None 表示保持原值
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TodoUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub category: Option<String>,
    pub shortlist_id: Option<String>,
}
