use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 用户账号（认证由上游负责，这里只保留身份信息）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            id: super::new_id(),
            email: email.into(),
            full_name: full_name.into(),
            created_at: Utc::now(),
        }
    }
}
