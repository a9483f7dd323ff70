//! 选校清单条目
//!
//! locked 表示用户已确定申请该校；首次锁定时生成申请待办清单（checklist_created 记录是否已生成，
//! 保证解锁后再次锁定也不会重复生成）。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShortlistEntry {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub country: String,
    pub domain: Option<String>,
    pub web_page: Option<String>,
    /// dream / target / safe
    pub category: Option<String>,
    pub cost_level: Option<String>,
    pub acceptance_chance: Option<String>,
    pub fit_reason: Option<String>,
    pub risks: Option<String>,
    pub locked: bool,
    pub checklist_created: bool,
    pub created_at: DateTime<Utc>,
}

impl ShortlistEntry {
    pub fn from_request(user_id: impl Into<String>, req: ShortlistRequest) -> Self {
        Self {
            id: super::new_id(),
            user_id: user_id.into(),
            name: req.name,
            country: req.country,
            domain: req.domain,
            web_page: req.web_page,
            category: req.category,
            cost_level: req.cost_level,
            acceptance_chance: req.acceptance_chance,
            fit_reason: req.fit_reason,
            risks: req.risks,
            locked: false,
            checklist_created: false,
            created_at: Utc::now(),
        }
    }
}

/// 新增选校条目的请求（手动添加或由 AI 动作转换而来）
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ShortlistRequest {
    pub name: String,
    pub country: String,
    pub domain: Option<String>,
    pub web_page: Option<String>,
    pub category: Option<String>,
    pub cost_level: Option<String>,
    pub acceptance_chance: Option<String>,
    pub fit_reason: Option<String>,
    pub risks: Option<String>,
}
