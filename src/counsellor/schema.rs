//! 动作 JSON Schema 生成（schemars）
//!
//! 将合法 ACTIONS 数组的结构注入 system prompt，减少模型输出格式错误。

use schemars::{schema_for, JsonSchema};

/// 与执行器识别的动作一一对应（仅用于 Schema 生成）
#[allow(dead_code)]
#[derive(JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ActionFormat {
    /// 将一所大学加入候选清单
    ShortlistAdd {
        /// 大学全称
        name: String,
        country: String,
        /// 官网域名，如 mit.edu
        domain: Option<String>,
        /// 完整官网地址，以 https:// 开头
        web_page: Option<String>,
        /// dream / target / safe
        category: Option<String>,
        /// 每年学费（卢比），如 ₹30,00,000
        cost_level: Option<String>,
        /// 录取率，如 35%
        acceptance_chance: Option<String>,
        fit_reason: Option<String>,
        risks: Option<String>,
    },
    /// 新增一条待办
    TodoAdd {
        title: String,
        description: Option<String>,
        category: Option<String>,
        /// 关联的候选大学 id
        shortlist_id: Option<String>,
    },
    /// 锁定一所已在清单中的大学，首次锁定时生成申请清单
    Lock { shortlist_id: String },
}

/// 返回 ACTIONS 数组的 JSON Schema 字符串，可拼入 system prompt
pub fn action_schema_json() -> String {
    let schema = schema_for!(Vec<ActionFormat>);
    serde_json::to_string_pretty(&schema).unwrap_or_else(|_| String::new())
}
