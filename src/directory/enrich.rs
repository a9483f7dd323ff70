//! 按国家补充学费与录取率估计
//!
//! 数据是国家级平均值，不区分学校；表外国家使用默认值。

use serde::{Deserialize, Serialize};

use crate::models::ShortlistRequest;

/// 目录服务返回的原始记录
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct RawUniversity {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub web_pages: Vec<String>,
}

impl RawUniversity {
    pub fn new(name: &str, country: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            country: Some(country.to_string()),
            ..Default::default()
        }
    }
}

/// 补充估计值后的大学
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct University {
    pub name: String,
    pub country: String,
    pub domain: Option<String>,
    pub web_page: Option<String>,
    /// 每年学费（卢比）
    pub cost_inr: i64,
    pub cost_level: String,
    pub acceptance_pct: u32,
    pub acceptance_chance: String,
    pub fit_reason: String,
    pub risks: String,
}

impl University {
    /// 转为选校请求
    pub fn to_request(&self, category: Option<&str>) -> ShortlistRequest {
        ShortlistRequest {
            name: self.name.clone(),
            country: self.country.clone(),
            domain: self.domain.clone(),
            web_page: self.web_page.clone(),
            category: category.map(String::from),
            cost_level: Some(self.cost_level.clone()),
            acceptance_chance: Some(self.acceptance_chance.clone()),
            fit_reason: Some(self.fit_reason.clone()),
            risks: Some(self.risks.clone()),
        }
    }
}

const DEFAULT_COST_INR: i64 = 1_000_000;
const DEFAULT_ACCEPTANCE_PCT: u32 = 50;

/// (国家, 每年学费, 录取率%)
const COUNTRY_TABLE: [(&str, i64, u32); 9] = [
    ("United States", 3_000_000, 35),
    ("United Kingdom", 2_500_000, 40),
    ("Canada", 1_800_000, 50),
    ("Australia", 2_000_000, 55),
    ("Germany", 600_000, 75),
    ("Netherlands", 1_200_000, 70),
    ("Singapore", 1_600_000, 30),
    ("India", 200_000, 80),
    ("Ireland", 1_500_000, 65),
];

/// 国家的 (学费, 录取率)，表外国家返回默认值
pub fn country_estimates(country: &str) -> (i64, u32) {
    COUNTRY_TABLE
        .iter()
        .find(|(name, _, _)| *name == country)
        .map(|(_, cost, pct)| (*cost, *pct))
        .unwrap_or((DEFAULT_COST_INR, DEFAULT_ACCEPTANCE_PCT))
}

/// 印度记数法分组：末三位一组，其余两位一组，如 3000000 → ₹30,00,000
pub fn format_inr(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, tail) = digits.split_at(digits.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 0 {
            let start = end.saturating_sub(2);
            groups.push(&head[start..end]);
            end = start;
        }
        groups.reverse();
        format!("{},{}", groups.join(","), tail)
    };
    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}₹{grouped}")
}

fn first_non_blank(values: &[String]) -> Option<String> {
    values
        .first()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// 补充估计值：只处理前 max_records 条，跳过空名称，按 (名称, 国家) 去重
pub fn enrich(raw: &[RawUniversity], max_records: usize) -> Vec<University> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    for record in raw.iter().take(max_records) {
        let name = record.name.as_deref().unwrap_or("").trim().to_string();
        let country = record.country.as_deref().unwrap_or("").trim().to_string();
        if name.is_empty() || !seen.insert((name.clone(), country.clone())) {
            continue;
        }

        let (cost_inr, acceptance_pct) = country_estimates(&country);
        let cost_level = format_inr(cost_inr);
        out.push(University {
            domain: first_non_blank(&record.domains),
            web_page: first_non_blank(&record.web_pages),
            fit_reason: format!(
                "Matches preferred country ({country}). Average annual tuition: {cost_level}."
            ),
            risks: format!(
                "Acceptance rate approximately {acceptance_pct}%. Ensure strong profile and SOP."
            ),
            acceptance_chance: format!("{acceptance_pct}%"),
            cost_level,
            cost_inr,
            acceptance_pct,
            name,
            country,
        });
    }
    out
}
