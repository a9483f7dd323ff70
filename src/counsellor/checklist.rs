//! 锁定大学后生成的申请待办清单
//!
//! 7 条通用模板 + 最多 2 条针对该校的待办（取 fit_reason / risks 的第一句等作为提示）。

use crate::models::{ShortlistEntry, Todo};

const TEMPLATES: [(&str, &str); 7] = [
    ("Prepare Statement of Purpose (SOP) for {name}", "sop"),
    ("Request 2-3 Letters of Recommendation for {name}", "lor"),
    ("Collect official transcripts for {name}", "documents"),
    (
        "Schedule/prepare for English test (IELTS/TOEFL) if required for {name}",
        "exams",
    ),
    ("Schedule/prepare for GRE/GMAT if required for {name}", "exams"),
    ("Complete and submit application to {name}", "forms"),
    ("Apply for scholarships/financial aid for {name}", "finance"),
];

fn first_sentence(text: Option<&str>) -> Option<String> {
    text.and_then(|t| t.split('.').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// 针对该校的提示：fit_reason 首句 > risks 首句 > 官网域名 > 国家
pub fn unique_hint(entry: &ShortlistEntry) -> Option<String> {
    first_sentence(entry.fit_reason.as_deref())
        .or_else(|| first_sentence(entry.risks.as_deref()))
        .or_else(|| {
            entry
                .domain
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(|d| format!("Mention faculty or labs from {d}"))
        })
        .or_else(|| {
            let country = entry.country.trim();
            (!country.is_empty()).then(|| country.to_string())
        })
}

/// 为 entry 生成全部清单待办，均关联到该条目
pub fn build_checklist(user_id: &str, entry: &ShortlistEntry) -> Vec<Todo> {
    let name = entry.name.as_str();
    let mut items: Vec<(String, &str)> = TEMPLATES
        .iter()
        .map(|(title, category)| (title.replace("{name}", name), *category))
        .collect();

    if let Some(hint) = unique_hint(entry) {
        items.push((format!("Tailor SOP to highlight: {hint}"), "sop"));
        items.push((
            format!("Address key challenge: {hint} in your application materials for {name}"),
            "strategy",
        ));
    }

    items
        .into_iter()
        .map(|(title, category)| {
            Todo::new(user_id, title)
                .with_shortlist(Some(entry.id.clone()))
                .with_category(Some(category.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShortlistRequest;

    fn entry(fit: Option<&str>, risks: Option<&str>, domain: Option<&str>) -> ShortlistEntry {
        ShortlistEntry::from_request(
            "u1",
            ShortlistRequest {
                name: "TU Munich".into(),
                country: "Germany".into(),
                domain: domain.map(String::from),
                fit_reason: fit.map(String::from),
                risks: risks.map(String::from),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_full_checklist() {
        let e = entry(Some("Strong robotics labs. Low cost."), None, None);
        let todos = build_checklist("u1", &e);
        assert_eq!(todos.len(), 9);
        assert!(todos.iter().all(|t| t.shortlist_id.as_deref() == Some(e.id.as_str())));
        assert_eq!(todos[0].title, "Prepare Statement of Purpose (SOP) for TU Munich");
        assert_eq!(todos[7].title, "Tailor SOP to highlight: Strong robotics labs");
        assert_eq!(todos[8].category.as_deref(), Some("strategy"));
    }

    #[test]
    fn test_hint_fallback_chain() {
        assert_eq!(
            unique_hint(&entry(Some("  "), Some("Visa delays. Other."), None)).as_deref(),
            Some("Visa delays")
        );
        assert_eq!(
            unique_hint(&entry(None, None, Some("tum.de"))).as_deref(),
            Some("Mention faculty or labs from tum.de")
        );
        assert_eq!(unique_hint(&entry(None, None, None)).as_deref(), Some("Germany"));
    }
}
