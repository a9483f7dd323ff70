//! 画像与选校清单的自然语言摘要（拼入 system prompt）
//!
//! 画像只输出已填写的部分，每部分一句带标签的话。

use crate::models::{Profile, ShortlistEntry};

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn academic(profile: &Profile) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    if let Some(level) = present(&profile.current_education_level) {
        parts.push(level.to_string());
    }
    if let Some(major) = present(&profile.degree_major) {
        parts.push(major.to_string());
    }
    if let Some(year) = profile.graduation_year {
        parts.push(format!("grad year {year}"));
    }
    if let Some(gpa) = present(&profile.gpa) {
        parts.push(format!("GPA {gpa}"));
    }
    (!parts.is_empty()).then(|| format!("Academic: {}.", parts.join(", ")))
}

fn study_goal(profile: &Profile) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    if let Some(degree) = present(&profile.intended_degree) {
        parts.push(degree.to_string());
    }
    if let Some(field) = present(&profile.field_of_study) {
        parts.push(format!("in {field}"));
    }
    if let Some(year) = profile.target_intake_year {
        parts.push(format!("intake {year}"));
    }
    (!parts.is_empty()).then(|| format!("Study goal: {}.", parts.join(" ")))
}

fn budget(profile: &Profile) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    if profile.budget_min.is_some() || profile.budget_max.is_some() {
        let show = |v: Option<i64>| v.map(|n| n.to_string()).unwrap_or_else(|| "?".to_string());
        parts.push(format!(
            "{}–{} per year",
            show(profile.budget_min),
            show(profile.budget_max)
        ));
    }
    if let Some(plan) = present(&profile.funding_plan) {
        parts.push(format!("funding: {plan}"));
    }
    (!parts.is_empty()).then(|| format!("Budget: {}.", parts.join(", ")))
}

fn exams(profile: &Profile) -> Option<String> {
    if profile.exams.is_empty() {
        return None;
    }
    let listed: Vec<String> = profile
        .exams
        .iter()
        .filter(|e| !e.name.trim().is_empty() && !e.status.trim().is_empty())
        .map(|e| format!("{} ({})", e.name.trim(), e.status.trim()))
        .collect();
    let text = if listed.is_empty() {
        "No exams recorded yet".to_string()
    } else {
        listed.join(", ")
    };
    Some(format!("Exams: {text}."))
}

/// 画像摘要
pub fn profile_context(profile: Option<&Profile>) -> String {
    let Some(profile) = profile else {
        return "No profile yet; user is just starting their application planning.".to_string();
    };

    let countries: Vec<&str> = profile
        .preferred_countries
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();

    let sections: Vec<String> = [
        academic(profile),
        study_goal(profile),
        (!countries.is_empty())
            .then(|| format!("Preferred countries: {}.", countries.join(", "))),
        budget(profile),
        exams(profile),
        present(&profile.sop_status).map(|s| format!("SOP status: {s}.")),
    ]
    .into_iter()
    .flatten()
    .collect();

    if sections.is_empty() {
        "User has not filled out profile details yet. Guide them through building a strong profile."
            .to_string()
    } else {
        sections.join("\n")
    }
}

/// 选校清单摘要：每条一行（名称、国家、类别、是否锁定）
pub fn shortlist_context(entries: &[ShortlistEntry]) -> String {
    if entries.is_empty() {
        return "No universities shortlisted yet.".to_string();
    }
    entries
        .iter()
        .map(|e| {
            format!(
                "- {} ({}) category={} locked={}",
                e.name,
                e.country,
                e.category.as_deref().unwrap_or("target"),
                e.locked
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
