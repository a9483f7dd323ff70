//! System prompt 模板与渲染
//!
//! 模板占位符：{stage} {stage_label} {profile} {shortlist} {action_schema}。
//! 可通过配置或 config/prompts/counsellor.md 覆盖内置模板。

use std::path::Path;

use crate::core::Stage;
use crate::counsellor::context::{profile_context, shortlist_context};
use crate::counsellor::schema::action_schema_json;
use crate::models::{Profile, ShortlistEntry};

pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"You are an AI Counsellor for study-abroad. You guide students from profile building to university shortlisting and application prep.
Current user stage: {stage} – {stage_label}.

User profile:
{profile}

Shortlisted/locked universities:
{shortlist}

When recommending a university with a shortlist_add action, include complete, university-specific details:
- name: full official university name
- country: country name
- domain and web_page: the university's domain and full https:// website URL
- category: dream, target or safe, judged from the user's profile against the university's difficulty
- cost_level: annual tuition in rupees (e.g. "₹32,50,000")
- acceptance_chance: admission rate as a percentage (e.g. "3.3%")
- fit_reason: 2-3 sentences on why this university matches the user's goals and preferred countries
- risks: the key challenges, with specifics

Default annual tuition (INR) when university data is unavailable: United States ₹30,00,000; United Kingdom ₹25,00,000; Canada ₹18,00,000; Australia ₹20,00,000; Germany ₹6,00,000; Netherlands ₹12,00,000; Singapore ₹16,00,000; India ₹2,00,000; Ireland ₹15,00,000.
Default acceptance rates: United States 35%; United Kingdom 40%; Canada 50%; Australia 55%; Germany 75%; Netherlands 70%; Singapore 30%; India 80%; Ireland 65%.

To change the user's plan, append one block anywhere in your reply:
ACTIONS: [ ...JSON objects... ]
Valid action types: shortlist_add, todo_add (title required, others optional), lock (shortlist_id of an entry already in the list).
The array must match this JSON Schema:
{action_schema}

Always answer based on the user's profile and stage, explain strengths and gaps when relevant, and suggest next steps. Text may appear before and after the ACTIONS block."#;

/// 加载模板：显式路径 > config/prompts/counsellor.md > 内置模板
pub fn load_prompt_template(path: Option<&Path>) -> String {
    if let Some(path) = path {
        match std::fs::read_to_string(path) {
            Ok(template) => return template,
            Err(e) => tracing::warn!("Failed to read prompt template {:?}: {}", path, e),
        }
    }

    [
        "config/prompts/counsellor.md",
        "../config/prompts/counsellor.md",
    ]
    .into_iter()
    .find_map(|p| std::fs::read_to_string(p).ok())
    .unwrap_or_else(|| DEFAULT_PROMPT_TEMPLATE.to_string())
}

/// 按当前画像、清单与阶段渲染 system prompt
pub fn render_system_prompt(
    template: &str,
    profile: Option<&Profile>,
    shortlist: &[ShortlistEntry],
    stage: Stage,
) -> String {
    template
        .replace("{stage}", &stage.ordinal().to_string())
        .replace("{stage_label}", stage.label())
        .replace("{profile}", &profile_context(profile))
        .replace("{shortlist}", &shortlist_context(shortlist))
        .replace("{action_schema}", &action_schema_json())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_placeholders() {
        let prompt = render_system_prompt(DEFAULT_PROMPT_TEMPLATE, None, &[], Stage::BuildingProfile);
        assert!(prompt.contains("Current user stage: 1 – Building Profile."));
        assert!(prompt.contains("No profile yet"));
        assert!(prompt.contains("No universities shortlisted yet."));
        assert!(prompt.contains("shortlist_add"));
        assert!(!prompt.contains("{profile}"));
    }

    #[test]
    fn test_explicit_template_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.md");
        std::fs::write(&path, "Stage {stage}").unwrap();
        assert_eq!(load_prompt_template(Some(&path)), "Stage {stage}");
    }
}
