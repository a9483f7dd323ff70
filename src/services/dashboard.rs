//! 仪表盘：画像摘要、强度评估（重算并回写）、阶段、待办与清单计数

use serde::Serialize;

use crate::core::{
    stage_label, strength_academics, strength_exams, strength_sop, CounsellorError, Stage,
};
use crate::models::{Profile, Todo};
use crate::store::CounsellorStore;

const EMPTY: &str = "—";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSummary {
    pub education: String,
    pub target_intake: String,
    pub countries: Vec<String>,
    pub budget: String,
}

impl ProfileSummary {
    fn from_profile(p: &Profile) -> Self {
        let education = p
            .degree_major
            .clone()
            .or_else(|| p.current_education_level.clone())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| EMPTY.to_string());
        let budget = if p.budget_min.is_some() || p.budget_max.is_some() {
            let show = |v: Option<i64>| v.map(|n| n.to_string()).unwrap_or_else(|| "?".into());
            format!("{} - {}", show(p.budget_min), show(p.budget_max))
        } else {
            EMPTY.to_string()
        };
        Self {
            education,
            target_intake: p
                .target_intake_year
                .map(|y| y.to_string())
                .unwrap_or_else(|| EMPTY.to_string()),
            countries: p.preferred_countries.clone(),
            budget,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileStrength {
    pub academics: String,
    pub exams: String,
    pub sop: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub profile_summary: Option<ProfileSummary>,
    pub profile_strength: Option<ProfileStrength>,
    pub stage: u8,
    pub stage_label: &'static str,
    pub onboarding_complete: bool,
    pub todos: Vec<Todo>,
    pub shortlisted_count: usize,
    pub locked_count: usize,
}

/// 读取仪表盘；有画像时重算三项强度并写回
pub async fn load_dashboard(
    store: &dyn CounsellorStore,
    user_id: &str,
) -> Result<Dashboard, CounsellorError> {
    let mut profile = store.get_profile(user_id).await?;
    let shortlist = store.list_shortlist(user_id).await?;
    let locked_count = shortlist.iter().filter(|e| e.locked).count();
    let stage = Stage::resolve(profile.as_ref(), shortlist.len(), locked_count);

    let mut strength = None;
    if let Some(p) = profile.as_mut() {
        let computed = ProfileStrength {
            academics: strength_academics(p.gpa.as_deref(), p.degree_major.as_deref()).to_string(),
            exams: strength_exams(&p.exams).to_string(),
            sop: strength_sop(p.sop_status.as_deref()).to_string(),
        };
        p.strength_academics = Some(computed.academics.clone());
        p.strength_exams = Some(computed.exams.clone());
        p.strength_sop = Some(computed.sop.clone());
        store.save_profile(p).await?;
        strength = Some(computed);
    }

    Ok(Dashboard {
        profile_summary: profile.as_ref().map(ProfileSummary::from_profile),
        profile_strength: strength,
        stage: stage.ordinal(),
        stage_label: stage_label(stage.ordinal()),
        onboarding_complete: profile.as_ref().is_some_and(|p| p.onboarding_complete),
        todos: store.list_todos(user_id).await?,
        shortlisted_count: shortlist.len(),
        locked_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExamRecord, ProfileUpdate};
    use crate::services::{accounts::signup, profile::update_profile};
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_dashboard_persists_strengths() {
        let store = MemoryStore::new();
        let (user, _) = signup(&store, "d@x.com", "D").await.unwrap();
        update_profile(
            &store,
            &user.id,
            ProfileUpdate {
                gpa: Some("85%".into()),
                degree_major: Some("CS".into()),
                exams: Some(vec![
                    ExamRecord::new("IELTS", "Completed"),
                    ExamRecord::new("GRE", "In progress"),
                ]),
                sop_status: Some("Draft".into()),
                target_intake_year: Some(2027),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let dash = load_dashboard(&store, &user.id).await.unwrap();
        assert_eq!(dash.stage, 1);
        assert_eq!(dash.stage_label, "Building Profile");
        let strength = dash.profile_strength.unwrap();
        assert_eq!(strength.academics, "Strong");
        assert_eq!(strength.exams, "In progress");
        assert_eq!(strength.sop, "Draft");
        let summary = dash.profile_summary.unwrap();
        assert_eq!(summary.education, "CS");
        assert_eq!(summary.target_intake, "2027");
        assert_eq!(summary.budget, "—");

        let saved = store.get_profile(&user.id).await.unwrap().unwrap();
        assert_eq!(saved.strength_academics.as_deref(), Some("Strong"));
    }

    #[tokio::test]
    async fn test_dashboard_without_profile() {
        let store = MemoryStore::new();
        let dash = load_dashboard(&store, "ghost").await.unwrap();
        assert!(dash.profile_summary.is_none());
        assert!(!dash.onboarding_complete);
        assert_eq!(dash.shortlisted_count, 0);
    }
}
