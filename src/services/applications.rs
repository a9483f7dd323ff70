//! 申请指导：至少锁定一所学校后开放

use serde::Serialize;

use crate::core::CounsellorError;
use crate::models::{ShortlistEntry, Todo};
use crate::store::CounsellorStore;

pub const REQUIRED_DOCUMENTS: [&str; 8] = [
    "Academic transcripts",
    "Degree certificate",
    "English proficiency (IELTS/TOEFL)",
    "GRE/GMAT (if required by program)",
    "Statement of Purpose (SOP)",
    "Letters of recommendation (2–3)",
    "CV/Resume",
    "Passport copy",
];

pub const TIMELINE: [&str; 5] = [
    "6–12 months before: Shortlist universities, take exams",
    "4–6 months before: Prepare SOP, LORs, transcripts",
    "2–4 months before: Submit applications",
    "1–2 months before: Follow up, prepare for interviews",
    "After decisions: Accept offer, apply for visa",
];

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationGuidance {
    pub locked_universities: Vec<ShortlistEntry>,
    pub required_documents: Vec<&'static str>,
    pub timeline: Vec<&'static str>,
    pub todos: Vec<Todo>,
}

pub async fn application_guidance(
    store: &dyn CounsellorStore,
    user_id: &str,
) -> Result<ApplicationGuidance, CounsellorError> {
    let locked: Vec<ShortlistEntry> = store
        .list_shortlist(user_id)
        .await?
        .into_iter()
        .filter(|e| e.locked)
        .collect();
    if locked.is_empty() {
        return Err(CounsellorError::ApplicationsLocked);
    }

    Ok(ApplicationGuidance {
        locked_universities: locked,
        required_documents: REQUIRED_DOCUMENTS.to_vec(),
        timeline: TIMELINE.to_vec(),
        todos: store.list_todos(user_id).await?,
    })
}
