//! 学生画像：学术背景、留学目标、预算、考试与文书进度
//!
//! 与用户一对一，注册时随用户一起创建；三个 strength_* 字段是缓存值，仅在读取仪表盘时重算。

use serde::{Deserialize, Serialize};

/// 单项考试及其状态（如 {"name": "IELTS", "status": "Completed"}）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
}

impl ExamRecord {
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub user_id: String,
    pub onboarding_complete: bool,

    pub current_education_level: Option<String>,
    pub degree_major: Option<String>,
    pub graduation_year: Option<i32>,
    /// 自由文本，可能是 "3.7"、"82%" 等
    pub gpa: Option<String>,

    pub intended_degree: Option<String>,
    pub field_of_study: Option<String>,
    pub target_intake_year: Option<i32>,
    #[serde(default)]
    pub preferred_countries: Vec<String>,

    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub funding_plan: Option<String>,

    #[serde(default)]
    pub exams: Vec<ExamRecord>,
    pub sop_status: Option<String>,

    pub strength_academics: Option<String>,
    pub strength_exams: Option<String>,
    pub strength_sop: Option<String>,
}

impl Profile {
    /// 注册时创建的空画像
    pub fn empty_for(user_id: impl Into<String>) -> Self {
        Self {
            id: super::new_id(),
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    /// 按 ProfileUpdate 覆盖：只修改请求中出现的字段
    pub fn apply_update(&mut self, update: ProfileUpdate) {
        fn set<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }
        set(&mut self.current_education_level, update.current_education_level);
        set(&mut self.degree_major, update.degree_major);
        set(&mut self.graduation_year, update.graduation_year);
        set(&mut self.gpa, update.gpa);
        set(&mut self.intended_degree, update.intended_degree);
        set(&mut self.field_of_study, update.field_of_study);
        set(&mut self.target_intake_year, update.target_intake_year);
        set(&mut self.budget_min, update.budget_min);
        set(&mut self.budget_max, update.budget_max);
        set(&mut self.funding_plan, update.funding_plan);
        set(&mut self.sop_status, update.sop_status);
        if let Some(countries) = update.preferred_countries {
            self.preferred_countries = countries;
        }
        if let Some(exams) = update.exams {
            self.exams = exams;
        }
    }
}

/// 画像的部分更新请求：None 表示保持原值
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub current_education_level: Option<String>,
    pub degree_major: Option<String>,
    pub graduation_year: Option<i32>,
    pub gpa: Option<String>,
    pub intended_degree: Option<String>,
    pub field_of_study: Option<String>,
    pub target_intake_year: Option<i32>,
    pub preferred_countries: Option<Vec<String>>,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub funding_plan: Option<String>,
    pub exams: Option<Vec<ExamRecord>>,
    pub sop_status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_update_keeps_unset_fields() {
        let mut profile = Profile::empty_for("u1");
        profile.degree_major = Some("CS".into());
        profile.preferred_countries = vec!["Germany".into()];

        profile.apply_update(ProfileUpdate {
            gpa: Some("3.8".into()),
            exams: Some(vec![ExamRecord::new("IELTS", "Completed")]),
            ..ProfileUpdate::default()
        });

        assert_eq!(profile.degree_major.as_deref(), Some("CS"));
        assert_eq!(profile.gpa.as_deref(), Some("3.8"));
        assert_eq!(profile.preferred_countries, vec!["Germany".to_string()]);
        assert_eq!(profile.exams.len(), 1);
        assert!(!profile.onboarding_complete);
    }
}
