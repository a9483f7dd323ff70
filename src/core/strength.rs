//! 画像强度评估（学术 / 考试 / 文书）
//!
//! 三个函数都是全函数：输入不合法时只降级为默认标签，不返回错误。

use std::fmt;

use crate::models::ExamRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcademicStrength {
    Strong,
    Average,
    Weak,
}

impl AcademicStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            AcademicStrength::Strong => "Strong",
            AcademicStrength::Average => "Average",
            AcademicStrength::Weak => "Weak",
        }
    }
}

/// 考试 / 文书准备进度
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Readiness {
    NotStarted,
    InProgress,
    Draft,
    Ready,
    Completed,
}

impl Readiness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Readiness::NotStarted => "Not started",
            Readiness::InProgress => "In progress",
            Readiness::Draft => "Draft",
            Readiness::Ready => "Ready",
            Readiness::Completed => "Completed",
        }
    }
}

impl fmt::Display for AcademicStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// 学术强度：百分制与四分制通过区间判断统一处理
pub fn strength_academics(gpa: Option<&str>, degree_major: Option<&str>) -> AcademicStrength {
    let gpa = non_blank(gpa);
    let has_major = non_blank(degree_major).is_some();
    let Some(gpa) = gpa else {
        return if has_major {
            AcademicStrength::Average
        } else {
            AcademicStrength::Weak
        };
    };
    match gpa.trim_end_matches('%').trim().parse::<f64>() {
        Ok(g) if g.is_finite() => {
            if g >= 80.0 || (3.5..=4.0).contains(&g) {
                AcademicStrength::Strong
            } else if g >= 60.0 || (2.5..=4.0).contains(&g) {
                AcademicStrength::Average
            } else {
                AcademicStrength::Weak
            }
        }
        _ if has_major => AcademicStrength::Average,
        _ => AcademicStrength::Weak,
    }
}

/// 考试进度：状态含 ready / completed 记为完成，含 progress 记为进行中
pub fn strength_exams(exams: &[ExamRecord]) -> Readiness {
    let mut completed = 0;
    let mut in_progress = 0;
    for exam in exams {
        let status = exam.status.to_lowercase();
        if status.contains("ready") || status.contains("completed") {
            completed += 1;
        } else if status.contains("progress") {
            in_progress += 1;
        }
    }
    if completed >= 2 {
        Readiness::Completed
    } else if completed >= 1 || in_progress >= 1 {
        Readiness::InProgress
    } else {
        Readiness::NotStarted
    }
}

pub fn strength_sop(sop_status: Option<&str>) -> Readiness {
    let Some(status) = non_blank(sop_status) else {
        return Readiness::NotStarted;
    };
    let s = status.to_lowercase();
    if s.contains("ready") {
        Readiness::Ready
    } else if s.contains("draft") {
        Readiness::Draft
    } else {
        Readiness::NotStarted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_academics_boundaries() {
        assert_eq!(strength_academics(Some("80"), Some("CS")), AcademicStrength::Strong);
        assert_eq!(strength_academics(Some("59"), Some("CS")), AcademicStrength::Weak);
        assert_eq!(strength_academics(None, None), AcademicStrength::Weak);
        assert_eq!(strength_academics(Some("60"), None), AcademicStrength::Average);
    }

    #[test]
    fn test_academics_four_point_scale() {
        assert_eq!(strength_academics(Some("3.7"), None), AcademicStrength::Strong);
        assert_eq!(strength_academics(Some("2.8"), None), AcademicStrength::Average);
        assert_eq!(strength_academics(Some("2.0"), None), AcademicStrength::Weak);
        assert_eq!(strength_academics(Some("4.5"), None), AcademicStrength::Weak);
    }

    #[test]
    fn test_academics_percent_and_unparsable() {
        assert_eq!(strength_academics(Some("85%"), None), AcademicStrength::Strong);
        assert_eq!(strength_academics(Some("first class"), Some("EE")), AcademicStrength::Average);
        assert_eq!(strength_academics(Some("first class"), None), AcademicStrength::Weak);
        assert_eq!(strength_academics(None, Some("EE")), AcademicStrength::Average);
    }

    #[test]
    fn test_exams() {
        assert_eq!(strength_exams(&[]), Readiness::NotStarted);
        let one_done = vec![ExamRecord::new("IELTS", "Completed")];
        assert_eq!(strength_exams(&one_done), Readiness::InProgress);
        let studying = vec![ExamRecord::new("GRE", "In Progress")];
        assert_eq!(strength_exams(&studying), Readiness::InProgress);
        let both = vec![
            ExamRecord::new("IELTS", "completed"),
            ExamRecord::new("GRE", "Ready"),
        ];
        assert_eq!(strength_exams(&both), Readiness::Completed);
        let planned = vec![ExamRecord::new("TOEFL", "planned")];
        assert_eq!(strength_exams(&planned), Readiness::NotStarted);
    }

    #[test]
    fn test_sop() {
        assert_eq!(strength_sop(None), Readiness::NotStarted);
        assert_eq!(strength_sop(Some("READY for review")), Readiness::Ready);
        assert_eq!(strength_sop(Some("First draft")), Readiness::Draft);
        assert_eq!(strength_sop(Some("thinking")), Readiness::NotStarted);
    }
}
