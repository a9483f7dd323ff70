//! 申请阶段推导
//!
//! 阶段不落库：每次读取都由 (画像是否完成引导, 选校数, 锁定数) 重新计算。
//! 规则按顺序匹配，先命中者生效；锁定优先于选校。

use serde::Serialize;

use crate::models::Profile;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Stage {
    BuildingProfile = 1,
    DiscoveringUniversities = 2,
    FinalizingUniversities = 3,
    PreparingApplications = 4,
}

impl Stage {
    /// 纯函数，无副作用
    pub fn resolve(profile: Option<&Profile>, shortlisted_count: usize, locked_count: usize) -> Self {
        match profile {
            Some(p) if p.onboarding_complete => {}
            _ => return Stage::BuildingProfile,
        }
        if locked_count >= 1 {
            Stage::PreparingApplications
        } else if shortlisted_count >= 1 {
            Stage::FinalizingUniversities
        } else {
            Stage::DiscoveringUniversities
        }
    }

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(n: u8) -> Option<Self> {
        match n {
            1 => Some(Stage::BuildingProfile),
            2 => Some(Stage::DiscoveringUniversities),
            3 => Some(Stage::FinalizingUniversities),
            4 => Some(Stage::PreparingApplications),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::BuildingProfile => "Building Profile",
            Stage::DiscoveringUniversities => "Discovering Universities",
            Stage::FinalizingUniversities => "Finalizing Universities",
            Stage::PreparingApplications => "Preparing Applications",
        }
    }
}

/// 按序号取阶段名；未知序号回退为 "Building Profile"
pub fn stage_label(ordinal: u8) -> &'static str {
    Stage::from_ordinal(ordinal)
        .unwrap_or(Stage::BuildingProfile)
        .label()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn onboarded() -> Profile {
        Profile {
            onboarding_complete: true,
            ..Profile::empty_for("u1")
        }
    }

    #[test]
    fn test_no_profile_is_stage_one() {
        assert_eq!(Stage::resolve(None, 3, 2), Stage::BuildingProfile);
    }

    #[test]
    fn test_incomplete_onboarding_ignores_counts() {
        let profile = Profile::empty_for("u1");
        for (s, l) in [(0, 0), (5, 0), (5, 5), (0, 3)] {
            assert_eq!(Stage::resolve(Some(&profile), s, l), Stage::BuildingProfile);
        }
    }

    #[test]
    fn test_lock_dominates_shortlist() {
        let profile = onboarded();
        for shortlisted in [0, 1, 10] {
            assert_eq!(
                Stage::resolve(Some(&profile), shortlisted, 1),
                Stage::PreparingApplications
            );
        }
    }

    #[test]
    fn test_discovering_and_finalizing() {
        let profile = onboarded();
        assert_eq!(Stage::resolve(Some(&profile), 0, 0), Stage::DiscoveringUniversities);
        assert_eq!(Stage::resolve(Some(&profile), 2, 0), Stage::FinalizingUniversities);
        assert_eq!(Stage::FinalizingUniversities.ordinal(), 3);
    }

    #[test]
    fn test_stage_label_fallback() {
        assert_eq!(stage_label(4), "Preparing Applications");
        assert_eq!(stage_label(0), "Building Profile");
        assert_eq!(stage_label(9), "Building Profile");
    }
}
