//! 核心纯逻辑：错误类型、阶段推导、画像强度评估

pub mod error;
pub mod stage;
pub mod strength;

pub use error::CounsellorError;
pub use stage::{stage_label, Stage};
pub use strength::{
    strength_academics, strength_exams, strength_sop, AcademicStrength, Readiness,
};
