//! 顾问服务错误类型
//!
//! 与对话流程的「吸收并降级」策略配合：动作级校验失败不会走到这里，
//! 这里只描述会终止单次请求的错误（资源不存在、输入非法、存储故障等）。

use thiserror::Error;

use crate::store::StoreError;

/// 服务层 / 编排层返回给调用方的错误
#[derive(Error, Debug)]
pub enum CounsellorError {
    /// 按 ID 查询的资源不存在，或不属于当前用户
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Email already registered")]
    EmailTaken,

    /// 申请指导需要至少锁定一所学校
    #[error("Lock at least one university to unlock application guidance.")]
    ApplicationsLocked,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}
