//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / Gemini / Mock）实现 LlmClient：输入 system + 历史 + 当前消息，返回纯文本。
//! 客户端由调用方显式构造并注入，不使用进程级单例。

use async_trait::async_trait;
use thiserror::Error;

use crate::memory::Message;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// 网络或服务商返回的错误
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// 请求构造失败（如消息内容非法）
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// LLM 客户端 trait：非流式完成
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError>;

    /// 后端名称（日志用）
    fn name(&self) -> &str {
        "llm"
    }
}
