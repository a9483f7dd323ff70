//! Gemini 客户端（通过 Google 提供的 OpenAI 兼容端点）
//!
//! - Base URL: https://generativelanguage.googleapis.com/v1beta/openai/
//! - 模型: gemini-2.5-flash（默认）

use crate::llm::OpenAiClient;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";
pub const GEMINI_FLASH: &str = "gemini-2.5-flash";

/// 创建 Gemini 客户端
///
/// - API Key 来自参数，缺省时读环境变量 `GEMINI_API_KEY`
/// - 模型可通过 `model` 参数或 `GEMINI_MODEL` 环境变量指定
pub fn create_gemini_client(api_key: &str, model: Option<&str>) -> OpenAiClient {
    let model = model
        .map(String::from)
        .or_else(|| std::env::var("GEMINI_MODEL").ok())
        .unwrap_or_else(|| GEMINI_FLASH.to_string());

    OpenAiClient::new(Some(GEMINI_BASE_URL), &model, api_key)
}
