//! LLM 层：客户端抽象与实现（OpenAI 兼容 / Gemini / Mock）

pub mod gemini;
pub mod mock;
pub mod openai;
pub mod traits;

use std::sync::Arc;

pub use gemini::{create_gemini_client, GEMINI_BASE_URL, GEMINI_FLASH};
pub use mock::MockLlmClient;
pub use openai::OpenAiClient;
pub use traits::{LlmClient, LlmError};

use crate::config::AppConfig;

/// 按配置与环境变量选择 LLM 后端
///
/// - provider = gemini 且有 `GEMINI_API_KEY` → Gemini
/// - provider = openai 且有 `OPENAI_API_KEY` → OpenAI 兼容端点（可配 base_url）
/// - 其余情况 → Mock（打印警告）
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    let temperature = cfg.llm.temperature;

    match provider.as_str() {
        "gemini" => {
            if let Ok(key) = std::env::var("GEMINI_API_KEY") {
                let client = create_gemini_client(&key, cfg.llm.model.as_deref())
                    .with_temperature(temperature);
                tracing::info!("Using Gemini LLM ({})", client.name());
                return Arc::new(client);
            }
        }
        "openai" => {
            if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                let model = cfg
                    .llm
                    .model
                    .clone()
                    .unwrap_or_else(|| "gpt-4o-mini".to_string());
                tracing::info!("Using OpenAI LLM ({})", model);
                return Arc::new(
                    OpenAiClient::new(cfg.llm.base_url.as_deref(), &model, &key)
                        .with_temperature(temperature),
                );
            }
        }
        other => tracing::warn!(provider = other, "Unknown LLM provider"),
    }

    tracing::warn!("No API key set or provider unknown, using Mock LLM");
    Arc::new(MockLlmClient::new())
}
