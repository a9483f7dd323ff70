//! Counsellor - 留学申请顾问核心
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、阶段推导、画像强度评估
//! - **counsellor**: ACTIONS 协议解析、动作执行、申请清单、单轮对话编排
//! - **directory**: 大学目录检索与学费 / 录取率估计
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Gemini / Mock）
//! - **memory**: 发给模型的对话窗口
//! - **models**: 用户、画像、选校、待办、对话消息
//! - **services**: 账号、画像、选校、待办、仪表盘、申请指导、推荐
//! - **store**: 存储抽象（内存 / SQLite），原子批量写入

pub mod config;
pub mod core;
pub mod counsellor;
pub mod directory;
pub mod llm;
pub mod memory;
pub mod models;
pub mod observability;
pub mod services;
pub mod store;

pub use counsellor::{Counsellor, TurnOutcome};
