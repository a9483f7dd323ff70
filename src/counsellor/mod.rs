//! 顾问对话核心：动作协议解析、动作执行、申请清单、提示词与单轮编排

pub mod actions;
pub mod checklist;
pub mod context;
pub mod executor;
pub mod orchestrator;
pub mod prompts;
pub mod schema;
pub mod turn_gate;

pub use actions::{parse_reply, ParsedReply, RawAction, ACTIONS_MARKER};
pub use checklist::build_checklist;
pub use executor::{plan_actions, ActionKind, ExecutionPlan};
pub use orchestrator::{Counsellor, TurnOutcome, TurnPhase, FALLBACK_REPLY};
pub use turn_gate::TurnGate;
