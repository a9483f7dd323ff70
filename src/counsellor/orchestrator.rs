//! 对话编排：一轮用户消息 → 上下文 → 模型生成 → 解析 → 执行 → 持久化
//!
//! 阶段：Received → ContextBuilt → Generated → Parsed → Executed → Persisted。
//! 模型失败或超时时使用固定回复、不执行任何动作，但本轮仍会持久化用户与助手两条消息。
//! 所有写入（用户消息、动作、助手消息）在一次 `apply` 中原子提交；助手消息上的动作记录
//! 在同一事务内按各写操作的实际结果结算，返回的 executed 与持久化内容一致。

use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, MAX_HISTORY_LIMIT};
use crate::core::{CounsellorError, Stage};
use crate::counsellor::actions::{parse_reply, ParsedReply, RawAction};
use crate::counsellor::executor::plan_actions;
use crate::counsellor::prompts::{load_prompt_template, render_system_prompt, DEFAULT_PROMPT_TEMPLATE};
use crate::counsellor::turn_gate::TurnGate;
use crate::llm::{LlmClient, LlmError};
use crate::memory::{ConversationWindow, Message};
use crate::models::{ChatMessage, ExecutedAction, ShortlistEntry};
use crate::store::CounsellorStore;

/// 模型不可用时的固定回复
pub const FALLBACK_REPLY: &str =
    "I'm having trouble connecting to my AI core. Please try again in a moment.";

/// 单轮对话的处理阶段（日志用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Received,
    ContextBuilt,
    Generated,
    Parsed,
    Executed,
    Persisted,
}

/// 一轮对话的结果
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// 展示给用户的正文（已去掉 ACTIONS 块）
    pub reply: String,
    /// 模型输出中解析到的全部动作
    pub parsed: Vec<RawAction>,
    /// 实际生效的动作，与助手消息上持久化的一致
    pub executed: Vec<ExecutedAction>,
    /// 提交后重新推导的阶段
    pub stage: Stage,
    pub user_message: ChatMessage,
    pub assistant_message: ChatMessage,
}

impl TurnOutcome {
    pub fn used_fallback(&self) -> bool {
        self.reply == FALLBACK_REPLY
    }
}

fn locked_count(shortlist: &[ShortlistEntry]) -> usize {
    shortlist.iter().filter(|e| e.locked).count()
}

/// 顾问对话编排器；存储与模型客户端由调用方注入
pub struct Counsellor {
    store: Arc<dyn CounsellorStore>,
    llm: Arc<dyn LlmClient>,
    prompt_template: String,
    history_limit: usize,
    generation_timeout: Duration,
    turn_gate: Option<TurnGate>,
}

impl Counsellor {
    pub fn new(store: Arc<dyn CounsellorStore>, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            store,
            llm,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            history_limit: MAX_HISTORY_LIMIT,
            generation_timeout: Duration::from_secs(60),
            turn_gate: Some(TurnGate::new()),
        }
    }

    pub fn from_config(
        cfg: &AppConfig,
        store: Arc<dyn CounsellorStore>,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        Self::new(store, llm)
            .with_prompt_template(load_prompt_template(
                cfg.counsellor.system_prompt_path.as_deref(),
            ))
            .with_history_limit(cfg.counsellor.effective_history_limit())
            .with_generation_timeout(Duration::from_secs(cfg.llm.timeouts.request))
            .with_turn_serialization(cfg.counsellor.serialize_user_turns)
    }

    pub fn with_prompt_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = template.into();
        self
    }

    /// 超过 20 按 20 处理
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.min(MAX_HISTORY_LIMIT);
        self
    }

    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    /// 关闭后同一用户的并发轮次可能交错执行
    pub fn with_turn_serialization(mut self, enabled: bool) -> Self {
        self.turn_gate = enabled.then(TurnGate::new);
        self
    }

    pub fn store(&self) -> &Arc<dyn CounsellorStore> {
        &self.store
    }

    /// 调用模型；失败或超时返回 None
    async fn generate(&self, messages: &[Message]) -> Option<String> {
        let result = match tokio::time::timeout(self.generation_timeout, self.llm.complete(messages))
            .await
        {
            Ok(r) => r,
            Err(_) => Err(LlmError::Timeout(self.generation_timeout.as_secs())),
        };

        match result {
            Ok(text) => Some(text.trim().to_string()),
            Err(e) => {
                tracing::warn!(llm = self.llm.name(), error = %e, "LLM call failed, using fallback reply");
                None
            }
        }
    }

    /// 处理一轮用户消息
    pub async fn chat(&self, user_id: &str, content: &str) -> Result<TurnOutcome, CounsellorError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(CounsellorError::InvalidInput(
                "message must not be empty".to_string(),
            ));
        }

        let _turn = match &self.turn_gate {
            Some(gate) => Some(gate.acquire(user_id).await),
            None => None,
        };
        let user_message = ChatMessage::user(user_id, content);
        tracing::debug!(user_id, phase = ?TurnPhase::Received, "turn");

        let profile = self.store.get_profile(user_id).await?;
        let shortlist = self.store.list_shortlist(user_id).await?;
        let stage = Stage::resolve(profile.as_ref(), shortlist.len(), locked_count(&shortlist));
        let system = render_system_prompt(&self.prompt_template, profile.as_ref(), &shortlist, stage);

        let history = self.store.recent_messages(user_id, self.history_limit).await?;
        let mut window = ConversationWindow::from_newest_first(&history, self.history_limit);
        window.push(Message::user(content));
        let mut messages = Vec::with_capacity(window.len() + 1);
        messages.push(Message::system(system));
        messages.extend(window.into_messages());
        tracing::debug!(
            user_id,
            phase = ?TurnPhase::ContextBuilt,
            stage = stage.ordinal(),
            history = history.len(),
            "turn"
        );

        let generated = self.generate(&messages).await;
        tracing::debug!(user_id, phase = ?TurnPhase::Generated, ok = generated.is_some(), "turn");

        let parsed = match generated {
            Some(text) => parse_reply(&text),
            None => ParsedReply {
                narrative: FALLBACK_REPLY.to_string(),
                actions: Vec::new(),
            },
        };
        tracing::debug!(user_id, phase = ?TurnPhase::Parsed, actions = parsed.actions.len(), "turn");

        let plan = plan_actions(user_id, &parsed.actions, &shortlist);
        let planned = plan.planned.len();
        tracing::debug!(user_id, phase = ?TurnPhase::Executed, planned, "turn");

        let draft = ChatMessage::assistant(user_id, parsed.narrative.clone(), Vec::new());
        let batch = plan.into_turn_batch(user_message.clone(), draft.clone());
        let report = self.store.apply(&batch).await?;
        let assistant_message = report.reply.unwrap_or(draft);
        let executed = assistant_message.actions.clone().unwrap_or_default();
        if executed.len() < planned || report.locks_skipped > 0 {
            tracing::warn!(
                user_id,
                planned,
                executed = executed.len(),
                skipped = report.locks_skipped,
                "Some actions no longer applied at commit"
            );
        }
        tracing::debug!(user_id, phase = ?TurnPhase::Persisted, "turn");

        let shortlist = self.store.list_shortlist(user_id).await?;
        let stage = Stage::resolve(profile.as_ref(), shortlist.len(), locked_count(&shortlist));

        tracing::info!(
            user_id,
            parsed = parsed.actions.len(),
            executed = executed.len(),
            stage = stage.ordinal(),
            "Counsellor turn completed"
        );

        Ok(TurnOutcome {
            reply: parsed.narrative,
            parsed: parsed.actions,
            executed,
            stage,
            user_message,
            assistant_message,
        })
    }
}
