//! 动作执行器：把解析出的动作转换为一批有序的存储写操作
//!
//! 纯函数，不触碰存储。针对用户当前清单的工作副本逐条处理动作，同一轮内先加入的条目
//! 可被后续动作引用，同一条目在一轮内锁定两次只生效一次。
//! 不合法的字段按默认值降级；无法执行的动作跳过，只写审计日志，不报错。
//! 每个计划中的动作都对应一条写操作，最终记录在提交时按该写操作的结果结算。

use serde_json::Value;

use crate::counsellor::actions::RawAction;
use crate::counsellor::checklist::build_checklist;
use crate::models::{ChatMessage, ExecutedAction, ShortlistEntry, ShortlistRequest, Todo};
use crate::store::{Mutation, PendingAction};

/// 执行计划：待结算的动作记录与对应的写操作
///
/// `planned[i].mutation` 是 `mutations` 内的下标。
#[derive(Debug, Default)]
pub struct ExecutionPlan {
    pub planned: Vec<PendingAction>,
    pub mutations: Vec<Mutation>,
}

impl ExecutionPlan {
    fn push(&mut self, action: ExecutedAction, mutation: Mutation) {
        self.planned.push(PendingAction {
            action,
            mutation: self.mutations.len(),
        });
        self.mutations.push(mutation);
    }

    /// 计划阶段预期的动作记录（尚未经过提交校验）
    pub fn expected(&self) -> Vec<ExecutedAction> {
        self.planned.iter().map(|p| p.action.clone()).collect()
    }

    /// 一轮的写入批次：用户消息 → 动作写操作 → 助手消息（动作在同一事务内结算）
    pub fn into_turn_batch(self, user_message: ChatMessage, reply: ChatMessage) -> Vec<Mutation> {
        let actions = self
            .planned
            .into_iter()
            .map(|p| PendingAction {
                mutation: p.mutation + 1,
                ..p
            })
            .collect();
        let mut batch = Vec::with_capacity(self.mutations.len() + 2);
        batch.push(Mutation::InsertMessage(user_message));
        batch.extend(self.mutations);
        batch.push(Mutation::InsertReply {
            message: reply,
            actions,
        });
        batch
    }
}

/// 动作种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    ShortlistAdd,
    TodoAdd,
    Lock,
}

impl ActionKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "shortlist_add" => Some(ActionKind::ShortlistAdd),
            "todo_add" => Some(ActionKind::TodoAdd),
            "lock" => Some(ActionKind::Lock),
            _ => None,
        }
    }
}

/// 读取字符串字段：接受字符串或数字，空白视为缺省
fn field(action: &RawAction, key: &str) -> Option<String> {
    match action.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn audit(kind: &str, outcome: &str, reason: Option<&str>) {
    let audit = serde_json::json!({
        "event": "action_audit",
        "kind": kind,
        "outcome": outcome,
        "reason": reason,
    });
    tracing::info!(audit = %audit.to_string(), "action");
}

fn shortlist_request(action: &RawAction) -> ShortlistRequest {
    let name = field(action, "name").unwrap_or_else(|| "Unknown".to_string());
    let country = field(action, "country").unwrap_or_else(|| "Unknown".to_string());
    let category = field(action, "category")
        .map(|c| c.to_lowercase())
        .unwrap_or_else(|| "target".to_string());

    ShortlistRequest {
        fit_reason: Some(
            field(action, "fit_reason").unwrap_or_else(|| format!("Recommended for {country}")),
        ),
        risks: Some(
            field(action, "risks").unwrap_or_else(|| "Standard competitive admission".to_string()),
        ),
        domain: field(action, "domain"),
        web_page: field(action, "web_page"),
        category: Some(category),
        cost_level: field(action, "cost_level"),
        acceptance_chance: field(action, "acceptance_chance"),
        name,
        country,
    }
}

/// 规划一轮动作
///
/// `shortlist` 为用户当前的选校清单；其它用户的条目会被忽略。
pub fn plan_actions(user_id: &str, actions: &[RawAction], shortlist: &[ShortlistEntry]) -> ExecutionPlan {
    let mut working: Vec<ShortlistEntry> = shortlist
        .iter()
        .filter(|e| e.user_id == user_id)
        .cloned()
        .collect();
    let mut plan = ExecutionPlan::default();

    for action in actions {
        let Some(kind_str) = field(action, "type") else {
            audit("unknown", "ignored", Some("missing type"));
            continue;
        };
        let Some(kind) = ActionKind::parse(&kind_str) else {
            audit(&kind_str, "ignored", Some("unknown action type"));
            continue;
        };

        match kind {
            ActionKind::ShortlistAdd => {
                let entry = ShortlistEntry::from_request(user_id, shortlist_request(action));
                plan.push(
                    ExecutedAction::ShortlistAdd {
                        shortlist_id: entry.id.clone(),
                        name: entry.name.clone(),
                        country: entry.country.clone(),
                        category: entry.category.clone().unwrap_or_default(),
                    },
                    Mutation::InsertShortlist(entry.clone()),
                );
                working.push(entry);
                audit(&kind_str, "planned", None);
            }
            ActionKind::TodoAdd => {
                let requested = field(action, "shortlist_id");
                let shortlist_id = requested
                    .as_ref()
                    .filter(|id| working.iter().any(|e| &e.id == *id))
                    .cloned();
                let dropped_link = requested.is_some() && shortlist_id.is_none();
                let todo = Todo::new(
                    user_id,
                    field(action, "title").unwrap_or_else(|| "Task".to_string()),
                )
                .with_description(field(action, "description"))
                .with_category(field(action, "category"))
                .with_shortlist(shortlist_id);

                plan.push(
                    ExecutedAction::TodoAdd {
                        todo_id: todo.id.clone(),
                        title: todo.title.clone(),
                        shortlist_id: todo.shortlist_id.clone(),
                    },
                    Mutation::InsertTodo(todo),
                );
                audit(
                    &kind_str,
                    "planned",
                    dropped_link.then_some("unknown shortlist_id dropped"),
                );
            }
            ActionKind::Lock => {
                let Some(id) = field(action, "shortlist_id") else {
                    audit(&kind_str, "skipped", Some("missing shortlist_id"));
                    continue;
                };
                let Some(entry) = working.iter_mut().find(|e| e.id == id) else {
                    audit(&kind_str, "skipped", Some("shortlist entry not found"));
                    continue;
                };

                // 已锁定的条目同样提交一次锁定，由存储确认条目仍然存在
                let checklist = if entry.locked || entry.checklist_created {
                    Vec::new()
                } else {
                    build_checklist(user_id, entry)
                };
                let reason = entry.locked.then_some("already locked");
                entry.locked = true;
                entry.checklist_created = true;

                plan.push(
                    ExecutedAction::Lock {
                        shortlist_id: id.clone(),
                        checklist_created: checklist.len(),
                    },
                    Mutation::SetLock {
                        user_id: user_id.to_string(),
                        shortlist_id: id,
                        locked: true,
                        checklist,
                    },
                );
                audit(&kind_str, "planned", reason);
            }
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn actions(value: Value) -> Vec<RawAction> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    fn entry_for(user_id: &str, name: &str) -> ShortlistEntry {
        ShortlistEntry::from_request(
            user_id,
            ShortlistRequest {
                name: name.into(),
                country: "Canada".into(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_shortlist_add_defaults() {
        let plan = plan_actions("u1", &actions(json!([{"type": "shortlist_add"}])), &[]);
        assert_eq!(plan.mutations.len(), 1);
        let Mutation::InsertShortlist(entry) = &plan.mutations[0] else {
            panic!("expected shortlist insert");
        };
        assert_eq!(entry.name, "Unknown");
        assert_eq!(entry.country, "Unknown");
        assert_eq!(entry.category.as_deref(), Some("target"));
        assert_eq!(entry.fit_reason.as_deref(), Some("Recommended for Unknown"));
        assert_eq!(entry.risks.as_deref(), Some("Standard competitive admission"));
    }

    #[test]
    fn test_numbers_accepted_and_blank_is_absent() {
        let plan = plan_actions(
            "u1",
            &actions(json!([{
                "type": "shortlist_add",
                "name": "MIT",
                "country": "United States",
                "acceptance_chance": 4,
                "category": " Dream ",
                "domain": "   "
            }])),
            &[],
        );
        let Mutation::InsertShortlist(entry) = &plan.mutations[0] else {
            panic!("expected shortlist insert");
        };
        assert_eq!(entry.acceptance_chance.as_deref(), Some("4"));
        assert_eq!(entry.category.as_deref(), Some("dream"));
        assert!(entry.domain.is_none());
    }

    #[test]
    fn test_lock_foreign_entry_skipped() {
        let foreign = entry_for("u2", "Toronto");
        let parsed = actions(json!([{"type": "lock", "shortlist_id": foreign.id}]));
        let plan = plan_actions("u1", &parsed, &[foreign]);
        assert!(plan.planned.is_empty());
        assert!(plan.mutations.is_empty());
    }

    #[test]
    fn test_lock_generates_checklist_once_per_turn() {
        let own = entry_for("u1", "Toronto");
        let parsed = actions(json!([
            {"type": "lock", "shortlist_id": own.id},
            {"type": "lock", "shortlist_id": own.id}
        ]));
        let plan = plan_actions("u1", &parsed, &[own.clone()]);

        assert_eq!(plan.mutations.len(), 2);
        assert_eq!(plan.planned[1].mutation, 1);
        assert_eq!(
            plan.expected(),
            vec![
                ExecutedAction::Lock { shortlist_id: own.id.clone(), checklist_created: 9 },
                ExecutedAction::Lock { shortlist_id: own.id.clone(), checklist_created: 0 },
            ]
        );
    }

    #[test]
    fn test_relock_after_unlock_has_no_checklist() {
        let mut own = entry_for("u1", "Toronto");
        own.checklist_created = true;
        let parsed = actions(json!([{"type": "lock", "shortlist_id": own.id}]));
        let plan = plan_actions("u1", &parsed, &[own]);
        let Mutation::SetLock { checklist, locked, .. } = &plan.mutations[0] else {
            panic!("expected lock");
        };
        assert!(*locked);
        assert!(checklist.is_empty());
    }

    #[test]
    fn test_todo_links_validated() {
        let existing = entry_for("u1", "McGill");
        let parsed = actions(json!([
            {"type": "todo_add", "title": "Email McGill", "shortlist_id": existing.id},
            {"type": "todo_add", "shortlist_id": "missing"}
        ]));
        let plan = plan_actions("u1", &parsed, &[existing.clone()]);
        let todos: Vec<_> = plan
            .mutations
            .iter()
            .filter_map(|m| match m {
                Mutation::InsertTodo(t) => Some(t),
                _ => None,
            })
            .collect();
        assert_eq!(todos[0].shortlist_id.as_deref(), Some(existing.id.as_str()));
        assert_eq!(todos[1].title, "Task");
        assert!(todos[1].shortlist_id.is_none());
    }

    #[test]
    fn test_turn_batch_offsets_pending_actions() {
        let own = entry_for("u1", "Toronto");
        let parsed = actions(json!([
            {"type": "todo_add", "title": "Draft SOP"},
            {"type": "lock", "shortlist_id": own.id}
        ]));
        let plan = plan_actions("u1", &parsed, &[own]);
        let batch = plan.into_turn_batch(
            ChatMessage::user("u1", "hi"),
            ChatMessage::assistant("u1", "ok", vec![]),
        );

        assert_eq!(batch.len(), 4);
        assert!(matches!(batch[0], Mutation::InsertMessage(_)));
        let Mutation::InsertReply { actions, .. } = &batch[3] else {
            panic!("expected reply last");
        };
        assert!(matches!(batch[actions[0].mutation], Mutation::InsertTodo(_)));
        assert!(matches!(batch[actions[1].mutation], Mutation::SetLock { .. }));
    }

    #[test]
    fn test_unknown_and_untyped_ignored() {
        let parsed = actions(json!([{"type": "delete_everything"}, {"title": "x"}]));
        let plan = plan_actions("u1", &parsed, &[]);
        assert!(plan.planned.is_empty());
        assert!(plan.mutations.is_empty());
    }
}
