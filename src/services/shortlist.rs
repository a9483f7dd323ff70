//! 选校清单：列表、添加、移除、锁定 / 解锁

use serde::Serialize;

use crate::core::CounsellorError;
use crate::counsellor::build_checklist;
use crate::models::{ShortlistEntry, ShortlistRequest};
use crate::store::{CounsellorStore, Mutation};

/// 锁定在前，其余按加入顺序
pub async fn list_shortlist(
    store: &dyn CounsellorStore,
    user_id: &str,
) -> Result<Vec<ShortlistEntry>, CounsellorError> {
    let mut entries = store.list_shortlist(user_id).await?;
    entries.sort_by_key(|e| !e.locked);
    Ok(entries)
}

pub async fn add_to_shortlist(
    store: &dyn CounsellorStore,
    user_id: &str,
    request: ShortlistRequest,
) -> Result<ShortlistEntry, CounsellorError> {
    if request.name.trim().is_empty() {
        return Err(CounsellorError::InvalidInput(
            "university name must not be empty".to_string(),
        ));
    }
    let entry = ShortlistEntry::from_request(user_id, request);
    store
        .apply(&[Mutation::InsertShortlist(entry.clone())])
        .await?;
    Ok(entry)
}

/// 移除条目及其关联待办
pub async fn remove_from_shortlist(
    store: &dyn CounsellorStore,
    user_id: &str,
    shortlist_id: &str,
) -> Result<(), CounsellorError> {
    if store.delete_shortlist_entry(user_id, shortlist_id).await? {
        Ok(())
    } else {
        Err(CounsellorError::NotFound("Shortlist entry"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockOutcome {
    pub locked: bool,
    /// 本次生成的清单待办数
    pub checklist_created: usize,
}

/// 锁定或解锁；首次锁定生成申请清单
pub async fn set_lock(
    store: &dyn CounsellorStore,
    user_id: &str,
    shortlist_id: &str,
    lock: bool,
) -> Result<LockOutcome, CounsellorError> {
    let entry = store
        .get_shortlist_entry(user_id, shortlist_id)
        .await?
        .ok_or(CounsellorError::NotFound("Shortlist entry"))?;

    let checklist = if lock && !entry.locked && !entry.checklist_created {
        build_checklist(user_id, &entry)
    } else {
        Vec::new()
    };
    let report = store
        .apply(&[Mutation::SetLock {
            user_id: user_id.to_string(),
            shortlist_id: shortlist_id.to_string(),
            locked: lock,
            checklist,
        }])
        .await?;
    if report.locks_skipped > 0 {
        return Err(CounsellorError::NotFound("Shortlist entry"));
    }

    tracing::info!(user_id, shortlist_id, lock, checklist = report.checklist_todos_created, "Lock updated");
    Ok(LockOutcome {
        locked: lock,
        checklist_created: report.checklist_todos_created,
    })
}
