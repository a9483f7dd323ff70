//! SQLite 持久化（sqlx）
//!
//! 时间戳存 RFC 3339 字符串，列表型字段（意向国家、考试、已执行动作）存 JSON 文本。
//! 外键仅作约束，不声明 ON DELETE CASCADE：级联清理由本模块显式执行。
//! 选校、待办、消息按 user_id 归属但不引用 users 表，与内存实现一样接受尚未注册的用户 ID。

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};

use super::{settle_reply, ApplyReport, CounsellorStore, Mutation, MutationOutcome, StoreError, StoreResult};
use crate::models::{ChatMessage, ChatRole, ExamRecord, Profile, ShortlistEntry, Todo, User};

/// SQLite 存储
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// 打开（不存在则创建）数据库文件并建表
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_url = format!("sqlite:{}?mode=rwc", db_path.as_ref().display());
        let options = SqliteConnectOptions::from_str(&db_url)?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_tables().await?;
        Ok(store)
    }

    async fn init_tables(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                full_name TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL UNIQUE REFERENCES users(id),
                onboarding_complete INTEGER NOT NULL DEFAULT 0,
                current_education_level TEXT,
                degree_major TEXT,
                graduation_year INTEGER,
                gpa TEXT,
                intended_degree TEXT,
                field_of_study TEXT,
                target_intake_year INTEGER,
                preferred_countries TEXT NOT NULL DEFAULT '[]',
                budget_min INTEGER,
                budget_max INTEGER,
                funding_plan TEXT,
                exams TEXT NOT NULL DEFAULT '[]',
                sop_status TEXT,
                strength_academics TEXT,
                strength_exams TEXT,
                strength_sop TEXT
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS shortlists (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                country TEXT NOT NULL,
                domain TEXT,
                web_page TEXT,
                category TEXT,
                cost_level TEXT,
                acceptance_chance TEXT,
                fit_reason TEXT,
                risks TEXT,
                locked INTEGER NOT NULL DEFAULT 0,
                checklist_created INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS todos (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                shortlist_id TEXT REFERENCES shortlists(id),
                title TEXT NOT NULL,
                description TEXT,
                completed INTEGER NOT NULL DEFAULT 0,
                category TEXT,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chat_messages (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                actions TEXT,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_shortlists_user ON shortlists(user_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_todos_user ON todos(user_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_user ON chat_messages(user_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn parse_time(raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| StoreError::Decode(format!("timestamp {raw:?}: {e}")))
}

fn user_from_row(row: &SqliteRow) -> StoreResult<User> {
    let created_at: String = row.get("created_at");
    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        full_name: row.get("full_name"),
        created_at: parse_time(&created_at)?,
    })
}

fn profile_from_row(row: &SqliteRow) -> StoreResult<Profile> {
    let countries: String = row.get("preferred_countries");
    let exams: String = row.get("exams");
    Ok(Profile {
        id: row.get("id"),
        user_id: row.get("user_id"),
        onboarding_complete: row.get("onboarding_complete"),
        current_education_level: row.get("current_education_level"),
        degree_major: row.get("degree_major"),
        graduation_year: row.get("graduation_year"),
        gpa: row.get("gpa"),
        intended_degree: row.get("intended_degree"),
        field_of_study: row.get("field_of_study"),
        target_intake_year: row.get("target_intake_year"),
        preferred_countries: serde_json::from_str(&countries)?,
        budget_min: row.get("budget_min"),
        budget_max: row.get("budget_max"),
        funding_plan: row.get("funding_plan"),
        exams: serde_json::from_str::<Vec<ExamRecord>>(&exams)?,
        sop_status: row.get("sop_status"),
        strength_academics: row.get("strength_academics"),
        strength_exams: row.get("strength_exams"),
        strength_sop: row.get("strength_sop"),
    })
}

fn shortlist_from_row(row: &SqliteRow) -> StoreResult<ShortlistEntry> {
    let created_at: String = row.get("created_at");
    Ok(ShortlistEntry {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        country: row.get("country"),
        domain: row.get("domain"),
        web_page: row.get("web_page"),
        category: row.get("category"),
        cost_level: row.get("cost_level"),
        acceptance_chance: row.get("acceptance_chance"),
        fit_reason: row.get("fit_reason"),
        risks: row.get("risks"),
        locked: row.get("locked"),
        checklist_created: row.get("checklist_created"),
        created_at: parse_time(&created_at)?,
    })
}

fn todo_from_row(row: &SqliteRow) -> StoreResult<Todo> {
    let created_at: String = row.get("created_at");
    Ok(Todo {
        id: row.get("id"),
        user_id: row.get("user_id"),
        shortlist_id: row.get("shortlist_id"),
        title: row.get("title"),
        description: row.get("description"),
        completed: row.get("completed"),
        category: row.get("category"),
        created_at: parse_time(&created_at)?,
    })
}

fn message_from_row(row: &SqliteRow) -> StoreResult<ChatMessage> {
    let role: String = row.get("role");
    let actions: Option<String> = row.get("actions");
    let created_at: String = row.get("created_at");
    Ok(ChatMessage {
        id: row.get("id"),
        user_id: row.get("user_id"),
        role: ChatRole::parse(&role)
            .ok_or_else(|| StoreError::Decode(format!("chat role {role:?}")))?,
        content: row.get("content"),
        actions: actions.map(|a| serde_json::from_str(&a)).transpose()?,
        created_at: parse_time(&created_at)?,
    })
}

async fn owns_shortlist(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: &str,
    shortlist_id: &str,
) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT 1 FROM shortlists WHERE id = ? AND user_id = ?")
        .bind(shortlist_id)
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(row.is_some())
}

/// 待办引用的选校条目必须属于同一用户，否则置空
async fn verified_shortlist<'a>(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: &str,
    shortlist_id: Option<&'a str>,
) -> Result<Option<&'a str>, sqlx::Error> {
    match shortlist_id {
        Some(sid) => {
            if owns_shortlist(tx, user_id, sid).await? {
                Ok(Some(sid))
            } else {
                Ok(None)
            }
        }
        None => Ok(None),
    }
}

/// 写入待办；返回实际写入的选校引用
async fn insert_todo(tx: &mut Transaction<'_, Sqlite>, todo: &Todo) -> StoreResult<Option<String>> {
    let shortlist_id = verified_shortlist(tx, &todo.user_id, todo.shortlist_id.as_deref()).await?;
    sqlx::query(
        "INSERT INTO todos (id, user_id, shortlist_id, title, description, completed, category, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&todo.id)
    .bind(&todo.user_id)
    .bind(shortlist_id)
    .bind(&todo.title)
    .bind(&todo.description)
    .bind(todo.completed)
    .bind(&todo.category)
    .bind(todo.created_at.to_rfc3339())
    .execute(&mut **tx)
    .await?;
    Ok(shortlist_id.map(str::to_string))
}

async fn insert_message(tx: &mut Transaction<'_, Sqlite>, msg: &ChatMessage) -> StoreResult<()> {
    let actions = msg
        .actions
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    sqlx::query(
        "INSERT INTO chat_messages (id, user_id, role, content, actions, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&msg.id)
    .bind(&msg.user_id)
    .bind(msg.role.as_str())
    .bind(&msg.content)
    .bind(actions)
    .bind(msg.created_at.to_rfc3339())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn apply_one(
    tx: &mut Transaction<'_, Sqlite>,
    mutation: &Mutation,
    report: &mut ApplyReport,
) -> StoreResult<MutationOutcome> {
    let outcome = match mutation {
        Mutation::InsertShortlist(s) => {
            sqlx::query(
                "INSERT INTO shortlists (id, user_id, name, country, domain, web_page, category,
                    cost_level, acceptance_chance, fit_reason, risks, locked, checklist_created, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&s.id)
            .bind(&s.user_id)
            .bind(&s.name)
            .bind(&s.country)
            .bind(&s.domain)
            .bind(&s.web_page)
            .bind(&s.category)
            .bind(&s.cost_level)
            .bind(&s.acceptance_chance)
            .bind(&s.fit_reason)
            .bind(&s.risks)
            .bind(s.locked)
            .bind(s.checklist_created)
            .bind(s.created_at.to_rfc3339())
            .execute(&mut **tx)
            .await?;
            report.shortlist_inserted += 1;
            MutationOutcome::Applied
        }
        Mutation::InsertTodo(todo) => {
            let shortlist_id = insert_todo(tx, todo).await?;
            report.todos_inserted += 1;
            MutationOutcome::TodoInserted { shortlist_id }
        }
        Mutation::SetLock {
            user_id,
            shortlist_id,
            locked,
            checklist,
        } => {
            let row = sqlx::query(
                "SELECT locked, checklist_created FROM shortlists WHERE id = ? AND user_id = ?",
            )
            .bind(shortlist_id)
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await?;
            let Some(row) = row else {
                report.locks_skipped += 1;
                return Ok(MutationOutcome::LockSkipped);
            };
            let was_locked: bool = row.get("locked");
            let checklist_created: bool = row.get("checklist_created");
            let generate = *locked && !was_locked && !checklist_created && !checklist.is_empty();

            sqlx::query(
                "UPDATE shortlists SET locked = ?, checklist_created = ? WHERE id = ? AND user_id = ?",
            )
            .bind(*locked)
            .bind(checklist_created || generate)
            .bind(shortlist_id)
            .bind(user_id)
            .execute(&mut **tx)
            .await?;

            if generate {
                for todo in checklist {
                    insert_todo(tx, todo).await?;
                }
                report.checklist_todos_created += checklist.len();
            }
            MutationOutcome::LockApplied {
                checklist_created: if generate { checklist.len() } else { 0 },
            }
        }
        Mutation::UpdateTodo(todo) => {
            let shortlist_id =
                verified_shortlist(tx, &todo.user_id, todo.shortlist_id.as_deref()).await?;
            sqlx::query(
                "UPDATE todos SET shortlist_id = ?, title = ?, description = ?, completed = ?, category = ?
                 WHERE id = ? AND user_id = ?",
            )
            .bind(shortlist_id)
            .bind(&todo.title)
            .bind(&todo.description)
            .bind(todo.completed)
            .bind(&todo.category)
            .bind(&todo.id)
            .bind(&todo.user_id)
            .execute(&mut **tx)
            .await?;
            MutationOutcome::Applied
        }
        Mutation::InsertMessage(msg) => {
            insert_message(tx, msg).await?;
            report.messages_inserted += 1;
            MutationOutcome::Applied
        }
        Mutation::InsertReply { message, actions } => {
            let reply = settle_reply(message, actions, &report.outcomes);
            insert_message(tx, &reply).await?;
            report.messages_inserted += 1;
            report.reply = Some(reply);
            MutationOutcome::Applied
        }
    };
    Ok(outcome)
}

#[async_trait]
impl CounsellorStore for SqliteStore {
    async fn create_user(&self, user: &User) -> StoreResult<Profile> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query("SELECT 1 FROM users WHERE email = ?")
            .bind(&user.email)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_some() {
            return Err(StoreError::Conflict(format!("email {}", user.email)));
        }

        sqlx::query("INSERT INTO users (id, email, full_name, created_at) VALUES (?, ?, ?, ?)")
            .bind(&user.id)
            .bind(&user.email)
            .bind(&user.full_name)
            .bind(user.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;

        let profile = Profile::empty_for(&user.id);
        sqlx::query("INSERT INTO profiles (id, user_id) VALUES (?, ?)")
            .bind(&profile.id)
            .bind(&profile.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(profile)
    }

    async fn get_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn delete_user(&self, user_id: &str) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        for table in ["chat_messages", "todos", "shortlists", "profiles"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE user_id = ?"))
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_profile(&self, user_id: &str) -> StoreResult<Option<Profile>> {
        let row = sqlx::query("SELECT * FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(profile_from_row).transpose()
    }

    async fn save_profile(&self, p: &Profile) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO profiles (id, user_id, onboarding_complete, current_education_level, degree_major,
                graduation_year, gpa, intended_degree, field_of_study, target_intake_year,
                preferred_countries, budget_min, budget_max, funding_plan, exams, sop_status,
                strength_academics, strength_exams, strength_sop)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                onboarding_complete = excluded.onboarding_complete,
                current_education_level = excluded.current_education_level,
                degree_major = excluded.degree_major,
                graduation_year = excluded.graduation_year,
                gpa = excluded.gpa,
                intended_degree = excluded.intended_degree,
                field_of_study = excluded.field_of_study,
                target_intake_year = excluded.target_intake_year,
                preferred_countries = excluded.preferred_countries,
                budget_min = excluded.budget_min,
                budget_max = excluded.budget_max,
                funding_plan = excluded.funding_plan,
                exams = excluded.exams,
                sop_status = excluded.sop_status,
                strength_academics = excluded.strength_academics,
                strength_exams = excluded.strength_exams,
                strength_sop = excluded.strength_sop",
        )
        .bind(&p.id)
        .bind(&p.user_id)
        .bind(p.onboarding_complete)
        .bind(&p.current_education_level)
        .bind(&p.degree_major)
        .bind(p.graduation_year)
        .bind(&p.gpa)
        .bind(&p.intended_degree)
        .bind(&p.field_of_study)
        .bind(p.target_intake_year)
        .bind(serde_json::to_string(&p.preferred_countries)?)
        .bind(p.budget_min)
        .bind(p.budget_max)
        .bind(&p.funding_plan)
        .bind(serde_json::to_string(&p.exams)?)
        .bind(&p.sop_status)
        .bind(&p.strength_academics)
        .bind(&p.strength_exams)
        .bind(&p.strength_sop)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_shortlist(&self, user_id: &str) -> StoreResult<Vec<ShortlistEntry>> {
        let rows = sqlx::query("SELECT * FROM shortlists WHERE user_id = ? ORDER BY rowid ASC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(shortlist_from_row).collect()
    }

    async fn get_shortlist_entry(
        &self,
        user_id: &str,
        shortlist_id: &str,
    ) -> StoreResult<Option<ShortlistEntry>> {
        let row = sqlx::query("SELECT * FROM shortlists WHERE id = ? AND user_id = ?")
            .bind(shortlist_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(shortlist_from_row).transpose()
    }

    async fn delete_shortlist_entry(&self, user_id: &str, shortlist_id: &str) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        if !owns_shortlist(&mut tx, user_id, shortlist_id).await? {
            return Ok(false);
        }
        sqlx::query("DELETE FROM todos WHERE shortlist_id = ? AND user_id = ?")
            .bind(shortlist_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM shortlists WHERE id = ? AND user_id = ?")
            .bind(shortlist_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn list_todos(&self, user_id: &str) -> StoreResult<Vec<Todo>> {
        let rows = sqlx::query("SELECT * FROM todos WHERE user_id = ? ORDER BY rowid ASC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(todo_from_row).collect()
    }

    async fn get_todo(&self, user_id: &str, todo_id: &str) -> StoreResult<Option<Todo>> {
        let row = sqlx::query("SELECT * FROM todos WHERE id = ? AND user_id = ?")
            .bind(todo_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(todo_from_row).transpose()
    }

    async fn delete_todo(&self, user_id: &str, todo_id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ? AND user_id = ?")
            .bind(todo_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn recent_messages(&self, user_id: &str, limit: usize) -> StoreResult<Vec<ChatMessage>> {
        let rows = sqlx::query(
            "SELECT * FROM chat_messages WHERE user_id = ? ORDER BY rowid DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(message_from_row).collect()
    }

    async fn list_messages(&self, user_id: &str) -> StoreResult<Vec<ChatMessage>> {
        let rows = sqlx::query("SELECT * FROM chat_messages WHERE user_id = ? ORDER BY rowid ASC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(message_from_row).collect()
    }

    async fn apply(&self, mutations: &[Mutation]) -> StoreResult<ApplyReport> {
        let mut tx = self.pool.begin().await?;
        let mut report = ApplyReport::default();
        for mutation in mutations {
            let outcome = apply_one(&mut tx, mutation, &mut report).await?;
            report.outcomes.push(outcome);
        }
        tx.commit().await?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExecutedAction, ShortlistRequest};
    use crate::store::PendingAction;
    use tempfile::TempDir;

    async fn open(dir: &TempDir) -> SqliteStore {
        SqliteStore::new(dir.path().join("counsellor.db")).await.unwrap()
    }

    #[tokio::test]
    async fn test_user_profile_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir).await;

        let user = User::new("sam@example.com", "Sam");
        store.create_user(&user).await.unwrap();
        assert!(matches!(
            store.create_user(&User::new("sam@example.com", "Other")).await,
            Err(StoreError::Conflict(_))
        ));

        let mut profile = store.get_profile(&user.id).await.unwrap().unwrap();
        profile.gpa = Some("3.6".into());
        profile.preferred_countries = vec!["Germany".into(), "Canada".into()];
        profile.exams = vec![ExamRecord::new("IELTS", "Completed")];
        profile.onboarding_complete = true;
        store.save_profile(&profile).await.unwrap();

        store.close().await;
        let reopened = open(&dir).await;
        let loaded = reopened.get_profile(&user.id).await.unwrap().unwrap();
        assert_eq!(loaded, profile);
        let found = reopened.find_user_by_email("sam@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn test_apply_turn_and_cascade_delete() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir).await;
        let user = User::new("kim@example.com", "Kim");
        store.create_user(&user).await.unwrap();

        let entry = ShortlistEntry::from_request(
            &user.id,
            ShortlistRequest {
                name: "TU Munich".into(),
                country: "Germany".into(),
                ..ShortlistRequest::default()
            },
        );
        let checklist: Vec<Todo> = (0..3)
            .map(|i| Todo::new(&user.id, format!("step {i}")).with_shortlist(Some(entry.id.clone())))
            .collect();
        let executed = vec![ExecutedAction::Lock {
            shortlist_id: entry.id.clone(),
            checklist_created: 3,
        }];

        let report = store
            .apply(&[
                Mutation::InsertMessage(ChatMessage::user(&user.id, "lock it")),
                Mutation::InsertShortlist(entry.clone()),
                Mutation::SetLock {
                    user_id: user.id.clone(),
                    shortlist_id: entry.id.clone(),
                    locked: true,
                    checklist: checklist.clone(),
                },
                Mutation::InsertTodo(Todo::new(&user.id, "dangling").with_shortlist(Some("nope".into()))),
                Mutation::InsertMessage(ChatMessage::assistant(&user.id, "done", executed.clone())),
            ])
            .await
            .unwrap();
        assert_eq!(report.checklist_todos_created, 3);
        assert_eq!(report.messages_inserted, 2);

        let messages = store.list_messages(&user.id).await.unwrap();
        assert_eq!(messages[0].role, ChatRole::User);
        assert_eq!(messages[1].role, ChatRole::Assistant);
        assert_eq!(messages[1].actions, Some(executed));

        let todos = store.list_todos(&user.id).await.unwrap();
        assert_eq!(todos.len(), 4);
        assert_eq!(todos[3].shortlist_id, None);

        let locked = store.get_shortlist_entry(&user.id, &entry.id).await.unwrap().unwrap();
        assert!(locked.locked && locked.checklist_created);

        assert!(store.delete_shortlist_entry(&user.id, &entry.id).await.unwrap());
        assert_eq!(store.list_todos(&user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reply_settled_against_commit_state() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir).await;
        let missing = "gone".to_string();
        let todo = Todo::new("ghost", "Email them").with_shortlist(Some(missing.clone()));

        let report = store
            .apply(&[
                Mutation::InsertMessage(ChatMessage::user("ghost", "lock it")),
                Mutation::SetLock {
                    user_id: "ghost".into(),
                    shortlist_id: missing.clone(),
                    locked: true,
                    checklist: vec![Todo::new("ghost", "never")],
                },
                Mutation::InsertTodo(todo.clone()),
                Mutation::InsertReply {
                    message: ChatMessage::assistant("ghost", "ok", vec![]),
                    actions: vec![
                        PendingAction {
                            action: ExecutedAction::Lock {
                                shortlist_id: missing.clone(),
                                checklist_created: 1,
                            },
                            mutation: 1,
                        },
                        PendingAction {
                            action: ExecutedAction::TodoAdd {
                                todo_id: todo.id.clone(),
                                title: todo.title.clone(),
                                shortlist_id: Some(missing),
                            },
                            mutation: 2,
                        },
                    ],
                },
            ])
            .await
            .unwrap();

        assert_eq!(report.outcomes[1], MutationOutcome::LockSkipped);
        assert_eq!(report.outcomes[2], MutationOutcome::TodoInserted { shortlist_id: None });
        let expected = Some(vec![ExecutedAction::TodoAdd {
            todo_id: todo.id.clone(),
            title: todo.title.clone(),
            shortlist_id: None,
        }]);
        assert_eq!(report.reply.and_then(|r| r.actions), expected);

        let messages = store.list_messages("ghost").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].actions, expected);
        assert_eq!(store.list_todos("ghost").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_batch_is_rolled_back() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir).await;
        let user = User::new("lee@example.com", "Lee");
        store.create_user(&user).await.unwrap();

        let msg = ChatMessage::user(&user.id, "hi");
        // 同一 ID 插入两次触发主键冲突，整批回滚
        let result = store
            .apply(&[
                Mutation::InsertMessage(msg.clone()),
                Mutation::InsertMessage(msg),
            ])
            .await;
        assert!(result.is_err());
        assert!(store.list_messages(&user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_user_removes_everything() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir).await;
        let user = User::new("ana@example.com", "Ana");
        store.create_user(&user).await.unwrap();
        store
            .apply(&[
                Mutation::InsertMessage(ChatMessage::user(&user.id, "hello")),
                Mutation::InsertTodo(Todo::new(&user.id, "task")),
            ])
            .await
            .unwrap();

        assert!(store.delete_user(&user.id).await.unwrap());
        assert!(store.get_user(&user.id).await.unwrap().is_none());
        assert!(store.get_profile(&user.id).await.unwrap().is_none());
        assert!(store.list_todos(&user.id).await.unwrap().is_empty());
        assert!(!store.delete_user(&user.id).await.unwrap());
    }
}
