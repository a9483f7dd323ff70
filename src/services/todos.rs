//! 待办：增删改查；关联的选校条目必须属于同一用户

use crate::core::CounsellorError;
use crate::models::{Todo, TodoRequest, TodoUpdate};
use crate::store::{CounsellorStore, Mutation};

async fn ensure_shortlist(
    store: &dyn CounsellorStore,
    user_id: &str,
    shortlist_id: Option<&str>,
) -> Result<(), CounsellorError> {
    if let Some(id) = shortlist_id {
        if store.get_shortlist_entry(user_id, id).await?.is_none() {
            return Err(CounsellorError::NotFound("Shortlist entry"));
        }
    }
    Ok(())
}

pub async fn list_todos(
    store: &dyn CounsellorStore,
    user_id: &str,
) -> Result<Vec<Todo>, CounsellorError> {
    Ok(store.list_todos(user_id).await?)
}

pub async fn create_todo(
    store: &dyn CounsellorStore,
    user_id: &str,
    request: TodoRequest,
) -> Result<Todo, CounsellorError> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(CounsellorError::InvalidInput(
            "todo title must not be empty".to_string(),
        ));
    }
    ensure_shortlist(store, user_id, request.shortlist_id.as_deref()).await?;

    let todo = Todo::new(user_id, title)
        .with_description(request.description)
        .with_category(request.category)
        .with_shortlist(request.shortlist_id);
    store.apply(&[Mutation::InsertTodo(todo.clone())]).await?;
    Ok(todo)
}

/// 部分更新：None 字段保持原值
pub async fn update_todo(
    store: &dyn CounsellorStore,
    user_id: &str,
    todo_id: &str,
    update: TodoUpdate,
) -> Result<Todo, CounsellorError> {
    let mut todo = store
        .get_todo(user_id, todo_id)
        .await?
        .ok_or(CounsellorError::NotFound("Todo"))?;
    ensure_shortlist(store, user_id, update.shortlist_id.as_deref()).await?;

    if let Some(title) = update.title.filter(|t| !t.trim().is_empty()) {
        todo.title = title;
    }
    if let Some(description) = update.description {
        todo.description = Some(description);
    }
    if let Some(completed) = update.completed {
        todo.completed = completed;
    }
    if let Some(category) = update.category {
        todo.category = Some(category);
    }
    if let Some(shortlist_id) = update.shortlist_id {
        todo.shortlist_id = Some(shortlist_id);
    }

    store.apply(&[Mutation::UpdateTodo(todo.clone())]).await?;
    Ok(todo)
}

pub async fn delete_todo(
    store: &dyn CounsellorStore,
    user_id: &str,
    todo_id: &str,
) -> Result<(), CounsellorError> {
    if store.delete_todo(user_id, todo_id).await? {
        Ok(())
    } else {
        Err(CounsellorError::NotFound("Todo"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_todo_lifecycle() {
        let store = MemoryStore::new();
        let todo = create_todo(
            &store,
            "u1",
            TodoRequest {
                title: "Book IELTS slot".into(),
                category: Some("exams".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let done = update_todo(
            &store,
            "u1",
            &todo.id,
            TodoUpdate {
                completed: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(done.completed);
        assert_eq!(done.title, "Book IELTS slot");
        assert!(list_todos(&store, "u1").await.unwrap()[0].completed);

        delete_todo(&store, "u1", &todo.id).await.unwrap();
        assert!(matches!(
            delete_todo(&store, "u1", &todo.id).await,
            Err(CounsellorError::NotFound("Todo"))
        ));
    }

    #[tokio::test]
    async fn test_foreign_shortlist_rejected() {
        let store = MemoryStore::new();
        let err = create_todo(
            &store,
            "u1",
            TodoRequest {
                title: "Email admissions".into(),
                shortlist_id: Some("someone-elses".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CounsellorError::NotFound("Shortlist entry")));
        assert!(list_todos(&store, "u1").await.unwrap().is_empty());
    }
}
