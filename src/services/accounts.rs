//! 账号：注册与按邮箱查找

use crate::core::CounsellorError;
use crate::models::{Profile, User};
use crate::store::{CounsellorStore, StoreError};

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// 注册：创建用户并同时创建空画像
pub async fn signup(
    store: &dyn CounsellorStore,
    email: &str,
    full_name: &str,
) -> Result<(User, Profile), CounsellorError> {
    let email = normalize_email(email);
    if email.is_empty() || !email.contains('@') {
        return Err(CounsellorError::InvalidInput(format!(
            "invalid email address: {email:?}"
        )));
    }
    if store.find_user_by_email(&email).await?.is_some() {
        return Err(CounsellorError::EmailTaken);
    }

    let user = User::new(email, full_name.trim());
    let profile = store.create_user(&user).await.map_err(|e| match e {
        StoreError::Conflict(_) => CounsellorError::EmailTaken,
        other => other.into(),
    })?;
    tracing::info!(user_id = %user.id, "User signed up");
    Ok((user, profile))
}

pub async fn find_by_email(
    store: &dyn CounsellorStore,
    email: &str,
) -> Result<User, CounsellorError> {
    store
        .find_user_by_email(&normalize_email(email))
        .await?
        .ok_or(CounsellorError::NotFound("User"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_signup_and_lookup() {
        let store = MemoryStore::new();
        let (user, profile) = signup(&store, " Asha@Example.com ", "Asha").await.unwrap();
        assert_eq!(user.email, "asha@example.com");
        assert_eq!(profile.user_id, user.id);
        assert!(!profile.onboarding_complete);

        let found = find_by_email(&store, "ASHA@example.com").await.unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn test_signup_errors() {
        let store = MemoryStore::new();
        signup(&store, "a@b.com", "A").await.unwrap();
        assert!(matches!(
            signup(&store, "a@b.com", "Again").await,
            Err(CounsellorError::EmailTaken)
        ));
        assert!(matches!(
            signup(&store, "not-an-email", "X").await,
            Err(CounsellorError::InvalidInput(_))
        ));
        assert!(matches!(
            find_by_email(&store, "missing@b.com").await,
            Err(CounsellorError::NotFound("User"))
        ));
    }
}
