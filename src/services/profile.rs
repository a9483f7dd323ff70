//! 画像：读取、部分更新、完成引导

use crate::core::CounsellorError;
use crate::models::{Profile, ProfileUpdate};
use crate::store::CounsellorStore;

pub async fn get_profile(
    store: &dyn CounsellorStore,
    user_id: &str,
) -> Result<Profile, CounsellorError> {
    store
        .get_profile(user_id)
        .await?
        .ok_or(CounsellorError::NotFound("Profile"))
}

/// 只修改请求中给出的字段
pub async fn update_profile(
    store: &dyn CounsellorStore,
    user_id: &str,
    update: ProfileUpdate,
) -> Result<Profile, CounsellorError> {
    let mut profile = get_profile(store, user_id).await?;
    profile.apply_update(update);
    store.save_profile(&profile).await?;
    Ok(profile)
}

pub async fn complete_onboarding(
    store: &dyn CounsellorStore,
    user_id: &str,
) -> Result<Profile, CounsellorError> {
    let mut profile = get_profile(store, user_id).await?;
    profile.onboarding_complete = true;
    store.save_profile(&profile).await?;
    tracing::info!(user_id, "Onboarding completed");
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::accounts::signup;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_partial_update_and_onboarding() {
        let store = MemoryStore::new();
        let (user, _) = signup(&store, "p@x.com", "P").await.unwrap();

        update_profile(
            &store,
            &user.id,
            ProfileUpdate {
                degree_major: Some("Mechanical Engineering".into()),
                preferred_countries: Some(vec!["Germany".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let updated = update_profile(
            &store,
            &user.id,
            ProfileUpdate {
                gpa: Some("8.1".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.degree_major.as_deref(), Some("Mechanical Engineering"));
        assert_eq!(updated.gpa.as_deref(), Some("8.1"));

        let done = complete_onboarding(&store, &user.id).await.unwrap();
        assert!(done.onboarding_complete);
        assert!(get_profile(&store, &user.id).await.unwrap().onboarding_complete);
    }

    #[tokio::test]
    async fn test_missing_profile() {
        let store = MemoryStore::new();
        assert!(matches!(
            get_profile(&store, "nobody").await,
            Err(CounsellorError::NotFound("Profile"))
        ));
    }
}
