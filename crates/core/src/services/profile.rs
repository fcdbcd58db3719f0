//! Profile service.

use hunsuking_common::{AppError, AppResult, IdGenerator};
use hunsuking_db::{
    entities::profile,
    repositories::{ProfileRepository, UserRepository},
};
use sea_orm::Set;

/// Maximum number of selected tags on a profile.
const MAX_TAGS: usize = 3;

/// Hunsoo level bounds.
const MIN_LEVEL: i32 = 1;
const MAX_LEVEL: i32 = 10;

/// Input for updating a profile.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileInput {
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub selected_tags: Option<Vec<String>>,
}

/// Profile service for business logic.
#[derive(Clone)]
pub struct ProfileService {
    profile_repo: ProfileRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl ProfileService {
    /// Create a new profile service.
    #[must_use]
    pub const fn new(profile_repo: ProfileRepository, user_repo: UserRepository) -> Self {
        Self {
            profile_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Get a user's profile, creating the default one on first access.
    pub async fn get_or_create(&self, user_id: &str) -> AppResult<profile::Model> {
        if let Some(profile) = self.profile_repo.find_by_user(user_id).await? {
            return Ok(profile);
        }

        // The user must exist even if the profile row does not yet.
        self.user_repo.get_by_id(user_id).await?;

        let model = profile::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            bio: Set(String::new()),
            hunsoo_level: Set(MIN_LEVEL),
            warning_count: Set(0),
            selected_comment_count: Set(0),
            profile_image: Set(None),
            selected_tags: Set(serde_json::json!([])),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        self.profile_repo.create(model).await
    }

    /// Update your own profile.
    pub async fn update(&self, user_id: &str, input: UpdateProfileInput) -> AppResult<profile::Model> {
        if let Some(ref tags) = input.selected_tags {
            if tags.len() > MAX_TAGS {
                return Err(AppError::Validation(format!(
                    "At most {MAX_TAGS} tags are allowed"
                )));
            }
        }

        let current = self.profile_repo.get_by_user(user_id).await?;

        let mut model: profile::ActiveModel = current.into();
        if let Some(bio) = input.bio {
            model.bio = Set(bio);
        }
        if let Some(image) = input.profile_image {
            model.profile_image = Set(Some(image));
        }
        if let Some(tags) = input.selected_tags {
            model.selected_tags = Set(serde_json::json!(tags));
        }
        model.updated_at = Set(Some(chrono::Utc::now().into()));

        self.profile_repo.update(model).await
    }

    /// Set a user's hunsoo level. Admin only, bounded to 1..=10.
    pub async fn set_hunsoo_level(
        &self,
        is_admin: bool,
        user_id: &str,
        level: i32,
    ) -> AppResult<()> {
        if !is_admin {
            return Err(AppError::PermissionDenied(
                "Admin access required".to_string(),
            ));
        }
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
            return Err(AppError::Validation(format!(
                "Hunsoo level must be between {MIN_LEVEL} and {MAX_LEVEL}"
            )));
        }

        self.profile_repo.get_by_user(user_id).await?;
        self.profile_repo.set_hunsoo_level(user_id, level).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use serde_json::json;
    use std::sync::Arc;

    fn test_profile(id: &str, user_id: &str) -> profile::Model {
        profile::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            bio: String::new(),
            hunsoo_level: 1,
            warning_count: 0,
            selected_comment_count: 0,
            profile_image: None,
            selected_tags: json!([]),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service(db: Arc<DatabaseConnection>) -> ProfileService {
        ProfileService::new(ProfileRepository::new(db.clone()), UserRepository::new(db))
    }

    #[tokio::test]
    async fn test_get_or_create_returns_existing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_profile("p1", "u1")]])
                .into_connection(),
        );
        let svc = service(db);

        let profile = svc.get_or_create("u1").await.unwrap();
        assert_eq!(profile.id, "p1");
    }

    #[tokio::test]
    async fn test_update_rejects_too_many_tags() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = service(db);

        let input = UpdateProfileInput {
            selected_tags: Some(vec![
                "a".to_string(),
                "b".to_string(),
                "c".to_string(),
                "d".to_string(),
            ]),
            ..Default::default()
        };

        let result = svc.update("u1", input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_set_hunsoo_level_bounds() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = service(db);

        let result = svc.set_hunsoo_level(true, "u1", 11).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = svc.set_hunsoo_level(false, "u1", 5).await;
        assert!(matches!(result, Err(AppError::PermissionDenied(_))));
    }
}
