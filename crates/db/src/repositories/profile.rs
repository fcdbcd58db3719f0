//! Profile repository.

use std::sync::Arc;

use crate::entities::{Profile, profile};
use hunsuking_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};

/// Profile repository for database operations.
#[derive(Clone)]
pub struct ProfileRepository {
    db: Arc<DatabaseConnection>,
}

impl ProfileRepository {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user's profile.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Option<profile::Model>> {
        Profile::find()
            .filter(profile::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user's profile, erroring if missing.
    pub async fn get_by_user(&self, user_id: &str) -> AppResult<profile::Model> {
        self.find_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))
    }

    /// Create a profile.
    pub async fn create(&self, model: profile::ActiveModel) -> AppResult<profile::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update profile fields (bio, image, tags).
    pub async fn update(&self, model: profile::ActiveModel) -> AppResult<profile::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Increment the warning counter atomically.
    pub async fn increment_warning_count(&self, user_id: &str) -> AppResult<()> {
        Profile::update_many()
            .col_expr(
                profile::Column::WarningCount,
                Expr::col(profile::Column::WarningCount).add(1),
            )
            .col_expr(
                profile::Column::UpdatedAt,
                Expr::value(chrono::Utc::now()),
            )
            .filter(profile::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Increment the selected-comment counter atomically.
    pub async fn increment_selected_comment_count(&self, user_id: &str) -> AppResult<()> {
        Profile::update_many()
            .col_expr(
                profile::Column::SelectedCommentCount,
                Expr::col(profile::Column::SelectedCommentCount).add(1),
            )
            .col_expr(
                profile::Column::UpdatedAt,
                Expr::value(chrono::Utc::now()),
            )
            .filter(profile::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Set the hunsoo level.
    pub async fn set_hunsoo_level(&self, user_id: &str, level: i32) -> AppResult<()> {
        Profile::update_many()
            .col_expr(profile::Column::HunsooLevel, Expr::value(level))
            .col_expr(
                profile::Column::UpdatedAt,
                Expr::value(chrono::Utc::now()),
            )
            .filter(profile::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;

    fn create_test_profile(id: &str, user_id: &str) -> profile::Model {
        profile::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            bio: "Here to give blunt advice.".to_string(),
            hunsoo_level: 1,
            warning_count: 0,
            selected_comment_count: 0,
            profile_image: None,
            selected_tags: json!(["career"]),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_user_found() {
        let profile = create_test_profile("p1", "u1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile]])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        let found = repo.get_by_user("u1").await.unwrap();

        assert_eq!(found.user_id, "u1");
        assert_eq!(found.hunsoo_level, 1);
    }

    #[tokio::test]
    async fn test_get_by_user_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<profile::Model>::new()])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        let result = repo.get_by_user("missing").await;

        match result {
            Err(AppError::UserNotFound(id)) => assert_eq!(id, "missing"),
            _ => panic!("Expected UserNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_increment_warning_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        repo.increment_warning_count("u1").await.unwrap();
    }
}
