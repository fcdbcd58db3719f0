//! Notification repository.
//!
//! Delivery is effectively-once: the dedup index on
//! (recipient, actor, verb, target kind, target id) rejects a second insert
//! of the same event, and [`NotificationRepository::insert_unique`] treats
//! that rejection as a silent skip rather than an error.

use std::sync::Arc;

use crate::entities::{
    Notification,
    notification::{self, NotificationTarget, NotificationVerb},
};
use hunsuking_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};

/// Notification repository for database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a notification, skipping silently when the dedup index says
    /// this exact event was already delivered.
    ///
    /// Returns `Ok(None)` on the duplicate path.
    pub async fn insert_unique(
        &self,
        id: &str,
        recipient_id: Option<&str>,
        actor_id: Option<&str>,
        verb: NotificationVerb,
        target: &NotificationTarget,
        article_id: &str,
        is_admin: bool,
    ) -> AppResult<Option<notification::Model>> {
        let model = notification::ActiveModel {
            id: Set(id.to_string()),
            recipient_id: Set(recipient_id.map(ToString::to_string)),
            actor_id: Set(actor_id.map(ToString::to_string)),
            verb: Set(verb),
            target_kind: Set(target.kind()),
            target_id: Set(target.id().to_string()),
            article_id: Set(article_id.to_string()),
            is_read: Set(false),
            is_admin: Set(is_admin),
            created_at: Set(chrono::Utc::now().into()),
        };

        match model.insert(self.db.as_ref()).await {
            Ok(row) => Ok(Some(row)),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                tracing::debug!(verb = ?verb, target_id = target.id(), "duplicate notification skipped");
                Ok(None)
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Get a recipient's notifications, newest first (cursor paginated).
    pub async fn find_by_recipient(
        &self,
        recipient_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<notification::Model>> {
        let mut query = Notification::find()
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .order_by_desc(notification::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(notification::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get admin-channel notices, newest first.
    pub async fn find_admin(&self, limit: u64) -> AppResult<Vec<notification::Model>> {
        Notification::find()
            .filter(notification::Column::IsAdmin.eq(true))
            .order_by_desc(notification::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a notification by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<notification::Model>> {
        Notification::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark one notification as read.
    pub async fn mark_as_read(&self, id: &str) -> AppResult<()> {
        Notification::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Mark all of a recipient's notifications as read.
    pub async fn mark_all_as_read(&self, recipient_id: &str) -> AppResult<u64> {
        let result = Notification::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Count a recipient's unread notifications.
    pub async fn count_unread(&self, recipient_id: &str) -> AppResult<u64> {
        Notification::find()
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove the like notification an actor previously produced, if any.
    ///
    /// Used when a like is toggled back off, so stale notifications do not
    /// linger for an un-liked article.
    pub async fn delete_like_notification(
        &self,
        recipient_id: &str,
        actor_id: &str,
        target_id: &str,
    ) -> AppResult<()> {
        Notification::delete_many()
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::ActorId.eq(actor_id))
            .filter(notification::Column::Verb.eq(NotificationVerb::Like))
            .filter(notification::Column::TargetId.eq(target_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a notification.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let row = self.find_by_id(id).await?;
        if let Some(n) = row {
            n.delete(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::notification::TargetKind;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_notification(
        id: &str,
        recipient_id: &str,
        verb: NotificationVerb,
        is_read: bool,
    ) -> notification::Model {
        notification::Model {
            id: id.to_string(),
            recipient_id: Some(recipient_id.to_string()),
            actor_id: Some("u9".to_string()),
            verb,
            target_kind: TargetKind::Article,
            target_id: "a1".to_string(),
            article_id: "a1".to_string(),
            is_read,
            is_admin: false,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_insert_unique_returns_row() {
        let inserted = create_test_notification("n1", "u1", NotificationVerb::Comment, false);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[inserted]])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let target = NotificationTarget::Article("a1".to_string());
        let row = repo
            .insert_unique(
                "n1",
                Some("u1"),
                Some("u9"),
                NotificationVerb::Comment,
                &target,
                "a1",
                false,
            )
            .await
            .unwrap();

        assert!(row.is_some());
        assert_eq!(row.unwrap().verb, NotificationVerb::Comment);
    }

    #[tokio::test]
    async fn test_find_by_recipient() {
        let n1 = create_test_notification("n1", "u1", NotificationVerb::Comment, false);
        let n2 = create_test_notification("n2", "u1", NotificationVerb::Like, true);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[n2, n1]])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let result = repo.find_by_recipient("u1", 20, None).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, "n2");
    }

    #[tokio::test]
    async fn test_mark_all_as_read_reports_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                }])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let updated = repo.mark_all_as_read("u1").await.unwrap();

        assert_eq!(updated, 3);
    }
}
