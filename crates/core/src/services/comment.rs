//! Comment service.
//!
//! Holds the accept/close state machine: accepting a comment closes its
//! article, atomically and irreversibly. The flag flips commit together;
//! everything that hangs off the acceptance (notification, profile counter,
//! AI response) runs strictly after the commit and never undoes it.

use hunsuking_common::{AppError, AppResult, IdGenerator};
use hunsuking_db::{
    entities::comment,
    repositories::{ArticleRepository, CommentRepository, ProfileRepository},
};
use sea_orm::Set;

use crate::services::ai_hunsoo::AiHunsooService;
use crate::services::jobs::JobSender;
use crate::services::notification::NotificationService;

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    article_repo: ArticleRepository,
    profile_repo: ProfileRepository,
    notification: NotificationService,
    job_sender: Option<JobSender>,
    ai_service: Option<AiHunsooService>,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub fn new(
        comment_repo: CommentRepository,
        article_repo: ArticleRepository,
        profile_repo: ProfileRepository,
        notification: NotificationService,
    ) -> Self {
        Self {
            comment_repo,
            article_repo,
            profile_repo,
            notification,
            job_sender: None,
            ai_service: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the job sender. When present, AI generation after an accept is
    /// enqueued instead of run inline.
    pub fn set_job_sender(&mut self, job_sender: JobSender) {
        self.job_sender = Some(job_sender);
    }

    /// Set the AI service used as the inline fallback when no job worker
    /// is wired.
    pub fn set_ai_service(&mut self, ai_service: AiHunsooService) {
        self.ai_service = Some(ai_service);
    }

    /// Leave a comment on an article.
    ///
    /// Authors cannot comment on their own article, closed articles take no
    /// new comments, and each user gets one comment per article.
    pub async fn create(
        &self,
        user_id: &str,
        article_id: &str,
        content: &str,
    ) -> AppResult<comment::Model> {
        if content.trim().is_empty() {
            return Err(AppError::Validation("Comment must not be empty".to_string()));
        }

        let article = self.article_repo.get_by_id(article_id).await?;

        if article.user_id == user_id {
            return Err(AppError::PermissionDenied(
                "You cannot comment on your own article".to_string(),
            ));
        }
        if article.is_closed {
            return Err(AppError::InvalidState(
                "This article is already closed".to_string(),
            ));
        }

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            article_id: Set(article_id.to_string()),
            content: Set(content.to_string()),
            is_selected: Set(false),
            helpful_count: Set(0),
            not_helpful_count: Set(0),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.comment_repo.create(model).await?;

        if let Err(e) = self
            .notification
            .notify_comment(&article.user_id, user_id, &created.id, article_id)
            .await
        {
            tracing::warn!(comment_id = %created.id, error = %e, "Failed to send comment notification");
        }

        Ok(created)
    }

    /// Edit a comment. Blocked once the article is closed or any comment on
    /// it has been selected.
    pub async fn update(
        &self,
        user_id: &str,
        comment_id: &str,
        content: &str,
    ) -> AppResult<comment::Model> {
        if content.trim().is_empty() {
            return Err(AppError::Validation("Comment must not be empty".to_string()));
        }

        let comment = self.comment_repo.get_by_id(comment_id).await?;

        if comment.user_id != user_id {
            return Err(AppError::PermissionDenied(
                "Only the author can edit this comment".to_string(),
            ));
        }

        let article = self.article_repo.get_by_id(&comment.article_id).await?;
        if article.is_closed || self.comment_repo.has_selected(&article.id).await? {
            return Err(AppError::InvalidState(
                "Comments can no longer be edited on this article".to_string(),
            ));
        }

        self.comment_repo.update_content(comment_id, content).await?;
        self.comment_repo.get_by_id(comment_id).await
    }

    /// List the comments on an article, oldest first.
    pub async fn list_by_article(&self, article_id: &str) -> AppResult<Vec<comment::Model>> {
        self.comment_repo.find_by_article(article_id).await
    }

    /// Accept a comment, closing the article.
    ///
    /// Only the article author may accept; the accept is atomic with the
    /// close and irreversible. Post-commit side effects run in a fixed
    /// order, each isolated: select notification, selected-comment counter,
    /// AI response generation.
    pub async fn select(&self, actor_id: &str, comment_id: &str) -> AppResult<comment::Model> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;
        let article = self.article_repo.get_by_id(&comment.article_id).await?;

        if article.user_id != actor_id {
            return Err(AppError::PermissionDenied(
                "Only the article author can select a comment".to_string(),
            ));
        }
        if article.is_closed {
            return Err(AppError::InvalidState(
                "This article is already closed".to_string(),
            ));
        }
        if self.comment_repo.has_selected(&article.id).await? {
            return Err(AppError::InvalidState(
                "A comment has already been selected".to_string(),
            ));
        }

        // The compare-and-set transition inside catches the race where two
        // accepts pass the checks above concurrently.
        self.comment_repo
            .select_and_close(comment_id, &article.id)
            .await?;

        if let Err(e) = self
            .notification
            .notify_select(&comment.user_id, actor_id, comment_id, &article.id)
            .await
        {
            tracing::warn!(comment_id = %comment_id, error = %e, "Failed to send select notification");
        }

        if let Err(e) = self
            .profile_repo
            .increment_selected_comment_count(&comment.user_id)
            .await
        {
            tracing::warn!(user_id = %comment.user_id, error = %e, "Failed to bump selected comment count");
        }

        self.trigger_ai_response(&article.id).await;

        self.comment_repo.get_by_id(comment_id).await
    }

    /// Kick off AI response generation, preferring the job queue.
    async fn trigger_ai_response(&self, article_id: &str) {
        if let Some(ref sender) = self.job_sender {
            if let Err(e) = sender.ai_response(article_id.to_string()).await {
                tracing::warn!(article_id = %article_id, error = %e, "Failed to enqueue AI response job");
            }
            return;
        }

        if let Some(ref ai_service) = self.ai_service {
            if let Err(e) = ai_service.respond(article_id).await {
                tracing::warn!(article_id = %article_id, error = %e, "Inline AI response failed");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hunsuking_db::entities::article;
    use hunsuking_db::repositories::NotificationRepository;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use serde_json::json;
    use std::sync::Arc;

    fn test_article(id: &str, user_id: &str, is_closed: bool) -> article::Model {
        article::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            title: "Should I quit?".to_string(),
            content: "Long story.".to_string(),
            is_closed,
            view_count: 0,
            like_count: 0,
            tags: json!([]),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn test_comment(id: &str, user_id: &str, article_id: &str, is_selected: bool) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            article_id: article_id.to_string(),
            content: "Try X".to_string(),
            is_selected,
            helpful_count: 0,
            not_helpful_count: 0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service(db: Arc<DatabaseConnection>) -> CommentService {
        CommentService::new(
            CommentRepository::new(db.clone()),
            ArticleRepository::new(db.clone()),
            ProfileRepository::new(db.clone()),
            NotificationService::new(NotificationRepository::new(db)),
        )
    }

    #[tokio::test]
    async fn test_create_rejects_own_article() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_article("a1", "u1", false)]])
                .into_connection(),
        );
        let svc = service(db);

        let result = svc.create("u1", "a1", "Advice").await;
        assert!(matches!(result, Err(AppError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_closed_article() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_article("a1", "u1", true)]])
                .into_connection(),
        );
        let svc = service(db);

        let result = svc.create("u2", "a1", "Advice").await;
        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_select_rejects_non_author() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_comment("c1", "u2", "a1", false)]])
                .append_query_results([[test_article("a1", "u1", false)]])
                .into_connection(),
        );
        let svc = service(db);

        let result = svc.select("u3", "c1").await;
        assert!(matches!(result, Err(AppError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_select_rejects_closed_article() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_comment("c1", "u2", "a1", false)]])
                .append_query_results([[test_article("a1", "u1", true)]])
                .into_connection(),
        );
        let svc = service(db);

        let result = svc.select("u1", "c1").await;
        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    // MockDatabase count queries return a single row with a num_items column.
    fn count_row(count: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        let mut row = std::collections::BTreeMap::new();
        row.insert("num_items", sea_orm::Value::from(count));
        row
    }

    #[tokio::test]
    async fn test_select_rejects_second_selection() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_comment("c2", "u3", "a1", false)]])
                .append_query_results([[test_article("a1", "u1", false)]])
                // has_selected count query finds the earlier selection
                .append_query_results([[count_row(1)]])
                .into_connection(),
        );
        let svc = service(db);

        let result = svc.select("u1", "c2").await;
        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_select_happy_path_commits_then_notifies() {
        let selected = test_comment("c1", "u2", "a1", true);
        let notification_row = hunsuking_db::entities::notification::Model {
            id: "n1".to_string(),
            recipient_id: Some("u2".to_string()),
            actor_id: Some("u1".to_string()),
            verb: hunsuking_db::entities::notification::NotificationVerb::Select,
            target_kind: hunsuking_db::entities::notification::TargetKind::Comment,
            target_id: "c1".to_string(),
            article_id: "a1".to_string(),
            is_read: false,
            is_admin: false,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_comment("c1", "u2", "a1", false)]])
                .append_query_results([[test_article("a1", "u1", false)]])
                // no prior selection
                .append_query_results([[count_row(0)]])
                // select notification insert
                .append_query_results([[notification_row]])
                // reload of the now-selected comment
                .append_query_results([[selected]])
                .append_exec_results([
                    // close article CAS
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    // select comment CAS
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    // selected_comment_count bump
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );
        let svc = service(db);

        let comment = svc.select("u1", "c1").await.unwrap();
        assert!(comment.is_selected);
    }
}
