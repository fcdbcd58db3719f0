//! Notification service.
//!
//! One method per trigger. Every insert goes through the repository's
//! `insert_unique`, so replaying a trigger (a retried job, a double-submitted
//! request) never produces a second notification for the same event.

use hunsuking_common::{AppError, AppResult, IdGenerator};
use hunsuking_db::{
    entities::notification::{self, NotificationTarget, NotificationVerb},
    repositories::NotificationRepository,
};

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self {
            notification_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Notify an article author that someone commented.
    pub async fn notify_comment(
        &self,
        recipient_id: &str,
        actor_id: &str,
        comment_id: &str,
        article_id: &str,
    ) -> AppResult<Option<notification::Model>> {
        if recipient_id == actor_id {
            return Ok(None);
        }
        self.notification_repo
            .insert_unique(
                &self.id_gen.generate(),
                Some(recipient_id),
                Some(actor_id),
                NotificationVerb::Comment,
                &NotificationTarget::Comment(comment_id.to_string()),
                article_id,
                false,
            )
            .await
    }

    /// Notify an article author that someone liked their article.
    pub async fn notify_like(
        &self,
        recipient_id: &str,
        actor_id: &str,
        article_id: &str,
    ) -> AppResult<Option<notification::Model>> {
        if recipient_id == actor_id {
            return Ok(None);
        }
        self.notification_repo
            .insert_unique(
                &self.id_gen.generate(),
                Some(recipient_id),
                Some(actor_id),
                NotificationVerb::Like,
                &NotificationTarget::Article(article_id.to_string()),
                article_id,
                false,
            )
            .await
    }

    /// Remove the like notification when a like is toggled back off.
    pub async fn remove_like_notification(
        &self,
        recipient_id: &str,
        actor_id: &str,
        article_id: &str,
    ) -> AppResult<()> {
        self.notification_repo
            .delete_like_notification(recipient_id, actor_id, article_id)
            .await
    }

    /// Notify a comment author that their comment was selected.
    pub async fn notify_select(
        &self,
        recipient_id: &str,
        actor_id: &str,
        comment_id: &str,
        article_id: &str,
    ) -> AppResult<Option<notification::Model>> {
        if recipient_id == actor_id {
            return Ok(None);
        }
        self.notification_repo
            .insert_unique(
                &self.id_gen.generate(),
                Some(recipient_id),
                Some(actor_id),
                NotificationVerb::Select,
                &NotificationTarget::Comment(comment_id.to_string()),
                article_id,
                false,
            )
            .await
    }

    /// Notify an article author that the AI responded. System-generated,
    /// so there is no actor.
    pub async fn notify_ai_response(
        &self,
        recipient_id: &str,
        ai_hunsoo_id: &str,
        article_id: &str,
    ) -> AppResult<Option<notification::Model>> {
        self.notification_repo
            .insert_unique(
                &self.id_gen.generate(),
                Some(recipient_id),
                None,
                NotificationVerb::AiResponse,
                &NotificationTarget::AiHunsoo(ai_hunsoo_id.to_string()),
                article_id,
                false,
            )
            .await
    }

    /// Post a report-received notice on the admin channel.
    pub async fn notify_report_submitted(
        &self,
        report_id: &str,
        article_id: &str,
    ) -> AppResult<Option<notification::Model>> {
        self.notification_repo
            .insert_unique(
                &self.id_gen.generate(),
                None,
                None,
                NotificationVerb::Report,
                &NotificationTarget::Report(report_id.to_string()),
                article_id,
                true,
            )
            .await
    }

    /// Notify a user that a report against their content was resolved.
    pub async fn notify_report_resolved(
        &self,
        recipient_id: &str,
        report_id: &str,
        article_id: &str,
    ) -> AppResult<Option<notification::Model>> {
        self.notification_repo
            .insert_unique(
                &self.id_gen.generate(),
                Some(recipient_id),
                None,
                NotificationVerb::Report,
                &NotificationTarget::Report(report_id.to_string()),
                article_id,
                false,
            )
            .await
    }

    /// List a user's notifications, newest first.
    pub async fn list(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<notification::Model>> {
        self.notification_repo
            .find_by_recipient(user_id, limit, until_id)
            .await
    }

    /// List the admin channel.
    pub async fn list_admin(&self, limit: u64) -> AppResult<Vec<notification::Model>> {
        self.notification_repo.find_admin(limit).await
    }

    /// Count a user's unread notifications.
    pub async fn count_unread(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread(user_id).await
    }

    /// Mark one notification as read. Only the recipient may do so.
    pub async fn mark_as_read(&self, user_id: &str, notification_id: &str) -> AppResult<()> {
        let notification = self
            .notification_repo
            .find_by_id(notification_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

        if notification.recipient_id.as_deref() != Some(user_id) {
            return Err(AppError::PermissionDenied(
                "Not your notification".to_string(),
            ));
        }

        self.notification_repo.mark_as_read(notification_id).await
    }

    /// Mark all of a user's notifications as read.
    pub async fn mark_all_as_read(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.mark_all_as_read(user_id).await
    }

    /// Delete one notification. Only the recipient may do so.
    pub async fn delete(&self, user_id: &str, notification_id: &str) -> AppResult<()> {
        let notification = self
            .notification_repo
            .find_by_id(notification_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

        if notification.recipient_id.as_deref() != Some(user_id) {
            return Err(AppError::PermissionDenied(
                "Not your notification".to_string(),
            ));
        }

        self.notification_repo.delete(notification_id).await
    }
}
