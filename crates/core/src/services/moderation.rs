//! Moderation service.
//!
//! Report intake and the admin workflow over report statuses. The only
//! status transitions allowed are pending → in_progress, pending → resolved,
//! in_progress → resolved, and pending/in_progress → rejected; resolved and
//! rejected are terminal. The reported user's warning counter moves exactly
//! on the transition edge into resolved.

use hunsuking_common::{AppError, AppResult, IdGenerator};
use hunsuking_db::{
    entities::report::{self, ReportStatus, ReportTargetKind},
    repositories::{
        ArticleRepository, CommentRepository, ProfileRepository, ReportRepository,
    },
};
use sea_orm::Set;

use crate::services::notification::NotificationService;

/// Maximum length of the report detail text.
const MAX_DETAIL_LEN: usize = 255;

/// Input for filing a report.
#[derive(Debug, Clone)]
pub struct SubmitReportInput {
    pub target_kind: ReportTargetKind,
    pub target_id: String,
    pub detail: String,
}

/// Moderation service for business logic.
#[derive(Clone)]
pub struct ModerationService {
    report_repo: ReportRepository,
    article_repo: ArticleRepository,
    comment_repo: CommentRepository,
    profile_repo: ProfileRepository,
    notification: NotificationService,
    id_gen: IdGenerator,
}

impl ModerationService {
    /// Create a new moderation service.
    #[must_use]
    pub fn new(
        report_repo: ReportRepository,
        article_repo: ArticleRepository,
        comment_repo: CommentRepository,
        profile_repo: ProfileRepository,
        notification: NotificationService,
    ) -> Self {
        Self {
            report_repo,
            article_repo,
            comment_repo,
            profile_repo,
            notification,
            id_gen: IdGenerator::new(),
        }
    }

    /// File a report against an article or comment.
    ///
    /// The target must exist, you cannot report your own content, and a
    /// second report from the same reporter on the same target is rejected
    /// as a duplicate. A successful submit posts a notice on the admin
    /// channel.
    pub async fn submit(
        &self,
        reporter_id: &str,
        input: SubmitReportInput,
    ) -> AppResult<report::Model> {
        let detail = input.detail.trim();
        if detail.is_empty() {
            return Err(AppError::Validation(
                "Report detail must not be empty".to_string(),
            ));
        }
        if detail.len() > MAX_DETAIL_LEN {
            return Err(AppError::Validation(format!(
                "Report detail must be at most {MAX_DETAIL_LEN} characters"
            )));
        }

        // Resolve the target to its author and owning article.
        let (reported_user_id, article_id) = match input.target_kind {
            ReportTargetKind::Article => {
                let article = self.article_repo.get_by_id(&input.target_id).await?;
                (article.user_id, article.id)
            }
            ReportTargetKind::Comment => {
                let comment = self.comment_repo.get_by_id(&input.target_id).await?;
                (comment.user_id, comment.article_id)
            }
        };

        if reported_user_id == reporter_id {
            return Err(AppError::PermissionDenied(
                "You cannot report your own content".to_string(),
            ));
        }

        let model = report::ActiveModel {
            id: Set(self.id_gen.generate()),
            reporter_id: Set(reporter_id.to_string()),
            reported_user_id: Set(reported_user_id),
            target_kind: Set(input.target_kind),
            target_id: Set(input.target_id),
            article_id: Set(article_id.clone()),
            detail: Set(detail.to_string()),
            status: Set(ReportStatus::Pending),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
            resolved_at: Set(None),
        };

        let created = self.report_repo.create(model).await?;

        if let Err(e) = self
            .notification
            .notify_report_submitted(&created.id, &article_id)
            .await
        {
            tracing::warn!(report_id = %created.id, error = %e, "Failed to post admin report notice");
        }

        Ok(created)
    }

    /// Get a report. Admin only.
    pub async fn get(&self, is_admin: bool, report_id: &str) -> AppResult<report::Model> {
        if !is_admin {
            return Err(AppError::PermissionDenied(
                "Admin access required".to_string(),
            ));
        }
        self.report_repo.get_by_id(report_id).await
    }

    /// List reports, optionally by status. Admin only.
    pub async fn list(
        &self,
        is_admin: bool,
        status: Option<ReportStatus>,
        limit: u64,
    ) -> AppResult<Vec<report::Model>> {
        if !is_admin {
            return Err(AppError::PermissionDenied(
                "Admin access required".to_string(),
            ));
        }
        self.report_repo.find_all(status, limit).await
    }

    /// Move a report to a new status. Admin only.
    ///
    /// Illegal edges fail with `InvalidState`. The warning counter and the
    /// reported-user notification fire only when this call is the one that
    /// actually moved the report into resolved.
    pub async fn update_status(
        &self,
        is_admin: bool,
        report_id: &str,
        new_status: ReportStatus,
    ) -> AppResult<report::Model> {
        if !is_admin {
            return Err(AppError::PermissionDenied(
                "Admin access required".to_string(),
            ));
        }

        let report = self.report_repo.get_by_id(report_id).await?;

        if !Self::transition_allowed(report.status, new_status) {
            return Err(AppError::InvalidState(format!(
                "Cannot move a report from {:?} to {:?}",
                report.status, new_status
            )));
        }

        let moved = self
            .report_repo
            .transition_status(report_id, report.status, new_status)
            .await?;

        if !moved {
            return Err(AppError::InvalidState(
                "Report status changed concurrently".to_string(),
            ));
        }

        if new_status == ReportStatus::Resolved {
            if let Err(e) = self
                .profile_repo
                .increment_warning_count(&report.reported_user_id)
                .await
            {
                tracing::warn!(user_id = %report.reported_user_id, error = %e, "Failed to bump warning count");
            }
            if let Err(e) = self
                .notification
                .notify_report_resolved(&report.reported_user_id, report_id, &report.article_id)
                .await
            {
                tracing::warn!(report_id = %report_id, error = %e, "Failed to notify reported user");
            }
        }

        self.report_repo.get_by_id(report_id).await
    }

    /// Whether the status edge is part of the workflow.
    const fn transition_allowed(from: ReportStatus, to: ReportStatus) -> bool {
        matches!(
            (from, to),
            (ReportStatus::Pending, ReportStatus::InProgress)
                | (ReportStatus::Pending, ReportStatus::Resolved)
                | (ReportStatus::InProgress, ReportStatus::Resolved)
                | (ReportStatus::Pending, ReportStatus::Rejected)
                | (ReportStatus::InProgress, ReportStatus::Rejected)
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hunsuking_db::entities::comment;
    use hunsuking_db::repositories::NotificationRepository;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn test_report(id: &str, status: ReportStatus) -> report::Model {
        report::Model {
            id: id.to_string(),
            reporter_id: "u1".to_string(),
            reported_user_id: "u2".to_string(),
            target_kind: ReportTargetKind::Comment,
            target_id: "c1".to_string(),
            article_id: "a1".to_string(),
            detail: "Abusive language".to_string(),
            status,
            created_at: Utc::now().into(),
            updated_at: None,
            resolved_at: None,
        }
    }

    fn test_comment(id: &str, user_id: &str) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            article_id: "a1".to_string(),
            content: "Try X".to_string(),
            is_selected: false,
            helpful_count: 0,
            not_helpful_count: 0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service(db: Arc<DatabaseConnection>) -> ModerationService {
        ModerationService::new(
            ReportRepository::new(db.clone()),
            ArticleRepository::new(db.clone()),
            CommentRepository::new(db.clone()),
            ProfileRepository::new(db.clone()),
            NotificationService::new(NotificationRepository::new(db)),
        )
    }

    #[tokio::test]
    async fn test_submit_rejects_own_content() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_comment("c1", "u1")]])
                .into_connection(),
        );
        let svc = service(db);

        let result = svc
            .submit(
                "u1",
                SubmitReportInput {
                    target_kind: ReportTargetKind::Comment,
                    target_id: "c1".to_string(),
                    detail: "Bad".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_submit_rejects_empty_detail() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = service(db);

        let result = svc
            .submit(
                "u1",
                SubmitReportInput {
                    target_kind: ReportTargetKind::Comment,
                    target_id: "c1".to_string(),
                    detail: "   ".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_status_requires_admin() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = service(db);

        let result = svc
            .update_status(false, "r1", ReportStatus::Resolved)
            .await;

        assert!(matches!(result, Err(AppError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_update_status_rejects_terminal_report() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_report("r1", ReportStatus::Resolved)]])
                .into_connection(),
        );
        let svc = service(db);

        let result = svc
            .update_status(true, "r1", ReportStatus::InProgress)
            .await;

        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_resolve_bumps_warning_count_once() {
        let resolved = report::Model {
            status: ReportStatus::Resolved,
            resolved_at: Some(Utc::now().into()),
            ..test_report("r1", ReportStatus::Pending)
        };
        let notification_row = hunsuking_db::entities::notification::Model {
            id: "n1".to_string(),
            recipient_id: Some("u2".to_string()),
            actor_id: None,
            verb: hunsuking_db::entities::notification::NotificationVerb::Report,
            target_kind: hunsuking_db::entities::notification::TargetKind::Report,
            target_id: "r1".to_string(),
            article_id: "a1".to_string(),
            is_read: false,
            is_admin: false,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_report("r1", ReportStatus::Pending)]])
                .append_query_results([[notification_row]])
                .append_query_results([[resolved]])
                .append_exec_results([
                    // status CAS
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    // warning_count bump
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );
        let svc = service(db);

        let report = svc.update_status(true, "r1", ReportStatus::Resolved).await.unwrap();
        assert_eq!(report.status, ReportStatus::Resolved);
    }

    #[tokio::test]
    async fn test_lost_cas_is_invalid_state() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_report("r1", ReportStatus::Pending)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );
        let svc = service(db);

        let result = svc.update_status(true, "r1", ReportStatus::Resolved).await;
        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }
}
