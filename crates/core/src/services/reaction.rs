//! Reaction service.

use hunsuking_common::{AppError, AppResult, IdGenerator};
use hunsuking_db::{
    entities::comment_reaction::ReactionKind,
    repositories::{CommentReactionRepository, CommentRepository, ReactionToggle},
};

/// Reaction service for business logic.
#[derive(Clone)]
pub struct ReactionService {
    reaction_repo: CommentReactionRepository,
    comment_repo: CommentRepository,
    id_gen: IdGenerator,
}

impl ReactionService {
    /// Create a new reaction service.
    #[must_use]
    pub fn new(reaction_repo: CommentReactionRepository, comment_repo: CommentRepository) -> Self {
        Self {
            reaction_repo,
            comment_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Toggle a helpful / not-helpful reaction on a comment.
    ///
    /// Reacting to your own comment is rejected before anything is written.
    pub async fn toggle(
        &self,
        user_id: &str,
        comment_id: &str,
        kind: ReactionKind,
    ) -> AppResult<ReactionToggle> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;

        if comment.user_id == user_id {
            return Err(AppError::PermissionDenied(
                "You cannot react to your own comment".to_string(),
            ));
        }

        self.reaction_repo
            .toggle(&self.id_gen.generate(), user_id, comment_id, kind)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hunsuking_db::entities::{comment, comment_reaction};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;

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

    fn service(db: Arc<DatabaseConnection>) -> ReactionService {
        ReactionService::new(
            CommentReactionRepository::new(db.clone()),
            CommentRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_toggle_rejects_own_comment() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_comment("c1", "u1")]])
                .into_connection(),
        );
        let svc = service(db);

        let result = svc.toggle("u1", "c1", ReactionKind::Helpful).await;
        assert!(matches!(result, Err(AppError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_toggle_adds_reaction() {
        let inserted = comment_reaction::Model {
            id: "r1".to_string(),
            user_id: "u2".to_string(),
            comment_id: "c1".to_string(),
            kind: ReactionKind::Helpful,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_comment("c1", "u1")]])
                // no prior reaction
                .append_query_results([Vec::<comment_reaction::Model>::new()])
                .append_query_results([[inserted]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let svc = service(db);

        let outcome = svc.toggle("u2", "c1", ReactionKind::Helpful).await.unwrap();
        assert_eq!(outcome, ReactionToggle::Added);
    }
}
