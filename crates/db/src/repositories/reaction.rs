//! Reaction repositories: the comment helpful / not-helpful ledger and the
//! article like set.
//!
//! Both keep the ledger row and the denormalized counter in one transaction,
//! so a crash between the two never leaves them disagreeing.

use std::sync::Arc;

use crate::entities::{
    Article, ArticleLike, Comment, CommentReaction, article, article_like, comment,
    comment_reaction::{self, ReactionKind},
};
use hunsuking_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QuerySelect, Set, TransactionTrait,
};

/// Outcome of toggling a reaction on a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionToggle {
    /// No prior reaction existed; one was recorded.
    Added,
    /// The same reaction existed; it was removed.
    Removed,
    /// The opposite reaction existed; it was swapped.
    Changed,
}

/// Repository for comment helpful / not-helpful reactions.
#[derive(Clone)]
pub struct CommentReactionRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentReactionRepository {
    /// Create a new comment reaction repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Toggle a reaction.
    ///
    /// Same kind again removes it, the opposite kind swaps it, and no prior
    /// row adds one. The whole read-modify-write runs in one transaction:
    /// the lookup takes a row lock (SELECT ... FOR UPDATE), and the delete
    /// and swap are additionally keyed on the observed state, so a counter
    /// only moves when the row change it accounts for actually happened.
    /// `new_id` is used only when a row is inserted.
    pub async fn toggle(
        &self,
        new_id: &str,
        user_id: &str,
        comment_id: &str,
        kind: ReactionKind,
    ) -> AppResult<ReactionToggle> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let existing = CommentReaction::find()
            .filter(comment_reaction::Column::UserId.eq(user_id))
            .filter(comment_reaction::Column::CommentId.eq(comment_id))
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let outcome = match existing {
            None => {
                let model = comment_reaction::ActiveModel {
                    id: Set(new_id.to_string()),
                    user_id: Set(user_id.to_string()),
                    comment_id: Set(comment_id.to_string()),
                    kind: Set(kind),
                    created_at: Set(chrono::Utc::now().into()),
                };
                model
                    .insert(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                adjust_counter(&txn, comment_id, kind, 1).await?;
                ReactionToggle::Added
            }
            Some(row) if row.kind == kind => {
                let deleted = row
                    .delete(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                if deleted.rows_affected == 0 {
                    txn.rollback()
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;
                    return Err(AppError::InvalidState(
                        "Reaction changed concurrently".to_string(),
                    ));
                }
                adjust_counter(&txn, comment_id, kind, -1).await?;
                ReactionToggle::Removed
            }
            Some(row) => {
                let old_kind = row.kind;
                let swapped = CommentReaction::update_many()
                    .col_expr(comment_reaction::Column::Kind, Expr::value(kind))
                    .filter(comment_reaction::Column::Id.eq(row.id.as_str()))
                    .filter(comment_reaction::Column::Kind.eq(old_kind))
                    .exec(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                if swapped.rows_affected == 0 {
                    txn.rollback()
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;
                    return Err(AppError::InvalidState(
                        "Reaction changed concurrently".to_string(),
                    ));
                }
                adjust_counter(&txn, comment_id, old_kind, -1).await?;
                adjust_counter(&txn, comment_id, kind, 1).await?;
                ReactionToggle::Changed
            }
        };

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(outcome)
    }
}

/// Move one of the comment's reaction counters by `delta` inside `txn`.
async fn adjust_counter<C: sea_orm::ConnectionTrait>(
    txn: &C,
    comment_id: &str,
    kind: ReactionKind,
    delta: i32,
) -> AppResult<()> {
    let (column, floored) = match kind {
        ReactionKind::Helpful => (
            comment::Column::HelpfulCount,
            "GREATEST(helpful_count - 1, 0)",
        ),
        ReactionKind::NotHelpful => (
            comment::Column::NotHelpfulCount,
            "GREATEST(not_helpful_count - 1, 0)",
        ),
    };

    let expr = if delta > 0 {
        Expr::col(column).add(1)
    } else {
        Expr::cust(floored)
    };

    Comment::update_many()
        .col_expr(column, expr)
        .filter(comment::Column::Id.eq(comment_id))
        .exec(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    Ok(())
}

/// Repository for the article like set.
#[derive(Clone)]
pub struct ArticleLikeRepository {
    db: Arc<DatabaseConnection>,
}

impl ArticleLikeRepository {
    /// Create a new article like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Toggle a like. Returns `true` when the article is liked afterwards.
    ///
    /// Like row and the article's `like_count` move in one transaction; the
    /// lookup takes a row lock and the unlike decrements only when the
    /// delete actually removed the row.
    pub async fn toggle(&self, new_id: &str, user_id: &str, article_id: &str) -> AppResult<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let existing = ArticleLike::find()
            .filter(article_like::Column::UserId.eq(user_id))
            .filter(article_like::Column::ArticleId.eq(article_id))
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let liked = match existing {
            None => {
                let model = article_like::ActiveModel {
                    id: Set(new_id.to_string()),
                    user_id: Set(user_id.to_string()),
                    article_id: Set(article_id.to_string()),
                    created_at: Set(chrono::Utc::now().into()),
                };
                model
                    .insert(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Article::update_many()
                    .col_expr(
                        article::Column::LikeCount,
                        Expr::col(article::Column::LikeCount).add(1),
                    )
                    .filter(article::Column::Id.eq(article_id))
                    .exec(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                true
            }
            Some(row) => {
                let deleted = row
                    .delete(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                if deleted.rows_affected == 0 {
                    txn.rollback()
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;
                    return Err(AppError::InvalidState(
                        "Like changed concurrently".to_string(),
                    ));
                }
                Article::update_many()
                    .col_expr(
                        article::Column::LikeCount,
                        Expr::cust("GREATEST(like_count - 1, 0)"),
                    )
                    .filter(article::Column::Id.eq(article_id))
                    .exec(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                false
            }
        };

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(liked)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_reaction(
        id: &str,
        user_id: &str,
        comment_id: &str,
        kind: ReactionKind,
    ) -> comment_reaction::Model {
        comment_reaction::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            comment_id: comment_id.to_string(),
            kind,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_toggle_adds_when_no_prior_reaction() {
        let inserted = create_test_reaction("r1", "u1", "c1", ReactionKind::Helpful);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // lookup: no prior row; insert returning; counter update
                .append_query_results([Vec::<comment_reaction::Model>::new()])
                .append_query_results([[inserted]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = CommentReactionRepository::new(db);
        let outcome = repo
            .toggle("r1", "u1", "c1", ReactionKind::Helpful)
            .await
            .unwrap();

        assert_eq!(outcome, ReactionToggle::Added);
    }

    #[tokio::test]
    async fn test_toggle_removes_same_kind() {
        let existing = create_test_reaction("r1", "u1", "c1", ReactionKind::Helpful);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );

        let repo = CommentReactionRepository::new(db);
        let outcome = repo
            .toggle("r2", "u1", "c1", ReactionKind::Helpful)
            .await
            .unwrap();

        assert_eq!(outcome, ReactionToggle::Removed);
    }

    #[tokio::test]
    async fn test_toggle_swaps_opposite_kind() {
        let existing = create_test_reaction("r1", "u1", "c1", ReactionKind::Helpful);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                // kind swap, then both counter updates
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );

        let repo = CommentReactionRepository::new(db);
        let outcome = repo
            .toggle("r2", "u1", "c1", ReactionKind::NotHelpful)
            .await
            .unwrap();

        assert_eq!(outcome, ReactionToggle::Changed);
    }

    #[tokio::test]
    async fn test_toggle_remove_lost_race_skips_decrement() {
        // A concurrent toggle deleted the row after our lookup: the delete
        // matches zero rows, so the counter must not move.
        let existing = create_test_reaction("r1", "u1", "c1", ReactionKind::Helpful);

        // Only the delete result is queued; a decrement would need a second.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = CommentReactionRepository::new(db);
        let result = repo.toggle("r2", "u1", "c1", ReactionKind::Helpful).await;

        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_toggle_swap_lost_race_skips_counters() {
        let existing = create_test_reaction("r1", "u1", "c1", ReactionKind::Helpful);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = CommentReactionRepository::new(db);
        let result = repo.toggle("r2", "u1", "c1", ReactionKind::NotHelpful).await;

        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_article_like_toggle_on() {
        let inserted = article_like::Model {
            id: "l1".to_string(),
            user_id: "u1".to_string(),
            article_id: "a1".to_string(),
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<article_like::Model>::new()])
                .append_query_results([[inserted]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = ArticleLikeRepository::new(db);
        let liked = repo.toggle("l1", "u1", "a1").await.unwrap();

        assert!(liked);
    }

    #[tokio::test]
    async fn test_article_like_toggle_off() {
        let existing = article_like::Model {
            id: "l1".to_string(),
            user_id: "u1".to_string(),
            article_id: "a1".to_string(),
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                // delete, then like_count decrement
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );

        let repo = ArticleLikeRepository::new(db);
        let liked = repo.toggle("l2", "u1", "a1").await.unwrap();

        assert!(!liked);
    }

    #[tokio::test]
    async fn test_article_unlike_lost_race_skips_decrement() {
        let existing = article_like::Model {
            id: "l1".to_string(),
            user_id: "u1".to_string(),
            article_id: "a1".to_string(),
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = ArticleLikeRepository::new(db);
        let result = repo.toggle("l2", "u1", "a1").await;

        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }
}
