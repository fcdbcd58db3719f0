//! Comment repository.

use std::sync::Arc;

use crate::entities::{Article, Comment, article, comment};
use hunsuking_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait,
};

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a comment by ID, erroring if missing.
    pub async fn get_by_id(&self, id: &str) -> AppResult<comment::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::CommentNotFound(id.to_string()))
    }

    /// Create a new comment.
    ///
    /// The (user, article) unique constraint surfaces as [`AppError::Duplicate`].
    pub async fn create(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::Duplicate("You have already commented on this article".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Replace a comment's content.
    pub async fn update_content(&self, id: &str, content: &str) -> AppResult<()> {
        let model = comment::ActiveModel {
            id: Set(id.to_string()),
            content: Set(content.to_string()),
            updated_at: Set(Some(chrono::Utc::now().into())),
            ..Default::default()
        };
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get comments on an article, oldest first.
    pub async fn find_by_article(&self, article_id: &str) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::ArticleId.eq(article_id))
            .order_by_asc(comment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the selected comment on an article, if any.
    pub async fn find_selected(&self, article_id: &str) -> AppResult<Option<comment::Model>> {
        Comment::find()
            .filter(comment::Column::ArticleId.eq(article_id))
            .filter(comment::Column::IsSelected.eq(true))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether any comment on the article is already selected.
    pub async fn has_selected(&self, article_id: &str) -> AppResult<bool> {
        let count = Comment::find()
            .filter(comment::Column::ArticleId.eq(article_id))
            .filter(comment::Column::IsSelected.eq(true))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Atomically accept a comment and close its article.
    ///
    /// Both flag flips run in one transaction as compare-and-set UPDATEs keyed
    /// on the old flag value. A concurrent accept makes one of the UPDATEs hit
    /// zero rows; the transaction rolls back and the caller sees
    /// [`AppError::InvalidState`]. This keeps `is_closed` and `is_selected`
    /// from ever drifting apart.
    pub async fn select_and_close(&self, comment_id: &str, article_id: &str) -> AppResult<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let closed = Article::update_many()
            .col_expr(article::Column::IsClosed, Expr::value(true))
            .col_expr(
                article::Column::UpdatedAt,
                Expr::value(chrono::Utc::now()),
            )
            .filter(article::Column::Id.eq(article_id))
            .filter(article::Column::IsClosed.eq(false))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if closed.rows_affected == 0 {
            txn.rollback()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Err(AppError::InvalidState(
                "This article is already closed".to_string(),
            ));
        }

        let selected = Comment::update_many()
            .col_expr(comment::Column::IsSelected, Expr::value(true))
            .col_expr(
                comment::Column::UpdatedAt,
                Expr::value(chrono::Utc::now()),
            )
            .filter(comment::Column::Id.eq(comment_id))
            .filter(comment::Column::IsSelected.eq(false))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if selected.rows_affected == 0 {
            txn.rollback()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Err(AppError::InvalidState(
                "This comment is already selected".to_string(),
            ));
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Increment the helpful counter atomically.
    pub async fn increment_helpful_count(&self, id: &str) -> AppResult<()> {
        Comment::update_many()
            .col_expr(
                comment::Column::HelpfulCount,
                Expr::col(comment::Column::HelpfulCount).add(1),
            )
            .filter(comment::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Decrement the helpful counter atomically, floored at zero.
    pub async fn decrement_helpful_count(&self, id: &str) -> AppResult<()> {
        Comment::update_many()
            .col_expr(
                comment::Column::HelpfulCount,
                Expr::cust("GREATEST(helpful_count - 1, 0)"),
            )
            .filter(comment::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Increment the not-helpful counter atomically.
    pub async fn increment_not_helpful_count(&self, id: &str) -> AppResult<()> {
        Comment::update_many()
            .col_expr(
                comment::Column::NotHelpfulCount,
                Expr::col(comment::Column::NotHelpfulCount).add(1),
            )
            .filter(comment::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Decrement the not-helpful counter atomically, floored at zero.
    pub async fn decrement_not_helpful_count(&self, id: &str) -> AppResult<()> {
        Comment::update_many()
            .col_expr(
                comment::Column::NotHelpfulCount,
                Expr::cust("GREATEST(not_helpful_count - 1, 0)"),
            )
            .filter(comment::Column::Id.eq(id))
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

    fn create_test_comment(id: &str, user_id: &str, article_id: &str) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            article_id: article_id.to_string(),
            content: "Try X".to_string(),
            is_selected: false,
            helpful_count: 0,
            not_helpful_count: 0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<comment::Model>::new()])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let result = repo.get_by_id("missing").await;

        match result {
            Err(AppError::CommentNotFound(id)) => assert_eq!(id, "missing"),
            _ => panic!("Expected CommentNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_select_and_close_succeeds() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
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

        let repo = CommentRepository::new(db);
        repo.select_and_close("c1", "a1").await.unwrap();
    }

    #[tokio::test]
    async fn test_select_and_close_already_closed() {
        // The article CAS hits zero rows: a concurrent accept already closed it.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let result = repo.select_and_close("c1", "a1").await;

        match result {
            Err(AppError::InvalidState(msg)) => assert!(msg.contains("already closed")),
            _ => panic!("Expected InvalidState error"),
        }
    }

    #[tokio::test]
    async fn test_select_and_close_already_selected() {
        // Article closes, but the comment flag was already set: roll back.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let result = repo.select_and_close("c1", "a1").await;

        match result {
            Err(AppError::InvalidState(msg)) => assert!(msg.contains("already selected")),
            _ => panic!("Expected InvalidState error"),
        }
    }

    #[tokio::test]
    async fn test_find_by_article() {
        let c1 = create_test_comment("c1", "u2", "a1");
        let c2 = create_test_comment("c2", "u3", "a1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[c1, c2]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let result = repo.find_by_article("a1").await.unwrap();

        assert_eq!(result.len(), 2);
    }
}
