//! AI hunsoo repository.
//!
//! Every article owns exactly one row here, created empty alongside the
//! article. `status` flips to true exactly once, when a real response is
//! stored; the flip is a compare-and-set so duplicate generation jobs for the
//! same article collapse into one winner.

use std::sync::Arc;

use crate::entities::{AiHunsoo, ai_hunsoo};
use hunsuking_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

/// AI hunsoo repository for database operations.
#[derive(Clone)]
pub struct AiHunsooRepository {
    db: Arc<DatabaseConnection>,
}

impl AiHunsooRepository {
    /// Create a new AI hunsoo repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create the empty placeholder row for a freshly created article.
    pub async fn create_for_article(
        &self,
        id: &str,
        article_id: &str,
    ) -> AppResult<ai_hunsoo::Model> {
        let model = ai_hunsoo::ActiveModel {
            id: Set(id.to_string()),
            article_id: Set(article_id.to_string()),
            content: Set(None),
            status: Set(false),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the row belonging to an article.
    pub async fn find_by_article(&self, article_id: &str) -> AppResult<Option<ai_hunsoo::Model>> {
        AiHunsoo::find()
            .filter(ai_hunsoo::Column::ArticleId.eq(article_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store the generated response and flip `status`, once.
    ///
    /// `UPDATE ... WHERE article_id = ? AND status = FALSE`; returns `false`
    /// when another run already finalized the row, in which case the stored
    /// content is left untouched.
    pub async fn finalize(&self, article_id: &str, content: &str) -> AppResult<bool> {
        let result = AiHunsoo::update_many()
            .col_expr(ai_hunsoo::Column::Content, Expr::value(content))
            .col_expr(ai_hunsoo::Column::Status, Expr::value(true))
            .col_expr(
                ai_hunsoo::Column::UpdatedAt,
                Expr::value(chrono::Utc::now()),
            )
            .filter(ai_hunsoo::Column::ArticleId.eq(article_id))
            .filter(ai_hunsoo::Column::Status.eq(false))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Store an error placeholder without flipping `status`, so a later
    /// retry can still finalize the row.
    pub async fn store_error_placeholder(&self, article_id: &str, message: &str) -> AppResult<()> {
        AiHunsoo::update_many()
            .col_expr(ai_hunsoo::Column::Content, Expr::value(message))
            .col_expr(
                ai_hunsoo::Column::UpdatedAt,
                Expr::value(chrono::Utc::now()),
            )
            .filter(ai_hunsoo::Column::ArticleId.eq(article_id))
            .filter(ai_hunsoo::Column::Status.eq(false))
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

    fn create_test_row(id: &str, article_id: &str, status: bool) -> ai_hunsoo::Model {
        ai_hunsoo::Model {
            id: id.to_string(),
            article_id: article_id.to_string(),
            content: status.then(|| "Be direct with your manager.".to_string()),
            status,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_finalize_wins_when_pending() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = AiHunsooRepository::new(db);
        let won = repo.finalize("a1", "Be direct.").await.unwrap();

        assert!(won);
    }

    #[tokio::test]
    async fn test_finalize_loses_when_already_finalized() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = AiHunsooRepository::new(db);
        let won = repo.finalize("a1", "Be direct.").await.unwrap();

        assert!(!won);
    }

    #[tokio::test]
    async fn test_find_by_article() {
        let row = create_test_row("h1", "a1", true);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[row]])
                .append_query_results([Vec::<ai_hunsoo::Model>::new()])
                .into_connection(),
        );

        let repo = AiHunsooRepository::new(db);

        let found = repo.find_by_article("a1").await.unwrap();
        assert!(found.is_some_and(|r| r.status));
        assert!(repo.find_by_article("a2").await.unwrap().is_none());
    }
}
