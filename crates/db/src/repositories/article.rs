//! Article repository.

use std::sync::Arc;

use crate::entities::{Article, article};
use hunsuking_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

/// Article repository for database operations.
#[derive(Clone)]
pub struct ArticleRepository {
    db: Arc<DatabaseConnection>,
}

impl ArticleRepository {
    /// Create a new article repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an article by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<article::Model>> {
        Article::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an article by ID, erroring if missing.
    pub async fn get_by_id(&self, id: &str) -> AppResult<article::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ArticleNotFound(id.to_string()))
    }

    /// Create a new article.
    pub async fn create(&self, model: article::ActiveModel) -> AppResult<article::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Replace an article's content (used after temp-image promotion).
    pub async fn update_content(&self, id: &str, content: &str) -> AppResult<()> {
        let model = article::ActiveModel {
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

    /// Delete an article.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let article = self.find_by_id(id).await?;
        if let Some(a) = article {
            a.delete(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Get articles, newest first (cursor paginated).
    pub async fn find_all(
        &self,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<article::Model>> {
        let mut query = Article::find().order_by_desc(article::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(article::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the most liked articles.
    pub async fn find_top_liked(&self, limit: u64) -> AppResult<Vec<article::Model>> {
        Article::find()
            .order_by_desc(article::Column::LikeCount)
            .order_by_desc(article::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Increment view count atomically (single UPDATE query, no fetch).
    pub async fn increment_view_count(&self, id: &str) -> AppResult<()> {
        Article::update_many()
            .col_expr(
                article::Column::ViewCount,
                Expr::col(article::Column::ViewCount).add(1),
            )
            .filter(article::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Increment like count atomically.
    pub async fn increment_like_count(&self, id: &str) -> AppResult<()> {
        Article::update_many()
            .col_expr(
                article::Column::LikeCount,
                Expr::col(article::Column::LikeCount).add(1),
            )
            .filter(article::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Decrement like count atomically, floored at zero.
    pub async fn decrement_like_count(&self, id: &str) -> AppResult<()> {
        Article::update_many()
            .col_expr(
                article::Column::LikeCount,
                Expr::cust("GREATEST(like_count - 1, 0)"),
            )
            .filter(article::Column::Id.eq(id))
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

    fn create_test_article(id: &str, user_id: &str, is_closed: bool) -> article::Model {
        article::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            title: "How do I fix this?".to_string(),
            content: "Long story.".to_string(),
            is_closed,
            view_count: 0,
            like_count: 0,
            tags: json!(["career"]),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_found() {
        let article = create_test_article("a1", "u1", false);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[article.clone()]])
                .into_connection(),
        );

        let repo = ArticleRepository::new(db);
        let found = repo.get_by_id("a1").await.unwrap();

        assert_eq!(found.id, "a1");
        assert!(!found.is_closed);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<article::Model>::new()])
                .into_connection(),
        );

        let repo = ArticleRepository::new(db);
        let result = repo.get_by_id("missing").await;

        match result {
            Err(AppError::ArticleNotFound(id)) => assert_eq!(id, "missing"),
            _ => panic!("Expected ArticleNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_increment_view_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = ArticleRepository::new(db);
        repo.increment_view_count("a1").await.unwrap();
    }

    #[tokio::test]
    async fn test_find_all_paginated() {
        let a1 = create_test_article("a1", "u1", false);
        let a2 = create_test_article("a2", "u2", true);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[a2, a1]])
                .into_connection(),
        );

        let repo = ArticleRepository::new(db);
        let result = repo.find_all(10, None).await.unwrap();

        assert_eq!(result.len(), 2);
    }
}
