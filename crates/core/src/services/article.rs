//! Article service.

use hunsuking_common::{AppError, AppResult, IdGenerator};
use hunsuking_db::{
    entities::article,
    repositories::{AiHunsooRepository, ArticleLikeRepository, ArticleRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::media::MediaService;
use crate::services::notification::NotificationService;

/// Maximum number of tags per article.
const MAX_TAGS: usize = 3;

/// Input for creating an article.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateArticleInput {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Article service for business logic.
#[derive(Clone)]
pub struct ArticleService {
    article_repo: ArticleRepository,
    ai_repo: AiHunsooRepository,
    like_repo: ArticleLikeRepository,
    notification: NotificationService,
    media: Option<MediaService>,
    id_gen: IdGenerator,
}

impl ArticleService {
    /// Create a new article service.
    #[must_use]
    pub fn new(
        article_repo: ArticleRepository,
        ai_repo: AiHunsooRepository,
        like_repo: ArticleLikeRepository,
        notification: NotificationService,
    ) -> Self {
        Self {
            article_repo,
            ai_repo,
            like_repo,
            notification,
            media: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the media service for temp-image promotion.
    pub fn set_media(&mut self, media: MediaService) {
        self.media = Some(media);
    }

    /// Create an article.
    ///
    /// Also creates the empty AI response row the article owns, and promotes
    /// any temp images the content references.
    pub async fn create(&self, user_id: &str, input: CreateArticleInput) -> AppResult<article::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if input.tags.len() > MAX_TAGS {
            return Err(AppError::Validation(format!(
                "At most {MAX_TAGS} tags are allowed"
            )));
        }

        let article_id = self.id_gen.generate();

        let model = article::ActiveModel {
            id: Set(article_id.clone()),
            user_id: Set(user_id.to_string()),
            title: Set(input.title),
            content: Set(input.content),
            is_closed: Set(false),
            view_count: Set(0),
            like_count: Set(0),
            tags: Set(serde_json::json!(input.tags)),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.article_repo.create(model).await?;

        // The AI response row exists from birth, empty and unfinalized.
        self.ai_repo
            .create_for_article(&self.id_gen.generate(), &created.id)
            .await?;

        if let Some(ref media) = self.media {
            let promoted = media
                .promote_temp_images(&created.content, "articles", &created.id)
                .await?;
            if promoted != created.content {
                self.article_repo
                    .update_content(&created.id, &promoted)
                    .await?;
                return self.article_repo.get_by_id(&created.id).await;
            }
        }

        Ok(created)
    }

    /// Get an article, optionally counting the view.
    ///
    /// The caller decides whether this read counts (the API layer tracks a
    /// per-session "viewed" cookie so reloading an article does not inflate
    /// the counter).
    pub async fn get(&self, article_id: &str, count_view: bool) -> AppResult<article::Model> {
        let article = self.article_repo.get_by_id(article_id).await?;
        if count_view {
            self.article_repo.increment_view_count(article_id).await?;
        }
        Ok(article)
    }

    /// List articles, newest first.
    pub async fn list(&self, limit: u64, until_id: Option<&str>) -> AppResult<Vec<article::Model>> {
        self.article_repo.find_all(limit, until_id).await
    }

    /// List the most liked articles.
    pub async fn top_liked(&self, limit: u64) -> AppResult<Vec<article::Model>> {
        self.article_repo.find_top_liked(limit).await
    }

    /// Delete an article: the author while it is still open, or an admin.
    pub async fn delete(&self, actor_id: &str, is_admin: bool, article_id: &str) -> AppResult<()> {
        let article = self.article_repo.get_by_id(article_id).await?;

        if !is_admin {
            if article.user_id != actor_id {
                return Err(AppError::PermissionDenied(
                    "Only the author can delete this article".to_string(),
                ));
            }
            if article.is_closed {
                return Err(AppError::InvalidState(
                    "Closed articles cannot be deleted".to_string(),
                ));
            }
        }

        self.article_repo.delete(article_id).await
    }

    /// Toggle a like on an article. Returns `true` when liked afterwards.
    ///
    /// Liking notifies the author; unliking removes that notification so it
    /// does not point at a like that no longer exists.
    pub async fn toggle_like(&self, user_id: &str, article_id: &str) -> AppResult<bool> {
        let article = self.article_repo.get_by_id(article_id).await?;

        if article.user_id == user_id {
            return Err(AppError::PermissionDenied(
                "You cannot like your own article".to_string(),
            ));
        }

        let liked = self
            .like_repo
            .toggle(&self.id_gen.generate(), user_id, article_id)
            .await?;

        if liked {
            if let Err(e) = self
                .notification
                .notify_like(&article.user_id, user_id, article_id)
                .await
            {
                tracing::warn!(article_id = %article_id, error = %e, "Failed to send like notification");
            }
        } else if let Err(e) = self
            .notification
            .remove_like_notification(&article.user_id, user_id, article_id)
            .await
        {
            tracing::warn!(article_id = %article_id, error = %e, "Failed to remove like notification");
        }

        Ok(liked)
    }
}
