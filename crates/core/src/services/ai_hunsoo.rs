//! AI hunsoo service.
//!
//! Generates the "AI hunsoo" advice response for an article. Generation is
//! idempotent per article: the backing row finalizes at most once, and only
//! the finalizing run emits the notification, so retried jobs and concurrent
//! runs collapse into one visible response.

use std::sync::Arc;

use async_trait::async_trait;
use hunsuking_common::{AppError, AppResult, IdGenerator, config::AiConfig};
use hunsuking_db::repositories::{AiHunsooRepository, ArticleRepository, CommentRepository};
use serde::Deserialize;
use serde_json::json;

use crate::services::notification::NotificationService;

/// Placeholder stored when generation fails; `status` stays false so a
/// retry can overwrite it.
const GENERATION_FAILED_PLACEHOLDER: &str =
    "Failed to generate an AI response. Please try again later.";

const SYSTEM_PROMPT: &str = "You are an AI that provides critical and constructive feedback.";

/// Produces the advice text for an article.
#[async_trait]
pub trait AiResponder: Send + Sync {
    /// Generate a response for the article, optionally informed by the
    /// comment the author accepted.
    async fn generate(
        &self,
        article_content: &str,
        selected_comment: Option<&str>,
    ) -> AppResult<String>;
}

/// OpenAI-compatible chat-completions responder.
pub struct OpenAiResponder {
    client: reqwest::Client,
    config: AiConfig,
}

impl OpenAiResponder {
    /// Create a responder from configuration. Fails when the HTTP client
    /// cannot be built.
    pub fn new(config: AiConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[async_trait]
impl AiResponder for OpenAiResponder {
    async fn generate(
        &self,
        article_content: &str,
        selected_comment: Option<&str>,
    ) -> AppResult<String> {
        let user_prompt = match selected_comment {
            Some(comment) => format!(
                "A user asked for advice:\n{article_content}\n\nThe advice they accepted:\n{comment}\n\nGive your own brief take."
            ),
            None => format!("A user asked for advice:\n{article_content}\n\nGive your brief take."),
        };

        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_prompt },
            ],
            "max_tokens": self.config.max_tokens,
            "temperature": 0.7,
        });

        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::ExternalService("AI API key is not configured".to_string()))?;

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("AI request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "AI request returned {}",
                response.status()
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Malformed AI response: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::ExternalService("AI response had no choices".to_string()))
    }
}

/// Responder used when AI responses are disabled in configuration.
///
/// Every generation attempt fails, which stores the retriable placeholder
/// and leaves the row open for when AI is turned back on.
pub struct DisabledResponder;

#[async_trait]
impl AiResponder for DisabledResponder {
    async fn generate(
        &self,
        _article_content: &str,
        _selected_comment: Option<&str>,
    ) -> AppResult<String> {
        Err(AppError::ExternalService(
            "AI responses are disabled".to_string(),
        ))
    }
}

/// AI hunsoo service for business logic.
#[derive(Clone)]
pub struct AiHunsooService {
    ai_repo: AiHunsooRepository,
    article_repo: ArticleRepository,
    comment_repo: CommentRepository,
    notification: NotificationService,
    responder: Arc<dyn AiResponder>,
    id_gen: IdGenerator,
}

impl AiHunsooService {
    /// Create a new AI hunsoo service.
    #[must_use]
    pub fn new(
        ai_repo: AiHunsooRepository,
        article_repo: ArticleRepository,
        comment_repo: CommentRepository,
        notification: NotificationService,
        responder: Arc<dyn AiResponder>,
    ) -> Self {
        Self {
            ai_repo,
            article_repo,
            comment_repo,
            notification,
            responder,
            id_gen: IdGenerator::new(),
        }
    }

    /// Get the AI response row for an article.
    pub async fn get(&self, article_id: &str) -> AppResult<hunsuking_db::entities::ai_hunsoo::Model> {
        self.ai_repo
            .find_by_article(article_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No AI response for this article".to_string()))
    }

    /// Generate and store the AI response for an article.
    ///
    /// Already-finalized rows are skipped without invoking the responder.
    /// On generation failure a placeholder is stored and the row stays
    /// retriable.
    pub async fn respond(&self, article_id: &str) -> AppResult<()> {
        let row = match self.ai_repo.find_by_article(article_id).await? {
            Some(row) => row,
            // Articles created before the placeholder-row flow get one here.
            None => {
                self.ai_repo
                    .create_for_article(&self.id_gen.generate(), article_id)
                    .await?
            }
        };

        if row.status {
            tracing::debug!(article_id = %article_id, "AI response already finalized, skipping");
            return Ok(());
        }

        let article = self.article_repo.get_by_id(article_id).await?;
        let selected = self.comment_repo.find_selected(article_id).await?;

        let content = match self
            .responder
            .generate(&article.content, selected.as_ref().map(|c| c.content.as_str()))
            .await
        {
            Ok(content) => content,
            Err(e) => {
                self.ai_repo
                    .store_error_placeholder(article_id, GENERATION_FAILED_PLACEHOLDER)
                    .await?;
                return Err(e);
            }
        };

        // Only the run that wins the finalize CAS notifies.
        if self.ai_repo.finalize(article_id, &content).await? {
            if let Err(e) = self
                .notification
                .notify_ai_response(&article.user_id, &row.id, article_id)
                .await
            {
                tracing::warn!(article_id = %article_id, error = %e, "Failed to send AI response notification");
            }
        }

        Ok(())
    }
}
