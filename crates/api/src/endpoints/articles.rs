//! Article endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::{CookieJar, cookie::Cookie};
use hunsuking_common::AppResult;
use hunsuking_core::CreateArticleInput;
use hunsuking_db::entities::{ai_hunsoo, article, comment};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Cookie tracking which articles this session has already viewed, so a
/// reload does not count a second view.
const VIEWED_COOKIE: &str = "viewed_articles";

/// At most this many ids are remembered in the viewed cookie.
const VIEWED_COOKIE_CAP: usize = 50;

/// List request parameters.
#[derive(Debug, Deserialize)]
pub struct ListArticlesQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub until_id: Option<String>,
}

const fn default_limit() -> u64 {
    20
}

/// Article response.
#[derive(Serialize)]
pub struct ArticleResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub is_closed: bool,
    pub view_count: i32,
    pub like_count: i32,
    pub tags: serde_json::Value,
    pub created_at: String,
}

impl From<article::Model> for ArticleResponse {
    fn from(a: article::Model) -> Self {
        Self {
            id: a.id,
            user_id: a.user_id,
            title: a.title,
            content: a.content,
            is_closed: a.is_closed,
            view_count: a.view_count,
            like_count: a.like_count,
            tags: a.tags,
            created_at: a.created_at.to_rfc3339(),
        }
    }
}

/// Comment response.
#[derive(Serialize)]
pub struct CommentResponse {
    pub id: String,
    pub user_id: String,
    pub article_id: String,
    pub content: String,
    pub is_selected: bool,
    pub helpful_count: i32,
    pub not_helpful_count: i32,
    pub created_at: String,
}

impl From<comment::Model> for CommentResponse {
    fn from(c: comment::Model) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            article_id: c.article_id,
            content: c.content,
            is_selected: c.is_selected,
            helpful_count: c.helpful_count,
            not_helpful_count: c.not_helpful_count,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

/// AI response payload.
#[derive(Serialize)]
pub struct AiHunsooResponse {
    pub id: String,
    pub article_id: String,
    pub content: Option<String>,
    pub status: bool,
}

impl From<ai_hunsoo::Model> for AiHunsooResponse {
    fn from(h: ai_hunsoo::Model) -> Self {
        Self {
            id: h.id,
            article_id: h.article_id,
            content: h.content,
            status: h.status,
        }
    }
}

/// Create an article.
async fn create_article(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateArticleInput>,
) -> AppResult<ApiResponse<ArticleResponse>> {
    let article = state.article_service.create(&user.id, input).await?;
    Ok(ApiResponse::ok(article.into()))
}

/// List articles, newest first.
async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ListArticlesQuery>,
) -> AppResult<ApiResponse<Vec<ArticleResponse>>> {
    let limit = query.limit.min(100);
    let articles = state
        .article_service
        .list(limit, query.until_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(articles.into_iter().map(Into::into).collect()))
}

/// List the most liked articles.
async fn top_articles(
    State(state): State<AppState>,
    Query(query): Query<ListArticlesQuery>,
) -> AppResult<ApiResponse<Vec<ArticleResponse>>> {
    let limit = query.limit.min(100);
    let articles = state.article_service.top_liked(limit).await?;
    Ok(ApiResponse::ok(articles.into_iter().map(Into::into).collect()))
}

/// Get one article. The first visit per session counts a view, tracked by
/// the viewed cookie.
async fn get_article(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(article_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let viewed: Vec<String> = jar
        .get(VIEWED_COOKIE)
        .map(|c| c.value().split(',').map(ToString::to_string).collect())
        .unwrap_or_default();

    let already_viewed = viewed.iter().any(|id| id == &article_id);
    let article = state.article_service.get(&article_id, !already_viewed).await?;

    let jar = if already_viewed {
        jar
    } else {
        let mut updated = viewed;
        updated.push(article_id);
        if updated.len() > VIEWED_COOKIE_CAP {
            let excess = updated.len() - VIEWED_COOKIE_CAP;
            updated.drain(..excess);
        }
        jar.add(
            Cookie::build((VIEWED_COOKIE, updated.join(",")))
                .path("/")
                .http_only(true)
                .build(),
        )
    };

    Ok((jar, ApiResponse::ok(ArticleResponse::from(article))))
}

/// Delete an article.
async fn delete_article(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(article_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state
        .article_service
        .delete(&user.id, user.is_admin, &article_id)
        .await?;
    Ok(no_content())
}

/// Like toggle response.
#[derive(Serialize)]
pub struct LikeResponse {
    pub liked: bool,
}

/// Toggle a like on an article.
async fn toggle_like(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(article_id): Path<String>,
) -> AppResult<ApiResponse<LikeResponse>> {
    let liked = state.article_service.toggle_like(&user.id, &article_id).await?;
    Ok(ApiResponse::ok(LikeResponse { liked }))
}

/// Create comment request.
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

/// Leave a comment on an article.
async fn create_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(article_id): Path<String>,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state
        .comment_service
        .create(&user.id, &article_id, &req.content)
        .await?;
    Ok(ApiResponse::ok(comment.into()))
}

/// List the comments on an article.
async fn list_comments(
    State(state): State<AppState>,
    Path(article_id): Path<String>,
) -> AppResult<ApiResponse<Vec<CommentResponse>>> {
    let comments = state.comment_service.list_by_article(&article_id).await?;
    Ok(ApiResponse::ok(comments.into_iter().map(Into::into).collect()))
}

/// Get the AI response for an article.
async fn get_ai_response(
    State(state): State<AppState>,
    Path(article_id): Path<String>,
) -> AppResult<ApiResponse<AiHunsooResponse>> {
    let row = state.ai_service.get(&article_id).await?;
    Ok(ApiResponse::ok(row.into()))
}

/// Create the articles router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_article).get(list_articles))
        .route("/top", get(top_articles))
        .route("/{id}", get(get_article).delete(delete_article))
        .route("/{id}/like", post(toggle_like))
        .route("/{id}/comments", post(create_comment).get(list_comments))
        .route("/{id}/ai", get(get_ai_response))
}
