//! Comment endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{post, put},
};
use hunsuking_common::AppResult;
use hunsuking_db::{entities::comment_reaction::ReactionKind, repositories::ReactionToggle};
use serde::{Deserialize, Serialize};

use crate::{
    endpoints::articles::CommentResponse,
    extractors::AuthUser,
    middleware::AppState,
    response::ApiResponse,
};

/// Update comment request.
#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

/// Edit a comment.
async fn update_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    Json(req): Json<UpdateCommentRequest>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state
        .comment_service
        .update(&user.id, &comment_id, &req.content)
        .await?;
    Ok(ApiResponse::ok(comment.into()))
}

/// Accept a comment, closing its article.
async fn select_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state.comment_service.select(&user.id, &comment_id).await?;
    Ok(ApiResponse::ok(comment.into()))
}

/// Reaction toggle request.
#[derive(Debug, Deserialize)]
pub struct ToggleReactionRequest {
    pub kind: ReactionKind,
}

/// Reaction toggle response.
#[derive(Serialize)]
pub struct ToggleReactionResponse {
    pub outcome: &'static str,
}

/// Toggle a helpful / not-helpful reaction on a comment.
async fn toggle_reaction(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    Json(req): Json<ToggleReactionRequest>,
) -> AppResult<ApiResponse<ToggleReactionResponse>> {
    let outcome = state
        .reaction_service
        .toggle(&user.id, &comment_id, req.kind)
        .await?;

    let outcome = match outcome {
        ReactionToggle::Added => "added",
        ReactionToggle::Removed => "removed",
        ReactionToggle::Changed => "changed",
    };

    Ok(ApiResponse::ok(ToggleReactionResponse { outcome }))
}

/// Create the comments router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", put(update_comment))
        .route("/{id}/select", post(select_comment))
        .route("/{id}/reactions", post(toggle_reaction))
}
