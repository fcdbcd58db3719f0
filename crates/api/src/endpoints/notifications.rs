//! Notification endpoints.

use axum::{
    Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post},
};
use hunsuking_common::AppResult;
use hunsuking_db::entities::notification::{self, NotificationVerb, TargetKind};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AdminUser, AuthUser},
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// List request parameters.
#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub until_id: Option<String>,
}

const fn default_limit() -> u64 {
    20
}

/// Notification response.
#[derive(Serialize)]
pub struct NotificationResponse {
    pub id: String,
    pub actor_id: Option<String>,
    pub verb: NotificationVerb,
    pub description: &'static str,
    pub target_kind: TargetKind,
    pub target_id: String,
    pub article_id: String,
    pub is_read: bool,
    pub created_at: String,
}

impl From<notification::Model> for NotificationResponse {
    fn from(n: notification::Model) -> Self {
        Self {
            id: n.id,
            actor_id: n.actor_id,
            verb: n.verb,
            description: n.verb.description(),
            target_kind: n.target_kind,
            target_id: n.target_id,
            article_id: n.article_id,
            is_read: n.is_read,
            created_at: n.created_at.to_rfc3339(),
        }
    }
}

/// List the authenticated user's notifications.
async fn list_notifications(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListNotificationsQuery>,
) -> AppResult<ApiResponse<Vec<NotificationResponse>>> {
    let limit = query.limit.min(100);
    let notifications = state
        .notification_service
        .list(&user.id, limit, query.until_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(
        notifications.into_iter().map(Into::into).collect(),
    ))
}

/// List the admin channel.
async fn list_admin_notifications(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<ListNotificationsQuery>,
) -> AppResult<ApiResponse<Vec<NotificationResponse>>> {
    let limit = query.limit.min(100);
    let notifications = state.notification_service.list_admin(limit).await?;
    Ok(ApiResponse::ok(
        notifications.into_iter().map(Into::into).collect(),
    ))
}

/// Unread count response.
#[derive(Serialize)]
pub struct UnreadCountResponse {
    pub count: u64,
}

/// Get the unread notification count.
async fn unread_count(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<UnreadCountResponse>> {
    let count = state.notification_service.count_unread(&user.id).await?;
    Ok(ApiResponse::ok(UnreadCountResponse { count }))
}

/// Mark a notification as read.
async fn mark_as_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state
        .notification_service
        .mark_as_read(&user.id, &notification_id)
        .await?;
    Ok(no_content())
}

/// Mark all as read response.
#[derive(Serialize)]
pub struct MarkAllAsReadResponse {
    pub count: u64,
}

/// Mark all notifications as read.
async fn mark_all_as_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<MarkAllAsReadResponse>> {
    let count = state.notification_service.mark_all_as_read(&user.id).await?;
    Ok(ApiResponse::ok(MarkAllAsReadResponse { count }))
}

/// Delete a notification.
async fn delete_notification(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state
        .notification_service
        .delete(&user.id, &notification_id)
        .await?;
    Ok(no_content())
}

/// Create the notifications router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/admin", get(list_admin_notifications))
        .route("/unread-count", get(unread_count))
        .route("/read-all", post(mark_all_as_read))
        .route("/{id}/read", post(mark_as_read))
        .route("/{id}", delete(delete_notification))
}
