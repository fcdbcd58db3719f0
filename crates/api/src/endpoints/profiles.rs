//! Profile endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, put},
};
use hunsuking_common::AppResult;
use hunsuking_core::UpdateProfileInput;
use hunsuking_db::entities::profile;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AdminUser, AuthUser},
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Profile response.
#[derive(Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub user_id: String,
    pub bio: String,
    pub hunsoo_level: i32,
    pub warning_count: i32,
    pub selected_comment_count: i32,
    pub profile_image: Option<String>,
    pub selected_tags: serde_json::Value,
}

impl From<profile::Model> for ProfileResponse {
    fn from(p: profile::Model) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            bio: p.bio,
            hunsoo_level: p.hunsoo_level,
            warning_count: p.warning_count,
            selected_comment_count: p.selected_comment_count,
            profile_image: p.profile_image,
            selected_tags: p.selected_tags,
        }
    }
}

/// Update profile request.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub selected_tags: Option<Vec<String>>,
}

/// Get your own profile.
async fn get_my_profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let profile = state.profile_service.get_or_create(&user.id).await?;
    Ok(ApiResponse::ok(profile.into()))
}

/// Update your own profile.
async fn update_my_profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let profile = state
        .profile_service
        .update(
            &user.id,
            UpdateProfileInput {
                bio: req.bio,
                profile_image: req.profile_image,
                selected_tags: req.selected_tags,
            },
        )
        .await?;
    Ok(ApiResponse::ok(profile.into()))
}

/// Get another user's profile.
async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let profile = state.profile_service.get_or_create(&user_id).await?;
    Ok(ApiResponse::ok(profile.into()))
}

/// Set hunsoo level request.
#[derive(Debug, Deserialize)]
pub struct SetLevelRequest {
    pub level: i32,
}

/// Set a user's hunsoo level. Admin only.
async fn set_hunsoo_level(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<SetLevelRequest>,
) -> AppResult<impl IntoResponse> {
    state
        .profile_service
        .set_hunsoo_level(admin.is_admin, &user_id, req.level)
        .await?;
    Ok(no_content())
}

/// Create the profiles router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_my_profile).patch(update_my_profile))
        .route("/{user_id}", get(get_profile))
        .route("/{user_id}/level", put(set_hunsoo_level))
}
