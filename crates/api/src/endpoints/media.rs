//! Media upload endpoints.
//!
//! Files land under a temporary key; they become permanent when the
//! article or comment that references them is created.

use axum::{
    Router,
    extract::{Multipart, State},
    routing::post,
};
use hunsuking_common::{AppError, AppResult};
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Uploaded file response.
#[derive(Serialize)]
pub struct MediaResponse {
    pub key: String,
    pub url: String,
    pub size: u64,
    pub content_type: String,
}

/// Upload an image via multipart form.
async fn upload_media(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<MediaResponse>> {
    let media = state
        .media_service
        .as_ref()
        .ok_or_else(|| AppError::ExternalService("File storage is not configured".to_string()))?;

    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut content_type: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(std::string::ToString::to_string);
            content_type = field.content_type().map(std::string::ToString::to_string);
            file_data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?
                    .to_vec(),
            );
        }
    }

    let data = file_data.ok_or_else(|| AppError::BadRequest("Missing file field".to_string()))?;
    let file_name = file_name.unwrap_or_else(|| "upload".to_string());
    let content_type = content_type.unwrap_or_else(|| "application/octet-stream".to_string());

    if !content_type.starts_with("image/") {
        return Err(AppError::Validation("Only images can be uploaded".to_string()));
    }

    let key = media.temp_key(&user.id, &file_name);
    let uploaded = media.upload_temp(&key, &data, &content_type).await?;

    Ok(ApiResponse::ok(MediaResponse {
        key: uploaded.key,
        url: uploaded.url,
        size: uploaded.size,
        content_type: uploaded.content_type,
    }))
}

/// Create the media router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(upload_media))
}
