//! API endpoints.

pub mod articles;
mod comments;
mod media;
mod notifications;
mod profiles;
mod reports;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/articles", articles::router())
        .nest("/comments", comments::router())
        .nest("/media", media::router())
        .nest("/notifications", notifications::router())
        .nest("/reports", reports::router())
        .nest("/profiles", profiles::router())
}
