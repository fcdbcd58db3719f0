//! API middleware.

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use axum_extra::extract::CookieJar;
use hunsuking_common::config::AuthConfig;
use hunsuking_core::{
    AiHunsooService, ArticleService, CommentService, MediaService, ModerationService,
    NotificationService, ProfileService, ReactionService,
};
use hunsuking_db::repositories::UserRepository;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

/// JWT access-token claims. `sub` is the user id.
#[derive(Debug, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub exp: i64,
}

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub article_service: ArticleService,
    pub comment_service: CommentService,
    pub reaction_service: ReactionService,
    pub ai_service: AiHunsooService,
    pub notification_service: NotificationService,
    pub moderation_service: ModerationService,
    pub profile_service: ProfileService,
    pub media_service: Option<MediaService>,
    pub user_repo: UserRepository,
    pub auth: Arc<AuthConfig>,
}

/// Authentication middleware.
///
/// Validates the JWT access cookie and stashes the loaded user in request
/// extensions. Requests without a valid cookie pass through anonymous; the
/// `AuthUser` extractor turns that into 401 where auth is required.
pub async fn auth_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(req.headers());
    let mut req = req;

    if let Some(cookie) = jar.get(&state.auth.access_cookie) {
        let key = DecodingKey::from_secret(state.auth.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);

        match jsonwebtoken::decode::<AccessClaims>(cookie.value(), &key, &validation) {
            Ok(token) => match state.user_repo.find_by_id(&token.claims.sub).await {
                Ok(Some(user)) => {
                    req.extensions_mut().insert(user);
                }
                Ok(None) => {
                    tracing::debug!(user_id = %token.claims.sub, "Access token for unknown user");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to load user for access token");
                }
            },
            Err(e) => {
                tracing::debug!(error = %e, "Rejected access token");
            }
        }
    }

    next.run(req).await
}
