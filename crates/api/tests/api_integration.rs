//! API integration tests.
//!
//! These tests drive the full router over a mock database connection.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    middleware,
};
use hunsuking_api::{AppState, auth_middleware, router as api_router};
use hunsuking_common::config::AuthConfig;
use hunsuking_core::{
    AiHunsooService, AiResponder, ArticleService, CommentService, ModerationService,
    NotificationService, ProfileService, ReactionService,
};
use hunsuking_db::entities::{article, user};
use hunsuking_db::repositories::{
    AiHunsooRepository, ArticleLikeRepository, ArticleRepository, CommentReactionRepository,
    CommentRepository, NotificationRepository, ProfileRepository, ReportRepository,
    UserRepository,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, IntoMockRow, MockDatabase};
use serde::Serialize;
use tower::ServiceExt;

const JWT_SECRET: &str = "test-secret";

/// Responder stub; the routes under test never reach generation.
struct NeverResponder;

#[async_trait::async_trait]
impl AiResponder for NeverResponder {
    async fn generate(
        &self,
        _article_content: &str,
        _selected_comment: Option<&str>,
    ) -> hunsuking_common::AppResult<String> {
        Err(hunsuking_common::AppError::ExternalService(
            "not available in tests".to_string(),
        ))
    }
}

/// Build app state over the given mock connection.
fn create_test_state(conn: DatabaseConnection) -> AppState {
    let db = Arc::new(conn);

    let user_repo = UserRepository::new(Arc::clone(&db));
    let profile_repo = ProfileRepository::new(Arc::clone(&db));
    let article_repo = ArticleRepository::new(Arc::clone(&db));
    let article_like_repo = ArticleLikeRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let reaction_repo = CommentReactionRepository::new(Arc::clone(&db));
    let ai_repo = AiHunsooRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));
    let report_repo = ReportRepository::new(Arc::clone(&db));

    let notification_service = NotificationService::new(notification_repo);
    let ai_service = AiHunsooService::new(
        ai_repo.clone(),
        article_repo.clone(),
        comment_repo.clone(),
        notification_service.clone(),
        Arc::new(NeverResponder),
    );
    let article_service = ArticleService::new(
        article_repo.clone(),
        ai_repo,
        article_like_repo,
        notification_service.clone(),
    );
    let comment_service = CommentService::new(
        comment_repo.clone(),
        article_repo.clone(),
        profile_repo.clone(),
        notification_service.clone(),
    );
    let reaction_service = ReactionService::new(reaction_repo, comment_repo.clone());
    let moderation_service = ModerationService::new(
        report_repo,
        article_repo,
        comment_repo,
        profile_repo.clone(),
        notification_service.clone(),
    );
    let profile_service = ProfileService::new(profile_repo, user_repo.clone());

    AppState {
        article_service,
        comment_service,
        reaction_service,
        ai_service,
        notification_service,
        moderation_service,
        profile_service,
        media_service: None,
        user_repo,
        auth: Arc::new(AuthConfig {
            jwt_secret: JWT_SECRET.to_string(),
            access_cookie: "access".to_string(),
        }),
    }
}

/// Full router with the auth middleware attached, as the server builds it.
fn create_test_router(conn: DatabaseConnection) -> Router {
    let state = create_test_state(conn);
    Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}

fn test_user(id: &str, is_admin: bool) -> user::Model {
    user::Model {
        id: id.to_string(),
        username: "tester".to_string(),
        email: "tester@example.com".to_string(),
        is_admin,
        created_at: chrono::Utc::now().into(),
    }
}

#[derive(Serialize)]
struct TestClaims {
    sub: String,
    exp: i64,
}

fn access_cookie(user_id: &str) -> String {
    let claims = TestClaims {
        sub: user_id.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp(),
    };
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();
    format!("access={token}")
}

#[tokio::test]
async fn unknown_endpoint_returns_404() {
    let conn = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = create_test_router(conn);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_article_without_auth_returns_401() {
    let conn = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = create_test_router(conn);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/articles")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"title":"t","content":"c"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn list_articles_returns_ok() {
    let conn = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<article::Model>::new()])
        .into_connection();
    let app = create_test_router(conn);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/articles")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn get_missing_article_returns_404() {
    let conn = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<article::Model>::new()])
        .into_connection();
    let app = create_test_router(conn);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/articles/01hx0000000000000000000000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_reports_requires_admin() {
    // Authenticated as a regular user: the admin extractor rejects with 403.
    let conn = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![test_user("u1", false)]])
        .into_connection();
    let app = create_test_router(conn);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/reports")
                .header("Cookie", access_cookie("u1"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unread_count_with_valid_cookie_returns_ok() {
    let mut count_row = BTreeMap::<&str, sea_orm::Value>::new();
    count_row.insert("num_items", sea_orm::Value::BigInt(Some(3)));

    // First query loads the user for the cookie, second serves the count.
    let conn = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![test_user("u1", false).into_mock_row()]])
        .append_query_results([vec![count_row.into_mock_row()]])
        .into_connection();
    let app = create_test_router(conn);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/notifications/unread-count")
                .header("Cookie", access_cookie("u1"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
