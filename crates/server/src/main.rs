//! Hunsuking server entry point.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{Router, middleware};
use hunsuking_api::{AppState, auth_middleware, router as api_router};
use hunsuking_common::{Config, LocalStorage, StorageBackend, config::StorageSettings};
use hunsuking_core::{
    AiHunsooService, AiResponder, ArticleService, CommentService, DisabledResponder, JobService,
    JobWorkerContext, MediaService, ModerationService, NotificationService, OpenAiResponder,
    ProfileService, ReactionService,
};
use hunsuking_db::repositories::{
    AiHunsooRepository, ArticleLikeRepository, ArticleRepository, CommentReactionRepository,
    CommentRepository, NotificationRepository, ProfileRepository, ReportRepository,
    UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Build the storage backend from configuration.
fn build_storage(settings: &StorageSettings) -> Arc<dyn StorageBackend> {
    if settings.backend == "s3" {
        #[cfg(feature = "s3")]
        {
            if let (Some(endpoint), Some(bucket), Some(region), Some(key_id), Some(secret)) = (
                settings.s3_endpoint.as_deref(),
                settings.s3_bucket.clone(),
                settings.s3_region.as_deref(),
                settings.s3_access_key_id.as_deref(),
                settings.s3_secret_access_key.as_deref(),
            ) {
                return Arc::new(hunsuking_common::storage::S3Storage::new(
                    endpoint,
                    bucket,
                    region,
                    key_id,
                    secret,
                    settings.s3_public_url.clone(),
                ));
            }
            tracing::warn!("S3 storage selected but incompletely configured, using local storage");
        }
        #[cfg(not(feature = "s3"))]
        tracing::warn!("S3 storage selected but this build has no S3 support, using local storage");
    }

    Arc::new(LocalStorage::new(
        PathBuf::from(&settings.base_path),
        settings.base_url.clone(),
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hunsuking=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting hunsuking server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database and run migrations
    let db = hunsuking_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    hunsuking_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let profile_repo = ProfileRepository::new(Arc::clone(&db));
    let article_repo = ArticleRepository::new(Arc::clone(&db));
    let article_like_repo = ArticleLikeRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let reaction_repo = CommentReactionRepository::new(Arc::clone(&db));
    let ai_repo = AiHunsooRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));
    let report_repo = ReportRepository::new(Arc::clone(&db));

    // Storage and media
    let storage = build_storage(&config.storage);
    let media_service = MediaService::new(storage);

    // Initialize services
    let notification_service = NotificationService::new(notification_repo.clone());

    let responder: Arc<dyn AiResponder> = if config.ai.enabled {
        Arc::new(OpenAiResponder::new(config.ai.clone())?)
    } else {
        info!("AI responses are disabled");
        Arc::new(DisabledResponder)
    };
    let ai_service = AiHunsooService::new(
        ai_repo.clone(),
        article_repo.clone(),
        comment_repo.clone(),
        notification_service.clone(),
        responder,
    );

    let mut article_service = ArticleService::new(
        article_repo.clone(),
        ai_repo.clone(),
        article_like_repo.clone(),
        notification_service.clone(),
    );
    article_service.set_media(media_service.clone());

    // AI generation after a comment is accepted runs through the job queue
    let job_service = JobService::new();
    let job_sender = job_service.sender();

    let mut comment_service = CommentService::new(
        comment_repo.clone(),
        article_repo.clone(),
        profile_repo.clone(),
        notification_service.clone(),
    );
    comment_service.set_job_sender(job_sender);
    comment_service.set_ai_service(ai_service.clone());

    let reaction_service = ReactionService::new(reaction_repo, comment_repo.clone());

    let moderation_service = ModerationService::new(
        report_repo,
        article_repo,
        comment_repo,
        profile_repo.clone(),
        notification_service.clone(),
    );

    let profile_service = ProfileService::new(profile_repo, user_repo.clone());

    // Start the job worker
    job_service.start(JobWorkerContext {
        ai_service: Some(ai_service.clone()),
    });

    let state = AppState {
        article_service,
        comment_service,
        reaction_service,
        ai_service,
        notification_service,
        moderation_service,
        profile_service,
        media_service: Some(media_service),
        user_repo,
        auth: Arc::new(config.auth.clone()),
    };

    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
