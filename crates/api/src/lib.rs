//! HTTP API layer for hunsuking.
//!
//! - **Endpoints**: articles, comments, notifications, reports, profiles
//! - **Extractors**: authenticated user / admin from request extensions
//! - **Middleware**: JWT access-cookie validation
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
