//! notehub-server: in-memory development server for the NoteHub API
//!
//! This crate provides:
//! - REST API endpoints (list, get, and create notes)
//! - Optional Bearer token check
//! - Sample data for local development
//!
//! # Architecture
//!
//! The server is built on Axum with a middleware stack for:
//! - Request tracing and logging
//! - CORS handling
//! - Request ID generation
//! - JSON error responses
//!
//! # Usage
//!
//! ```rust,ignore
//! use notehub_server::{AppState, NoteStore, ServerConfig, app};
//!
//! let config = ServerConfig::from_env()?;
//! let router = app(AppState::new(NoteStore::new(), config));
//! axum::serve(listener, router).await?;
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod store;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::request_id::request_id;

// Re-exports for convenience
pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use state::AppState;
pub use store::NoteStore;

// Re-export dependent crates
pub use notehub_core;

/// The full application: routes plus the middleware stack.
pub fn app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config().cors_allowed_origins);

    routes::build_router(state)
        .layer(axum::middleware::from_fn(request_id))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Build CORS layer from configuration. Origins that fail to parse are
/// skipped with a warning.
pub fn build_cors_layer(allowed_origins: &str) -> CorsLayer {
    if allowed_origins.trim() == "*" {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<http::HeaderValue> = allowed_origins
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse() {
            Ok(origin) => Some(origin),
            Err(_) => {
                tracing::warn!(origin = s, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let router = app(AppState::new(NoteStore::new(), ServerConfig::default()));

        let response = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let response = router
            .oneshot(
                Request::get("/health")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }

    #[tokio::test]
    async fn oversized_request_id_is_replaced() {
        let router = app(AppState::new(NoteStore::new(), ServerConfig::default()));
        let oversized = "x".repeat(200);

        let response = router
            .oneshot(
                Request::get("/health")
                    .header("x-request-id", oversized.as_str())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let id = response.headers()["x-request-id"].to_str().unwrap();
        assert_ne!(id, oversized);
        assert_eq!(id.len(), 36);
    }
}
