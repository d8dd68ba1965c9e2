//! API Routes
//!
//! Configures the Axum router with the fetch proxy and informational endpoints.

use axum::{
    routing::{any, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    fetch_handler, generation_handler, health_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `ANY /fetch?url=<absolute url>` - Fetch through the cache
/// - `GET /stats` - Request outcome counters
/// - `GET /generation` - Current generation and lifecycle state
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin so pages on other hosts can route requests here
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/fetch", any(fetch_handler))
        .route("/stats", get(stats_handler))
        .route("/generation", get(generation_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStorage;
    use crate::config::Config;
    use crate::error::{CacheError, Result};
    use crate::fetch::{FetchOrchestrator, Network};
    use crate::generation::GenerationManager;
    use crate::models::{FetchRequest, ResponsePayload};
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::util::ServiceExt;

    struct OfflineNetwork;

    #[async_trait]
    impl Network for OfflineNetwork {
        async fn fetch(&self, _request: &FetchRequest) -> Result<ResponsePayload> {
            Err(CacheError::Network("offline".to_string()))
        }
    }

    async fn create_test_app() -> Router {
        let config = Config {
            cache_version: "v1".to_string(),
            precache_urls: Vec::new(),
            ..Config::default()
        };
        let manager = Arc::new(GenerationManager::new(Arc::new(CacheStorage::new()), &config));
        manager.activate(&OfflineNetwork).await.unwrap();

        let orchestrator =
            FetchOrchestrator::from_config(&config, manager.subscribe(), Arc::new(OfflineNetwork));
        create_router(AppState::new(orchestrator, manager))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let app = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/stats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_generation_endpoint() {
        let app = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/generation")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_fetch_offline_is_bad_gateway() {
        let app = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/fetch?url=https%3A%2F%2Ftile.openstreetmap.org%2F1%2F0%2F0.png")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(response.headers().get("x-cache").unwrap(), "ERROR");
    }

    #[tokio::test]
    async fn test_fetch_missing_url_is_bad_request() {
        let app = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/fetch")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
