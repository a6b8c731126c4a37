//! API Routes
//!
//! Configures the Axum router with all host endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    close_session_handler, create_session_handler, disconnect_handler, health_handler,
    login_submit_handler, login_view_handler, query_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /sessions` - Open a UI session
/// - `DELETE /sessions/:id` - Close a UI session and its connection
/// - `GET /sessions/:id/login` - Current login view
/// - `POST /sessions/:id/login` - Submit credentials
/// - `POST /sessions/:id/disconnect` - Close the connection, keep the session
/// - `POST /sessions/:id/query` - Execute a query through the session's cache
/// - `GET /sessions/:id/stats` - Cache statistics of one session
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/sessions", post(create_session_handler))
        .route("/sessions/:id", delete(close_session_handler))
        .route(
            "/sessions/:id/login",
            get(login_view_handler).post(login_submit_handler),
        )
        .route("/sessions/:id/disconnect", post(disconnect_handler))
        .route("/sessions/:id/query", post(query_handler))
        .route("/sessions/:id/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    use crate::client::InMemoryClient;
    use crate::config::Config;

    fn create_test_app() -> Router {
        let state = AppState::from_config(&Config::default(), Arc::new(InMemoryClient::new()));
        create_router(state)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

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
    async fn test_create_session_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/sessions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_stats_unknown_session() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/sessions/00000000-0000-0000-0000-000000000000/stats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_query_rejects_empty_sql() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/sessions/00000000-0000-0000-0000-000000000000/query")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"sql":""}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
