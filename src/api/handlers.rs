//! API Handlers
//!
//! HTTP request handlers for each host endpoint. Every UI session is locked for
//! the duration of one request, so its cache and login gate see one request at
//! a time.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::client::RemoteClient;
use crate::clock::{Clock, SystemClock};
use crate::config::{BackendKind, Config};
use crate::connection::ConnectOptions;
use crate::error::{Result, SessionCacheError};
use crate::login::{ConnectionBackend, ConnectionProvider, SessionBackend};
use crate::models::{
    HealthResponse, LoginRequest, LoginResponse, MessageResponse, QueryRequest, QueryResponse,
    SessionCreatedResponse, StatsResponse,
};
use crate::session::UiSession;

/// Live UI sessions by id.
pub type SessionMap = Arc<RwLock<HashMap<Uuid, Arc<Mutex<UiSession>>>>>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionMap,
    /// Provider every new UI session's login gate uses
    pub provider: Arc<dyn ConnectionProvider>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(provider: Arc<dyn ConnectionProvider>, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            provider,
            clock,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Connections opened through the login form default to the configured TTL.
    pub fn from_config(config: &Config, client: Arc<dyn RemoteClient>) -> Self {
        let defaults = ConnectOptions {
            ttl: Some(config.default_ttl),
            ..ConnectOptions::default()
        };
        let provider: Arc<dyn ConnectionProvider> = match config.backend {
            BackendKind::Connection => {
                Arc::new(ConnectionBackend::new(client).with_defaults(defaults))
            }
            BackendKind::Session => Arc::new(SessionBackend::new(client).with_defaults(defaults)),
        };
        Self::new(provider, Arc::new(SystemClock))
    }

    async fn session(&self, id: &str) -> Result<Arc<Mutex<UiSession>>> {
        let uuid = parse_id(id)?;
        self.sessions
            .read()
            .await
            .get(&uuid)
            .cloned()
            .ok_or_else(|| SessionCacheError::SessionNotFound(id.to_string()))
    }

    async fn remove_session(&self, id: &str) -> Result<Arc<Mutex<UiSession>>> {
        let uuid = parse_id(id)?;
        self.sessions
            .write()
            .await
            .remove(&uuid)
            .ok_or_else(|| SessionCacheError::SessionNotFound(id.to_string()))
    }
}

fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| SessionCacheError::SessionNotFound(id.to_string()))
}

/// Handler for POST /sessions
pub async fn create_session_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionCreatedResponse>) {
    let mut ui = UiSession::new(Arc::clone(&state.provider), Arc::clone(&state.clock));
    let login = ui.gate.render(&mut ui.ctx);
    let id = ui.id();

    state.sessions.write().await.insert(id, Arc::new(Mutex::new(ui)));
    info!(ui_session = %id, "ui session created");

    (
        StatusCode::CREATED,
        Json(SessionCreatedResponse {
            session_id: id.to_string(),
            login,
        }),
    )
}

/// Handler for DELETE /sessions/:id
///
/// Closes the session's connection, which drops its cached results.
pub async fn close_session_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let session = state.remove_session(&id).await?;
    session.lock().await.close_all().await;
    info!(ui_session = %id, "ui session closed");

    Ok(Json(MessageResponse::new(format!("Session '{id}' closed"))))
}

/// Handler for GET /sessions/:id/login
pub async fn login_view_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LoginResponse>> {
    let session = state.session(&id).await?;
    let mut guard = session.lock().await;
    let ui = &mut *guard;
    ui.touch();

    let view = ui.gate.render(&mut ui.ctx);
    Ok(Json(LoginResponse::new(id, view)))
}

/// Handler for POST /sessions/:id/login
///
/// A failed connect is not an HTTP error: the form comes back with a warning.
pub async fn login_submit_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let session = state.session(&id).await?;
    let mut guard = session.lock().await;
    let ui = &mut *guard;
    ui.touch();

    let view = ui.gate.submit_form(&mut ui.ctx, req.fields).await;
    Ok(Json(LoginResponse::new(id, view)))
}

/// Handler for POST /sessions/:id/disconnect
pub async fn disconnect_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LoginResponse>> {
    let session = state.session(&id).await?;
    let mut guard = session.lock().await;
    let ui = &mut *guard;
    ui.touch();

    ui.gate.disconnect(&mut ui.ctx).await?;
    let view = ui.gate.render(&mut ui.ctx);
    Ok(Json(LoginResponse::new(id, view)))
}

/// Handler for POST /sessions/:id/query
pub async fn query_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(SessionCacheError::InvalidRequest(error_msg));
    }

    let session = state.session(&id).await?;
    let mut guard = session.lock().await;
    let ui = &mut *guard;
    ui.touch();

    let conn = ui
        .gate
        .connection()
        .cloned()
        .ok_or_else(|| SessionCacheError::NotConnected(id.clone()))?;

    let hits_before = ui.ctx.stats().hits;
    let result = conn.execute(&mut ui.ctx, req.to_query(), req.ttl).await?;
    let cached = ui.ctx.stats().hits > hits_before;

    Ok(Json(QueryResponse::new(result, cached)))
}

/// Handler for GET /sessions/:id/stats
pub async fn stats_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatsResponse>> {
    let session = state.session(&id).await?;
    let ui = session.lock().await;

    Ok(Json(StatsResponse::new(
        id,
        ui.gate.state().name(),
        ui.ctx.stats(),
    )))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let sessions = state.sessions.read().await.len();
    Json(HealthResponse::healthy(sessions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::client::InMemoryClient;

    fn test_state(client: &InMemoryClient) -> AppState {
        let config = Config::default();
        AppState::from_config(&config, Arc::new(client.clone()))
    }

    async fn logged_in(state: &AppState) -> String {
        let (_, Json(created)) = create_session_handler(State(state.clone())).await;
        let req = LoginRequest {
            fields: BTreeMap::from([("user".to_string(), "alice".to_string())]),
        };
        let Json(resp) = login_submit_handler(
            State(state.clone()),
            Path(created.session_id.clone()),
            Json(req),
        )
        .await
        .unwrap();
        assert!(resp.view.is_ready());
        created.session_id
    }

    fn query(sql: &str) -> QueryRequest {
        QueryRequest {
            sql: sql.to_string(),
            args: Vec::new(),
            options: BTreeMap::new(),
            ttl: None,
        }
    }

    #[tokio::test]
    async fn test_create_session_renders_form() {
        let client = InMemoryClient::new();
        let state = test_state(&client);

        let (status, Json(created)) = create_session_handler(State(state.clone())).await;

        assert_eq!(status, StatusCode::CREATED);
        assert!(!created.login.is_ready());
        assert_eq!(state.sessions.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_query_is_cached_per_session() {
        let client = InMemoryClient::new();
        let state = test_state(&client);
        let id = logged_in(&state).await;

        let Json(first) = query_handler(State(state.clone()), Path(id.clone()), Json(query("SELECT 1")))
            .await
            .unwrap();
        let Json(second) = query_handler(State(state.clone()), Path(id), Json(query("SELECT 1")))
            .await
            .unwrap();

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(client.executions(), 1);
    }

    #[tokio::test]
    async fn test_query_before_login_is_rejected() {
        let client = InMemoryClient::new();
        let state = test_state(&client);
        let (_, Json(created)) = create_session_handler(State(state.clone())).await;

        let result =
            query_handler(State(state), Path(created.session_id), Json(query("SELECT 1"))).await;

        assert!(matches!(result, Err(SessionCacheError::NotConnected(_))));
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let client = InMemoryClient::new();
        let state = test_state(&client);

        let result = stats_handler(State(state), Path("not-a-uuid".to_string())).await;

        assert!(matches!(result, Err(SessionCacheError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn test_disconnect_clears_cache() {
        let client = InMemoryClient::new();
        let state = test_state(&client);
        let id = logged_in(&state).await;
        query_handler(State(state.clone()), Path(id.clone()), Json(query("SELECT 1")))
            .await
            .unwrap();

        let Json(resp) = disconnect_handler(State(state.clone()), Path(id.clone()))
            .await
            .unwrap();
        let Json(stats) = stats_handler(State(state), Path(id)).await.unwrap();

        assert!(!resp.view.is_ready());
        assert_eq!(stats.stats.total_entries, 0);
        assert_eq!(stats.stats.invalidations, 1);
    }

    #[tokio::test]
    async fn test_close_session_removes_it() {
        let client = InMemoryClient::new();
        let state = test_state(&client);
        let id = logged_in(&state).await;

        close_session_handler(State(state.clone()), Path(id.clone()))
            .await
            .unwrap();

        assert!(state.sessions.read().await.is_empty());
        assert!(stats_handler(State(state), Path(id)).await.is_err());
    }

    #[tokio::test]
    async fn test_health_handler() {
        let client = InMemoryClient::new();
        let response = health_handler(State(test_state(&client))).await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.sessions, 0);
    }
}
