//! Session Builder
//!
//! Adapter for callers that think in logical "sessions" rather than raw
//! connections. A [`Session`] owns one [`CachedConnection`] and a shared cursor,
//! and is recorded in a process-wide [`SessionRegistry`] while open.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

use crate::client::{Query, RemoteClient, ResultHandle};
use crate::connection::{CachedConnection, ConnectOptions, Cursor};
use crate::error::Result;
use crate::session::SessionContext;

/// Application name reported to the server when the caller sets none.
pub const APPLICATION_NAME: &str = "session_cache";

// == Session Registry ==
/// Summary of one registered session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub account: Option<String>,
    pub user: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Registry of open sessions. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, SessionInfo>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static SessionRegistry {
        static GLOBAL: OnceLock<SessionRegistry> = OnceLock::new();
        GLOBAL.get_or_init(SessionRegistry::new)
    }

    pub fn register(&self, info: SessionInfo) {
        self.sessions.write().insert(info.session_id.clone(), info);
    }

    pub fn deregister(&self, session_id: &str) -> Option<SessionInfo> {
        self.sessions.write().remove(session_id)
    }

    pub fn get(&self, session_id: &str) -> Option<SessionInfo> {
        self.sessions.read().get(session_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

// == Session Builder ==
#[derive(Debug, Clone, Default)]
pub struct SessionBuilder {
    options: ConnectOptions,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds loosely typed session options. Keys are lower-cased.
    pub fn configs<K, V, I>(mut self, params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in params {
            self.options.set(key.as_ref(), value.as_ref())?;
        }
        Ok(self)
    }

    /// Adds already typed options, overriding any set before.
    pub fn options(mut self, options: &ConnectOptions) -> Self {
        self.options = self.options.merged_with(options);
        self
    }

    pub fn current_options(&self) -> &ConnectOptions {
        &self.options
    }

    // == Create ==
    /// Connects, registers the new session and forgets the password.
    pub async fn create(
        &mut self,
        client: &dyn RemoteClient,
        registry: &SessionRegistry,
    ) -> Result<Session> {
        let mut params = self.options.clone();
        if params.application.is_none() {
            params.application = Some(APPLICATION_NAME.to_string());
        }

        let connection = CachedConnection::connect(client, params.clone()).await?;
        self.options.redact_password();
        Ok(Session::open(connection, params, registry))
    }

    /// Builds a session around an existing connection.
    pub fn create_with_connection(
        &mut self,
        connection: CachedConnection,
        registry: &SessionRegistry,
    ) -> Session {
        self.options.redact_password();
        Session::open(connection, ConnectOptions::default(), registry)
    }
}

// == Session ==
/// One logical session over a cached connection.
///
/// Queries run through a single shared cursor, so repeated statements reuse
/// the cursor's cache binding the same way a long-lived client cursor would.
#[derive(Debug, Clone)]
pub struct Session {
    connection: CachedConnection,
    params: ConnectOptions,
    cursor: Arc<Mutex<Cursor>>,
    registry: SessionRegistry,
}

impl Session {
    fn open(connection: CachedConnection, mut params: ConnectOptions, registry: &SessionRegistry) -> Self {
        params.redact_password();
        params.ttl = None;

        registry.register(SessionInfo {
            session_id: connection.session_id().to_string(),
            account: params.account.clone(),
            user: params.user.clone(),
            created_at: Utc::now(),
        });
        info!(session_id = %connection.session_id(), "session created");

        let cursor = Arc::new(Mutex::new(connection.cursor(None)));
        Self {
            connection,
            params,
            cursor,
            registry: registry.clone(),
        }
    }

    pub fn session_id(&self) -> &str {
        self.connection.session_id()
    }

    pub fn connection(&self) -> &CachedConnection {
        &self.connection
    }

    /// Options the session was created with, without the password.
    pub fn params(&self) -> &ConnectOptions {
        &self.params
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_open()
    }

    /// Runs `query` on the session's cursor.
    pub async fn sql(
        &self,
        ctx: &mut SessionContext,
        query: Query,
        ttl: Option<i64>,
    ) -> Result<ResultHandle> {
        let mut cursor = self.cursor.lock().await;
        cursor.execute(ctx, query, ttl).await
    }

    /// Closes the connection (invalidating its cache) and deregisters.
    pub async fn close(&self, ctx: &mut SessionContext) -> Result<()> {
        let result = self.connection.close(ctx).await;
        self.forget();
        info!(session_id = %self.session_id(), "session closed");
        result
    }

    /// Drops the registry entry without touching the connection.
    pub fn forget(&self) {
        self.registry.deregister(self.session_id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryClient;

    fn builder() -> SessionBuilder {
        SessionBuilder::new()
            .configs([("ACCOUNT", "acme"), ("User", "alice"), ("password", "secret"), ("ttl", "60")])
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_registers_session() {
        let client = InMemoryClient::new();
        let registry = SessionRegistry::new();
        let mut builder = builder();

        let session = builder.create(&client, &registry).await.unwrap();

        let info = registry.get(session.session_id()).unwrap();
        assert_eq!(info.user.as_deref(), Some("alice"));
        assert_eq!(info.account.as_deref(), Some("acme"));
    }

    #[tokio::test]
    async fn test_create_redacts_password() {
        let client = InMemoryClient::new();
        let registry = SessionRegistry::new();
        let mut builder = builder();

        let session = builder.create(&client, &registry).await.unwrap();

        assert!(builder.current_options().password.is_none());
        assert!(session.params().password.is_none());
        assert_eq!(session.params().application.as_deref(), Some(APPLICATION_NAME));
    }

    #[tokio::test]
    async fn test_failed_create_keeps_builder_and_registry_untouched() {
        let client = InMemoryClient::new();
        let registry = SessionRegistry::new();
        let mut builder = SessionBuilder::new().configs([("account", "acme")]).unwrap();

        assert!(builder.create(&client, &registry).await.is_err());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_session_sql_is_cached() {
        let client = InMemoryClient::new();
        let registry = SessionRegistry::new();
        let mut ctx = SessionContext::new();
        let session = builder().create(&client, &registry).await.unwrap();

        session.sql(&mut ctx, Query::new("SELECT 1"), None).await.unwrap();
        session.sql(&mut ctx, Query::new("SELECT 1"), None).await.unwrap();
        session.sql(&mut ctx, Query::new("SELECT 2"), None).await.unwrap();
        session.sql(&mut ctx, Query::new("SELECT 2"), None).await.unwrap();

        assert_eq!(client.executions(), 2);
    }

    #[tokio::test]
    async fn test_close_deregisters_and_invalidates() {
        let client = InMemoryClient::new();
        let registry = SessionRegistry::new();
        let mut ctx = SessionContext::new();
        let session = builder().create(&client, &registry).await.unwrap();
        session.sql(&mut ctx, Query::new("SELECT 1"), None).await.unwrap();

        session.close(&mut ctx).await.unwrap();

        assert!(!session.is_open());
        assert!(registry.get(session.session_id()).is_none());
        assert_eq!(ctx.stats().total_entries, 0);
    }

    #[tokio::test]
    async fn test_create_with_connection() {
        let client = InMemoryClient::new();
        let registry = SessionRegistry::new();
        let connection = CachedConnection::connect(
            &client,
            ConnectOptions::from_params([("user", "alice"), ("ttl", "60")]).unwrap(),
        )
        .await
        .unwrap();

        let session = builder().create_with_connection(connection.clone(), &registry);

        assert_eq!(session.session_id(), connection.session_id());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_global_registry_is_shared() {
        let a = SessionRegistry::global();
        let b = SessionRegistry::global();
        assert!(std::ptr::eq(a, b));
    }
}
