//! Cached Connection
//!
//! Wraps connect/close of a remote connection. Closing invalidates every cached
//! result of the connection's session before the real close; cursors handed out
//! are caching or plain depending on the connection's default TTL.

use std::sync::Arc;

use tracing::info;

use crate::client::{RemoteClient, RemoteConnection};
use crate::connection::{CachingCursor, ConnectOptions, Cursor};
use crate::error::Result;
use crate::session::SessionContext;

/// Connection-level default TTL when none is given: caching is opt-in.
pub const CONNECTION_DEFAULT_TTL: i64 = 0;

// == Cached Connection ==
#[derive(Debug, Clone)]
pub struct CachedConnection {
    inner: Arc<dyn RemoteConnection>,
    session_id: String,
    default_ttl: i64,
}

impl CachedConnection {
    // == Connect ==
    /// Opens a remote connection.
    ///
    /// The `ttl` option becomes this connection's default cursor TTL and is
    /// removed before the remaining options are forwarded.
    pub async fn connect(client: &dyn RemoteClient, mut options: ConnectOptions) -> Result<Self> {
        let default_ttl = options.take_ttl().unwrap_or(CONNECTION_DEFAULT_TTL);
        info!(options = ?options.keys(), default_ttl, "opening remote connection");

        let inner = client.connect(&options).await?;
        let connection = Self::from_remote(inner, default_ttl);
        info!(
            session_id = %connection.session_id,
            default_ttl,
            "remote connection established"
        );
        Ok(connection)
    }

    /// Wraps an already open remote connection.
    pub fn from_remote(inner: Arc<dyn RemoteConnection>, default_ttl: i64) -> Self {
        let session_id = inner.session_id().to_string();
        Self {
            inner,
            session_id,
            default_ttl,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn default_ttl(&self) -> i64 {
        self.default_ttl
    }

    pub fn is_open(&self) -> bool {
        !self.inner.is_closed()
    }

    // == Cursor ==
    /// Returns a plain cursor when the connection's default TTL is below one,
    /// otherwise a caching cursor defaulting to `requested_ttl` or the
    /// connection's default.
    pub fn cursor(&self, requested_ttl: Option<i64>) -> Cursor {
        if self.default_ttl < 1 {
            return Cursor::Plain(self.inner.cursor());
        }
        let ttl = requested_ttl.unwrap_or(self.default_ttl);
        Cursor::Caching(CachingCursor::new(Arc::clone(&self.inner)).with_default_ttl(ttl))
    }

    // == Close ==
    /// Drops this connection's cached results, then closes it.
    pub async fn close(&self, ctx: &mut SessionContext) -> Result<()> {
        ctx.results().clear_session(&self.session_id);
        info!(session_id = %self.session_id, "closing remote connection");
        self.inner.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::cache::{CachePath, Fingerprint, RESULTS_NAMESPACE};
    use crate::client::{InMemoryClient, Query};

    fn options(ttl: Option<i64>) -> ConnectOptions {
        ConnectOptions {
            user: Some("alice".to_string()),
            ttl,
            ..ConnectOptions::default()
        }
    }

    #[tokio::test]
    async fn test_connect_records_session_and_ttl() {
        let client = InMemoryClient::new();
        let conn = CachedConnection::connect(&client, options(Some(120))).await.unwrap();

        assert!(!conn.session_id().is_empty());
        assert_eq!(conn.default_ttl(), 120);
        assert!(conn.is_open());
    }

    #[tokio::test]
    async fn test_cursor_is_plain_without_ttl() {
        let client = InMemoryClient::new();
        let conn = CachedConnection::connect(&client, options(None)).await.unwrap();

        assert_eq!(conn.default_ttl(), CONNECTION_DEFAULT_TTL);
        assert!(!conn.cursor(Some(60)).is_caching());
    }

    #[tokio::test]
    async fn test_cursor_is_caching_with_ttl() {
        let client = InMemoryClient::new();
        let conn = CachedConnection::connect(&client, options(Some(60))).await.unwrap();

        match conn.cursor(None) {
            Cursor::Caching(cursor) => {
                assert_eq!(cursor.default_ttl(), 60);
                assert_eq!(cursor.session_id(), conn.session_id());
            }
            Cursor::Plain(_) => panic!("expected a caching cursor"),
        }
        match conn.cursor(Some(5)) {
            Cursor::Caching(cursor) => assert_eq!(cursor.default_ttl(), 5),
            Cursor::Plain(_) => panic!("expected a caching cursor"),
        }
    }

    #[tokio::test]
    async fn test_close_invalidates_session_cache() {
        let client = InMemoryClient::new();
        let mut ctx = SessionContext::new();
        let conn = CachedConnection::connect(&client, options(Some(60))).await.unwrap();

        conn.cursor(None)
            .execute(&mut ctx, Query::new("SELECT 1"), None)
            .await
            .unwrap();
        let path = CachePath::new(conn.session_id(), Fingerprint::of(&Query::new("SELECT 1")));
        assert!(ctx.store().contains(&path.segments()));

        conn.close(&mut ctx).await.unwrap();

        assert!(!conn.is_open());
        assert!(ctx.results().lookup(&path).is_none());
        assert!(!ctx.store().contains(&[RESULTS_NAMESPACE, conn.session_id()]));
    }

    #[tokio::test]
    async fn test_connections_do_not_share_results() {
        let client = InMemoryClient::new();
        let mut ctx = SessionContext::new();
        let a = CachedConnection::connect(&client, options(Some(60))).await.unwrap();
        let b = CachedConnection::connect(&client, options(Some(60))).await.unwrap();

        a.cursor(None).execute(&mut ctx, Query::new("SELECT 1"), None).await.unwrap();
        b.cursor(None).execute(&mut ctx, Query::new("SELECT 1"), None).await.unwrap();

        assert_eq!(client.executions(), 2);

        a.close(&mut ctx).await.unwrap();
        b.cursor(None).execute(&mut ctx, Query::new("SELECT 1"), None).await.unwrap();
        assert_eq!(client.executions(), 2);
    }
}
