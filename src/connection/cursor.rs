//! Cursors
//!
//! [`Cursor`] is what application code executes queries through. A caching
//! cursor consults the session's result cache before going to the server and
//! writes successful results back; a plain cursor always goes to the server.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{CachePath, Fingerprint};
use crate::client::{Query, RawCursor, RemoteConnection, ResultHandle};
use crate::error::Result;
use crate::session::SessionContext;

/// Default TTL in seconds of a caching cursor.
pub const DEFAULT_CURSOR_TTL: i64 = 3600;

// == Cursor ==
#[derive(Debug)]
pub enum Cursor {
    Plain(Box<dyn RawCursor>),
    Caching(CachingCursor),
}

impl Cursor {
    /// Executes `query`, with an optional per-call cache TTL in seconds.
    ///
    /// A `ttl` option inside `query.options` is treated like the `ttl` argument and
    /// never reaches the server. Plain cursors accept and ignore it.
    pub async fn execute(
        &mut self,
        ctx: &mut SessionContext,
        mut query: Query,
        ttl: Option<i64>,
    ) -> Result<ResultHandle> {
        match self {
            Cursor::Plain(raw) => {
                query.take_ttl()?;
                raw.execute(&query).await
            }
            Cursor::Caching(cursor) => cursor.execute(ctx, query, ttl).await,
        }
    }

    pub fn is_caching(&self) -> bool {
        matches!(self, Cursor::Caching(_))
    }
}

// == Caching Cursor ==
/// Cursor that memoizes results per connection session and query fingerprint.
///
/// The first statement executed binds the cursor. A later, different statement
/// runs on a fresh plain cursor from the same connection so this cursor's own
/// result state keeps belonging to its first statement.
#[derive(Debug)]
pub struct CachingCursor {
    connection: Arc<dyn RemoteConnection>,
    raw: Box<dyn RawCursor>,
    session_id: String,
    default_ttl: i64,
    bound: Option<Fingerprint>,
}

impl CachingCursor {
    pub fn new(connection: Arc<dyn RemoteConnection>) -> Self {
        let raw = connection.cursor();
        let session_id = connection.session_id().to_string();
        Self {
            connection,
            raw,
            session_id,
            default_ttl: DEFAULT_CURSOR_TTL,
            bound: None,
        }
    }

    pub fn with_default_ttl(mut self, ttl: i64) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn default_ttl(&self) -> i64 {
        self.default_ttl
    }

    /// Connection session the cursor's cache entries are scoped to.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Fingerprint of the statement this cursor is bound to, if any.
    pub fn bound_fingerprint(&self) -> Option<Fingerprint> {
        self.bound
    }

    // == Execute ==
    pub async fn execute(
        &mut self,
        ctx: &mut SessionContext,
        mut query: Query,
        ttl: Option<i64>,
    ) -> Result<ResultHandle> {
        let ttl_option = query.take_ttl()?;
        let fingerprint = Fingerprint::of(&query);
        let path = CachePath::new(self.session_id.as_str(), fingerprint);

        if let Some(cached) = ctx.results().lookup(&path) {
            return Ok(cached.rewound());
        }

        let ttl = ttl.or(ttl_option).unwrap_or(self.default_ttl);
        let result = match self.bound {
            Some(bound) if bound != fingerprint => {
                debug!(
                    session_id = %self.session_id,
                    bound = %bound,
                    fingerprint = %fingerprint,
                    "cursor bound to another statement, executing on a fresh cursor"
                );
                let mut fresh = self.connection.cursor();
                fresh.execute(&query).await?
            }
            _ => {
                let result = self.raw.execute(&query).await?;
                self.bound = Some(fingerprint);
                result
            }
        };

        ctx.results().store(&path, result.clone(), ttl);
        Ok(result)
    }
}
