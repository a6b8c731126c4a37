//! In-Memory Client
//!
//! An in-process analytical backend implementing the remote client traits.
//! It serves registered result tables, echoes anything else, checks credentials
//! when configured, and keeps an execution log so callers can see exactly which
//! cursor reached the "server".

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use tracing::debug;

use super::{Query, RawCursor, RemoteClient, RemoteConnection, ResultHandle, Row};
use crate::connection::ConnectOptions;
use crate::error::{Result, SessionCacheError};

// == Credentials ==
/// Account/user/password triple the backend accepts.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub account: String,
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// One statement that reached the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRecord {
    pub session_id: String,
    pub cursor_id: u64,
    pub text: String,
}

#[derive(Debug, Default)]
struct Backend {
    credentials: RwLock<Option<Credentials>>,
    tables: RwLock<HashMap<String, (Vec<String>, Vec<Row>)>>,
    failing: RwLock<HashMap<String, String>>,
    log: Mutex<Vec<ExecutionRecord>>,
    connections: Mutex<Vec<Arc<ConnectionState>>>,
    next_session: AtomicU64,
    next_cursor: AtomicU64,
    next_query: AtomicU64,
}

#[derive(Debug)]
struct ConnectionState {
    session_id: String,
    closed: AtomicBool,
}

// == In-Memory Client ==
/// Cloneable handle to one in-process backend.
#[derive(Debug, Clone, Default)]
pub struct InMemoryClient {
    backend: Arc<Backend>,
}

impl InMemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept connections presenting these credentials.
    pub fn with_credentials(self, credentials: Credentials) -> Self {
        *self.backend.credentials.write() = Some(credentials);
        self
    }

    /// Serves `rows` for every execution of `text`.
    pub fn with_table(self, text: impl Into<String>, columns: Vec<String>, rows: Vec<Row>) -> Self {
        self.backend
            .tables
            .write()
            .insert(normalize(&text.into()), (columns, rows));
        self
    }

    /// Makes every execution of `text` fail with `message`.
    pub fn fail_on(&self, text: impl Into<String>, message: impl Into<String>) {
        self.backend
            .failing
            .write()
            .insert(normalize(&text.into()), message.into());
    }

    /// Number of statements executed across all connections.
    pub fn executions(&self) -> usize {
        self.backend.log.lock().len()
    }

    /// Number of times `text` was executed.
    pub fn executions_of(&self, text: &str) -> usize {
        let wanted = normalize(text);
        self.backend
            .log
            .lock()
            .iter()
            .filter(|record| normalize(&record.text) == wanted)
            .count()
    }

    pub fn execution_log(&self) -> Vec<ExecutionRecord> {
        self.backend.log.lock().clone()
    }

    /// Server-side termination of every open session.
    pub fn terminate_all(&self) {
        for state in self.backend.connections.lock().iter() {
            state.closed.store(true, Ordering::SeqCst);
        }
    }

    fn check_credentials(&self, options: &ConnectOptions) -> Result<()> {
        let guard = self.backend.credentials.read();
        let Some(expected) = guard.as_ref() else {
            return match options.user.as_deref() {
                Some(user) if !user.is_empty() => Ok(()),
                _ => Err(SessionCacheError::Connect("user is required".to_string())),
            };
        };

        let matches = options.account.as_deref() == Some(expected.account.as_str())
            && options.user.as_deref() == Some(expected.user.as_str())
            && options.password.as_deref() == Some(expected.password.as_str());
        if matches {
            Ok(())
        } else {
            Err(SessionCacheError::Connect(
                "Incorrect username or password was specified.".to_string(),
            ))
        }
    }
}

#[async_trait]
impl RemoteClient for InMemoryClient {
    async fn connect(&self, options: &ConnectOptions) -> Result<Arc<dyn RemoteConnection>> {
        self.check_credentials(options)?;

        let id = self.backend.next_session.fetch_add(1, Ordering::SeqCst) + 1;
        let state = Arc::new(ConnectionState {
            session_id: format!("{}", 1_000_000 + id),
            closed: AtomicBool::new(false),
        });
        self.backend.connections.lock().push(Arc::clone(&state));
        debug!(session_id = %state.session_id, "in-memory session opened");

        Ok(Arc::new(InMemoryConnection {
            backend: Arc::clone(&self.backend),
            state,
        }))
    }
}

// == Connection ==
#[derive(Debug)]
struct InMemoryConnection {
    backend: Arc<Backend>,
    state: Arc<ConnectionState>,
}

#[async_trait]
impl RemoteConnection for InMemoryConnection {
    fn session_id(&self) -> &str {
        &self.state.session_id
    }

    fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }

    fn cursor(&self) -> Box<dyn RawCursor> {
        Box::new(InMemoryCursor {
            backend: Arc::clone(&self.backend),
            state: Arc::clone(&self.state),
            cursor_id: self.backend.next_cursor.fetch_add(1, Ordering::SeqCst) + 1,
        })
    }

    async fn close(&self) -> Result<()> {
        self.state.closed.store(true, Ordering::SeqCst);
        self.backend
            .connections
            .lock()
            .retain(|state| !Arc::ptr_eq(state, &self.state));
        Ok(())
    }
}

// == Cursor ==
#[derive(Debug)]
struct InMemoryCursor {
    backend: Arc<Backend>,
    state: Arc<ConnectionState>,
    cursor_id: u64,
}

#[async_trait]
impl RawCursor for InMemoryCursor {
    async fn execute(&mut self, query: &Query) -> Result<ResultHandle> {
        if self.state.closed.load(Ordering::SeqCst) {
            return Err(SessionCacheError::ConnectionClosed(
                self.state.session_id.clone(),
            ));
        }

        self.backend.log.lock().push(ExecutionRecord {
            session_id: self.state.session_id.clone(),
            cursor_id: self.cursor_id,
            text: query.text.clone(),
        });

        let key = normalize(&query.text);
        if let Some(message) = self.backend.failing.read().get(&key) {
            return Err(SessionCacheError::Execute(message.clone()));
        }

        let query_id = format!(
            "{}-{}",
            self.state.session_id,
            self.backend.next_query.fetch_add(1, Ordering::SeqCst) + 1
        );

        if let Some((columns, rows)) = self.backend.tables.read().get(&key) {
            return Ok(ResultHandle::new(query_id, columns.clone(), rows.clone()));
        }

        let mut row = Row::new();
        row.insert("QUERY".to_string(), Value::String(query.text.clone()));
        row.insert("ARGS".to_string(), Value::Array(query.args.clone()));
        row.insert("SESSION_ID".to_string(), json!(self.state.session_id));
        Ok(ResultHandle::new(
            query_id,
            vec![
                "QUERY".to_string(),
                "ARGS".to_string(),
                "SESSION_ID".to_string(),
            ],
            vec![row],
        ))
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
