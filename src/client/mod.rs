//! Remote Client Module
//!
//! Capability traits for the analytical database client the cache sits in front of,
//! plus the query and result types that flow through them.
//!
//! The wire protocol is out of scope: anything that can open a connection with a
//! server-assigned session identifier and execute a query through a cursor can be
//! plugged in. [`memory::InMemoryClient`] is the in-process implementation.

pub mod memory;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::connection::ConnectOptions;
use crate::error::{Result, SessionCacheError};

pub use memory::{Credentials, ExecutionRecord, InMemoryClient};

/// Name of the per-call cache TTL option accepted alongside query options.
pub const TTL_OPTION: &str = "ttl";

/// One result row, keyed by column name.
pub type Row = serde_json::Map<String, Value>;

// == Query ==
/// A statement plus its bound parameters.
///
/// `args` are positional and order-sensitive, `options` are named and kept sorted
/// by key so two equal queries always serialize the same way.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    pub text: String,
    pub args: Vec<Value>,
    pub options: BTreeMap<String, Value>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            args: Vec::new(),
            options: BTreeMap::new(),
        }
    }

    /// Appends a positional parameter.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Sets a named option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Removes the `ttl` option, if any, so it is never forwarded to the server.
    ///
    /// Accepts integers and integer strings; anything else is rejected.
    pub fn take_ttl(&mut self) -> Result<Option<i64>> {
        let Some(raw) = self.options.remove(TTL_OPTION) else {
            return Ok(None);
        };
        let ttl = match &raw {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        ttl.map(Some).ok_or_else(|| {
            SessionCacheError::InvalidRequest(format!("ttl must be an integer, got {raw}"))
        })
    }
}

// == Result Handle ==
/// Handle to the rows produced by one execution.
///
/// Rows are shared between clones; the read position is not. A clone taken for
/// the cache keeps its own position, and [`ResultHandle::rewound`] hands out a
/// copy that starts again from the first row.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultHandle {
    query_id: String,
    columns: Vec<String>,
    rows: Arc<Vec<Row>>,
    position: usize,
}

impl ResultHandle {
    pub fn new(query_id: impl Into<String>, columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            query_id: query_id.into(),
            columns,
            rows: Arc::new(rows),
            position: 0,
        }
    }

    /// Server identifier of the execution that produced these rows.
    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Total number of rows in the result, fetched or not.
    pub fn rowcount(&self) -> usize {
        self.rows.len()
    }

    /// Number of rows already handed out.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns a copy of this handle with nothing fetched yet.
    pub fn rewound(&self) -> Self {
        Self {
            position: 0,
            ..self.clone()
        }
    }

    pub fn fetch_one(&mut self) -> Option<Row> {
        let row = self.rows.get(self.position).cloned();
        if row.is_some() {
            self.position += 1;
        }
        row
    }

    pub fn fetch_many(&mut self, size: usize) -> Vec<Row> {
        let end = self.position.saturating_add(size).min(self.rows.len());
        let rows = self.rows[self.position..end].to_vec();
        self.position = end;
        rows
    }

    pub fn fetch_all(&mut self) -> Vec<Row> {
        self.fetch_many(self.rows.len())
    }
}

// == Capability Traits ==
/// Plain execution primitive bound to one connection.
#[async_trait]
pub trait RawCursor: Send + Sync + fmt::Debug {
    async fn execute(&mut self, query: &Query) -> Result<ResultHandle>;
}

/// One live remote connection.
#[async_trait]
pub trait RemoteConnection: Send + Sync + fmt::Debug {
    /// Identifier assigned by the server at connect time.
    fn session_id(&self) -> &str;

    fn is_closed(&self) -> bool;

    /// Opens a new plain cursor on this connection.
    fn cursor(&self) -> Box<dyn RawCursor>;

    async fn close(&self) -> Result<()>;
}

/// Entry point of the remote client library.
#[async_trait]
pub trait RemoteClient: Send + Sync + fmt::Debug {
    async fn connect(&self, options: &ConnectOptions) -> Result<Arc<dyn RemoteConnection>>;
}
