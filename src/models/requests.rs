//! Request DTOs for the host API
//!
//! Defines the structure of incoming HTTP request bodies.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::client::Query;

/// Maximum accepted statement length in bytes.
pub const MAX_SQL_LEN: usize = 64 * 1024;

/// Request body for POST /sessions/:id/login
///
/// Field values keyed by form field name. Empty values leave the provider
/// default in place.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

/// Request body for POST /sessions/:id/query
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    /// Statement text
    pub sql: String,
    /// Positional bind arguments
    #[serde(default)]
    pub args: Vec<Value>,
    /// Execute options; a `ttl` entry is consumed by the cache
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
    /// Optional cache TTL in seconds for this call
    #[serde(default)]
    pub ttl: Option<i64>,
}

impl QueryRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.sql.trim().is_empty() {
            return Some("sql cannot be empty".to_string());
        }
        if self.sql.len() > MAX_SQL_LEN {
            return Some(format!("sql exceeds maximum length of {MAX_SQL_LEN} bytes"));
        }
        None
    }

    pub fn to_query(&self) -> Query {
        let mut query = Query::new(self.sql.clone());
        query.args = self.args.clone();
        query.options = self.options.clone();
        query
    }
}
