//! Response DTOs for the host API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::client::{ResultHandle, Row};
use crate::login::GateView;

/// Response body for POST /sessions
#[derive(Debug, Clone, Serialize)]
pub struct SessionCreatedResponse {
    /// Identifier of the new UI session
    pub session_id: String,
    /// What the new session should render first
    pub login: GateView,
}

/// Response body for the login and disconnect endpoints
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub session_id: String,
    #[serde(flatten)]
    pub view: GateView,
}

impl LoginResponse {
    pub fn new(session_id: impl Into<String>, view: GateView) -> Self {
        Self {
            session_id: session_id.into(),
            view,
        }
    }
}

/// Response body for POST /sessions/:id/query
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub query_id: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub rowcount: usize,
    /// True when the result came from the session's cache
    pub cached: bool,
}

impl QueryResponse {
    pub fn new(mut result: ResultHandle, cached: bool) -> Self {
        Self {
            query_id: result.query_id().to_string(),
            columns: result.columns().to_vec(),
            rowcount: result.rowcount(),
            rows: result.fetch_all(),
            cached,
        }
    }
}

/// Response body for GET /sessions/:id/stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub session_id: String,
    /// Current login gate state
    pub gate: String,
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    pub fn new(session_id: impl Into<String>, gate: impl Into<String>, stats: CacheStats) -> Self {
        Self {
            session_id: session_id.into(),
            gate: gate.into(),
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Response body for DELETE /sessions/:id
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// Number of live UI sessions
    pub sessions: usize,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(sessions: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            sessions,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_login_response_flattens_view() {
        let resp = LoginResponse::new(
            "abc",
            GateView::Ready {
                session_id: "1000001".to_string(),
            },
        );
        let value: Value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["status"], "ready");
        assert_eq!(value["session_id"], "abc");
    }

    #[test]
    fn test_query_response_reads_all_rows() {
        let mut row = Row::new();
        row.insert("N".to_string(), json!(1));
        let handle = ResultHandle::new("q1", vec!["N".to_string()], vec![row.clone(), row]);

        let resp = QueryResponse::new(handle, true);

        assert_eq!(resp.rowcount, 2);
        assert_eq!(resp.rows.len(), 2);
        assert!(resp.cached);
    }

    #[test]
    fn test_stats_response_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..CacheStats::default()
        };
        let resp = StatsResponse::new("abc", "connected", stats);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);

        let value: Value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["hits"], 80);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy(2);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}
