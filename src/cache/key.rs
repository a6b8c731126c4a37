//! Cache Key Module
//!
//! Fingerprints and store paths for cached query results.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde_json::Value;

use crate::client::{Query, TTL_OPTION};

/// Top-level store key under which all cached query results live.
pub const RESULTS_NAMESPACE: &str = "query_results";

// == Fingerprint ==
/// Deterministic hash of a query's text and parameters.
///
/// The text is serialized as the first positional argument, followed by the
/// remaining arguments in order, then the key-sorted options. The `ttl` option
/// only controls caching and is left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub fn of(query: &Query) -> Self {
        let positional: Vec<Value> = std::iter::once(Value::String(query.text.clone()))
            .chain(query.args.iter().cloned())
            .collect();
        let named: serde_json::Map<String, Value> = query
            .options
            .iter()
            .filter(|(k, _)| k.as_str() != TTL_OPTION)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let serialized = format!("{}||{}", Value::Array(positional), Value::Object(named));
        let mut hasher = DefaultHasher::new();
        serialized.hash(&mut hasher);
        Self(hasher.finish())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

// == Cache Path ==
/// `[RESULTS_NAMESPACE][session_id][fingerprint]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePath {
    session_id: String,
    fingerprint_key: String,
}

impl CachePath {
    pub fn new(session_id: impl Into<String>, fingerprint: Fingerprint) -> Self {
        Self {
            session_id: session_id.into(),
            fingerprint_key: fingerprint.to_string(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn segments(&self) -> [&str; 3] {
        [RESULTS_NAMESPACE, &self.session_id, &self.fingerprint_key]
    }
}

impl fmt::Display for CachePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments().join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let query = Query::new("SELECT * FROM t WHERE id = %s").arg(7);
        assert_eq!(Fingerprint::of(&query), Fingerprint::of(&query.clone()));
    }

    #[test]
    fn test_fingerprint_depends_on_text() {
        let a = Query::new("SELECT 1");
        let b = Query::new("SELECT 2");
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn test_fingerprint_is_order_sensitive_for_args() {
        let a = Query::new("SELECT %s, %s").arg(1).arg(2);
        let b = Query::new("SELECT %s, %s").arg(2).arg(1);
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn test_fingerprint_ignores_option_insertion_order() {
        let a = Query::new("SELECT 1").option("a", 1).option("b", json!("x"));
        let b = Query::new("SELECT 1").option("b", json!("x")).option("a", 1);
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn test_fingerprint_separates_args_from_options() {
        let a = Query::new("SELECT 1").arg("x");
        let b = Query::new("SELECT 1").option("x", Value::Null);
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn test_fingerprint_ignores_ttl_option() {
        let plain = Query::new("SELECT 1").option("timeout", 5);
        let short = plain.clone().option("ttl", 5);
        let long = plain.clone().option("ttl", "3600");

        assert_eq!(Fingerprint::of(&plain), Fingerprint::of(&short));
        assert_eq!(Fingerprint::of(&short), Fingerprint::of(&long));
    }

    #[test]
    fn test_cache_path_segments() {
        let fingerprint = Fingerprint::of(&Query::new("SELECT 1"));
        let path = CachePath::new("1000001", fingerprint);

        let segments = path.segments();
        assert_eq!(segments[0], RESULTS_NAMESPACE);
        assert_eq!(segments[1], "1000001");
        assert_eq!(segments[2], fingerprint.to_string());
    }
}
