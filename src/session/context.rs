//! Session Context Module
//!
//! Everything one UI session owns: its store, the clock it reads expiry times
//! from, and its cache statistics. Passed by reference into every cache operation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::cache::{CacheStats, ResultCache, RESULTS_NAMESPACE};
use crate::clock::{Clock, SystemClock};
use crate::session::{SessionStore, StoreNode};

// == Session Context ==
#[derive(Debug)]
pub struct SessionContext {
    id: Uuid,
    pub(crate) store: SessionStore,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) stats: CacheStats,
}

impl SessionContext {
    /// Creates a context on the wall clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            id: Uuid::new_v4(),
            store: SessionStore::new(),
            clock,
            stats: CacheStats::new(),
        }
    }

    /// Identifier of the UI session this context belongs to.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SessionStore {
        &mut self.store
    }

    /// Query result cache view over this session's store.
    pub fn results(&mut self) -> ResultCache<'_> {
        ResultCache::new(self)
    }

    /// Statistics snapshot including the current number of cached results.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.cached_entry_count());
        stats
    }

    fn cached_entry_count(&self) -> usize {
        self.store
            .get(&[RESULTS_NAMESPACE])
            .and_then(StoreNode::as_map)
            .map(|sessions| {
                sessions
                    .values()
                    .filter_map(StoreNode::as_map)
                    .map(|entries| entries.values().filter(|n| n.as_entry().is_some()).count())
                    .sum()
            })
            .unwrap_or(0)
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn test_contexts_have_distinct_ids() {
        assert_ne!(SessionContext::new().id(), SessionContext::new().id());
    }

    #[test]
    fn test_now_reads_injected_clock() {
        let clock = ManualClock::default();
        let ctx = SessionContext::with_clock(Arc::new(clock.clone()));

        let before = ctx.now();
        clock.advance_secs(5);

        assert_eq!((ctx.now() - before).num_seconds(), 5);
    }

    #[test]
    fn test_stats_start_empty() {
        let ctx = SessionContext::new();
        let stats = ctx.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.total_entries, 0);
    }
}
