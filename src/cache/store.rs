//! Result Cache Module
//!
//! Lookup, store, expiry and sweep of cached query results inside a session's
//! store. Nothing here runs on a timer: expiry is detected on lookup, and stale
//! entries of a connection are swept right before each write to it.

use tracing::debug;

use crate::cache::{CacheEntry, CachePath, RESULTS_NAMESPACE};
use crate::client::ResultHandle;
use crate::session::{SessionContext, StoreNode};

// == Result Cache ==
/// Borrowed view of one session's cached results.
#[derive(Debug)]
pub struct ResultCache<'a> {
    ctx: &'a mut SessionContext,
}

impl<'a> ResultCache<'a> {
    pub fn new(ctx: &'a mut SessionContext) -> Self {
        Self { ctx }
    }

    // == Lookup ==
    /// Returns the cached payload at `path` if present and not expired.
    ///
    /// An expired entry is evicted on the way out.
    pub fn lookup(&mut self, path: &CachePath) -> Option<ResultHandle> {
        let now = self.ctx.now();
        let segments = path.segments();

        let expired = match self.ctx.store.get(&segments) {
            Some(StoreNode::Entry(entry)) if !entry.is_expired(now) => {
                let payload = entry.payload.clone();
                self.ctx.stats.record_hit();
                debug!(path = %path, "result cache hit");
                return Some(payload);
            }
            Some(StoreNode::Entry(_)) => true,
            _ => false,
        };

        if expired {
            self.clear(path);
            self.ctx.stats.record_expired();
            debug!(path = %path, "result cache entry expired");
        }
        self.ctx.stats.record_miss();
        None
    }

    // == Clear ==
    /// Removes the entry at `path`. Returns false if any segment is missing.
    pub fn clear(&mut self, path: &CachePath) -> bool {
        self.ctx.store.remove(&path.segments()).is_some()
    }

    // == Sweep Expired ==
    /// Evicts every expired entry cached for `session_id`.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self, session_id: &str) -> usize {
        let now = self.ctx.now();
        let Some(StoreNode::Map(entries)) = self.ctx.store.get_mut(&[RESULTS_NAMESPACE, session_id])
        else {
            return 0;
        };

        let before = entries.len();
        entries.retain(|_, node| match node {
            StoreNode::Entry(entry) => !entry.is_expired(now),
            _ => true,
        });
        let removed = before - entries.len();

        if removed > 0 {
            self.ctx.stats.record_swept(removed);
            debug!(session_id, removed, "swept expired results");
        }
        removed
    }

    // == Store ==
    /// Caches `payload` at `path` for `ttl` seconds.
    ///
    /// Sweeps the path's session first. A `ttl` below one means "do not cache";
    /// returns whether an entry was written.
    pub fn store(&mut self, path: &CachePath, payload: ResultHandle, ttl: i64) -> bool {
        self.sweep_expired(path.session_id());

        if ttl < 1 {
            self.ctx.stats.record_bypass();
            debug!(path = %path, ttl, "result not cached");
            return false;
        }

        let entry = CacheEntry::new(payload, self.ctx.now(), ttl);
        let [namespace, session_id, fingerprint] = path.segments();
        self.ctx
            .store
            .map_at_mut(&[namespace, session_id])
            .insert(fingerprint.to_string(), StoreNode::Entry(entry));
        self.ctx.stats.record_store();
        debug!(path = %path, ttl, "result cached");
        true
    }

    // == Clear Session ==
    /// Drops the whole subtree cached for `session_id`.
    pub fn clear_session(&mut self, session_id: &str) -> bool {
        let removed = self
            .ctx
            .store
            .remove(&[RESULTS_NAMESPACE, session_id])
            .is_some();
        if removed {
            self.ctx.stats.record_invalidation();
            debug!(session_id, "result cache invalidated");
        }
        removed
    }

    /// Number of entries cached for `session_id`, expired or not.
    pub fn entry_count(&self, session_id: &str) -> usize {
        self.ctx
            .store
            .get(&[RESULTS_NAMESPACE, session_id])
            .and_then(StoreNode::as_map)
            .map_or(0, |entries| {
                entries.values().filter(|n| n.as_entry().is_some()).count()
            })
    }
}
