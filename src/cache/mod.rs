//! Cache Module
//!
//! Session-scoped query result cache with lazy TTL expiry and write-time sweeps.
//!
//! Results live in the session store at
//! `[RESULTS_NAMESPACE][connection session id][query fingerprint]`, so each
//! connection's results can be dropped as one subtree when it closes.

mod entry;
mod key;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use key::{CachePath, Fingerprint, RESULTS_NAMESPACE};
pub use stats::CacheStats;
pub use store::ResultCache;
