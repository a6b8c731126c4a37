//! Cache Entry Module
//!
//! Defines one cached query result with its expiry.

use chrono::{DateTime, Duration, Utc};

use crate::client::ResultHandle;

// == Cache Entry ==
/// A cached result handle and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached result
    pub payload: ResultHandle,
    /// When the entry was written
    pub created_at: DateTime<Utc>,
    /// First instant at which the entry is no longer valid
    pub expires: DateTime<Utc>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry valid for `ttl_seconds` from `now`.
    ///
    /// A TTL reaching past the last representable instant never expires.
    pub fn new(payload: ResultHandle, now: DateTime<Utc>, ttl_seconds: i64) -> Self {
        let expires = Duration::try_seconds(ttl_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            payload,
            created_at: now,
            expires,
        }
    }

    // == Is Expired ==
    /// An entry is valid iff `now < expires`, so it is expired from the
    /// expiry instant onwards.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires
    }

    // == Time To Live ==
    /// Remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self, now: DateTime<Utc>) -> Duration {
        if self.expires > now {
            self.expires - now
        } else {
            Duration::zero()
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ResultHandle {
        ResultHandle::new("q-1", vec![], vec![])
    }

    #[test]
    fn test_entry_valid_before_expiry() {
        let now = Utc::now();
        let entry = CacheEntry::new(payload(), now, 60);

        assert!(!entry.is_expired(now));
        assert!(!entry.is_expired(now + Duration::seconds(59)));
    }

    #[test]
    fn test_entry_expired_after_ttl() {
        let now = Utc::now();
        let entry = CacheEntry::new(payload(), now, 1);

        assert!(entry.is_expired(now + Duration::seconds(2)));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Utc::now();
        let entry = CacheEntry::new(payload(), now, 10);

        assert!(entry.is_expired(entry.expires), "Entry should be expired at boundary");
    }

    #[test]
    fn test_huge_ttl_saturates_expiry() {
        let now = Utc::now();
        let entry = CacheEntry::new(payload(), now, i64::MAX);

        assert_eq!(entry.expires, DateTime::<Utc>::MAX_UTC);
        assert!(!entry.is_expired(now + Duration::days(365 * 1000)));
    }

    #[test]
    fn test_ttl_remaining() {
        let now = Utc::now();
        let entry = CacheEntry::new(payload(), now, 10);

        assert_eq!(entry.ttl_remaining(now + Duration::seconds(4)), Duration::seconds(6));
        assert_eq!(entry.ttl_remaining(now + Duration::seconds(30)), Duration::zero());
    }
}
