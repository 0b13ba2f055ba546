//! Reverse-timestamp key encoding for snapshot rows.
//!
//! Snapshots are keyed by `(url, MAX_TIMESTAMP - fetched_at)`. Ascending key
//! order on the second component is descending fetch-time order, so "most
//! recent" is the first row of a forward scan and the substrate never needs
//! to scan backwards.

/// Sentinel the reverse timestamp is computed against.
///
/// Fixed for the life of a store: changing it invalidates every existing key.
pub const MAX_TIMESTAMP: i64 = i64::MAX;

/// Composite sort key for a snapshot row.
///
/// Ordering is derived, so keys compare the way the storage layer sorts them:
/// by url, then by reverse timestamp.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SnapshotKey {
    pub url: String,
    pub fetched_at_rev_ts: i64,
}

/// Encode `(url, fetched_at)` into its storage key.
///
/// `fetched_at` must lie in `0..=MAX_TIMESTAMP`; the store rejects negative
/// timestamps before calling this.
pub fn encode(url: &str, fetched_at: i64) -> SnapshotKey {
    SnapshotKey { url: url.to_string(), fetched_at_rev_ts: rev_ts(fetched_at) }
}

/// Recover `(url, fetched_at)` from a storage key.
pub fn decode(key: &SnapshotKey) -> (&str, i64) {
    (&key.url, MAX_TIMESTAMP - key.fetched_at_rev_ts)
}

/// The reverse-timestamp transform. Involutive over `0..=MAX_TIMESTAMP`.
pub fn rev_ts(fetched_at: i64) -> i64 {
    MAX_TIMESTAMP - fetched_at
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_timestamp_sorts_first() {
        let older = encode("https://example.com", 100);
        let newer = encode("https://example.com", 200);
        assert!(newer < older);
    }

    #[test]
    fn test_order_is_by_url_then_rev_ts() {
        let a = encode("https://a.com", 100);
        let b = encode("https://b.com", 200);
        assert!(a < b);
    }

    #[test]
    fn test_round_trip() {
        for ts in [0, 1, 1_400_000_000_000, MAX_TIMESTAMP - 1, MAX_TIMESTAMP] {
            let key = encode("https://example.com", ts);
            let (url, fetched_at) = decode(&key);
            assert_eq!(url, "https://example.com");
            assert_eq!(fetched_at, ts);
        }
    }

    #[test]
    fn test_edge_timestamps() {
        assert_eq!(rev_ts(0), MAX_TIMESTAMP);
        assert_eq!(rev_ts(MAX_TIMESTAMP), 0);
    }

    #[test]
    fn test_rev_ts_involutive() {
        let ts = 1_690_000_000_123;
        assert_eq!(rev_ts(rev_ts(ts)), ts);
    }
}
