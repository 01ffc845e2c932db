//! Gate Snapshot
//!
//! Read-only view of the gate's ledgers for the health endpoint and
//! operators.

use serde::{Deserialize, Serialize};

use super::config::RateLimitConfig;
use super::quota::LedgerScope;
use super::store::LedgerStore;

/// Ledger sizes and active limits at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateSnapshot {
    /// Time the snapshot was taken
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// Distinct address keys with at least one stored event
    pub tracked_addresses: usize,

    /// Distinct session keys with at least one stored event
    pub tracked_sessions: usize,

    /// Stored events across both ledgers
    pub stored_events: usize,

    /// Time of the last eviction pass (ms since epoch)
    pub last_cleanup_ms: u64,

    /// Limits in force
    pub limits: RateLimitConfig,
}

impl GateSnapshot {
    pub(crate) fn capture(store: &LedgerStore, config: &RateLimitConfig, now: u64) -> Self {
        let address = store.ledger(LedgerScope::Address);
        let session = store.ledger(LedgerScope::Session);

        Self {
            timestamp: chrono::DateTime::from_timestamp_millis(now as i64).unwrap_or_default(),
            tracked_addresses: address.key_count(),
            tracked_sessions: session.key_count(),
            stored_events: address.event_count() + session.event_count(),
            last_cleanup_ms: store.last_cleanup(),
            limits: config.clone(),
        }
    }

    /// True when no identity has any stored event
    pub fn is_idle(&self) -> bool {
        self.tracked_addresses == 0 && self.tracked_sessions == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_counts_both_ledgers() {
        let mut store = LedgerStore::new(5);
        store.ledger_mut(LedgerScope::Address).push("a", 10);
        store.ledger_mut(LedgerScope::Address).push("a", 11);
        store.ledger_mut(LedgerScope::Address).push("b", 12);
        store.ledger_mut(LedgerScope::Session).push("s", 12);

        let snapshot = GateSnapshot::capture(&store, &RateLimitConfig::default(), 1_700_000_000_000);
        assert_eq!(snapshot.tracked_addresses, 2);
        assert_eq!(snapshot.tracked_sessions, 1);
        assert_eq!(snapshot.stored_events, 4);
        assert_eq!(snapshot.last_cleanup_ms, 5);
        assert_eq!(snapshot.timestamp.timestamp_millis(), 1_700_000_000_000);
        assert!(!snapshot.is_idle());
    }

    #[test]
    fn test_empty_snapshot_is_idle() {
        let store = LedgerStore::new(0);
        let snapshot = GateSnapshot::capture(&store, &RateLimitConfig::default(), 0);
        assert!(snapshot.is_idle());
        assert_eq!(snapshot.stored_events, 0);
    }
}
