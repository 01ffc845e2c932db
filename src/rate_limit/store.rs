//! Event Ledgers
//!
//! In-memory per-key timestamp lists with periodic eviction. Not
//! synchronized; the gate owns the store behind its lock.

use std::collections::HashMap;

use super::quota::LedgerScope;

/// Per-key list of event timestamps in insertion order
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    entries: HashMap<String, Vec<u64>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestamps recorded for `key`, oldest first
    pub fn events(&self, key: &str) -> &[u64] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Append an event for `key`, creating the entry on first use
    pub fn push(&mut self, key: &str, timestamp: u64) {
        match self.entries.get_mut(key) {
            Some(events) => events.push(timestamp),
            None => {
                self.entries.insert(key.to_string(), vec![timestamp]);
            }
        }
    }

    /// Drop events with `t + ttl <= now`, removing keys left empty.
    ///
    /// Returns the number of keys removed.
    pub fn evict(&mut self, now: u64, ttl_ms: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, events| {
            events.retain(|t| t.saturating_add(ttl_ms) > now);
            !events.is_empty()
        });
        before - self.entries.len()
    }

    /// Number of tracked keys
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    /// Total stored events across all keys
    pub fn event_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

/// Result of one eviction pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionReport {
    pub address_keys_removed: usize,
    pub session_keys_removed: usize,
}

/// The address and session ledgers plus eviction bookkeeping
#[derive(Debug, Clone)]
pub struct LedgerStore {
    address: Ledger,
    session: Ledger,
    last_cleanup: u64,
}

impl LedgerStore {
    /// Create an empty store; `now` counts as the last eviction pass
    pub fn new(now: u64) -> Self {
        Self {
            address: Ledger::new(),
            session: Ledger::new(),
            last_cleanup: now,
        }
    }

    pub fn ledger(&self, scope: LedgerScope) -> &Ledger {
        match scope {
            LedgerScope::Address => &self.address,
            LedgerScope::Session => &self.session,
        }
    }

    pub fn ledger_mut(&mut self, scope: LedgerScope) -> &mut Ledger {
        match scope {
            LedgerScope::Address => &mut self.address,
            LedgerScope::Session => &mut self.session,
        }
    }

    /// Run eviction if at least `interval_ms` passed since the last pass
    pub fn maybe_evict(&mut self, now: u64, ttl_ms: u64, interval_ms: u64) -> Option<EvictionReport> {
        if now.saturating_sub(self.last_cleanup) < interval_ms {
            return None;
        }
        Some(self.evict(now, ttl_ms))
    }

    /// Unconditional eviction pass over both ledgers
    pub fn evict(&mut self, now: u64, ttl_ms: u64) -> EvictionReport {
        self.last_cleanup = now;
        EvictionReport {
            address_keys_removed: self.address.evict(now, ttl_ms),
            session_keys_removed: self.session.evict(now, ttl_ms),
        }
    }

    pub fn last_cleanup(&self) -> u64 {
        self.last_cleanup
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: u64 = 1_000;

    #[test]
    fn test_push_and_events() {
        let mut ledger = Ledger::new();
        assert!(ledger.events("a").is_empty());

        ledger.push("a", 1);
        ledger.push("a", 2);
        ledger.push("b", 3);

        assert_eq!(ledger.events("a"), &[1, 2]);
        assert_eq!(ledger.key_count(), 2);
        assert_eq!(ledger.event_count(), 3);
    }

    #[test]
    fn test_evict_keeps_fresh_entries() {
        let mut ledger = Ledger::new();
        ledger.push("a", 100);
        ledger.push("a", 900);

        // now=1_150: 100 is stale, 900 is fresh
        let removed = ledger.evict(1_150, TTL);
        assert_eq!(removed, 0);
        assert_eq!(ledger.events("a"), &[900]);
    }

    #[test]
    fn test_evict_removes_empty_keys_only() {
        let mut ledger = Ledger::new();
        ledger.push("stale", 0);
        ledger.push("fresh", 500);

        let removed = ledger.evict(TTL, TTL);
        assert_eq!(removed, 1);
        assert_eq!(ledger.key_count(), 1);
        assert!(ledger.events("stale").is_empty());
        assert_eq!(ledger.events("fresh"), &[500]);
    }

    #[test]
    fn test_maybe_evict_respects_interval() {
        let mut store = LedgerStore::new(0);
        store.ledger_mut(LedgerScope::Address).push("a", 0);
        store.ledger_mut(LedgerScope::Session).push("s", 0);

        assert_eq!(store.maybe_evict(59_999, TTL, 60_000), None);
        assert!(!store.ledger(LedgerScope::Address).events("a").is_empty());

        let report = store.maybe_evict(60_000, TTL, 60_000).unwrap();
        assert_eq!(report.address_keys_removed, 1);
        assert_eq!(report.session_keys_removed, 1);
        assert_eq!(store.last_cleanup(), 60_000);

        // Next pass is measured from the previous one
        assert_eq!(store.maybe_evict(119_999, TTL, 60_000), None);
    }
}
