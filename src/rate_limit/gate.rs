//! Admission Gate
//!
//! Decides whether a generation request may proceed against the address and
//! session quotas, and records completed generations.

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use super::config::RateLimitConfig;
use super::quota::{LedgerScope, Quota, QuotaKind};
use super::snapshot::GateSnapshot;
use super::store::LedgerStore;
use crate::metrics;

/// Result of an admission check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    /// Whether the request may proceed
    pub allowed: bool,

    /// User-facing reason for denial
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Seconds until the offending event leaves its window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,

    /// Quota that caused the denial
    #[serde(skip)]
    pub quota: Option<QuotaKind>,
}

impl Decision {
    /// Create an allowed decision
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
            retry_after_seconds: None,
            quota: None,
        }
    }

    /// Create a denied decision for `quota`
    pub fn denied(quota: QuotaKind, retry_after_seconds: u64) -> Self {
        Self {
            allowed: false,
            reason: Some(quota.reason().to_string()),
            retry_after_seconds: Some(retry_after_seconds),
            quota: Some(quota),
        }
    }
}

/// Admission control as seen by the HTTP layer.
///
/// The in-memory [`AdmissionGate`] is the only implementation; a shared-store
/// backend would implement the same contract.
pub trait AdmissionControl: Send + Sync {
    /// Check the caller's quotas without counting the request
    fn evaluate(&self, address: &str, session: Option<&str>) -> Decision;

    /// Count one successful generation for the caller
    fn record(&self, address: &str, session: Option<&str>);

    /// Current ledger sizes and limits
    fn snapshot(&self) -> GateSnapshot;
}

/// Single-process, memory-resident admission gate
#[derive(Debug)]
pub struct AdmissionGate {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    store: Mutex<LedgerStore>,
}

impl AdmissionGate {
    /// Create a gate on the wall clock
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a gate with an explicit time source
    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now_millis();
        Self {
            config,
            clock,
            store: Mutex::new(LedgerStore::new(now)),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn quota(&self, kind: QuotaKind) -> Quota {
        let limit = match kind {
            QuotaKind::AddressPerHour => self.config.per_address_per_hour,
            QuotaKind::AddressPerDay => self.config.per_address_per_day,
            QuotaKind::SessionPerDay => self.config.per_session_per_day,
        };
        Quota::new(kind, limit)
    }

    // Poisoned locks are recovered; every ledger write is a single push.
    fn lock(&self) -> MutexGuard<'_, LedgerStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn maintain(&self, store: &mut LedgerStore, now: u64) {
        let Some(report) = store.maybe_evict(
            now,
            self.config.entry_ttl_ms(),
            self.config.cleanup_interval_ms(),
        ) else {
            return;
        };

        debug!(
            address_keys_removed = report.address_keys_removed,
            session_keys_removed = report.session_keys_removed,
            "Evicted stale ledger entries"
        );
        metrics::LEDGER_KEYS_EVICTED_TOTAL
            .with_label_values(&["address"])
            .inc_by(report.address_keys_removed as u64);
        metrics::LEDGER_KEYS_EVICTED_TOTAL
            .with_label_values(&["session"])
            .inc_by(report.session_keys_removed as u64);
        update_tracked_keys(store);
    }
}

fn update_tracked_keys(store: &LedgerStore) {
    metrics::LEDGER_TRACKED_KEYS
        .with_label_values(&["address"])
        .set(store.ledger(LedgerScope::Address).key_count() as i64);
    metrics::LEDGER_TRACKED_KEYS
        .with_label_values(&["session"])
        .set(store.ledger(LedgerScope::Session).key_count() as i64);
}

/// An empty session token counts as no session
fn session_key(session: Option<&str>) -> Option<&str> {
    session.filter(|s| !s.is_empty())
}

impl AdmissionControl for AdmissionGate {
    fn evaluate(&self, address: &str, session: Option<&str>) -> Decision {
        let session = session_key(session);
        let now = self.clock.now_millis();
        let mut store = self.lock();
        self.maintain(&mut store, now);

        for kind in QuotaKind::PRIORITY {
            let key = match kind.scope() {
                LedgerScope::Address => address,
                LedgerScope::Session => match session {
                    Some(session) => session,
                    None => continue,
                },
            };

            let events = store.ledger(kind.scope()).events(key);
            if let Some(retry_after) = self.quota(kind).check(events, now) {
                warn!(
                    address = %address,
                    quota = kind.as_str(),
                    retry_after_secs = retry_after,
                    "Generation request rate limited"
                );
                metrics::REQUESTS_DENIED_TOTAL
                    .with_label_values(&[kind.as_str()])
                    .inc();
                return Decision::denied(kind, retry_after);
            }
        }

        debug!(address = %address, has_session = session.is_some(), "Generation request admitted");
        metrics::REQUESTS_ADMITTED_TOTAL.inc();
        Decision::allowed()
    }

    fn record(&self, address: &str, session: Option<&str>) {
        let session = session_key(session);
        let now = self.clock.now_millis();
        let mut store = self.lock();

        store.ledger_mut(LedgerScope::Address).push(address, now);
        if let Some(session) = session {
            store.ledger_mut(LedgerScope::Session).push(session, now);
        }

        debug!(address = %address, has_session = session.is_some(), "Recorded generation");
        metrics::GENERATIONS_RECORDED_TOTAL.inc();
        update_tracked_keys(&store);
    }

    fn snapshot(&self) -> GateSnapshot {
        let now = self.clock.now_millis();
        let store = self.lock();
        GateSnapshot::capture(&store, &self.config, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::clock::ManualClock;
    use crate::rate_limit::quota::{DAY_WINDOW_MS, HOUR_WINDOW_MS};

    fn gate_at(start: u64) -> (AdmissionGate, ManualClock) {
        let clock = ManualClock::new(start);
        let gate = AdmissionGate::with_clock(RateLimitConfig::default(), Arc::new(clock.clone()));
        (gate, clock)
    }

    #[test]
    fn test_fresh_identity_allowed() {
        let (gate, _) = gate_at(0);
        assert_eq!(gate.evaluate("1.2.3.4", None), Decision::allowed());
        assert!(gate.evaluate("", Some("")).allowed);
    }

    #[test]
    fn test_evaluate_does_not_count() {
        let (gate, _) = gate_at(0);
        for _ in 0..20 {
            assert!(gate.evaluate("1.2.3.4", Some("s")).allowed);
        }
        assert_eq!(gate.snapshot().stored_events, 0);
    }

    #[test]
    fn test_hourly_limit() {
        let (gate, clock) = gate_at(0);
        for _ in 0..5 {
            gate.record("1.2.3.4", None);
        }

        clock.set(1);
        let decision = gate.evaluate("1.2.3.4", None);
        assert!(!decision.allowed);
        assert_eq!(decision.quota, Some(QuotaKind::AddressPerHour));
        assert_eq!(
            decision.reason.as_deref(),
            Some("Too many requests. Please try again in a bit.")
        );
        assert_eq!(decision.retry_after_seconds, Some(3_600));

        clock.set(HOUR_WINDOW_MS + 1);
        assert!(gate.evaluate("1.2.3.4", None).allowed);
    }

    #[test]
    fn test_session_limit_skipped_without_session() {
        let (gate, clock) = gate_at(0);
        for i in 0..5 {
            gate.record(&format!("10.0.0.{}", i), Some("s1"));
        }
        clock.advance(1_000);

        assert!(!gate.evaluate("10.0.0.9", Some("s1")).allowed);
        assert!(gate.evaluate("10.0.0.9", None).allowed);
    }

    #[test]
    fn test_empty_session_is_ignored() {
        let (gate, _) = gate_at(0);
        gate.record("1.1.1.1", Some(""));
        assert_eq!(gate.snapshot().tracked_sessions, 0);
    }

    #[test]
    fn test_eviction_runs_on_evaluate_after_interval() {
        let (gate, clock) = gate_at(0);
        gate.record("old", Some("old-session"));

        clock.set(DAY_WINDOW_MS);
        gate.record("new", None);
        assert_eq!(gate.snapshot().tracked_addresses, 2);

        gate.evaluate("anyone", None);
        let snapshot = gate.snapshot();
        assert_eq!(snapshot.tracked_addresses, 1);
        assert_eq!(snapshot.tracked_sessions, 0);
        assert_eq!(snapshot.last_cleanup_ms, DAY_WINDOW_MS);
    }

    #[test]
    fn test_eviction_throttled_by_interval() {
        let (gate, clock) = gate_at(DAY_WINDOW_MS);
        gate.evaluate("x", None);

        clock.advance(30_000);
        gate.evaluate("x", None);
        assert_eq!(gate.snapshot().last_cleanup_ms, DAY_WINDOW_MS);

        clock.advance(30_000);
        gate.evaluate("x", None);
        assert_eq!(gate.snapshot().last_cleanup_ms, DAY_WINDOW_MS + 60_000);
    }

    #[test]
    fn test_decision_serialization() {
        let json = serde_json::to_value(Decision::denied(QuotaKind::AddressPerDay, 42)).unwrap();
        assert_eq!(json["allowed"], false);
        assert_eq!(json["reason"], "Daily limit reached. Come back tomorrow!");
        assert_eq!(json["retryAfterSeconds"], 42);
        assert!(json.get("quota").is_none());

        let json = serde_json::to_value(Decision::allowed()).unwrap();
        assert_eq!(json, serde_json::json!({ "allowed": true }));
    }
}
