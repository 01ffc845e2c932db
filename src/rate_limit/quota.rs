//! Quota Types and Trailing Window Evaluation
//!
//! A quota is a count limit over a trailing window, scoped to one ledger.
//! Windows are relative to the evaluation instant, not calendar aligned.

use serde::{Deserialize, Serialize};

/// One hour in milliseconds
pub const HOUR_WINDOW_MS: u64 = 60 * 60 * 1000;

/// One day in milliseconds
pub const DAY_WINDOW_MS: u64 = 24 * 60 * 60 * 1000;

/// Which ledger a quota counts against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerScope {
    /// Keyed by caller network address
    Address,
    /// Keyed by client session token
    Session,
}

/// The quotas enforced by the gate, in evaluation priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaKind {
    /// Generations per address in a trailing hour
    AddressPerHour,
    /// Generations per address in a trailing day
    AddressPerDay,
    /// Generations per session in a trailing day
    SessionPerDay,
}

impl QuotaKind {
    /// All quotas, first violation wins
    pub const PRIORITY: [QuotaKind; 3] = [
        QuotaKind::AddressPerHour,
        QuotaKind::AddressPerDay,
        QuotaKind::SessionPerDay,
    ];

    /// Trailing window length in milliseconds
    pub fn window_ms(&self) -> u64 {
        match self {
            QuotaKind::AddressPerHour => HOUR_WINDOW_MS,
            QuotaKind::AddressPerDay | QuotaKind::SessionPerDay => DAY_WINDOW_MS,
        }
    }

    pub fn scope(&self) -> LedgerScope {
        match self {
            QuotaKind::AddressPerHour | QuotaKind::AddressPerDay => LedgerScope::Address,
            QuotaKind::SessionPerDay => LedgerScope::Session,
        }
    }

    /// User-facing denial message
    pub fn reason(&self) -> &'static str {
        match self {
            QuotaKind::AddressPerHour => "Too many requests. Please try again in a bit.",
            QuotaKind::AddressPerDay => "Daily limit reached. Come back tomorrow!",
            QuotaKind::SessionPerDay => {
                "You've used all your generations for today. Come back tomorrow!"
            }
        }
    }

    /// Metric label
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaKind::AddressPerHour => "address_per_hour",
            QuotaKind::AddressPerDay => "address_per_day",
            QuotaKind::SessionPerDay => "session_per_day",
        }
    }
}

/// A limit bound to a quota kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    pub kind: QuotaKind,
    pub limit: u32,
}

/// Outcome of checking one quota against a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowUsage {
    /// Events inside the trailing window
    pub count: usize,

    /// Earliest event inside the window, in ledger order
    pub oldest: Option<u64>,
}

impl Quota {
    pub fn new(kind: QuotaKind, limit: u32) -> Self {
        Self { kind, limit }
    }

    /// Count the events of `timestamps` that fall inside this quota's window.
    ///
    /// An event at `t` is inside iff `t + window > now`.
    pub fn usage(&self, timestamps: &[u64], now: u64) -> WindowUsage {
        let window = self.kind.window_ms();
        let mut in_window = timestamps
            .iter()
            .copied()
            .filter(|t| t.saturating_add(window) > now);

        let oldest = in_window.next();
        let count = oldest.map_or(0, |_| 1 + in_window.count());

        WindowUsage { count, oldest }
    }

    /// Returns the retry delay in whole seconds when the quota is exhausted.
    pub fn check(&self, timestamps: &[u64], now: u64) -> Option<u64> {
        let usage = self.usage(timestamps, now);
        if usage.count < self.limit as usize {
            return None;
        }

        let oldest = usage.oldest?;
        let exits_at = oldest.saturating_add(self.kind.window_ms());
        Some(retry_after_secs(exits_at, now))
    }
}

/// Seconds until `exits_at`, rounded up
pub fn retry_after_secs(exits_at: u64, now: u64) -> u64 {
    exits_at.saturating_sub(now).div_ceil(1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        assert_eq!(QuotaKind::PRIORITY[0], QuotaKind::AddressPerHour);
        assert_eq!(QuotaKind::PRIORITY[1], QuotaKind::AddressPerDay);
        assert_eq!(QuotaKind::PRIORITY[2], QuotaKind::SessionPerDay);
    }

    #[test]
    fn test_windows_and_scopes() {
        assert_eq!(QuotaKind::AddressPerHour.window_ms(), 3_600_000);
        assert_eq!(QuotaKind::AddressPerDay.window_ms(), 86_400_000);
        assert_eq!(QuotaKind::SessionPerDay.window_ms(), 86_400_000);
        assert_eq!(QuotaKind::SessionPerDay.scope(), LedgerScope::Session);
        assert_eq!(QuotaKind::AddressPerDay.scope(), LedgerScope::Address);
    }

    #[test]
    fn test_usage_filters_by_window() {
        let quota = Quota::new(QuotaKind::AddressPerHour, 5);
        let timestamps = [0, 1_000, HOUR_WINDOW_MS, HOUR_WINDOW_MS + 5];

        let usage = quota.usage(&timestamps, HOUR_WINDOW_MS + 500);
        assert_eq!(usage.count, 3);
        assert_eq!(usage.oldest, Some(1_000));
    }

    #[test]
    fn test_usage_empty() {
        let quota = Quota::new(QuotaKind::SessionPerDay, 5);
        let usage = quota.usage(&[], 10);
        assert_eq!(usage, WindowUsage { count: 0, oldest: None });
    }

    #[test]
    fn test_check_under_limit() {
        let quota = Quota::new(QuotaKind::AddressPerHour, 3);
        assert_eq!(quota.check(&[0, 1], 2), None);
    }

    #[test]
    fn test_check_at_limit_reports_retry() {
        let quota = Quota::new(QuotaKind::AddressPerHour, 2);
        // Oldest event at 10_000 exits at 3_610_000; now is 10_500
        assert_eq!(quota.check(&[10_000, 10_200], 10_500), Some(3_600));
    }

    #[test]
    fn test_event_exactly_at_window_edge_is_outside() {
        let quota = Quota::new(QuotaKind::AddressPerHour, 1);
        assert!(quota.check(&[0], HOUR_WINDOW_MS - 1).is_some());
        assert_eq!(quota.check(&[0], HOUR_WINDOW_MS), None);
    }

    #[test]
    fn test_retry_after_rounds_up() {
        assert_eq!(retry_after_secs(10_001, 10_000), 1);
        assert_eq!(retry_after_secs(11_000, 10_000), 1);
        assert_eq!(retry_after_secs(11_001, 10_000), 2);
        assert_eq!(retry_after_secs(5, 10), 0);
    }

    #[test]
    fn test_reasons_are_distinct() {
        let reasons: Vec<_> = QuotaKind::PRIORITY.iter().map(|k| k.reason()).collect();
        assert_eq!(reasons[0], "Too many requests. Please try again in a bit.");
        assert_ne!(reasons[1], reasons[2]);
    }
}
