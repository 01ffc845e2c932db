//! Rate Limiting and Admission Control Module
//!
//! This module guards the image generation endpoint with per-address and
//! per-session quotas over trailing windows.
//!
//! # Features
//!
//! - Trailing-window event ledgers keyed by address and by session
//! - Hourly and daily address quotas, daily session quota
//! - Lazy eviction of stale entries, at most once per cleanup interval
//! - Injectable clock for deterministic tests
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Admission Gate                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐         │
//! │  │ Address /   │  │ Address /   │  │ Session /   │         │
//! │  │ hour        │  │ day         │  │ day         │         │
//! │  └─────────────┘  └─────────────┘  └─────────────┘         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────┐   │
//! │  │      Ledger Store (address ledger, session ledger)   │   │
//! │  └─────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! State is process-local. Running several instances multiplies the
//! effective limits by the instance count.

pub mod clock;
pub mod config;
pub mod gate;
pub mod quota;
pub mod snapshot;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{RateLimitConfig, RateLimitConfigError};
pub use gate::{AdmissionControl, AdmissionGate, Decision};
pub use quota::{LedgerScope, Quota, QuotaKind};
pub use snapshot::GateSnapshot;
pub use store::{Ledger, LedgerStore};
