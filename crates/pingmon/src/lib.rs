//! pingmon - reachability and latency monitoring engine
//!
//! This library drives periodic probes against a target (TCP connect,
//! HTTP(S), or the system echo primitive), tracks consecutive-failure
//! streaks against an alert threshold, and fires external shell actions
//! on success/failure transitions. A speed-test driver reuses the same
//! monitoring loop with escalating payload sizes.

pub mod action;
pub mod config;
pub mod monitor;
pub mod probe;
pub mod speed;
pub mod stats;
pub mod streak;

// Re-export main types
pub use action::{ActionDispatcher, ActionSpec};
pub use config::{ConfigError, SessionConfig};
pub use monitor::{MonitorSession, TickReport};
pub use probe::{ProbeKind, ProbeOutcome, Prober};
pub use speed::{SpeedTestDriver, SpeedTier, TierReport};
pub use stats::RunningStats;
pub use streak::{Edge, FailureStreak};

/// Re-export common error types
pub use anyhow;

/// pingmon result type using anyhow for error handling
pub type Result<T> = anyhow::Result<T>;
