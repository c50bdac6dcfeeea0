//! Probe strategies.
//!
//! Each strategy measures reachability of a target its own way but produces
//! the same [`ProbeOutcome`] record, so the monitoring loop stays ignorant of
//! probe mechanics. Failure is data here: a probe never returns an error,
//! whatever goes wrong ends up in the outcome.

mod echo;
mod http;
mod tcp;

pub use echo::EchoProber;
pub use http::HttpProber;
pub use tcp::TcpProber;

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;

/// Kind of probe performed against a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    Tcp,
    Http,
    SystemEcho,
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeKind::Tcp => write!(f, "tcp"),
            ProbeKind::Http => write!(f, "http"),
            ProbeKind::SystemEcho => write!(f, "echo"),
        }
    }
}

/// Result of a single probe attempt. Created exactly once per tick by the
/// selected strategy and never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// Strategy that produced this outcome
    pub kind: ProbeKind,

    /// Target that was probed
    pub target: String,

    /// When the probe completed
    pub timestamp: DateTime<Utc>,

    /// Whether the target was reachable
    pub success: bool,

    /// Round-trip latency; absent when the probe failed
    pub latency: Option<Duration>,

    /// HTTP status code, when the HTTP strategy observed one
    pub status: Option<u16>,

    /// Error detail (if the probe failed)
    pub error: Option<String>,
}

impl ProbeOutcome {
    /// Successful probe with measured latency
    pub fn success(kind: ProbeKind, target: &str, latency: Duration) -> Self {
        Self {
            kind,
            target: target.to_string(),
            timestamp: Utc::now(),
            success: true,
            latency: Some(latency),
            status: None,
            error: None,
        }
    }

    /// Successful HTTP probe carrying the observed status code
    pub fn success_with_status(kind: ProbeKind, target: &str, latency: Duration, status: u16) -> Self {
        Self { status: Some(status), ..Self::success(kind, target, latency) }
    }

    /// Failed probe with error detail
    pub fn failure(kind: ProbeKind, target: &str, error: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.to_string(),
            timestamp: Utc::now(),
            success: false,
            latency: None,
            status: None,
            error: Some(error.into()),
        }
    }
}

/// A probe strategy.
///
/// Implementations capture every failure mode (refused connection, DNS or
/// TLS failure, timeout, unreachable host) into the returned outcome.
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    fn kind(&self) -> ProbeKind;

    /// Perform one probe against the target
    async fn probe(&self, target: &str) -> ProbeOutcome;
}

/// Build the probe strategy selected by the session configuration.
///
/// Selection happens once per session, not per tick.
pub fn for_session(config: &SessionConfig) -> crate::Result<Box<dyn Prober>> {
    let prober: Box<dyn Prober> = match config.probe_kind() {
        ProbeKind::SystemEcho => Box::new(EchoProber::new(config.timeout, config.packet_size)),
        ProbeKind::Http => Box::new(HttpProber::new(config.timeout)?),
        ProbeKind::Tcp => Box::new(TcpProber::new(config.timeout)),
    };
    Ok(prober)
}
