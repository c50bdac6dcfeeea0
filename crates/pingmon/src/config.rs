use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::action::ActionSpec;
use crate::probe::ProbeKind;

/// Configuration problems rejected before any probing begins. Nothing is
/// silently defaulted.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("target must not be empty")]
    EmptyTarget,
    #[error("interval must be positive")]
    NonPositiveInterval,
    #[error("timeout must be positive")]
    NonPositiveTimeout,
    #[error("max consecutive failures must be at least 1")]
    ZeroFailureThreshold,
    #[error("invalid HTTP target: {0}")]
    InvalidUrl(String),
}

/// Immutable configuration for one monitoring session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Host, host:port, or http(s):// URL to probe
    pub target: String,

    /// Time between probes
    pub interval: Duration,

    /// Per-probe timeout. Keeping it below the interval is recommended but
    /// not enforced; an over-long probe just eats into the following sleep.
    pub timeout: Duration,

    /// Overall session duration; `None` runs until interrupted
    pub max_duration: Option<Duration>,

    /// Consecutive failures before the alert fires
    pub max_consecutive_failures: u32,

    /// Payload size in bytes; selects the system-echo strategy
    pub packet_size: Option<u32>,

    /// Action fired on every successful probe
    pub success_action: Option<ActionSpec>,

    /// Action fired when the failure threshold is crossed
    pub failure_action: Option<ActionSpec>,

    /// Report successful probes too, not only failures
    pub verbose: bool,
}

impl SessionConfig {
    /// Configuration with the default cadence: probe every 5 seconds, give
    /// up after 2, alert after 3 consecutive failures.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(2),
            max_duration: None,
            max_consecutive_failures: 3,
            packet_size: None,
            success_action: None,
            failure_action: None,
            verbose: false,
        }
    }

    /// Probe strategy selected by this configuration. A payload size forces
    /// the system echo; URL-shaped targets use HTTP(S); anything else is a
    /// plain TCP connect. The choice is made once per session.
    pub fn probe_kind(&self) -> ProbeKind {
        if self.packet_size.is_some() {
            ProbeKind::SystemEcho
        } else if self.target.contains("://") {
            ProbeKind::Http
        } else {
            ProbeKind::Tcp
        }
    }

    /// Fail-fast validation, run before the first probe.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target.trim().is_empty() {
            return Err(ConfigError::EmptyTarget);
        }
        if self.interval.is_zero() {
            return Err(ConfigError::NonPositiveInterval);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::NonPositiveTimeout);
        }
        if self.max_consecutive_failures == 0 {
            return Err(ConfigError::ZeroFailureThreshold);
        }

        if self.probe_kind() == ProbeKind::Http {
            let url = Url::parse(&self.target)
                .map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
            match url.scheme() {
                "http" | "https" => {}
                other => {
                    return Err(ConfigError::InvalidUrl(format!("unsupported scheme: {other}")));
                }
            }
        }

        Ok(())
    }
}
