//! Speed-test mode: the monitoring loop run once per payload tier.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::info;

use crate::config::SessionConfig;
use crate::monitor::{MonitorSession, TickReport};
use crate::stats::RunningStats;

/// Well-known speed-test endpoints.
pub mod targets {
    pub const GOOGLE_DNS: &str = "8.8.8.8";
    pub const CLOUDFLARE_DNS: &str = "1.1.1.1";
    pub const GOOGLE_BROWSER: &str = "216.239.38.120";
    pub const YOUTUBE_MEDIA_1: &str = "74.125.24.91";
    pub const YOUTUBE_MEDIA_2: &str = "172.217.194.113";
}

const TIER_DURATION: Duration = Duration::from_secs(10);
const TIER_INTERVAL: Duration = Duration::from_secs(1);

/// One packet-size tier of the speed test.
#[derive(Debug, Clone)]
pub struct SpeedTier {
    pub label: &'static str,
    pub packet_size: u32,
    pub duration: Duration,
}

impl SpeedTier {
    /// Tier for an explicit payload size, labelled after the standard tier
    /// when the size matches one.
    pub fn for_size(packet_size: u32, duration: Duration) -> Self {
        let label = match packet_size {
            1000 => "low",
            3000 => "medium",
            9000 => "high",
            _ => "custom",
        };
        Self { label, packet_size, duration }
    }
}

/// The standard low/medium/high payload escalation.
pub fn standard_tiers() -> Vec<SpeedTier> {
    vec![
        SpeedTier { label: "low", packet_size: 1000, duration: TIER_DURATION },
        SpeedTier { label: "medium", packet_size: 3000, duration: TIER_DURATION },
        SpeedTier { label: "high", packet_size: 9000, duration: TIER_DURATION },
    ]
}

/// Completed statistics for one tier, collected in configuration order.
#[derive(Debug, Clone, Serialize)]
pub struct TierReport {
    pub label: String,
    pub target: String,
    pub packet_size: u32,
    pub stats: RunningStats,
}

impl TierReport {
    pub fn success_rate_percent(&self) -> f64 {
        self.stats.success_rate()
    }
}

/// Runs the monitoring loop once per tier, strictly sequentially, with fresh
/// statistics and streak state per tier so one tier's traffic cannot skew
/// another's measurement.
pub struct SpeedTestDriver {
    target: String,
    timeout: Duration,
    tick_tx: Option<mpsc::Sender<TickReport>>,
}

impl SpeedTestDriver {
    pub fn new(target: impl Into<String>) -> Self {
        Self { target: target.into(), timeout: Duration::from_secs(2), tick_tx: None }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Attach a channel receiving every tier's per-tick reports.
    pub fn with_tick_channel(mut self, tx: mpsc::Sender<TickReport>) -> Self {
        self.tick_tx = Some(tx);
        self
    }

    /// Run the given tiers against the driver's target.
    pub async fn run_tiers(
        &self,
        tiers: &[SpeedTier],
        stop: watch::Receiver<bool>,
    ) -> crate::Result<Vec<TierReport>> {
        let mut reports = Vec::with_capacity(tiers.len());
        for tier in tiers {
            if *stop.borrow() {
                break;
            }
            reports.push(self.run_tier(&self.target, tier, stop.clone()).await?);
        }
        Ok(reports)
    }

    /// The full suite: the standard escalation against the primary target,
    /// then the specialized single-target runs. Pure configuration
    /// composition over the same monitoring loop.
    pub async fn run_full_suite(
        &self,
        stop: watch::Receiver<bool>,
    ) -> crate::Result<Vec<TierReport>> {
        let mut reports = self.run_tiers(&standard_tiers(), stop.clone()).await?;

        let specialized = [
            (
                targets::CLOUDFLARE_DNS,
                SpeedTier { label: "cloudflare-medium", packet_size: 3000, duration: TIER_DURATION },
            ),
            (
                targets::YOUTUBE_MEDIA_1,
                SpeedTier { label: "youtube-high", packet_size: 9000, duration: TIER_DURATION },
            ),
        ];
        for (target, tier) in specialized {
            if *stop.borrow() {
                break;
            }
            reports.push(self.run_tier(target, &tier, stop.clone()).await?);
        }

        Ok(reports)
    }

    async fn run_tier(
        &self,
        target: &str,
        tier: &SpeedTier,
        stop: watch::Receiver<bool>,
    ) -> crate::Result<TierReport> {
        info!(
            "starting {} speed tier against {} ({} byte payload)",
            tier.label, target, tier.packet_size
        );

        let mut config = SessionConfig::new(target);
        config.interval = TIER_INTERVAL;
        config.timeout = self.timeout;
        config.max_duration = Some(tier.duration);
        config.packet_size = Some(tier.packet_size);
        config.verbose = true;

        let mut session = MonitorSession::new(config)?;
        if let Some(tx) = &self.tick_tx {
            session = session.with_tick_channel(tx.clone());
        }

        let stats = session.run(stop).await;
        Ok(TierReport {
            label: tier.label.to_string(),
            target: target.to_string(),
            packet_size: tier.packet_size,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_tiers_escalate_in_order() {
        let tiers = standard_tiers();
        let sizes: Vec<u32> = tiers.iter().map(|t| t.packet_size).collect();
        assert_eq!(sizes, [1000, 3000, 9000]);
        let labels: Vec<&str> = tiers.iter().map(|t| t.label).collect();
        assert_eq!(labels, ["low", "medium", "high"]);
    }

    #[test]
    fn explicit_sizes_reuse_standard_labels() {
        assert_eq!(SpeedTier::for_size(3000, TIER_DURATION).label, "medium");
        assert_eq!(SpeedTier::for_size(1234, TIER_DURATION).label, "custom");
    }
}
