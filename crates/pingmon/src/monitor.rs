use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::action::ActionDispatcher;
use crate::config::SessionConfig;
use crate::probe::{self, ProbeOutcome, Prober};
use crate::stats::RunningStats;
use crate::streak::{Edge, FailureStreak};

/// Per-tick report published to the reporting collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub outcome: ProbeOutcome,
    pub edge: Edge,
    pub consecutive_failures: u32,
}

/// One monitoring session: drives a single probe strategy on the configured
/// cadence until the duration elapses or the stop signal fires.
///
/// Probes run strictly sequentially; a new probe never starts while one is
/// outstanding, so the statistics and streak state see exactly one completed
/// outcome at a time.
pub struct MonitorSession {
    config: SessionConfig,
    prober: Box<dyn Prober>,
    dispatcher: ActionDispatcher,
    stats: RunningStats,
    streak: FailureStreak,
    tick_tx: Option<mpsc::Sender<TickReport>>,
}

impl MonitorSession {
    /// Validate the configuration and assemble the session. Fails fast on
    /// configuration errors; once probing has begun nothing here fails.
    pub fn new(config: SessionConfig) -> crate::Result<Self> {
        config.validate()?;
        let prober = probe::for_session(&config)?;
        let dispatcher =
            ActionDispatcher::new(config.success_action.clone(), config.failure_action.clone());
        let streak = FailureStreak::new(config.max_consecutive_failures);

        Ok(Self {
            config,
            prober,
            dispatcher,
            stats: RunningStats::new(),
            streak,
            tick_tx: None,
        })
    }

    /// Attach a channel receiving one [`TickReport`] per probe.
    pub fn with_tick_channel(mut self, tx: mpsc::Sender<TickReport>) -> Self {
        self.tick_tx = Some(tx);
        self
    }

    /// Replace the probe strategy selected from the configuration.
    pub fn with_prober(mut self, prober: Box<dyn Prober>) -> Self {
        self.prober = prober;
        self
    }

    /// Run to completion and return the final statistics.
    ///
    /// The loop suspends only while a probe is in flight (bounded by the
    /// probe's own timeout) and while sleeping between ticks. A stop signal
    /// during the sleep ends the session immediately; one during a probe
    /// lets that probe finish first.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) -> RunningStats {
        info!(
            "starting monitoring session for {} ({}) every {:?}",
            self.config.target,
            self.prober.kind(),
            self.config.interval
        );

        let deadline = self.config.max_duration.map(|d| Instant::now() + d);

        while !*stop.borrow() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                break;
            }

            let tick_start = Instant::now();
            let outcome = self.prober.probe(&self.config.target).await;
            self.observe(outcome).await;

            let delay = self.config.interval.saturating_sub(tick_start.elapsed());
            if let Some(deadline) = deadline {
                // Never start a probe that would land past the deadline.
                if Instant::now() + delay >= deadline {
                    debug!("session duration reached");
                    break;
                }
            }

            tokio::select! {
                _ = sleep(delay) => {}
                _ = stopped(&mut stop) => break,
            }
        }

        let stats = self.stats.snapshot();
        info!(
            "monitoring session for {} finished: {} probes, {:.1}% successful",
            self.config.target,
            stats.total_probes(),
            stats.success_rate()
        );
        stats
    }

    /// Fold one completed outcome into stats and streak state, fire actions,
    /// and publish the tick report.
    async fn observe(&mut self, outcome: ProbeOutcome) {
        self.stats.record(&outcome);
        let edge = self.streak.observe(&outcome);

        if outcome.success {
            self.dispatcher.fire_success();
        }

        match edge {
            Edge::EnteredFailure => {
                warn!(
                    "{} has failed {} times in a row (last error: {})",
                    self.config.target,
                    self.streak.consecutive_failures(),
                    outcome.error.as_deref().unwrap_or("unknown")
                );
                self.dispatcher.fire_failure();
            }
            Edge::ExitedFailure => {
                info!("{} recovered", self.config.target);
            }
            Edge::None => {}
        }

        if let Some(tx) = self.tick_tx.take() {
            let report = TickReport {
                outcome,
                edge,
                consecutive_failures: self.streak.consecutive_failures(),
            };
            if tx.send(report).await.is_ok() {
                self.tick_tx = Some(tx);
            } else {
                warn!("tick receiver dropped; reports disabled for the rest of the session");
            }
        }
    }
}

/// Resolves when the stop flag turns true; pends forever if the sender goes
/// away without signalling, so a dropped controller never ends the session.
async fn stopped(rx: &mut watch::Receiver<bool>) {
    while rx.changed().await.is_ok() {
        if *rx.borrow() {
            return;
        }
    }
    std::future::pending::<()>().await
}
