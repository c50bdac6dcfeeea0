//! Monitoring loop tests
//!
//! These drive the loop with scripted probe strategies so the timing and
//! edge behavior can be checked without touching the network.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use pingmon::probe::TcpProber;
use pingmon::{ActionSpec, Edge, MonitorSession, ProbeKind, ProbeOutcome, Prober, SessionConfig};
use tokio::sync::{mpsc, watch};

/// Probe strategy that replays a scripted success/failure sequence and
/// falls back to a fixed outcome once the script is exhausted.
struct ScriptedProber {
    script: Vec<bool>,
    fallback: bool,
    cursor: AtomicUsize,
}

impl ScriptedProber {
    fn new(script: Vec<bool>) -> Self {
        Self { script, fallback: true, cursor: AtomicUsize::new(0) }
    }

    fn always_up() -> Self {
        Self::new(Vec::new())
    }

    fn always_down() -> Self {
        Self { script: Vec::new(), fallback: false, cursor: AtomicUsize::new(0) }
    }
}

#[async_trait::async_trait]
impl Prober for ScriptedProber {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Tcp
    }

    async fn probe(&self, target: &str) -> ProbeOutcome {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        let success = self.script.get(index).copied().unwrap_or(self.fallback);
        if success {
            ProbeOutcome::success(ProbeKind::Tcp, target, Duration::from_millis(10))
        } else {
            ProbeOutcome::failure(ProbeKind::Tcp, target, "connection refused")
        }
    }
}

fn base_config() -> SessionConfig {
    let mut config = SessionConfig::new("192.0.2.1:80");
    config.interval = Duration::from_secs(5);
    config.timeout = Duration::from_secs(2);
    config
}

#[tokio::test(start_paused = true)]
async fn duration_bounds_the_probe_count() {
    // interval 5s, duration 12s: ticks at t=0, 5, 10 and no fourth probe.
    let mut config = base_config();
    config.max_duration = Some(Duration::from_secs(12));

    let session = MonitorSession::new(config)
        .unwrap()
        .with_prober(Box::new(ScriptedProber::always_up()));
    let (_stop_tx, stop_rx) = watch::channel(false);

    let stats = session.run(stop_rx).await;
    assert_eq!(stats.total_probes(), 3);
    assert_eq!(stats.success_count(), 3);
}

#[tokio::test]
async fn stop_signal_ends_the_session_promptly() {
    let mut config = base_config();
    config.interval = Duration::from_millis(50);

    let session = MonitorSession::new(config)
        .unwrap()
        .with_prober(Box::new(ScriptedProber::always_up()));
    let (stop_tx, stop_rx) = watch::channel(false);

    let handle = tokio::spawn(session.run(stop_rx));
    tokio::time::sleep(Duration::from_millis(120)).await;
    stop_tx.send(true).unwrap();

    let stats = tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("session did not stop after the signal")
        .unwrap();
    assert!(stats.total_probes() >= 1);
}

#[tokio::test(start_paused = true)]
async fn tick_reports_carry_streak_edges() {
    // F F F F S with threshold 3: the entry edge after the third failure,
    // the exit edge on the recovery, nothing else.
    let mut config = base_config();
    config.interval = Duration::from_secs(1);
    config.max_duration = Some(Duration::from_millis(4500));
    config.max_consecutive_failures = 3;

    let (tick_tx, mut tick_rx) = mpsc::channel(16);
    let session = MonitorSession::new(config)
        .unwrap()
        .with_prober(Box::new(ScriptedProber::new(vec![false, false, false, false, true])))
        .with_tick_channel(tick_tx);
    let (_stop_tx, stop_rx) = watch::channel(false);

    let stats = session.run(stop_rx).await;
    assert_eq!(stats.total_probes(), 5);

    let mut edges = Vec::new();
    let mut failure_counts = Vec::new();
    while let Some(tick) = tick_rx.recv().await {
        edges.push(tick.edge);
        failure_counts.push(tick.consecutive_failures);
    }
    assert_eq!(
        edges,
        [Edge::None, Edge::None, Edge::EnteredFailure, Edge::None, Edge::ExitedFailure]
    );
    assert_eq!(failure_counts, [1, 2, 3, 4, 0]);
}

#[tokio::test(start_paused = true)]
async fn failing_actions_leave_the_loop_and_stats_untouched() {
    let mut config = base_config();
    config.max_duration = Some(Duration::from_secs(12));
    config.max_consecutive_failures = 2;
    config.success_action = Some(ActionSpec::Command("false".to_string()));
    config.failure_action = Some(ActionSpec::Script(PathBuf::from("/definitely/not/a/script.sh")));

    let session = MonitorSession::new(config)
        .unwrap()
        .with_prober(Box::new(ScriptedProber::always_down()));
    let (_stop_tx, stop_rx) = watch::channel(false);

    let stats = session.run(stop_rx).await;
    assert_eq!(stats.total_probes(), 3);
    assert_eq!(stats.failure_count(), 3);
    assert_eq!(stats.success_count(), 0);
    assert_eq!(stats.average_latency(), None);
}

#[tokio::test]
async fn tcp_probe_against_closed_port_fails_within_timeout() {
    // Bind to grab a local port nothing listens on afterward.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let prober = TcpProber::new(Duration::from_secs(2));
    let start = std::time::Instant::now();
    let outcome = prober.probe(&addr.to_string()).await;

    assert!(!outcome.success);
    assert!(outcome.latency.is_none());
    assert!(outcome.error.is_some());
    assert!(start.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn rejected_configuration_never_probes() {
    let mut config = SessionConfig::new("");
    config.interval = Duration::from_secs(1);
    assert!(MonitorSession::new(config).is_err());
}
