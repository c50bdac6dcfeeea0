mod render;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail, ensure};
use clap::{Args, Parser, Subcommand};
use pingmon::speed::{SpeedTestDriver, SpeedTier, targets};
use pingmon::{ActionSpec, MonitorSession, SessionConfig, TickReport};
use tokio::sync::{mpsc, watch};

/// Monitor a connection: probe a target on an interval, alert on failure
/// streaks, and run shell commands on transitions.
#[derive(Debug, Parser)]
#[command(name = "pingmon", version, about)]
struct Cli {
    /// Host, host:port, or http(s):// URL to probe
    target: Option<String>,

    /// Seconds between probes
    #[arg(short, long, default_value_t = 5.0)]
    interval: f64,

    /// Seconds before a probe is recorded as failed
    #[arg(short, long, default_value_t = 2.0)]
    timeout: f64,

    /// Stop after this many seconds (default: run until interrupted)
    #[arg(short, long)]
    duration: Option<f64>,

    /// Consecutive failures before the alert fires
    #[arg(short = 'f', long, default_value_t = 3)]
    max_failures: u32,

    /// Print successful probes too, not only failures
    #[arg(short, long)]
    verbose: bool,

    /// Payload size in bytes; selects the system echo probe
    #[arg(short, long)]
    packet_size: Option<u32>,

    /// Shell command to run on every successful probe
    #[arg(short = 's', long)]
    success_cmd: Option<String>,

    /// Shell command to run when the failure threshold is crossed
    #[arg(short = 'F', long)]
    failure_cmd: Option<String>,

    /// Script to run on every successful probe
    #[arg(short = 'S', long)]
    success_script: Option<PathBuf>,

    /// Script to run when the failure threshold is crossed
    #[arg(short = 'X', long)]
    failure_script: Option<PathBuf>,

    /// Emit one JSON object per probe instead of styled lines
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Latency speed test with escalating payload sizes
    Speed(SpeedArgs),
}

#[derive(Debug, Args)]
struct SpeedArgs {
    /// Target host
    #[arg(long, default_value = targets::GOOGLE_DNS)]
    target: String,

    /// Payload size in bytes for a single-tier run (1000, 3000, or 9000
    /// select the standard tiers)
    #[arg(long)]
    size: Option<u32>,

    /// Seconds for the single-tier run
    #[arg(long, default_value_t = 30)]
    duration: u64,

    /// Run the whole suite: every standard tier plus the specialized
    /// endpoints, 10 seconds each
    #[arg(long)]
    full: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    logger::init();
    let mut cli = Cli::parse();

    // Ctrl-C flips the stop flag; the session finishes its tick and
    // renders the summary.
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = stop_tx.send(true);
        }
    });

    match cli.command.take() {
        Some(Command::Speed(args)) => run_speed(args, cli.json, stop_rx).await,
        None => run_monitor(cli, stop_rx).await,
    }
}

async fn run_monitor(cli: Cli, stop: watch::Receiver<bool>) -> Result<()> {
    let Some(target) = cli.target.clone() else {
        bail!("a target is required (see --help)");
    };
    ensure!(cli.interval > 0.0, "interval must be positive");
    ensure!(cli.timeout > 0.0, "timeout must be positive");
    if let Some(duration) = cli.duration {
        ensure!(duration > 0.0, "duration must be positive");
    }

    let mut config = SessionConfig::new(&target);
    config.interval = Duration::from_secs_f64(cli.interval);
    config.timeout = Duration::from_secs_f64(cli.timeout);
    config.max_duration = cli.duration.map(Duration::from_secs_f64);
    config.max_consecutive_failures = cli.max_failures;
    config.packet_size = cli.packet_size;
    config.verbose = cli.verbose;
    config.success_action = cli
        .success_cmd
        .map(ActionSpec::Command)
        .or(cli.success_script.map(ActionSpec::Script));
    config.failure_action = cli
        .failure_cmd
        .map(ActionSpec::Command)
        .or(cli.failure_script.map(ActionSpec::Script));

    let (tick_tx, tick_rx) = mpsc::channel(64);
    let session = MonitorSession::new(config)?.with_tick_channel(tick_tx);

    if !cli.json {
        render::session_banner(&target, cli.interval, cli.timeout, cli.packet_size);
    }
    let renderer = tokio::spawn(render_ticks(tick_rx, cli.verbose, cli.json));

    let stats = session.run(stop).await;

    // The session dropped its sender, so the renderer drains and exits.
    let _ = renderer.await;
    render::summary(&target, &stats);
    Ok(())
}

async fn run_speed(args: SpeedArgs, json: bool, stop: watch::Receiver<bool>) -> Result<()> {
    ensure!(args.duration > 0, "duration must be positive");

    let (tick_tx, tick_rx) = mpsc::channel(64);
    let renderer = tokio::spawn(render_ticks(tick_rx, true, json));

    let driver = SpeedTestDriver::new(&args.target).with_tick_channel(tick_tx);
    let reports = if args.full {
        if !json {
            render::speed_banner(&args.target, None);
        }
        driver.run_full_suite(stop).await?
    } else {
        let tier =
            SpeedTier::for_size(args.size.unwrap_or(3000), Duration::from_secs(args.duration));
        if !json {
            render::speed_banner(&args.target, Some(&tier));
        }
        driver.run_tiers(std::slice::from_ref(&tier), stop).await?
    };

    drop(driver);
    let _ = renderer.await;
    render::tier_comparison(&reports);
    Ok(())
}

async fn render_ticks(mut rx: mpsc::Receiver<TickReport>, verbose: bool, json: bool) {
    while let Some(tick) = rx.recv().await {
        if json {
            render::tick_json(&tick);
        } else {
            render::tick_line(&tick, verbose);
        }
    }
}
