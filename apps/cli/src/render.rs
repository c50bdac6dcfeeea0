//! Console rendering for per-tick lines, session summaries, and the
//! speed-test comparison table.

use std::time::Duration;

use chrono::Local;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use console::style;
use pingmon::speed::{SpeedTier, TierReport};
use pingmon::{Edge, RunningStats, TickReport};

fn format_ms(latency: Duration) -> String {
    format!("{:.2}ms", latency.as_secs_f64() * 1000.0)
}

fn format_opt_ms(latency: Option<Duration>) -> String {
    latency.map_or_else(|| "n/a".to_string(), format_ms)
}

pub fn session_banner(target: &str, interval: f64, timeout: f64, packet_size: Option<u32>) {
    println!("{}", style(format!("Monitoring {target}")).green().bold());
    println!("{}", style(format!("interval {interval}s, timeout {timeout}s")).cyan());
    if let Some(size) = packet_size {
        println!("{}", style(format!("packet size: {size} bytes")).cyan());
    }
    println!("{}", style("press Ctrl-C to stop").yellow());
    println!();
}

pub fn speed_banner(target: &str, tier: Option<&SpeedTier>) {
    match tier {
        Some(tier) => println!(
            "{}",
            style(format!(
                "Speed test against {target}: {} tier, {} byte payload",
                tier.label, tier.packet_size
            ))
            .green()
            .bold()
        ),
        None => println!("{}", style(format!("Full speed test suite from {target}")).green().bold()),
    }
    println!("{}", style("press Ctrl-C to stop early").yellow());
    println!();
}

pub fn tick_line(tick: &TickReport, verbose: bool) {
    let outcome = &tick.outcome;
    let stamp = outcome.timestamp.with_timezone(&Local).format("%H:%M:%S");

    if outcome.success {
        // Successful ticks only show up in verbose mode.
        if verbose {
            let latency = format_opt_ms(outcome.latency);
            println!(
                "[{stamp}] {} {} {}",
                style("✓").green(),
                outcome.target,
                style(latency).green()
            );
        }
    } else {
        let detail = outcome.error.as_deref().unwrap_or("unknown error");
        println!(
            "[{stamp}] {} {} {}",
            style("✗").red(),
            outcome.target,
            style(format!("failed: {detail}")).red()
        );
    }

    match tick.edge {
        Edge::EnteredFailure => {
            println!(
                "{}",
                style(format!(
                    "ALERT: {} has failed {} times in a row",
                    outcome.target, tick.consecutive_failures
                ))
                .red()
                .bold()
            );
            if let Some(detail) = outcome.error.as_deref() {
                println!("{}", style(format!("last error: {detail}")).red());
            }
        }
        Edge::ExitedFailure => {
            println!("{}", style(format!("{} recovered", outcome.target)).green().bold());
        }
        Edge::None => {}
    }
}

pub fn tick_json(tick: &TickReport) {
    match serde_json::to_string(tick) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!("failed to serialize tick report: {e}"),
    }
}

pub fn summary(target: &str, stats: &RunningStats) {
    println!();
    println!("{}", style("--- monitoring summary ---").cyan().bold());
    println!("target: {target}");
    println!("probes: {}", stats.total_probes());

    let rate = stats.success_rate();
    let rate_line = format!("successful: {} ({rate:.1}%)", stats.success_count());
    let styled_rate = if rate > 80.0 {
        style(rate_line).green()
    } else if rate > 50.0 {
        style(rate_line).yellow()
    } else {
        style(rate_line).red()
    };
    println!("{styled_rate}");

    let failed_line = format!("failed: {}", stats.failure_count());
    if stats.failure_count() > 0 {
        println!("{}", style(failed_line).red());
    } else {
        println!("{}", style(failed_line).green());
    }

    match stats.average_latency() {
        Some(avg) => {
            let max = stats.latency_max().unwrap_or(avg);
            let max_text = if max > Duration::from_millis(500) {
                style(format_ms(max)).yellow().to_string()
            } else {
                format_ms(max)
            };
            println!(
                "latency min/avg/max: {}/{}/{}",
                format_opt_ms(stats.latency_min()),
                format_ms(avg),
                max_text
            );
        }
        None => println!("latency: n/a"),
    }
}

pub fn tier_comparison(reports: &[TierReport]) {
    if reports.is_empty() {
        return;
    }

    for report in reports {
        summary(&format!("{} ({})", report.target, report.label), &report.stats);
    }

    println!();
    println!("{}", style("--- tier comparison ---").cyan().bold());
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["tier", "target", "payload", "probes", "success %", "min", "avg", "max"]);
    for report in reports {
        table.add_row(vec![
            report.label.clone(),
            report.target.clone(),
            format!("{} B", report.packet_size),
            report.stats.total_probes().to_string(),
            format!("{:.1}", report.success_rate_percent()),
            format_opt_ms(report.stats.latency_min()),
            format_opt_ms(report.stats.average_latency()),
            format_opt_ms(report.stats.latency_max()),
        ]);
    }
    println!("{table}");
}
