use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tokio::time::timeout;

use super::{ProbeKind, ProbeOutcome, Prober};

/// System-echo probe.
///
/// Delegates to the platform `ping` binary so payload size and the raw-socket
/// mechanics stay with the OS, then parses the textual report for the
/// round-trip time. A payload size the OS rejects surfaces as a failed
/// outcome with the tool's complaint as detail.
pub struct EchoProber {
    timeout_duration: Duration,
    payload_size: Option<u32>,
}

impl EchoProber {
    pub fn new(timeout_duration: Duration, payload_size: Option<u32>) -> Self {
        Self { timeout_duration, payload_size }
    }

    fn command(&self, target: &str) -> Command {
        let mut cmd = Command::new("ping");

        if cfg!(target_os = "windows") {
            cmd.args(["-n", "1"]);
            if let Some(size) = self.payload_size {
                cmd.args(["-l", &size.to_string()]);
            }
            cmd.args(["-w", &self.timeout_duration.as_millis().to_string()]);
        } else {
            cmd.args(["-c", "1"]);
            if let Some(size) = self.payload_size {
                cmd.args(["-s", &size.to_string()]);
            }
            // -W only takes whole seconds; the tokio timeout below stays
            // authoritative for sub-second configurations.
            cmd.args(["-W", &self.timeout_duration.as_secs().max(1).to_string()]);
        }

        cmd.arg(target);
        cmd.stdin(Stdio::null());
        cmd.kill_on_drop(true);
        cmd
    }
}

#[async_trait::async_trait]
impl Prober for EchoProber {
    fn kind(&self) -> ProbeKind {
        ProbeKind::SystemEcho
    }

    async fn probe(&self, target: &str) -> ProbeOutcome {
        let start = Instant::now();

        match timeout(self.timeout_duration, self.command(target).output()).await {
            Ok(Ok(out)) if out.status.success() => {
                let stdout = String::from_utf8_lossy(&out.stdout);
                // Fall back to our own wall clock when the report carries no
                // parsable time.
                let latency = parse_echo_rtt(&stdout).unwrap_or_else(|| start.elapsed());
                ProbeOutcome::success(ProbeKind::SystemEcho, target, latency)
            }
            Ok(Ok(out)) => {
                let stderr = String::from_utf8_lossy(&out.stderr);
                let stdout = String::from_utf8_lossy(&out.stdout);
                let detail = stderr
                    .lines()
                    .find(|line| !line.trim().is_empty())
                    .or_else(|| stdout.lines().find(|line| !line.trim().is_empty()))
                    .unwrap_or("echo reported failure");
                ProbeOutcome::failure(ProbeKind::SystemEcho, target, format!("echo failed: {detail}"))
            }
            Ok(Err(e)) => ProbeOutcome::failure(
                ProbeKind::SystemEcho,
                target,
                format!("failed to invoke system echo: {e}"),
            ),
            Err(_) => ProbeOutcome::failure(
                ProbeKind::SystemEcho,
                target,
                format!("echo timed out after {:?}", self.timeout_duration),
            ),
        }
    }
}

/// Parse the round-trip time from a `ping` report line ("time=12.3 ms" on
/// Linux/macOS, "time<1ms" on Windows).
fn parse_echo_rtt(output: &str) -> Option<Duration> {
    for marker in ["time=", "time<"] {
        if let Some(pos) = output.find(marker) {
            let rest = &output[pos + marker.len()..];
            let value: String =
                rest.chars().take_while(|c| c.is_ascii_digit() || *c == '.').collect();
            if let Ok(ms) = value.parse::<f64>() {
                return Some(Duration::from_secs_f64(ms / 1000.0));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unix_report() {
        let line = "64 bytes from 8.8.8.8: icmp_seq=1 ttl=56 time=12.3 ms";
        let rtt = parse_echo_rtt(line).unwrap();
        assert!((rtt.as_secs_f64() - 0.0123).abs() < 1e-9);
    }

    #[test]
    fn parses_windows_sub_millisecond_report() {
        let line = "Reply from 8.8.8.8: bytes=32 time<1ms TTL=56";
        assert_eq!(parse_echo_rtt(line).unwrap().as_millis(), 1);
    }

    #[test]
    fn report_without_time_yields_none() {
        assert_eq!(parse_echo_rtt("1 packets transmitted, 0 received"), None);
    }
}
