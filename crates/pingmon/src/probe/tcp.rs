use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tokio::time::timeout;

use super::{ProbeKind, ProbeOutcome, Prober};

/// TCP connect probe. An established connection is the success signal; no
/// data is exchanged and the stream is dropped immediately.
pub struct TcpProber {
    timeout_duration: Duration,
}

impl TcpProber {
    pub fn new(timeout_duration: Duration) -> Self {
        Self { timeout_duration }
    }
}

/// Targets without an explicit port get the default HTTP port.
fn with_default_port(target: &str) -> String {
    if target.contains(':') {
        target.to_string()
    } else {
        format!("{target}:80")
    }
}

#[async_trait::async_trait]
impl Prober for TcpProber {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Tcp
    }

    async fn probe(&self, target: &str) -> ProbeOutcome {
        let addr = with_default_port(target);
        let start = Instant::now();

        match timeout(self.timeout_duration, TcpStream::connect(&addr)).await {
            Ok(Ok(stream)) => {
                drop(stream);
                ProbeOutcome::success(ProbeKind::Tcp, target, start.elapsed())
            }
            Ok(Err(e)) => {
                ProbeOutcome::failure(ProbeKind::Tcp, target, format!("TCP connection failed: {e}"))
            }
            Err(_) => ProbeOutcome::failure(
                ProbeKind::Tcp,
                target,
                format!("TCP connection timed out after {:?}", self.timeout_duration),
            ),
        }
    }
}
