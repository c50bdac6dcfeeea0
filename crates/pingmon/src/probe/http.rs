use std::time::{Duration, Instant};

use super::{ProbeKind, ProbeOutcome, Prober};

/// HTTP(S) reachability probe.
///
/// Any HTTP status counts as reachable: an application answering at all is
/// reachability, not application correctness. Only connection-level failures
/// (refused, DNS, TLS, timeout) fail the probe.
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pingmon/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Prober for HttpProber {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Http
    }

    async fn probe(&self, target: &str) -> ProbeOutcome {
        let start = Instant::now();

        match self.client.get(target).send().await {
            Ok(response) => {
                // Latency is measured to the response status, not the body.
                let latency = start.elapsed();
                ProbeOutcome::success_with_status(
                    ProbeKind::Http,
                    target,
                    latency,
                    response.status().as_u16(),
                )
            }
            Err(e) => {
                ProbeOutcome::failure(ProbeKind::Http, target, format!("HTTP request failed: {e}"))
            }
        }
    }
}
