use std::time::Duration;

use serde::Serialize;

use crate::probe::ProbeOutcome;

/// Running statistics for one monitoring session.
///
/// Owned by a single session; every mutation corresponds to exactly one
/// completed probe outcome, so `success_count + failure_count` always equals
/// `total_probes` and the latency extrema are defined exactly when at least
/// one probe succeeded.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunningStats {
    total_probes: u64,
    success_count: u64,
    failure_count: u64,
    latency_sum: Duration,
    latency_min: Option<Duration>,
    latency_max: Option<Duration>,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one outcome into the counters.
    pub fn record(&mut self, outcome: &ProbeOutcome) {
        self.total_probes += 1;

        if outcome.success {
            self.success_count += 1;
            if let Some(latency) = outcome.latency {
                self.latency_sum += latency;
                self.latency_min = Some(self.latency_min.map_or(latency, |min| min.min(latency)));
                self.latency_max = Some(self.latency_max.map_or(latency, |max| max.max(latency)));
            }
        } else {
            self.failure_count += 1;
        }
    }

    /// Point-in-time copy for reporting; pure read.
    pub fn snapshot(&self) -> RunningStats {
        self.clone()
    }

    pub fn total_probes(&self) -> u64 {
        self.total_probes
    }

    pub fn success_count(&self) -> u64 {
        self.success_count
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count
    }

    pub fn latency_min(&self) -> Option<Duration> {
        self.latency_min
    }

    pub fn latency_max(&self) -> Option<Duration> {
        self.latency_max
    }

    /// Mean latency over successful probes. `None` until the first success,
    /// so "no data" is never reported as zero latency.
    pub fn average_latency(&self) -> Option<Duration> {
        if self.success_count == 0 {
            None
        } else {
            Some(self.latency_sum / self.success_count as u32)
        }
    }

    /// Percentage of successful probes; 0 before the first probe.
    pub fn success_rate(&self) -> f64 {
        if self.total_probes == 0 {
            0.0
        } else {
            self.success_count as f64 / self.total_probes as f64 * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeKind;

    fn up(ms: u64) -> ProbeOutcome {
        ProbeOutcome::success(ProbeKind::Tcp, "example.com:80", Duration::from_millis(ms))
    }

    fn down() -> ProbeOutcome {
        ProbeOutcome::failure(ProbeKind::Tcp, "example.com:80", "connection refused")
    }

    #[test]
    fn counters_stay_balanced_after_every_record() {
        let mut stats = RunningStats::new();
        for outcome in [up(10), down(), down(), up(20), down()] {
            stats.record(&outcome);
            assert_eq!(stats.success_count() + stats.failure_count(), stats.total_probes());
        }
        assert_eq!(stats.total_probes(), 5);
        assert_eq!(stats.success_count(), 2);
        assert_eq!(stats.failure_count(), 3);
    }

    #[test]
    fn extrema_initialize_from_first_sample() {
        let mut stats = RunningStats::new();
        assert_eq!(stats.latency_min(), None);
        assert_eq!(stats.latency_max(), None);

        stats.record(&up(30));
        assert_eq!(stats.latency_min(), Some(Duration::from_millis(30)));
        assert_eq!(stats.latency_max(), Some(Duration::from_millis(30)));

        stats.record(&up(10));
        stats.record(&up(50));
        assert_eq!(stats.latency_min(), Some(Duration::from_millis(10)));
        assert_eq!(stats.latency_max(), Some(Duration::from_millis(50)));
        assert!(stats.latency_min().unwrap() <= stats.latency_max().unwrap());
    }

    #[test]
    fn average_is_undefined_without_successes() {
        let mut stats = RunningStats::new();
        stats.record(&down());
        stats.record(&down());
        assert_eq!(stats.average_latency(), None);
        assert_eq!(stats.latency_min(), None);

        stats.record(&up(10));
        stats.record(&up(30));
        assert_eq!(stats.average_latency(), Some(Duration::from_millis(20)));
    }

    #[test]
    fn success_rate_percentage() {
        let mut stats = RunningStats::new();
        assert_eq!(stats.success_rate(), 0.0);

        for outcome in [up(5), up(5), up(5), down()] {
            stats.record(&outcome);
        }
        assert!((stats.success_rate() - 75.0).abs() < f64::EPSILON);
    }
}
