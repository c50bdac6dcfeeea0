use serde::Serialize;

use crate::probe::ProbeOutcome;

/// One-time transition event emitted by the failure-streak tracker, as
/// opposed to a continuously-true condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    None,
    EnteredFailure,
    ExitedFailure,
}

/// Tracks consecutive failures against the alert threshold.
///
/// Two states, nominal and failing: failing is entered when the
/// consecutive-failure count first reaches the threshold and left on the
/// next success. Each edge fires at most once per run in each direction.
/// The tracker is purely reactive; it never probes or sleeps.
#[derive(Debug)]
pub struct FailureStreak {
    threshold: u32,
    consecutive_failures: u32,
    consecutive_successes: u32,
    failing: bool,
}

impl FailureStreak {
    /// `threshold` is the number of consecutive failures that raises the
    /// alert; configuration validation guarantees it is at least 1.
    pub fn new(threshold: u32) -> Self {
        debug_assert!(threshold >= 1);
        Self { threshold, consecutive_failures: 0, consecutive_successes: 0, failing: false }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn consecutive_successes(&self) -> u32 {
        self.consecutive_successes
    }

    pub fn is_failing(&self) -> bool {
        self.failing
    }

    /// Feed one outcome through the state machine and report the edge, if
    /// any, that it crossed.
    pub fn observe(&mut self, outcome: &ProbeOutcome) -> Edge {
        if outcome.success {
            self.consecutive_failures = 0;
            self.consecutive_successes += 1;
            if self.failing {
                self.failing = false;
                return Edge::ExitedFailure;
            }
            Edge::None
        } else {
            self.consecutive_successes = 0;
            self.consecutive_failures += 1;
            if !self.failing && self.consecutive_failures >= self.threshold {
                self.failing = true;
                return Edge::EnteredFailure;
            }
            Edge::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeKind;

    fn up() -> ProbeOutcome {
        ProbeOutcome::success(ProbeKind::Tcp, "example.com:80", std::time::Duration::from_millis(5))
    }

    fn down() -> ProbeOutcome {
        ProbeOutcome::failure(ProbeKind::Tcp, "example.com:80", "connection refused")
    }

    #[test]
    fn edge_fires_once_per_failing_run() {
        let mut streak = FailureStreak::new(3);

        // F F F F S: the entry edge fires on the third failure only, the
        // exit edge on the recovery.
        assert_eq!(streak.observe(&down()), Edge::None);
        assert_eq!(streak.observe(&down()), Edge::None);
        assert_eq!(streak.observe(&down()), Edge::EnteredFailure);
        assert_eq!(streak.observe(&down()), Edge::None);
        assert_eq!(streak.observe(&up()), Edge::ExitedFailure);
        assert!(!streak.is_failing());
    }

    #[test]
    fn alternating_outcomes_never_reach_the_threshold() {
        let mut streak = FailureStreak::new(2);

        for outcome in [down(), up(), down(), up()] {
            assert_eq!(streak.observe(&outcome), Edge::None);
        }
        assert!(!streak.is_failing());
        assert_eq!(streak.consecutive_failures(), 0);
    }

    #[test]
    fn threshold_of_one_alerts_on_every_isolated_failure() {
        let mut streak = FailureStreak::new(1);

        assert_eq!(streak.observe(&down()), Edge::EnteredFailure);
        assert_eq!(streak.observe(&up()), Edge::ExitedFailure);
        assert_eq!(streak.observe(&down()), Edge::EnteredFailure);
    }

    #[test]
    fn success_resets_the_failure_count() {
        let mut streak = FailureStreak::new(3);

        streak.observe(&down());
        streak.observe(&down());
        assert_eq!(streak.consecutive_failures(), 2);

        streak.observe(&up());
        assert_eq!(streak.consecutive_failures(), 0);
        assert_eq!(streak.consecutive_successes(), 1);
    }
}
