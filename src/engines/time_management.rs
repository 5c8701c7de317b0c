//! Wall-clock budgeting for a single search call.
//!
//! The soft budget stops new depth iterations and new root actions; the hard
//! budget aborts recursion outright. Clocks are sampled, never interrupted.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBudget {
    pub soft_ms: u64,
    pub hard_ms: u64,
}

impl Default for TimeBudget {
    fn default() -> Self {
        Self {
            soft_ms: 300,
            hard_ms: 350,
        }
    }
}

impl TimeBudget {
    pub const fn new(soft_ms: u64, hard_ms: u64) -> Self {
        Self { soft_ms, hard_ms }
    }

    /// Budget that never expires in practice, for tests and offline analysis.
    pub const fn unlimited() -> Self {
        Self {
            soft_ms: u64::MAX,
            hard_ms: u64::MAX,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TimeManager {
    started_at: Instant,
    budget: TimeBudget,
}

impl TimeManager {
    pub fn start(budget: TimeBudget) -> Self {
        Self {
            started_at: Instant::now(),
            budget,
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }

    #[inline]
    pub fn soft_expired(&self) -> bool {
        self.elapsed() >= Duration::from_millis(self.budget.soft_ms)
    }

    #[inline]
    pub fn hard_expired(&self) -> bool {
        self.elapsed() >= Duration::from_millis(self.budget.hard_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::{TimeBudget, TimeManager};

    #[test]
    fn zero_budget_expires_immediately() {
        let clock = TimeManager::start(TimeBudget::new(0, 0));
        assert!(clock.soft_expired());
        assert!(clock.hard_expired());
    }

    #[test]
    fn unlimited_budget_does_not_expire() {
        let clock = TimeManager::start(TimeBudget::unlimited());
        assert!(!clock.soft_expired());
        assert!(!clock.hard_expired());
        assert!(clock.elapsed_ms() >= 0.0);
    }
}
