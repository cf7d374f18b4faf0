use std::time::{Duration, Instant};

/// Wall-clock deadline measured from scanner launch. A total too large to
/// represent as an `Instant` never runs out.
#[derive(Debug, Clone)]
pub struct TimeBudget {
    started: Instant,
    deadline: Option<Instant>,
}

impl TimeBudget {
    pub fn new(total: Duration) -> Self {
        let started = Instant::now();
        Self {
            started,
            deadline: started.checked_add(total),
        }
    }

    pub fn remaining(&self) -> Option<Duration> {
        match self.deadline {
            Some(deadline) => deadline.checked_duration_since(Instant::now()),
            None => Some(Duration::MAX),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining().map_or(true, |rem| rem.is_zero())
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Returns the shorter of `interval` or `budget.remaining()`.
/// If no budget remains, returns None.
pub fn clamp_timeout(budget: &TimeBudget, interval: Duration) -> Option<Duration> {
    budget
        .remaining()
        .filter(|rem| !rem.is_zero())
        .map(|rem| rem.min(interval))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_uses_shorter_interval() {
        let budget = TimeBudget::new(Duration::from_secs(60));
        let wait = clamp_timeout(&budget, Duration::from_millis(50)).unwrap();
        assert_eq!(wait, Duration::from_millis(50));
        assert!(!budget.is_exhausted());
    }

    #[test]
    fn huge_budget_does_not_overflow() {
        let budget = TimeBudget::new(Duration::from_secs(u64::MAX));
        assert!(!budget.is_exhausted());
        assert_eq!(
            clamp_timeout(&budget, Duration::from_millis(50)),
            Some(Duration::from_millis(50))
        );
    }

    #[test]
    fn exhausted_budget_yields_none() {
        let budget = TimeBudget::new(Duration::ZERO);
        assert!(clamp_timeout(&budget, Duration::from_millis(50)).is_none());
        assert!(budget.is_exhausted());
    }
}
