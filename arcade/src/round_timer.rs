use std::time::Duration;

/// A tiny helper for "time boxed" rounds (maze levels, whack-a-mole, 24-point, challenge modes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundTimer {
    elapsed: Duration,
    limit: Option<Duration>,
}

impl RoundTimer {
    pub fn new(limit: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            limit: Some(limit),
        }
    }

    /// Counts up forever; `is_up` never fires.
    pub fn stopwatch() -> Self {
        Self {
            elapsed: Duration::ZERO,
            limit: None,
        }
    }

    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn limit(&self) -> Option<Duration> {
        self.limit
    }

    pub fn remaining(&self) -> Duration {
        self.limit
            .map(|limit| limit.saturating_sub(self.elapsed))
            .unwrap_or(Duration::MAX)
    }

    /// Whole seconds left, rounded up so the display reads 1 until the very end.
    pub fn remaining_secs_ceil(&self) -> u64 {
        let rem = self.remaining();
        if rem == Duration::MAX {
            return u64::MAX;
        }
        rem.as_secs() + u64::from(rem.subsec_nanos() > 0)
    }

    pub fn is_up(&self) -> bool {
        self.limit.is_some_and(|limit| self.elapsed >= limit)
    }

    pub fn tick_if_running(&mut self, dt: Duration, running: bool) {
        if !running || self.is_up() {
            return;
        }
        self.elapsed = self.elapsed.saturating_add(dt);
        if let Some(limit) = self.limit {
            self.elapsed = self.elapsed.min(limit);
        }
    }
}

pub fn format_mm_ss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_counts_only_while_running() {
        let mut t = RoundTimer::new(Duration::from_secs(20));
        t.tick_if_running(Duration::from_secs(1), false);
        assert_eq!(t.elapsed(), Duration::ZERO);

        t.tick_if_running(Duration::from_secs(2), true);
        assert_eq!(t.elapsed(), Duration::from_secs(2));
    }

    #[test]
    fn timer_reports_up_at_or_past_limit_and_stops() {
        let mut t = RoundTimer::new(Duration::from_secs(20));
        t.tick_if_running(Duration::from_secs(25), true);
        assert!(t.is_up());
        assert_eq!(t.remaining(), Duration::ZERO);
        assert_eq!(t.elapsed(), Duration::from_secs(20));
    }

    #[test]
    fn remaining_rounds_up_partial_seconds() {
        let mut t = RoundTimer::new(Duration::from_secs(10));
        t.tick_if_running(Duration::from_millis(9_100), true);
        assert_eq!(t.remaining_secs_ceil(), 1);
    }

    #[test]
    fn stopwatch_never_expires() {
        let mut t = RoundTimer::stopwatch();
        t.tick_if_running(Duration::from_secs(100_000), true);
        assert!(!t.is_up());
        assert_eq!(format_mm_ss(Duration::from_secs(125)), "02:05");
    }
}
