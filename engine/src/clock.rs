use std::cell::Cell;
use std::time::{Duration, Instant};

/// Monotonic time source. The frame loop measures `dt` through it so tests can step time.
pub trait Clock {
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, dt: Duration) {
        self.now.set(self.now.get().saturating_add(dt));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Turns clock readings into per-frame deltas, clamping huge gaps (debugger pauses, window
/// drags) so one frame never advances gameplay by more than `max_dt`.
#[derive(Debug, Clone, Copy)]
pub struct FrameTimer {
    last: Option<Duration>,
    max_dt: Duration,
}

impl FrameTimer {
    pub fn new(max_dt: Duration) -> Self {
        Self { last: None, max_dt }
    }

    pub fn tick(&mut self, clock: &dyn Clock) -> Duration {
        let now = clock.now();
        let dt = match self.last {
            Some(last) => now.saturating_sub(last),
            None => Duration::ZERO,
        };
        self.last = Some(now);
        dt.min(self.max_dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_timer_reports_deltas_and_clamps() {
        let clock = ManualClock::new();
        let mut timer = FrameTimer::new(Duration::from_millis(100));
        assert_eq!(timer.tick(&clock), Duration::ZERO);
        clock.advance(Duration::from_millis(16));
        assert_eq!(timer.tick(&clock), Duration::from_millis(16));
        clock.advance(Duration::from_secs(5));
        assert_eq!(timer.tick(&clock), Duration::from_millis(100));
    }
}
