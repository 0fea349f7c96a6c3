use std::thread;
use std::time::{Duration, Instant};

/// Enforces a minimum interval between loop iterations.
pub struct TickScheduler {
    min_interval: Duration,
    last: Option<Instant>,
}

impl TickScheduler {
    pub fn new(min_interval: Duration) -> Self {
        Self { min_interval, last: None }
    }

    pub fn from_secs_f64(secs: f64) -> Self {
        Self::new(Duration::from_secs_f64(secs.max(0.0)))
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Block until `min_interval` has passed since the previous return.
    /// Never blocks on the first call after construction or `reset()`.
    pub fn wait_for_next_tick(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                thread::sleep(self.min_interval - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paces_successive_ticks() {
        let mut sched = TickScheduler::from_secs_f64(0.4);
        sched.wait_for_next_tick();
        let mid = Instant::now();
        sched.wait_for_next_tick();
        assert!(mid.elapsed() >= Duration::from_millis(390));
    }

    #[test]
    fn first_tick_does_not_block() {
        let mut sched = TickScheduler::from_secs_f64(5.0);
        let start = Instant::now();
        sched.wait_for_next_tick();
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn reset_lets_next_tick_through() {
        let mut sched = TickScheduler::from_secs_f64(5.0);
        sched.wait_for_next_tick();
        sched.reset();
        let start = Instant::now();
        sched.wait_for_next_tick();
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn slow_caller_is_not_delayed_further() {
        let mut sched = TickScheduler::from_secs_f64(0.05);
        sched.wait_for_next_tick();
        thread::sleep(Duration::from_millis(120));
        let start = Instant::now();
        sched.wait_for_next_tick();
        assert!(start.elapsed() < Duration::from_millis(40));
    }
}
