//! Session wall-clock budget.

use std::time::{Duration, Instant};

/// Wall-clock budget for one session, checked only at attempt boundaries.
#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    started: Instant,
    limit: Duration,
}

impl WallClock {
    pub fn start(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// `Some(elapsed)` once elapsed time is strictly greater than the limit.
    pub fn exceeded(&self) -> Option<Duration> {
        let elapsed = self.elapsed();
        (elapsed > self.limit).then_some(elapsed)
    }
}
