use std::thread;
use std::time::Duration;

/// Fixed-delay limiter applied after every completed download.
///
/// All downloads go through one cache, so one pacer serializes them onto a
/// single rate-limited stream. A zero delay disables pacing.
#[derive(Debug, Clone)]
pub struct Pacer {
    delay: Duration,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn pace(&self) {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }
}
