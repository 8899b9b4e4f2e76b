//! Thinking delay strategies

use std::time::Duration;

use async_trait::async_trait;
use concierge_core::ThinkingDelay;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Zero-duration delay for tests and non-interactive callers
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl ThinkingDelay for NoDelay {
    fn next_delay(&self) -> Duration {
        Duration::ZERO
    }

    async fn pause(&self) {}
}

/// Uniform delay in `[min, max)`
pub struct RandomizedDelay {
    min: Duration,
    max: Duration,
    rng: Mutex<StdRng>,
}

impl RandomizedDelay {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self::with_rng(min, max, StdRng::from_entropy())
    }

    pub fn with_seed(min: Duration, max: Duration, seed: u64) -> Self {
        Self::with_rng(min, max, StdRng::seed_from_u64(seed))
    }

    fn with_rng(min: Duration, max: Duration, rng: StdRng) -> Self {
        Self {
            min,
            max: max.max(min),
            rng: Mutex::new(rng),
        }
    }

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }
}

#[async_trait]
impl ThinkingDelay for RandomizedDelay {
    fn next_delay(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(self.rng.lock().gen_range(min..max))
    }

    async fn pause(&self) {
        let delay = self.next_delay();
        tracing::trace!(delay_ms = delay.as_millis() as u64, "Thinking");
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_randomized_bounds() {
        let delay = RandomizedDelay::with_seed(
            Duration::from_millis(600),
            Duration::from_millis(1400),
            3,
        );
        for _ in 0..200 {
            let d = delay.next_delay();
            assert!(d >= Duration::from_millis(600));
            assert!(d < Duration::from_millis(1400));
        }
    }

    #[test]
    fn test_degenerate_range() {
        let delay = RandomizedDelay::from_millis(500, 500);
        assert_eq!(delay.next_delay(), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_no_delay() {
        assert_eq!(NoDelay.next_delay(), Duration::ZERO);
        NoDelay.pause().await;
    }

    #[tokio::test]
    async fn test_pause_sleeps() {
        let delay = RandomizedDelay::from_millis(10, 20);
        let start = std::time::Instant::now();
        delay.pause().await;
        assert!(start.elapsed() >= Duration::from_millis(10));
    }
}
