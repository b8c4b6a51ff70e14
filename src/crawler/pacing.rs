//! Pacing for listing pages and detail workers
//!
//! This module handles:
//! - Choosing pause lengths (fixed or uniformly random within a range)
//! - Sleeping through an injectable [`Sleeper`], so tests can record pauses
//!   instead of waiting
//!
//! Detail workers pause *after* delivering each result and before taking the
//! next candidate. This spaces out requests per worker; with `n` workers the
//! aggregate rate is only approximately bounded, not strictly limited.

use async_trait::async_trait;
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Decides how long the next pause should be
pub trait DelayPolicy: Send + Sync {
    fn next_delay(&self) -> Duration;
}

/// Always the same pause
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl DelayPolicy for FixedDelay {
    fn next_delay(&self) -> Duration {
        self.0
    }
}

/// Uniformly random pause within an inclusive millisecond range
#[derive(Debug, Clone, Copy)]
pub struct RandomDelay {
    min_ms: u64,
    max_ms: u64,
}

impl RandomDelay {
    /// Bounds are swapped if given in the wrong order
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }
}

impl DelayPolicy for RandomDelay {
    fn next_delay(&self) -> Duration {
        if self.min_ms == self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rand::rng().random_range(self.min_ms..=self.max_ms))
    }
}

/// Performs the actual waiting
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// A delay policy paired with a sleeper; cheap to clone into each worker
#[derive(Clone)]
pub struct Pacer {
    policy: Arc<dyn DelayPolicy>,
    sleeper: Arc<dyn Sleeper>,
}

impl Pacer {
    pub fn new(policy: Arc<dyn DelayPolicy>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { policy, sleeper }
    }

    /// Random pauses in `[min_ms, max_ms]` on the tokio timer
    pub fn random(min_ms: u64, max_ms: u64) -> Self {
        Self::new(Arc::new(RandomDelay::new(min_ms, max_ms)), Arc::new(TokioSleeper))
    }

    /// No pausing at all
    pub fn none() -> Self {
        Self::new(Arc::new(FixedDelay(Duration::ZERO)), Arc::new(TokioSleeper))
    }

    /// Pauses once and returns how long was requested
    pub async fn pause(&self) -> Duration {
        let delay = self.policy.next_delay();
        self.sleeper.sleep(delay).await;
        delay
    }
}

impl fmt::Debug for Pacer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pacer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSleeper {
        pauses: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.pauses.lock().unwrap().push(duration);
        }
    }

    #[test]
    fn test_random_delay_within_bounds() {
        let policy = RandomDelay::new(200, 500);
        for _ in 0..200 {
            let delay = policy.next_delay();
            assert!(delay >= Duration::from_millis(200));
            assert!(delay <= Duration::from_millis(500));
        }
    }

    #[test]
    fn test_random_delay_degenerate_range() {
        let policy = RandomDelay::new(300, 300);
        assert_eq!(policy.next_delay(), Duration::from_millis(300));
    }

    #[test]
    fn test_random_delay_swapped_bounds() {
        let policy = RandomDelay::new(500, 200);
        let delay = policy.next_delay();
        assert!(delay >= Duration::from_millis(200) && delay <= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_pacer_uses_injected_sleeper() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let pacer = Pacer::new(
            Arc::new(FixedDelay(Duration::from_millis(250))),
            sleeper.clone(),
        );

        for _ in 0..3 {
            assert_eq!(pacer.pause().await, Duration::from_millis(250));
        }

        let pauses = sleeper.pauses.lock().unwrap();
        assert_eq!(pauses.len(), 3);
        assert!(pauses.iter().all(|d| *d == Duration::from_millis(250)));
    }

    #[tokio::test]
    async fn test_clones_share_sleeper() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let pacer = Pacer::new(Arc::new(RandomDelay::new(10, 20)), sleeper.clone());

        let worker_a = pacer.clone();
        let worker_b = pacer.clone();
        worker_a.pause().await;
        worker_b.pause().await;

        let pauses = sleeper.pauses.lock().unwrap();
        assert_eq!(pauses.len(), 2);
        assert!(pauses
            .iter()
            .all(|d| *d >= Duration::from_millis(10) && *d <= Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_none_does_not_wait() {
        let started = std::time::Instant::now();
        assert_eq!(Pacer::none().pause().await, Duration::ZERO);
        assert!(started.elapsed() < Duration::from_millis(50));
    }
}
