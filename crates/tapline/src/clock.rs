//! Injectable clock for polling and retry pauses.
//!
//! Every wait in the engine goes through [`Clock`], so tests can swap in a
//! [`FakeClock`] whose sleeps advance virtual time instantly.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Monotonic time source with cooperative sleep
#[async_trait]
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Milliseconds since the clock's origin
    fn now_ms(&self) -> u64;

    /// Suspend the current task
    async fn sleep(&self, duration: Duration);
}

/// Shared clock handle
pub type SharedClock = Arc<dyn Clock>;

/// Wall clock backed by tokio's timer
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: tokio::time::Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Deterministic clock: `sleep` returns at once and moves virtual time forward
#[derive(Debug, Default)]
pub struct FakeClock {
    current_ms: AtomicU64,
    sleep_count: AtomicU64,
    slept_ms: AtomicU64,
}

impl FakeClock {
    /// Create a clock at time zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock at a fixed start time
    #[must_use]
    pub fn starting_at(time_ms: u64) -> Self {
        Self {
            current_ms: AtomicU64::new(time_ms),
            ..Self::default()
        }
    }

    /// Advance time without counting a sleep
    pub fn fast_forward(&self, duration: Duration) {
        self.fast_forward_ms(duration.as_millis() as u64);
    }

    /// Advance time by milliseconds without counting a sleep
    pub fn fast_forward_ms(&self, ms: u64) {
        self.current_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Number of sleeps taken so far
    #[must_use]
    pub fn sleep_count(&self) -> u64 {
        self.sleep_count.load(Ordering::SeqCst)
    }

    /// Total virtual time spent sleeping
    #[must_use]
    pub fn total_slept_ms(&self) -> u64 {
        self.slept_ms.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        self.current_ms.load(Ordering::SeqCst)
    }

    async fn sleep(&self, duration: Duration) {
        let ms = duration.as_millis() as u64;
        self.sleep_count.fetch_add(1, Ordering::SeqCst);
        self.slept_ms.fetch_add(ms, Ordering::SeqCst);
        self.fast_forward_ms(ms);
    }
}
