//! Bounded-concurrency limiter for pipeline stages.
//!
//! Downloads and installs each get an independent limiter: fetch is
//! network-bound and tolerates high parallelism, while the device interface
//! is a single shared resource whose safe concurrency is a policy decision.
//! Permits are RAII and an atomic gauge tracks in-flight work so tests can
//! assert the bound is never exceeded.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// Semaphore-backed concurrency limiter.
#[derive(Debug)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    permits: usize,
    in_flight: Arc<AtomicUsize>,
    label: String,
}

impl ConcurrencyLimiter {
    /// Creates a limiter admitting at most `permits` concurrent holders.
    ///
    /// # Panics
    ///
    /// Panics if `permits` is zero.
    pub fn new(permits: usize, label: impl Into<String>) -> Self {
        assert!(permits > 0, "permits must be > 0");

        let label = label.into();
        debug!(permits, label = %label, "created concurrency limiter");

        Self {
            semaphore: Arc::new(Semaphore::new(permits)),
            permits,
            in_flight: Arc::new(AtomicUsize::new(0)),
            label,
        }
    }

    /// Waits for a permit. The permit is released when dropped.
    pub async fn acquire(&self) -> LimiterPermit {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("limiter semaphore closed");

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        LimiterPermit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    /// Maximum concurrent holders.
    pub fn permits(&self) -> usize {
        self.permits
    }

    /// Current number of held permits.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Label for logging.
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// A permit from a [`ConcurrencyLimiter`].
///
/// While held, counts against the limiter's bound. Automatically released
/// when dropped.
pub struct LimiterPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for LimiterPermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
