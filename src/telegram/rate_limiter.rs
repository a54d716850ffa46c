//! Rate limiter for Telegram API calls.
//!
//! Spaces out bursts of calls (message sends, purge batches) and holds them
//! back while a flood wait imposed by Telegram is in effect.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct LimiterState {
    /// Last time an operation was performed.
    last_operation: Option<Instant>,

    /// No operation may start before this instant.
    blocked_until: Option<Instant>,
}

/// Rate limiter that enforces minimum intervals between operations.
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum duration between allowed operations.
    min_interval: Duration,

    state: Mutex<LimiterState>,
}

impl RateLimiter {
    /// Creates a new rate limiter with the specified minimum interval.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            state: Mutex::new(LimiterState::default()),
        }
    }

    /// Waits until an operation is allowed, then marks the operation as performed.
    ///
    /// Returns the duration waited (0 if no wait was needed).
    pub async fn wait_and_acquire(&self) -> Duration {
        let mut state = self.state.lock().await;

        let wait_duration = Self::remaining(&state, self.min_interval);
        if !wait_duration.is_zero() {
            debug!(
                "Rate limiter: waiting {:?} before next operation",
                wait_duration
            );
            tokio::time::sleep(wait_duration).await;
        }

        state.last_operation = Some(Instant::now());
        state.blocked_until = None;
        wait_duration
    }

    /// Records a flood wait from Telegram; the next acquire waits it out.
    pub async fn handle_flood_wait(&self, wait_seconds: u32) {
        warn!(
            "Received flood wait from Telegram: {} seconds",
            wait_seconds
        );
        let mut state = self.state.lock().await;
        state.blocked_until =
            Some(Instant::now() + Duration::from_secs(u64::from(wait_seconds)));
    }

    fn remaining(state: &LimiterState, min_interval: Duration) -> Duration {
        let interval_wait = state
            .last_operation
            .map_or(Duration::ZERO, |last| {
                min_interval.saturating_sub(last.elapsed())
            });
        let flood_wait = state
            .blocked_until
            .map_or(Duration::ZERO, |until| {
                until.saturating_duration_since(Instant::now())
            });

        interval_wait.max(flood_wait)
    }
}
