//! Sliding-window request budget.
//!
//! Keeps the client under the upstream key's request ceiling (default 100
//! requests per 120 seconds). Every attempt, retries included, takes one
//! slot.

use parking_lot::Mutex;
use rankwatch_telemetry::Metrics;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Sliding-window limiter over request timestamps.
pub struct RequestBudget {
    max_requests: u32,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RequestBudget {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let max_requests = max_requests.max(1);
        Self {
            max_requests,
            window,
            timestamps: Mutex::new(VecDeque::with_capacity(max_requests as usize)),
        }
    }

    /// Wait for a free slot and take it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let now = Instant::now();
                let mut timestamps = self.timestamps.lock();
                self.cleanup(&mut timestamps, now);
                if timestamps.len() < self.max_requests as usize {
                    timestamps.push_back(now);
                    Metrics::api_budget_in_window(timestamps.len());
                    return;
                }
                timestamps
                    .front()
                    .map(|oldest| (*oldest + self.window).saturating_duration_since(now))
                    .unwrap_or(Duration::ZERO)
            };

            debug!(wait_ms = wait.as_millis() as u64, "Request budget exhausted, waiting");
            tokio::time::sleep(wait.max(Duration::from_millis(1))).await;
        }
    }

    fn cleanup(&self, timestamps: &mut VecDeque<Instant>, now: Instant) {
        let Some(cutoff) = now.checked_sub(self.window) else {
            return;
        };
        while timestamps.front().is_some_and(|&t| t <= cutoff) {
            timestamps.pop_front();
        }
    }
}
