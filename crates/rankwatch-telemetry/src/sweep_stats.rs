//! Periodic sweep statistics summary.
//!
//! Reads the process-wide counters and logs a compact summary of polling
//! activity since the reporter was created.

use crate::metrics::{
    API_REQUESTS_TOTAL, API_RETRY_SLEEPS_TOTAL, ENTITY_OUTCOMES_TOTAL, NOTIFICATIONS_TOTAL,
    SWEEPS_TOTAL, SWEEP_DURATION_SECS,
};
use chrono::{DateTime, Utc};
use prometheus::core::Collector;
use prometheus::CounterVec;
use serde::Serialize;
use tracing::info;

/// Entity outcomes counted as failures in the summary.
const FAILED_OUTCOMES: [&str; 5] = [
    "not_found",
    "unavailable",
    "rate_limited",
    "store_failed",
    "failed",
];

/// Snapshot of the polling counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepStats {
    pub sweeps_completed: u64,
    pub sweeps_aborted: u64,
    pub sweeps_skipped: u64,
    pub entities_changed: u64,
    pub entities_unchanged: u64,
    pub entities_first_seen: u64,
    pub entities_failed: u64,
    pub notifications_sent: u64,
    pub notifications_no_channel: u64,
    pub notifications_failed: u64,
    pub api_requests: u64,
    pub api_retry_sleeps: u64,
    pub sweep_p50_secs: f64,
    pub sweep_p95_secs: f64,
}

/// Sweep statistics reporter.
pub struct SweepStatsReporter {
    start_time: DateTime<Utc>,
}

impl Default for SweepStatsReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl SweepStatsReporter {
    pub fn new() -> Self {
        Self {
            start_time: Utc::now(),
        }
    }

    /// Current counter values.
    pub fn get_stats(&self) -> SweepStats {
        let (sweep_p50_secs, sweep_p95_secs) = sweep_percentiles("all");
        SweepStats {
            sweeps_completed: counter_value(&SWEEPS_TOTAL, &["completed"]),
            sweeps_aborted: counter_value(&SWEEPS_TOTAL, &["aborted"]),
            sweeps_skipped: counter_value(&SWEEPS_TOTAL, &["skipped"]),
            entities_changed: counter_value(&ENTITY_OUTCOMES_TOTAL, &["changed"]),
            entities_unchanged: counter_value(&ENTITY_OUTCOMES_TOTAL, &["unchanged"]),
            entities_first_seen: counter_value(&ENTITY_OUTCOMES_TOTAL, &["first_observation"]),
            entities_failed: FAILED_OUTCOMES
                .iter()
                .map(|o| counter_value(&ENTITY_OUTCOMES_TOTAL, &[o]))
                .sum(),
            notifications_sent: counter_value(&NOTIFICATIONS_TOTAL, &["sent"]),
            notifications_no_channel: counter_value(&NOTIFICATIONS_TOTAL, &["no_channel"]),
            notifications_failed: counter_value(&NOTIFICATIONS_TOTAL, &["failed"]),
            api_requests: counter_total(&API_REQUESTS_TOTAL),
            api_retry_sleeps: counter_total(&API_RETRY_SLEEPS_TOTAL),
            sweep_p50_secs,
            sweep_p95_secs,
        }
    }

    /// Log the summary.
    pub fn output_summary(&self) {
        let s = self.get_stats();
        let duration = Utc::now() - self.start_time;

        info!(
            since = %self.start_time.format("%Y-%m-%d %H:%M:%S UTC"),
            hours = duration.num_hours(),
            minutes = duration.num_minutes() % 60,
            "Sweep statistics summary"
        );
        info!(
            completed = s.sweeps_completed,
            aborted = s.sweeps_aborted,
            skipped = s.sweeps_skipped,
            p50_secs = format!("{:.1}", s.sweep_p50_secs),
            p95_secs = format!("{:.1}", s.sweep_p95_secs),
            "Sweeps"
        );
        info!(
            changed = s.entities_changed,
            unchanged = s.entities_unchanged,
            first_seen = s.entities_first_seen,
            failed = s.entities_failed,
            "Entities"
        );
        info!(
            sent = s.notifications_sent,
            no_channel = s.notifications_no_channel,
            failed = s.notifications_failed,
            "Notifications"
        );
        info!(
            requests = s.api_requests,
            retry_sleeps = s.api_retry_sleeps,
            "Upstream API"
        );
    }
}

fn counter_value(counter: &CounterVec, labels: &[&str]) -> u64 {
    counter.with_label_values(labels).get() as u64
}

/// Sum over every label combination.
fn counter_total(counter: &CounterVec) -> u64 {
    counter
        .collect()
        .iter()
        .flat_map(|mf| mf.get_metric())
        .map(|m| m.get_counter().get_value())
        .sum::<f64>() as u64
}

fn sweep_percentiles(scope: &str) -> (f64, f64) {
    for mf in SWEEP_DURATION_SECS.collect() {
        for m in mf.get_metric() {
            let matches = m
                .get_label()
                .iter()
                .any(|pair| pair.get_name() == "scope" && pair.get_value() == scope);
            if !matches {
                continue;
            }

            let h = m.get_histogram();
            let count = h.get_sample_count();
            let buckets: Vec<(f64, u64)> = h
                .get_bucket()
                .iter()
                .map(|b| (b.get_upper_bound(), b.get_cumulative_count()))
                .collect();
            return (
                percentile_from_buckets(&buckets, count, 0.50),
                percentile_from_buckets(&buckets, count, 0.95),
            );
        }
    }
    (0.0, 0.0)
}

/// Percentile from cumulative `(upper_bound, count)` buckets, interpolated
/// linearly within the matching bucket.
fn percentile_from_buckets(buckets: &[(f64, u64)], total_count: u64, percentile: f64) -> f64 {
    if total_count == 0 {
        return 0.0;
    }
    let target = (total_count as f64 * percentile) as u64;
    let mut prev_bound = 0.0;
    let mut prev_count = 0u64;

    for &(upper_bound, cumulative_count) in buckets {
        if cumulative_count >= target {
            let bucket_count = cumulative_count - prev_count;
            if bucket_count == 0 {
                return upper_bound;
            }
            let position = (target - prev_count) as f64 / bucket_count as f64;
            return prev_bound + position * (upper_bound - prev_bound);
        }
        prev_bound = upper_bound;
        prev_count = cumulative_count;
    }

    buckets.last().map(|b| b.0).unwrap_or(0.0)
}
