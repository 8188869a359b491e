//! Prometheus metrics for rankwatch.
//!
//! Covers upstream API calls, polling sweeps, per-entity outcomes and
//! notification delivery.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which must crash at startup; it can only happen
//! during static initialization.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_gauge, CounterVec, HistogramVec,
    IntGauge,
};

/// Upstream API requests.
/// Labels: endpoint (account/summoner/league/match_ids/match), outcome
pub static API_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "rankwatch_api_requests_total",
        "Total upstream API requests by endpoint and outcome",
        &["endpoint", "outcome"]
    )
    .unwrap()
});

/// Sleeps between retry attempts.
/// Labels: reason (rate_limited/transport)
pub static API_RETRY_SLEEPS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "rankwatch_api_retry_sleeps_total",
        "Total sleeps between upstream retry attempts",
        &["reason"]
    )
    .unwrap()
});

/// Requests counted in the current sliding request window.
pub static API_BUDGET_IN_WINDOW: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "rankwatch_api_budget_in_window",
        "Requests counted in the current sliding request window"
    )
    .unwrap()
});

/// Completed, aborted and dropped sweeps.
/// Labels: result (completed/aborted/skipped)
pub static SWEEPS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "rankwatch_sweeps_total",
        "Total polling sweeps by result",
        &["result"]
    )
    .unwrap()
});

/// Sweep wall time in seconds.
/// Labels: scope (all/guild)
pub static SWEEP_DURATION_SECS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "rankwatch_sweep_duration_seconds",
        "Polling sweep duration in seconds",
        &["scope"],
        vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1200.0]
    )
    .unwrap()
});

/// Per-entity sweep outcomes.
/// Labels: outcome (unchanged/first_observation/changed/not_found/unavailable/
/// rate_limited/store_failed/failed)
pub static ENTITY_OUTCOMES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "rankwatch_entity_outcomes_total",
        "Per-entity refresh outcomes",
        &["outcome"]
    )
    .unwrap()
});

/// Detected ranking changes.
/// Labels: kind (promotion/demotion/points)
pub static CHANGES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "rankwatch_changes_total",
        "Detected ranking changes by kind",
        &["kind"]
    )
    .unwrap()
});

/// Notification deliveries.
/// Labels: result (sent/no_channel/failed)
pub static NOTIFICATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "rankwatch_notifications_total",
        "Notification deliveries by result",
        &["result"]
    )
    .unwrap()
});

/// Number of tracked entities at the last listing.
pub static TRACKED_ENTITIES: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "rankwatch_tracked_entities",
        "Number of tracked entities at the last sweep listing"
    )
    .unwrap()
});

/// Notifications still accepting toggles.
pub static INTERACTIVE_LIVE: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "rankwatch_interactive_live",
        "Notifications whose toggle is still enabled"
    )
    .unwrap()
});

/// Metrics helper.
pub struct Metrics;

impl Metrics {
    /// Record one upstream request attempt.
    pub fn api_request(endpoint: &str, outcome: &str) {
        API_REQUESTS_TOTAL
            .with_label_values(&[endpoint, outcome])
            .inc();
    }

    /// Record a sleep before the next attempt.
    pub fn api_retry_sleep(reason: &str) {
        API_RETRY_SLEEPS_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Update the sliding window occupancy.
    pub fn api_budget_in_window(count: usize) {
        API_BUDGET_IN_WINDOW.set(count as i64);
    }

    /// Record a sweep result.
    pub fn sweep_finished(result: &str) {
        SWEEPS_TOTAL.with_label_values(&[result]).inc();
    }

    /// Record sweep duration.
    pub fn sweep_duration(scope: &str, secs: f64) {
        SWEEP_DURATION_SECS.with_label_values(&[scope]).observe(secs);
    }

    /// Record a per-entity outcome.
    pub fn entity_outcome(outcome: &str) {
        ENTITY_OUTCOMES_TOTAL.with_label_values(&[outcome]).inc();
    }

    /// Record a detected change.
    pub fn change_detected(kind: &str) {
        CHANGES_TOTAL.with_label_values(&[kind]).inc();
    }

    /// Record a notification delivery result.
    pub fn notification(result: &str) {
        NOTIFICATIONS_TOTAL.with_label_values(&[result]).inc();
    }

    /// Update the tracked entity count.
    pub fn tracked_entities(count: usize) {
        TRACKED_ENTITIES.set(count as i64);
    }

    /// Update the live interactive notification count.
    pub fn interactive_live(count: usize) {
        INTERACTIVE_LIVE.set(count as i64);
    }
}
