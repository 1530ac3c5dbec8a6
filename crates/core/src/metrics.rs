//! Prometheus metrics for orchestrations.
//!
//! This module provides metrics for:
//! - Orchestration runs (startup/shutdown outcomes)
//! - Tiers (duration, per-region convergence outcomes)
//! - Provider calls (state changes, status polls)
//!
//! The `stackctl` binary prints [`encode_metrics`] when run with `--metrics`.

use once_cell::sync::Lazy;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

/// Registry holding every metric below.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for metric in all_metrics() {
        if let Err(e) = registry.register(metric) {
            tracing::error!("Failed to register metric: {}", e);
        }
    }
    registry
});

// =============================================================================
// Orchestration Metrics
// =============================================================================

/// Orchestration runs by action and result.
pub static ORCHESTRATION_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("stackctl_orchestration_runs_total", "Total orchestration runs"),
        // result: "completed", "incomplete_tagging", "no_ordering", "listing_failed"
        &["action", "result"],
    )
    .unwrap()
});

/// Time from launching a tier to joining it.
pub static TIER_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "stackctl_tier_duration_seconds",
            "Duration of one tier including convergence",
        )
        .buckets(vec![1.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0]),
        &["action"],
    )
    .unwrap()
});

/// Region task outcomes.
pub static REGION_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("stackctl_region_outcomes_total", "Region task outcomes"),
        &["action", "result"], // result: "converged", "timed_out"
    )
    .unwrap()
});

// =============================================================================
// Provider Metrics
// =============================================================================

/// Start/stop calls by result.
pub static STATE_CHANGE_CALLS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("stackctl_state_change_calls_total", "Start and stop calls"),
        &["action", "result"], // result: "ok", "error"
    )
    .unwrap()
});

/// Status polls by result.
pub static CONVERGENCE_POLLS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("stackctl_convergence_polls_total", "Instance status polls"),
        &["result"], // "converged", "mismatch", "error", "timeout"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(ORCHESTRATION_RUNS.clone()),
        Box::new(TIER_DURATION.clone()),
        Box::new(REGION_OUTCOMES.clone()),
        Box::new(STATE_CHANGE_CALLS.clone()),
        Box::new(CONVERGENCE_POLLS.clone()),
    ]
}

/// Encode the registry in the Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
