//! Prometheus metrics for transcoding sessions.
//!
//! Collectors are process-wide. Hosts register them with their own registry
//! through [`all_metrics`].

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Configuration
// =============================================================================

/// Sessions created total.
pub static SESSIONS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("transcoder_sessions_created_total", "Total sessions created").unwrap()
});

/// Tracks configured total by kind.
pub static TRACKS_CONFIGURED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "transcoder_tracks_configured_total",
            "Total tracks configured",
        ),
        &["kind"], // "passthrough", "transcode"
    )
    .unwrap()
});

// =============================================================================
// Runtime
// =============================================================================

/// Sessions started total.
pub static SESSIONS_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "transcoder_sessions_started_total",
        "Total sessions whose track transcoders were started",
    )
    .unwrap()
});

/// Final callbacks delivered by result.
pub static SESSION_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "transcoder_session_outcomes_total",
            "Total final callbacks delivered to clients",
        ),
        &["result"], // "finished", "error"
    )
    .unwrap()
});

/// Errors swallowed because the client had already cancelled.
pub static ERRORS_SUPPRESSED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "transcoder_errors_suppressed_total",
        "Total pipeline errors suppressed after an explicit cancel",
    )
    .unwrap()
});

/// Effective cancellations total.
pub static CANCELLATIONS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "transcoder_cancellations_total",
        "Total session cancellations that stopped a pipeline",
    )
    .unwrap()
});

/// Time from start to the final callback, in seconds.
pub static SESSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "transcoder_session_duration_seconds",
            "Duration of sessions from start to final callback",
        )
        .buckets(vec![
            0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0, 3600.0,
        ]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all session metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SESSIONS_CREATED.clone()),
        Box::new(TRACKS_CONFIGURED.clone()),
        Box::new(SESSIONS_STARTED.clone()),
        Box::new(SESSION_OUTCOMES.clone()),
        Box::new(ERRORS_SUPPRESSED.clone()),
        Box::new(CANCELLATIONS.clone()),
        Box::new(SESSION_DURATION.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }

        TRACKS_CONFIGURED.with_label_values(&["passthrough"]).inc();
        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "transcoder_tracks_configured_total"));
    }
}
