//! Prometheus metrics for observability and monitoring.
//!
//! This module provides metric collection for:
//! - Match commands (counts, failures, commit latency)
//! - Match-end notifications
//! - Read-through cache hits and misses
//!
//! # Example
//!
//! ```rust,no_run
//! use padelsense_runtime::metrics::MetricsRecorder;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let recorder = MetricsRecorder::install()?;
//!
//! // Serve this from a `/metrics` route
//! let body = recorder.render();
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Installed Prometheus recorder.
///
/// Rendering is left to the HTTP layer, which serves it on `/metrics`.
#[derive(Clone)]
pub struct MetricsRecorder {
    handle: PrometheusHandle,
}

impl std::fmt::Debug for MetricsRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRecorder").finish_non_exhaustive()
    }
}

impl MetricsRecorder {
    /// Install the global Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or a recorder is
    /// already installed in this process.
    pub fn install() -> Result<Self, MetricsError> {
        let handle = PrometheusBuilder::new()
            // Configure histogram buckets for latency measurements
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?
            .install_recorder()
            .map_err(|e| MetricsError::Install(e.to_string()))?;

        // Register all metric descriptions
        register_metrics();
        tracing::info!("Metrics recorder installed");

        Ok(Self { handle })
    }

    /// Render current metrics in Prometheus format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    // Command Metrics
    describe_counter!(
        "match_commands_total",
        "Total number of match commands received, by command"
    );
    describe_counter!(
        "match_commands_failed_total",
        "Total number of match commands rejected or failed, by command and error kind"
    );
    describe_histogram!(
        "match_commit_duration_seconds",
        "Time taken to commit a match update"
    );
    describe_counter!(
        "match_store_conflicts_total",
        "Total number of commits rejected by the store's version check"
    );

    // Notification Metrics
    describe_counter!(
        "match_notify_sent_total",
        "Total number of match-end notifications delivered"
    );
    describe_counter!(
        "match_notify_failed_total",
        "Total number of match-end notifications that failed"
    );

    // Cache Metrics
    describe_counter!("cache_hits_total", "Total number of cache hits");
    describe_counter!("cache_misses_total", "Total number of cache misses");
}

/// Match command metrics recorder.
pub struct CommandMetrics;

impl CommandMetrics {
    /// Record a command received.
    pub fn record_command(command: &'static str) {
        counter!("match_commands_total", "command" => command).increment(1);
    }

    /// Record a command that failed with an error of `kind`.
    pub fn record_failure(command: &'static str, kind: &'static str) {
        counter!("match_commands_failed_total", "command" => command, "error" => kind).increment(1);
    }

    /// Record a commit round trip.
    pub fn record_commit(duration: Duration) {
        histogram!("match_commit_duration_seconds").record(duration.as_secs_f64());
    }
}

/// Notification metrics recorder.
pub struct NotifyMetrics;

impl NotifyMetrics {
    /// Record a delivered notification.
    pub fn record_sent() {
        counter!("match_notify_sent_total").increment(1);
    }

    /// Record a failed notification.
    pub fn record_failure() {
        counter!("match_notify_failed_total").increment(1);
    }
}

/// Cache metrics recorder.
pub struct CacheMetrics;

impl CacheMetrics {
    /// Record a cache hit.
    pub fn record_hit() {
        counter!("cache_hits_total").increment(1);
    }

    /// Record a cache miss.
    pub fn record_miss() {
        counter!("cache_misses_total").increment(1);
    }
}
