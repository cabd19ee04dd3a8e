//! Application state shared by all handlers.

use padelsense_runtime::MatchController;
use padelsense_runtime::metrics::MetricsRecorder;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Match command entry point
    pub controller: Arc<MatchController>,
    /// Prometheus recorder; `/metrics` answers 404 without one
    pub metrics: Option<MetricsRecorder>,
}

impl AppState {
    /// Create state around a controller, without metrics.
    #[must_use]
    pub fn new(controller: MatchController) -> Self {
        Self {
            controller: Arc::new(controller),
            metrics: None,
        }
    }

    /// Serve this recorder on `/metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsRecorder) -> Self {
        self.metrics = Some(metrics);
        self
    }
}
