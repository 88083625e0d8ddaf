//! # Application State Management
//!
//! Shared state that every HTTP request handler can access concurrently.
//!
//! ## Sharing model:
//! - **Configuration** is read-only at request time (the transcode parameters
//!   are fixed), so a plain `Arc<AppConfig>` is enough — no lock.
//! - **Metrics** are updated by every request, so they live behind
//!   `Arc<RwLock<AppMetrics>>`: many readers or one writer at a time.
//! - **Pipeline** is a stateless, reentrant capability object; one shared
//!   instance serves all concurrent requests.

use crate::config::AppConfig;
use crate::pipeline::TranscriptionPipeline;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// The main application state shared across all HTTP request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration, immutable after startup.
    pub config: Arc<AppConfig>,

    /// Performance metrics, updated by every request.
    pub metrics: Arc<RwLock<AppMetrics>>,

    /// The transcription pipeline (decode → transcode → recognize).
    pub pipeline: Arc<TranscriptionPipeline>,

    /// When the server started. `Instant` is Copy, so no lock needed.
    pub start_time: Instant,
}

/// Performance metrics collected across all HTTP requests.
#[derive(Debug, Default)]
pub struct AppMetrics {
    /// Total number of HTTP requests processed since server start.
    pub request_count: u64,

    /// Total number of requests that produced an error response.
    pub error_count: u64,

    /// Number of transcription requests currently inside the pipeline.
    pub active_transcriptions: u32,

    /// Per-endpoint statistics, keyed by "METHOD /path".
    pub endpoint_metrics: HashMap<String, EndpointMetric>,
}

/// Detailed performance metrics for a specific API endpoint.
#[derive(Debug, Default, Clone)]
pub struct EndpointMetric {
    pub request_count: u64,
    pub total_duration_ms: u64,
    pub error_count: u64,
}

impl AppState {
    pub fn new(config: AppConfig, pipeline: TranscriptionPipeline) -> Self {
        Self {
            config: Arc::new(config),
            metrics: Arc::new(RwLock::new(AppMetrics::default())),
            pipeline: Arc::new(pipeline),
            start_time: Instant::now(),
        }
    }

    pub fn increment_request_count(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.request_count += 1;
    }

    pub fn increment_error_count(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.error_count += 1;
    }

    /// Record duration and outcome for a specific endpoint.
    pub fn record_endpoint_request(&self, endpoint: &str, duration_ms: u64, is_error: bool) {
        let mut metrics = self.metrics.write().unwrap();

        let endpoint_metric = metrics
            .endpoint_metrics
            .entry(endpoint.to_string())
            .or_default();

        endpoint_metric.request_count += 1;
        endpoint_metric.total_duration_ms += duration_ms;

        if is_error {
            endpoint_metric.error_count += 1;
        }
    }

    /// Called when a transcription request enters the pipeline.
    pub fn increment_active_transcriptions(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.active_transcriptions += 1;
    }

    /// Called when a transcription request leaves the pipeline, on every
    /// outcome. Guarded against underflow.
    pub fn decrement_active_transcriptions(&self) {
        let mut metrics = self.metrics.write().unwrap();
        if metrics.active_transcriptions > 0 {
            metrics.active_transcriptions -= 1;
        }
    }

    /// Snapshot of current metrics for the /metrics endpoint.
    ///
    /// Clones under a read lock so the lock is not held while the HTTP
    /// response is being serialized.
    pub fn get_metrics_snapshot(&self) -> AppMetrics {
        let metrics = self.metrics.read().unwrap();
        AppMetrics {
            request_count: metrics.request_count,
            error_count: metrics.error_count,
            active_transcriptions: metrics.active_transcriptions,
            endpoint_metrics: metrics.endpoint_metrics.clone(),
        }
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl EndpointMetric {
    pub fn average_duration_ms(&self) -> f64 {
        if self.request_count > 0 {
            self.total_duration_ms as f64 / self.request_count as f64
        } else {
            0.0
        }
    }

    pub fn error_rate(&self) -> f64 {
        if self.request_count > 0 {
            self.error_count as f64 / self.request_count as f64
        } else {
            0.0
        }
    }
}
