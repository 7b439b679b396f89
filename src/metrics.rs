use crate::rewriters::{BodyRewrite, SkipReason};
use serde::Serialize;
use std::sync::Arc;
/// Proxy counters and timing
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Metrics collector for the rewrite proxy
#[derive(Clone, Debug)]
pub struct Metrics {
    /// Total number of requests processed
    pub total_requests: Arc<AtomicU64>,
    /// Total number of successful requests
    pub successful_requests: Arc<AtomicU64>,
    /// Total number of failed requests
    pub failed_requests: Arc<AtomicU64>,
    /// Total number of bytes received from clients
    pub bytes_received: Arc<AtomicU64>,
    /// Total number of body bytes sent to clients
    pub bytes_sent: Arc<AtomicU64>,
    /// Total processing time in microseconds
    pub total_processing_time_us: Arc<AtomicU64>,
    /// Bodies where at least one address was replaced
    pub bodies_rewritten: Arc<AtomicU64>,
    /// Bodies delivered unchanged
    pub bodies_unchanged: Arc<AtomicU64>,
    /// Total address replacements
    pub replacements: Arc<AtomicU64>,
    /// Bodies left unrewritten because decoding or encoding failed
    pub transform_failures: Arc<AtomicU64>,
    /// Streaming filters attached to responses
    pub filters_attached: Arc<AtomicU64>,
    /// Number of upstream errors
    pub upstream_errors: Arc<AtomicU64>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            total_requests: Arc::new(AtomicU64::new(0)),
            successful_requests: Arc::new(AtomicU64::new(0)),
            failed_requests: Arc::new(AtomicU64::new(0)),
            bytes_received: Arc::new(AtomicU64::new(0)),
            bytes_sent: Arc::new(AtomicU64::new(0)),
            total_processing_time_us: Arc::new(AtomicU64::new(0)),
            bodies_rewritten: Arc::new(AtomicU64::new(0)),
            bodies_unchanged: Arc::new(AtomicU64::new(0)),
            replacements: Arc::new(AtomicU64::new(0)),
            transform_failures: Arc::new(AtomicU64::new(0)),
            filters_attached: Arc::new(AtomicU64::new(0)),
            upstream_errors: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Record a request
    pub fn record_request(
        &self,
        success: bool,
        bytes_received: u64,
        bytes_sent: u64,
        duration: Duration,
    ) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
        self.bytes_received
            .fetch_add(bytes_received, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes_sent, Ordering::Relaxed);
        self.total_processing_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    /// Record the outcome of a whole-body rewrite
    pub fn record_rewrite(&self, outcome: &BodyRewrite) {
        match outcome {
            BodyRewrite::Rewritten { replacements, .. } => {
                self.bodies_rewritten.fetch_add(1, Ordering::Relaxed);
                self.replacements
                    .fetch_add(*replacements as u64, Ordering::Relaxed);
            }
            BodyRewrite::Unchanged { reason, .. } => {
                self.bodies_unchanged.fetch_add(1, Ordering::Relaxed);
                if matches!(reason, SkipReason::DecodeFailed | SkipReason::EncodeFailed) {
                    self.transform_failures.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Record a streaming filter attached to a response
    pub fn record_filter_attached(&self) {
        self.filters_attached.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of a streamed rewrite at completion
    pub fn record_streamed_rewrite(&self, replacements: usize) {
        if replacements > 0 {
            self.bodies_rewritten.fetch_add(1, Ordering::Relaxed);
            self.replacements
                .fetch_add(replacements as u64, Ordering::Relaxed);
        } else {
            self.bodies_unchanged.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record bytes delivered by a streaming response
    pub fn record_bytes_sent(&self, bytes: u64) {
        self.bytes_sent.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record an upstream error
    pub fn record_upstream_error(&self) {
        self.upstream_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        let total = self.total_requests.load(Ordering::Relaxed);
        let successful = self.successful_requests.load(Ordering::Relaxed);
        let failed = self.failed_requests.load(Ordering::Relaxed);
        let total_time_us = self.total_processing_time_us.load(Ordering::Relaxed);

        MetricsSnapshot {
            total_requests: total,
            successful_requests: successful,
            failed_requests: failed,
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bodies_rewritten: self.bodies_rewritten.load(Ordering::Relaxed),
            bodies_unchanged: self.bodies_unchanged.load(Ordering::Relaxed),
            replacements: self.replacements.load(Ordering::Relaxed),
            transform_failures: self.transform_failures.load(Ordering::Relaxed),
            filters_attached: self.filters_attached.load(Ordering::Relaxed),
            upstream_errors: self.upstream_errors.load(Ordering::Relaxed),
            average_processing_time_ms: if total > 0 {
                (total_time_us as f64 / total as f64) / 1000.0
            } else {
                0.0
            },
            success_rate: if total > 0 {
                (successful as f64 / total as f64) * 100.0
            } else {
                0.0
            },
        }
    }
}

/// Snapshot of current metrics, served as JSON by the healthcheck server
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub bodies_rewritten: u64,
    pub bodies_unchanged: u64,
    pub replacements: u64,
    pub transform_failures: u64,
    pub filters_attached: u64,
    pub upstream_errors: u64,
    pub average_processing_time_ms: f64,
    pub success_rate: f64,
}

/// Helper for timing operations
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
