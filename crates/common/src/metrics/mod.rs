//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with stage-aligned histograms
//! and standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all DraftForge metrics
pub const METRICS_PREFIX: &str = "draftforge";

/// Histogram buckets for HTTP request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001, // 1ms
    0.005, // 5ms
    0.010, // 10ms
    0.025, // 25ms
    0.050, // 50ms
    0.100, // 100ms
    0.250, // 250ms
    0.500, // 500ms
    1.000, // 1s
    2.500, // 2.5s
    5.000, // 5s
];

/// Buckets for stage durations; stages run seconds to tens of minutes
pub const STAGE_BUCKETS: &[f64] = &[
    1.0,    // 1s
    5.0,    // 5s
    15.0,   // 15s
    30.0,   // 30s
    60.0,   // 1m
    120.0,  // 2m
    300.0,  // 5m
    600.0,  // 10m
    900.0,  // 15m
    1800.0, // 30m
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Draft metrics
    describe_counter!(
        format!("{}_drafts_created_total", METRICS_PREFIX),
        Unit::Count,
        "Total drafts created"
    );

    describe_counter!(
        format!("{}_drafts_completed_total", METRICS_PREFIX),
        Unit::Count,
        "Total drafts that reached COMPLETED"
    );

    // Stage metrics
    describe_counter!(
        format!("{}_stage_jobs_total", METRICS_PREFIX),
        Unit::Count,
        "Total stage jobs processed"
    );

    describe_histogram!(
        format!("{}_stage_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Stage job duration in seconds"
    );

    // Generation metrics
    describe_counter!(
        format!("{}_generation_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total text-generation API requests"
    );

    describe_histogram!(
        format!("{}_generation_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Text-generation latency in seconds"
    );

    describe_counter!(
        format!("{}_sections_generated_total", METRICS_PREFIX),
        Unit::Count,
        "Total article sections generated"
    );

    // Research & scrape metrics
    describe_counter!(
        format!("{}_research_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total research provider requests"
    );

    describe_counter!(
        format!("{}_pages_scraped_total", METRICS_PREFIX),
        Unit::Count,
        "Total competitor pages scraped"
    );

    // Queue metrics
    describe_counter!(
        format!("{}_queue_messages_processed_total", METRICS_PREFIX),
        Unit::Count,
        "Total queue messages processed"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record a processed stage job
pub fn record_stage_job(stage: &str, duration_secs: f64, outcome: &str) {
    counter!(
        format!("{}_stage_jobs_total", METRICS_PREFIX),
        "stage" => stage.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_stage_duration_seconds", METRICS_PREFIX),
        "stage" => stage.to_string()
    )
    .record(duration_secs);
}

/// Helper to record a text-generation call
pub fn record_generation(kind: &str, duration_secs: f64, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_generation_requests_total", METRICS_PREFIX),
        "kind" => kind.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if success {
        histogram!(
            format!("{}_generation_duration_seconds", METRICS_PREFIX),
            "kind" => kind.to_string()
        )
        .record(duration_secs);
    }
}

/// Helper to record a generated section
pub fn record_section(kind: &str) {
    counter!(
        format!("{}_sections_generated_total", METRICS_PREFIX),
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Helper to record a research provider call
pub fn record_research(endpoint: &str, success: bool) {
    let status = if success { "success" } else { "error" };
    counter!(
        format!("{}_research_requests_total", METRICS_PREFIX),
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Helper to record scraped competitor pages
pub fn record_pages_scraped(count: usize) {
    counter!(format!("{}_pages_scraped_total", METRICS_PREFIX)).increment(count as u64);
}

/// Helper to record drafts entering/leaving the pipeline
pub fn record_draft_created() {
    counter!(format!("{}_drafts_created_total", METRICS_PREFIX)).increment(1);
}

pub fn record_draft_completed() {
    counter!(format!("{}_drafts_completed_total", METRICS_PREFIX)).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in STAGE_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
        // Stage leases (10m/5m/15m) should fall inside the bucket range
        assert!(STAGE_BUCKETS.contains(&600.0));
        assert!(STAGE_BUCKETS.contains(&900.0));
    }

    #[test]
    fn test_request_metrics() {
        let metrics = RequestMetrics::start("POST", "/api/drafts");
        std::thread::sleep(std::time::Duration::from_millis(10));
        metrics.finish(201);
        // Just verify it runs without panic
    }
}
