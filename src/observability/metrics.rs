//! Client-side metrics.
//!
//! # Metrics
//! - `rest_requests_total` (counter): responses by method, status, endpoint
//! - `rest_request_duration_seconds` (histogram): latency per attempt
//! - `rest_endpoint_failures_total` (counter): rotated-away attempts by endpoint, kind
//! - `job_polls_total` (counter): completion polls by resulting status

use std::sync::Once;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};

static METRICS_INIT: Once = Once::new();

/// Register metric descriptions with the installed recorder.
pub fn init() {
    METRICS_INIT.call_once(|| {
        describe_counter!("rest_requests_total", "Responses received from the service");
        describe_histogram!(
            "rest_request_duration_seconds",
            "Duration of a single endpoint attempt in seconds"
        );
        describe_counter!(
            "rest_endpoint_failures_total",
            "Endpoint attempts that caused a rotation to the next endpoint"
        );
        describe_counter!("job_polls_total", "Polls issued while waiting for a job");
    });
}

/// Record a response received from `endpoint`.
pub fn record_request(method: &str, status: u16, endpoint: &str, started: Instant) {
    counter!(
        "rest_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "endpoint" => endpoint.to_string()
    )
    .increment(1);
    histogram!(
        "rest_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => endpoint.to_string()
    )
    .record(started.elapsed().as_secs_f64());
}

/// Record an attempt that failed over to the next endpoint.
pub fn record_endpoint_failure(endpoint: &str, kind: &'static str) {
    counter!(
        "rest_endpoint_failures_total",
        "endpoint" => endpoint.to_string(),
        "kind" => kind
    )
    .increment(1);
}

/// Record one completion poll.
pub fn record_poll(status: &str) {
    counter!("job_polls_total", "status" => status.to_string()).increment(1);
}
