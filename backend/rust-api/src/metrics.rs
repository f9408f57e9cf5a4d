use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder,
    HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Database Metrics (MongoDB)
    pub static ref DB_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "db_operations_total",
        "Total number of database operations",
        &["operation", "collection", "status"]
    )
    .unwrap();

    pub static ref DB_OPERATION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "db_operation_duration_seconds",
        "Database operation duration in seconds",
        &["operation", "collection"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .unwrap();

    // Assessment Metrics
    pub static ref ATTEMPTS_RECORDED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "assessment_attempts_recorded_total",
        "Total number of level attempts written to the ledger",
        &["level", "outcome"]
    )
    .unwrap();

    pub static ref ATTEMPTS_REJECTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "assessment_attempts_rejected_total",
        "Total number of level entries or submissions refused by the gate",
        &["reason"]
    )
    .unwrap();

    pub static ref BADGES_AWARDED_TOTAL: IntCounter = register_int_counter!(
        "assessment_badges_awarded_total",
        "Total number of badges granted to candidates"
    )
    .unwrap();

    pub static ref BADGE_AGGREGATION_FAILURES_TOTAL: IntCounter = register_int_counter!(
        "assessment_badge_aggregation_failures_total",
        "Final-level submissions whose badge could not be written after retries"
    )
    .unwrap();

    // HR credit Metrics
    pub static ref HR_VIEWS_CONSUMED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "hr_views_consumed_total",
        "Total number of candidate profile views granted to recruiters",
        &["plan"]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

/// Helper: track database operation with metrics
pub async fn track_db_operation<F, T>(
    operation: &str,
    collection: &str,
    future: F,
) -> Result<T, anyhow::Error>
where
    F: std::future::Future<Output = Result<T, anyhow::Error>>,
{
    let start = std::time::Instant::now();
    let result = future.await;
    let duration = start.elapsed().as_secs_f64();

    let status = if result.is_ok() { "success" } else { "error" };

    DB_OPERATIONS_TOTAL
        .with_label_values(&[operation, collection, status])
        .inc();

    DB_OPERATION_DURATION_SECONDS
        .with_label_values(&[operation, collection])
        .observe(duration);

    result
}

pub fn record_attempt(level: u32, passed: bool) {
    let level = level.to_string();
    let outcome = if passed { "passed" } else { "failed" };
    ATTEMPTS_RECORDED_TOTAL
        .with_label_values(&[level.as_str(), outcome])
        .inc();
}

pub fn record_rejection(reason: &str) {
    ATTEMPTS_REJECTED_TOTAL.with_label_values(&[reason]).inc();
}
