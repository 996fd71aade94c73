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

    // Quiz pool
    pub static ref QUIZ_MUTATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "quiz_mutations_total",
        "Total number of quiz mutations by operation and outcome",
        &["operation", "status"]
    )
    .unwrap();

    pub static ref SESSION_SELECTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "quiz_session_selections_total",
        "Total number of session selections by pooling mode",
        &["pooling_mode"]
    )
    .unwrap();

    // Generation
    pub static ref GENERATION_RUNS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "quiz_generation_runs_total",
        "Total number of background generation runs",
        &["status"]
    )
    .unwrap();

    pub static ref GENERATED_QUESTIONS_TOTAL: IntCounter = register_int_counter!(
        "quiz_generated_questions_total",
        "Total number of generated questions admitted to a pool"
    )
    .unwrap();

    pub static ref GENERATION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "quiz_generation_duration_seconds",
        "Duration of calls to the generation endpoint in seconds",
        &["status"],
        vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]
    )
    .unwrap();

    // Events
    pub static ref EVENTS_PUBLISHED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "quiz_events_published_total",
        "Total number of outbound events by topic and outcome",
        &["topic", "status"]
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

/// Counts one quiz mutation under `operation`, labelled by its outcome.
pub fn record_mutation<T, E>(operation: &str, result: &Result<T, E>) {
    let status = if result.is_ok() { "success" } else { "error" };
    QUIZ_MUTATIONS_TOTAL
        .with_label_values(&[operation, status])
        .inc();
}
