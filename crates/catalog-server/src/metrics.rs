use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, Encoder, Histogram,
    HistogramVec, IntCounterVec, TextEncoder,
};

pub static OPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!("catalog_ops_total", "Completed catalog operations", &["op"])
        .unwrap()
});

pub static OP_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "catalog_op_duration_seconds",
        "Catalog operation latency",
        &["op"]
    )
    .unwrap()
});

pub static QUERY_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "catalog_query_failures_total",
        "Store failures by operation",
        &["op"]
    )
    .unwrap()
});

pub static PLANNER_MICROS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "catalog_planner_micros",
        "Pipeline planning time (µs)",
        vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 1000.0]
    )
    .unwrap()
});

/// Text exposition of the default registry.
pub fn render() -> String {
    let mut buf = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buf) {
        tracing::warn!("metrics encode failed: {}", e);
    }
    String::from_utf8(buf).unwrap_or_default()
}
