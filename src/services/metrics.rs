use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec, Encoder, TextEncoder};

lazy_static! {
    pub static ref GATEWAY_REQUESTS_COUNTER: CounterVec = register_counter_vec!(
        "client_gateway_requests_total",
        "Backend calls by endpoint and outcome",
        &["endpoint", "outcome"]
    ).unwrap();

    pub static ref DROPPED_FETCHES_COUNTER: CounterVec = register_counter_vec!(
        "client_fetches_dropped_total",
        "List responses discarded instead of applied",
        &["controller", "reason"]
    ).unwrap();

    pub static ref SYNC_PATCHES_COUNTER: CounterVec = register_counter_vec!(
        "client_sync_patches_total",
        "Cross-store patches by target store and outcome",
        &["store", "outcome"]
    ).unwrap();
}

pub fn record_request(endpoint: &str, outcome: &str) {
    GATEWAY_REQUESTS_COUNTER
        .with_label_values(&[endpoint, outcome])
        .inc();
}

pub fn record_dropped(controller: &str, reason: &str) {
    DROPPED_FETCHES_COUNTER
        .with_label_values(&[controller, reason])
        .inc();
}

pub fn record_sync(store: &str, applied: bool) {
    let outcome = if applied { "applied" } else { "skipped" };
    SYNC_PATCHES_COUNTER
        .with_label_values(&[store, outcome])
        .inc();
}

/// Text exposition of every registered metric.
pub fn render() -> String {
    let mut buf = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&prometheus::gather(), &mut buf) {
        tracing::warn!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}
