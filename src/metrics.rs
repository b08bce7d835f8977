// Metrics and observability module
// This file handles collection and export of request and network
// metrics for the resolver
//
// Numan Thabit 2025 Nov

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_gauge, CounterVec, HistogramVec,
    IntGauge, TextEncoder,
};

pub static ROUTE_REQUESTS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "resolver_requests_total",
        "requests by endpoint and outcome",
        &["endpoint", "outcome"]
    )
    .unwrap()
});

pub static ROUTE_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "resolver_request_latency_seconds",
        "latency of resolver endpoints",
        &["endpoint"]
    )
    .unwrap()
});

pub static NETWORK_NODES: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("resolver_network_nodes", "nodes in the loaded road network").unwrap()
});

pub static NETWORK_EDGES: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "resolver_network_edges",
        "directed edges in the loaded road network"
    )
    .unwrap()
});

/// Render the default registry in the Prometheus text format
pub fn render() -> String {
    TextEncoder::new()
        .encode_to_string(&prometheus::gather())
        .unwrap_or_else(|e| format!("# metrics encoding failed: {e}\n"))
}
