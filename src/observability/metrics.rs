//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_dispatch_total` (counter): dispatches by method and outcome
//! - `router_dispatch_duration_seconds` (histogram): routing plus handler time
//! - `router_table_routes` (gauge): registrations in the active route table
//!
//! # Design Decisions
//! - Without an installed recorder every call is a no-op
//! - Labels limited to method and outcome (bounded cardinality)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::routing::{Method, Outcome};

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Label for a request method. Methods outside the routable set share `"other"`.
pub fn method_label(method: &str) -> &'static str {
    Method::from_request(method).map_or("other", |m| m.as_str())
}

/// Record one dispatch.
pub fn record_dispatch(method: &str, outcome: &Outcome, start: Instant) {
    let method = method_label(method);
    let outcome = outcome.label();
    metrics::counter!("router_dispatch_total", "method" => method, "outcome" => outcome).increment(1);
    metrics::histogram!("router_dispatch_duration_seconds", "method" => method, "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Record the size of the route table now being served.
pub fn record_table_size(routes: usize) {
    metrics::gauge!("router_table_routes").set(routes as f64);
}
