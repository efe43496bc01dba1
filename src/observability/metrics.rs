//! Metric definitions.
//!
//! # Metrics
//! - `hq_requests_total` (counter): requests by handler kind
//! - `hq_pushed_streams_total` (counter): server-initiated push streams
//! - `hq_connections_total` (counter): accepted QUIC connections
//! - `hq_connections_rejected_total` (counter): connections refused while draining

/// Count one dispatched request, labeled by the handler that served it.
pub fn record_request(handler: &'static str) {
    metrics::counter!("hq_requests_total", "handler" => handler).increment(1);
}

/// Count one server-initiated push stream.
pub fn record_push_stream() {
    metrics::counter!("hq_pushed_streams_total").increment(1);
}

/// Count one accepted connection.
pub fn record_connection() {
    metrics::counter!("hq_connections_total").increment(1);
}

/// Count one connection refused because the server is draining.
pub fn record_connection_rejected() {
    metrics::counter!("hq_connections_rejected_total").increment(1);
}
