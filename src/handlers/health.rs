//! Health-check handler.
//!
//! The pass/fail decision is snapshotted by the dispatcher when it builds
//! the handler; see `dispatch` for the `/status_ok` / `/status_fail` side
//! effects and the deliberate asymmetry of `/status_fail`.

use http::StatusCode;

use crate::http::{RequestHead, ResponseHead};
use crate::session::Transaction;

use super::RequestHandler;

pub struct HealthCheckHandler {
    healthy: bool,
    version: String,
}

impl HealthCheckHandler {
    pub fn new(healthy: bool, version: &str) -> Self {
        Self {
            healthy,
            version: version.to_string(),
        }
    }
}

impl RequestHandler for HealthCheckHandler {
    fn on_headers(&mut self, txn: &Transaction, _head: &RequestHead) {
        if self.healthy {
            txn.send_ok_response(&self.version, "OK\n", true);
        } else {
            txn.send_headers(ResponseHead::with_status(
                &self.version,
                StatusCode::SERVICE_UNAVAILABLE,
            ));
            txn.send_body("NOT OK\n");
            txn.send_eom();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Frame;
    use http::Method;

    fn respond(healthy: bool) -> StatusCode {
        let (txn, mut rx) = Transaction::channel();
        let head = RequestHead::new(Method::GET, "/status", "1.1");
        HealthCheckHandler::new(healthy, "1.1").on_headers(&txn, &head);
        match rx.try_recv().unwrap() {
            Frame::Headers(h) => h.status,
            other => panic!("expected headers, got {other:?}"),
        }
    }

    #[test]
    fn healthy_reports_200() {
        assert_eq!(respond(true), StatusCode::OK);
    }

    #[test]
    fn unhealthy_reports_failure_status() {
        assert_eq!(respond(false), StatusCode::SERVICE_UNAVAILABLE);
    }
}
