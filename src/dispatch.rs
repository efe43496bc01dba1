//! Request dispatch: the fixed path → handler decision table.
//!
//! # Responsibilities
//! - Map a request path to a handler variant, first match wins
//! - Hold the process-wide health-check flag mutated by `/status_ok` and
//!   `/status_fail`
//! - Enforce the partial-reliability precondition on `/pr_cat`
//!
//! The table is intentionally small and ordered; this is not a routing
//! DSL. It performs no I/O and holds no per-call state beyond the shared
//! health flag.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::handlers::{
    ContinueHandler, DummyHandler, EchoHandler, HealthCheckHandler, PrCatHandler,
    RandBytesGenHandler, RequestHandler, ServerPushHandler, WaitReleaseHandler,
};
use crate::http::RequestHead;
use crate::observability::metrics;

/// Whether `/status` reports healthy. Written and read from any connection's
/// task; a bare atomic is enough since no other state hangs off it.
static SHOULD_PASS_HEALTH_CHECKS: AtomicBool = AtomicBool::new(true);

/// Partial-reliability facts a connection negotiated, forwarded by the
/// session controller on every handler request.
#[derive(Debug, Clone, Default)]
pub struct PartialReliabilityParams {
    pub enabled: bool,
    pub chunk_size: Option<u64>,
    pub chunk_delay_ms: Option<u64>,
    /// File streamed by `/pr_cat`.
    pub source: PathBuf,
}

pub struct Dispatcher;

impl Dispatcher {
    /// Select the handler for a request. Never fails: unmatched paths and
    /// unmet preconditions degrade to the placeholder handler.
    pub fn select_handler(
        head: &RequestHead,
        version: &str,
        pr_params: Option<&PartialReliabilityParams>,
    ) -> Box<dyn RequestHandler> {
        let path = head.path();

        if path == "/" || path == "/echo" {
            metrics::record_request("echo");
            return Box::new(EchoHandler::new(version));
        }
        if path == "/continue" {
            metrics::record_request("continue");
            return Box::new(ContinueHandler::new(version));
        }
        if path.len() > 1 && path.as_bytes()[1].is_ascii_digit() {
            metrics::record_request("random_bytes");
            return Box::new(RandBytesGenHandler::new(version));
        }
        if path == "/status" {
            metrics::record_request("health");
            return Box::new(HealthCheckHandler::new(
                SHOULD_PASS_HEALTH_CHECKS.load(Ordering::Relaxed),
                version,
            ));
        }
        if path == "/status_ok" {
            metrics::record_request("health");
            SHOULD_PASS_HEALTH_CHECKS.store(true, Ordering::Relaxed);
            return Box::new(HealthCheckHandler::new(true, version));
        }
        if path == "/status_fail" {
            metrics::record_request("health");
            // Deliberate asymmetry: later /status calls report unhealthy,
            // but this response itself still reports healthy.
            SHOULD_PASS_HEALTH_CHECKS.store(false, Ordering::Relaxed);
            return Box::new(HealthCheckHandler::new(true, version));
        }
        if path == "/wait" || path == "/release" {
            metrics::record_request("wait_release");
            return Box::new(WaitReleaseHandler::new(version));
        }
        if path == "/pr_cat" {
            match pr_params {
                Some(pr) if pr.enabled => {
                    metrics::record_request("pr_cat");
                    return Box::new(PrCatHandler::new(
                        version,
                        pr.source.clone(),
                        pr.chunk_size,
                        pr.chunk_delay_ms,
                    ));
                }
                _ => {
                    tracing::error!(
                        "/pr_cat can only be accessed via a partially reliable transaction"
                    );
                }
            }
        }
        if path.starts_with("/push") {
            metrics::record_request("push");
            return Box::new(ServerPushHandler::new(version));
        }

        metrics::record_request("dummy");
        Box::new(DummyHandler::new(version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Frame, Transaction};
    use http::{Method, StatusCode};

    fn head_for(target: &str) -> RequestHead {
        RequestHead::new(Method::GET, target, "1.1")
    }

    fn status_of(target: &str) -> StatusCode {
        let head = head_for(target);
        let mut handler = Dispatcher::select_handler(&head, "1.1", None);
        let (txn, mut rx) = Transaction::channel();
        handler.on_headers(&txn, &head);
        handler.on_eom(&txn);
        loop {
            match rx.try_recv().expect("expected a response frame") {
                Frame::Headers(h) if !h.status.is_informational() => return h.status,
                _ => continue,
            }
        }
    }

    #[test]
    fn status_fail_reports_healthy_but_flips_the_flag() {
        assert_eq!(status_of("/status_fail"), StatusCode::OK);
        assert_eq!(status_of("/status"), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_of("/status_ok"), StatusCode::OK);
        assert_eq!(status_of("/status"), StatusCode::OK);
    }

    #[test]
    fn unknown_paths_fall_through_to_placeholder() {
        assert_eq!(status_of("/nonexistent"), StatusCode::OK);
    }

    #[test]
    fn pr_cat_without_negotiation_degrades_to_placeholder() {
        let params = PartialReliabilityParams::default(); // enabled = false
        let head = head_for("/pr_cat");
        let mut handler = Dispatcher::select_handler(&head, "1.1", Some(&params));
        let (txn, mut rx) = Transaction::channel();
        handler.on_headers(&txn, &head);
        // Placeholder responds on end-of-message, not on headers.
        assert!(rx.try_recv().is_err());
        handler.on_eom(&txn);
        assert!(matches!(rx.try_recv().unwrap(), Frame::Headers(_)));
    }

    #[tokio::test]
    async fn digit_second_char_selects_random_bytes() {
        let head = head_for("/42");
        let mut handler = Dispatcher::select_handler(&head, "1.1", None);
        let (txn, mut rx) = Transaction::channel();
        handler.on_headers(&txn, &head);
        drop(txn);

        let mut total = 0usize;
        while let Some(frame) = rx.recv().await {
            match frame {
                Frame::Body(b) => total += b.len(),
                Frame::Eom => break,
                _ => continue,
            }
        }
        assert_eq!(total, 42);
    }
}
