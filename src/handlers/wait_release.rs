//! Wait/release handler: a park-and-release rendezvous between two
//! independently arriving requests.
//!
//! `/wait?id=N` parks its transaction (non-final "waiting" response) until
//! a `/release?id=N` arrives on any connection; the releaser completes the
//! waiter and then itself. A parked handler that is torn down before being
//! released removes its own registry entry so a later release can never
//! target a dead transaction.

use std::time::Duration;

use http::Method;

use crate::http::RequestHead;
use crate::rendezvous::RendezvousRegistry;
use crate::session::Transaction;

use super::RequestHandler;

/// Parked transactions may legitimately sit idle until released.
const WAIT_IDLE_TIMEOUT: Duration = Duration::from_secs(120);

pub struct WaitReleaseHandler {
    version: String,
    registry: &'static RendezvousRegistry,
    /// Set once this handler owns a registry entry: (id, generation token).
    registered: Option<(u64, u64)>,
}

impl WaitReleaseHandler {
    pub fn new(version: &str) -> Self {
        Self::with_registry(version, RendezvousRegistry::global())
    }

    /// Unit tests use a private registry to stay isolated.
    pub fn with_registry(version: &str, registry: &'static RendezvousRegistry) -> Self {
        Self {
            version: version.to_string(),
            registry,
            registered: None,
        }
    }
}

impl RequestHandler for WaitReleaseHandler {
    fn on_headers(&mut self, txn: &Transaction, head: &RequestHead) {
        let path = head.path();
        let id_param = head.query_param("id");

        if head.method != Method::GET
            || id_param.is_none()
            || (path != "/wait" && path != "/release")
        {
            txn.send_error_response(&self.version, "bad request\n");
            return;
        }

        let id = match id_param.and_then(|v| v.parse::<u64>().ok()) {
            Some(id) if id > 0 => id,
            _ => {
                txn.send_error_response(&self.version, "invalid id\n");
                return;
            }
        };

        txn.set_idle_timeout(WAIT_IDLE_TIMEOUT);

        if path == "/wait" {
            match self.registry.register(id, txn.clone()) {
                Ok(token) => {
                    self.registered = Some((id, token));
                    // Non-final: end-of-message arrives when released.
                    txn.send_ok_response(&self.version, "waiting\n", false);
                }
                Err(_) => {
                    tracing::debug!(id, "duplicate wait id rejected");
                    txn.send_error_response(&self.version, "id already exists\n");
                }
            }
        } else if self.registry.release(id) {
            txn.send_ok_response(&self.version, "released\n", true);
        } else {
            tracing::debug!(id, "release for unknown id rejected");
            txn.send_error_response(&self.version, "id does not exist\n");
        }
    }
}

impl Drop for WaitReleaseHandler {
    fn drop(&mut self) {
        // Teardown without release (connection dropped, idle timeout):
        // erase the entry so no future release dereferences this handler.
        if let Some((id, token)) = self.registered.take() {
            self.registry.cleanup(id, token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Frame;
    use http::StatusCode;

    fn leaked_registry() -> &'static RendezvousRegistry {
        Box::leak(Box::new(RendezvousRegistry::new()))
    }

    fn first_status(rx: &mut tokio::sync::mpsc::UnboundedReceiver<Frame>) -> StatusCode {
        loop {
            match rx.try_recv().expect("expected a frame") {
                Frame::Headers(h) => return h.status,
                Frame::IdleTimeout(_) => continue,
                other => panic!("expected headers, got {other:?}"),
            }
        }
    }

    #[test]
    fn wait_requires_get_with_valid_id() {
        let registry = leaked_registry();

        let (txn, mut rx) = Transaction::channel();
        let head = RequestHead::new(Method::POST, "/wait?id=1", "1.1");
        WaitReleaseHandler::with_registry("1.1", registry).on_headers(&txn, &head);
        assert_eq!(first_status(&mut rx), StatusCode::BAD_REQUEST);

        let (txn, mut rx) = Transaction::channel();
        let head = RequestHead::new(Method::GET, "/wait?id=0", "1.1");
        WaitReleaseHandler::with_registry("1.1", registry).on_headers(&txn, &head);
        assert_eq!(first_status(&mut rx), StatusCode::BAD_REQUEST);

        let (txn, mut rx) = Transaction::channel();
        let head = RequestHead::new(Method::GET, "/wait", "1.1");
        WaitReleaseHandler::with_registry("1.1", registry).on_headers(&txn, &head);
        assert_eq!(first_status(&mut rx), StatusCode::BAD_REQUEST);

        assert!(!registry.contains(0));
        assert!(!registry.contains(1));
    }

    #[test]
    fn wait_extends_idle_timeout_and_parks() {
        let registry = leaked_registry();
        let (txn, mut rx) = Transaction::channel();
        let head = RequestHead::new(Method::GET, "/wait?id=11", "1.1");
        let mut handler = WaitReleaseHandler::with_registry("1.1", registry);
        handler.on_headers(&txn, &head);

        match rx.try_recv().unwrap() {
            Frame::IdleTimeout(d) => assert_eq!(d, WAIT_IDLE_TIMEOUT),
            other => panic!("expected idle timeout, got {other:?}"),
        }
        match rx.try_recv().unwrap() {
            Frame::Headers(h) => assert_eq!(h.status, StatusCode::OK),
            other => panic!("expected headers, got {other:?}"),
        }
        match rx.try_recv().unwrap() {
            Frame::Body(b) => assert_eq!(&b[..], b"waiting\n"),
            other => panic!("expected body, got {other:?}"),
        }
        // Parked: no end-of-message yet.
        assert!(rx.try_recv().is_err());
        assert!(registry.contains(11));
    }

    #[test]
    fn drop_before_release_cleans_registry_entry() {
        let registry = leaked_registry();
        let (txn, _rx) = Transaction::channel();
        let head = RequestHead::new(Method::GET, "/wait?id=21", "1.1");
        let mut handler = WaitReleaseHandler::with_registry("1.1", registry);
        handler.on_headers(&txn, &head);
        assert!(registry.contains(21));

        drop(handler);
        assert!(!registry.contains(21));

        // The subsequent release behaves as "does not exist".
        let (txn, mut rx) = Transaction::channel();
        let head = RequestHead::new(Method::GET, "/release?id=21", "1.1");
        WaitReleaseHandler::with_registry("1.1", registry).on_headers(&txn, &head);
        assert_eq!(first_status(&mut rx), StatusCode::BAD_REQUEST);
    }
}
