//! Server-push handler: `/push[/size[/count]]` emits `count` pushed
//! sub-streams, then the response to the original request.
//!
//! The push body is a process-wide cache loaded once at startup from a
//! configured file. A non-zero size segment overwrites the cache with that
//! many filler bytes; the overwrite is visible to later push requests and
//! concurrent overwrites race benignly. Accepted demonstration quirk, not
//! a correctness requirement.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;
use bytes::{BufMut, Bytes, BytesMut};
use http::Method;

use crate::http::{RequestHead, ResponseHead};
use crate::observability::metrics;
use crate::session::Transaction;

use super::RequestHandler;

const PUSHED_BODY_PREFIX: &str = "I AM THE PUSHED RESPONSE AND I AM NOT RESPONSIBLE: ";
const DIRECT_RESPONSE_BODY: &str = "I AM THE REQUEST RESPONSE AND I AM RESPONSIBLE\n";

static PUSH_BODY: OnceLock<ArcSwap<Bytes>> = OnceLock::new();

fn cache() -> &'static ArcSwap<Bytes> {
    PUSH_BODY.get_or_init(|| ArcSwap::from_pointee(Bytes::new()))
}

/// Load the fixed push payload. Called once at startup; a missing file is
/// fatal because the server must not serve push traffic without it.
pub fn load_push_body(path: &Path) -> std::io::Result<()> {
    let data = std::fs::read(path)?;
    tracing::info!(path = %path.display(), bytes = data.len(), "push body loaded");
    cache().store(Arc::new(Bytes::from(data)));
    Ok(())
}

/// Replace the cached push body directly (size overrides, tests).
pub fn set_push_body(body: Bytes) {
    cache().store(Arc::new(body));
}

fn push_body() -> Arc<Bytes> {
    cache().load_full()
}

pub struct ServerPushHandler {
    version: String,
}

impl ServerPushHandler {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
        }
    }

    fn send_push(&self, parent: &Transaction, url: String) {
        let pushed = parent.new_pushed_transaction();
        pushed.send_push_promise(RequestHead::new(Method::GET, url.clone(), self.version.clone()));

        pushed.send_headers(ResponseHead::ok(&self.version));
        let body = push_body();
        let mut response = BytesMut::with_capacity(PUSHED_BODY_PREFIX.len() + body.len());
        response.put_slice(PUSHED_BODY_PREFIX.as_bytes());
        response.put_slice(&body);
        pushed.send_body(response.freeze());
        pushed.send_eom();

        metrics::record_push_stream();
        tracing::debug!(url = %url, "push promise and response sent");
    }
}

impl RequestHandler for ServerPushHandler {
    fn on_headers(&mut self, txn: &Transaction, head: &RequestHead) {
        if head.method != Method::GET {
            tracing::error!(method = %head.method, "method not supported for push");
            txn.send_error_response(&self.version, "bad request\n");
            return;
        }

        // "/push/100/3" → ["", "push", "100", "3"]
        let pieces: Vec<&str> = head.path().split('/').collect();

        if pieces.len() > 2 {
            let response_size = pieces[2].parse::<usize>().unwrap_or(0);
            if response_size != 0 {
                tracing::debug!(response_size, "overriding cached push body");
                set_push_body(Bytes::from(vec![b'a'; response_size]));
            }
        }

        let num_responses = if pieces.len() > 3 {
            pieces[3].parse::<usize>().unwrap_or(1)
        } else {
            1
        };

        for i in 0..num_responses {
            tracing::debug!(i, num_responses, "sending pushed transaction");
            self.send_push(txn, format!("{}/pushed{}", head.target, i));
        }

        txn.send_ok_response(&self.version, DIRECT_RESPONSE_BODY, true);
    }
}
