//! Echo handler: mirrors the request back as the response.

use bytes::Bytes;

use crate::http::{RequestHead, ResponseHead};
use crate::session::Transaction;

use super::RequestHandler;

pub struct EchoHandler {
    version: String,
}

impl EchoHandler {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
        }
    }
}

impl RequestHandler for EchoHandler {
    fn on_headers(&mut self, txn: &Transaction, head: &RequestHead) {
        txn.send_headers(
            ResponseHead::ok(&self.version).header("x-echo-method", head.method.as_str()),
        );
    }

    fn on_body(&mut self, txn: &Transaction, chunk: Bytes) {
        txn.send_body(chunk);
    }

    fn on_eom(&mut self, txn: &Transaction) {
        txn.send_eom();
    }
}
