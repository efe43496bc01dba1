//! No-op placeholder handler for unrecognized paths.

use crate::http::RequestHead;
use crate::session::Transaction;

use super::RequestHandler;

const PLACEHOLDER_BODY: &str = "you have reached the demo server; nothing is served here\n";

pub struct DummyHandler {
    version: String,
}

impl DummyHandler {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
        }
    }
}

impl RequestHandler for DummyHandler {
    fn on_headers(&mut self, _txn: &Transaction, _head: &RequestHead) {}

    fn on_eom(&mut self, txn: &Transaction) {
        txn.send_ok_response(&self.version, PLACEHOLDER_BODY, true);
    }
}
