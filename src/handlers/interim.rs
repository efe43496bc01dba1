//! Continue handler: demonstrates the 100-continue interim-response flow,
//! then behaves exactly like echo.

use bytes::Bytes;
use http::StatusCode;

use crate::http::{RequestHead, ResponseHead};
use crate::session::Transaction;

use super::{EchoHandler, RequestHandler};

pub struct ContinueHandler {
    version: String,
    echo: EchoHandler,
}

impl ContinueHandler {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            echo: EchoHandler::new(version),
        }
    }
}

impl RequestHandler for ContinueHandler {
    fn on_headers(&mut self, txn: &Transaction, head: &RequestHead) {
        if head.expects_continue() {
            txn.send_headers(ResponseHead::with_status(&self.version, StatusCode::CONTINUE));
        }
        self.echo.on_headers(txn, head);
    }

    fn on_body(&mut self, txn: &Transaction, chunk: Bytes) {
        self.echo.on_body(txn, chunk);
    }

    fn on_eom(&mut self, txn: &Transaction) {
        self.echo.on_eom(txn);
    }
}
