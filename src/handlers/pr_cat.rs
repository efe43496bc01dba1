//! Partially-reliable cat handler: streams a configured source file in
//! fixed-size chunks with an optional inter-chunk delay.
//!
//! Only reachable when the connection negotiated partial reliability; the
//! dispatcher enforces that precondition.

use std::path::PathBuf;
use std::time::Duration;

use http::{Method, StatusCode};

use crate::http::{RequestHead, ResponseHead};
use crate::session::Transaction;

use super::RequestHandler;

const DEFAULT_CHUNK_SIZE: u64 = 16 * 1024;

pub struct PrCatHandler {
    version: String,
    source: PathBuf,
    chunk_size: u64,
    chunk_delay: Duration,
}

impl PrCatHandler {
    pub fn new(
        version: &str,
        source: PathBuf,
        chunk_size: Option<u64>,
        chunk_delay_ms: Option<u64>,
    ) -> Self {
        Self {
            version: version.to_string(),
            source,
            chunk_size: chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE).max(1),
            chunk_delay: Duration::from_millis(chunk_delay_ms.unwrap_or(0)),
        }
    }
}

impl RequestHandler for PrCatHandler {
    fn on_headers(&mut self, txn: &Transaction, head: &RequestHead) {
        if head.method != Method::GET {
            txn.send_error_response(&self.version, "bad request\n");
            return;
        }

        let txn = txn.clone();
        let version = self.version.clone();
        let source = self.source.clone();
        let chunk_size = self.chunk_size as usize;
        let chunk_delay = self.chunk_delay;
        tokio::spawn(async move {
            let data = match tokio::fs::read(&source).await {
                Ok(data) => data,
                Err(e) => {
                    tracing::error!(path = %source.display(), error = %e, "cannot read pr_cat source");
                    txn.send_headers(ResponseHead::with_status(
                        &version,
                        StatusCode::INTERNAL_SERVER_ERROR,
                    ));
                    txn.send_body("cannot open source file\n");
                    txn.send_eom();
                    return;
                }
            };

            txn.send_headers(ResponseHead::ok(&version));
            for chunk in data.chunks(chunk_size) {
                txn.send_body(chunk.to_vec());
                if !chunk_delay.is_zero() {
                    tokio::time::sleep(chunk_delay).await;
                }
            }
            txn.send_eom();
        });
    }
}
