//! Random-bytes handler: `/<N>` answers with an N-byte random body.
//!
//! The body is streamed from a spawned task in fixed-size chunks so a large
//! N never sits in memory at once.

use rand::RngCore;

use crate::http::{RequestHead, ResponseHead};
use crate::session::Transaction;

use super::RequestHandler;

/// Largest body a client may request.
const MAX_LENGTH: u64 = 1 << 30;
const CHUNK_SIZE: usize = 4096;

pub struct RandBytesGenHandler {
    version: String,
}

impl RandBytesGenHandler {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
        }
    }
}

impl RequestHandler for RandBytesGenHandler {
    fn on_headers(&mut self, txn: &Transaction, head: &RequestHead) {
        let requested = head.path()[1..].parse::<u64>();
        let length = match requested {
            Ok(n) if n <= MAX_LENGTH => n,
            Ok(n) => {
                tracing::warn!(requested = n, max = MAX_LENGTH, "random byte count too large");
                txn.send_error_response(&self.version, "requested length too large\n");
                return;
            }
            Err(_) => {
                txn.send_error_response(&self.version, "invalid length\n");
                return;
            }
        };

        tracing::debug!(length, "generating random bytes");
        let txn = txn.clone();
        let version = self.version.clone();
        tokio::spawn(async move {
            txn.send_headers(ResponseHead::ok(&version).header("content-type", "application/octet-stream"));
            let mut remaining = length as usize;
            let mut chunk = [0u8; CHUNK_SIZE];
            while remaining > 0 {
                let n = remaining.min(CHUNK_SIZE);
                rand::thread_rng().fill_bytes(&mut chunk[..n]);
                txn.send_body(chunk[..n].to_vec());
                remaining -= n;
                // Let the driver drain between chunks.
                tokio::task::yield_now().await;
            }
            txn.send_eom();
        });
    }
}
