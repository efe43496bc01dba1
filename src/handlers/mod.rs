//! Request handlers.
//!
//! One handler is bound to each transaction for its lifetime and receives
//! the transaction's events: headers, body chunks, end-of-message, error.
//! Event methods are synchronous; handlers that stream large or delayed
//! bodies spawn a task holding a cloned [`Transaction`] handle.
//!
//! Malformed requests are handled locally with a 4xx response and never
//! surface as faults to the session layer.

pub mod dummy;
pub mod echo;
pub mod health;
pub mod interim;
pub mod pr_cat;
pub mod push;
pub mod random_bytes;
pub mod wait_release;

use bytes::Bytes;

use crate::http::RequestHead;
use crate::session::{Transaction, TransactionError};

pub use dummy::DummyHandler;
pub use echo::EchoHandler;
pub use health::HealthCheckHandler;
pub use interim::ContinueHandler;
pub use pr_cat::PrCatHandler;
pub use push::ServerPushHandler;
pub use random_bytes::RandBytesGenHandler;
pub use wait_release::WaitReleaseHandler;

/// Event interface of a handler bound to one transaction.
pub trait RequestHandler: Send {
    /// Request head received. For bodyless requests this is where most
    /// handlers produce their whole response.
    fn on_headers(&mut self, txn: &Transaction, head: &RequestHead);

    /// A chunk of request body.
    fn on_body(&mut self, _txn: &Transaction, _chunk: Bytes) {}

    /// The request is complete.
    fn on_eom(&mut self, _txn: &Transaction) {}

    /// The transaction failed (peer reset, idle timeout, write error). No
    /// response can be sent; handlers use this for diagnostics only.
    fn on_error(&mut self, err: &TransactionError) {
        tracing::debug!(error = %err, "transaction error");
    }
}
