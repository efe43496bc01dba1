//! Session controller: bridges one transport connection to one HTTP
//! session.
//!
//! # Responsibilities
//! - Supply a handler for each new transaction via the dispatcher
//! - Forward the connection's partial-reliability negotiation to it
//! - Own the optional per-connection event log and flush it as the very
//!   last teardown action
//!
//! Parse errors and transaction timeouts deliberately get no custom
//! handler; the session stack's default behavior applies.

use serde_json::json;

use crate::dispatch::{Dispatcher, PartialReliabilityParams};
use crate::handlers::RequestHandler;
use crate::http::RequestHead;
use crate::net::ConnectionId;
use crate::qlog::QlogHandle;

pub struct SessionController {
    conn_id: ConnectionId,
    version: String,
    pr_params: PartialReliabilityParams,
    qlogger: Option<QlogHandle>,
}

impl SessionController {
    pub fn new(conn_id: ConnectionId, version: &str, pr_params: PartialReliabilityParams) -> Self {
        Self {
            conn_id,
            version: version.to_string(),
            pr_params,
            qlogger: None,
        }
    }

    /// Attach a per-connection event log; flushed at teardown.
    pub fn set_qlogger(&mut self, qlogger: QlogHandle) {
        self.qlogger = Some(qlogger);
    }

    pub fn conn_id(&self) -> ConnectionId {
        self.conn_id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Handler for a new transaction.
    pub fn request_handler(&self, head: &RequestHead) -> Box<dyn RequestHandler> {
        self.record_event(
            "transaction",
            json!({ "method": head.method.as_str(), "target": head.target }),
        );
        Dispatcher::select_handler(head, &self.version, Some(&self.pr_params))
    }

    /// No custom handler for unparsable requests; session default applies.
    pub fn parse_error_handler(&self) -> Option<Box<dyn RequestHandler>> {
        None
    }

    /// No custom handler for timed-out transactions either.
    pub fn transaction_timeout_handler(&self) -> Option<Box<dyn RequestHandler>> {
        None
    }

    pub fn record_event(&self, name: &'static str, data: serde_json::Value) {
        if let Some(qlogger) = &self.qlogger {
            qlogger.record(name, data);
        }
    }
}

impl Drop for SessionController {
    /// Session teardown. Flushing the event log is the last thing this
    /// controller ever does.
    fn drop(&mut self) {
        if let Some(qlogger) = self.qlogger.take() {
            match qlogger.flush() {
                Ok(path) => {
                    tracing::info!(conn = %self.conn_id, path = %path.display(), "qlog written")
                }
                Err(e) => {
                    tracing::warn!(conn = %self.conn_id, error = %e, "failed to write qlog")
                }
            }
        }
    }
}
