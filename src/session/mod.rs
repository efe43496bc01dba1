//! Session layer: one HTTP session per transport connection.
//!
//! # Data flow
//! ```text
//! quinn::Connection
//!     → run_session: accept bidirectional streams
//!     → drive_transaction (one task per stream):
//!         parse head → controller picks handler → pump events
//!         drain handler frames back onto the stream
//!     → drive_pushed_stream: handler-created push frames onto a
//!       server-opened unidirectional stream
//! ```
//!
//! All handler logic for a transaction runs on its driver task; the only
//! cross-task traffic is frame enqueues.

pub mod controller;
pub mod transaction;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde_json::json;
use thiserror::Error;
use tokio::time::Instant;

use crate::http::codec::{self, CodecError, MAX_HEAD_BYTES};
use crate::http::ResponseHead;

pub use controller::SessionController;
pub use transaction::{Frame, PushedStream, Transaction};

/// Size cap for a single body read.
const RECV_CHUNK: usize = 16 * 1024;

/// Why a transaction was torn down without completing normally.
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("transaction idle timeout")]
    IdleTimeout,
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("connection error: {0}")]
    Connection(String),
}

/// Run one session until its connection goes away. The controller's
/// teardown (qlog flush) fires when the last transaction task releases it.
pub async fn run_session(
    connection: quinn::Connection,
    controller: SessionController,
    txn_idle_timeout: Duration,
) {
    let controller = Arc::new(controller);
    controller.record_event(
        "connection_started",
        json!({ "peer": connection.remote_address().to_string() }),
    );

    loop {
        match connection.accept_bi().await {
            Ok((send, recv)) => {
                tokio::spawn(drive_transaction(
                    connection.clone(),
                    send,
                    recv,
                    Arc::clone(&controller),
                    txn_idle_timeout,
                ));
            }
            Err(e) => {
                tracing::debug!(conn = %controller.conn_id(), reason = %e, "session ended");
                controller.record_event("connection_closed", json!({ "reason": e.to_string() }));
                break;
            }
        }
    }
}

/// Drive one transaction: parse the request head, hand events to the
/// handler, and drain its frames back onto the stream.
async fn drive_transaction(
    connection: quinn::Connection,
    mut send: quinn::SendStream,
    mut recv: quinn::RecvStream,
    controller: Arc<SessionController>,
    idle_timeout: Duration,
) {
    let mut buf: Vec<u8> = Vec::new();
    let head = loop {
        match codec::parse_request_head(&buf) {
            Ok(Some((head, consumed))) => {
                buf.drain(..consumed);
                break head;
            }
            Ok(None) => {}
            Err(e) => {
                reject_unparsable(&controller, &mut send, &e).await;
                return;
            }
        }
        let read = tokio::time::timeout(idle_timeout, recv.read_chunk(MAX_HEAD_BYTES, true)).await;
        match read {
            Ok(Ok(Some(chunk))) => buf.extend_from_slice(&chunk.bytes),
            Ok(Ok(None)) => {
                // Stream finished before the head completed.
                reject_unparsable(&controller, &mut send, &CodecError::BadRequestLine).await;
                return;
            }
            Ok(Err(e)) => {
                tracing::debug!(conn = %controller.conn_id(), error = %e, "request read failed");
                return;
            }
            Err(_) => {
                tracing::debug!(conn = %controller.conn_id(), "request head timed out");
                return;
            }
        }
    };

    let (txn, mut frames) = Transaction::channel();
    let mut handler = controller.request_handler(&head);
    handler.on_headers(&txn, &head);
    if !buf.is_empty() {
        handler.on_body(&txn, Bytes::from(std::mem::take(&mut buf)));
    }

    let mut idle = idle_timeout;
    let mut deadline = Instant::now() + idle;
    let mut body_done = false;
    let mut result: Result<(), TransactionError> = Ok(());

    loop {
        tokio::select! {
            frame = frames.recv() => {
                match frame {
                    Some(Frame::Headers(h)) => {
                        if let Err(e) = send.write_all(&codec::write_response_head(&h)).await {
                            result = Err(TransactionError::Connection(e.to_string()));
                            break;
                        }
                    }
                    Some(Frame::Body(b)) => {
                        if let Err(e) = send.write_all(&b).await {
                            result = Err(TransactionError::Connection(e.to_string()));
                            break;
                        }
                    }
                    Some(Frame::Eom) => {
                        let _ = send.finish();
                        break;
                    }
                    Some(Frame::IdleTimeout(d)) => idle = d,
                    Some(Frame::Push(stream)) => {
                        tokio::spawn(drive_pushed_stream(connection.clone(), stream));
                    }
                    // Promises only mean something on pushed streams.
                    Some(Frame::PushPromise(_)) => {}
                    // Every sender gone without an end-of-message.
                    None => break,
                }
                deadline = Instant::now() + idle;
            }
            chunk = recv.read_chunk(RECV_CHUNK, true), if !body_done => {
                match chunk {
                    Ok(Some(c)) => handler.on_body(&txn, c.bytes),
                    Ok(None) => {
                        body_done = true;
                        handler.on_eom(&txn);
                    }
                    Err(e) => {
                        result = Err(TransactionError::Connection(e.to_string()));
                        break;
                    }
                }
                deadline = Instant::now() + idle;
            }
            _ = tokio::time::sleep_until(deadline) => {
                result = Err(TransactionError::IdleTimeout);
                break;
            }
        }
    }

    if let Err(e) = result {
        controller.record_event("transaction_error", json!({ "error": e.to_string() }));
        handler.on_error(&e);
    }
}

/// Session-default treatment of an unparsable request: the controller
/// supplies no custom handler, so answer with a bare 400 and stop.
async fn reject_unparsable(
    controller: &SessionController,
    send: &mut quinn::SendStream,
    error: &CodecError,
) {
    debug_assert!(controller.parse_error_handler().is_none());
    tracing::debug!(conn = %controller.conn_id(), error = %error, "unparsable request");
    controller.record_event("parse_error", json!({ "error": error.to_string() }));
    let head = ResponseHead::error(controller.version());
    let _ = send.write_all(&codec::write_response_head(&head)).await;
    let _ = send.finish();
}

/// Drain a pushed transaction's frames onto a fresh unidirectional stream.
async fn drive_pushed_stream(connection: quinn::Connection, mut stream: PushedStream) {
    let mut send = match connection.open_uni().await {
        Ok(send) => send,
        Err(e) => {
            tracing::debug!(error = %e, "cannot open push stream");
            return;
        }
    };

    while let Some(frame) = stream.frames.recv().await {
        let written = match frame {
            Frame::PushPromise(p) => send.write_all(&codec::write_push_promise(&p)).await,
            Frame::Headers(h) => send.write_all(&codec::write_response_head(&h)).await,
            Frame::Body(b) => send.write_all(&b).await,
            Frame::Eom => {
                let _ = send.finish();
                return;
            }
            Frame::IdleTimeout(_) | Frame::Push(_) => Ok(()),
        };
        if let Err(e) = written {
            tracing::debug!(error = %e, "push stream write failed");
            return;
        }
    }
}
