//! Transaction handles and frames.
//!
//! A transaction is one request/response exchange on one stream. The
//! handler's view of it is a cheap clonable [`Transaction`] whose send
//! operations are synchronous enqueues onto an unbounded frame channel;
//! the stream's driver task drains the channel and performs all I/O. This
//! keeps handler event methods synchronous, so the rendezvous registry can
//! complete a parked transaction from any task while holding its mutex
//! without ever awaiting.

use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::http::{RequestHead, ResponseHead};

/// One unit of output from a handler, consumed by a stream driver.
#[derive(Debug)]
pub enum Frame {
    /// Response head. Informational (1xx) heads may precede the final one.
    Headers(ResponseHead),
    /// Promise line for a pushed stream; only meaningful there.
    PushPromise(RequestHead),
    Body(Bytes),
    /// End of message. The driver finishes the stream and stops.
    Eom,
    /// Adjust the transaction's idle timeout.
    IdleTimeout(Duration),
    /// A pushed child transaction to be bound to a server-opened stream.
    Push(PushedStream),
}

/// Receiving half of a pushed transaction, handed to the session so it can
/// open a unidirectional stream and drain the frames onto it.
#[derive(Debug)]
pub struct PushedStream {
    pub frames: mpsc::UnboundedReceiver<Frame>,
}

/// Handler-side handle to a transaction.
///
/// Dropping every clone without sending [`Frame::Eom`] aborts the exchange;
/// the driver treats a closed channel as handler teardown.
#[derive(Debug, Clone)]
pub struct Transaction {
    frames: mpsc::UnboundedSender<Frame>,
}

impl Transaction {
    /// Create a transaction and the frame receiver its driver will drain.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Frame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { frames: tx }, rx)
    }

    /// Send a response head.
    pub fn send_headers(&self, head: ResponseHead) {
        self.send(Frame::Headers(head));
    }

    /// Send a push promise. Only sensible on a pushed transaction.
    pub fn send_push_promise(&self, promise: RequestHead) {
        self.send(Frame::PushPromise(promise));
    }

    /// Send a body chunk.
    pub fn send_body(&self, chunk: impl Into<Bytes>) {
        self.send(Frame::Body(chunk.into()));
    }

    /// Mark the response complete.
    pub fn send_eom(&self) {
        self.send(Frame::Eom);
    }

    /// Extend or shrink the idle timeout applied by the driver.
    pub fn set_idle_timeout(&self, timeout: Duration) {
        self.send(Frame::IdleTimeout(timeout));
    }

    /// Create a pushed child transaction. The session binds its frames to a
    /// fresh server-opened stream; transports that cannot push drop it.
    pub fn new_pushed_transaction(&self) -> Transaction {
        let (child, rx) = Transaction::channel();
        self.send(Frame::Push(PushedStream { frames: rx }));
        child
    }

    /// Head, body and end-of-message in one go.
    pub fn send_ok_response(&self, version: &str, body: impl Into<Bytes>, eom: bool) {
        self.send_headers(ResponseHead::ok(version));
        self.send_body(body);
        if eom {
            self.send_eom();
        }
    }

    /// 400 head, short plaintext body, end-of-message.
    pub fn send_error_response(&self, version: &str, body: impl Into<Bytes>) {
        self.send_headers(ResponseHead::error(version));
        self.send_body(body);
        self.send_eom();
    }

    fn send(&self, frame: Frame) {
        // A closed channel means the driver is gone (peer reset or session
        // teardown); the handler has nobody left to talk to.
        if self.frames.send(frame).is_err() {
            tracing::trace!("transaction driver gone, frame dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn ok_response_emits_head_body_eom() {
        let (txn, mut rx) = Transaction::channel();
        txn.send_ok_response("1.1", "hello\n", true);

        match rx.try_recv().unwrap() {
            Frame::Headers(h) => assert_eq!(h.status, StatusCode::OK),
            other => panic!("expected headers, got {other:?}"),
        }
        match rx.try_recv().unwrap() {
            Frame::Body(b) => assert_eq!(&b[..], b"hello\n"),
            other => panic!("expected body, got {other:?}"),
        }
        assert!(matches!(rx.try_recv().unwrap(), Frame::Eom));
    }

    #[test]
    fn pushed_transaction_surfaces_its_frames() {
        let (txn, mut rx) = Transaction::channel();
        let child = txn.new_pushed_transaction();
        child.send_body("pushed");

        match rx.try_recv().unwrap() {
            Frame::Push(mut stream) => match stream.frames.try_recv().unwrap() {
                Frame::Body(b) => assert_eq!(&b[..], b"pushed"),
                other => panic!("expected body, got {other:?}"),
            },
            other => panic!("expected push, got {other:?}"),
        }
    }

    #[test]
    fn send_after_driver_drop_is_silent() {
        let (txn, rx) = Transaction::channel();
        drop(rx);
        txn.send_eom();
    }
}
