//! Wait/release rendezvous across independently arriving requests, as
//! routed by the dispatcher against the shared process-wide registry.

use http::{Method, StatusCode};
use tokio::sync::mpsc::UnboundedReceiver;

use hq_server::dispatch::Dispatcher;
use hq_server::handlers::RequestHandler;
use hq_server::http::RequestHead;
use hq_server::session::{Frame, Transaction};

fn send(target: &str) -> (Box<dyn RequestHandler>, UnboundedReceiver<Frame>) {
    let head = RequestHead::new(Method::GET, target, "1.1");
    let mut handler = Dispatcher::select_handler(&head, "1.1", None);
    let (txn, rx) = Transaction::channel();
    handler.on_headers(&txn, &head);
    handler.on_eom(&txn);
    (handler, rx)
}

fn response_of(rx: &mut UnboundedReceiver<Frame>) -> (StatusCode, Vec<u8>, bool) {
    let mut status = None;
    let mut body = Vec::new();
    let mut eom = false;
    while let Ok(frame) = rx.try_recv() {
        match frame {
            Frame::Headers(h) => status = Some(h.status),
            Frame::Body(chunk) => body.extend_from_slice(&chunk),
            Frame::Eom => {
                eom = true;
                break;
            }
            _ => {}
        }
    }
    (status.expect("no response head"), body, eom)
}

#[test]
fn release_completes_a_parked_waiter() {
    let (waiter, mut wait_rx) = send("/wait?id=1001");
    let (status, body, eom) = response_of(&mut wait_rx);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"waiting\n");
    assert!(!eom, "waiter must stay parked until released");

    let (_releaser, mut release_rx) = send("/release?id=1001");
    let (status, body, eom) = response_of(&mut release_rx);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"released\n");
    assert!(eom);

    // The parked transaction now completes.
    match wait_rx.try_recv().unwrap() {
        Frame::Body(chunk) => assert_eq!(&chunk[..], b"released\n"),
        other => panic!("expected completion body, got {other:?}"),
    }
    assert!(matches!(wait_rx.try_recv().unwrap(), Frame::Eom));
    drop(waiter);
}

#[test]
fn release_before_wait_does_not_exist() {
    let (_handler, mut rx) = send("/release?id=2001");
    let (status, body, _) = response_of(&mut rx);
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, b"id does not exist\n");

    // A release never creates an entry: a later wait on the same id parks.
    let (_waiter, mut wait_rx) = send("/wait?id=2001");
    let (status, body, eom) = response_of(&mut wait_rx);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"waiting\n");
    assert!(!eom);
}

#[test]
fn duplicate_wait_id_is_rejected_and_original_survives() {
    let (_first, mut first_rx) = send("/wait?id=3001");
    response_of(&mut first_rx);

    let (_second, mut second_rx) = send("/wait?id=3001");
    let (status, body, eom) = response_of(&mut second_rx);
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, b"id already exists\n");
    assert!(eom);

    // The original waiter is still the one a release completes.
    let (_releaser, mut release_rx) = send("/release?id=3001");
    assert_eq!(response_of(&mut release_rx).0, StatusCode::OK);
    assert!(matches!(first_rx.try_recv().unwrap(), Frame::Body(_)));
    assert!(matches!(first_rx.try_recv().unwrap(), Frame::Eom));
}

#[test]
fn waiter_teardown_invalidates_its_id() {
    {
        let (_waiter, mut wait_rx) = send("/wait?id=4001");
        response_of(&mut wait_rx);
        // Handler dropped here: connection went away before any release.
    }

    let (_handler, mut rx) = send("/release?id=4001");
    let (status, body, _) = response_of(&mut rx);
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, b"id does not exist\n");
}

#[test]
fn wait_and_release_ids_are_independent() {
    let (_waiter_a, mut rx_a) = send("/wait?id=5001");
    let (_waiter_b, mut rx_b) = send("/wait?id=5002");
    response_of(&mut rx_a);
    response_of(&mut rx_b);

    let (_releaser, mut release_rx) = send("/release?id=5002");
    assert_eq!(response_of(&mut release_rx).0, StatusCode::OK);

    // Only the matching waiter completed.
    assert!(matches!(rx_b.try_recv().unwrap(), Frame::Body(_)));
    assert!(rx_a.try_recv().is_err());
}
