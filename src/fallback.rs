//! Plain-TCP comparison server.
//!
//! Serves the same handler table over ordinary HTTP so clients without a
//! QUIC stack can exercise the demo endpoints. Each request is adapted
//! onto a [`Transaction`] and driven by the same dispatcher the QUIC
//! sessions use; the handler is moved into the response body stream so it
//! stays alive until it sends end-of-message (a parked `/wait` request
//! keeps its handler, and its rendezvous registration, until `/release`).
//!
//! Server push has no equivalent on a single-stream connection; pushed
//! transactions are logged and dropped.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use axum::Router;
use bytes::Bytes;
use futures_util::stream;
use tokio::sync::mpsc::UnboundedReceiver;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::config::FallbackConfig;
use crate::dispatch::Dispatcher;
use crate::handlers::RequestHandler;
use crate::http::RequestHead;
use crate::session::{Frame, Transaction};

struct FallbackState {
    http_version: String,
}

/// Build the fallback router. Every path goes through the dispatcher.
pub fn router(http_version: &str, config: &FallbackConfig) -> Router {
    let state = Arc::new(FallbackState {
        http_version: http_version.to_string(),
    });
    Router::new()
        .fallback(handle)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .with_state(state)
}

/// Bind and serve until the listener task is cancelled.
pub async fn run(config: &FallbackConfig, http_version: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(addr = %listener.local_addr()?, "fallback http server listening");
    let app = router(http_version, config);
    axum::serve(listener, app).await
}

async fn handle(
    State(state): State<Arc<FallbackState>>,
    request: axum::extract::Request,
) -> Response {
    let (parts, body) = request.into_parts();

    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());
    let mut head = RequestHead::new(parts.method.clone(), target, state.http_version.clone());
    for (name, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            head.headers.push((name.to_string(), value.to_string()));
        }
    }

    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = %e, "failed to read fallback request body");
            return plain_response(StatusCode::BAD_REQUEST, "bad request\n");
        }
    };

    let (txn, frames) = Transaction::channel();
    let mut handler = Dispatcher::select_handler(&head, &state.http_version, None);
    handler.on_headers(&txn, &head);
    if !body.is_empty() {
        handler.on_body(&txn, body);
    }
    handler.on_eom(&txn);
    drop(txn);

    build_response(handler, frames).await
}

/// Wait for the final response head, then stream body frames until the
/// handler signals end-of-message. The handler rides inside the stream
/// state so it is dropped only when the response completes.
async fn build_response(
    handler: Box<dyn RequestHandler>,
    mut frames: UnboundedReceiver<Frame>,
) -> Response {
    let head = loop {
        match frames.recv().await {
            Some(Frame::Headers(head)) if head.status.is_informational() => continue,
            Some(Frame::Headers(head)) => break head,
            Some(Frame::Push(_)) => {
                warn!("dropping server push on fallback connection");
                continue;
            }
            Some(Frame::IdleTimeout(_)) => continue,
            Some(_) | None => {
                return plain_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error\n");
            }
        }
    };

    let body = stream::unfold(
        (frames, Some(handler)),
        |(mut frames, handler)| async move {
            loop {
                match frames.recv().await {
                    Some(Frame::Body(chunk)) => {
                        return Some((Ok::<_, std::convert::Infallible>(chunk), (frames, handler)));
                    }
                    Some(Frame::Eom) | None => return None,
                    Some(Frame::Push(_)) => {
                        warn!("dropping server push on fallback connection");
                    }
                    Some(_) => {}
                }
            }
        },
    );

    let mut response = Response::builder().status(head.status);
    if let Some(headers) = response.headers_mut() {
        for (name, value) in &head.headers {
            if let (Ok(name), Ok(value)) = (
                name.parse::<HeaderName>(),
                HeaderValue::from_str(value),
            ) {
                headers.append(name, value);
            }
        }
    }
    response
        .body(Body::from_stream(body))
        .unwrap_or_else(|_| plain_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error\n"))
}

fn plain_response(status: StatusCode, body: &'static str) -> Response {
    Response::builder()
        .status(status)
        .body(Body::from(Bytes::from_static(body.as_bytes())))
        .unwrap_or_default()
}
