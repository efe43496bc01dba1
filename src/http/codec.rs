//! Wire codec for the "h1q" stream format.
//!
//! Each client-opened bidirectional stream carries one HTTP/1.1-style
//! request head followed by the body, delimited by stream FIN. Responses
//! are a status line plus headers plus body, also FIN-delimited, so no
//! content-length accounting is needed. Server-initiated unidirectional
//! streams start with a `PUSH_PROMISE` line naming the promised resource,
//! then carry an ordinary response.
//!
//! Parsing is pure (bytes in, head out); the session layer owns all I/O.

use http::Method;
use thiserror::Error;

use crate::http::message::{RequestHead, ResponseHead};

/// Upper bound on a request head before we give up on the stream.
pub const MAX_HEAD_BYTES: usize = 16 * 1024;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed request line")]
    BadRequestLine,
    #[error("malformed header line")]
    BadHeader,
    #[error("unsupported method")]
    BadMethod,
    #[error("request head exceeds {MAX_HEAD_BYTES} bytes")]
    HeadTooLarge,
}

/// Try to parse a request head from the front of `buf`.
///
/// Returns `Ok(None)` when the terminating blank line has not arrived yet,
/// otherwise the parsed head and the number of bytes consumed. Bytes past
/// the consumed prefix are body bytes.
pub fn parse_request_head(buf: &[u8]) -> Result<Option<(RequestHead, usize)>, CodecError> {
    let Some(end) = find_head_end(buf) else {
        if buf.len() > MAX_HEAD_BYTES {
            return Err(CodecError::HeadTooLarge);
        }
        return Ok(None);
    };

    let head_bytes = &buf[..end];
    let text = std::str::from_utf8(head_bytes).map_err(|_| CodecError::BadRequestLine)?;
    let mut lines = text.split("\r\n");

    let request_line = lines.next().ok_or(CodecError::BadRequestLine)?;
    let mut parts = request_line.split_ascii_whitespace();
    let method = parts.next().ok_or(CodecError::BadRequestLine)?;
    let target = parts.next().ok_or(CodecError::BadRequestLine)?;
    let proto = parts.next().ok_or(CodecError::BadRequestLine)?;
    if parts.next().is_some() || !target.starts_with('/') {
        return Err(CodecError::BadRequestLine);
    }

    let method = Method::from_bytes(method.as_bytes()).map_err(|_| CodecError::BadMethod)?;
    let version = proto.strip_prefix("HTTP/").unwrap_or("1.1").to_string();

    let mut head = RequestHead::new(method, target, version);
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let (name, value) = line.split_once(':').ok_or(CodecError::BadHeader)?;
        head.headers
            .push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
    }

    // Consumed bytes include the blank line terminator.
    Ok(Some((head, end + 4)))
}

/// Serialize a response head.
pub fn write_response_head(head: &ResponseHead) -> Vec<u8> {
    let reason = head.status.canonical_reason().unwrap_or("UNKNOWN");
    let mut out = format!("HTTP/{} {} {}\r\n", head.version, head.status.as_u16(), reason);
    for (name, value) in &head.headers {
        out.push_str(name);
        out.push_str(": ");
        out.push_str(value);
        out.push_str("\r\n");
    }
    out.push_str(if head.wants_keepalive {
        "connection: keep-alive\r\n"
    } else {
        "connection: close\r\n"
    });
    out.push_str("\r\n");
    out.into_bytes()
}

/// Serialize the promise line that opens a pushed stream.
pub fn write_push_promise(promise: &RequestHead) -> Vec<u8> {
    format!(
        "PUSH_PROMISE {} {} HTTP/{}\r\n\r\n",
        promise.method, promise.target, promise.version
    )
    .into_bytes()
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn parses_request_with_query_and_headers() {
        let raw = b"GET /wait?id=7 HTTP/1.1\r\nhost: test\r\nExpect: 100-continue\r\n\r\nbody";
        let (head, consumed) = parse_request_head(raw).unwrap().unwrap();
        assert_eq!(head.method, Method::GET);
        assert_eq!(head.path(), "/wait");
        assert_eq!(head.query_param("id"), Some("7"));
        assert_eq!(head.version, "1.1");
        assert!(head.expects_continue());
        assert_eq!(&raw[consumed..], b"body");
    }

    #[test]
    fn incomplete_head_is_not_an_error() {
        assert!(parse_request_head(b"GET /echo HTTP/1.1\r\nhost: t")
            .unwrap()
            .is_none());
    }

    #[test]
    fn rejects_garbage_request_line() {
        assert!(parse_request_head(b"nonsense\r\n\r\n").is_err());
        assert!(parse_request_head(b"GET noslash HTTP/1.1\r\n\r\n").is_err());
    }

    #[test]
    fn response_head_round_trips_status_line() {
        let head = ResponseHead::with_status("1.1", StatusCode::OK).header("x-demo", "1");
        let bytes = write_response_head(&head);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("x-demo: 1\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn push_promise_line() {
        let promise = RequestHead::new(Method::GET, "/push/pushed0", "1.1");
        let bytes = write_push_promise(&promise);
        assert_eq!(bytes, b"PUSH_PROMISE GET /push/pushed0 HTTP/1.1\r\n\r\n");
    }
}
