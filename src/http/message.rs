//! Request and response head types.
//!
//! These are deliberately small: one request/response exchange per stream
//! means bodies are delimited by stream FIN, so heads carry no framing
//! metadata beyond what handlers want to inspect.

use http::{Method, StatusCode};

/// Parsed request head: method, target and headers.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    /// Raw request target as received (path plus optional query).
    pub target: String,
    /// Protocol version label carried through to responses (e.g. "1.1").
    pub version: String,
    pub headers: Vec<(String, String)>,
}

impl RequestHead {
    pub fn new(method: Method, target: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            version: version.into(),
            headers: Vec::new(),
        }
    }

    /// Path component of the target (everything before `?`).
    pub fn path(&self) -> &str {
        match self.target.split_once('?') {
            Some((path, _)) => path,
            None => &self.target,
        }
    }

    /// Look up a query parameter by name. No percent-decoding; the demo
    /// surface only uses plain integer parameters.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        let (_, query) = self.target.split_once('?')?;
        query.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            (k == name).then_some(v)
        })
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether the client asked for a 100-continue interim response.
    pub fn expects_continue(&self) -> bool {
        self.header("expect")
            .is_some_and(|v| v.eq_ignore_ascii_case("100-continue"))
    }
}

/// Response head emitted by handlers.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub version: String,
    pub headers: Vec<(String, String)>,
    pub wants_keepalive: bool,
}

impl ResponseHead {
    /// 200 OK with keepalive, the common handler success head.
    pub fn ok(version: &str) -> Self {
        Self {
            status: StatusCode::OK,
            version: version.to_string(),
            headers: Vec::new(),
            wants_keepalive: true,
        }
    }

    /// 400 with keepalive disabled, the common handler rejection head.
    pub fn error(version: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            version: version.to_string(),
            headers: Vec::new(),
            wants_keepalive: false,
        }
    }

    pub fn with_status(version: &str, status: StatusCode) -> Self {
        Self {
            status,
            version: version.to_string(),
            headers: Vec::new(),
            wants_keepalive: true,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}
