//! Per-connection structured event log, flushed to a file at teardown.
//!
//! When a log directory is configured, each session controller records
//! connection-scoped events here. Nothing is written until teardown; the
//! controller flushes this log as its very last action.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde::Serialize;

use crate::net::ConnectionId;

#[derive(Debug, Serialize)]
struct QlogEvent {
    /// Milliseconds since the connection was accepted.
    time_ms: u128,
    name: &'static str,
    data: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct QlogFile {
    qlog_version: &'static str,
    title: String,
    events: Vec<QlogEvent>,
}

#[derive(Debug)]
struct Inner {
    conn: ConnectionId,
    dir: PathBuf,
    pretty: bool,
    start: Instant,
    events: Mutex<Vec<QlogEvent>>,
}

/// Shareable handle to one connection's event log.
#[derive(Debug, Clone)]
pub struct QlogHandle {
    inner: Arc<Inner>,
}

impl QlogHandle {
    pub fn new(conn: ConnectionId, dir: &Path, pretty: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                conn,
                dir: dir.to_path_buf(),
                pretty,
                start: Instant::now(),
                events: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Record one event. Cheap; serialization happens at flush time.
    pub fn record(&self, name: &'static str, data: serde_json::Value) {
        let event = QlogEvent {
            time_ms: self.inner.start.elapsed().as_millis(),
            name,
            data,
        };
        self.inner
            .events
            .lock()
            .expect("qlog event mutex poisoned")
            .push(event);
    }

    /// Write the accumulated events to `<dir>/<connection>.qlog`, pretty or
    /// compact JSON per configuration. Returns the written path.
    pub fn flush(&self) -> std::io::Result<PathBuf> {
        let events = std::mem::take(
            &mut *self.inner.events.lock().expect("qlog event mutex poisoned"),
        );
        let file = QlogFile {
            qlog_version: "draft-01",
            title: self.inner.conn.to_string(),
            events,
        };
        let bytes = if self.inner.pretty {
            serde_json::to_vec_pretty(&file)
        } else {
            serde_json::to_vec(&file)
        }
        .map_err(std::io::Error::other)?;

        std::fs::create_dir_all(&self.inner.dir)?;
        let path = self.inner.dir.join(format!("{}.qlog", self.inner.conn));
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}
