//! QUIC server bootstrap.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Build TLS crypto → quinn transport (idle timeout, congestion)
//!     → endpoint with negotiated version list → accept loop
//!
//! Per connection:
//!     Incoming → (refuse while draining) → handshake
//!     → read negotiated ALPN → SessionController (+ optional qlog)
//!     → insert into session arena → run_session → remove on teardown
//! ```
//!
//! # Design Decisions
//! - The bootstrap owns the session arena; sessions never delete
//!   themselves, the accept task removes them when `run_session` returns
//! - Draining refuses handshakes outright instead of accepting-then-closing

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use quinn::crypto::rustls::QuicServerConfig;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{CongestionAlgorithm, ServerConfig};
use crate::dispatch::PartialReliabilityParams;
use crate::net::tls::{self, TlsError, PARTIAL_RELIABILITY_ALPN};
use crate::net::ConnectionId;
use crate::observability::metrics;
use crate::qlog::QlogHandle;
use crate::session::{run_session, SessionController};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("tls setup failed: {0}")]
    Tls(#[from] TlsError),
    #[error("tls config not usable for QUIC: {0}")]
    Crypto(#[from] quinn::crypto::rustls::NoInitialCipherSuite),
    #[error("invalid bind address '{addr}': {source}")]
    BindAddress {
        addr: String,
        source: std::net::AddrParseError,
    },
    #[error("connection idle timeout out of range")]
    IdleTimeout,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The QUIC front end. Binds on construction; `run` drives the accept
/// loop until `stop` closes the endpoint.
pub struct HqServer {
    endpoint: quinn::Endpoint,
    config: Arc<ServerConfig>,
    reject_new: Arc<AtomicBool>,
    sessions: Arc<DashMap<ConnectionId, quinn::Connection>>,
}

impl HqServer {
    /// Bind the UDP socket and set up the endpoint. Must run inside a
    /// tokio runtime.
    pub fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let crypto = tls::server_crypto(&config.tls)?;
        let quic_crypto = QuicServerConfig::try_from(crypto)?;
        let mut server_config = quinn::ServerConfig::with_crypto(Arc::new(quic_crypto));

        let mut transport = quinn::TransportConfig::default();
        let conn_idle = Duration::from_millis(config.timeouts.conn_idle_ms);
        transport.max_idle_timeout(Some(
            quinn::IdleTimeout::try_from(conn_idle).map_err(|_| ServerError::IdleTimeout)?,
        ));
        match config.congestion {
            CongestionAlgorithm::Cubic => {
                transport.congestion_controller_factory(Arc::new(
                    quinn::congestion::CubicConfig::default(),
                ));
            }
            CongestionAlgorithm::NewReno => {
                transport.congestion_controller_factory(Arc::new(
                    quinn::congestion::NewRenoConfig::default(),
                ));
            }
            CongestionAlgorithm::Bbr => {
                transport.congestion_controller_factory(Arc::new(
                    quinn::congestion::BbrConfig::default(),
                ));
            }
        }
        server_config.transport_config(Arc::new(transport));

        let mut endpoint_config = quinn::EndpointConfig::default();
        endpoint_config.supported_versions(config.supported_versions());

        let addr: SocketAddr =
            config
                .bind_address
                .parse()
                .map_err(|source| ServerError::BindAddress {
                    addr: config.bind_address.clone(),
                    source,
                })?;
        let socket = std::net::UdpSocket::bind(addr)?;

        let endpoint = quinn::Endpoint::new(
            endpoint_config,
            Some(server_config),
            socket,
            Arc::new(quinn::TokioRuntime),
        )?;

        info!(
            addr = %endpoint.local_addr()?,
            congestion = ?config.congestion,
            versions = ?config.supported_versions(),
            "quic server listening"
        );

        Ok(Self {
            endpoint,
            config: Arc::new(config),
            reject_new: Arc::new(AtomicBool::new(false)),
            sessions: Arc::new(DashMap::new()),
        })
    }

    /// Accept connections until the endpoint is closed.
    pub async fn run(&self) {
        while let Some(incoming) = self.endpoint.accept().await {
            if self.reject_new.load(Ordering::Relaxed) {
                debug!(peer = %incoming.remote_address(), "refusing connection while draining");
                metrics::record_connection_rejected();
                incoming.refuse();
                continue;
            }
            let connecting = match incoming.accept() {
                Ok(connecting) => connecting,
                Err(e) => {
                    warn!(error = %e, "incoming connection rejected by transport");
                    continue;
                }
            };
            tokio::spawn(handle_connection(
                connecting,
                Arc::clone(&self.config),
                Arc::clone(&self.sessions),
            ));
        }
    }

    /// Address the endpoint actually bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.endpoint.local_addr()
    }

    /// Toggle handshake refusal. Existing sessions keep running.
    pub fn reject_new_connections(&self, reject: bool) {
        self.reject_new.store(reject, Ordering::Relaxed);
    }

    /// Number of sessions currently in the arena.
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Close the endpoint and wait for in-flight sessions to drain.
    pub async fn stop(&self) {
        self.endpoint.close(0u32.into(), b"server shutdown");
        self.endpoint.wait_idle().await;
        info!("quic server stopped");
    }
}

/// Finish the handshake and run the session to completion. The arena
/// entry lives exactly as long as the session.
async fn handle_connection(
    connecting: quinn::Connecting,
    config: Arc<ServerConfig>,
    sessions: Arc<DashMap<ConnectionId, quinn::Connection>>,
) {
    let connection = match connecting.await {
        Ok(connection) => connection,
        Err(e) => {
            debug!(error = %e, "handshake failed");
            return;
        }
    };
    metrics::record_connection();

    let conn_id = ConnectionId::new();
    let alpn = connection
        .handshake_data()
        .and_then(|data| data.downcast::<quinn::crypto::rustls::HandshakeData>().ok())
        .and_then(|data| data.protocol);
    let pr_enabled = alpn.as_deref() == Some(PARTIAL_RELIABILITY_ALPN);
    debug!(
        conn = %conn_id,
        peer = %connection.remote_address(),
        alpn = %alpn.as_deref().map(String::from_utf8_lossy).unwrap_or_default(),
        "connection established"
    );

    let pr_params = PartialReliabilityParams {
        enabled: pr_enabled,
        chunk_size: config.partial_reliability.chunk_size,
        chunk_delay_ms: config.partial_reliability.chunk_delay_ms,
        source: config.partial_reliability.source.clone(),
    };
    let mut controller = SessionController::new(conn_id, &config.http_version, pr_params);
    if let Some(dir) = &config.qlog.dir {
        controller.set_qlogger(QlogHandle::new(conn_id, dir, config.qlog.pretty));
    }

    sessions.insert(conn_id, connection.clone());
    run_session(
        connection,
        controller,
        Duration::from_millis(config.timeouts.txn_idle_ms),
    )
    .await;
    sessions.remove(&conn_id);
}
