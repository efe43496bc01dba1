//! HQ demo server library.
//!
//! A QUIC/HTTP demo server with a small path-routed handler table, server
//! push, a process-wide wait/release rendezvous, per-connection qlog
//! capture, and a plain-TCP fallback serving the same endpoints.

// Core subsystems
pub mod config;
pub mod dispatch;
pub mod handlers;
pub mod http;
pub mod net;
pub mod server;
pub mod session;

// Request plumbing
pub mod fallback;
pub mod rendezvous;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod qlog;

pub use config::ServerConfig;
pub use lifecycle::Shutdown;
pub use server::HqServer;
