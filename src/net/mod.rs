//! Network support: connection identity and TLS context construction.
//!
//! The transport itself (QUIC) is an external collaborator consumed through
//! quinn; this module only supplies what the bootstrap wires into it.

pub mod connection;
pub mod tls;

pub use connection::ConnectionId;
