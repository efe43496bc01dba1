//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! Shutdown:
//!     Signal received → stop accepting new connections
//!     → close endpoint → drain in-flight sessions → exit
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: refuse first, close second, drain last
//! - SIGTERM and SIGINT both trigger graceful shutdown

pub mod shutdown;

pub use shutdown::{wait_for_signal, Shutdown};
