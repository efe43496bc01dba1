//! HTTP message model shared by the QUIC session layer and the fallback
//! TCP server.
//!
//! # Data Flow
//! ```text
//! QUIC bidirectional stream
//!     → codec.rs (parse request head; body delimited by stream FIN)
//!     → [dispatch layer picks a handler]
//!     → handler emits ResponseHead / body frames
//!     → codec.rs (serialize response head, push promises)
//!     → send to client
//! ```

pub mod codec;
pub mod message;

pub use message::{RequestHead, ResponseHead};
