//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via `tracing`, configured from the environment
//! - Metric updates are cheap (atomic increments behind `metrics` macros)
//! - No exposition endpoint here: recorders are installed by the binary

pub mod metrics;
