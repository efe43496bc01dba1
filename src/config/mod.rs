//! Server configuration: schema, loading, validation.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    CongestionAlgorithm, FallbackConfig, PartialReliabilityConfig, PushConfig, QlogConfig,
    ServerConfig, TimeoutConfig, TlsConfig, VersionConfig,
};
