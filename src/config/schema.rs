//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files;
//! every section has usable defaults so the demo server starts with no
//! config at all.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Stable QUIC versions always offered: v1 and draft-29.
pub const STABLE_VERSIONS: [u32; 2] = [0x0000_0001, 0xff00_001d];

/// Root configuration for the HQ demo server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// UDP bind address for the QUIC endpoint.
    pub bind_address: String,

    /// HTTP version label handlers stamp on responses.
    pub http_version: String,

    /// Protocol version negotiation policy.
    pub versions: VersionConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Congestion control policy for the transport.
    pub congestion: CongestionAlgorithm,

    /// TLS certificate material (embedded test pair when unset).
    pub tls: TlsConfig,

    /// Per-connection structured event logging.
    pub qlog: QlogConfig,

    /// Server-push payload source.
    pub push: PushConfig,

    /// Partial-reliability parameters for `/pr_cat`.
    pub partial_reliability: PartialReliabilityConfig,

    /// Alternate plain-TCP comparison server.
    pub fallback: FallbackConfig,
}

impl ServerConfig {
    /// Supported QUIC versions in negotiation order: the configured draft
    /// version goes first or last around the stable pair.
    pub fn supported_versions(&self) -> Vec<u32> {
        let mut versions = Vec::with_capacity(3);
        if self.versions.draft_first {
            versions.extend(self.versions.draft);
        }
        versions.extend(STABLE_VERSIONS);
        if !self.versions.draft_first {
            versions.extend(self.versions.draft);
        }
        versions
    }
}

/// Protocol version negotiation policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VersionConfig {
    /// Optional draft version offered alongside the stable ones.
    pub draft: Option<u32>,

    /// Whether the draft version is offered before the stable versions.
    pub draft_first: bool,
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            draft: None,
            draft_first: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Idle timeout for one transaction, in milliseconds. `/wait` extends
    /// its own transaction well beyond this.
    pub txn_idle_ms: u64,

    /// Connection-level idle timeout, in milliseconds.
    pub conn_idle_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            txn_idle_ms: 15_000,
            conn_idle_ms: 180_000,
        }
    }
}

/// Congestion controller selection, mapped onto quinn's factories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CongestionAlgorithm {
    #[default]
    Cubic,
    NewReno,
    Bbr,
}

/// TLS material for the listener. Both paths unset means the embedded
/// test certificate is used.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TlsConfig {
    pub cert_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
}

/// Per-connection event log settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QlogConfig {
    /// Directory qlog files are written to; unset disables logging.
    pub dir: Option<PathBuf>,

    /// Human-readable JSON instead of compact.
    pub pretty: bool,
}

impl Default for QlogConfig {
    fn default() -> Self {
        Self {
            dir: None,
            pretty: true,
        }
    }
}

/// Server-push payload source. The file must exist at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PushConfig {
    pub file: PathBuf,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("pushed_resource.txt"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PartialReliabilityConfig {
    pub chunk_size: Option<u64>,
    pub chunk_delay_ms: Option<u64>,

    /// File streamed by `/pr_cat`.
    pub source: PathBuf,
}

impl Default for PartialReliabilityConfig {
    fn default() -> Self {
        Self {
            chunk_size: None,
            chunk_delay_ms: None,
            source: PathBuf::from("pr_source.txt"),
        }
    }
}

/// Alternate single-stream-per-connection comparison server (plain TCP).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub enabled: bool,
    pub bind_address: String,
    pub request_timeout_secs: u64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: "127.0.0.1:6667".to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:6666".to_string(),
            http_version: "1.1".to_string(),
            versions: VersionConfig::default(),
            timeouts: TimeoutConfig::default(),
            congestion: CongestionAlgorithm::default(),
            tls: TlsConfig::default(),
            qlog: QlogConfig::default(),
            push: PushConfig::default(),
            partial_reliability: PartialReliabilityConfig::default(),
            fallback: FallbackConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_version_ordering() {
        let mut config = ServerConfig::default();
        assert_eq!(config.supported_versions(), STABLE_VERSIONS.to_vec());

        config.versions.draft = Some(0xff00_0022);
        assert_eq!(
            config.supported_versions(),
            vec![0xff00_0022, STABLE_VERSIONS[0], STABLE_VERSIONS[1]]
        );

        config.versions.draft_first = false;
        assert_eq!(
            config.supported_versions(),
            vec![STABLE_VERSIONS[0], STABLE_VERSIONS[1], 0xff00_0022]
        );
    }

    #[test]
    fn toml_round_trip_with_partial_sections() {
        let config: ServerConfig = toml::from_str(
            r#"
            bind_address = "0.0.0.0:4433"
            congestion = "bbr"

            [qlog]
            dir = "/tmp/qlogs"
            pretty = false
            "#,
        )
        .unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:4433");
        assert_eq!(config.congestion, CongestionAlgorithm::Bbr);
        assert_eq!(config.qlog.dir, Some(PathBuf::from("/tmp/qlogs")));
        assert!(!config.qlog.pretty);
        // Untouched sections fall back to defaults.
        assert_eq!(config.timeouts.txn_idle_ms, 15_000);
    }
}
