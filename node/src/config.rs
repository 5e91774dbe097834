//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use mirror_governance::GovernanceParams;
use mirror_store_lmdb::environment::DEFAULT_MAP_SIZE;
use mirror_types::UserId;

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for a Mirror governance node.
///
/// Can be loaded from a TOML file via [`MirrorConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Data directory for the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in bytes.
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    /// Address the HTTP API binds to.
    #[serde(default = "default_rpc_host")]
    pub rpc_host: IpAddr,

    /// HTTP API port.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Browser origins allowed by CORS. Empty disables CORS.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Identities allowed to admit, veto and implement. Empty allows anyone.
    #[serde(default)]
    pub guardians: Vec<UserId>,

    /// Base URL of the external integrity service. Unset disables scoring.
    #[serde(default)]
    pub integrity_url: Option<String>,

    /// Per-request timeout for the integrity service.
    #[serde(default = "default_integrity_timeout_secs")]
    pub integrity_timeout_secs: u64,

    /// How often expired votes are resolved.
    #[serde(default = "default_resolver_interval_secs")]
    pub resolver_interval_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub governance: GovernanceParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./mirror_data")
}

fn default_map_size() -> usize {
    DEFAULT_MAP_SIZE
}

fn default_rpc_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_rpc_port() -> u16 {
    7080
}

fn default_integrity_timeout_secs() -> u64 {
    5
}

fn default_resolver_interval_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl MirrorConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(format!("{path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn rpc_addr(&self) -> SocketAddr {
        SocketAddr::new(self.rpc_host, self.rpc_port)
    }

    /// Reject combinations that would leave the node unable to make progress.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.resolver_interval_secs == 0 {
            return Err(NodeError::Config("resolver_interval_secs must be positive".into()));
        }
        let g = &self.governance;
        if g.max_write_attempts == 0 {
            return Err(NodeError::Config(
                "governance.max_write_attempts must be positive".into(),
            ));
        }
        if g.supermajority_bps > 10_000 || g.simple_majority_bps > 10_000 {
            return Err(NodeError::Config(
                "governance thresholds are basis points and may not exceed 10000".into(),
            ));
        }
        if g.default_voting_period_secs < g.min_voting_period_secs {
            return Err(NodeError::Config(
                "governance.default_voting_period_secs is shorter than min_voting_period_secs"
                    .into(),
            ));
        }
        Ok(())
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size: default_map_size(),
            rpc_host: default_rpc_host(),
            rpc_port: default_rpc_port(),
            cors_origins: Vec::new(),
            guardians: Vec::new(),
            integrity_url: None,
            integrity_timeout_secs: default_integrity_timeout_secs(),
            resolver_interval_secs: default_resolver_interval_secs(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            governance: GovernanceParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = MirrorConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = MirrorConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.rpc_port, config.rpc_port);
        assert_eq!(parsed.governance, config.governance);
        assert_eq!(parsed.log_format, LogFormat::Human);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = MirrorConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.rpc_port, 7080);
        assert_eq!(config.resolver_interval_secs, 30);
        assert!(config.guardians.is_empty());
        assert!(config.integrity_url.is_none());
        assert_eq!(config.governance.supermajority_bps, 6_600);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            rpc_port = 9999
            guardians = ["ada", "grace"]
            log_format = "json"

            [governance]
            early_resolution_quorum = 3
        "#;
        let config = MirrorConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.rpc_port, 9999);
        assert_eq!(config.guardians.len(), 2);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.governance.early_resolution_quorum, 3);
        assert_eq!(config.governance.supermajority_bps, 6_600);
    }

    #[test]
    fn guardian_ids_are_validated() {
        let result = MirrorConfig::from_toml_str(r#"guardians = ["two words"]"#);
        assert!(matches!(result, Err(NodeError::Config(_))));
    }

    #[test]
    fn validate_rejects_impossible_parameters() {
        let mut config = MirrorConfig::default();
        assert!(config.validate().is_ok());
        config.governance.supermajority_bps = 12_000;
        assert!(config.validate().is_err());

        let mut config = MirrorConfig::default();
        config.governance.min_voting_period_secs = config.governance.default_voting_period_secs + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = MirrorConfig::from_toml_file("/nonexistent/mirror.toml");
        assert!(matches!(result, Err(NodeError::Config(_))));
    }
}
