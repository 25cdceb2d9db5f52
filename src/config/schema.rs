//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bridge.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::nem::Network;

/// Root configuration for the bridge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// NEM network used for signing and address derivation.
    pub network: Network,

    /// Remote NIS node.
    pub endpoint: EndpointConfig,

    /// Frame handling limits.
    pub dispatcher: DispatcherConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Remote node endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Node host, with or without scheme (e.g., "http://bigalice2.nem.ninja").
    pub host: String,

    /// Node port (NIS default is 7890).
    pub port: u16,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl EndpointConfig {
    /// Base URL of the node; `http://` is assumed when the host has no scheme.
    pub fn base_url(&self) -> Result<Url, String> {
        let host = self.host.trim();
        let with_scheme = if host.contains("://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        };

        let mut url = Url::parse(&with_scheme)
            .map_err(|e| format!("invalid endpoint host '{}': {}", self.host, e))?;
        url.set_port(Some(self.port))
            .map_err(|_| format!("endpoint host '{}' cannot carry a port", self.host))?;
        Ok(url)
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host: "http://bigalice2.nem.ninja".to_string(),
            port: 7890,
            timeout_secs: 10,
        }
    }
}

/// Request framing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Largest accepted request frame in bytes, newline excluded.
    pub max_frame_bytes: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_frame_bytes: 1024 * 1024, // 1MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.endpoint.port, 7890);
        assert_eq!(config.endpoint.timeout_secs, 10);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_base_url_adds_scheme_and_port() {
        let endpoint = EndpointConfig {
            host: "127.0.0.1".to_string(),
            port: 7891,
            timeout_secs: 1,
        };
        assert_eq!(endpoint.base_url().unwrap().as_str(), "http://127.0.0.1:7891/");

        let default = EndpointConfig::default();
        assert_eq!(
            default.base_url().unwrap().as_str(),
            "http://bigalice2.nem.ninja:7890/"
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: BridgeConfig = toml::from_str(
            r#"
            network = "mainnet"

            [endpoint]
            host = "http://node.example"
            "#,
        )
        .unwrap();

        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.endpoint.host, "http://node.example");
        assert_eq!(config.endpoint.port, 7890);
        assert_eq!(config.dispatcher.max_frame_bytes, 1024 * 1024);
    }
}
