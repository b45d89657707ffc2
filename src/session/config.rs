//! Wallet Configuration - passed from the composition root

use crate::core::consts::scratch;
use crate::network::{NetworkConfig, NetworkRegistry};
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

/// Session configuration. The UI composition root constructs this.
#[derive(Debug, Clone)]
pub struct WalletConfig {
    pub networks: NetworkRegistry,
    pub default_message: String,
    /// Reject a second `connect`/`switch_network` while one is in flight.
    pub single_flight: bool,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self { networks: NetworkRegistry::default(), default_message: scratch::DEFAULT_MESSAGE.into(), single_flight: true }
    }
}

impl WalletConfig {
    pub fn new() -> Self { Self::default() }
    pub fn with_networks(mut self, networks: NetworkRegistry) -> Self { self.networks = networks; self }
    pub fn with_default_message(mut self, m: impl Into<String>) -> Self { self.default_message = m.into(); self }
    pub fn with_single_flight(mut self, enabled: bool) -> Self { self.single_flight = enabled; self }

    /// Add or replace one registry entry. Invalid chain ids are logged and skipped.
    pub fn with_network(mut self, network: NetworkConfig) -> Self {
        let key = network.key.clone();
        if let Err(e) = self.networks.register(network) {
            tracing::warn!("Skipping network {}: {}", key, e);
        }
        self
    }

    /// Parse a JSON config:
    ///
    /// ```json
    /// {"defaultMessage": "gm", "singleFlight": true, "networks": [{"key": "...", "chainId": "0x..", ...}]}
    /// ```
    ///
    /// Fields left out keep their defaults. A present `networks` list replaces the built-in registry.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let file: ConfigFile = serde_json::from_str(json).context("parse wallet config")?;
        let mut config = Self::default();
        if let Some(networks) = file.networks {
            let mut registry = NetworkRegistry::empty();
            for n in networks {
                let key = n.key.clone();
                registry.register(n).with_context(|| format!("network {}", key))?;
            }
            config.networks = registry;
        }
        if let Some(m) = file.default_message { config.default_message = m; }
        if let Some(sf) = file.single_flight { config.single_flight = sf; }
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_json_str(&contents)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    networks: Option<Vec<NetworkConfig>>,
    default_message: Option<String>,
    single_flight: Option<bool>,
}
