//! Network registry - the static set of chains the app can switch the wallet to
//!
//! Each entry carries what `wallet_addEthereumChain` needs plus the explorer base
//! used for transaction and address links.
//!
//! | Key | Chain id | Name | Symbol |
//! |-----|----------|------|--------|
//! | `AVALANCHE_TESTNET` | `0xa869` | Avalanche Fuji Testnet | AVAX |

use crate::core::chain::{normalize_chain_id, same_chain};
use crate::core::consts::{messages, NATIVE_DECIMALS};
use crate::error::WalletError;
use serde::{Deserialize, Serialize};

pub const AVALANCHE_TESTNET: &str = "AVALANCHE_TESTNET";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    pub key: String,
    pub chain_id: String,
    pub chain_name: String,
    pub symbol: String,
    pub rpc_url: String,
    pub block_explorer_url: String,
}

impl NetworkConfig {
    pub fn avalanche_fuji() -> Self {
        Self {
            key: AVALANCHE_TESTNET.into(),
            chain_id: "0xa869".into(),
            chain_name: "Avalanche Fuji Testnet".into(),
            symbol: "AVAX".into(),
            rpc_url: "https://api.avax-test.network/ext/bc/C/rpc".into(),
            block_explorer_url: "https://testnet.snowtrace.io".into(),
        }
    }

    /// Parameter object for `wallet_addEthereumChain`.
    pub fn add_chain_params(&self) -> AddChainParams {
        AddChainParams {
            chain_id: self.chain_id.clone(),
            chain_name: self.chain_name.clone(),
            native_currency: NativeCurrency { name: self.symbol.clone(), symbol: self.symbol.clone(), decimals: NATIVE_DECIMALS },
            rpc_urls: vec![self.rpc_url.clone()],
            block_explorer_urls: vec![self.block_explorer_url.clone()],
        }
    }

    fn validate(&self) -> Result<(), WalletError> {
        let canonical = normalize_chain_id(&self.chain_id)?;
        if canonical != self.chain_id {
            return Err(WalletError::InvalidChainId(self.chain_id.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Registered networks, looked up by key or by chain id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRegistry {
    networks: Vec<NetworkConfig>,
}

impl Default for NetworkRegistry {
    fn default() -> Self { Self { networks: vec![NetworkConfig::avalanche_fuji()] } }
}

impl NetworkRegistry {
    pub fn empty() -> Self { Self { networks: Vec::new() } }

    /// Insert or replace by key. Chain ids must already be canonical (`0x` + lowercase hex).
    pub fn register(&mut self, network: NetworkConfig) -> Result<(), WalletError> {
        network.validate()?;
        match self.networks.iter_mut().find(|n| n.key == network.key) {
            Some(existing) => *existing = network,
            None => self.networks.push(network),
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&NetworkConfig> { self.networks.iter().find(|n| n.key == key) }
    pub fn by_chain_id(&self, chain_id: &str) -> Option<&NetworkConfig> { self.networks.iter().find(|n| same_chain(&n.chain_id, chain_id)) }
    pub fn iter(&self) -> impl Iterator<Item = &NetworkConfig> { self.networks.iter() }
    pub fn len(&self) -> usize { self.networks.len() }
    pub fn is_empty(&self) -> bool { self.networks.is_empty() }

    /// Name shown by the network switcher.
    pub fn display_name(&self, chain_id: Option<&str>) -> &str {
        chain_id.and_then(|id| self.by_chain_id(id)).map(|n| n.chain_name.as_str()).unwrap_or(messages::UNKNOWN_NETWORK)
    }

    pub fn explorer_url(&self, chain_id: Option<&str>) -> Option<&str> {
        chain_id.and_then(|id| self.by_chain_id(id)).map(|n| n.block_explorer_url.trim_end_matches('/'))
    }

    pub fn tx_url(&self, chain_id: Option<&str>, hash: &str) -> Option<String> {
        self.explorer_url(chain_id).map(|base| format!("{}/tx/{}", base, hash))
    }

    pub fn address_url(&self, chain_id: Option<&str>, address: &str) -> Option<String> {
        self.explorer_url(chain_id).map(|base| format!("{}/address/{}", base, address))
    }
}
