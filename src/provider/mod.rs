//! Provider - the contract the session expects from an injected wallet
//!
//! The host (browser extension bridge, desktop shell, test harness) supplies a
//! [`WalletProvider`]. The session never talks to a wallet any other way.
//!
//! # Architecture
//!
//! ```text
//! WalletProvider (host-controlled)
//!     │
//!     ├── request_accounts / get_network / request(method, params)
//!     │
//!     ├── get_signer ──→ Signer (address, sign_message, send_transaction)
//!     │
//!     └── on / remove_listener ──→ ProviderEvent (chainChanged, accountsChanged)
//! ```
//!
//! [`BrowserProvider`] and [`SignerHandle`] are the opaque handles the session owns.
//! `MockWallet` (feature `mock`) is a scriptable fake for tests and demos.

mod handles;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use handles::{BrowserProvider, SignerHandle};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockWallet;

use crate::core::consts::events;
use crate::error::ProviderError;
use alloy_primitives::U256;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Provider event names the session subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind { ChainChanged, AccountsChanged }

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self { EventKind::ChainChanged => events::CHAIN_CHANGED, EventKind::AccountsChanged => events::ACCOUNTS_CHANGED }
    }
}

/// Wallet-originated notification, as reported (chain id not yet normalized).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    ChainChanged(String),
    AccountsChanged(Vec<String>),
}

impl ProviderEvent {
    pub fn kind(&self) -> EventKind {
        match self { ProviderEvent::ChainChanged(_) => EventKind::ChainChanged, ProviderEvent::AccountsChanged(_) => EventKind::AccountsChanged }
    }
}

/// Callback registered with [`WalletProvider::on`].
pub type EventHandler = Arc<dyn Fn(ProviderEvent) + Send + Sync>;

/// Token returned by `on`, used to unregister exactly that callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo { pub chain_id: u64 }

/// Native-currency transfer, value already in base units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub to: String,
    pub value: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResponse {
    pub hash: String,
    pub from: String,
    pub to: String,
    pub value: U256,
    pub chain_id: u64,
}

#[async_trait]
pub trait Signer: Send + Sync {
    async fn address(&self) -> Result<String, ProviderError>;
    async fn sign_message(&self, message: &str) -> Result<String, ProviderError>;
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TransactionResponse, ProviderError>;
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// False when no wallet is injected into the host.
    fn is_present(&self) -> bool { true }

    /// Ask for account access. May prompt the user; may be rejected.
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError>;

    /// Network the wallet is currently on.
    async fn get_network(&self) -> Result<NetworkInfo, ProviderError>;

    /// Signer for the wallet's active account.
    async fn get_signer(&self) -> Result<Arc<dyn Signer>, ProviderError>;

    /// Raw EIP-1193 request (`wallet_switchEthereumChain`, `wallet_addEthereumChain`, ...).
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    fn on(&self, kind: EventKind, handler: EventHandler) -> ListenerId;

    /// Unregister a callback. Unknown ids are ignored and return false.
    fn remove_listener(&self, kind: EventKind, id: ListenerId) -> bool;
}
