//! Errors - provider failures and session failures

use crate::core::consts::{codes, messages};
use thiserror::Error;

/// EIP-1193 style failure reported by the injected provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ProviderError {
    pub code: Option<i64>,
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self { Self { code: None, message: message.into() } }
    pub fn with_code(code: i64, message: impl Into<String>) -> Self { Self { code: Some(code), message: message.into() } }

    pub fn user_rejected() -> Self { Self::with_code(codes::USER_REJECTED, "User rejected the request.") }
    pub fn unrecognized_chain(chain_id: &str) -> Self {
        Self::with_code(codes::UNRECOGNIZED_CHAIN, format!("Unrecognized chain ID \"{}\".", chain_id))
    }

    pub fn is_user_rejection(&self) -> bool { self.code == Some(codes::USER_REJECTED) }
    pub fn is_unrecognized_chain(&self) -> bool { self.code == Some(codes::UNRECOGNIZED_CHAIN) }
}

/// Session manager errors. The `Display` text is what lands in `SessionState::error`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("{}", messages::INSTALL_WALLET)]
    ProviderMissing,

    #[error("{}", messages::NOT_CONNECTED)]
    NotConnected,

    #[error("Invalid network: {0}")]
    InvalidNetwork(String),

    #[error("{}", messages::SWITCH_FAILED)]
    SwitchFailed,

    #[error("{}", messages::ADD_CHAIN_FAILED)]
    AddChainFailed,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid chain id: {0}")]
    InvalidChainId(String),

    #[error("Wallet connection already in progress")]
    ConnectInProgress,

    #[error("Network switch already in progress")]
    SwitchInProgress,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl WalletError {
    /// Wrap a provider failure, substituting `fallback` when the wallet gave no message.
    pub(crate) fn from_provider(err: ProviderError, fallback: &str) -> Self {
        if err.message.trim().is_empty() {
            WalletError::Provider(ProviderError { code: err.code, message: fallback.into() })
        } else {
            WalletError::Provider(err)
        }
    }

    /// User declined a wallet prompt; safe to retry.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, WalletError::Provider(e) if e.is_user_rejection())
    }
}
