//! Constants for provider methods, events, error codes and UI messages
//!
//! Centralized registry so session, provider and tests agree on the wire names.

/// EIP-1193 request methods
pub mod methods {
    pub const SWITCH_CHAIN: &str = "wallet_switchEthereumChain";
    pub const ADD_CHAIN: &str = "wallet_addEthereumChain";
}

/// Provider event names
pub mod events {
    pub const CHAIN_CHANGED: &str = "chainChanged";
    pub const ACCOUNTS_CHANGED: &str = "accountsChanged";
}

/// Provider error codes
pub mod codes {
    pub const USER_REJECTED: i64 = 4001;
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
}

/// User-facing messages
pub mod messages {
    pub const INSTALL_WALLET: &str = "Please install MetaMask to use this feature!";
    pub const NOT_CONNECTED: &str = "No wallet connected";
    pub const CONNECT_FAILED: &str = "Failed to connect wallet";
    pub const SIGN_FAILED: &str = "Failed to sign message";
    pub const SEND_FAILED: &str = "Transaction failed";
    pub const SWITCH_FAILED: &str = "Failed to switch network";
    pub const ADD_CHAIN_FAILED: &str = "Failed to add network to wallet";
    pub const UNKNOWN_NETWORK: &str = "Unknown Network";
}

/// Scratch defaults for the sign page
pub mod scratch {
    pub const DEFAULT_MESSAGE: &str = "Hello Quantinium!";
    pub const DEMO_AMOUNT: &str = "0.001";
}

/// Native currency decimals (wei per ether = 10^18)
pub const NATIVE_DECIMALS: u8 = 18;
