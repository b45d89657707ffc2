//! Quantinium: wallet session manager for an injected EVM wallet.
//!
//! # Architecture
//!
//! ```text
//! UI composition root
//!   │
//!   ├── WalletSession (single owner of session state)
//!   │     ├── WalletProvider (injected wallet, host-controlled)
//!   │     │     └── BrowserProvider / SignerHandle (recreated per connection/chain)
//!   │     ├── NetworkRegistry (switch / add-chain metadata, explorer links)
//!   │     ├── watch::Receiver<SessionState> → view re-renders
//!   │     └── event queue ← chainChanged / accountsChanged callbacks
//!   │
//!   └── ScratchStore + SignView (sign/send demo page, page-scoped)
//! ```
//!
//! # Operations
//!
//! | Operation | Method | Failure surfaced as |
//! |-----------|--------|---------------------|
//! | connect | `session.connect()` | `error` only |
//! | disconnect | `session.disconnect()` | never fails |
//! | sign | `session.sign_message(msg)` | `error` + `Err` |
//! | switch network | `session.switch_network(key)` | `error` + `Err` |
//! | send | `session.send_transaction(to, amount)` | `error` + `Err` |
//!
//! # Usage
//!
//! ```ignore
//! use quantinium::{EventPump, WalletConfig, WalletSession};
//!
//! let session = WalletSession::new(injected_wallet, WalletConfig::default());
//! let pump = EventPump::spawn(&session);
//!
//! session.connect().await?;
//! if let Some(error) = session.state().error {
//!     // show it; connect failures are reported through state
//! }
//! let signature = session.sign_message("Hello Quantinium!").await?;
//! session.switch_network("AVALANCHE_TESTNET").await?;
//!
//! pump.stop().await?;
//! ```

pub mod core;
pub mod error;
pub mod logging;
pub mod network;
pub mod provider;
pub mod runtime;
pub mod scratch;
pub mod session;

pub use alloy_primitives::U256;
pub use error::{ProviderError, WalletError};
pub use logging::{init_logging, init_logging_with, LogFormat};
pub use network::{NetworkConfig, NetworkRegistry, AVALANCHE_TESTNET};
#[cfg(feature = "mock")]
pub use provider::MockWallet;
pub use provider::{
    BrowserProvider, EventKind, ProviderEvent, Signer, SignerHandle, TransactionRequest, TransactionResponse,
    WalletProvider,
};
pub use runtime::EventPump;
pub use scratch::{ScratchResult, ScratchStore, SignScratch, SignView};
pub use session::{SessionState, WalletConfig, WalletSession};
