//! Session state - the canonical record and the read model published to the UI

use crate::provider::{BrowserProvider, ListenerId, SignerHandle};
use serde::Serialize;

/// Snapshot the view layer renders from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub address: Option<String>,
    pub chain_id: Option<String>,
    pub is_connecting: bool,
    pub error: Option<String>,
}

impl SessionState {
    pub fn is_connected(&self) -> bool { self.address.is_some() }
}

/// Active connection handles. Replaced wholesale, never patched.
#[derive(Debug, Clone)]
pub(crate) struct Connection {
    pub provider: BrowserProvider,
    pub signer: SignerHandle,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Listeners {
    pub generation: u64,
    pub chain: ListenerId,
    pub accounts: ListenerId,
}

/// Owned by the session behind its mutex. Only session operations and event
/// reactions mutate it, always through `WalletSession::commit`.
#[derive(Debug, Default)]
pub(crate) struct Session {
    pub address: Option<String>,
    pub chain_id: Option<String>,
    pub connection: Option<Connection>,
    pub is_connecting: bool,
    pub error: Option<String>,
    pub listeners: Option<Listeners>,
}

impl Session {
    /// `address` absent => chain id and handles absent; `chain_id` present iff `address` present.
    pub fn is_consistent(&self) -> bool {
        match self.address {
            None => self.chain_id.is_none() && self.connection.is_none(),
            Some(_) => self.chain_id.is_some() && self.connection.is_some(),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        SessionState {
            address: self.address.clone(),
            chain_id: self.chain_id.clone(),
            is_connecting: self.is_connecting,
            error: self.error.clone(),
        }
    }

    /// Drop the connection back to empty. Listener teardown is the caller's job.
    pub fn clear(&mut self) {
        self.address = None;
        self.chain_id = None;
        self.connection = None;
        self.error = None;
    }
}
