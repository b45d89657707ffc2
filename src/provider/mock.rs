//! MockWallet - scriptable in-memory wallet
//!
//! Behaves like an injected EVM wallet closely enough for the session: account
//! approval, chain switching with the 4902 unknown-chain error, add-chain, event
//! callbacks. Every provider call is logged by method name so tests can assert what
//! was (or was not) asked of the wallet. Signatures and hashes are sha256-derived
//! and deterministic.

use super::{EventHandler, EventKind, ListenerId, NetworkInfo, ProviderEvent, Signer, TransactionRequest, TransactionResponse, WalletProvider};
use crate::core::chain::{parse_chain_id, to_hex};
use crate::error::ProviderError;
use async_trait::async_trait;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

const UNAUTHORIZED: i64 = 4100;
const UNSUPPORTED_METHOD: i64 = 4200;
const INVALID_PARAMS: i64 = -32602;

/// EIP-1193 method names the mock answers, as recorded in its call log.
pub mod calls {
    pub use crate::core::consts::methods::{ADD_CHAIN, SWITCH_CHAIN};
    pub const REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    pub const ACCOUNTS: &str = "eth_accounts";
    pub const CHAIN_ID: &str = "eth_chainId";
    pub const PERSONAL_SIGN: &str = "personal_sign";
    pub const SEND_TRANSACTION: &str = "eth_sendTransaction";
}

pub const DEFAULT_ACCOUNT: &str = "0xAb5801a7D398351b8bE11C439e05C5B3259aeC9B";

struct MockState {
    present: bool,
    authorized: bool,
    accounts: Vec<String>,
    chain_id: u64,
    known_chains: BTreeSet<u64>,
    connect_error: Option<ProviderError>,
    sign_error: Option<ProviderError>,
    send_error: Option<ProviderError>,
    switch_error: Option<ProviderError>,
    add_error: Option<ProviderError>,
    network_error: Option<ProviderError>,
    emit_on_switch: bool,
    latency: Option<Duration>,
    listeners: Vec<(EventKind, ListenerId, EventHandler)>,
    next_listener: u64,
    added_chains: Vec<Value>,
    calls: Vec<String>,
    nonce: u64,
}

#[derive(Clone)]
pub struct MockWallet {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockWallet {
    fn default() -> Self { Self::new() }
}

impl MockWallet {
    /// Installed wallet with one account on Ethereum mainnet (chain 1).
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                present: true,
                authorized: false,
                accounts: vec![DEFAULT_ACCOUNT.to_string()],
                chain_id: 1,
                known_chains: BTreeSet::from([1]),
                connect_error: None,
                sign_error: None,
                send_error: None,
                switch_error: None,
                add_error: None,
                network_error: None,
                emit_on_switch: false,
                latency: None,
                listeners: Vec::new(),
                next_listener: 1,
                added_chains: Vec::new(),
                calls: Vec::new(),
                nonce: 0,
            })),
        }
    }

    /// No wallet injected: `is_present()` is false.
    pub fn absent() -> Self {
        let wallet = Self::new();
        wallet.lock().present = false;
        wallet
    }

    pub fn with_accounts(self, accounts: &[&str]) -> Self { self.lock().accounts = accounts.iter().map(|a| a.to_string()).collect(); self }
    pub fn with_chain(self, chain_id: u64) -> Self { { let mut s = self.lock(); s.chain_id = chain_id; s.known_chains.insert(chain_id); } self }
    pub fn with_known_chain(self, chain_id: u64) -> Self { self.lock().known_chains.insert(chain_id); self }
    pub fn with_latency(self, latency: Duration) -> Self { self.lock().latency = Some(latency); self }
    /// Emit `chainChanged` after a successful switch/add, like a real extension.
    pub fn with_switch_events(self) -> Self { self.lock().emit_on_switch = true; self }

    pub fn set_connect_error(&self, err: Option<ProviderError>) { self.lock().connect_error = err; }
    pub fn set_sign_error(&self, err: Option<ProviderError>) { self.lock().sign_error = err; }
    pub fn set_send_error(&self, err: Option<ProviderError>) { self.lock().send_error = err; }
    pub fn set_switch_error(&self, err: Option<ProviderError>) { self.lock().switch_error = err; }
    pub fn set_add_error(&self, err: Option<ProviderError>) { self.lock().add_error = err; }
    pub fn set_network_error(&self, err: Option<ProviderError>) { self.lock().network_error = err; }

    /// Change accounts silently (no event).
    pub fn set_accounts(&self, accounts: &[&str]) { self.lock().accounts = accounts.iter().map(|a| a.to_string()).collect(); }
    /// Change chain silently (no event).
    pub fn set_chain(&self, chain_id: u64) { let mut s = self.lock(); s.chain_id = chain_id; s.known_chains.insert(chain_id); }

    pub fn chain_id(&self) -> u64 { self.lock().chain_id }
    pub fn knows_chain(&self, chain_id: u64) -> bool { self.lock().known_chains.contains(&chain_id) }
    pub fn added_chains(&self) -> Vec<Value> { self.lock().added_chains.clone() }
    pub fn calls(&self) -> Vec<String> { self.lock().calls.clone() }
    pub fn clear_calls(&self) { self.lock().calls.clear(); }
    pub fn listener_count(&self, kind: EventKind) -> usize { self.lock().listeners.iter().filter(|(k, _, _)| *k == kind).count() }

    /// Fire an event at every registered callback of its kind.
    pub fn emit(&self, event: ProviderEvent) -> usize {
        let handlers: Vec<EventHandler> = self.lock().listeners.iter().filter(|(k, _, _)| *k == event.kind()).map(|(_, _, h)| h.clone()).collect();
        for handler in &handlers { handler(event.clone()); }
        handlers.len()
    }

    /// User switched accounts in the extension UI.
    pub fn emit_accounts_changed(&self, accounts: &[&str]) -> usize {
        self.set_accounts(accounts);
        self.emit(ProviderEvent::AccountsChanged(accounts.iter().map(|a| a.to_string()).collect()))
    }

    /// User switched networks in the extension UI. `raw` is what the wallet reports, any case.
    pub fn emit_chain_changed(&self, raw: &str) -> usize {
        if let Ok(id) = parse_chain_id(raw) { self.set_chain(id); }
        self.emit(ProviderEvent::ChainChanged(raw.to_string()))
    }

    fn lock(&self) -> MutexGuard<'_, MockState> { self.state.lock().unwrap_or_else(|p| p.into_inner()) }

    fn record(&self, method: &str) -> Option<Duration> {
        let mut s = self.lock();
        s.calls.push(method.to_string());
        s.latency
    }

    async fn pause(latency: Option<Duration>) {
        if let Some(d) = latency { tokio::time::sleep(d).await; }
    }

    fn requested_chain(params: &Value) -> Result<u64, ProviderError> {
        let raw = params.get(0).and_then(|p| p.get("chainId")).and_then(|v| v.as_str())
            .ok_or_else(|| ProviderError::with_code(INVALID_PARAMS, "Missing chainId"))?;
        parse_chain_id(raw).map_err(|_| ProviderError::with_code(INVALID_PARAMS, format!("Invalid chainId: {}", raw)))
    }

    fn switch_to(&self, chain_id: u64) {
        let emit = {
            let mut s = self.lock();
            let changed = s.chain_id != chain_id;
            s.chain_id = chain_id;
            changed && s.emit_on_switch
        };
        if emit { self.emit(ProviderEvent::ChainChanged(to_hex(chain_id))); }
    }

    fn handle_switch(&self, params: &Value) -> Result<Value, ProviderError> {
        let chain_id = Self::requested_chain(params)?;
        {
            let s = self.lock();
            if let Some(err) = s.switch_error.clone() { return Err(err); }
            if !s.known_chains.contains(&chain_id) { return Err(ProviderError::unrecognized_chain(&to_hex(chain_id))); }
        }
        self.switch_to(chain_id);
        Ok(Value::Null)
    }

    fn handle_add(&self, params: &Value) -> Result<Value, ProviderError> {
        let chain_id = Self::requested_chain(params)?;
        {
            let mut s = self.lock();
            if let Some(err) = s.add_error.clone() { return Err(err); }
            s.known_chains.insert(chain_id);
            s.added_chains.push(params.get(0).cloned().unwrap_or(Value::Null));
        }
        self.switch_to(chain_id);
        Ok(Value::Null)
    }

    fn approve_accounts(&self) -> Result<Vec<String>, ProviderError> {
        let mut s = self.lock();
        if let Some(err) = s.connect_error.clone() { return Err(err); }
        s.authorized = true;
        Ok(s.accounts.clone())
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    fn is_present(&self) -> bool { self.lock().present }

    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        let latency = self.record(calls::REQUEST_ACCOUNTS);
        Self::pause(latency).await;
        self.approve_accounts()
    }

    async fn get_network(&self) -> Result<NetworkInfo, ProviderError> {
        self.record(calls::CHAIN_ID);
        let s = self.lock();
        match s.network_error.clone() {
            Some(err) => Err(err),
            None => Ok(NetworkInfo { chain_id: s.chain_id }),
        }
    }

    async fn get_signer(&self) -> Result<Arc<dyn Signer>, ProviderError> {
        self.record(calls::ACCOUNTS);
        let s = self.lock();
        let address = s.accounts.first().filter(|_| s.authorized).cloned()
            .ok_or_else(|| ProviderError::with_code(UNAUTHORIZED, "The requested account has not been authorized by the user."))?;
        Ok(Arc::new(MockSigner { wallet: self.clone(), address }))
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let latency = self.record(method);
        Self::pause(latency).await;
        match method {
            calls::SWITCH_CHAIN => self.handle_switch(&params),
            calls::ADD_CHAIN => self.handle_add(&params),
            calls::CHAIN_ID => Ok(json!(to_hex(self.lock().chain_id))),
            calls::REQUEST_ACCOUNTS => self.approve_accounts().map(|a| json!(a)),
            calls::ACCOUNTS => {
                let s = self.lock();
                Ok(json!(if s.authorized { s.accounts.clone() } else { Vec::new() }))
            }
            _ => Err(ProviderError::with_code(UNSUPPORTED_METHOD, format!("Unsupported method: {}", method))),
        }
    }

    fn on(&self, kind: EventKind, handler: EventHandler) -> ListenerId {
        let mut s = self.lock();
        let id = ListenerId(s.next_listener);
        s.next_listener += 1;
        s.listeners.push((kind, id, handler));
        id
    }

    fn remove_listener(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut s = self.lock();
        let before = s.listeners.len();
        s.listeners.retain(|(k, i, _)| !(*k == kind && *i == id));
        s.listeners.len() != before
    }
}

struct MockSigner {
    wallet: MockWallet,
    address: String,
}

#[async_trait]
impl Signer for MockSigner {
    async fn address(&self) -> Result<String, ProviderError> { Ok(self.address.clone()) }

    async fn sign_message(&self, message: &str) -> Result<String, ProviderError> {
        let latency = self.wallet.record(calls::PERSONAL_SIGN);
        MockWallet::pause(latency).await;
        if let Some(err) = self.wallet.lock().sign_error.clone() { return Err(err); }
        let r = Sha256::digest(format!("{}:{}", self.address.to_ascii_lowercase(), message));
        let s = Sha256::digest(format!("{}:{}", message, self.address.to_ascii_lowercase()));
        Ok(format!("0x{}{}1b", hex::encode(r), hex::encode(s)))
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TransactionResponse, ProviderError> {
        let latency = self.wallet.record(calls::SEND_TRANSACTION);
        MockWallet::pause(latency).await;
        let mut s = self.wallet.lock();
        if let Some(err) = s.send_error.clone() { return Err(err); }
        s.nonce += 1;
        let digest = Sha256::digest(format!("{}:{}:{}:{}:{}", s.chain_id, self.address, tx.to, tx.value, s.nonce));
        Ok(TransactionResponse { hash: format!("0x{}", hex::encode(digest)), from: self.address.clone(), to: tx.to, value: tx.value, chain_id: s.chain_id })
    }
}
