//! Session - wallet session manager
//!
//! Owns the provider/signer lifecycle and the only mutable copy of the session.
//! Every mutation goes through [`WalletSession::commit`], which checks the
//! address/chain/handles invariant and publishes a [`SessionState`] snapshot on a
//! `watch` channel for the view layer.
//!
//! # Flow
//!
//! ```text
//! UI action ──→ connect / disconnect / sign_message / switch_network / send_transaction
//!                   │
//!                   ▼
//!             WalletProvider (async, may prompt the user)
//!                   │
//!                   ▼
//!             commit(Session) ──→ watch::Sender<SessionState> ──→ UI re-render
//!
//! Wallet event ──→ EventHandler ──→ mpsc queue ──→ run_events / drain_events
//!                                                      │
//!                                                      ▼
//!                                             commit(Session) ──→ ...
//! ```

mod config;
mod events;
mod state;

pub use config::WalletConfig;
pub use state::SessionState;

use crate::core::chain::{normalize_address, parse_address, to_hex};
use crate::core::consts::{messages, methods};
use crate::core::units::{format_ether, parse_ether};
use crate::error::WalletError;
use crate::network::NetworkRegistry;
use crate::provider::{BrowserProvider, SignerHandle, TransactionRequest, TransactionResponse, WalletProvider};
use events::Envelope;
use serde_json::json;
use state::{Connection, Session};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, watch};

/// Handle to the session. Cheap to clone; all clones share one session.
#[derive(Clone)]
pub struct WalletSession {
    inner: Arc<Inner>,
}

struct Inner {
    wallet: Option<Arc<dyn WalletProvider>>,
    config: WalletConfig,
    session: Mutex<Session>,
    state_tx: watch::Sender<SessionState>,
    events_tx: mpsc::UnboundedSender<Envelope>,
    events_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Envelope>>,
    switching: AtomicBool,
    epoch: AtomicU64,
}

/// Clears the in-flight flag when the switch finishes, on every exit path.
struct FlightGuard<'a> {
    flag: Option<&'a AtomicBool>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if let Some(flag) = self.flag { flag.store(false, Ordering::Release); }
    }
}

impl WalletSession {
    /// Session over an injected wallet.
    ///
    /// Wallet events are queued without bound until something consumes them:
    /// spawn an [`EventPump`](crate::runtime::EventPump) or call
    /// [`drain_events`](Self::drain_events) on every tick. A host that does neither
    /// keeps every event the wallet emits in memory.
    pub fn new(wallet: Arc<dyn WalletProvider>, config: WalletConfig) -> Self { Self::build(Some(wallet), config) }

    /// Session for a host with no injected wallet at all.
    pub fn without_wallet(config: WalletConfig) -> Self { Self::build(None, config) }

    fn build(wallet: Option<Arc<dyn WalletProvider>>, config: WalletConfig) -> Self {
        let (state_tx, _) = watch::channel(SessionState::default());
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Inner {
                wallet,
                config,
                session: Mutex::new(Session::default()),
                state_tx,
                events_tx,
                events_rx: tokio::sync::Mutex::new(events_rx),
                switching: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
            }),
        }
    }

    // Read model

    pub fn state(&self) -> SessionState { self.inner.state_tx.borrow().clone() }
    pub fn subscribe(&self) -> watch::Receiver<SessionState> { self.inner.state_tx.subscribe() }
    pub fn config(&self) -> &WalletConfig { &self.inner.config }
    pub fn networks(&self) -> &NetworkRegistry { &self.inner.config.networks }
    pub fn provider_handle(&self) -> Option<BrowserProvider> { self.lock().connection.as_ref().map(|c| c.provider.clone()) }
    pub fn signer_handle(&self) -> Option<SignerHandle> { self.lock().connection.as_ref().map(|c| c.signer.clone()) }
    pub fn is_listening(&self) -> bool { self.lock().listeners.is_some() }

    /// Address absent => chain id and handles absent, and the published snapshot matches.
    pub fn check_invariants(&self) -> bool {
        let s = self.lock();
        s.is_consistent() && *self.inner.state_tx.borrow() == s.snapshot()
    }

    /// Registry name of the wallet's current chain, or "Unknown Network".
    pub fn network_name(&self) -> String {
        self.networks().display_name(self.state().chain_id.as_deref()).to_string()
    }

    // Operations

    /// Ask the wallet for account access and populate the session.
    ///
    /// Wallet failures (no wallet, rejection, network lookup) are not returned: they
    /// land in `error` and `address` stays as it was. The only `Err` is
    /// [`WalletError::ConnectInProgress`], which leaves the state untouched.
    pub async fn connect(&self) -> Result<(), WalletError> {
        let wallet = match self.wallet() {
            Ok(w) => w,
            Err(e) => {
                tracing::warn!("connect: {}", e);
                self.record_error(&e);
                return Ok(());
            }
        };

        let single_flight = self.inner.config.single_flight;
        let started = self.commit(|s| {
            if single_flight && s.is_connecting { return false; }
            s.is_connecting = true;
            s.error = None;
            true
        });
        if !started {
            tracing::debug!("connect: already in flight");
            return Err(WalletError::ConnectInProgress);
        }

        match self.open_connection(&wallet).await {
            Ok((address, chain_id, connection)) => {
                self.commit(|s| {
                    self.register_listeners(s, &wallet);
                    s.address = Some(address.clone());
                    s.chain_id = Some(chain_id.clone());
                    s.connection = Some(connection);
                    s.is_connecting = false;
                });
                tracing::info!(address = %address, chain_id = %chain_id, "Wallet connected");
            }
            Err(e) => {
                tracing::warn!("connect: {}", e);
                self.commit(|s| {
                    s.error = Some(e.to_string());
                    s.is_connecting = false;
                });
            }
        }
        Ok(())
    }

    /// Unsubscribe from wallet events and clear the session. Safe to call repeatedly.
    pub async fn disconnect(&self) { self.teardown(); }

    pub async fn sign_message(&self, message: &str) -> Result<String, WalletError> {
        let signer = self.signer_handle().ok_or(WalletError::NotConnected)?;
        self.clear_error();
        match signer.sign_message(message).await {
            Ok(signature) => {
                tracing::debug!(len = message.len(), "Message signed");
                Ok(signature)
            }
            Err(e) => self.fail("sign_message", WalletError::from_provider(e, messages::SIGN_FAILED)),
        }
    }

    /// Switch the wallet to a registered network, adding it first if the wallet
    /// does not know the chain (error 4902). Handles and chain id are then re-read
    /// from the wallet rather than assumed.
    pub async fn switch_network(&self, key: &str) -> Result<(), WalletError> {
        let network = self.networks().get(key).cloned().ok_or_else(|| WalletError::InvalidNetwork(key.to_string()))?;
        let wallet = match self.wallet() {
            Ok(w) => w,
            Err(e) => return self.fail("switch_network", e),
        };
        let _flight = self.begin_switch().ok_or(WalletError::SwitchInProgress)?;
        self.clear_error();

        match wallet.request(methods::SWITCH_CHAIN, json!([{ "chainId": network.chain_id }])).await {
            Ok(_) => {}
            Err(e) if e.is_unrecognized_chain() => {
                tracing::info!(chain_id = %network.chain_id, "Adding {} to wallet", network.chain_name);
                if let Err(e) = wallet.request(methods::ADD_CHAIN, json!([network.add_chain_params()])).await {
                    tracing::warn!("add chain {}: {}", network.chain_id, e);
                    return self.fail("switch_network", WalletError::AddChainFailed);
                }
            }
            Err(e) => {
                tracing::warn!("switch chain {}: {}", network.chain_id, e);
                return self.fail("switch_network", WalletError::SwitchFailed);
            }
        }

        if let Err(e) = self.refresh(&wallet).await {
            return self.fail("switch_network", e);
        }
        tracing::info!(requested = %network.chain_id, current = ?self.state().chain_id, "Network switched");
        Ok(())
    }

    /// Send `value` (decimal, native currency) to `to`. The recipient must be a
    /// `0x`-prefixed 20-byte address.
    pub async fn send_transaction(&self, to: &str, value: &str) -> Result<TransactionResponse, WalletError> {
        let signer = self.signer_handle().ok_or(WalletError::NotConnected)?;
        self.clear_error();
        let wei = match parse_ether(value) {
            Ok(v) => v,
            Err(e) => return self.fail("send_transaction", e),
        };
        if let Err(e) = parse_address(to) {
            return self.fail("send_transaction", e);
        }
        match signer.send_transaction(TransactionRequest { to: to.trim().to_string(), value: wei }).await {
            Ok(tx) => {
                tracing::info!(hash = %tx.hash, to = %tx.to, value = %format_ether(tx.value), "Transaction sent");
                Ok(tx)
            }
            Err(e) => self.fail("send_transaction", WalletError::from_provider(e, messages::SEND_FAILED)),
        }
    }

    // Internals

    fn lock(&self) -> MutexGuard<'_, Session> { self.inner.session.lock().unwrap_or_else(|p| p.into_inner()) }

    /// Apply one mutation and publish the snapshot if anything visible changed.
    fn commit<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut s = self.lock();
        let out = f(&mut s);
        debug_assert!(s.is_consistent(), "session invariant violated: {:?}", s);
        let snapshot = s.snapshot();
        self.inner.state_tx.send_if_modified(|current| {
            if *current == snapshot { return false; }
            *current = snapshot;
            true
        });
        out
    }

    fn wallet(&self) -> Result<Arc<dyn WalletProvider>, WalletError> {
        self.inner.wallet.as_ref().filter(|w| w.is_present()).cloned().ok_or(WalletError::ProviderMissing)
    }

    fn next_epoch(&self) -> u64 { self.inner.epoch.fetch_add(1, Ordering::Relaxed) + 1 }

    fn clear_error(&self) { self.commit(|s| s.error = None); }

    fn record_error(&self, err: &WalletError) {
        let message = err.to_string();
        self.commit(|s| s.error = Some(message));
    }

    fn fail<T>(&self, op: &str, err: WalletError) -> Result<T, WalletError> {
        tracing::warn!("{}: {}", op, err);
        self.record_error(&err);
        Err(err)
    }

    fn begin_switch(&self) -> Option<FlightGuard<'_>> {
        if !self.inner.config.single_flight { return Some(FlightGuard { flag: None }); }
        self.inner.switching
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard { flag: Some(&self.inner.switching) })
    }

    async fn open_connection(&self, wallet: &Arc<dyn WalletProvider>) -> Result<(String, String, Connection), WalletError> {
        wallet.request_accounts().await.map_err(|e| WalletError::from_provider(e, messages::CONNECT_FAILED))?;
        let (chain_id, connection) = self.build_connection(wallet, messages::CONNECT_FAILED).await?;
        let address = connection.signer.address().await.map_err(|e| WalletError::from_provider(e, messages::CONNECT_FAILED))?;
        Ok((normalize_address(&address), chain_id, connection))
    }

    /// Fresh provider + signer pair and the chain the wallet is on right now.
    async fn build_connection(&self, wallet: &Arc<dyn WalletProvider>, fallback: &str) -> Result<(String, Connection), WalletError> {
        let provider = BrowserProvider::new(wallet.clone(), self.next_epoch());
        let signer = provider.get_signer().await.map_err(|e| WalletError::from_provider(e, fallback))?;
        let network = provider.get_network().await.map_err(|e| WalletError::from_provider(e, fallback))?;
        Ok((to_hex(network.chain_id), Connection { provider, signer }))
    }

    /// Rebuild handles after the wallet's chain moved. No-op while disconnected.
    async fn refresh(&self, wallet: &Arc<dyn WalletProvider>) -> Result<(), WalletError> {
        if !self.state().is_connected() {
            tracing::debug!("refresh: not connected, leaving handles empty");
            return Ok(());
        }
        let (chain_id, connection) = self.build_connection(wallet, messages::SWITCH_FAILED).await?;
        self.commit(|s| {
            if s.address.is_some() {
                s.chain_id = Some(chain_id);
                s.connection = Some(connection);
            }
        });
        Ok(())
    }

    fn teardown(&self) {
        let wallet = self.inner.wallet.clone();
        let was_connected = self.commit(|s| {
            Self::remove_listeners(s, wallet.as_ref());
            let was = s.address.is_some();
            s.clear();
            was
        });
        if was_connected { tracing::info!("Wallet disconnected"); }
    }
}
