//! Scratch - page-scoped state for the sign/send demo page
//!
//! Independent of the session lifecycle: a connect or disconnect does not touch
//! it, and dropping the [`SignView`] that hosts it resets it to defaults.

use crate::core::consts::scratch;
use crate::error::WalletError;
use crate::provider::TransactionResponse;
use crate::session::WalletSession;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScratchResult {
    Signature(String),
    TransactionHash(String),
}

impl ScratchResult {
    pub fn value(&self) -> &str {
        match self { ScratchResult::Signature(v) | ScratchResult::TransactionHash(v) => v }
    }

    pub fn label(&self) -> &'static str {
        match self { ScratchResult::Signature(_) => "Signature:", ScratchResult::TransactionHash(_) => "Transaction Hash:" }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignScratch {
    pub message: String,
    pub result: Option<ScratchResult>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl SignScratch {
    fn fresh(message: &str) -> Self { Self { message: message.to_string(), result: None, is_loading: false, error: None } }
}

impl Default for SignScratch {
    fn default() -> Self { Self::fresh(scratch::DEFAULT_MESSAGE) }
}

/// Reactive holder for [`SignScratch`]. Clones share the same state.
#[derive(Clone)]
pub struct ScratchStore {
    default_message: Arc<str>,
    tx: Arc<watch::Sender<SignScratch>>,
}

impl Default for ScratchStore {
    fn default() -> Self { Self::new(scratch::DEFAULT_MESSAGE) }
}

impl ScratchStore {
    pub fn new(default_message: &str) -> Self {
        let (tx, _) = watch::channel(SignScratch::fresh(default_message));
        Self { default_message: Arc::from(default_message), tx: Arc::new(tx) }
    }

    /// Store seeded with the session's configured default message.
    pub fn for_session(session: &WalletSession) -> Self { Self::new(&session.config().default_message) }

    pub fn get(&self) -> SignScratch { self.tx.borrow().clone() }
    pub fn subscribe(&self) -> watch::Receiver<SignScratch> { self.tx.subscribe() }

    pub fn set_message(&self, message: impl Into<String>) { let m = message.into(); self.update(|s| s.message = m); }
    pub fn set_result(&self, result: Option<ScratchResult>) { self.update(|s| s.result = result); }
    pub fn set_loading(&self, loading: bool) { self.update(|s| s.is_loading = loading); }
    pub fn set_error(&self, error: Option<String>) { self.update(|s| s.error = error); }

    pub fn reset(&self) {
        let fresh = SignScratch::fresh(&self.default_message);
        self.update(|s| *s = fresh);
    }

    /// Attach the page to a session. The returned view resets this store when dropped.
    pub fn mount(&self, session: WalletSession) -> SignView { SignView { session, store: self.clone() } }

    fn update(&self, f: impl FnOnce(&mut SignScratch)) {
        self.tx.send_if_modified(|s| {
            let before = s.clone();
            f(s);
            *s != before
        });
    }
}

/// The sign/send page: drives the session and reports into the scratch store.
pub struct SignView {
    session: WalletSession,
    store: ScratchStore,
}

impl SignView {
    pub fn scratch(&self) -> SignScratch { self.store.get() }
    pub fn session(&self) -> &WalletSession { &self.session }

    /// Sign the current scratch message.
    pub async fn sign_message(&self) -> Result<String, WalletError> {
        self.begin();
        let message = self.store.get().message;
        let outcome = self.session.sign_message(&message).await;
        match &outcome {
            Ok(signature) => self.store.set_result(Some(ScratchResult::Signature(signature.clone()))),
            Err(e) => {
                tracing::warn!("Failed to sign message: {}", e);
                self.store.set_error(Some(e.to_string()));
            }
        }
        self.store.set_loading(false);
        outcome
    }

    /// Send the demo amount to the connected account itself. `Ok(None)` when not connected.
    pub async fn send_transaction(&self) -> Result<Option<TransactionResponse>, WalletError> {
        let Some(address) = self.session.state().address else { return Ok(None) };
        self.begin();
        let outcome = self.session.send_transaction(&address, scratch::DEMO_AMOUNT).await;
        match &outcome {
            Ok(tx) => self.store.set_result(Some(ScratchResult::TransactionHash(tx.hash.clone()))),
            Err(e) => {
                tracing::warn!("Failed to send transaction: {}", e);
                self.store.set_error(Some(e.to_string()));
            }
        }
        self.store.set_loading(false);
        outcome.map(Some)
    }

    /// Block-explorer link for the current result: the transaction, or the signing account.
    pub fn explorer_link(&self) -> Option<String> {
        let result = self.store.get().result?;
        let state = self.session.state();
        let networks = self.session.networks();
        match result {
            ScratchResult::TransactionHash(hash) => networks.tx_url(state.chain_id.as_deref(), &hash),
            ScratchResult::Signature(_) => networks.address_url(state.chain_id.as_deref(), state.address.as_deref()?),
        }
    }

    fn begin(&self) {
        self.store.set_error(None);
        self.store.set_loading(true);
    }
}

impl Drop for SignView {
    fn drop(&mut self) { self.store.reset(); }
}
