//! Wallet event reactions
//!
//! Provider callbacks never touch the session. They push an [`Envelope`] onto the
//! session's queue; `run_events` (or `drain_events`) is the single consumer and
//! applies them one at a time. Each subscription gets a generation number so events
//! still queued from a torn-down subscription are dropped instead of applied.

use super::state::{Listeners, Session};
use super::WalletSession;
use crate::core::chain::{normalize_address, normalize_chain_id};
use crate::provider::{EventHandler, EventKind, ProviderEvent, WalletProvider};
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Debug)]
pub(crate) struct Envelope {
    generation: u64,
    event: ProviderEvent,
}

impl WalletSession {
    /// Subscribe to `chainChanged`/`accountsChanged`. Already subscribed: no-op.
    pub(super) fn register_listeners(&self, s: &mut Session, wallet: &Arc<dyn WalletProvider>) {
        if s.listeners.is_some() { return; }
        let generation = self.next_epoch();
        let chain = wallet.on(EventKind::ChainChanged, self.forwarder(generation));
        let accounts = wallet.on(EventKind::AccountsChanged, self.forwarder(generation));
        s.listeners = Some(Listeners { generation, chain, accounts });
        tracing::debug!(generation, "Wallet listeners registered");
    }

    pub(super) fn remove_listeners(s: &mut Session, wallet: Option<&Arc<dyn WalletProvider>>) {
        let (Some(listeners), Some(wallet)) = (s.listeners.take(), wallet) else { return };
        wallet.remove_listener(EventKind::ChainChanged, listeners.chain);
        wallet.remove_listener(EventKind::AccountsChanged, listeners.accounts);
        tracing::debug!(generation = listeners.generation, "Wallet listeners removed");
    }

    fn forwarder(&self, generation: u64) -> EventHandler {
        let tx = self.inner.events_tx.clone();
        Arc::new(move |event: ProviderEvent| {
            if tx.send(Envelope { generation, event }).is_err() {
                tracing::debug!("Session dropped, discarding wallet event");
            }
        })
    }

    /// Apply one wallet event directly, bypassing the queue.
    ///
    /// Events that need a live session (a chain change, a non-empty account list)
    /// are ignored while disconnected.
    pub async fn handle_event(&self, event: ProviderEvent) {
        match event {
            ProviderEvent::ChainChanged(raw) => self.on_chain_changed(&raw).await,
            ProviderEvent::AccountsChanged(accounts) => self.on_accounts_changed(&accounts),
        }
    }

    /// Process every queued wallet event. Returns how many were taken off the queue.
    pub async fn drain_events(&self) -> usize {
        let mut rx = self.inner.events_rx.lock().await;
        let mut n = 0;
        while let Ok(envelope) = rx.try_recv() {
            self.dispatch(envelope).await;
            n += 1;
        }
        n
    }

    /// Event pump body: apply queued wallet events until `stop` fires.
    /// Usually driven through [`EventPump`](crate::runtime::EventPump).
    pub async fn run_events(&self, mut stop: broadcast::Receiver<()>) {
        let mut rx = self.inner.events_rx.lock().await;
        tracing::debug!("Event pump started");
        loop {
            tokio::select! {
                _ = stop.recv() => break,
                next = rx.recv() => match next {
                    Some(envelope) => self.dispatch(envelope).await,
                    None => break,
                },
            }
        }
        tracing::debug!("Event pump stopped");
    }

    async fn dispatch(&self, envelope: Envelope) {
        let current = self.lock().listeners.map(|l| l.generation);
        if current != Some(envelope.generation) {
            tracing::debug!(event = ?envelope.event, "Dropping event from closed subscription");
            return;
        }
        self.handle_event(envelope.event).await;
    }

    async fn on_chain_changed(&self, raw: &str) {
        let chain_id = match normalize_chain_id(raw) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("Ignoring chainChanged: {}", e);
                return;
            }
        };
        let applied = self.commit(|s| {
            if s.address.is_none() { return false; }
            s.chain_id = Some(chain_id.clone());
            true
        });
        if !applied {
            tracing::debug!(chain_id = %chain_id, "chainChanged while disconnected");
            return;
        }
        tracing::info!(chain_id = %chain_id, "Wallet changed network");

        let Ok(wallet) = self.wallet() else { return };
        if let Err(e) = self.refresh(&wallet).await {
            tracing::warn!("Refreshing handles after chainChanged: {}", e);
            self.record_error(&e);
        }
    }

    fn on_accounts_changed(&self, accounts: &[String]) {
        let Some(first) = accounts.first() else {
            tracing::info!("Wallet reported no accounts");
            self.teardown();
            return;
        };
        let address = normalize_address(first);
        let applied = self.commit(|s| {
            if s.address.is_none() { return false; }
            s.address = Some(address.clone());
            true
        });
        if applied {
            tracing::info!(address = %address, "Wallet changed account");
        } else {
            tracing::debug!("accountsChanged while disconnected");
        }
    }
}
