//! Runtime - event pump lifecycle
//!
//! ```text
//! EventPump::spawn(&session) ──→ tokio task: session.run_events(stop_rx)
//!        │
//!        └── stop().await ──→ stop signal ──→ task exits ──→ JoinHandle joined
//! ```
//!
//! Dropping a pump without `stop` aborts the task.

use crate::session::WalletSession;
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinHandle};

/// Owned handle to a running event pump.
pub struct EventPump {
    stop: broadcast::Sender<()>,
    task: Option<JoinHandle<()>>,
}

impl EventPump {
    /// Start consuming the session's wallet events on the current runtime.
    pub fn spawn(session: &WalletSession) -> Self {
        let (stop, stop_rx) = broadcast::channel(1);
        let session = session.clone();
        let task = tokio::spawn(async move { session.run_events(stop_rx).await });
        Self { stop, task: Some(task) }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Signal the pump and wait for it to finish the event it is applying.
    pub async fn stop(mut self) -> Result<(), JoinError> {
        let _ = self.stop.send(());
        match self.task.take() {
            Some(task) => task.await,
            None => Ok(()),
        }
    }
}

impl Drop for EventPump {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            tracing::debug!("Event pump dropped without stop, aborting");
            task.abort();
        }
    }
}
