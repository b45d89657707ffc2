//! Opaque connection handles owned by the session
//!
//! A new pair is built on connect and on every chain change; they are never
//! mutated in place. `epoch` tells two generations apart.

use super::{NetworkInfo, Signer, TransactionRequest, TransactionResponse, WalletProvider};
use crate::error::ProviderError;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct BrowserProvider {
    wallet: Arc<dyn WalletProvider>,
    epoch: u64,
}

impl BrowserProvider {
    pub(crate) fn new(wallet: Arc<dyn WalletProvider>, epoch: u64) -> Self { Self { wallet, epoch } }

    pub fn epoch(&self) -> u64 { self.epoch }

    pub async fn get_network(&self) -> Result<NetworkInfo, ProviderError> { self.wallet.get_network().await }

    pub async fn get_signer(&self) -> Result<SignerHandle, ProviderError> {
        let signer = self.wallet.get_signer().await?;
        Ok(SignerHandle { signer, epoch: self.epoch })
    }
}

impl fmt::Debug for BrowserProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.debug_struct("BrowserProvider").field("epoch", &self.epoch).finish() }
}

#[derive(Clone)]
pub struct SignerHandle {
    signer: Arc<dyn Signer>,
    epoch: u64,
}

impl SignerHandle {
    pub fn epoch(&self) -> u64 { self.epoch }
    pub async fn address(&self) -> Result<String, ProviderError> { self.signer.address().await }
    pub async fn sign_message(&self, message: &str) -> Result<String, ProviderError> { self.signer.sign_message(message).await }
    pub async fn send_transaction(&self, tx: TransactionRequest) -> Result<TransactionResponse, ProviderError> { self.signer.send_transaction(tx).await }
}

impl fmt::Debug for SignerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.debug_struct("SignerHandle").field("epoch", &self.epoch).finish() }
}
