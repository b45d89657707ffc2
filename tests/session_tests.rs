//! Session Tests: connect, events, network switching, signing and sending
//!
//! These tests verify:
//! 1. Missing wallet and failed connect leave the session empty with an error, without an Err
//! 2. Connect populates address, chain id and handles together
//! 3. accountsChanged / chainChanged update the session through the event queue
//! 4. switch_network adds an unknown chain (4902) and re-reads the wallet's chain
//! 5. sign/send fail fast when disconnected and surface wallet rejections
//! 6. Single-flight connect and switch
//! 7. Config loading from a JSON file

use once_cell::sync::Lazy;
use quantinium::provider::mock::calls;
use quantinium::{
    init_logging, EventKind, EventPump, MockWallet, ProviderError, ProviderEvent, SessionState, WalletConfig,
    WalletError, WalletSession, AVALANCHE_TESTNET, U256,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const ACCOUNT: &str = "0xab5801a7d398351b8be11c439e05c5b3259aec9b";
const OTHER_A: &str = "0xAbC0000000000000000000000000000000000001";
const OTHER_B: &str = "0xDeF0000000000000000000000000000000000002";

static LOGGING: Lazy<()> = Lazy::new(init_logging);

fn session(wallet: &MockWallet) -> WalletSession {
    Lazy::force(&LOGGING);
    WalletSession::new(Arc::new(wallet.clone()), WalletConfig::default())
}

async fn connected(wallet: &MockWallet) -> WalletSession {
    let s = session(wallet);
    s.connect().await.expect("connect");
    assert!(s.state().is_connected(), "connect failed: {:?}", s.state().error);
    assert!(s.check_invariants());
    s
}

/// Test: no injected wallet → install prompt, nothing populated
#[tokio::test]
async fn connect_without_wallet() {
    Lazy::force(&LOGGING);
    for s in [
        WalletSession::without_wallet(WalletConfig::default()),
        WalletSession::new(Arc::new(MockWallet::absent()), WalletConfig::default()),
    ] {
        s.connect().await.unwrap();
        let state = s.state();
        assert_eq!(state.error.as_deref(), Some("Please install MetaMask to use this feature!"));
        assert!(state.address.is_none());
        assert!(!state.is_connecting);
        assert!(s.check_invariants());
    }
}

/// Test: approved connect → lowercased address, hex chain id, not connecting
#[tokio::test]
async fn connect_approved() {
    let wallet = MockWallet::new().with_chain(43113);
    let s = connected(&wallet).await;

    let state = s.state();
    assert_eq!(state.address.as_deref(), Some(ACCOUNT));
    assert_eq!(state.chain_id.as_deref(), Some("0xa869"));
    assert!(!state.is_connecting);
    assert!(state.error.is_none());
    assert!(s.is_listening());
    assert_eq!(s.network_name(), "Avalanche Fuji Testnet");
}

/// Test: user rejects the connect prompt → error recorded, call still returns Ok
#[tokio::test]
async fn connect_rejected() {
    let wallet = MockWallet::new();
    wallet.set_connect_error(Some(ProviderError::user_rejected()));
    let s = session(&wallet);

    s.connect().await.unwrap();
    let state = s.state();
    assert_eq!(state.error.as_deref(), Some("User rejected the request."));
    assert!(state.address.is_none() && !state.is_connecting);
    assert!(s.check_invariants());
}

/// Test: is_connecting is published while the wallet prompt is open
#[tokio::test]
async fn connecting_flag_visible_while_in_flight() {
    let wallet = MockWallet::new().with_latency(Duration::from_millis(100));
    let s = session(&wallet);
    let mut rx = s.subscribe();

    let task = tokio::spawn({
        let s = s.clone();
        async move { s.connect().await }
    });

    let during = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|st| st.is_connecting))
        .await
        .expect("connecting published")
        .map(|st| (*st).clone())
        .expect("session alive");
    assert!(during.address.is_none() && during.error.is_none());

    task.await.unwrap().unwrap();
    let after = rx.wait_for(|st| !st.is_connecting).await.map(|st| (*st).clone()).unwrap();
    assert_eq!(after.address.as_deref(), Some(ACCOUNT));
    assert!(s.check_invariants());
}

/// Test: connect failure after approval (network lookup) is recorded with the fallback text
#[tokio::test]
async fn connect_network_failure() {
    let wallet = MockWallet::new();
    wallet.set_network_error(Some(ProviderError::new("")));
    let s = session(&wallet);

    s.connect().await.unwrap();
    assert_eq!(s.state().error.as_deref(), Some("Failed to connect wallet"));
    assert!(s.state().address.is_none());
    assert!(s.provider_handle().is_none());
    assert!(!s.is_listening());
    assert!(s.check_invariants());
}

/// Test: accountsChanged with several accounts → first one wins, chain untouched
#[tokio::test]
async fn accounts_changed_takes_first() {
    let wallet = MockWallet::new();
    let s = connected(&wallet).await;
    let before = s.state();

    assert_eq!(wallet.emit_accounts_changed(&[OTHER_A, OTHER_B]), 1);
    assert_eq!(s.drain_events().await, 1);

    let state = s.state();
    assert_eq!(state.address.as_deref(), Some("0xabc0000000000000000000000000000000000001"));
    assert_eq!(state.chain_id, before.chain_id);
    assert_eq!(state.error, before.error);
    assert!(s.check_invariants());
}

/// Test: empty accountsChanged is a disconnect
#[tokio::test]
async fn accounts_changed_empty_disconnects() {
    let wallet = MockWallet::new();
    let s = connected(&wallet).await;

    wallet.emit_accounts_changed(&[]);
    s.drain_events().await;

    let state = s.state();
    assert!(state.address.is_none() && state.chain_id.is_none());
    assert!(s.provider_handle().is_none() && s.signer_handle().is_none());
    assert_eq!(wallet.listener_count(EventKind::AccountsChanged), 0);
    assert!(s.check_invariants());
}

/// Test: empty accountsChanged leaves exactly what disconnect() leaves
#[tokio::test]
async fn accounts_changed_empty_matches_disconnect() {
    let by_event = MockWallet::new();
    let by_call = MockWallet::new();
    let a = connected(&by_event).await;
    let b = connected(&by_call).await;

    by_event.emit_accounts_changed(&[]);
    a.drain_events().await;
    b.disconnect().await;

    assert_eq!(a.state(), b.state());
    assert_eq!(a.provider_handle().is_none(), b.provider_handle().is_none());
    assert_eq!(a.signer_handle().is_none(), b.signer_handle().is_none());
    assert_eq!(a.is_listening(), b.is_listening());
    assert!(!a.is_listening());
    assert_eq!(
        by_event.listener_count(EventKind::ChainChanged),
        by_call.listener_count(EventKind::ChainChanged)
    );
}

/// Test: events queue up until drained, then apply in arrival order
#[tokio::test]
async fn queued_events_wait_for_drain() {
    let wallet = MockWallet::new();
    let s = connected(&wallet).await;

    wallet.emit_chain_changed("0x5");
    wallet.emit_chain_changed("0x1");
    wallet.emit_chain_changed("0xa869");
    assert_eq!(s.state().chain_id.as_deref(), Some("0x1"));

    assert_eq!(s.drain_events().await, 3);
    assert_eq!(s.state().chain_id.as_deref(), Some("0xa869"));
    assert_eq!(s.drain_events().await, 0);
    assert!(s.check_invariants());
}

/// Test: wallet reports an uppercase hex chain id → stored lowercase, handles rebuilt
#[tokio::test]
async fn chain_changed_normalizes() {
    let wallet = MockWallet::new();
    let s = connected(&wallet).await;
    let epoch = s.provider_handle().unwrap().epoch();

    wallet.emit_chain_changed("0xA869");
    s.drain_events().await;

    assert_eq!(s.state().chain_id.as_deref(), Some("0xa869"));
    assert!(s.provider_handle().unwrap().epoch() > epoch);
    assert!(s.check_invariants());
}

/// Test: events arriving while disconnected do not resurrect the session
#[tokio::test]
async fn events_ignored_while_disconnected() {
    let wallet = MockWallet::new();
    let s = session(&wallet);

    s.handle_event(ProviderEvent::ChainChanged("0xa869".into())).await;
    s.handle_event(ProviderEvent::AccountsChanged(vec![OTHER_A.into()])).await;

    assert_eq!(s.state(), SessionState::default());
    assert!(s.check_invariants());
}

/// Test: spawned pump applies events until shutdown
#[tokio::test]
async fn event_pump_applies_events() {
    let wallet = MockWallet::new();
    let s = connected(&wallet).await;
    let pump = EventPump::spawn(&s);

    wallet.emit_chain_changed("0xa869");
    let mut rx = s.subscribe();
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|st| st.chain_id.as_deref() == Some("0xa869")))
        .await
        .expect("chain change applied")
        .expect("session alive");

    assert!(pump.is_running());
    tokio::time::timeout(Duration::from_secs(2), pump.stop()).await.expect("pump stopped").unwrap();
}

/// Test: disconnect clears everything and is idempotent
#[tokio::test]
async fn disconnect_is_idempotent() {
    let wallet = MockWallet::new();
    let s = connected(&wallet).await;

    s.disconnect().await;
    let once = s.state();
    s.disconnect().await;

    assert_eq!(s.state(), once);
    assert!(once.address.is_none() && once.chain_id.is_none() && once.error.is_none());
    assert_eq!(wallet.listener_count(EventKind::ChainChanged), 0);
    assert!(s.check_invariants());

    // Listener registered again on reconnect
    s.connect().await.unwrap();
    assert_eq!(wallet.listener_count(EventKind::ChainChanged), 1);
}

/// Test: unknown chain (4902) → add-chain with registry metadata → refreshed chain id
#[tokio::test]
async fn switch_adds_unknown_chain() {
    let wallet = MockWallet::new();
    let s = connected(&wallet).await;
    assert!(!wallet.knows_chain(43113));

    s.switch_network(AVALANCHE_TESTNET).await.unwrap();

    assert_eq!(s.state().chain_id.as_deref(), Some("0xa869"));
    assert!(s.state().error.is_none());
    assert!(wallet.calls().iter().any(|c| c == calls::ADD_CHAIN));

    let added = wallet.added_chains();
    assert_eq!(added.len(), 1);
    assert_eq!(added[0]["chainId"], "0xa869");
    assert_eq!(added[0]["chainName"], "Avalanche Fuji Testnet");
    assert_eq!(added[0]["nativeCurrency"]["symbol"], "AVAX");
    assert_eq!(added[0]["nativeCurrency"]["decimals"], 18);
    assert_eq!(added[0]["rpcUrls"][0], "https://api.avax-test.network/ext/bc/C/rpc");
    assert_eq!(added[0]["blockExplorerUrls"][0], "https://testnet.snowtrace.io");
    assert!(s.check_invariants());
}

/// Test: add-chain rejected → AddChainFailed, chain id unchanged
#[tokio::test]
async fn switch_add_chain_rejected() {
    let wallet = MockWallet::new();
    wallet.set_add_error(Some(ProviderError::user_rejected()));
    let s = connected(&wallet).await;

    assert_eq!(s.switch_network(AVALANCHE_TESTNET).await.unwrap_err(), WalletError::AddChainFailed);
    assert_eq!(s.state().chain_id.as_deref(), Some("0x1"));
    assert_eq!(s.state().error.as_deref(), Some("Failed to add network to wallet"));
    assert!(s.check_invariants());
}

/// Test: switch rejected for a reason other than 4902 → generic message stored, chain kept
#[tokio::test]
async fn switch_failure_is_recorded() {
    let wallet = MockWallet::new().with_known_chain(43113);
    wallet.set_switch_error(Some(ProviderError::user_rejected()));
    let s = connected(&wallet).await;

    assert_eq!(s.switch_network(AVALANCHE_TESTNET).await.unwrap_err(), WalletError::SwitchFailed);
    let state = s.state();
    assert_eq!(state.error.as_deref(), Some("Failed to switch network"));
    assert_eq!(state.chain_id.as_deref(), Some("0x1"));
    assert!(wallet.added_chains().is_empty());
    assert!(s.check_invariants());
}

/// Test: unknown registry key → fails before any provider call
#[tokio::test]
async fn switch_unknown_key() {
    let wallet = MockWallet::new();
    let s = connected(&wallet).await;
    wallet.clear_calls();
    let before = s.state();

    let err = s.switch_network("NOPE").await.unwrap_err();
    assert_eq!(err, WalletError::InvalidNetwork("NOPE".into()));
    assert!(wallet.calls().is_empty());
    assert_eq!(s.state(), before);
}

/// Test: switching while disconnected moves the wallet but populates nothing
#[tokio::test]
async fn switch_while_disconnected() {
    let wallet = MockWallet::new().with_known_chain(43113);
    let s = session(&wallet);

    s.switch_network(AVALANCHE_TESTNET).await.unwrap();

    assert_eq!(wallet.chain_id(), 43113);
    assert!(s.state().address.is_none() && s.state().chain_id.is_none());
    assert!(s.provider_handle().is_none());
    assert!(s.check_invariants());
}

/// Test: sign while disconnected → NotConnected, no provider call
#[tokio::test]
async fn sign_requires_connection() {
    let wallet = MockWallet::new();
    let s = session(&wallet);

    let err = s.sign_message("hi").await.unwrap_err();
    assert_eq!(err, WalletError::NotConnected);
    assert_eq!(err.to_string(), "No wallet connected");
    assert!(wallet.calls().is_empty());
}

/// Test: signing clears a previous error and returns the wallet's signature
#[tokio::test]
async fn sign_clears_previous_error() {
    let wallet = MockWallet::new();
    let s = connected(&wallet).await;
    wallet.set_sign_error(Some(ProviderError::user_rejected()));
    assert!(s.sign_message("hi").await.unwrap_err().is_user_rejection());
    assert_eq!(s.state().error.as_deref(), Some("User rejected the request."));

    wallet.set_sign_error(None);
    let signature = s.sign_message("hi").await.unwrap();
    assert!(signature.starts_with("0x"));
    assert!(s.state().error.is_none());
}

/// Test: rejected send → error stored and returned, session otherwise unchanged
#[tokio::test]
async fn send_rejected() {
    let wallet = MockWallet::new();
    let s = connected(&wallet).await;
    wallet.set_send_error(Some(ProviderError::user_rejected()));
    let before = s.state();

    let err = s.send_transaction(ACCOUNT, "0.001").await.unwrap_err();
    assert!(err.is_user_rejection());

    let state = s.state();
    assert_eq!(state.error.as_deref(), Some("User rejected the request."));
    assert_eq!(state.address, before.address);
    assert_eq!(state.chain_id, before.chain_id);
    assert!(s.check_invariants());
}

/// Test: send validates amount and recipient before reaching the wallet
#[tokio::test]
async fn send_validates_input() {
    let wallet = MockWallet::new();
    let s = connected(&wallet).await;
    wallet.clear_calls();

    assert!(matches!(s.send_transaction(ACCOUNT, "abc").await, Err(WalletError::InvalidAmount(_))));
    assert!(matches!(s.send_transaction("0x1234", "0.001").await, Err(WalletError::InvalidAddress(_))));
    assert!(wallet.calls().is_empty());

    let tx = s.send_transaction(ACCOUNT, "0.001").await.unwrap();
    assert_eq!(tx.value, U256::from(1_000_000_000_000_000u64));
    assert_eq!(tx.hash.len(), 66);
    assert!(s.state().error.is_none());
}

/// Test: second connect while the first awaits the wallet is rejected
#[tokio::test]
async fn concurrent_connect_single_flight() {
    let wallet = MockWallet::new().with_latency(Duration::from_millis(50));
    let s = session(&wallet);

    let (a, b) = tokio::join!(s.connect(), s.connect());
    assert!(a.is_ok());
    assert_eq!(b.unwrap_err(), WalletError::ConnectInProgress);
    assert_eq!(wallet.calls().iter().filter(|c| *c == calls::REQUEST_ACCOUNTS).count(), 1);
    assert!(!s.state().is_connecting);
    assert!(s.check_invariants());
}

/// Test: second switch while the first is in flight is rejected
#[tokio::test]
async fn concurrent_switch_single_flight() {
    let wallet = MockWallet::new().with_known_chain(43113).with_latency(Duration::from_millis(20));
    let s = connected(&wallet).await;

    let (a, b) = tokio::join!(s.switch_network(AVALANCHE_TESTNET), s.switch_network(AVALANCHE_TESTNET));
    assert!(a.is_ok());
    assert_eq!(b.unwrap_err(), WalletError::SwitchInProgress);
    assert_eq!(wallet.calls().iter().filter(|c| *c == calls::SWITCH_CHAIN).count(), 1);
}

/// Test: single-flight disabled → overlapping connects both complete
#[tokio::test]
async fn concurrent_connect_without_single_flight() {
    let wallet = MockWallet::new().with_latency(Duration::from_millis(20));
    let s = WalletSession::new(Arc::new(wallet.clone()), WalletConfig::new().with_single_flight(false));

    let (a, b) = tokio::join!(s.connect(), s.connect());
    assert!(a.is_ok() && b.is_ok());
    assert_eq!(s.state().address.as_deref(), Some(ACCOUNT));
    assert_eq!(wallet.listener_count(EventKind::ChainChanged), 1);
    assert!(s.check_invariants());
}

/// Test: config file with a custom registry drives switching and naming
#[tokio::test]
async fn config_from_file() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("wallet.json");
    std::fs::write(
        &path,
        r#"{
            "defaultMessage": "gm",
            "networks": [{
                "key": "SEPOLIA",
                "chainId": "0xaa36a7",
                "chainName": "Sepolia",
                "symbol": "ETH",
                "rpcUrl": "https://rpc.sepolia.org",
                "blockExplorerUrl": "https://sepolia.etherscan.io/"
            }]
        }"#,
    )
    .unwrap();

    let config = WalletConfig::from_json_file(&path).unwrap();
    assert_eq!(config.default_message, "gm");
    assert!(config.single_flight);
    assert!(config.networks.get(AVALANCHE_TESTNET).is_none());

    let wallet = MockWallet::new();
    let s = WalletSession::new(Arc::new(wallet.clone()), config);
    s.connect().await.unwrap();
    s.switch_network("SEPOLIA").await.unwrap();

    assert_eq!(s.state().chain_id.as_deref(), Some("0xaa36a7"));
    assert_eq!(s.network_name(), "Sepolia");
    assert_eq!(
        s.networks().tx_url(s.state().chain_id.as_deref(), "0xfeed").as_deref(),
        Some("https://sepolia.etherscan.io/tx/0xfeed")
    );
    assert!(matches!(s.switch_network(AVALANCHE_TESTNET).await, Err(WalletError::InvalidNetwork(_))));
}

/// Test: malformed config files are reported, not defaulted
#[test]
fn config_rejects_bad_chain_id() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("wallet.json");
    std::fs::write(&path, r#"{"networks": [{"key": "X", "chainId": "nope", "chainName": "X", "symbol": "X", "rpcUrl": "", "blockExplorerUrl": ""}]}"#).unwrap();
    assert!(WalletConfig::from_json_file(&path).is_err());
    assert!(WalletConfig::from_json_file(dir.path().join("missing.json")).is_err());
}
