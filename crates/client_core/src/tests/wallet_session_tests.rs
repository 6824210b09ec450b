use super::*;
use crate::{
    test_support::{alice, TestWallet, WalletCall, TARGET_CHAIN},
    ClientEvent, MissingWalletProvider,
};

#[tokio::test]
async fn check_connection_adopts_first_authorized_account_without_prompting() {
    let wallet = Arc::new(TestWallet::connected(alice(), TARGET_CHAIN));
    let session = Session::new();
    let wallet_session = WalletSession::new(wallet.clone(), Arc::clone(&session));

    let account = wallet_session.check_connection().await;

    assert_eq!(account, Some(alice()));
    assert_eq!(session.account().await, Some(alice()));
    assert_eq!(wallet.calls().await, vec![WalletCall::AuthorizedAccounts]);
}

#[tokio::test]
async fn check_connection_without_authorization_leaves_session_empty() {
    let wallet = Arc::new(TestWallet::unauthorized(alice(), TARGET_CHAIN));
    let session = Session::new();
    let wallet_session = WalletSession::new(wallet, Arc::clone(&session));

    assert_eq!(wallet_session.check_connection().await, None);
    assert_eq!(session.account().await, None);
}

#[tokio::test]
async fn check_connection_is_silent_when_no_wallet_is_installed() {
    let session = Session::new();
    let wallet_session =
        WalletSession::new(Arc::new(MissingWalletProvider::default()), Arc::clone(&session));

    assert_eq!(wallet_session.check_connection().await, None);
    assert_eq!(session.account().await, None);
}

#[tokio::test]
async fn connect_sets_account_and_announces_it() {
    let wallet = Arc::new(TestWallet::unauthorized(alice(), TARGET_CHAIN));
    let session = Session::new();
    let mut events = session.subscribe();
    let wallet_session = WalletSession::new(wallet.clone(), Arc::clone(&session));

    let account = wallet_session.connect().await.expect("connect");

    assert_eq!(account, alice());
    assert_eq!(session.account().await, Some(alice()));
    assert!(matches!(
        events.try_recv(),
        Ok(ClientEvent::AccountChanged(Some(seen))) if seen == alice()
    ));
    assert_eq!(wallet.calls().await, vec![WalletCall::RequestAccounts]);
}

#[tokio::test]
async fn connect_without_wallet_reports_provider_missing() {
    let session = Session::new();
    let wallet_session =
        WalletSession::new(Arc::new(MissingWalletProvider::default()), Arc::clone(&session));

    let err = wallet_session.connect().await.expect_err("no wallet");

    assert_eq!(err, WorkflowError::ProviderMissing);
    assert_eq!(session.account().await, None);
}

#[tokio::test]
async fn connect_reports_user_rejection_once() {
    let wallet = Arc::new(TestWallet::rejecting(TARGET_CHAIN));
    let session = Session::new();
    let wallet_session = WalletSession::new(wallet.clone(), Arc::clone(&session));

    let err = wallet_session.connect().await.expect_err("rejected");

    assert_eq!(err, WorkflowError::UserRejected);
    assert_eq!(session.account().await, None);
    assert_eq!(wallet.calls().await, vec![WalletCall::RequestAccounts]);
}
