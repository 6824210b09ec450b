use super::*;
use crate::test_support::{alice, bob, RegistryCall, TestRegistry, TestWallet, TARGET_CHAIN};
use tokio::time::timeout;

const MAINNET: ChainId = ChainId(0x1);

fn options() -> ClientOptions {
    ClientOptions {
        settle_delay: Duration::ZERO,
        ..ClientOptions::default()
    }
}

fn client_with(
    wallet: TestWallet,
    registry: TestRegistry,
) -> (Arc<NameServiceClient>, Arc<TestWallet>, Arc<TestRegistry>) {
    let wallet = Arc::new(wallet);
    let registry = Arc::new(registry);
    let client = NameServiceClient::new(wallet.clone(), registry.clone(), options());
    (client, wallet, registry)
}

fn seeded() -> TestRegistry {
    TestRegistry::seeded(&[("alice", alice(), "sword"), ("bob", bob(), "shuriken")])
}

#[tokio::test]
async fn bootstrap_restores_session_and_loads_catalog_on_target() {
    let (client, _wallet, _registry) =
        client_with(TestWallet::connected(alice(), TARGET_CHAIN), seeded());

    let snapshot = client.bootstrap().await;

    assert_eq!(snapshot.account, Some(alice()));
    assert_eq!(snapshot.chain_id, Some(TARGET_CHAIN));
    assert_eq!(
        snapshot.network,
        Some(NetworkName("Polygon Mumbai Testnet".to_string()))
    );
    assert_eq!(client.catalog().entries().await.len(), 2);
}

#[tokio::test]
async fn bootstrap_off_target_leaves_catalog_unloaded() {
    let (client, _wallet, registry) =
        client_with(TestWallet::connected(alice(), MAINNET), seeded());

    let snapshot = client.bootstrap().await;

    assert_eq!(snapshot.network, Some(NetworkName("Mainnet".to_string())));
    assert!(client.catalog().entries().await.is_empty());
    assert!(registry.calls().await.is_empty());
}

#[tokio::test]
async fn bootstrap_without_authorization_waits_for_connect() {
    let (client, _wallet, registry) =
        client_with(TestWallet::unauthorized(alice(), TARGET_CHAIN), seeded());

    let snapshot = client.bootstrap().await;
    assert!(!snapshot.is_connected());
    assert!(registry.calls().await.is_empty());

    let account = client.connect().await.expect("connect");

    assert_eq!(account, alice());
    assert_eq!(client.catalog().entries().await.len(), 2);
}

#[tokio::test]
async fn switching_to_target_loads_catalog() {
    let (client, _wallet, _registry) =
        client_with(TestWallet::connected(alice(), MAINNET), seeded());
    client.bootstrap().await;

    let outcome = client.switch_network().await.expect("switch");

    assert_eq!(outcome, SwitchOutcome::Switched);
    assert_eq!(client.session().chain_id().await, Some(TARGET_CHAIN));
    assert_eq!(client.catalog().entries().await.len(), 2);
}

#[tokio::test]
async fn reload_discards_state_before_rebuilding() {
    let (client, _wallet, _registry) =
        client_with(TestWallet::connected(alice(), TARGET_CHAIN), seeded());
    client.bootstrap().await;
    let mut events = client.subscribe_events();

    let snapshot = client.reload().await;

    assert_eq!(snapshot.account, Some(alice()));
    assert!(matches!(events.try_recv(), Ok(ClientEvent::SessionInvalidated)));
    assert!(matches!(
        events.try_recv(),
        Ok(ClientEvent::AccountChanged(Some(_)))
    ));
    assert_eq!(client.catalog().entries().await.len(), 2);
}

#[tokio::test]
async fn chain_change_in_wallet_triggers_reload() {
    let (client, wallet, _registry) =
        client_with(TestWallet::connected(alice(), TARGET_CHAIN), seeded());
    client.bootstrap().await;
    assert_eq!(client.catalog().entries().await.len(), 2);
    let mut events = client.subscribe_events();
    let watcher = client.spawn_chain_watcher();

    wallet.user_switches_to(MAINNET).await;

    let reloaded = timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(ClientEvent::NetworkChanged {
                    chain_id: Some(chain_id),
                    ..
                }) if chain_id == MAINNET => break,
                Ok(_) => continue,
                Err(err) => panic!("event stream closed: {err}"),
            }
        }
    })
    .await;

    assert!(reloaded.is_ok());
    assert!(client.catalog().entries().await.is_empty());
    assert!(client.network_guard().require_target().await.is_err());
    watcher.abort();
}

#[tokio::test]
async fn minted_name_shows_up_as_editable() {
    let (client, _wallet, registry) =
        client_with(TestWallet::connected(alice(), TARGET_CHAIN), seeded());
    client.bootstrap().await;

    let mut form = FormState::new();
    form.set_domain("ninja").expect("create mode");
    form.set_record("shadow clone");
    client.workflow().mint(&mut form).await.expect("mint");

    let minted = client.catalog().find("ninja").await.expect("in catalog");
    assert_eq!(minted.owner, alice());
    assert_eq!(minted.record, "shadow clone");
    assert!(registry.calls().await.contains(&RegistryCall::Register {
        name: "ninja".to_string(),
        value: Wei::from_milli(100),
    }));

    let editable: Vec<String> = client
        .edit_session()
        .editable()
        .await
        .into_iter()
        .map(|entry| entry.name)
        .collect();
    assert_eq!(editable, vec!["alice".to_string(), "ninja".to_string()]);

    client
        .edit_session()
        .begin(&mut form, "ninja")
        .await
        .expect("owner may edit");
    assert_eq!(form.mode(), FormMode::Edit);
    assert!(client.edit_session().begin(&mut form, "bob").await.is_err());
}

#[tokio::test]
async fn editing_off_target_reports_wrong_network() {
    let (client, _wallet, _registry) =
        client_with(TestWallet::connected(alice(), MAINNET), seeded());
    client.bootstrap().await;
    let mut form = FormState::new();

    let err = client
        .edit_session()
        .begin(&mut form, "alice")
        .await
        .expect_err("off target");

    assert!(matches!(err, WorkflowError::WrongNetwork { .. }));
    assert_eq!(form.mode(), FormMode::Create);
}

#[tokio::test]
async fn editing_without_an_account_reports_not_connected() {
    let (client, _wallet, _registry) =
        client_with(TestWallet::unauthorized(alice(), TARGET_CHAIN), seeded());
    client.bootstrap().await;
    let mut form = FormState::new();

    let err = client
        .edit_session()
        .begin(&mut form, "alice")
        .await
        .expect_err("not connected");

    assert_eq!(err, WorkflowError::NotConnected);
    assert_eq!(form.mode(), FormMode::Create);
}

#[tokio::test]
async fn guard_exposes_the_configured_target() {
    let (client, _wallet, _registry) =
        client_with(TestWallet::connected(alice(), TARGET_CHAIN), seeded());

    let target = client.network_guard().target();

    assert_eq!(target.chain_id, TARGET_CHAIN);
    assert_eq!(target.native_currency.symbol, "MATIC");
}
