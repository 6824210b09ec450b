use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use shared::domain::{
    Address, BlockNumber, ChainDescriptor, ChainId, Receipt, TxHash, TxStatus, Wei,
};
use tokio::sync::{broadcast, Mutex, Notify};

use crate::{error::ProviderError, NameRegistry, TxHandle, WalletProvider};

pub const TARGET_CHAIN: ChainId = ChainId(0x13881);

pub fn alice() -> Address {
    Address::new("0xA11CE00000000000000000000000000000000001")
}

pub fn bob() -> Address {
    Address::new("0xB0B0000000000000000000000000000000000002")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletCall {
    AuthorizedAccounts,
    RequestAccounts,
    ChainId,
    SwitchChain(ChainId),
    AddChain(ChainId),
}

pub struct TestWallet {
    authorized: Vec<Address>,
    request_result: Result<Vec<Address>, ProviderError>,
    chain: Mutex<ChainId>,
    known_chains: Mutex<HashSet<ChainId>>,
    switch_error: Option<ProviderError>,
    add_error: Option<ProviderError>,
    pub calls: Arc<Mutex<Vec<WalletCall>>>,
    chain_changed: broadcast::Sender<ChainId>,
}

impl TestWallet {
    pub fn connected(account: Address, chain: ChainId) -> Self {
        let (chain_changed, _) = broadcast::channel(16);
        Self {
            authorized: vec![account.clone()],
            request_result: Ok(vec![account]),
            chain: Mutex::new(chain),
            known_chains: Mutex::new(HashSet::from([chain, TARGET_CHAIN])),
            switch_error: None,
            add_error: None,
            calls: Arc::new(Mutex::new(Vec::new())),
            chain_changed,
        }
    }

    pub fn unauthorized(account: Address, chain: ChainId) -> Self {
        let mut wallet = Self::connected(account, chain);
        wallet.authorized.clear();
        wallet
    }

    pub fn rejecting(chain: ChainId) -> Self {
        let mut wallet = Self::unauthorized(alice(), chain);
        wallet.request_result = Err(ProviderError::UserRejected);
        wallet
    }

    pub fn without_known_chain(self, chain: ChainId) -> Self {
        self.known_chains.try_lock().expect("fresh wallet").remove(&chain);
        self
    }

    pub fn with_switch_error(mut self, err: ProviderError) -> Self {
        self.switch_error = Some(err);
        self
    }

    pub fn with_add_error(mut self, err: ProviderError) -> Self {
        self.add_error = Some(err);
        self
    }

    pub async fn calls(&self) -> Vec<WalletCall> {
        self.calls.lock().await.clone()
    }

    /// Simulates the user switching networks inside the wallet.
    pub async fn user_switches_to(&self, chain: ChainId) {
        *self.chain.lock().await = chain;
        let _ = self.chain_changed.send(chain);
    }
}

#[async_trait]
impl WalletProvider for TestWallet {
    async fn authorized_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.calls.lock().await.push(WalletCall::AuthorizedAccounts);
        Ok(self.authorized.clone())
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.calls.lock().await.push(WalletCall::RequestAccounts);
        self.request_result.clone()
    }

    async fn chain_id(&self) -> Result<ChainId, ProviderError> {
        self.calls.lock().await.push(WalletCall::ChainId);
        Ok(*self.chain.lock().await)
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ProviderError> {
        self.calls.lock().await.push(WalletCall::SwitchChain(chain_id));
        if let Some(err) = &self.switch_error {
            return Err(err.clone());
        }
        if !self.known_chains.lock().await.contains(&chain_id) {
            return Err(ProviderError::UnrecognizedChain);
        }
        *self.chain.lock().await = chain_id;
        Ok(())
    }

    async fn add_chain(&self, descriptor: &ChainDescriptor) -> Result<(), ProviderError> {
        self.calls
            .lock()
            .await
            .push(WalletCall::AddChain(descriptor.chain_id));
        if let Some(err) = &self.add_error {
            return Err(err.clone());
        }
        self.known_chains.lock().await.insert(descriptor.chain_id);
        *self.chain.lock().await = descriptor.chain_id;
        Ok(())
    }

    fn subscribe_chain_changed(&self) -> broadcast::Receiver<ChainId> {
        self.chain_changed.subscribe()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCall {
    Register { name: String, value: Wei },
    SetRecord { name: String, record: String },
    GetNames,
    Records(String),
    Domains(String),
    Wait(TxHash),
}

#[derive(Default)]
struct RegistryState {
    names: Vec<String>,
    owners: HashMap<String, Address>,
    records: HashMap<String, String>,
    receipts: HashMap<TxHash, Receipt>,
    next_tx: u64,
}

pub struct TestRegistry {
    state: Mutex<RegistryState>,
    register_status: TxStatus,
    set_record_status: TxStatus,
    register_error: Option<ProviderError>,
    failing_record_lookup: Mutex<Option<String>>,
    hold_confirmation: Option<Arc<Notify>>,
    pub calls: Arc<Mutex<Vec<RegistryCall>>>,
}

impl TestRegistry {
    pub fn empty() -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            register_status: TxStatus::Success,
            set_record_status: TxStatus::Success,
            register_error: None,
            failing_record_lookup: Mutex::new(None),
            hold_confirmation: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn seeded(entries: &[(&str, Address, &str)]) -> Self {
        let registry = Self::empty();
        {
            let mut state = registry.state.try_lock().expect("fresh registry");
            for (name, owner, record) in entries {
                state.names.push((*name).to_string());
                state.owners.insert((*name).to_string(), owner.clone());
                state
                    .records
                    .insert((*name).to_string(), (*record).to_string());
            }
        }
        registry
    }

    pub fn with_register_status(mut self, status: TxStatus) -> Self {
        self.register_status = status;
        self
    }

    pub fn with_set_record_status(mut self, status: TxStatus) -> Self {
        self.set_record_status = status;
        self
    }

    pub fn with_register_error(mut self, err: ProviderError) -> Self {
        self.register_error = Some(err);
        self
    }

    /// Blocks every `wait` until the returned handle is notified.
    pub fn holding_confirmations(mut self) -> (Self, Arc<Notify>) {
        let notify = Arc::new(Notify::new());
        self.hold_confirmation = Some(Arc::clone(&notify));
        (self, notify)
    }

    pub async fn fail_record_lookup_for(&self, name: &str) {
        *self.failing_record_lookup.lock().await = Some(name.to_string());
    }

    pub async fn calls(&self) -> Vec<RegistryCall> {
        self.calls.lock().await.clone()
    }

    pub async fn register_calls(&self) -> usize {
        self.calls()
            .await
            .iter()
            .filter(|call| matches!(call, RegistryCall::Register { .. }))
            .count()
    }

    pub async fn set_record_calls(&self) -> usize {
        self.calls()
            .await
            .iter()
            .filter(|call| matches!(call, RegistryCall::SetRecord { .. }))
            .count()
    }

    fn issue(state: &mut RegistryState, status: TxStatus) -> TxHash {
        state.next_tx += 1;
        let hash = TxHash(format!("0x{:064x}", state.next_tx));
        state.receipts.insert(
            hash.clone(),
            Receipt {
                transaction_hash: hash.clone(),
                status,
                block_number: BlockNumber(state.next_tx),
            },
        );
        hash
    }
}

#[async_trait]
impl NameRegistry for TestRegistry {
    async fn register(
        &self,
        from: &Address,
        name: &str,
        value: Wei,
    ) -> Result<TxHandle, ProviderError> {
        self.calls.lock().await.push(RegistryCall::Register {
            name: name.to_string(),
            value,
        });
        if let Some(err) = &self.register_error {
            return Err(err.clone());
        }
        let mut state = self.state.lock().await;
        if self.register_status == TxStatus::Success {
            state.names.push(name.to_string());
            state.owners.insert(name.to_string(), from.clone());
            state.records.insert(name.to_string(), String::new());
        }
        let hash = Self::issue(&mut state, self.register_status);
        Ok(TxHandle::new(hash, name))
    }

    async fn set_record(
        &self,
        _from: &Address,
        name: &str,
        record: &str,
    ) -> Result<TxHandle, ProviderError> {
        self.calls.lock().await.push(RegistryCall::SetRecord {
            name: name.to_string(),
            record: record.to_string(),
        });
        let mut state = self.state.lock().await;
        if self.set_record_status == TxStatus::Success {
            state.records.insert(name.to_string(), record.to_string());
        }
        let hash = Self::issue(&mut state, self.set_record_status);
        Ok(TxHandle::new(hash, name))
    }

    async fn get_names(&self) -> Result<Vec<String>, ProviderError> {
        self.calls.lock().await.push(RegistryCall::GetNames);
        Ok(self.state.lock().await.names.clone())
    }

    async fn records(&self, name: &str) -> Result<String, ProviderError> {
        self.calls
            .lock()
            .await
            .push(RegistryCall::Records(name.to_string()));
        if self.failing_record_lookup.lock().await.as_deref() == Some(name) {
            return Err(ProviderError::Transport(format!("records({name}) timed out")));
        }
        Ok(self
            .state
            .lock()
            .await
            .records
            .get(name)
            .cloned()
            .unwrap_or_default())
    }

    async fn domains(&self, name: &str) -> Result<Address, ProviderError> {
        self.calls
            .lock()
            .await
            .push(RegistryCall::Domains(name.to_string()));
        self.state
            .lock()
            .await
            .owners
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::Transport(format!("no owner for {name}")))
    }

    async fn wait(&self, tx: &TxHandle) -> Result<Receipt, ProviderError> {
        self.calls
            .lock()
            .await
            .push(RegistryCall::Wait(tx.hash.clone()));
        if let Some(notify) = &self.hold_confirmation {
            notify.notified().await;
        }
        self.state
            .lock()
            .await
            .receipts
            .get(&tx.hash)
            .cloned()
            .ok_or_else(|| ProviderError::Transport(format!("unknown tx {}", tx.hash)))
    }
}
