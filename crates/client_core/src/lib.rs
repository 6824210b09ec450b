use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::StreamExt;
use shared::domain::{
    Address, ChainDescriptor, ChainId, NetworkName, Receipt, Registration, TxHash, Wei,
};
use tokio::{sync::broadcast, task::JoinHandle};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::{info, warn};

pub mod catalog;
pub mod edit_session;
pub mod error;
pub mod form;
pub mod network_guard;
pub mod networks;
pub mod pricing;
pub mod rpc;
pub mod session;
pub mod wallet_session;
pub mod workflow;

#[cfg(test)]
mod test_support;

pub use catalog::RecordCatalog;
pub use edit_session::EditSession;
pub use error::{ProviderError, WorkflowError};
pub use form::{FormMode, FormState};
pub use network_guard::{NetworkGuard, SwitchOutcome};
pub use networks::NetworkTable;
pub use session::{Session, SessionSnapshot};
pub use wallet_session::WalletSession;
pub use workflow::{RegistrationWorkflow, WorkflowState, DEFAULT_SETTLE_DELAY};

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Accounts already authorized for this client; never prompts.
    async fn authorized_accounts(&self) -> Result<Vec<Address>, ProviderError>;
    /// May suspend until the user answers a prompt in the wallet.
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;
    async fn chain_id(&self) -> Result<ChainId, ProviderError>;
    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ProviderError>;
    async fn add_chain(&self, descriptor: &ChainDescriptor) -> Result<(), ProviderError>;
    fn subscribe_chain_changed(&self) -> broadcast::Receiver<ChainId>;
}

/// Stand-in used when no wallet is installed.
pub struct MissingWalletProvider {
    chain_changed: broadcast::Sender<ChainId>,
}

impl Default for MissingWalletProvider {
    fn default() -> Self {
        let (chain_changed, _) = broadcast::channel(1);
        Self { chain_changed }
    }
}

#[async_trait]
impl WalletProvider for MissingWalletProvider {
    async fn authorized_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        Err(ProviderError::Missing)
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        Err(ProviderError::Missing)
    }

    async fn chain_id(&self) -> Result<ChainId, ProviderError> {
        Err(ProviderError::Missing)
    }

    async fn switch_chain(&self, _chain_id: ChainId) -> Result<(), ProviderError> {
        Err(ProviderError::Missing)
    }

    async fn add_chain(&self, _descriptor: &ChainDescriptor) -> Result<(), ProviderError> {
        Err(ProviderError::Missing)
    }

    fn subscribe_chain_changed(&self) -> broadcast::Receiver<ChainId> {
        self.chain_changed.subscribe()
    }
}

/// A submitted registry transaction awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxHandle {
    pub hash: TxHash,
    pub name: String,
}

impl TxHandle {
    pub fn new(hash: TxHash, name: impl Into<String>) -> Self {
        Self {
            hash,
            name: name.into(),
        }
    }
}

#[async_trait]
pub trait NameRegistry: Send + Sync {
    /// Payable; `value` must cover the registry's fee for `name`.
    async fn register(
        &self,
        from: &Address,
        name: &str,
        value: Wei,
    ) -> Result<TxHandle, ProviderError>;
    async fn set_record(
        &self,
        from: &Address,
        name: &str,
        record: &str,
    ) -> Result<TxHandle, ProviderError>;
    async fn get_names(&self) -> Result<Vec<String>, ProviderError>;
    async fn records(&self, name: &str) -> Result<String, ProviderError>;
    async fn domains(&self, name: &str) -> Result<Address, ProviderError>;
    /// Suspends until the transaction is included.
    async fn wait(&self, tx: &TxHandle) -> Result<Receipt, ProviderError>;
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    AccountChanged(Option<Address>),
    NetworkChanged {
        chain_id: Option<ChainId>,
        network: Option<NetworkName>,
    },
    SessionInvalidated,
    CatalogUpdated(Vec<Registration>),
    WorkflowStateChanged(WorkflowState),
    Notice(String),
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub target: ChainDescriptor,
    pub networks: NetworkTable,
    pub settle_delay: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            target: ChainDescriptor::polygon_mumbai(),
            networks: NetworkTable::default(),
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// Wires the session components around one wallet and one registry.
pub struct NameServiceClient {
    provider: Arc<dyn WalletProvider>,
    session: Arc<Session>,
    wallet: WalletSession,
    guard: Arc<NetworkGuard>,
    catalog: Arc<RecordCatalog>,
    workflow: RegistrationWorkflow,
    edit: EditSession,
}

impl NameServiceClient {
    pub fn new(
        provider: Arc<dyn WalletProvider>,
        registry: Arc<dyn NameRegistry>,
        options: ClientOptions,
    ) -> Arc<Self> {
        let session = Session::new();
        let guard = Arc::new(NetworkGuard::new(
            Arc::clone(&provider),
            Arc::clone(&session),
            options.target,
            options.networks,
        ));
        let catalog = Arc::new(RecordCatalog::new(
            Arc::clone(&registry),
            Arc::clone(&session),
        ));
        let workflow = RegistrationWorkflow::new(
            registry,
            Arc::clone(&session),
            Arc::clone(&guard),
            Arc::clone(&catalog),
            options.settle_delay,
        );
        Arc::new(Self {
            wallet: WalletSession::new(Arc::clone(&provider), Arc::clone(&session)),
            edit: EditSession::new(
                Arc::clone(&catalog),
                Arc::clone(&session),
                Arc::clone(&guard),
            ),
            provider,
            session,
            guard,
            catalog,
            workflow,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn wallet(&self) -> &WalletSession {
        &self.wallet
    }

    pub fn network_guard(&self) -> &NetworkGuard {
        &self.guard
    }

    pub fn catalog(&self) -> &RecordCatalog {
        &self.catalog
    }

    pub fn workflow(&self) -> &RegistrationWorkflow {
        &self.workflow
    }

    pub fn edit_session(&self) -> &EditSession {
        &self.edit
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.session.subscribe()
    }

    /// Restores a remembered connection, reads the network, and loads the
    /// catalog when both an account and the target network are present.
    pub async fn bootstrap(&self) -> SessionSnapshot {
        self.wallet.check_connection().await;
        self.guard.current_network().await;
        self.refresh_if_ready().await;
        self.session.snapshot().await
    }

    pub async fn connect(&self) -> Result<Address, WorkflowError> {
        let account = self.wallet.connect().await?;
        self.refresh_if_ready().await;
        Ok(account)
    }

    pub async fn switch_network(&self) -> Result<SwitchOutcome, WorkflowError> {
        let outcome = self.guard.switch_network().await?;
        self.refresh_if_ready().await;
        Ok(outcome)
    }

    /// Discards all session state and rebuilds it from the wallet.
    pub async fn reload(&self) -> SessionSnapshot {
        self.session.invalidate().await;
        self.catalog.clear().await;
        self.bootstrap().await
    }

    async fn refresh_if_ready(&self) {
        let snapshot = self.session.snapshot().await;
        if !snapshot.is_connected() || !self.guard.on_target().await {
            return;
        }
        if let Err(err) = self.catalog.refresh().await {
            self.session.notice(err.to_string());
        }
    }

    /// Reloads the client whenever the wallet reports a chain change.
    pub fn spawn_chain_watcher(self: &Arc<Self>) -> JoinHandle<()> {
        let mut changes = BroadcastStream::new(self.provider.subscribe_chain_changed());
        let client = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(change) = changes.next().await {
                match change {
                    Ok(chain_id) => {
                        info!(%chain_id, "session: chain changed, reloading");
                    }
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        warn!(skipped, "session: missed chain change notifications, reloading");
                    }
                }
                client.reload().await;
            }
        })
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
