use std::sync::Arc;

use shared::domain::{Address, ChainId, NetworkName};
use tokio::sync::{broadcast, RwLock};
use tracing::info;

use crate::ClientEvent;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub account: Option<Address>,
    pub chain_id: Option<ChainId>,
    pub network: Option<NetworkName>,
}

impl SessionSnapshot {
    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }
}

/// Account and network context shared by every component of one client.
///
/// Writers publish a [`ClientEvent`] for each change that actually alters
/// the stored value.
pub struct Session {
    state: RwLock<SessionSnapshot>,
    events: broadcast::Sender<ClientEvent>,
}

impl Session {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            state: RwLock::new(SessionSnapshot::default()),
            events,
        })
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.read().await.clone()
    }

    pub async fn account(&self) -> Option<Address> {
        self.state.read().await.account.clone()
    }

    pub async fn chain_id(&self) -> Option<ChainId> {
        self.state.read().await.chain_id
    }

    pub async fn set_account(&self, account: Option<Address>) {
        let changed = {
            let mut guard = self.state.write().await;
            if guard.account == account {
                false
            } else {
                guard.account = account.clone();
                true
            }
        };
        if changed {
            self.emit(ClientEvent::AccountChanged(account));
        }
    }

    pub async fn set_network(&self, chain_id: Option<ChainId>, network: Option<NetworkName>) {
        let changed = {
            let mut guard = self.state.write().await;
            if guard.chain_id == chain_id && guard.network == network {
                false
            } else {
                guard.chain_id = chain_id;
                guard.network = network.clone();
                true
            }
        };
        if changed {
            self.emit(ClientEvent::NetworkChanged { chain_id, network });
        }
    }

    /// Drops account and network; the signer context can no longer be trusted.
    pub async fn invalidate(&self) {
        *self.state.write().await = SessionSnapshot::default();
        info!("session: invalidated");
        self.emit(ClientEvent::SessionInvalidated);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }

    pub fn notice(&self, message: impl Into<String>) {
        self.emit(ClientEvent::Notice(message.into()));
    }
}
