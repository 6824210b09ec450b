use std::sync::Arc;

use shared::domain::{ChainDescriptor, ChainId, NetworkName};
use tracing::{info, warn};

use crate::{
    error::{ProviderError, WorkflowError},
    networks::NetworkTable,
    session::Session,
    WalletProvider,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    Switched,
    /// The wallet did not know the chain and accepted the descriptor instead.
    AddedChain,
}

pub struct NetworkGuard {
    provider: Arc<dyn WalletProvider>,
    session: Arc<Session>,
    target: ChainDescriptor,
    networks: NetworkTable,
}

impl NetworkGuard {
    pub fn new(
        provider: Arc<dyn WalletProvider>,
        session: Arc<Session>,
        target: ChainDescriptor,
        networks: NetworkTable,
    ) -> Self {
        Self {
            provider,
            session,
            target,
            networks,
        }
    }

    pub fn target(&self) -> &ChainDescriptor {
        &self.target
    }

    pub async fn current_network(&self) -> Option<NetworkName> {
        match self.provider.chain_id().await {
            Ok(chain_id) => {
                let network = self.networks.lookup(chain_id);
                if network.is_none() {
                    info!(%chain_id, "network: chain id not in network table");
                }
                self.session.set_network(Some(chain_id), network.clone()).await;
                network
            }
            Err(err) => {
                warn!(%err, "network: failed to read chain id");
                self.session.set_network(None, None).await;
                None
            }
        }
    }

    pub async fn require_network(&self, target: ChainId) -> Result<(), WorkflowError> {
        let snapshot = self.session.snapshot().await;
        if snapshot.chain_id == Some(target) {
            return Ok(());
        }
        let current = match (snapshot.network, snapshot.chain_id) {
            (Some(network), _) => network.0,
            (None, Some(chain_id)) => chain_id.to_string(),
            (None, None) => "an unknown network".to_string(),
        };
        let required = self
            .networks
            .lookup(target)
            .map(|network| network.0)
            .unwrap_or_else(|| target.to_string());
        Err(WorkflowError::WrongNetwork { current, required })
    }

    pub async fn require_target(&self) -> Result<(), WorkflowError> {
        self.require_network(self.target.chain_id).await
    }

    pub async fn on_target(&self) -> bool {
        self.require_target().await.is_ok()
    }

    /// Asks the wallet to move to the target chain, adding it once if the
    /// wallet reports it as unrecognized. Never loops on repeated failures.
    pub async fn switch_network(&self) -> Result<SwitchOutcome, WorkflowError> {
        let chain_id = self.target.chain_id;
        let outcome = match self.provider.switch_chain(chain_id).await {
            Ok(()) => SwitchOutcome::Switched,
            Err(ProviderError::UnrecognizedChain) => {
                info!(%chain_id, "network: chain not recognized by wallet, requesting add");
                self.provider
                    .add_chain(&self.target)
                    .await
                    .map_err(|err| self.report_switch_failure(err))?;
                SwitchOutcome::AddedChain
            }
            Err(err) => return Err(self.report_switch_failure(err)),
        };
        info!(%chain_id, ?outcome, "network: switch requested");
        self.current_network().await;
        Ok(outcome)
    }

    fn report_switch_failure(&self, err: ProviderError) -> WorkflowError {
        warn!(%err, target = %self.target.chain_id, "network: switch failed");
        self.session.notice(format!(
            "could not switch to {}: {err}",
            self.target.chain_name
        ));
        WorkflowError::from(err)
    }
}

#[cfg(test)]
#[path = "tests/network_guard_tests.rs"]
mod tests;
