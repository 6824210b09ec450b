use std::sync::Arc;

use shared::domain::Address;
use tracing::{info, warn};

use crate::{
    error::{ProviderError, WorkflowError},
    session::Session,
    WalletProvider,
};

pub struct WalletSession {
    provider: Arc<dyn WalletProvider>,
    session: Arc<Session>,
}

impl WalletSession {
    pub fn new(provider: Arc<dyn WalletProvider>, session: Arc<Session>) -> Self {
        Self { provider, session }
    }

    /// Picks up an account the wallet already authorized without prompting.
    pub async fn check_connection(&self) -> Option<Address> {
        match self.provider.authorized_accounts().await {
            Ok(accounts) => match accounts.into_iter().next() {
                Some(account) => {
                    info!(%account, "wallet: found authorized account");
                    self.session.set_account(Some(account.clone())).await;
                    Some(account)
                }
                None => {
                    info!("wallet: no authorized account found");
                    None
                }
            },
            Err(ProviderError::Missing) => {
                warn!("wallet: no provider present; install a wallet to continue");
                None
            }
            Err(err) => {
                warn!(%err, "wallet: authorized account query failed");
                None
            }
        }
    }

    pub async fn connect(&self) -> Result<Address, WorkflowError> {
        let accounts = self.provider.request_accounts().await.map_err(|err| {
            warn!(%err, "wallet: account request failed");
            WorkflowError::from(err)
        })?;
        let account = accounts.into_iter().next().ok_or_else(|| {
            warn!("wallet: account request returned no accounts");
            WorkflowError::UserRejected
        })?;
        info!(%account, "wallet: connected");
        self.session.set_account(Some(account.clone())).await;
        Ok(account)
    }
}

#[cfg(test)]
#[path = "tests/wallet_session_tests.rs"]
mod tests;
