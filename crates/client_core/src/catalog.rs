use std::sync::Arc;

use futures::future::try_join_all;
use shared::domain::{Address, Registration};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    error::{ProviderError, WorkflowError},
    session::Session,
    ClientEvent, NameRegistry,
};

/// Client-side view of every registered name.
///
/// Replaced wholesale by each successful refresh and never patched in place.
pub struct RecordCatalog {
    registry: Arc<dyn NameRegistry>,
    session: Arc<Session>,
    entries: RwLock<Vec<Registration>>,
}

impl RecordCatalog {
    pub fn new(registry: Arc<dyn NameRegistry>, session: Arc<Session>) -> Self {
        Self {
            registry,
            session,
            entries: RwLock::new(Vec::new()),
        }
    }

    pub async fn refresh(&self) -> Result<Vec<Registration>, WorkflowError> {
        let fetched = self.fetch().await.map_err(|err| {
            warn!(%err, "catalog: refresh failed, keeping previous entries");
            WorkflowError::CatalogUnavailable(err.to_string())
        })?;

        *self.entries.write().await = fetched.clone();
        info!(count = fetched.len(), "catalog: refreshed");
        self.session
            .emit(ClientEvent::CatalogUpdated(fetched.clone()));
        Ok(fetched)
    }

    async fn fetch(&self) -> Result<Vec<Registration>, ProviderError> {
        let names = self.registry.get_names().await?;
        let registry = self.registry.as_ref();
        let lookups = names.into_iter().enumerate().map(|(id, name)| async move {
            let (record, owner) =
                futures::try_join!(registry.records(&name), registry.domains(&name))?;
            Ok::<_, ProviderError>(Registration {
                id,
                name,
                owner,
                record,
            })
        });
        try_join_all(lookups).await
    }

    pub async fn entries(&self) -> Vec<Registration> {
        self.entries.read().await.clone()
    }

    pub async fn find(&self, name: &str) -> Option<Registration> {
        self.entries
            .read()
            .await
            .iter()
            .find(|entry| entry.name == name)
            .cloned()
    }

    pub async fn owned_by(&self, account: &Address) -> Vec<Registration> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|entry| &entry.owner == account)
            .cloned()
            .collect()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
