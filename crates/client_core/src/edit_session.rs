use std::sync::Arc;

use shared::domain::{Address, Registration};
use tracing::info;

use crate::{
    catalog::RecordCatalog, error::WorkflowError, form::FormState, network_guard::NetworkGuard,
    session::Session,
};

/// Whether `account` may be offered the edit entry point for `registration`.
///
/// Only an affordance; the registry decides who may call `setRecord`.
pub fn can_edit(registration: &Registration, account: Option<&Address>) -> bool {
    account.is_some_and(|account| &registration.owner == account)
}

pub fn enter_edit(form: &mut FormState, name: &str) {
    form.pin_for_edit(name);
}

pub fn cancel(form: &mut FormState) {
    form.reset();
}

pub struct EditSession {
    catalog: Arc<RecordCatalog>,
    session: Arc<Session>,
    guard: Arc<NetworkGuard>,
}

impl EditSession {
    pub fn new(
        catalog: Arc<RecordCatalog>,
        session: Arc<Session>,
        guard: Arc<NetworkGuard>,
    ) -> Self {
        Self {
            catalog,
            session,
            guard,
        }
    }

    /// Catalog entries the connected account may edit.
    pub async fn editable(&self) -> Vec<Registration> {
        match self.session.account().await {
            Some(account) => self.catalog.owned_by(&account).await,
            None => Vec::new(),
        }
    }

    /// Switches the form to edit `name` if the current account owns it.
    ///
    /// Gated like any mutation: an account and the target network come
    /// before the catalog lookup, which is empty off target.
    pub async fn begin(&self, form: &mut FormState, name: &str) -> Result<(), WorkflowError> {
        let account = self
            .session
            .account()
            .await
            .ok_or(WorkflowError::NotConnected)?;
        self.guard.require_target().await?;
        let registration = self.catalog.find(name).await.ok_or_else(|| {
            WorkflowError::InvalidInput(format!("'{name}' is not in the catalog"))
        })?;
        if !can_edit(&registration, Some(&account)) {
            return Err(WorkflowError::InvalidInput(format!(
                "'{name}' is owned by {}",
                registration.owner
            )));
        }
        enter_edit(form, name);
        info!(name, "edit: entered edit mode");
        Ok(())
    }

    pub fn cancel(&self, form: &mut FormState) {
        cancel(form);
    }
}
