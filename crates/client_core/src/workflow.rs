use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use shared::domain::{Address, Receipt, Wei};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::{
    catalog::RecordCatalog,
    edit_session,
    error::WorkflowError,
    form::{FormMode, FormState},
    network_guard::NetworkGuard,
    pricing,
    session::Session,
    ClientEvent, NameRegistry,
};

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Validating,
    AwaitingRegisterConfirmation,
    AwaitingRecordConfirmation,
    Done,
    Failed(WorkflowError),
}

/// Releases the in-flight flag when a submission finishes, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives `register` followed by `setRecord`, or `setRecord` alone when
/// editing, and refreshes the catalog once both confirmations are in.
pub struct RegistrationWorkflow {
    registry: Arc<dyn NameRegistry>,
    session: Arc<Session>,
    guard: Arc<NetworkGuard>,
    catalog: Arc<RecordCatalog>,
    state: Mutex<WorkflowState>,
    loading: AtomicBool,
    settle_delay: Duration,
}

impl RegistrationWorkflow {
    pub fn new(
        registry: Arc<dyn NameRegistry>,
        session: Arc<Session>,
        guard: Arc<NetworkGuard>,
        catalog: Arc<RecordCatalog>,
        settle_delay: Duration,
    ) -> Self {
        Self {
            registry,
            session,
            guard,
            catalog,
            state: Mutex::new(WorkflowState::Idle),
            loading: AtomicBool::new(false),
            settle_delay,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub async fn state(&self) -> WorkflowState {
        self.state.lock().await.clone()
    }

    pub async fn mint(&self, form: &mut FormState) -> Result<Receipt, WorkflowError> {
        let _in_flight = self.acquire().await?;
        expect_mode(form, FormMode::Create)?;

        let (name, price) = validate_mint(form)?;

        self.transition(WorkflowState::Validating).await;
        let account = match self.authorize().await {
            Ok(account) => account,
            Err(err) => {
                info!(%err, "workflow: mint rejected before submission");
                self.transition(WorkflowState::Idle).await;
                return Err(err);
            }
        };
        let record = form.record().to_string();

        match self.execute_mint(&account, &name, price, &record).await {
            Ok(receipt) => {
                form.clear_fields();
                self.complete().await;
                Ok(receipt)
            }
            Err(err) => Err(self.fail(err).await),
        }
    }

    pub async fn update(&self, form: &mut FormState) -> Result<Receipt, WorkflowError> {
        let _in_flight = self.acquire().await?;
        expect_mode(form, FormMode::Edit)?;

        let name = form.domain().trim().to_string();
        let record = form.record().to_string();
        if name.is_empty() || record.is_empty() {
            return Err(WorkflowError::InvalidInput(
                "both domain and record are required to update".to_string(),
            ));
        }
        let account = self.authorize().await?;

        self.transition(WorkflowState::AwaitingRecordConfirmation)
            .await;
        match self.submit_record(&account, &name, &record).await {
            Ok(receipt) => {
                edit_session::cancel(form);
                self.complete().await;
                Ok(receipt)
            }
            Err(err) => Err(self.fail(err).await),
        }
    }

    async fn acquire(&self) -> Result<InFlight<'_>, WorkflowError> {
        if self
            .loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("workflow: submission ignored, another one is in flight");
            return Err(WorkflowError::Busy);
        }
        let in_flight = InFlight(&self.loading);
        self.transition(WorkflowState::Idle).await;
        Ok(in_flight)
    }

    async fn authorize(&self) -> Result<Address, WorkflowError> {
        let account = self
            .session
            .account()
            .await
            .ok_or(WorkflowError::NotConnected)?;
        self.guard.require_target().await?;
        Ok(account)
    }

    async fn execute_mint(
        &self,
        account: &Address,
        name: &str,
        price: Wei,
        record: &str,
    ) -> Result<Receipt, WorkflowError> {
        self.transition(WorkflowState::AwaitingRegisterConfirmation)
            .await;
        info!(name, %price, %account, "workflow: submitting register");
        let tx = self.registry.register(account, name, price).await?;
        let receipt = self.registry.wait(&tx).await?;
        if !receipt.succeeded() {
            return Err(WorkflowError::RegistrationRejected {
                name: name.to_string(),
            });
        }
        info!(name, tx = %receipt.transaction_hash, "workflow: name registered");

        self.transition(WorkflowState::AwaitingRecordConfirmation)
            .await;
        self.submit_record(account, name, record).await
    }

    async fn submit_record(
        &self,
        account: &Address,
        name: &str,
        record: &str,
    ) -> Result<Receipt, WorkflowError> {
        info!(name, "workflow: submitting set record");
        let tx = self.registry.set_record(account, name, record).await?;
        let receipt = self.registry.wait(&tx).await?;
        if !receipt.succeeded() {
            return Err(WorkflowError::TransactionFailure(format!(
                "set record for '{name}' reported failure status (tx {})",
                receipt.transaction_hash
            )));
        }
        info!(name, tx = %receipt.transaction_hash, "workflow: record set");
        Ok(receipt)
    }

    async fn complete(&self) {
        self.transition(WorkflowState::Done).await;
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        if let Err(err) = self.catalog.refresh().await {
            self.session
                .notice(format!("registration confirmed but {err}"));
        }
    }

    async fn fail(&self, err: WorkflowError) -> WorkflowError {
        error!(%err, "workflow: failed");
        self.transition(WorkflowState::Failed(err.clone())).await;
        err
    }

    async fn transition(&self, next: WorkflowState) {
        {
            let mut guard = self.state.lock().await;
            if *guard == next {
                return;
            }
            *guard = next.clone();
        }
        self.session.emit(ClientEvent::WorkflowStateChanged(next));
    }
}

/// Checks that need no wallet or registry round trip.
fn validate_mint(form: &FormState) -> Result<(String, Wei), WorkflowError> {
    let name = form.domain().trim().to_string();
    if name.is_empty() {
        return Err(WorkflowError::InvalidInput("domain is empty".to_string()));
    }
    let price = pricing::price(&name)?;
    Ok((name, price))
}

fn expect_mode(form: &FormState, expected: FormMode) -> Result<(), WorkflowError> {
    if form.mode() == expected {
        Ok(())
    } else {
        Err(WorkflowError::ModeMismatch {
            expected,
            actual: form.mode(),
        })
    }
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod tests;
