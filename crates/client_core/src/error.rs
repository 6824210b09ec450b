use shared::error::{ErrorCode, RpcError};
use thiserror::Error;

use crate::form::FormMode;

/// Failure reported by a wallet provider or registry backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("no wallet provider is available")]
    Missing,
    #[error("request was rejected by the user")]
    UserRejected,
    #[error("chain is not recognized by the wallet")]
    UnrecognizedChain,
    #[error(transparent)]
    Rpc(RpcError),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("timed out waiting for confirmation of {0}")]
    ConfirmationTimeout(String),
}

impl From<RpcError> for ProviderError {
    fn from(value: RpcError) -> Self {
        match value.kind() {
            ErrorCode::UserRejected => ProviderError::UserRejected,
            ErrorCode::UnrecognizedChain => ProviderError::UnrecognizedChain,
            _ => ProviderError::Rpc(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("no wallet found; install a wallet such as MetaMask (https://metamask.io/) and retry")]
    ProviderMissing,
    #[error("request was rejected in the wallet")]
    UserRejected,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("wrong network: connected to {current}, switch to {required}")]
    WrongNetwork { current: String, required: String },
    #[error("registration of '{name}' was rejected by the registry")]
    RegistrationRejected { name: String },
    #[error("transaction failed: {0}")]
    TransactionFailure(String),
    #[error("record catalog unavailable: {0}")]
    CatalogUnavailable(String),
    #[error("wallet is not connected")]
    NotConnected,
    #[error("a registration is already in flight")]
    Busy,
    #[error("form is in {actual:?} mode, expected {expected:?}")]
    ModeMismatch { expected: FormMode, actual: FormMode },
}

impl From<ProviderError> for WorkflowError {
    fn from(value: ProviderError) -> Self {
        match value {
            ProviderError::Missing => WorkflowError::ProviderMissing,
            ProviderError::UserRejected => WorkflowError::UserRejected,
            other => WorkflowError::TransactionFailure(other.to_string()),
        }
    }
}
