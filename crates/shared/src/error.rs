use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    UserRejected,
    UnrecognizedChain,
    MethodNotFound,
    InvalidParams,
    Internal,
    Other,
}

impl ErrorCode {
    pub const USER_REJECTED: i64 = 4001;
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL: i64 = -32603;

    pub fn from_wire(code: i64) -> Self {
        match code {
            Self::USER_REJECTED => ErrorCode::UserRejected,
            Self::UNRECOGNIZED_CHAIN => ErrorCode::UnrecognizedChain,
            Self::METHOD_NOT_FOUND => ErrorCode::MethodNotFound,
            Self::INVALID_PARAMS => ErrorCode::InvalidParams,
            Self::INTERNAL => ErrorCode::Internal,
            _ => ErrorCode::Other,
        }
    }

    pub fn wire(self) -> i64 {
        match self {
            ErrorCode::UserRejected => Self::USER_REJECTED,
            ErrorCode::UnrecognizedChain => Self::UNRECOGNIZED_CHAIN,
            ErrorCode::MethodNotFound => Self::METHOD_NOT_FOUND,
            ErrorCode::InvalidParams => Self::INVALID_PARAMS,
            ErrorCode::Internal | ErrorCode::Other => Self::INTERNAL,
        }
    }
}

/// JSON-RPC error object as carried in a response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("rpc error {code}: {message}")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.wire(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorCode {
        ErrorCode::from_wire(self.code)
    }
}
