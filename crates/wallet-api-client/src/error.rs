use serde_json::Value;
use thiserror::Error;

/// Failure of a single wallet API call. Cloneable so callers can keep it in
/// result logs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvokeError {
    #[error("wallet error {code}: {message}")]
    Remote {
        code: i64,
        message: String,
        data: Option<Value>,
    },
    #[error("request rejected by user: {0}")]
    Rejected(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("wallet connection closed")]
    Closed,
    #[error("response decode failed: {0}")]
    Decode(String),
}

impl InvokeError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("invalid amount `{0}`: expected an unsigned integer in the smallest unit")]
    InvalidAmount(String),
    #[error("invalid transaction data: {0}")]
    InvalidData(String),
    #[error("transaction recipient is missing")]
    MissingRecipient,
}
