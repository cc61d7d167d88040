//! One submitted call and its outcome.
//!
//! A [`PendingInvocation`] can only become an [`InvocationResult`] by being
//! consumed in [`PendingInvocation::settle`], so a settled result can never
//! go back to pending or settle twice.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;
use wallet_api_client::InvokeError;

use crate::inputs::{ComposeError, RawValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvocationStatus {
    Pending,
    Success,
    Error,
}

impl InvocationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Error => "ERROR",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvocationError {
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error(transparent)]
    Invoke(#[from] InvokeError),
    #[error("operation panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Value),
    Error(InvocationError),
}

impl From<Result<Value, InvocationError>> for Outcome {
    fn from(result: Result<Value, InvocationError>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(err) => Self::Error(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingInvocation {
    uuid: Uuid,
    operation_id: String,
    inputs: Vec<RawValue>,
    queried_at: DateTime<Utc>,
}

impl PendingInvocation {
    pub fn new(operation_id: impl Into<String>, inputs: Vec<RawValue>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            operation_id: operation_id.into(),
            inputs,
            queried_at: Utc::now(),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    pub fn inputs(&self) -> &[RawValue] {
        &self.inputs
    }

    pub fn queried_at(&self) -> DateTime<Utc> {
        self.queried_at
    }

    pub fn status(&self) -> InvocationStatus {
        InvocationStatus::Pending
    }

    pub fn settle(self, outcome: Outcome) -> InvocationResult {
        self.settle_at(outcome, Utc::now())
    }

    fn settle_at(self, outcome: Outcome, responded_at: DateTime<Utc>) -> InvocationResult {
        InvocationResult {
            uuid: self.uuid,
            operation_id: self.operation_id,
            inputs: self.inputs,
            queried_at: self.queried_at,
            responded_at: responded_at.max(self.queried_at),
            outcome,
        }
    }
}

/// A settled call. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationResult {
    uuid: Uuid,
    operation_id: String,
    inputs: Vec<RawValue>,
    queried_at: DateTime<Utc>,
    responded_at: DateTime<Utc>,
    outcome: Outcome,
}

impl InvocationResult {
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Raw slot values as they were before any modifier ran.
    pub fn inputs(&self) -> &[RawValue] {
        &self.inputs
    }

    pub fn queried_at(&self) -> DateTime<Utc> {
        self.queried_at
    }

    pub fn responded_at(&self) -> DateTime<Utc> {
        self.responded_at
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.responded_at - self.queried_at
    }

    pub fn status(&self) -> InvocationStatus {
        match self.outcome {
            Outcome::Success(_) => InvocationStatus::Success,
            Outcome::Error(_) => InvocationStatus::Error,
        }
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn data(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Success(value) => Some(value),
            Outcome::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&InvocationError> {
        match &self.outcome {
            Outcome::Success(_) => None,
            Outcome::Error(err) => Some(err),
        }
    }
}
