//! Typed errors for the form, the calculator and the request store.
//!
//! None of these is fatal to the application: the UI turns each one into a
//! recoverable message. `anyhow` is only used at the binary edge.

use thiserror::Error;

use crate::form::Stage;
use crate::request::Field;

/// Rejected inputs to the installment formula.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InstallmentError {
    #[error("amount '{0}' is not a number")]
    InvalidAmount(String),

    #[error("amount must be positive (got {0})")]
    NonPositiveAmount(f64),

    #[error("term '{0}' is not a whole number of months")]
    InvalidTerm(String),

    /// A zero-month term has no amortization schedule.
    #[error("term must be at least one month")]
    ZeroTerm,
}

/// Rejected workflow transitions and record conversions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("cannot {action} while {stage:?}")]
    WrongStage { action: &'static str, stage: Stage },

    #[error("fields left empty: {missing:?}")]
    Incomplete { missing: Vec<Field> },

    #[error("{count} field(s) are invalid")]
    InvalidFields { count: usize },

    #[error("a submission is already in progress")]
    AlreadySubmitting,

    #[error("no installment has been computed")]
    MissingInstallment,

    #[error("invalid value '{value}' for {field}")]
    InvalidValue { field: Field, value: String },
}

/// Failures of the create-record collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request to document store failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("document store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode document: {0}")]
    Decode(String),

    #[error("failed to acquire store lock: {0}")]
    Lock(String),

    #[error("submission task ended before reporting a result")]
    Interrupted,
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}
