//! Error taxonomy shared by every component.

use std::fmt;
use thiserror::Error;

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Itemized list of validation failures. Never empty when returned as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", items.join("; "))
    }
}

#[derive(Error, Debug)]
pub enum AssistError {
    #[error("HTTP request failed: {0}")]
    Request(String),
    #[error("RPC returned error: {0}")]
    Rpc(String),
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
    #[error("Network timeout")]
    Timeout,
    #[error("Account {0} does not exist on the target network")]
    AccountNotFound(String),
    #[error("Wallet unavailable: {0}")]
    WalletUnavailable(String),
    #[error("Connection rejected by user")]
    WalletRejected,
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("Encoding failed: {0}")]
    Encoding(String),
    #[error("Wallet is on chain {actual}, expected chain {expected}")]
    WrongNetwork { expected: u64, actual: u64 },
    #[error("Transaction {hash} failed with status {status}")]
    TransactionFailed { hash: String, status: String },
    #[error("Stage {0} is not available yet")]
    InvalidStage(u8),
}

impl From<reqwest::Error> for AssistError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AssistError::Timeout
        } else {
            AssistError::Request(e.to_string())
        }
    }
}

impl From<ValidationErrors> for AssistError {
    fn from(e: ValidationErrors) -> Self {
        AssistError::Validation(e)
    }
}

pub type Result<T, E = AssistError> = std::result::Result<T, E>;
