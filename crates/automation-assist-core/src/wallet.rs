//! Contract with the wallet extension that signs and sends transactions.

use crate::builder::SerializedCallRequest;
use crate::error::{AssistError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Chain id as reported by a provider: a number, a decimal string or a `0x` hex string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChainId {
    Number(u64),
    Text(String),
}

impl ChainId {
    pub fn value(&self) -> Result<u64> {
        match self {
            ChainId::Number(n) => Ok(*n),
            ChainId::Text(s) => {
                let s = s.trim();
                let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                    Some(hex_digits) => u64::from_str_radix(hex_digits, 16),
                    None => s.parse::<u64>(),
                };
                parsed.map_err(|_| AssistError::InvalidResponse(format!("bad chain id '{}'", s)))
            }
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainId::Number(n) => write!(f, "{}", n),
            ChainId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// What the provider receives when asked to send a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub data: String,
    pub from: String,
    pub chain_id: ChainId,
    pub wait_for_transaction: bool,
}

impl TransactionRequest {
    pub fn new(request: &SerializedCallRequest, chain_id: ChainId) -> Self {
        Self {
            data: request.data.clone(),
            from: request.from.clone(),
            chain_id,
            wait_for_transaction: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub status: String,
    #[serde(default)]
    pub raw: Value,
}

impl TransactionResult {
    pub fn is_success(&self) -> bool {
        self.status == "Success"
    }
}

/// A browser or native wallet able to sign for the connected account.
///
/// Account-change notifications are delivered by the host calling
/// `WizardController::account_changed`.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Requests access and returns the authorized accounts.
    async fn connect(&self) -> Result<Vec<String>>;

    async fn chain_id(&self) -> Result<ChainId>;

    async fn change_network(&self, chain_id: u64) -> Result<()>;

    /// Returns the transaction hash.
    async fn send_transaction(&self, request: &TransactionRequest) -> Result<String>;

    async fn wait_for_transaction_with_result(&self, hash: &str) -> Result<TransactionResult>;

    async fn disconnect(&self) -> Result<()>;
}
