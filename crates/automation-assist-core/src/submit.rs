//! Submission through the wallet, and the equivalent CLI command.
//!
//! Both paths take the same `ValidatedCall`, so the command line and the
//! signed payload always describe the same registration.

use crate::builder::{SerializedCallRequest, TransactionBuilder, ValidatedCall};
use crate::client::ChainQuery;
use crate::error::{AssistError, Result};
use crate::types::MoveType;
use crate::wallet::{TransactionRequest, TransactionResult, WalletProvider};
use crate::wizard::ParameterValue;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Submitted {
        hash: String,
        result: TransactionResult,
        request: SerializedCallRequest,
    },
    /// The wallet was on another chain. A switch was requested and nothing
    /// was sent; the user has to submit again.
    NetworkSwitchRequested { expected: u64, actual: u64 },
}

pub struct Submitter<'a> {
    wallet: &'a dyn WalletProvider,
    chain: &'a dyn ChainQuery,
    expected_chain_id: u64,
    builder: TransactionBuilder,
}

impl<'a> Submitter<'a> {
    pub fn new(
        wallet: &'a dyn WalletProvider,
        chain: &'a dyn ChainQuery,
        expected_chain_id: u64,
    ) -> Self {
        Self {
            wallet,
            chain,
            expected_chain_id,
            builder: TransactionBuilder::default(),
        }
    }

    pub async fn submit(&self, call: &ValidatedCall, sender: &str) -> Result<SubmitOutcome> {
        let chain_id = self.wallet.chain_id().await?;
        let actual = chain_id.value()?;

        if actual != self.expected_chain_id {
            warn!(
                expected = self.expected_chain_id,
                actual, "wallet on wrong network, requesting switch"
            );
            if let Err(e) = self.wallet.change_network(self.expected_chain_id).await {
                warn!(error = %e, "network switch failed");
                return Err(AssistError::WrongNetwork {
                    expected: self.expected_chain_id,
                    actual,
                });
            }
            return Ok(SubmitOutcome::NetworkSwitchRequested {
                expected: self.expected_chain_id,
                actual,
            });
        }

        let sequence_number = self.chain.sequence_number(sender).await?;
        let request = self.builder.encode(call, sender, sequence_number)?;

        let hash = self
            .wallet
            .send_transaction(&TransactionRequest::new(&request, chain_id))
            .await?;
        info!(hash = %hash, function = %call.function_id(), "transaction sent");

        let result = self.wallet.wait_for_transaction_with_result(&hash).await?;
        if !result.is_success() {
            return Err(AssistError::TransactionFailed {
                hash,
                status: result.status,
            });
        }

        Ok(SubmitOutcome::Submitted {
            hash,
            result,
            request,
        })
    }
}

/// `type:value` in the form the CLI's `--args` flag expects.
pub fn cli_argument(arg: &ParameterValue) -> String {
    let move_type = MoveType::from_type_string(&arg.type_tag);
    let kind = match move_type {
        MoveType::Bool | MoveType::Address => move_type.display_name(),
        ref t if t.integer_bits().is_some() => t.display_name(),
        _ => "string".to_string(),
    };
    shell_quote(&format!("{}:{}", kind, arg.raw))
}

/// Characters a POSIX shell passes through unquoted and unexpanded.
fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_:.,/@+=-".contains(c)
}

fn shell_quote(token: &str) -> String {
    if token.is_empty() || !token.chars().all(is_shell_safe) {
        format!("'{}'", token.replace('\'', r"'\''"))
    } else {
        token.to_string()
    }
}

/// Single-line `supra move automation register` invocation. Makes no network call.
pub fn render_cli_command(call: &ValidatedCall, rpc_url: &str) -> String {
    let mut parts = vec![
        "supra move automation register".to_string(),
        format!("--task-max-gas-amount {}", call.max_gas_amount),
        format!("--task-gas-price-cap {}", call.gas_price_cap),
        format!("--task-expiry-time-secs {}", call.expiry_time_secs),
        format!("--task-automation-fee-cap {}", call.automation_fee_cap),
        format!("--function-id \"{}\"", call.function_id()),
    ];
    if !call.type_arguments.is_empty() {
        let type_args: Vec<String> = call.type_arguments.iter().map(|t| shell_quote(t)).collect();
        parts.push(format!("--type-args {}", type_args.join(" ")));
    }
    if !call.arguments.is_empty() {
        let args: Vec<String> = call.arguments.iter().map(cli_argument).collect();
        parts.push(format!("--args {}", args.join(" ")));
    }
    parts.push(format!("--rpc-url {}", shell_quote(rpc_url)));
    parts.join(" ")
}
