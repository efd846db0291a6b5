//! automation-assist: register Move entry functions as automation tasks
//!
//! Discovers modules and entry functions at an address, validates call
//! parameters against their type tags, and either submits the registration
//! through a wallet provider or renders the equivalent CLI command.

pub mod abi;
pub mod automation;
pub mod builder;
pub mod client;
pub mod collections;
pub mod config;
pub mod encoding;
pub mod error;
pub mod marketplace;
pub mod readiness;
pub mod session;
pub mod submit;
pub mod tasks;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;
pub mod wallet;
pub mod wizard;

pub use abi::{list_entry_functions, list_modules, DataSource, FunctionDescriptor, ModuleSummary};
pub use automation::AutomationParams;
pub use builder::{validate_call, SerializedCallRequest, TransactionBuilder, ValidatedCall};
pub use client::{ChainQuery, SupraRpcClient};
pub use config::{Endpoints, Network};
pub use encoding::{ArgumentEncoder, BcsEncoder};
pub use error::{AssistError, FieldError, Result, ValidationErrors};
pub use readiness::{wait_until_ready, Capability};
pub use session::WizardController;
pub use submit::{render_cli_command, SubmitOutcome, Submitter};
pub use types::{classify, validate, InputKind, MoveType, ValidationResult};
pub use wallet::{ChainId, TransactionResult, WalletProvider};
pub use wizard::{ConnectionMethod, Stage, StageStatus, WizardState};
