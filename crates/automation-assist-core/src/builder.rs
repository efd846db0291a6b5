//! Validates a wizard state and turns it into a serialized registration request.

use crate::automation::AutomationParams;
use crate::encoding::{address_bytes, ArgumentEncoder, BcsEncoder};
use crate::error::{AssistError, Result, ValidationErrors};
use crate::types::{parse_bool, validate, validate_address, MoveType};
use crate::wizard::{ParameterValue, WizardState};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// A call whose every field has passed validation. Both the on-chain and the
/// CLI paths are derived from this value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCall {
    pub module_address: String,
    pub module_name: String,
    pub function_name: String,
    pub type_arguments: Vec<String>,
    /// Normalized values in declaration order.
    pub arguments: Vec<ParameterValue>,
    pub max_gas_amount: u64,
    pub gas_price_cap: u64,
    pub automation_fee_cap: u64,
    pub expiry_time_secs: u64,
}

impl ValidatedCall {
    pub fn function_id(&self) -> String {
        format!(
            "{}::{}::{}",
            self.module_address, self.module_name, self.function_name
        )
    }
}

fn check_u64(errors: &mut ValidationErrors, field: &str, value: &BigUint, allow_zero: bool) -> u64 {
    match u64::try_from(value) {
        Ok(0) if !allow_zero => {
            errors.push(field, "Must be greater than zero");
            0
        }
        Ok(v) => v,
        Err(_) => {
            errors.push(field, format!("Must be at most {}", u64::MAX));
            0
        }
    }
}

/// Booleans are normalized so an empty input reads as `false`.
fn normalize(raw: &str, type_tag: &str) -> String {
    if MoveType::from_type_string(type_tag) == MoveType::Bool {
        parse_bool(raw).unwrap_or(false).to_string()
    } else {
        raw.to_string()
    }
}

/// Checks every field and reports all failures together.
pub fn validate_call(
    state: &WizardState,
    params: &AutomationParams,
) -> std::result::Result<ValidatedCall, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let address_check = validate_address(state.address());
    if !address_check.valid {
        errors.push("address", address_check.error.unwrap_or_default());
    }

    let module_name = state.selected_module().unwrap_or_default().to_string();
    if module_name.is_empty() {
        errors.push("module", "No module selected");
    }
    let function_name = match state.selected_function() {
        Some(f) => f.name.clone(),
        None => {
            errors.push("function", "No function selected");
            String::new()
        }
    };

    let mut arguments = Vec::with_capacity(state.parameter_values().len());
    for (i, param) in state.parameter_values().iter().enumerate() {
        let result = validate(&param.raw, &param.type_tag);
        if result.valid {
            arguments.push(ParameterValue {
                raw: normalize(&param.raw, &param.type_tag),
                type_tag: param.type_tag.clone(),
            });
        } else {
            errors.push(
                format!("param[{}] ({})", i, param.type_tag),
                result.error.unwrap_or_default(),
            );
        }
    }

    for (i, type_arg) in state.type_arguments().iter().enumerate() {
        if type_arg.trim().is_empty() {
            errors.push(format!("type_arg[{}]", i), "Type argument is required");
        }
    }

    let max_gas_amount = check_u64(&mut errors, "max_gas_amount", &params.max_gas_amount, false);
    let gas_price_cap = check_u64(&mut errors, "gas_price_cap", &params.gas_price_cap, false);
    let automation_fee_cap =
        check_u64(&mut errors, "automation_fee_cap", &params.automation_fee_cap, true);
    let expiry_time_secs = check_u64(&mut errors, "expiry_time_secs", &params.expiry_time_secs, false);

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ValidatedCall {
        module_address: state.address().to_string(),
        module_name,
        function_name,
        type_arguments: state
            .type_arguments()
            .iter()
            .map(|t| t.trim().to_string())
            .collect(),
        arguments,
        max_gas_amount,
        gas_price_cap,
        automation_fee_cap,
        expiry_time_secs,
    })
}

/// Automation registration payload, BCS-serialized for the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationRegistration {
    pub sender: [u8; 32],
    pub sequence_number: u64,
    pub module_address: [u8; 32],
    pub module_name: String,
    pub function_name: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<Vec<u8>>,
    pub max_gas_amount: u64,
    pub gas_price_cap: u64,
    pub automation_fee_cap: u64,
    pub expiry_time_secs: u64,
    pub aux_data: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedCallRequest {
    pub registration: AutomationRegistration,
    /// Hex of the BCS bytes of `registration`.
    pub data: String,
    pub from: String,
}

pub struct TransactionBuilder<E: ArgumentEncoder = BcsEncoder> {
    encoder: E,
}

impl Default for TransactionBuilder<BcsEncoder> {
    fn default() -> Self {
        Self::new(BcsEncoder)
    }
}

impl<E: ArgumentEncoder> TransactionBuilder<E> {
    pub fn new(encoder: E) -> Self {
        Self { encoder }
    }

    /// All-or-nothing: nothing is encoded unless every field validates.
    pub fn build(
        &self,
        state: &WizardState,
        params: &AutomationParams,
        sender: &str,
        sequence_number: u64,
    ) -> Result<SerializedCallRequest> {
        let call = validate_call(state, params)?;
        self.encode(&call, sender, sequence_number)
    }

    pub fn encode(
        &self,
        call: &ValidatedCall,
        sender: &str,
        sequence_number: u64,
    ) -> Result<SerializedCallRequest> {
        let arguments = call
            .arguments
            .iter()
            .map(|arg| self.encoder.encode(&arg.raw, &arg.type_tag))
            .collect::<Result<Vec<_>>>()?;

        let registration = AutomationRegistration {
            sender: address_bytes(sender)?,
            sequence_number,
            module_address: address_bytes(&call.module_address)?,
            module_name: call.module_name.clone(),
            function_name: call.function_name.clone(),
            type_arguments: call.type_arguments.clone(),
            arguments,
            max_gas_amount: call.max_gas_amount,
            gas_price_cap: call.gas_price_cap,
            automation_fee_cap: call.automation_fee_cap,
            expiry_time_secs: call.expiry_time_secs,
            aux_data: Vec::new(),
        };

        let bytes = bcs::to_bytes(&registration).map_err(|e| AssistError::Encoding(e.to_string()))?;

        Ok(SerializedCallRequest {
            registration,
            data: hex::encode(bytes),
            from: sender.to_string(),
        })
    }
}
