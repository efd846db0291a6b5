//! The four-stage wizard: connect, scan modules, select a function, configure and submit.
//!
//! `WizardState` fields are private; every mutation goes through a named
//! transition so the ordering invariants below always hold:
//!
//! * a function is only selected after a module is selected
//! * `parameter_values` has one slot per parameter type tag of the selected function
//! * stage N+1 only becomes active once stage N is completed

use crate::abi::FunctionDescriptor;
use crate::error::{AssistError, Result, ValidationErrors};
use crate::types::validate_address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    Connect = 1,
    ScanModules = 2,
    SelectFunction = 3,
    ConfigureAndSubmit = 4,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Connect,
        Stage::ScanModules,
        Stage::SelectFunction,
        Stage::ConfigureAndSubmit,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.number() == n)
    }

    pub fn title(self) -> &'static str {
        match self {
            Stage::Connect => "Connect",
            Stage::ScanModules => "Scan modules",
            Stage::SelectFunction => "Select function",
            Stage::ConfigureAndSubmit => "Configure & submit",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.title())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageStatus {
    Pending,
    Active,
    Completed,
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMethod {
    Wallet,
    Manual,
}

/// A raw user value paired with the type tag it must satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterValue {
    pub raw: String,
    pub type_tag: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WizardState {
    connection_method: Option<ConnectionMethod>,
    address: String,
    selected_module: Option<String>,
    selected_function: Option<FunctionDescriptor>,
    parameter_values: Vec<ParameterValue>,
    type_arguments: Vec<String>,
    stage: Stage,
    statuses: BTreeMap<Stage, StageStatus>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardState {
    pub fn new() -> Self {
        let mut statuses: BTreeMap<Stage, StageStatus> = Stage::ALL
            .iter()
            .map(|s| (*s, StageStatus::Pending))
            .collect();
        statuses.insert(Stage::Connect, StageStatus::Active);

        Self {
            connection_method: None,
            address: String::new(),
            selected_module: None,
            selected_function: None,
            parameter_values: Vec::new(),
            type_arguments: Vec::new(),
            stage: Stage::Connect,
            statuses,
        }
    }

    pub fn connection_method(&self) -> Option<ConnectionMethod> {
        self.connection_method
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn selected_module(&self) -> Option<&str> {
        self.selected_module.as_deref()
    }

    pub fn selected_function(&self) -> Option<&FunctionDescriptor> {
        self.selected_function.as_ref()
    }

    pub fn parameter_values(&self) -> &[ParameterValue] {
        &self.parameter_values
    }

    pub fn type_arguments(&self) -> &[String] {
        &self.type_arguments
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn status(&self, stage: Stage) -> &StageStatus {
        self.statuses.get(&stage).unwrap_or(&StageStatus::Pending)
    }

    pub fn statuses(&self) -> impl Iterator<Item = (Stage, &StageStatus)> {
        self.statuses.iter().map(|(s, st)| (*s, st))
    }

    /// Marks every earlier stage completed and `stage` active.
    ///
    /// Moving back is always allowed; moving forward only one stage at a time
    /// and only once the data the target stage works on is present.
    pub(crate) fn advance(&mut self, stage: Stage) -> Result<()> {
        if stage.number() > self.stage.number() + 1 || !self.can_enter(stage) {
            return Err(AssistError::InvalidStage(stage.number()));
        }
        for s in Stage::ALL {
            let status = match s.cmp(&stage) {
                std::cmp::Ordering::Less => StageStatus::Completed,
                std::cmp::Ordering::Equal => StageStatus::Active,
                std::cmp::Ordering::Greater => StageStatus::Pending,
            };
            self.statuses.insert(s, status);
        }
        self.stage = stage;
        Ok(())
    }

    fn can_enter(&self, stage: Stage) -> bool {
        match stage {
            Stage::Connect => true,
            Stage::ScanModules | Stage::SelectFunction => !self.address.is_empty(),
            Stage::ConfigureAndSubmit => {
                self.selected_module.is_some() && self.selected_function.is_some()
            }
        }
    }

    /// Marks `stage` errored without moving.
    pub fn fail(&mut self, stage: Stage, reason: impl Into<String>) {
        self.statuses.insert(stage, StageStatus::Error(reason.into()));
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Stage 1 completes once an address passes the format check.
    pub fn connect(&mut self, method: ConnectionMethod, address: &str) -> Result<()> {
        let check = validate_address(address);
        if !check.valid {
            let mut errors = ValidationErrors::default();
            errors.push("address", check.error.unwrap_or_default());
            return Err(errors.into());
        }

        self.reset();
        self.connection_method = Some(method);
        self.address = address.to_string();
        self.advance(Stage::ScanModules)
    }

    /// Stage 2 completes once a module listing (live or demo) has resolved.
    pub fn modules_loaded(&mut self) -> Result<()> {
        if self.address.is_empty() {
            return Err(AssistError::InvalidStage(Stage::SelectFunction.number()));
        }
        self.clear_selection();
        self.advance(Stage::SelectFunction)
    }

    /// Selecting a module discards any previously selected function.
    pub fn select_module(&mut self, module: &str) -> Result<()> {
        if self.stage < Stage::SelectFunction {
            return Err(AssistError::InvalidStage(Stage::SelectFunction.number()));
        }
        self.clear_selection();
        self.selected_module = Some(module.to_string());
        self.advance(Stage::SelectFunction)
    }

    pub fn select_function(&mut self, function: FunctionDescriptor) -> Result<()> {
        if self.selected_module.is_none() {
            return Err(AssistError::InvalidStage(Stage::SelectFunction.number()));
        }
        self.parameter_values = function
            .parameter_type_tags
            .iter()
            .map(|tag| ParameterValue {
                raw: String::new(),
                type_tag: tag.clone(),
            })
            .collect();
        self.type_arguments = vec![String::new(); function.generic_parameter_count];
        self.selected_function = Some(function);
        self.advance(Stage::ConfigureAndSubmit)
    }

    pub fn set_parameter(&mut self, index: usize, raw: &str) -> Result<()> {
        let slot = self.parameter_values.get_mut(index).ok_or_else(|| {
            let mut errors = ValidationErrors::default();
            errors.push(format!("param[{}]", index), "No such parameter");
            AssistError::Validation(errors)
        })?;
        slot.raw = raw.to_string();
        Ok(())
    }

    pub fn set_type_argument(&mut self, index: usize, value: &str) -> Result<()> {
        let slot = self.type_arguments.get_mut(index).ok_or_else(|| {
            let mut errors = ValidationErrors::default();
            errors.push(format!("type_arg[{}]", index), "No such type argument");
            AssistError::Validation(errors)
        })?;
        *slot = value.trim().to_string();
        Ok(())
    }

    fn clear_selection(&mut self) {
        self.selected_module = None;
        self.selected_function = None;
        self.parameter_values.clear();
        self.type_arguments.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> String {
        format!("0x{}", "1".repeat(64))
    }

    fn function(tags: &[&str], generics: usize) -> FunctionDescriptor {
        FunctionDescriptor {
            name: "process".to_string(),
            parameter_type_tags: tags.iter().map(|t| t.to_string()).collect(),
            generic_parameter_count: generics,
            is_entry: true,
        }
    }

    fn at_stage_four() -> WizardState {
        let mut state = WizardState::new();
        state.connect(ConnectionMethod::Manual, &addr()).unwrap();
        state.modules_loaded().unwrap();
        state.select_module("auto_incr").unwrap();
        state.select_function(function(&["u64", "bool"], 1)).unwrap();
        state
    }

    #[test]
    fn starts_at_connect() {
        let state = WizardState::new();
        assert_eq!(state.stage(), Stage::Connect);
        assert_eq!(state.status(Stage::Connect), &StageStatus::Active);
        assert_eq!(state.status(Stage::ConfigureAndSubmit), &StageStatus::Pending);
    }

    #[test]
    fn advance_marks_earlier_completed_and_later_pending() {
        let mut state = WizardState::new();
        state.connect(ConnectionMethod::Manual, &addr()).unwrap();
        state.advance(Stage::SelectFunction).unwrap();
        assert_eq!(state.status(Stage::Connect), &StageStatus::Completed);
        assert_eq!(state.status(Stage::ScanModules), &StageStatus::Completed);
        assert_eq!(state.status(Stage::SelectFunction), &StageStatus::Active);
        assert_eq!(state.status(Stage::ConfigureAndSubmit), &StageStatus::Pending);
    }

    #[test]
    fn advance_needs_the_stage_inputs() {
        let mut state = WizardState::new();
        assert!(matches!(
            state.advance(Stage::ScanModules),
            Err(AssistError::InvalidStage(2))
        ));
        assert_eq!(state.stage(), Stage::Connect);

        state.connect(ConnectionMethod::Manual, &addr()).unwrap();
        state.advance(Stage::SelectFunction).unwrap();
        assert!(matches!(
            state.advance(Stage::ConfigureAndSubmit),
            Err(AssistError::InvalidStage(4))
        ));
        assert_eq!(state.stage(), Stage::SelectFunction);
        assert_eq!(state.status(Stage::ConfigureAndSubmit), &StageStatus::Pending);
    }

    #[test]
    fn cannot_skip_forward() {
        let mut state = WizardState::new();
        let err = state.advance(Stage::SelectFunction).unwrap_err();
        assert!(matches!(err, AssistError::InvalidStage(3)));
        assert_eq!(state.stage(), Stage::Connect);
    }

    #[test]
    fn fail_does_not_advance() {
        let mut state = WizardState::new();
        state.fail(Stage::Connect, "Account not found");
        assert_eq!(state.stage(), Stage::Connect);
        assert_eq!(
            state.status(Stage::Connect),
            &StageStatus::Error("Account not found".to_string())
        );
    }

    #[test]
    fn connect_rejects_short_address() {
        let mut state = WizardState::new();
        let err = state.connect(ConnectionMethod::Manual, "0x123").unwrap_err();
        match err {
            AssistError::Validation(errors) => assert!(errors.contains_field("address")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(state.stage(), Stage::Connect);
    }

    #[test]
    fn function_requires_module() {
        let mut state = WizardState::new();
        state.connect(ConnectionMethod::Wallet, &addr()).unwrap();
        state.modules_loaded().unwrap();
        assert!(state.select_function(function(&[], 0)).is_err());
        assert!(state.selected_function().is_none());
    }

    #[test]
    fn parameter_slots_follow_function() {
        let state = at_stage_four();
        assert_eq!(state.stage(), Stage::ConfigureAndSubmit);
        assert_eq!(state.parameter_values().len(), 2);
        assert_eq!(state.parameter_values()[1].type_tag, "bool");
        assert_eq!(state.type_arguments().len(), 1);
    }

    #[test]
    fn reselecting_module_discards_function() {
        let mut state = at_stage_four();
        state.select_module("dice_roll").unwrap();
        assert!(state.selected_function().is_none());
        assert!(state.parameter_values().is_empty());
        assert_eq!(state.stage(), Stage::SelectFunction);
        assert_eq!(state.status(Stage::ConfigureAndSubmit), &StageStatus::Pending);
    }

    #[test]
    fn out_of_range_parameter_is_rejected() {
        let mut state = at_stage_four();
        state.set_parameter(0, "42").unwrap();
        assert_eq!(state.parameter_values()[0].raw, "42");
        assert!(state.set_parameter(5, "1").is_err());
        assert!(state.set_type_argument(1, "0x1::coin::Coin").is_err());
    }

    #[test]
    fn reset_returns_to_initial() {
        let mut state = at_stage_four();
        state.reset();
        assert_eq!(state, WizardState::new());
    }

    #[test]
    fn stage_numbers_round_trip() {
        for stage in Stage::ALL {
            assert_eq!(Stage::from_number(stage.number()), Some(stage));
        }
        assert_eq!(Stage::from_number(0), None);
    }
}
