//! Command handlers that drive a single wizard session.
//!
//! `WizardController` owns the `WizardState` and every mutation goes through
//! one of its `&mut self` handlers. Hosts that drive it from several tasks
//! share it as a [`SharedController`] so mutations stay serialized.

use crate::abi::{
    demo_functions, demo_modules, extract_abi, find_module, list_entry_functions, list_modules,
    retain_named_modules, FunctionDescriptor, Listing, ModuleSummary,
};
use crate::automation::{now_secs, AutomationParams, NetworkSnapshot};
use crate::builder::{validate_call, ValidatedCall};
use crate::client::ChainQuery;
use crate::config::Endpoints;
use crate::error::{AssistError, Result, ValidationErrors};
use crate::marketplace::ModuleSelection;
use crate::readiness::Capability;
use crate::submit::{render_cli_command, SubmitOutcome, Submitter};
use crate::tasks::{fetch_tasks, AutomatedTask};
use crate::types::{validate, ValidationResult};
use crate::wallet::WalletProvider;
use crate::wizard::{ConnectionMethod, Stage, WizardState};
use num_bigint::BigUint;
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_MODULE_COUNT: u32 = 20;

pub type SharedController = Arc<tokio::sync::Mutex<WizardController>>;

pub struct WizardController {
    state: WizardState,
    chain: Arc<dyn ChainQuery>,
    wallet: Option<Arc<dyn WalletProvider>>,
    capability: Capability,
    wallet_account: Option<String>,
    rpc_url: String,
    expected_chain_id: u64,
    max_gas_amount: u64,
    gas_price_cap: u64,
    modules: Option<Listing<ModuleSummary>>,
    functions: Option<Listing<FunctionDescriptor>>,
    module_count: u32,
}

impl WizardController {
    pub fn new(chain: Arc<dyn ChainQuery>, endpoints: &Endpoints) -> Self {
        Self {
            state: WizardState::new(),
            chain,
            wallet: None,
            capability: Capability::Unavailable("no wallet provider".to_string()),
            wallet_account: None,
            rpc_url: endpoints.rpc_url.clone(),
            expected_chain_id: endpoints.expected_chain_id,
            max_gas_amount: endpoints.max_gas_amount,
            gas_price_cap: endpoints.gas_price_cap,
            modules: None,
            functions: None,
            module_count: DEFAULT_MODULE_COUNT,
        }
    }

    /// Attaches a wallet together with the outcome of its readiness check.
    pub fn with_wallet(mut self, wallet: Arc<dyn WalletProvider>, capability: Capability) -> Self {
        self.wallet = Some(wallet);
        self.capability = capability;
        self
    }

    /// Page size for the paginated module listing.
    pub fn with_module_count(mut self, count: u32) -> Self {
        self.module_count = count.max(1);
        self
    }

    pub fn into_shared(self) -> SharedController {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn capability(&self) -> &Capability {
        &self.capability
    }

    pub fn modules(&self) -> Option<&Listing<ModuleSummary>> {
        self.modules.as_ref()
    }

    pub fn functions(&self) -> Option<&Listing<FunctionDescriptor>> {
        self.functions.as_ref()
    }

    pub fn wallet_account(&self) -> Option<&str> {
        self.wallet_account.as_deref()
    }

    fn signing_wallet(&self) -> Result<Arc<dyn WalletProvider>> {
        if let Capability::Unavailable(reason) = &self.capability {
            return Err(AssistError::WalletUnavailable(reason.clone()));
        }
        self.wallet
            .clone()
            .ok_or_else(|| AssistError::WalletUnavailable("no wallet provider".to_string()))
    }

    /// Connects the wallet and checks that its account exists on chain.
    pub async fn connect_wallet(&mut self) -> Result<String> {
        let wallet = match self.signing_wallet() {
            Ok(w) => w,
            Err(e) => {
                self.state.fail(Stage::Connect, e.to_string());
                return Err(e);
            }
        };

        let accounts = match wallet.connect().await {
            Ok(accounts) => accounts,
            Err(e) => {
                self.state.fail(Stage::Connect, e.to_string());
                return Err(e);
            }
        };
        let address = match accounts.into_iter().next() {
            Some(a) => a,
            None => {
                self.state.fail(Stage::Connect, "Connection rejected by user");
                return Err(AssistError::WalletRejected);
            }
        };

        if let Err(e) = self.chain.account(&address).await {
            warn!(address = %address, error = %e, "connected account not found");
            self.state.fail(Stage::Connect, e.to_string());
            return Err(e);
        }

        self.enter_address(ConnectionMethod::Wallet, &address)?;
        self.wallet_account = Some(address.clone());
        info!(address = %address, "wallet connected");
        Ok(address)
    }

    /// Uses an address typed by the user; no wallet is involved.
    pub fn use_manual_address(&mut self, address: &str) -> Result<()> {
        let address = address.trim();
        self.enter_address(ConnectionMethod::Manual, address)?;
        info!(address = %address, "manual address set");
        Ok(())
    }

    fn enter_address(&mut self, method: ConnectionMethod, address: &str) -> Result<()> {
        if let Err(e) = self.state.connect(method, address) {
            self.state.fail(Stage::Connect, e.to_string());
            return Err(e);
        }
        self.modules = None;
        self.functions = None;
        Ok(())
    }

    /// Lists modules at the current address, falling back to demo modules.
    pub async fn scan_modules(&mut self) -> Result<Listing<ModuleSummary>> {
        if self.state.stage() < Stage::ScanModules {
            return Err(AssistError::InvalidStage(Stage::ScanModules.number()));
        }
        let address = self.state.address().to_string();

        let listing = match self.fetch_modules(&address).await {
            Some(modules) => Listing::live(modules),
            None => {
                warn!(address = %address, "no modules found, showing demo modules");
                demo_modules()
            }
        };

        self.state.modules_loaded()?;
        self.functions = None;
        self.modules = Some(listing.clone());
        Ok(listing)
    }

    async fn fetch_modules(&self, address: &str) -> Option<Vec<ModuleSummary>> {
        match self.chain.modules_v3(address, self.module_count).await {
            Ok(raw) => {
                let modules = retain_named_modules(list_modules(&raw));
                if !modules.is_empty() {
                    return Some(modules);
                }
            }
            Err(e) => warn!(address = %address, error = %e, "v3 module listing failed"),
        }

        match self.chain.modules_v2(address).await {
            Ok(raw) => {
                let modules = retain_named_modules(list_modules(&raw));
                (!modules.is_empty()).then_some(modules)
            }
            Err(e) => {
                warn!(address = %address, error = %e, "v2 module listing failed");
                None
            }
        }
    }

    /// Selects a module and loads its entry functions, falling back to demo functions.
    pub async fn select_module(&mut self, module: &str) -> Result<Listing<FunctionDescriptor>> {
        self.state.select_module(module)?;
        let address = self.state.address().to_string();

        let listing = match self.fetch_functions(&address, module).await {
            Some(functions) => Listing::live(functions),
            None => {
                warn!(module, "no entry functions found, showing demo functions");
                demo_functions()
            }
        };

        self.functions = Some(listing.clone());
        Ok(listing)
    }

    async fn fetch_functions(&self, address: &str, module: &str) -> Option<Vec<FunctionDescriptor>> {
        let raw = match self.chain.module(address, module).await {
            Ok(raw) => Some(raw),
            Err(e) => {
                warn!(module, error = %e, "module lookup failed, searching full listing");
                match self.chain.modules_v2(address).await {
                    Ok(list) => find_module(&list, module),
                    Err(e) => {
                        warn!(module, error = %e, "module listing failed");
                        None
                    }
                }
            }
        }?;

        let functions = list_entry_functions(extract_abi(&raw));
        (!functions.is_empty()).then_some(functions)
    }

    pub fn select_function(&mut self, name: &str) -> Result<FunctionDescriptor> {
        let function = self
            .functions
            .as_ref()
            .and_then(|listing| listing.items.iter().find(|f| f.name == name))
            .cloned()
            .ok_or_else(|| {
                let mut errors = ValidationErrors::default();
                errors.push("function", format!("No entry function named {}", name));
                AssistError::Validation(errors)
            })?;
        self.state.select_function(function.clone())?;
        Ok(function)
    }

    /// Stores the value and returns its validation so the field can be flagged.
    pub fn set_parameter(&mut self, index: usize, raw: &str) -> Result<ValidationResult> {
        let raw = raw.trim();
        self.state.set_parameter(index, raw)?;
        let tag = &self.state.parameter_values()[index].type_tag;
        Ok(validate(raw, tag))
    }

    pub fn set_type_argument(&mut self, index: usize, value: &str) -> Result<()> {
        self.state.set_type_argument(index, value)
    }

    /// Configured gas limit, used until the user enters another one.
    pub fn max_gas_amount(&self) -> u64 {
        self.max_gas_amount
    }

    pub fn gas_price_cap(&self) -> u64 {
        self.gas_price_cap
    }

    /// Epoch timing, duration cap and a fee estimate for `max_gas_amount`.
    pub async fn network_snapshot(&self, max_gas_amount: &BigUint) -> NetworkSnapshot {
        NetworkSnapshot::fetch(self.chain.as_ref(), max_gas_amount, now_secs()).await
    }

    /// Registration parameters for `max_gas_amount`, with the fee cap quoted for
    /// that amount.
    pub async fn default_params(&self, max_gas_amount: &BigUint) -> AutomationParams {
        let snapshot = self.network_snapshot(max_gas_amount).await;
        AutomationParams::new(
            max_gas_amount.clone(),
            self.gas_price_cap,
            snapshot.fee.amount().clone(),
            snapshot.default_expiry(),
        )
    }

    pub fn validate(&self, params: &AutomationParams) -> Result<ValidatedCall> {
        validate_call(&self.state, params).map_err(AssistError::from)
    }

    /// Renders the CLI command. Needs no wallet and makes no network call.
    pub fn generate_command(&self, params: &AutomationParams) -> Result<String> {
        let call = self.validate(params)?;
        Ok(render_cli_command(&call, &self.rpc_url))
    }

    /// Signs and sends the registration through the wallet. The wizard stays
    /// at stage 4 whatever the outcome.
    pub async fn submit(&mut self, params: &AutomationParams) -> Result<SubmitOutcome> {
        let call = self.validate(params)?;
        let wallet = self.signing_wallet()?;
        let sender = self
            .wallet_account
            .clone()
            .ok_or_else(|| AssistError::WalletUnavailable("connect a wallet to sign".to_string()))?;

        let submitter = Submitter::new(wallet.as_ref(), self.chain.as_ref(), self.expected_chain_id);
        let result = submitter.submit(&call, &sender).await;
        match &result {
            Ok(_) => self.state.advance(Stage::ConfigureAndSubmit)?,
            Err(e) => self.state.fail(Stage::ConfigureAndSubmit, e.to_string()),
        }
        result
    }

    pub async fn tasks(&self) -> Vec<AutomatedTask> {
        let address = self
            .wallet_account
            .as_deref()
            .unwrap_or_else(|| self.state.address());
        if address.is_empty() {
            return Vec::new();
        }
        fetch_tasks(self.chain.as_ref(), address).await
    }

    /// Enters a marketplace module's address and preselects the module when the scan finds it.
    pub async fn use_marketplace_module(
        &mut self,
        selection: &ModuleSelection,
    ) -> Result<Option<Listing<FunctionDescriptor>>> {
        self.use_manual_address(&selection.address)?;
        let modules = self.scan_modules().await?;
        if modules.items.iter().any(|m| m.name == selection.module) {
            return self.select_module(&selection.module).await.map(Some);
        }
        Ok(None)
    }

    /// Provider notification that the active account changed.
    pub async fn account_changed(&mut self, account: Option<&str>) -> Result<()> {
        match account {
            Some(address) if !address.is_empty() => {
                info!(address = %address, "wallet account changed");
                self.enter_address(ConnectionMethod::Wallet, address)?;
                self.wallet_account = Some(address.to_string());
                self.scan_modules().await.map(|_| ())
            }
            _ => self.disconnect().await,
        }
    }

    pub async fn disconnect(&mut self) -> Result<()> {
        let result = match (&self.wallet, self.wallet_account.take()) {
            (Some(wallet), Some(_)) => wallet.disconnect().await,
            _ => Ok(()),
        };
        self.state.reset();
        self.modules = None;
        self.functions = None;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::DataSource;
    use crate::config::Overrides;
    use crate::testing::{MockChain, MockWallet};
    use crate::wallet::ChainId;
    use crate::wizard::StageStatus;
    use serde_json::json;

    fn addr() -> String {
        format!("0x{}", "ef".repeat(32))
    }

    fn endpoints() -> Endpoints {
        Endpoints::resolve(Overrides::default(), None).unwrap()
    }

    fn chain_with_module() -> Arc<MockChain> {
        let chain = MockChain::default();
        chain.insert_account(&addr(), json!({"sequence_number": "1"}));
        chain.insert_modules_v3(
            &addr(),
            json!({"modules": [{"abi": {"name": "auto_incr"}}, "cursor"]}),
        );
        chain.insert_module(
            &addr(),
            "auto_incr",
            json!({"abi": {"name": "auto_incr", "exposed_functions": [
                {"name": "increment", "is_entry": true, "params": ["&signer", "u64"],
                 "generic_type_params": []},
                {"name": "peek", "is_entry": false, "params": []}
            ]}}),
        );
        Arc::new(chain)
    }

    fn controller(chain: Arc<MockChain>) -> WizardController {
        WizardController::new(chain, &endpoints())
    }

    fn params() -> AutomationParams {
        AutomationParams::new(5000u64, 200u64, 1000u64, 1_700_000_000u64)
    }

    #[tokio::test]
    async fn fee_is_quoted_for_the_requested_gas() {
        let chain = chain_with_module();
        chain.set_view_result(Ok(json!(["1800"])));
        let c = controller(chain.clone());

        let params = c.default_params(&BigUint::from(9000u64)).await;
        assert_eq!(params.max_gas_amount, BigUint::from(9000u64));
        assert_eq!(params.automation_fee_cap, BigUint::from(1800u64));
        assert_eq!(
            chain.call_count(&format!("view {} [\"9000\"]", crate::automation::ESTIMATE_FEE_FUNCTION)),
            1
        );
        assert_eq!(chain.call_count("view "), 1);
    }

    #[tokio::test]
    async fn manual_flow_reaches_stage_four() {
        let mut c = controller(chain_with_module());
        c.use_manual_address(&addr()).unwrap();

        let modules = c.scan_modules().await.unwrap();
        assert_eq!(modules.source, DataSource::Live);
        assert_eq!(modules.items.len(), 1);
        assert_eq!(c.state().stage(), Stage::SelectFunction);

        let functions = c.select_module("auto_incr").await.unwrap();
        assert!(functions.is_live());
        assert_eq!(functions.items.len(), 1);

        c.select_function("increment").unwrap();
        assert_eq!(c.state().stage(), Stage::ConfigureAndSubmit);
        assert!(!c.set_parameter(0, "-1").unwrap().valid);
        assert!(c.set_parameter(0, "10").unwrap().valid);

        let command = c.generate_command(&params()).unwrap();
        assert!(command.contains(&format!("{}::auto_incr::increment", addr())));
        assert!(command.contains("--args u64:10"));
        assert!(command.contains("--rpc-url https://rpc-testnet.supra.com"));
    }

    #[tokio::test]
    async fn v2_used_when_v3_empty() {
        let chain = MockChain::default();
        chain.insert_modules_v3(&addr(), json!({"modules": []}));
        chain.insert_modules_v2(&addr(), json!({"data": ["vault"]}));
        let chain = Arc::new(chain);
        let mut c = controller(chain.clone());
        c.use_manual_address(&addr()).unwrap();

        let modules = c.scan_modules().await.unwrap();
        assert!(modules.is_live());
        assert_eq!(modules.items[0].name, "vault");
        assert_eq!(chain.call_count("modules_v2"), 1);
    }

    #[tokio::test]
    async fn unreachable_chain_degrades_to_demo() {
        let mut c = controller(Arc::new(MockChain::default()));
        c.use_manual_address(&addr()).unwrap();

        let modules = c.scan_modules().await.unwrap();
        assert_eq!(modules.source, DataSource::Demo);
        assert_eq!(c.state().stage(), Stage::SelectFunction);

        let functions = c.select_module(&modules.items[0].name).await.unwrap();
        assert_eq!(functions.source, DataSource::Demo);
        assert!(!functions.is_live());
        assert!(!functions.items.is_empty());
    }

    #[tokio::test]
    async fn module_found_through_full_listing() {
        let chain = MockChain::default();
        chain.insert_modules_v2(
            &addr(),
            json!([{"name": "vault", "abi": {"name": "vault", "exposed_functions": [
                {"name": "sweep", "is_entry": true, "params": ["&signer"]}
            ]}}]),
        );
        let mut c = controller(Arc::new(chain));
        c.use_manual_address(&addr()).unwrap();
        c.scan_modules().await.unwrap();

        let functions = c.select_module("vault").await.unwrap();
        assert!(functions.is_live());
        assert_eq!(functions.items[0].name, "sweep");
    }

    #[tokio::test]
    async fn cannot_scan_before_connecting() {
        let mut c = controller(chain_with_module());
        assert!(matches!(
            c.scan_modules().await,
            Err(AssistError::InvalidStage(2))
        ));
    }

    #[tokio::test]
    async fn bad_manual_address_marks_connect_errored() {
        let mut c = controller(chain_with_module());
        assert!(c.use_manual_address("0x123").is_err());
        assert!(matches!(c.state().status(Stage::Connect), StageStatus::Error(_)));
    }

    #[tokio::test]
    async fn wallet_connect_requires_existing_account() {
        let chain = Arc::new(MockChain::default());
        let wallet = Arc::new(MockWallet::new(&addr(), ChainId::Number(6)));
        let mut c = controller(chain).with_wallet(wallet, Capability::Ready);

        assert!(matches!(
            c.connect_wallet().await,
            Err(AssistError::AccountNotFound(_))
        ));
        assert_eq!(c.state().stage(), Stage::Connect);
        assert!(matches!(c.state().status(Stage::Connect), StageStatus::Error(_)));
    }

    #[tokio::test]
    async fn unavailable_sdk_blocks_signing_but_not_cli() {
        let wallet = Arc::new(MockWallet::new(&addr(), ChainId::Number(6)));
        let mut c = controller(chain_with_module())
            .with_wallet(wallet.clone(), Capability::Unavailable("timed out".into()));

        assert!(matches!(
            c.connect_wallet().await,
            Err(AssistError::WalletUnavailable(_))
        ));

        c.use_manual_address(&addr()).unwrap();
        c.scan_modules().await.unwrap();
        c.select_module("auto_incr").await.unwrap();
        c.select_function("increment").unwrap();
        c.set_parameter(0, "1").unwrap();

        assert!(c.generate_command(&params()).is_ok());
        assert!(matches!(
            c.submit(&params()).await,
            Err(AssistError::WalletUnavailable(_))
        ));
        assert_eq!(wallet.sent_count(), 0);
    }

    #[tokio::test]
    async fn wallet_submit_end_to_end() {
        let chain = chain_with_module();
        let wallet = Arc::new(MockWallet::new(&addr(), ChainId::Text("6".into())));
        let mut c = controller(chain).with_wallet(wallet.clone(), Capability::Ready);

        assert_eq!(c.connect_wallet().await.unwrap(), addr());
        c.scan_modules().await.unwrap();
        c.select_module("auto_incr").await.unwrap();
        c.select_function("increment").unwrap();
        c.set_parameter(0, "5").unwrap();

        let outcome = c.submit(&params()).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Submitted { .. }));
        assert_eq!(wallet.sent_count(), 1);
        assert_eq!(c.state().stage(), Stage::ConfigureAndSubmit);

        c.submit(&params()).await.unwrap();
        assert_eq!(wallet.sent_count(), 2);
        assert_eq!(c.state().stage(), Stage::ConfigureAndSubmit);
    }

    #[tokio::test]
    async fn invalid_parameters_block_submission() {
        let wallet = Arc::new(MockWallet::new(&addr(), ChainId::Number(6)));
        let mut c = controller(chain_with_module()).with_wallet(wallet.clone(), Capability::Ready);
        c.connect_wallet().await.unwrap();
        c.scan_modules().await.unwrap();
        c.select_module("auto_incr").await.unwrap();
        c.select_function("increment").unwrap();

        match c.submit(&params()).await {
            Err(AssistError::Validation(errors)) => assert!(errors.contains_field("param[0] (u64)")),
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
        assert_eq!(wallet.sent_count(), 0);
    }

    #[tokio::test]
    async fn account_change_rescans_and_disconnect_resets() {
        let chain = chain_with_module();
        let wallet = Arc::new(MockWallet::new(&addr(), ChainId::Number(6)));
        let mut c = controller(chain.clone()).with_wallet(wallet.clone(), Capability::Ready);
        c.connect_wallet().await.unwrap();

        c.account_changed(Some(&addr())).await.unwrap();
        assert_eq!(chain.call_count("modules_v3"), 1);
        assert_eq!(c.state().stage(), Stage::SelectFunction);

        c.account_changed(None).await.unwrap();
        assert_eq!(*wallet.disconnects.lock().unwrap(), 1);
        assert_eq!(c.state(), &WizardState::new());
        assert!(c.modules().is_none());
        assert!(c.wallet_account().is_none());
    }

    #[tokio::test]
    async fn marketplace_module_preselects() {
        let mut c = controller(chain_with_module());
        let selection = ModuleSelection {
            address: addr(),
            module: "auto_incr".to_string(),
        };
        let functions = c.use_marketplace_module(&selection).await.unwrap();
        assert!(functions.is_some());
        assert_eq!(c.state().selected_module(), Some("auto_incr"));

        let missing = ModuleSelection {
            address: addr(),
            module: "nope".to_string(),
        };
        assert!(c.use_marketplace_module(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn shared_controller_serializes_handlers() {
        let shared = controller(chain_with_module()).into_shared();
        shared.lock().await.use_manual_address(&addr()).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                tokio::spawn(async move { shared.lock().await.scan_modules().await.map(|_| ()) })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(shared.lock().await.state().stage(), Stage::SelectFunction);
    }
}
