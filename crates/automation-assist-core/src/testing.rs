//! In-memory collaborators for unit tests.

use crate::client::ChainQuery;
use crate::error::{AssistError, Result};
use crate::wallet::{ChainId, TransactionRequest, TransactionResult, WalletProvider};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

fn missing(what: &str) -> AssistError {
    AssistError::Rpc(format!("{} returned HTTP 404", what))
}

#[derive(Default)]
pub struct MockChain {
    accounts: Mutex<HashMap<String, Value>>,
    modules_v3: Mutex<HashMap<String, Value>>,
    modules_v2: Mutex<HashMap<String, Value>>,
    modules: Mutex<HashMap<(String, String), Value>>,
    tasks: Mutex<HashMap<String, Value>>,
    resources: Mutex<HashMap<String, Value>>,
    view_result: Mutex<Option<std::result::Result<Value, String>>>,
    pub calls: Mutex<Vec<String>>,
}

impl MockChain {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn insert_account(&self, address: &str, account: Value) {
        self.accounts.lock().unwrap().insert(address.to_string(), account);
    }

    pub fn insert_modules_v3(&self, address: &str, raw: Value) {
        self.modules_v3.lock().unwrap().insert(address.to_string(), raw);
    }

    pub fn insert_modules_v2(&self, address: &str, raw: Value) {
        self.modules_v2.lock().unwrap().insert(address.to_string(), raw);
    }

    pub fn insert_module(&self, address: &str, name: &str, raw: Value) {
        self.modules
            .lock()
            .unwrap()
            .insert((address.to_string(), name.to_string()), raw);
    }

    pub fn insert_tasks(&self, address: &str, raw: Value) {
        self.tasks.lock().unwrap().insert(address.to_string(), raw);
    }

    pub fn insert_resource(&self, resource_type: &str, data: Value) {
        self.resources
            .lock()
            .unwrap()
            .insert(resource_type.to_string(), data);
    }

    pub fn set_view_result(&self, result: Result<Value>) {
        *self.view_result.lock().unwrap() = Some(result.map_err(|e| e.to_string()));
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl ChainQuery for MockChain {
    async fn account(&self, address: &str) -> Result<Value> {
        self.record(format!("account {}", address));
        self.accounts
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .ok_or_else(|| AssistError::AccountNotFound(address.to_string()))
    }

    async fn modules_v3(&self, address: &str, count: u32) -> Result<Value> {
        self.record(format!("modules_v3 {} {}", address, count));
        self.modules_v3
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .ok_or_else(|| missing("modules_v3"))
    }

    async fn modules_v2(&self, address: &str) -> Result<Value> {
        self.record(format!("modules_v2 {}", address));
        self.modules_v2
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .ok_or_else(|| missing("modules_v2"))
    }

    async fn module(&self, address: &str, name: &str) -> Result<Value> {
        self.record(format!("module {} {}", address, name));
        self.modules
            .lock()
            .unwrap()
            .get(&(address.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| missing("module"))
    }

    async fn view(&self, function: &str, _type_args: &[String], args: &[Value]) -> Result<Value> {
        self.record(format!("view {} {}", function, Value::Array(args.to_vec())));
        match self.view_result.lock().unwrap().clone() {
            Some(Ok(v)) => Ok(v),
            Some(Err(e)) => Err(AssistError::Rpc(e)),
            None => Err(missing("view")),
        }
    }

    async fn automated_tasks(&self, address: &str) -> Result<Value> {
        self.record(format!("automated_tasks {}", address));
        self.tasks
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .ok_or_else(|| missing("automated_tasks"))
    }

    async fn resource(&self, _address: &str, resource_type: &str) -> Result<Value> {
        self.record(format!("resource {}", resource_type));
        self.resources
            .lock()
            .unwrap()
            .get(resource_type)
            .cloned()
            .ok_or_else(|| missing("resource"))
    }
}

pub struct MockWallet {
    pub accounts: Vec<String>,
    pub chain_id: Mutex<ChainId>,
    pub final_status: String,
    pub switch_fails: bool,
    pub sent: Mutex<Vec<TransactionRequest>>,
    pub switches: Mutex<Vec<u64>>,
    pub disconnects: Mutex<usize>,
}

impl MockWallet {
    pub fn new(account: &str, chain_id: ChainId) -> Self {
        Self {
            accounts: vec![account.to_string()],
            chain_id: Mutex::new(chain_id),
            final_status: "Success".to_string(),
            switch_fails: false,
            sent: Mutex::new(Vec::new()),
            switches: Mutex::new(Vec::new()),
            disconnects: Mutex::new(0),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn connect(&self) -> Result<Vec<String>> {
        Ok(self.accounts.clone())
    }

    async fn chain_id(&self) -> Result<ChainId> {
        Ok(self.chain_id.lock().unwrap().clone())
    }

    async fn change_network(&self, chain_id: u64) -> Result<()> {
        if self.switch_fails {
            return Err(AssistError::WalletRejected);
        }
        self.switches.lock().unwrap().push(chain_id);
        *self.chain_id.lock().unwrap() = ChainId::Number(chain_id);
        Ok(())
    }

    async fn send_transaction(&self, request: &TransactionRequest) -> Result<String> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(request.clone());
        Ok(format!("0xhash{}", sent.len()))
    }

    async fn wait_for_transaction_with_result(&self, _hash: &str) -> Result<TransactionResult> {
        Ok(TransactionResult {
            status: self.final_status.clone(),
            raw: Value::Null,
        })
    }

    async fn disconnect(&self) -> Result<()> {
        *self.disconnects.lock().unwrap() += 1;
        Ok(())
    }
}
