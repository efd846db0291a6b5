/// Supra REST client for account, module, view and automation queries
use crate::error::{AssistError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

pub const TESTNET_RPC: &str = "https://rpc-testnet.supra.com";
pub const MAINNET_RPC: &str = "https://rpc-mainnet.supra.com";

const MAX_RETRIES: u32 = 3;

/// Read-only queries against the blockchain query service.
#[async_trait]
pub trait ChainQuery: Send + Sync {
    /// Account record; `AccountNotFound` when the address has no account.
    async fn account(&self, address: &str) -> Result<Value>;

    async fn modules_v3(&self, address: &str, count: u32) -> Result<Value>;

    async fn modules_v2(&self, address: &str) -> Result<Value>;

    async fn module(&self, address: &str, name: &str) -> Result<Value>;

    /// Calls a read-only view function and returns its `result` array.
    async fn view(&self, function: &str, type_args: &[String], args: &[Value]) -> Result<Value>;

    async fn automated_tasks(&self, address: &str) -> Result<Value>;

    /// The `data` of an on-chain resource.
    async fn resource(&self, address: &str, resource_type: &str) -> Result<Value>;

    async fn sequence_number(&self, address: &str) -> Result<u64> {
        let account = self.account(address).await?;
        parse_sequence_number(&account)
    }
}

/// `sequence_number` arrives either as a decimal string or a number.
pub fn parse_sequence_number(account: &Value) -> Result<u64> {
    match account.get("sequence_number") {
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| AssistError::InvalidResponse(format!("bad sequence number {}", n))),
        Some(Value::String(s)) => s
            .parse::<u64>()
            .map_err(|_| AssistError::InvalidResponse(format!("bad sequence number {}", s))),
        _ => Err(AssistError::InvalidResponse(
            "account has no sequence_number".to_string(),
        )),
    }
}

/// Client for the Supra REST API
#[derive(Debug, Clone)]
pub struct SupraRpcClient {
    pub endpoint: String,
    client: reqwest::Client,
}

impl SupraRpcClient {
    pub fn new(endpoint: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn testnet() -> Self {
        Self::new(TESTNET_RPC)
    }

    pub fn mainnet() -> Self {
        Self::new(MAINNET_RPC)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    /// Sends a request, retrying transport failures with exponential backoff.
    /// HTTP error statuses are returned as-is and never retried.
    async fn send<F>(&self, build: F) -> Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder + Send + Sync,
    {
        let mut retries = 0u32;

        loop {
            match build().send().await {
                Ok(response) => return Ok(response),
                Err(e) if retries < MAX_RETRIES => {
                    retries += 1;
                    let backoff = Duration::from_millis(100 * 2_u64.pow(retries - 1));
                    warn!(
                        error = %e,
                        attempt = retries,
                        backoff_ms = backoff.as_millis() as u64,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) if e.is_timeout() => return Err(AssistError::Timeout),
                Err(e) => {
                    return Err(AssistError::Request(format!(
                        "failed after {} retries: {}",
                        MAX_RETRIES, e
                    )))
                }
            }
        }
    }

    async fn read_json(path: &str, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistError::Rpc(format!(
                "{} returned HTTP {}: {}",
                path,
                status.as_u16(),
                body
            )));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| AssistError::InvalidResponse(e.to_string()))
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let response = self.send(|| self.client.get(&url)).await?;
        Self::read_json(path, response).await
    }
}

#[async_trait]
impl ChainQuery for SupraRpcClient {
    async fn account(&self, address: &str) -> Result<Value> {
        let path = format!("/rpc/v2/accounts/{}", address);
        let url = self.url(&path);
        let response = self.send(|| self.client.get(&url)).await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AssistError::AccountNotFound(address.to_string()));
        }
        let body = Self::read_json(&path, response).await?;
        if body.is_null() || body.get("error").is_some() {
            return Err(AssistError::AccountNotFound(address.to_string()));
        }
        Ok(body)
    }

    async fn modules_v3(&self, address: &str, count: u32) -> Result<Value> {
        self.get_json(&format!(
            "/rpc/v3/accounts/{}/modules?count={}",
            address, count
        ))
        .await
    }

    async fn modules_v2(&self, address: &str) -> Result<Value> {
        self.get_json(&format!("/rpc/v2/accounts/{}/modules", address))
            .await
    }

    async fn module(&self, address: &str, name: &str) -> Result<Value> {
        self.get_json(&format!("/rpc/v2/accounts/{}/modules/{}", address, name))
            .await
    }

    async fn view(&self, function: &str, type_args: &[String], args: &[Value]) -> Result<Value> {
        let path = "/rpc/v2/view";
        let url = self.url(path);
        let body = json!({
            "function": function,
            "type_arguments": type_args,
            "arguments": args,
        });
        debug!(function, "view call");

        let response = self
            .send(|| {
                self.client
                    .post(&url)
                    .header("Accept", "application/json")
                    .json(&body)
            })
            .await?;
        let value = Self::read_json(path, response).await?;

        if let Some(error) = value.get("error") {
            return Err(AssistError::Rpc(error.to_string()));
        }
        value
            .get("result")
            .cloned()
            .ok_or_else(|| AssistError::InvalidResponse("No result in view response".to_string()))
    }

    async fn automated_tasks(&self, address: &str) -> Result<Value> {
        self.get_json(&format!(
            "/rpc/v3/accounts/{}/automated_transactions",
            address
        ))
        .await
    }

    async fn resource(&self, address: &str, resource_type: &str) -> Result<Value> {
        let encoded: String = url::form_urlencoded::byte_serialize(resource_type.as_bytes()).collect();
        let value = self
            .get_json(&format!("/rpc/v2/accounts/{}/resources/{}", address, encoded))
            .await?;
        value
            .get("data")
            .cloned()
            .ok_or_else(|| AssistError::InvalidResponse(format!("{} has no data", resource_type)))
    }
}
