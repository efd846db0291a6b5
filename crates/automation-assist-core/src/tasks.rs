//! Automated task listings for an account.

use crate::client::ChainQuery;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Succeeded,
    Failed,
    Active,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomatedTask {
    pub hash: String,
    pub status: String,
    pub function: String,
    pub gas_used: Option<String>,
    pub created: Option<String>,
}

impl AutomatedTask {
    pub fn status_kind(&self) -> TaskStatus {
        let status = self.status.to_lowercase();
        if status.contains("success") {
            TaskStatus::Succeeded
        } else if status.contains("failed") {
            TaskStatus::Failed
        } else if status.contains("active") {
            TaskStatus::Active
        } else {
            TaskStatus::Other
        }
    }

    /// `0x12345678...abcdef1234` for long hashes.
    pub fn short_hash(&self) -> String {
        let chars: Vec<char> = self.hash.chars().collect();
        if chars.len() <= 23 {
            return self.hash.clone();
        }
        let head: String = chars[..10].iter().collect();
        let tail: String = chars[chars.len() - 10..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn list_tasks(raw: &Value) -> Vec<AutomatedTask> {
    let entries = raw
        .get("data")
        .and_then(Value::as_array)
        .or_else(|| raw.as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    entries
        .iter()
        .enumerate()
        .map(|(i, task)| AutomatedTask {
            hash: text(task.get("hash")).unwrap_or_else(|| format!("task_{}", i)),
            status: text(task.get("status")).unwrap_or_else(|| "Unknown".to_string()),
            function: task
                .pointer("/payload/Move/function")
                .and_then(Value::as_str)
                .and_then(|f| f.rsplit("::").next())
                .unwrap_or("Unknown")
                .to_string(),
            gas_used: text(task.pointer("/output/Move/gas_used")),
            created: text(task.pointer("/block_header/timestamp/utc_date_time")),
        })
        .collect()
}

/// Listing failures are logged and read as "no tasks".
pub async fn fetch_tasks(chain: &dyn ChainQuery, address: &str) -> Vec<AutomatedTask> {
    match chain.automated_tasks(address).await {
        Ok(raw) => {
            let tasks = list_tasks(&raw);
            info!(address = %address, count = tasks.len(), "automated tasks listed");
            tasks
        }
        Err(e) => {
            warn!(address = %address, error = %e, "could not list automated tasks");
            Vec::new()
        }
    }
}
