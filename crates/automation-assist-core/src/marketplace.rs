//! Community module feed.

use crate::abi::Listing;
use crate::error::{AssistError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_FEED_URL: &str =
    "https://raw.githubusercontent.com/Supra-Labs/Supra-Automation-assist/main/marketplace/modules.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceModule {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub address: String,
    pub module: String,
    #[serde(default)]
    pub github_repo: String,
    #[serde(default)]
    pub contributor: String,
    #[serde(default)]
    pub verified: bool,
}

impl MarketplaceModule {
    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.contributor.to_lowercase().contains(needle)
    }

    /// Address to enter manually and the module to pick once it has been scanned.
    pub fn selection(&self) -> ModuleSelection {
        ModuleSelection {
            address: self.address.clone(),
            module: self.module.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSelection {
    pub address: String,
    pub module: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketplaceStats {
    pub total_modules: usize,
    pub contributors: usize,
}

pub fn fallback_modules() -> Vec<MarketplaceModule> {
    vec![MarketplaceModule {
        name: "FALL BACK".to_string(),
        description: "Shown when the module feed cannot be fetched. Try refreshing shortly."
            .to_string(),
        category: "Fallback".to_string(),
        address: "0x1".to_string(),
        module: "fallbackModule".to_string(),
        github_repo: "https://github.com/Supra-Labs/Supra-Automation-assist/issues".to_string(),
        contributor: "Supra Labs".to_string(),
        verified: true,
    }]
}

/// The feed must be an object with a `modules` array. Entries that do not
/// parse are logged and skipped; a feed where none parse is an error.
pub fn parse_feed(raw: &Value) -> Result<Vec<MarketplaceModule>> {
    let entries = raw
        .get("modules")
        .and_then(Value::as_array)
        .ok_or_else(|| AssistError::InvalidResponse("feed has no modules array".to_string()))?;

    let modules: Vec<MarketplaceModule> = entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            serde_json::from_value(entry.clone())
                .map_err(|e| warn!(index, error = %e, "skipping malformed marketplace entry"))
                .ok()
        })
        .collect();

    if modules.is_empty() && !entries.is_empty() {
        return Err(AssistError::InvalidResponse(
            "no marketplace entry could be parsed".to_string(),
        ));
    }
    Ok(modules)
}

/// Case-insensitive search over name, description and contributor; category
/// `all` matches every module.
pub fn filter<'a>(
    modules: &'a [MarketplaceModule],
    search: &str,
    category: &str,
) -> Vec<&'a MarketplaceModule> {
    let needle = search.trim().to_lowercase();
    modules
        .iter()
        .filter(|m| m.matches(&needle))
        .filter(|m| category == "all" || m.category == category)
        .collect()
}

pub fn stats(modules: &[MarketplaceModule]) -> MarketplaceStats {
    let contributors: BTreeSet<&str> = modules.iter().map(|m| m.contributor.as_str()).collect();
    MarketplaceStats {
        total_modules: modules.len(),
        contributors: contributors.len(),
    }
}

pub fn categories(modules: &[MarketplaceModule]) -> Vec<String> {
    let set: BTreeSet<&str> = modules.iter().map(|m| m.category.as_str()).collect();
    set.into_iter().map(str::to_string).collect()
}

#[derive(Debug, Clone)]
pub struct MarketplaceClient {
    pub url: String,
    client: reqwest::Client,
}

impl MarketplaceClient {
    pub fn new(url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            url: url.to_string(),
            client,
        }
    }

    async fn fetch_feed(&self) -> Result<Vec<MarketplaceModule>> {
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .header("Cache-Control", "no-cache")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AssistError::Rpc(format!("feed returned HTTP {}", status.as_u16())));
        }
        let raw: Value = response
            .json()
            .await
            .map_err(|e| AssistError::InvalidResponse(e.to_string()))?;
        parse_feed(&raw)
    }

    /// Never fails; an unreachable or malformed feed yields the fallback entry.
    pub async fn fetch(&self) -> Listing<MarketplaceModule> {
        match self.fetch_feed().await {
            Ok(modules) => {
                info!(count = modules.len(), "marketplace modules loaded");
                Listing::live(modules)
            }
            Err(e) => {
                warn!(url = %self.url, error = %e, "marketplace feed unavailable, using fallback");
                Listing::fallback(fallback_modules())
            }
        }
    }
}
