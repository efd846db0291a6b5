//! NFT collection search, used to fill text parameters that name a collection.

use crate::error::{AssistError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Searches shorter than this return the trending list instead.
pub const MIN_SEARCH_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub verified: bool,
}

impl Collection {
    /// `0x1234...abcd` style creator for compact listings.
    pub fn short_creator(&self) -> String {
        let chars: Vec<char> = self.creator.chars().collect();
        if chars.len() <= 10 {
            return self.creator.clone();
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Accepts a bare array or one wrapped in `data` or `collections`.
pub fn parse_collections(raw: &Value) -> Result<Vec<Collection>> {
    let list = if raw.is_array() {
        raw
    } else {
        ["data", "collections"]
            .iter()
            .filter_map(|key| raw.get(*key))
            .find(|v| v.is_array())
            .ok_or_else(|| AssistError::InvalidResponse("no collection list".to_string()))?
    };
    serde_json::from_value(list.clone()).map_err(|e| AssistError::InvalidResponse(e.to_string()))
}

#[derive(Debug, Clone)]
pub struct CollectionSearch {
    pub base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl CollectionSearch {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        }
    }

    async fn request(&self, search: Option<&str>) -> Result<Vec<Collection>> {
        let mut request = self
            .client
            .get(&self.base_url)
            .header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }
        if let Some(text) = search {
            request = request.query(&[("search", text)]);
        }
        debug!(url = %self.base_url, search = ?search, "collection request");

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AssistError::Rpc(format!(
                "collection search returned HTTP {}",
                status.as_u16()
            )));
        }
        let raw: Value = response
            .json()
            .await
            .map_err(|e| AssistError::InvalidResponse(e.to_string()))?;
        parse_collections(&raw)
    }

    pub async fn trending(&self) -> Result<Vec<Collection>> {
        self.request(None).await
    }

    pub async fn search(&self, text: &str) -> Result<Vec<Collection>> {
        let text = text.trim();
        if text.chars().count() < MIN_SEARCH_LEN {
            return self.trending().await;
        }
        self.request(Some(text)).await
    }
}
