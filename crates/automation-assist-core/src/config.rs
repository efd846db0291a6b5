use crate::automation::{DEFAULT_GAS_PRICE_CAP, DEFAULT_MAX_GAS_AMOUNT};
use crate::client::{MAINNET_RPC, TESTNET_RPC};
use crate::error::{AssistError, Result};
use crate::marketplace::DEFAULT_FEED_URL;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

const CONFIG_FILE_NAME: &str = ".automation-assist.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn chain_id(self) -> u64 {
        match self {
            Network::Mainnet => 8,
            Network::Testnet => 6,
        }
    }

    pub fn default_rpc(self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_RPC,
            Network::Testnet => TESTNET_RPC,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

impl FromStr for Network {
    type Err = AssistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            _ => Err(AssistError::Config(format!(
                "Invalid network: {}. Allowed values: mainnet, testnet",
                s
            ))),
        }
    }
}

/// Contents of `~/.automation-assist.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConfigFile {
    pub network: Option<String>,
    pub rpc_url: Option<String>,
    pub marketplace_url: Option<String>,
    pub collections_url: Option<String>,
    pub collections_api_key: Option<String>,
    pub max_gas_amount: Option<u64>,
    pub gas_price_cap: Option<u64>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AssistError::Config(format!("Failed to read config file at {:?}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| AssistError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Loads the home-directory config file if there is one.
    pub fn load_default() -> Result<Option<Self>> {
        match config_file_path() {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "loading config file");
                Self::load(&path).map(Some)
            }
            _ => Ok(None),
        }
    }
}

pub fn config_file_path() -> Option<PathBuf> {
    dirs::home_dir().map(|mut p| {
        p.push(CONFIG_FILE_NAME);
        p
    })
}

/// Values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub network: Option<String>,
    pub rpc_url: Option<String>,
    pub marketplace_url: Option<String>,
    pub collections_url: Option<String>,
    pub collections_api_key: Option<String>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub network: Network,
    pub rpc_url: String,
    pub expected_chain_id: u64,
    pub marketplace_url: String,
    pub collections_url: Option<String>,
    pub collections_api_key: Option<String>,
    pub max_gas_amount: u64,
    pub gas_price_cap: u64,
}

impl Endpoints {
    /// Flags first, then the config file, then built-in defaults.
    pub fn resolve(overrides: Overrides, file: Option<ConfigFile>) -> Result<Self> {
        let file = file.unwrap_or_default();

        let network = match overrides.network.or(file.network) {
            Some(name) => name.parse::<Network>()?,
            None => Network::Testnet,
        };

        Ok(Self {
            network,
            rpc_url: overrides
                .rpc_url
                .or(file.rpc_url)
                .unwrap_or_else(|| network.default_rpc().to_string()),
            expected_chain_id: network.chain_id(),
            marketplace_url: overrides
                .marketplace_url
                .or(file.marketplace_url)
                .unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
            collections_url: overrides.collections_url.or(file.collections_url),
            collections_api_key: overrides.collections_api_key.or(file.collections_api_key),
            max_gas_amount: file.max_gas_amount.unwrap_or(DEFAULT_MAX_GAS_AMOUNT),
            gas_price_cap: file.gas_price_cap.unwrap_or(DEFAULT_GAS_PRICE_CAP),
        })
    }
}
