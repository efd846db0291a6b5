use crate::Cli;
use anyhow::{Context, Result};
use automation_assist::config::{ConfigFile, Endpoints, Overrides};

/// Resolution order: flag or environment, then `~/.automation-assist.toml`, then defaults.
pub fn resolve_endpoints(cli: &Cli) -> Result<Endpoints> {
    let overrides = Overrides {
        network: cli.network.clone(),
        rpc_url: cli.rpc_url.clone(),
        marketplace_url: cli.marketplace_url.clone(),
        collections_url: cli.collections_url.clone(),
        collections_api_key: cli.collections_api_key.clone(),
    };

    // A bad flag should be reported even when the file is broken too.
    if let Some(name) = &overrides.network {
        name.parse::<automation_assist::Network>()?;
    }

    let file = ConfigFile::load_default().context("Failed to load config file")?;
    let endpoints = Endpoints::resolve(overrides, file)?;
    tracing::debug!(
        network = %endpoints.network,
        rpc_url = %endpoints.rpc_url,
        "endpoints resolved"
    );
    Ok(endpoints)
}
