use anyhow::{bail, Context, Result};
use automation_assist::abi::Listing;
use automation_assist::automation::{
    estimate_duration, format_duration, format_tokens, now_secs, AutomationParams,
    NetworkSnapshot,
};
use automation_assist::collections::CollectionSearch;
use automation_assist::marketplace::{self, MarketplaceClient};
use automation_assist::tasks::{fetch_tasks, TaskStatus};
use automation_assist::{DataSource, Endpoints, SupraRpcClient, WizardController};
use colored::Colorize;
use num_bigint::BigUint;
use std::sync::Arc;

pub fn controller(endpoints: &Endpoints) -> WizardController {
    let chain = Arc::new(SupraRpcClient::new(&endpoints.rpc_url));
    WizardController::new(chain, endpoints)
}

pub fn header(title: &str) {
    println!("\n{}", title.bold().cyan());
    println!("{}", "=".repeat(80).cyan());
}

/// Listings that did not come from the network are always labelled.
pub fn source_notice<T>(listing: &Listing<T>) {
    match listing.source {
        DataSource::Live => {}
        DataSource::Demo => println!(
            "{}",
            "⚠ Showing demo data, nothing was found on chain for this address.".yellow()
        ),
        DataSource::Fallback => println!(
            "{}",
            "⚠ Showing fallback data, the live source could not be reached.".yellow()
        ),
    }
}

pub async fn modules(endpoints: &Endpoints, address: &str, count: u32) -> Result<()> {
    let mut session = controller(endpoints).with_module_count(count);
    session.use_manual_address(address)?;
    let listing = session
        .scan_modules()
        .await
        .context("Failed to scan modules")?;

    header(&format!("Modules at {}", address));
    source_notice(&listing);
    for module in &listing.items {
        println!("{} {}", "●".green(), module.name.bold());
    }
    println!(
        "\n{}",
        format!("{} module(s) on {}", listing.items.len(), endpoints.network).bright_black()
    );
    Ok(())
}

pub async fn functions(endpoints: &Endpoints, address: &str, module: &str) -> Result<()> {
    let mut session = controller(endpoints);
    session.use_manual_address(address)?;
    session.scan_modules().await?;
    let listing = session
        .select_module(module)
        .await
        .with_context(|| format!("Failed to load module {}", module))?;

    header(&format!("Entry functions in {}::{}", address, module));
    source_notice(&listing);
    if listing.items.is_empty() {
        println!("{}", "No entry functions found.".yellow());
        return Ok(());
    }
    for function in &listing.items {
        println!("{} {}", "●".green(), function.signature().bold());
    }
    Ok(())
}

pub async fn tasks(endpoints: &Endpoints, address: &str) -> Result<()> {
    let chain = SupraRpcClient::new(&endpoints.rpc_url);
    let tasks = fetch_tasks(&chain, address).await;

    header(&format!("Automated tasks for {}", address));
    if tasks.is_empty() {
        println!("{}", "No automated tasks found.".yellow());
        return Ok(());
    }

    for task in &tasks {
        let status = match task.status_kind() {
            TaskStatus::Succeeded => format!("✓ {}", task.status).green(),
            TaskStatus::Failed => format!("✗ {}", task.status).red(),
            TaskStatus::Active => task.status.as_str().yellow(),
            TaskStatus::Other => task.status.as_str().normal(),
        };
        println!("\n{} {} {}", "●".green(), task.function.bold(), status);
        println!("  Hash: {}", task.short_hash().bright_black());
        if let Some(gas) = &task.gas_used {
            println!("  Gas used: {}", gas);
        }
        if let Some(created) = &task.created {
            println!("  Created: {}", created.bright_black());
        }
    }
    println!(
        "\n{}",
        format!("Showing {} task(s)", tasks.len()).bright_black()
    );
    Ok(())
}

pub fn print_snapshot(snapshot: &NetworkSnapshot) {
    match &snapshot.epoch {
        Some(epoch) => {
            let remaining = epoch.time_to_next(snapshot.now);
            println!(
                "  Next epoch in: {}",
                format_duration(remaining as i64).bright_blue()
            );
            println!(
                "  Earliest expiry: {}",
                epoch.expiry_with_buffer().to_string().bright_black()
            );
        }
        None => println!("  {}", "Epoch data unavailable".yellow()),
    }
    println!(
        "  Task duration cap: {}",
        format_duration(snapshot.duration_cap_secs as i64)
    );
    let fee = format!(
        "{} ({} tokens)",
        snapshot.fee.amount(),
        format_tokens(snapshot.fee.amount())
    );
    if snapshot.fee.is_fallback() {
        println!("  Fee estimate: {} {}", fee, "(fallback)".yellow());
    } else {
        println!("  Fee estimate: {}", fee.green());
    }
    println!("  Default expiry: {}", snapshot.default_expiry());
}

pub async fn epoch(endpoints: &Endpoints) -> Result<()> {
    let session = controller(endpoints);
    let snapshot = session
        .network_snapshot(&BigUint::from(endpoints.max_gas_amount))
        .await;
    header(&format!("Automation on {}", endpoints.network));
    print_snapshot(&snapshot);
    Ok(())
}

pub fn estimate(days: u64) {
    let estimate = estimate_duration(days, now_secs());
    header("Duration estimate");
    println!("  Days: {}", estimate.days);
    println!("  Executions: {}", estimate.executions);
    println!("  Estimated cost: {} tokens", estimate.cost_tokens.bold());
    println!("  Expiry: {}", estimate.expiry_time_secs);
}

#[derive(Debug, Clone, Default)]
pub struct CommandRequest {
    pub address: String,
    pub module: String,
    pub function: String,
    pub args: Vec<String>,
    pub type_args: Vec<String>,
    pub max_gas: Option<u64>,
    pub gas_price_cap: Option<u64>,
    pub fee_cap: Option<u64>,
    pub expiry: Option<u64>,
    pub days: Option<u64>,
}

/// Gas limit the fee estimate must be quoted for.
pub fn requested_max_gas(request: &CommandRequest, configured: u64) -> BigUint {
    BigUint::from(request.max_gas.unwrap_or(configured))
}

/// Fills the gaps in `request` from `defaults`. `days` is counted from `now`.
pub fn resolve_params(
    request: &CommandRequest,
    defaults: AutomationParams,
    now: u64,
) -> AutomationParams {
    let expiry = match (request.expiry, request.days) {
        (Some(expiry), _) => BigUint::from(expiry),
        (None, Some(days)) => BigUint::from(estimate_duration(days, now).expiry_time_secs),
        (None, None) => defaults.expiry_time_secs,
    };
    AutomationParams {
        max_gas_amount: request
            .max_gas
            .map(BigUint::from)
            .unwrap_or(defaults.max_gas_amount),
        gas_price_cap: request
            .gas_price_cap
            .map(BigUint::from)
            .unwrap_or(defaults.gas_price_cap),
        automation_fee_cap: request
            .fee_cap
            .map(BigUint::from)
            .unwrap_or(defaults.automation_fee_cap),
        expiry_time_secs: expiry,
    }
}

pub async fn generate(endpoints: &Endpoints, request: CommandRequest) -> Result<()> {
    let mut session = controller(endpoints);
    session.use_manual_address(&request.address)?;
    session.scan_modules().await?;
    let listing = session.select_module(&request.module).await?;
    source_notice(&listing);

    let function = session.select_function(&request.function)?;
    if request.args.len() != function.parameter_type_tags.len() {
        bail!(
            "{} takes {} argument(s), {} given",
            function.signature(),
            function.parameter_type_tags.len(),
            request.args.len()
        );
    }
    if request.type_args.len() != function.generic_parameter_count {
        bail!(
            "{} takes {} type argument(s), {} given",
            function.signature(),
            function.generic_parameter_count,
            request.type_args.len()
        );
    }
    for (i, value) in request.type_args.iter().enumerate() {
        session.set_type_argument(i, value)?;
    }
    for (i, value) in request.args.iter().enumerate() {
        session.set_parameter(i, value)?;
    }

    let max_gas = requested_max_gas(&request, endpoints.max_gas_amount);
    let defaults = if request.fee_cap.is_some() && (request.expiry.is_some() || request.days.is_some())
    {
        AutomationParams::new(max_gas, endpoints.gas_price_cap, 0u64, 0u64)
    } else {
        session.default_params(&max_gas).await
    };
    let params = resolve_params(&request, defaults, now_secs());
    let command = session.generate_command(&params)?;

    header("Registration command");
    println!("{}", command);
    println!(
        "\n{}",
        "Run this with the Supra CLI using the account that should own the task.".bright_black()
    );
    Ok(())
}

pub async fn marketplace(endpoints: &Endpoints, search: &str, category: &str) -> Result<()> {
    let listing = MarketplaceClient::new(&endpoints.marketplace_url)
        .fetch()
        .await;
    let stats = marketplace::stats(&listing.items);

    header("Community modules");
    source_notice(&listing);
    println!(
        "{}",
        format!(
            "{} module(s) from {} contributor(s) | Categories: {}",
            stats.total_modules,
            stats.contributors,
            marketplace::categories(&listing.items).join(", ")
        )
        .bright_black()
    );

    let matches = marketplace::filter(&listing.items, search, category);
    if matches.is_empty() {
        println!("{}", "No modules match.".yellow());
        return Ok(());
    }
    for module in matches {
        println!(
            "\n{} {} {}",
            "●".green(),
            module.name.bold(),
            if module.verified {
                "✓ Verified".green()
            } else {
                "○ Community".yellow()
            }
        );
        println!(
            "  {}::{} | {}",
            module.address.bright_black(),
            module.module.bright_black(),
            module.category.bright_blue()
        );
        if !module.description.is_empty() {
            println!("  {}", module.description);
        }
        if !module.contributor.is_empty() {
            println!("  By: {}", module.contributor);
        }
        if !module.github_repo.is_empty() {
            println!("  {}", module.github_repo.bright_black());
        }
    }
    Ok(())
}

pub async fn collections(endpoints: &Endpoints, query: Option<&str>) -> Result<()> {
    let Some(url) = endpoints.collections_url.as_deref() else {
        bail!("No collection search endpoint configured. Pass --collections-url or set collections_url in the config file");
    };
    let search = CollectionSearch::new(url, endpoints.collections_api_key.clone());
    let results = match query {
        Some(text) => search.search(text).await,
        None => search.trending().await,
    }
    .context("Collection search failed")?;

    header(if query.is_some() {
        "Collections"
    } else {
        "Trending collections"
    });
    if results.is_empty() {
        println!("{}", "No collections found.".yellow());
        return Ok(());
    }
    for collection in &results {
        println!(
            "\n{} {}{}",
            "●".green(),
            collection.name.bold(),
            if collection.verified {
                " ✓".green()
            } else {
                "".normal()
            }
        );
        println!("  Creator: {}", collection.short_creator().bright_black());
        if !collection.description.is_empty() {
            println!("  {}", collection.description);
        }
    }
    Ok(())
}
