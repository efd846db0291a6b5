mod commands;
mod config;
mod wizard;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Build Supra automation task registrations from on-chain entry functions
#[derive(Debug, Parser)]
#[command(name = "automation-assist", version, about, long_about = None)]
pub struct Cli {
    /// Network to use (mainnet or testnet)
    #[arg(long, global = true, env = "ASSIST_NETWORK")]
    pub network: Option<String>,

    /// RPC endpoint, defaults to the network's public node
    #[arg(long, global = true, env = "ASSIST_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Community module feed
    #[arg(long, global = true, env = "ASSIST_MARKETPLACE_URL")]
    pub marketplace_url: Option<String>,

    /// NFT collection search endpoint
    #[arg(long, global = true, env = "ASSIST_COLLECTIONS_URL")]
    pub collections_url: Option<String>,

    /// API key sent to the collection search endpoint
    #[arg(long, global = true, env = "ASSIST_COLLECTIONS_API_KEY", hide_env_values = true)]
    pub collections_api_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the modules published at an address
    Modules {
        /// Account address (0x followed by 64 hex digits)
        address: String,

        /// Modules requested from the paginated listing
        #[arg(long, default_value_t = 20)]
        count: u32,
    },

    /// List the entry functions of a module
    Functions {
        address: String,
        module: String,
    },

    /// Show automated tasks registered by an account
    Tasks {
        address: String,
    },

    /// Show epoch timing, the task duration cap and the current fee estimate
    Epoch,

    /// Estimate executions and cost for a task that runs for a number of days
    Estimate {
        #[arg(long, default_value_t = 1)]
        days: u64,
    },

    /// Generate a `supra move automation register` command
    Command {
        #[arg(long)]
        address: String,

        #[arg(long)]
        module: String,

        #[arg(long)]
        function: String,

        /// Function argument, in declaration order (repeatable)
        #[arg(long = "arg")]
        args: Vec<String>,

        /// Type argument, in declaration order (repeatable)
        #[arg(long = "type-arg")]
        type_args: Vec<String>,

        #[arg(long)]
        max_gas: Option<u64>,

        #[arg(long)]
        gas_price_cap: Option<u64>,

        /// Automation fee cap in base units, defaults to the live estimate
        #[arg(long)]
        fee_cap: Option<u64>,

        /// Expiry as a unix timestamp in seconds
        #[arg(long, conflicts_with = "days")]
        expiry: Option<u64>,

        /// Expire this many days from now
        #[arg(long)]
        days: Option<u64>,
    },

    /// Browse community modules
    Marketplace {
        /// Match against name, description and contributor
        #[arg(long, default_value = "")]
        search: String,

        #[arg(long, default_value = "all")]
        category: String,
    },

    /// Search NFT collections
    Collections {
        /// Search text, trending collections when omitted
        query: Option<String>,
    },

    /// Interactive step-by-step wizard
    Wizard,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "automation_assist=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let endpoints = config::resolve_endpoints(&cli)?;

    match cli.command {
        Commands::Modules { address, count } => {
            commands::modules(&endpoints, &address, count).await?;
        }
        Commands::Functions { address, module } => {
            commands::functions(&endpoints, &address, &module).await?;
        }
        Commands::Tasks { address } => {
            commands::tasks(&endpoints, &address).await?;
        }
        Commands::Epoch => {
            commands::epoch(&endpoints).await?;
        }
        Commands::Estimate { days } => {
            commands::estimate(days);
        }
        Commands::Command {
            address,
            module,
            function,
            args,
            type_args,
            max_gas,
            gas_price_cap,
            fee_cap,
            expiry,
            days,
        } => {
            let request = commands::CommandRequest {
                address,
                module,
                function,
                args,
                type_args,
                max_gas,
                gas_price_cap,
                fee_cap,
                expiry,
                days,
            };
            commands::generate(&endpoints, request).await?;
        }
        Commands::Marketplace { search, category } => {
            commands::marketplace(&endpoints, &search, &category).await?;
        }
        Commands::Collections { query } => {
            commands::collections(&endpoints, query.as_deref()).await?;
        }
        Commands::Wizard => {
            wizard::run(&endpoints).await?;
        }
    }

    Ok(())
}
