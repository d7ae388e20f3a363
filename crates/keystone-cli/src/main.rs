//! Keystone command line
//!
//! Runs every broker action against the filesystem store named in the config.
//! Results are printed to stdout as JSON; logs go to stderr.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{agent::AgentCommand, grant::GrantCommand, Caller};

#[derive(Parser)]
#[command(name = "keystone")]
#[command(about = "Keystone - authorization grants for machine agents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, default_value = ".keystone/config.toml")]
    config: PathBuf,

    /// Act as this session identity
    #[arg(long = "as", global = true, value_name = "IDENTITY")]
    as_identity: Option<String>,

    /// Act as the agent holding this bearer credential
    #[arg(long, global = true)]
    agent_token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Grant lifecycle operations
    #[command(subcommand)]
    Grant(GrantCommand),

    /// Agent enrollment and authentication
    #[command(subcommand)]
    Agent(AgentCommand),

    /// Remove expired challenges
    PurgeChallenges,

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = config::load_config(&cli.config)?;
    if let Commands::Config = cli.command {
        return commands::print_json(&config);
    }

    let broker = keystone_runtime::Broker::open(config).await?;
    let caller = Caller::resolve(&broker, cli.as_identity, cli.agent_token).await?;

    match cli.command {
        Commands::Grant(cmd) => commands::grant::run(&broker, &caller, cmd).await,
        Commands::Agent(cmd) => commands::agent::run(&broker, &caller, cmd).await,
        Commands::PurgeChallenges => {
            let purged = broker.challenges().purge_expired().await?;
            commands::print_json(&serde_json::json!({ "purged": purged }))
        }
        Commands::Config => Ok(()),
    }
}
