//! CLI command definitions and dispatch.

pub mod config;
pub mod inventory;
pub mod join;
pub mod serve;
pub mod token;

use clap::{Parser, Subcommand};

use ticketqueue_core::config::AppConfig;
use ticketqueue_core::error::AppError;

use crate::output::OutputFormat;

/// TicketQueue: admission control for ticket sales
#[derive(Debug, Parser)]
#[command(name = "ticketqueue", version, about, long_about = None)]
pub struct Cli {
    /// Explicit configuration file; overrides the layered lookup
    #[arg(short, long)]
    pub config: Option<String>,

    /// Environment overlay loaded from `config/{env}.toml`
    #[arg(short, long, env = "TICKETQUEUE_ENV", default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the TicketQueue server
    Serve(serve::ServeArgs),
    /// Configuration inspection
    Config(config::ConfigArgs),
    /// Bearer token tooling
    Token(token::TokenArgs),
    /// Inventory inspection
    Inventory(inventory::InventoryArgs),
    /// Join a tier's queue as a client
    Join(join::JoinArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Serve(args) => serve::execute(args, self.load_config()?).await,
            Commands::Config(args) => config::execute(args, self.load_config(), self.format),
            Commands::Token(args) => token::execute(args, &self.load_config()?, self.format),
            Commands::Inventory(args) => {
                inventory::execute(args, &self.load_config()?, self.format).await
            }
            Commands::Join(args) => join::execute(args, &self.load_config()?).await,
        }
    }

    /// Loads configuration from `--config` or the layered default lookup.
    fn load_config(&self) -> Result<AppConfig, AppError> {
        match &self.config {
            Some(path) => AppConfig::from_file(path),
            None => AppConfig::load(&self.env),
        }
    }
}
