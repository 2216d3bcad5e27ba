//! Inventory inspection CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use ticketqueue_core::config::AppConfig;
use ticketqueue_core::error::AppError;
use ticketqueue_core::traits::InventorySource;
use ticketqueue_inventory::InventoryManager;

use crate::output::{self, OutputFormat};

/// Arguments for inventory commands
#[derive(Debug, Args)]
pub struct InventoryArgs {
    /// Inventory subcommand
    #[command(subcommand)]
    pub command: InventoryCommand,
}

/// Inventory subcommands
#[derive(Debug, Subcommand)]
pub enum InventoryCommand {
    /// Read every pool governed by a configured tier
    List,
}

/// One pool as read from the configured provider.
#[derive(Debug, Serialize, Tabled)]
pub struct PoolRow {
    /// Tier slug
    pub tier: String,
    /// `merch` or `plain`
    pub variant: String,
    /// Pool id
    pub pool: String,
    /// Pool name
    pub name: String,
    /// Total capacity
    pub capacity: String,
    /// Tickets sold
    pub registered: String,
    /// Remaining stock
    pub remaining: String,
    /// Unit price
    pub price: String,
}

/// Execute inventory commands
pub async fn execute(
    args: &InventoryArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        InventoryCommand::List => {
            let inventory = InventoryManager::new(&config.inventory).await?;
            let mut rows = Vec::new();

            for tier in &config.queue.tiers {
                for (variant, pool) in [
                    ("merch", tier.with_merch_pool),
                    ("plain", tier.no_merch_pool),
                ] {
                    let row = match inventory.get_by_id(&pool).await {
                        Ok(snapshot) => PoolRow {
                            tier: tier.slug.clone(),
                            variant: variant.to_string(),
                            pool: pool.to_string(),
                            name: snapshot.name.clone(),
                            capacity: snapshot.capacity.to_string(),
                            registered: snapshot.registered.to_string(),
                            remaining: snapshot.remaining().to_string(),
                            price: snapshot.price.to_string(),
                        },
                        Err(e) => PoolRow {
                            tier: tier.slug.clone(),
                            variant: variant.to_string(),
                            pool: pool.to_string(),
                            name: format!("<{}>", e.kind),
                            capacity: "-".to_string(),
                            registered: "-".to_string(),
                            remaining: "-".to_string(),
                            price: "-".to_string(),
                        },
                    };
                    rows.push(row);
                }
            }

            output::print_list(&rows, format);
        }
    }

    Ok(())
}
