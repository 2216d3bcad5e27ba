//! Configuration inspection CLI commands.

use clap::{Args, Subcommand};

use ticketqueue_core::config::AppConfig;
use ticketqueue_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Validate the effective configuration
    Validate,
}

/// Execute config commands
pub fn execute(
    args: &ConfigArgs,
    loaded: Result<AppConfig, AppError>,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let mut config = loaded?;
            config.auth.jwt_secret = "****".to_string();
            config.inventory.database_url = mask_password(&config.inventory.database_url);
            output::print_item(&config, format);
        }
        ConfigCommand::Validate => {
            let config = loaded.and_then(|c| c.validate().map(|()| c));
            match config {
                Ok(config) => {
                    output::print_success("Configuration is valid");
                    output::print_kv(
                        "Server",
                        &format!("{}:{}", config.server.host, config.server.port),
                    );
                    output::print_kv("Inventory", &config.inventory.provider);
                    for tier in &config.queue.tiers {
                        output::print_kv(
                            &format!("Tier {}", tier.slug),
                            &format!("max {} concurrent", tier.max_transaction),
                        );
                    }
                }
                Err(e) => {
                    output::print_error(&format!("Configuration invalid: {e}"));
                    return Err(e);
                }
            }
        }
    }

    Ok(())
}

/// Mask the password in a database URL for display
fn mask_password(url: &str) -> String {
    let Some(at_pos) = url.find('@') else {
        return url.to_string();
    };
    let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
    match url[..at_pos].rfind(':') {
        Some(colon_pos) if colon_pos > scheme_end => {
            format!("{}****{}", &url[..=colon_pos], &url[at_pos..])
        }
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_password() {
        assert_eq!(
            mask_password("postgres://app:secret@db:5432/tickets"),
            "postgres://app:****@db:5432/tickets"
        );
        assert_eq!(
            mask_password("postgres://db:5432/tickets"),
            "postgres://db:5432/tickets"
        );
        assert_eq!(mask_password(""), "");
    }
}
