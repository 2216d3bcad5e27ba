//! Bearer token CLI commands.

use clap::{Args, Subcommand};

use ticketqueue_auth::JwtEncoder;
use ticketqueue_auth::jwt::encoder::IssuedToken;
use ticketqueue_core::config::AppConfig;
use ticketqueue_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for token commands
#[derive(Debug, Args)]
pub struct TokenArgs {
    /// Token subcommand
    #[command(subcommand)]
    pub command: TokenCommand,
}

/// Token subcommands
#[derive(Debug, Subcommand)]
pub enum TokenCommand {
    /// Issue a token signed with the configured secret
    Issue {
        /// Identity placed in the `user_id` claim
        #[arg(short, long)]
        user: String,
        /// Role claim
        #[arg(short, long, default_value = "user")]
        role: String,
        /// Lifetime in minutes; defaults to `auth.jwt_ttl_minutes`
        #[arg(long)]
        ttl_minutes: Option<i64>,
    },
}

/// Execute token commands
pub fn execute(args: &TokenArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    match &args.command {
        TokenCommand::Issue {
            user,
            role,
            ttl_minutes,
        } => {
            let encoder = JwtEncoder::new(&config.auth);
            let issued = match ttl_minutes {
                Some(minutes) => {
                    encoder.issue_with_ttl(user, role, chrono::Duration::minutes(*minutes))?
                }
                None => encoder.issue(user, role)?,
            };
            print_token(&issued, format);
        }
    }

    Ok(())
}

fn print_token(issued: &IssuedToken, format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_item(issued, format),
        OutputFormat::Table => {
            println!("{}", issued.token);
            output::print_kv("Expires", &issued.expires_at.to_rfc3339());
        }
    }
}
