//! Client-to-server commands.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const TOKEN_PREFIX: &str = "TOKEN";
const MERCH_WITH: &str = "MERCH 1";
const MERCH_WITHOUT: &str = "MERCH 0";

/// Which pool of a tier a transacting session wants to buy from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MerchChoice {
    /// The with-merchandise pool.
    WithMerch,
    /// The without-merchandise pool.
    NoMerch,
}

impl MerchChoice {
    /// True for [`MerchChoice::WithMerch`].
    pub fn is_with_merch(self) -> bool {
        matches!(self, Self::WithMerch)
    }
}

impl fmt::Display for MerchChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WithMerch => f.write_str("with_merch"),
            Self::NoMerch => f.write_str("no_merch"),
        }
    }
}

/// A parsed inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// `TOKEN <value>`
    Token(String),
    /// `MERCH 0` / `MERCH 1`
    Merch(MerchChoice),
}

/// Why an inbound frame could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The frame starts with `TOKEN` but carries no usable value.
    #[error("malformed token frame")]
    MalformedToken,
    /// The frame is not a known command.
    #[error("unknown command")]
    Unknown,
}

impl ClientCommand {
    /// Parses one text frame.
    pub fn parse(frame: &str) -> Result<Self, CommandError> {
        let frame = frame.trim_end_matches(['\r', '\n']);

        if let Some(rest) = frame.strip_prefix(TOKEN_PREFIX) {
            if !rest.starts_with(char::is_whitespace) {
                return Err(CommandError::MalformedToken);
            }
            return rest
                .split_whitespace()
                .next()
                .map(|token| Self::Token(token.to_string()))
                .ok_or(CommandError::MalformedToken);
        }

        match frame {
            MERCH_WITH => Ok(Self::Merch(MerchChoice::WithMerch)),
            MERCH_WITHOUT => Ok(Self::Merch(MerchChoice::NoMerch)),
            _ => Err(CommandError::Unknown),
        }
    }
}
