//! Environment configuration helpers.
//!
//! Settings are read through a lookup function so tests can feed values
//! without touching the process environment.

use std::fmt::Display;
use std::str::FromStr;

use thiserror::Error;

/// A configuration value could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value for {key}: `{value}` ({reason})")]
pub struct ConfigError {
    /// Variable name.
    pub key: &'static str,
    /// Raw value.
    pub value: String,
    /// Parser message.
    pub reason: String,
}

/// Reads the process environment.
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Parse `key` through `lookup`; absent or blank yields `Ok(None)`.
pub fn parse_var<T, L>(lookup: &L, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    L: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|e: T::Err| ConfigError {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
