//! Connection Gate
//!
//! Decides whether a handshake token admits a connection into the world.
//! The token is the display name chosen at login; only the "not logged in"
//! sentinel, or no token at all, is refused. No player state exists until
//! the gate says yes.

use thiserror::Error;

use crate::config::{env_lookup, parse_var, ConfigError};

/// Token value the login page hands out to visitors who have not logged in.
pub const SENTINEL_TOKEN: &str = "_";

/// Gate configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateConfig {
    /// Token meaning "not logged in".
    pub sentinel: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            sentinel: SENTINEL_TOKEN.to_string(),
        }
    }
}

impl GateConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// Build from an arbitrary key lookup. A blank sentinel keeps the default.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(sentinel) = parse_var::<String, _>(&lookup, "PRESENCE_SENTINEL_TOKEN")? {
            config.sentinel = sentinel;
        }
        Ok(config)
    }
}

/// Why a connection was not admitted. Never reported to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateRejection {
    /// Token is the "not logged in" sentinel.
    #[error("client is not logged in")]
    NotLoggedIn,
    /// Handshake carried no token.
    #[error("no token supplied")]
    MissingToken,
}

/// A successful admission decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    /// Display name for the new player.
    pub name: String,
}

/// Admit/reject decision for handshake tokens.
#[derive(Clone, Debug, Default)]
pub struct ConnectionGate {
    config: GateConfig,
}

impl ConnectionGate {
    /// Create a gate.
    pub fn new(config: GateConfig) -> Self {
        Self { config }
    }

    /// Decide on a handshake token.
    ///
    /// Names are not checked for uniqueness; identity is the generated id.
    pub fn admit(&self, token: Option<&str>) -> Result<Admission, GateRejection> {
        match token {
            None => Err(GateRejection::MissingToken),
            Some(token) if token == self.config.sentinel => Err(GateRejection::NotLoggedIn),
            Some(token) => Ok(Admission {
                name: token.to_string(),
            }),
        }
    }
}
