//! Configuration layer above raw bootstrap parameters.
//!
//! A `serde`-deserializable struct fed from either a file (via the `config`
//! crate's YAML backend, behind the `config` feature) or the `CICADA_*`
//! environment variables.

use std::time::Duration;

/// The environment variables bootstrap helpers consult.
pub mod env {
    /// Total number of players.
    pub const WORLD_SIZE: &str = "CICADA_WORLD_SIZE";
    /// This player's rank.
    pub const RANK: &str = "CICADA_RANK";
    /// URL this player listens on.
    pub const ADDRESS: &str = "CICADA_ADDRESS";
    /// Root player's URL (for rendezvous).
    pub const ROOT_ADDRESS: &str = "CICADA_ROOT_ADDRESS";
    /// Path to local key+cert.
    pub const IDENTITY: &str = "CICADA_IDENTITY";
    /// Path(s) to trusted cert bundle.
    pub const TRUSTED: &str = "CICADA_TRUSTED";
}

/// Configuration for constructing a communicator, independent of how it was
/// sourced (direct call, env vars, or a config file).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
pub struct CommunicatorConfig {
    /// This player's listen address.
    pub address: String,
    /// Either the full address list (direct bootstrap) or just the root's
    /// address (rendezvous bootstrap).
    pub peers: Vec<String>,
    /// Default timeout applied to every blocking operation; `None` waits
    /// forever.
    #[cfg_attr(feature = "config", serde(with = "humantime_option", default))]
    pub default_timeout: Option<Duration>,
    /// A human-readable name for this communicator, used in diagnostics.
    pub name: Option<String>,
}

impl CommunicatorConfig {
    /// Reads bootstrap parameters from the `CICADA_*` environment variables.
    ///
    /// This is a convenience layer, not the only way to construct a
    /// communicator -- callers may also build a `CommunicatorConfig`
    /// directly or load one from a config file.
    pub fn from_env() -> Result<Self, EnvConfigError> {
        let address = std::env::var(env::ADDRESS).map_err(|_| EnvConfigError::Missing(env::ADDRESS))?;
        let root_address = std::env::var(env::ROOT_ADDRESS).ok();
        let world_size: Option<usize> =
            std::env::var(env::WORLD_SIZE).ok().and_then(|v| v.parse().ok());
        let peers = match (root_address, world_size) {
            (Some(root), _) => vec![root],
            (None, Some(_)) => Vec::new(),
            (None, None) => return Err(EnvConfigError::Missing(env::ROOT_ADDRESS)),
        };
        Ok(Self { address, peers, default_timeout: None, name: None })
    }
}

/// An environment-sourced configuration was incomplete.
#[derive(Debug, thiserror::Error)]
pub enum EnvConfigError {
    /// A required environment variable was not set.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

#[cfg(feature = "config")]
mod humantime_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        value.map(|d| d.as_secs_f64()).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        let seconds: Option<f64> = Option::deserialize(deserializer)?;
        Ok(seconds.map(Duration::from_secs_f64))
    }
}
