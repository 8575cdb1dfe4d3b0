//! Server configuration parsed from environment variables.
//!
//! All knobs are optional. A value that is present but unparsable is a
//! startup error rather than a silent fallback to the default.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_PUBLIC_DIR: &str = "public";
pub const DEFAULT_ROOM_IDLE_TTL_SECS: u64 = 6 * 3600;
pub const DEFAULT_ROOM_SWEEP_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_CLIENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory holding the static client UI.
    pub public_dir: PathBuf,
    /// Rooms without subscribers are evicted after this long without events.
    /// `None` disables eviction.
    pub room_idle_ttl: Option<Duration>,
    pub room_sweep_interval: Duration,
    /// Per-connection outbound frame buffer.
    pub client_channel_capacity: usize,
    /// Fixed seed for codes, item IDs and placement. OS entropy when absent.
    pub rng_seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            public_dir: PathBuf::from(DEFAULT_PUBLIC_DIR),
            room_idle_ttl: Some(Duration::from_secs(DEFAULT_ROOM_IDLE_TTL_SECS)),
            room_sweep_interval: Duration::from_secs(DEFAULT_ROOM_SWEEP_INTERVAL_SECS),
            client_channel_capacity: DEFAULT_CLIENT_CHANNEL_CAPACITY,
            rng_seed: None,
        }
    }
}

impl ServerConfig {
    /// Build config from the process environment.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `PUBLIC_DIR`: default `public`
    /// - `ROOM_IDLE_TTL_SECS`: default 21600, `0` disables eviction
    /// - `ROOM_SWEEP_INTERVAL_SECS`: default 60
    /// - `CLIENT_CHANNEL_CAPACITY`: default 256
    /// - `ROOM_RNG_SEED`: unset by default
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Used by `from_env` and tests.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a value is present but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = parse_or("PORT", &lookup, DEFAULT_PORT)?;
        let public_dir = lookup("PUBLIC_DIR")
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_PUBLIC_DIR), PathBuf::from);
        let ttl_secs = parse_or("ROOM_IDLE_TTL_SECS", &lookup, DEFAULT_ROOM_IDLE_TTL_SECS)?;
        let sweep_secs = parse_or("ROOM_SWEEP_INTERVAL_SECS", &lookup, DEFAULT_ROOM_SWEEP_INTERVAL_SECS)?;
        let client_channel_capacity = parse_or("CLIENT_CHANNEL_CAPACITY", &lookup, DEFAULT_CLIENT_CHANNEL_CAPACITY)?;
        let rng_seed = parse_opt("ROOM_RNG_SEED", &lookup)?;

        if sweep_secs == 0 {
            return Err(ConfigError::Invalid { key: "ROOM_SWEEP_INTERVAL_SECS", value: "0".into() });
        }
        if client_channel_capacity == 0 {
            return Err(ConfigError::Invalid { key: "CLIENT_CHANNEL_CAPACITY", value: "0".into() });
        }

        Ok(Self {
            port,
            public_dir,
            room_idle_ttl: (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs)),
            room_sweep_interval: Duration::from_secs(sweep_secs),
            client_channel_capacity,
            rng_seed,
        })
    }
}

fn parse_opt<T>(key: &'static str, lookup: &impl Fn(&str) -> Option<String>) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|_| ConfigError::Invalid { key, value: raw.clone() })
}

fn parse_or<T>(key: &'static str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    Ok(parse_opt(key, lookup)?.unwrap_or(default))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
