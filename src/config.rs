//! Server configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::llm::simulated::{
    DEFAULT_DIRECT_REPLY_DELAY_MS, DEFAULT_SIMULATED_DELAY_MAX_MS, DEFAULT_SIMULATED_DELAY_MIN_MS, SimulatedResponder,
};
use crate::services::broadcast::{BroadcastConfig, DEFAULT_BROADCAST_TIMEOUT_SECS};
use crate::services::settings::DEFAULT_SETTINGS_PATH;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    pub port: u16,
    pub settings_path: PathBuf,
    pub broadcast_timeout_secs: u64,
    pub simulated_delay_min_ms: u64,
    pub simulated_delay_max_ms: u64,
    /// Fixed wait before a simulated reply to a single-widget message.
    pub direct_reply_delay_ms: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            settings_path: PathBuf::from(DEFAULT_SETTINGS_PATH),
            broadcast_timeout_secs: DEFAULT_BROADCAST_TIMEOUT_SECS,
            simulated_delay_min_ms: DEFAULT_SIMULATED_DELAY_MIN_MS,
            simulated_delay_max_ms: DEFAULT_SIMULATED_DELAY_MAX_MS,
            direct_reply_delay_ms: DEFAULT_DIRECT_REPLY_DELAY_MS,
        }
    }
}

impl HubConfig {
    /// Build config from environment variables. Unset or unparsable values
    /// fall back to their defaults.
    ///
    /// - `PORT`: default 3000
    /// - `SETTINGS_PATH`: default `databot-settings.json`
    /// - `BROADCAST_TIMEOUT_SECS`: default 60
    /// - `SIMULATED_DELAY_MIN_MS` / `SIMULATED_DELAY_MAX_MS`: default 1000 / 3000
    /// - `DIRECT_REPLY_DELAY_MS`: default 1000
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let settings_path = std::env::var("SETTINGS_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map_or(defaults.settings_path, PathBuf::from);
        Self {
            port: env_parse("PORT", defaults.port),
            settings_path,
            broadcast_timeout_secs: env_parse("BROADCAST_TIMEOUT_SECS", defaults.broadcast_timeout_secs),
            simulated_delay_min_ms: env_parse("SIMULATED_DELAY_MIN_MS", defaults.simulated_delay_min_ms),
            simulated_delay_max_ms: env_parse("SIMULATED_DELAY_MAX_MS", defaults.simulated_delay_max_ms),
            direct_reply_delay_ms: env_parse("DIRECT_REPLY_DELAY_MS", defaults.direct_reply_delay_ms),
        }
    }

    #[must_use]
    pub fn broadcast(&self) -> BroadcastConfig {
        BroadcastConfig {
            timeout: Duration::from_secs(self.broadcast_timeout_secs),
            simulated: SimulatedResponder::new(self.simulated_delay_min_ms, self.simulated_delay_max_ms),
            direct_delay: Duration::from_millis(self.direct_reply_delay_ms),
        }
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
