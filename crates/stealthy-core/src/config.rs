//! Typed application configuration.
//!
//! Loaded from `config.toml` by the infrastructure layer; every field has
//! a default so an absent or partial file still yields a working config.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub typing: TypingConfig,
    #[serde(default)]
    pub pairing: PairingConfig,
}

/// Pace of the simulated assistant reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypingConfig {
    /// Delay before the assistant message appears, in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Interval between appended characters, in milliseconds.
    #[serde(default = "default_char_interval_ms")]
    pub char_interval_ms: u64,
}

impl TypingConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn char_interval(&self) -> Duration {
        Duration::from_millis(self.char_interval_ms)
    }
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            char_interval_ms: default_char_interval_ms(),
        }
    }
}

/// Device-pairing session parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingConfig {
    /// Token lifetime in seconds.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: i64,
    /// Minimum interval between token regenerations, in seconds.
    #[serde(default = "default_regenerate_cooldown_secs")]
    pub regenerate_cooldown_secs: i64,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: default_token_ttl_secs(),
            regenerate_cooldown_secs: default_regenerate_cooldown_secs(),
        }
    }
}

fn default_initial_delay_ms() -> u64 {
    400
}

fn default_char_interval_ms() -> u64 {
    25
}

fn default_token_ttl_secs() -> i64 {
    90
}

fn default_regenerate_cooldown_secs() -> i64 {
    1
}
