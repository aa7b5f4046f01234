//! Server configuration

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Server configuration, loaded from a YAML file
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the listener
    pub bind_address: SocketAddr,
    /// Longest accepted display name, in characters
    pub max_name_len: usize,
    /// Room timers
    pub timers: TimerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8000)),
            max_name_len: 20,
            timers: TimerConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(config)
    }

    /// Load `path` if given, otherwise fall back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

/// Room timer configuration, in milliseconds
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Wait before a disconnected player is handed to a bot
    pub disconnect_grace_ms: u64,
    /// Pause before each bot move
    pub bot_move_delay_ms: u64,
    /// Wait before a room with nobody connected is deleted
    pub idle_room_ms: u64,
    /// A link that sends nothing for this long is treated as lost
    pub link_idle_ms: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            disconnect_grace_ms: 10_000,
            bot_move_delay_ms: 1_000,
            idle_room_ms: 12_000,
            link_idle_ms: 30_000,
        }
    }
}

impl TimerConfig {
    pub fn disconnect_grace(&self) -> Duration {
        Duration::from_millis(self.disconnect_grace_ms)
    }

    pub fn bot_move_delay(&self) -> Duration {
        Duration::from_millis(self.bot_move_delay_ms)
    }

    pub fn idle_room(&self) -> Duration {
        Duration::from_millis(self.idle_room_ms)
    }

    pub fn link_idle(&self) -> Duration {
        Duration::from_millis(self.link_idle_ms)
    }
}
