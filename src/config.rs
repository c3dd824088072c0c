use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const ENV_WORLD_ID: &str = "CAVE_BOT_WORLD_ID";
pub const ENV_ADMIN: &str = "CAVE_BOT_ADMIN";

/// Default config location, `~/.cave-bot/config.json`
pub fn config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cave-bot")
        .join("config.json")
}

/// Bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub world_id: String,
    /// Only this user may issue dot-commands (case-insensitive)
    pub admin_username: String,
    pub chat_prefix: String,
    pub world_width: usize,
    pub world_height: usize,
    pub round: RoundConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            world_id: String::new(),
            admin_username: String::new(),
            chat_prefix: "[CaveGameBot] ".into(),
            world_width: 400,
            world_height: 200,
            round: RoundConfig::default(),
        }
    }
}

/// Round loop timings and limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundConfig {
    /// Delay between checks of the "generate next round" flag
    pub poll_interval_ms: u64,
    /// Pause before generating, lets players read the winner announcement
    pub pre_generation_delay_ms: u64,
    /// Pause between revealing the spawn and resetting players
    pub post_reveal_delay_ms: u64,
    /// Pause between the announcement and allowing digs
    pub dig_unlock_delay_ms: u64,
    /// Rejection-sampling bound per treasure
    pub max_treasure_attempts: u32,
    /// Pause between sending a `.generate` preview and resetting players
    pub preview_reset_delay_ms: u64,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            pre_generation_delay_ms: 5000,
            post_reveal_delay_ms: 1000,
            dig_unlock_delay_ms: 2000,
            max_treasure_attempts: 10_000,
            preview_reset_delay_ms: 1000,
        }
    }
}

impl RoundConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn pre_generation_delay(&self) -> Duration {
        Duration::from_millis(self.pre_generation_delay_ms)
    }

    pub fn post_reveal_delay(&self) -> Duration {
        Duration::from_millis(self.post_reveal_delay_ms)
    }

    pub fn dig_unlock_delay(&self) -> Duration {
        Duration::from_millis(self.dig_unlock_delay_ms)
    }

    pub fn preview_reset_delay(&self) -> Duration {
        Duration::from_millis(self.preview_reset_delay_ms)
    }

    /// Zero delays everywhere; used by tests and offline tools.
    pub fn immediate() -> Self {
        Self {
            poll_interval_ms: 1,
            pre_generation_delay_ms: 0,
            post_reveal_delay_ms: 0,
            dig_unlock_delay_ms: 0,
            preview_reset_delay_ms: 0,
            ..Self::default()
        }
    }
}

impl BotConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_json(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(Error::Io(format!("{}: {}", path.display(), e))),
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Apply `CAVE_BOT_*` overrides through a lookup function.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(world_id) = lookup(ENV_WORLD_ID) {
            self.world_id = world_id;
        }
        if let Some(admin) = lookup(ENV_ADMIN) {
            self.admin_username = admin;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.world_width == 0 || self.world_height == 0 {
            return Err(Error::Config(format!(
                "world size must be positive, got {}x{}",
                self.world_width, self.world_height
            )));
        }
        if self.round.max_treasure_attempts == 0 {
            return Err(Error::Config("max_treasure_attempts must be at least 1".into()));
        }
        Ok(())
    }

    pub fn is_admin(&self, username: &str) -> bool {
        !self.admin_username.is_empty() && self.admin_username.eq_ignore_ascii_case(username)
    }
}
