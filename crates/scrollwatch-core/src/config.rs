use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::notifier::Direction;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    /// Defaults applied to triggers that don't override them
    #[serde(default)]
    pub trigger: TriggerOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Delay between a raw scroll event and its coalesced notification
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval(),
        }
    }
}

impl NotifierConfig {
    pub fn frame_interval(&self) -> Duration {
        if self.frame_interval_ms == 0 {
            Duration::from_millis(default_frame_interval())
        } else {
            Duration::from_millis(self.frame_interval_ms)
        }
    }
}

/// Behaviour of a one-time trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerOptions {
    /// Scroll direction that fires the trigger
    #[serde(default)]
    pub direction: Direction,
    /// Re-arm once scrolling has stopped for `reset_delay_ms`
    #[serde(default = "default_true")]
    pub reset_on_stop: bool,
    /// Inactivity period before an automatic re-arm
    #[serde(default = "default_reset_delay")]
    pub reset_delay_ms: u64,
    /// Stay disarmed until at least one raw scroll event has been observed
    #[serde(default = "default_true")]
    pub require_actual_scroll: bool,
    /// Minimum time between re-arms caused by a direction reversal
    #[serde(default = "default_debounce_interval")]
    pub debounce_interval_ms: u64,
}

impl Default for TriggerOptions {
    fn default() -> Self {
        Self {
            direction: Direction::default(),
            reset_on_stop: default_true(),
            reset_delay_ms: default_reset_delay(),
            require_actual_scroll: default_true(),
            debounce_interval_ms: default_debounce_interval(),
        }
    }
}

impl TriggerOptions {
    #[inline]
    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }

    #[inline]
    pub fn debounce_interval(&self) -> Duration {
        Duration::from_millis(self.debounce_interval_ms)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_frame_interval() -> u64 {
    16 // ~60fps
}

fn default_reset_delay() -> u64 {
    1500
}

fn default_debounce_interval() -> u64 {
    300
}

impl AppConfig {
    /// Load configuration from a specific file, defaults if it doesn't exist
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::parse(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Write configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, self.to_toml()?)?;

        Ok(())
    }

    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Always uses ~/.config/scrollwatch/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("scrollwatch")
            .join("config.toml")
    }
}
