//! Scenario files: triggers plus timed raw scroll events
//!
//! ```toml
//! initial_offset = 0.0
//! settle_ms = 2000
//!
//! [page]
//! content_height = 4000.0
//! viewport_height = 800.0
//!
//! [[trigger]]
//! name = "hide-header"
//! direction = "down"
//! reset_delay_ms = 500
//!
//! [[event]]
//! at_ms = 0
//! offset = 120.0
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use scrollwatch_core::{Direction, TriggerOptions};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Source offset before the first event
    #[serde(default)]
    pub initial_offset: f64,
    /// How long to keep running after the last event
    #[serde(default = "default_settle")]
    pub settle_ms: u64,
    /// Page geometry, used to report scroll progress
    #[serde(default)]
    pub page: Option<PageGeometry>,
    #[serde(default, rename = "trigger")]
    pub triggers: Vec<TriggerSpec>,
    #[serde(default, rename = "event")]
    pub events: Vec<RawScrollEvent>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageGeometry {
    pub content_height: f64,
    pub viewport_height: f64,
}

/// A named trigger; unset fields fall back to the configured defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerSpec {
    pub name: String,
    pub direction: Option<Direction>,
    pub reset_on_stop: Option<bool>,
    pub reset_delay_ms: Option<u64>,
    pub require_actual_scroll: Option<bool>,
    pub debounce_interval_ms: Option<u64>,
}

impl TriggerSpec {
    pub fn resolve(&self, defaults: &TriggerOptions) -> TriggerOptions {
        TriggerOptions {
            direction: self.direction.unwrap_or(defaults.direction),
            reset_on_stop: self.reset_on_stop.unwrap_or(defaults.reset_on_stop),
            reset_delay_ms: self.reset_delay_ms.unwrap_or(defaults.reset_delay_ms),
            require_actual_scroll: self
                .require_actual_scroll
                .unwrap_or(defaults.require_actual_scroll),
            debounce_interval_ms: self
                .debounce_interval_ms
                .unwrap_or(defaults.debounce_interval_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawScrollEvent {
    /// Milliseconds since the start of the run
    pub at_ms: u64,
    pub offset: f64,
}

fn default_settle() -> u64 {
    2000
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid scenario {}", path.display()))
    }

    /// Parse and validate; events are ordered by time
    pub fn parse(content: &str) -> Result<Self> {
        let mut scenario: Scenario = toml::from_str(content)?;
        scenario.validate()?;
        scenario.events.sort_by_key(|e| e.at_ms);
        Ok(scenario)
    }

    fn validate(&self) -> Result<()> {
        if !self.initial_offset.is_finite() {
            bail!("initial_offset must be a finite number");
        }
        if let Some(bad) = self.events.iter().find(|e| !e.offset.is_finite()) {
            bail!("event at {}ms has a non-finite offset", bad.at_ms);
        }
        for (i, trigger) in self.triggers.iter().enumerate() {
            if trigger.name.trim().is_empty() {
                bail!("trigger #{} has an empty name", i + 1);
            }
            if self.triggers[..i].iter().any(|t| t.name == trigger.name) {
                bail!("duplicate trigger name '{}'", trigger.name);
            }
        }
        if let Some(page) = self.page {
            if page.content_height < 0.0 || page.viewport_height <= 0.0 {
                bail!("page heights must be positive");
            }
        }
        Ok(())
    }

    /// Time of the last event
    pub fn duration_ms(&self) -> u64 {
        self.events.last().map(|e| e.at_ms).unwrap_or(0)
    }
}
