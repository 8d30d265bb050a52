use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Vertical scroll direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    #[default]
    Down,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Direction of travel from `previous` to `current`
    ///
    /// Offsets grow downwards. No movement keeps `fallback`.
    pub fn between(previous: f64, current: f64, fallback: Direction) -> Self {
        if current > previous {
            Direction::Down
        } else if current < previous {
            Direction::Up
        } else {
            fallback
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
        }
    }
}

/// Scroll state delivered with every notification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSample {
    pub position: f64,
    pub direction: Direction,
    pub timestamp: Instant,
}
