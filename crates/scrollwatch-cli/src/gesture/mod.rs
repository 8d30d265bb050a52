//! Synthesized scroll gestures
//!
//! A gesture moves from one offset to another over a duration, following an
//! easing curve, and is sampled into timed raw scroll events.

pub mod easing;
pub mod timing;

use std::time::Duration;

pub use easing::EasingType;

use crate::scenario::RawScrollEvent;
use timing::{lerp, progress};

#[derive(Debug, Clone, Copy)]
pub struct Gesture {
    pub from: f64,
    pub to: f64,
    pub duration: Duration,
    pub easing: EasingType,
}

impl Gesture {
    /// Raw events every `interval`, always ending exactly on `to`
    pub fn sample(&self, interval: Duration) -> Vec<RawScrollEvent> {
        let step = interval.as_millis().max(1) as u64;
        let total = self.duration.as_millis() as u64;

        let mut events: Vec<RawScrollEvent> = (0..=total)
            .step_by(step as usize)
            .map(|at_ms| {
                let t = progress(Duration::from_millis(at_ms), self.duration);
                RawScrollEvent {
                    at_ms,
                    offset: lerp(self.from, self.to, self.easing.apply(t)),
                }
            })
            .collect();

        if events.last().map(|e| e.at_ms) != Some(total) {
            events.push(RawScrollEvent {
                at_ms: total,
                offset: self.to,
            });
        }
        events
    }
}
