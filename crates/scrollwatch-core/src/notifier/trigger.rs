//! One-time trigger registration and its Armed/Fired state machine

use std::fmt;
use std::sync::Arc;

use tokio::time::Instant;

use super::sample::{Direction, ScrollSample};
use super::NotifyFn;
use crate::config::TriggerOptions;
use crate::host::TimerId;

/// Identifier issued by a notifier for each registered trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerId(pub(crate) u64);

impl TriggerId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trigger-{}", self.0)
    }
}

/// Options plus the callback to run when the trigger fires
///
/// The callback is optional here so a config can be built from a file and
/// completed later; registering one without a callback is rejected.
#[derive(Clone, Default)]
pub struct TriggerConfig {
    pub options: TriggerOptions,
    callback: Option<Arc<NotifyFn>>,
}

impl TriggerConfig {
    pub fn new(options: TriggerOptions) -> Self {
        Self {
            options,
            callback: None,
        }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.options.direction = direction;
        self
    }

    pub fn reset_on_stop(mut self, enabled: bool) -> Self {
        self.options.reset_on_stop = enabled;
        self
    }

    pub fn reset_delay_ms(mut self, ms: u64) -> Self {
        self.options.reset_delay_ms = ms;
        self
    }

    pub fn require_actual_scroll(mut self, required: bool) -> Self {
        self.options.require_actual_scroll = required;
        self
    }

    pub fn debounce_interval_ms(mut self, ms: u64) -> Self {
        self.options.debounce_interval_ms = ms;
        self
    }

    pub fn on_fire<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ScrollSample) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    pub(crate) fn into_parts(self) -> (TriggerOptions, Option<Arc<NotifyFn>>) {
        (self.options, self.callback)
    }
}

impl fmt::Debug for TriggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerConfig")
            .field("options", &self.options)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// Read-only view of a trigger's state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerState {
    pub direction: Direction,
    pub has_fired: bool,
    pub has_observed_scroll: bool,
    pub last_fired_at: Option<Instant>,
    pub last_reset_at: Option<Instant>,
    /// A stop-detection reset timer is pending
    pub reset_pending: bool,
}

pub(crate) struct Trigger {
    pub(crate) options: TriggerOptions,
    pub(crate) callback: Arc<NotifyFn>,
    has_fired: bool,
    has_observed_scroll: bool,
    last_fired_at: Option<Instant>,
    last_reset_at: Option<Instant>,
    reset_timer: Option<TimerId>,
    /// Bumped whenever the pending timer is replaced or cancelled
    generation: u64,
}

impl Trigger {
    pub(crate) fn new(options: TriggerOptions, callback: Arc<NotifyFn>) -> Self {
        Self {
            options,
            callback,
            has_fired: false,
            has_observed_scroll: false,
            last_fired_at: None,
            last_reset_at: None,
            reset_timer: None,
            generation: 0,
        }
    }

    pub(crate) fn observe_scroll(&mut self) {
        self.has_observed_scroll = true;
    }

    #[inline]
    pub(crate) fn is_armed(&self) -> bool {
        !self.has_fired && (self.has_observed_scroll || !self.options.require_actual_scroll)
    }

    /// Armed and pointed the same way as `direction`
    #[inline]
    pub(crate) fn should_fire(&self, direction: Direction) -> bool {
        self.is_armed() && direction == self.options.direction
    }

    pub(crate) fn mark_fired(&mut self, now: Instant) {
        self.has_fired = true;
        self.last_fired_at = Some(now);
    }

    /// Fired, moving against the trigger, and past the debounce interval
    pub(crate) fn can_rearm_on_reversal(&self, direction: Direction, now: Instant) -> bool {
        self.has_fired
            && direction == self.options.direction.opposite()
            && self
                .last_reset_at
                .map_or(true, |at| now.duration_since(at) >= self.options.debounce_interval())
    }

    pub(crate) fn rearm(&mut self, now: Instant) {
        self.has_fired = false;
        self.last_reset_at = Some(now);
    }

    /// Explicit reset; leaves `last_reset_at` alone
    pub(crate) fn clear_fired(&mut self) {
        self.has_fired = false;
    }

    /// Detach the pending timer, invalidating any callback still in flight
    pub(crate) fn take_timer(&mut self) -> Option<TimerId> {
        self.generation += 1;
        self.reset_timer.take()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn set_timer(&mut self, timer: TimerId) {
        self.reset_timer = Some(timer);
    }

    /// Whether a timer callback carrying `generation` is still current
    pub(crate) fn owns_timer(&self, generation: u64) -> bool {
        self.reset_timer.is_some() && self.generation == generation
    }

    pub(crate) fn has_fired(&self) -> bool {
        self.has_fired
    }

    pub(crate) fn state(&self) -> TriggerState {
        TriggerState {
            direction: self.options.direction,
            has_fired: self.has_fired,
            has_observed_scroll: self.has_observed_scroll,
            last_fired_at: self.last_fired_at,
            last_reset_at: self.last_reset_at,
            reset_pending: self.reset_timer.is_some(),
        }
    }
}
