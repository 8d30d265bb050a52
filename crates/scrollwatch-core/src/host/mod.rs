//! Host collaborators for the scroll notifier
//!
//! The notifier never reads a scroll offset, schedules a frame or arms a timer
//! on its own. Those primitives come from the embedding environment through
//! the traits below:
//!
//! - `ScrollSource` - current offset plus a change listener
//! - `FrameScheduler` - run a callback once on the next frame
//! - `TimerDriver` - delayed callbacks that can be cancelled
//!
//! None of these may call back into the notifier synchronously from
//! `attach`, `detach`, `request_frame`, `set_timeout` or `clear_timeout`.
//! Notification passes are serialized, so a callback must not drive frames or
//! timers itself (for example `ManualFrames::run_pending` from a subscriber).

mod manual;
mod runtime;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::notifier::RawScrollListener;

pub use manual::{ManualFrames, ManualScrollSource};
pub use runtime::{TokioFrames, TokioTimers};

/// Callback run once by a `FrameScheduler`
pub type FrameCallback = Box<dyn FnOnce() + Send + 'static>;

/// Callback run once by a `TimerDriver`
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Source of scroll offsets and raw scroll events
pub trait ScrollSource: Send + Sync {
    /// Current scroll offset
    fn offset(&self) -> f64;

    /// Start delivering raw scroll events to `listener`
    fn attach(&self, listener: RawScrollListener);

    /// Stop delivering raw scroll events
    fn detach(&self);
}

/// Next-frame scheduling primitive
pub trait FrameScheduler: Send + Sync {
    /// Run `frame` once, soon, but never before this call returns
    fn request_frame(&self, frame: FrameCallback);
}

/// Handle to a pending timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Delayed callback primitive
pub trait TimerDriver: Send + Sync {
    fn set_timeout(&self, delay: Duration, callback: TimerCallback) -> TimerId;

    /// Cancel a pending timer; unknown or already fired ids are ignored
    fn clear_timeout(&self, id: TimerId);
}

/// The set of collaborators a notifier runs against
#[derive(Clone)]
pub struct Host {
    pub source: Arc<dyn ScrollSource>,
    pub frames: Arc<dyn FrameScheduler>,
    pub timers: Arc<dyn TimerDriver>,
}

impl Host {
    pub fn new(
        source: Arc<dyn ScrollSource>,
        frames: Arc<dyn FrameScheduler>,
        timers: Arc<dyn TimerDriver>,
    ) -> Self {
        Self {
            source,
            frames,
            timers,
        }
    }

    /// Frames and timers on the current tokio runtime
    ///
    /// Fails with `Error::Runtime` when called outside a runtime.
    pub fn tokio(source: Arc<dyn ScrollSource>, frame_interval: Duration) -> crate::Result<Self> {
        Ok(Self {
            source,
            frames: Arc::new(TokioFrames::new(frame_interval)?),
            timers: Arc::new(TokioTimers::new()?),
        })
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host").finish_non_exhaustive()
    }
}
