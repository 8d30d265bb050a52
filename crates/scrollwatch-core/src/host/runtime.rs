//! Tokio-backed frame scheduling and timers

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::debug;

use super::{FrameCallback, FrameScheduler, TimerCallback, TimerDriver, TimerId};
use crate::{Error, Result};

fn current_handle() -> Result<Handle> {
    Handle::try_current().map_err(|e| Error::Runtime(e.to_string()))
}

/// Runs each requested frame one frame interval later
#[derive(Debug, Clone)]
pub struct TokioFrames {
    handle: Handle,
    interval: Duration,
}

impl TokioFrames {
    /// Bind to the tokio runtime of the caller
    pub fn new(interval: Duration) -> Result<Self> {
        Ok(Self {
            handle: current_handle()?,
            interval,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl FrameScheduler for TokioFrames {
    fn request_frame(&self, frame: FrameCallback) {
        let interval = self.interval;
        self.handle.spawn(async move {
            tokio::time::sleep(interval).await;
            frame();
        });
    }
}

/// Timers as spawned sleeps, cancelled by aborting the task
#[derive(Debug)]
pub struct TokioTimers {
    handle: Handle,
    next_id: AtomicU64,
    pending: Arc<Mutex<HashMap<TimerId, AbortHandle>>>,
}

impl TokioTimers {
    /// Bind to the tokio runtime of the caller
    pub fn new() -> Result<Self> {
        Ok(Self {
            handle: current_handle()?,
            next_id: AtomicU64::new(1),
            pending: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Number of timers that have neither fired nor been cleared
    pub fn pending_count(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }
}

impl TimerDriver for TokioTimers {
    fn set_timeout(&self, delay: Duration, callback: TimerCallback) -> TimerId {
        let id = TimerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let pending = Arc::clone(&self.pending);

        // Hold the map lock across spawn so the task can't remove its entry
        // before it has been inserted.
        let mut guard = match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let task = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Ok(mut pending) = pending.lock() {
                pending.remove(&id);
            }
            callback();
        });
        guard.insert(id, task.abort_handle());

        id
    }

    fn clear_timeout(&self, id: TimerId) {
        let removed = match self.pending.lock() {
            Ok(mut pending) => pending.remove(&id),
            Err(poisoned) => poisoned.into_inner().remove(&id),
        };
        if let Some(task) = removed {
            task.abort();
            debug!("Cleared {}", id);
        }
    }
}
