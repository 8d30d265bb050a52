//! In-memory collaborators for hosts that drive their own loop

use std::sync::Mutex;

use super::{FrameCallback, FrameScheduler, ScrollSource};
use crate::notifier::RawScrollListener;

/// Scroll source whose offset is set explicitly
#[derive(Debug, Default)]
pub struct ManualScrollSource {
    offset: Mutex<f64>,
    listener: Mutex<Option<RawScrollListener>>,
}

impl ManualScrollSource {
    pub fn new(offset: f64) -> Self {
        Self {
            offset: Mutex::new(offset),
            listener: Mutex::new(None),
        }
    }

    /// Move to `offset` and raise a raw scroll event if a listener is attached
    pub fn scroll_to(&self, offset: f64) {
        if let Ok(mut current) = self.offset.lock() {
            *current = offset;
        }
        let listener = self.listener.lock().ok().and_then(|l| l.clone());
        if let Some(listener) = listener {
            listener.on_scroll();
        }
    }

    /// Move by `delta` (positive scrolls down)
    pub fn scroll_by(&self, delta: f64) {
        self.scroll_to(self.offset() + delta);
    }

    pub fn is_attached(&self) -> bool {
        self.listener.lock().map(|l| l.is_some()).unwrap_or(false)
    }
}

impl ScrollSource for ManualScrollSource {
    fn offset(&self) -> f64 {
        self.offset.lock().map(|o| *o).unwrap_or_default()
    }

    fn attach(&self, listener: RawScrollListener) {
        if let Ok(mut slot) = self.listener.lock() {
            *slot = Some(listener);
        }
    }

    fn detach(&self) {
        if let Ok(mut slot) = self.listener.lock() {
            *slot = None;
        }
    }
}

/// Frame scheduler that queues frames until the host calls `run_pending`
#[derive(Default)]
pub struct ManualFrames {
    queue: Mutex<Vec<FrameCallback>>,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }

    /// Run every queued frame; frames requested while running wait for the next call
    pub fn run_pending(&self) -> usize {
        let frames: Vec<FrameCallback> = match self.queue.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => return 0,
        };
        let count = frames.len();
        for frame in frames {
            frame();
        }
        count
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&self, frame: FrameCallback) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push(frame);
        }
    }
}

impl std::fmt::Debug for ManualFrames {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualFrames")
            .field("pending", &self.pending())
            .finish()
    }
}
