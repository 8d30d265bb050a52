//! Frame-coalesced scroll notifications
//!
//! A `ScrollNotifier` is a single shared point of observation for a host's
//! scroll position. Raw scroll events are collapsed into at most one
//! notification per frame, and every notification carries a `ScrollSample`
//! whose direction is measured against the previously *notified* position.
//!
//! Two registration modes are offered:
//!
//! - persistent subscribers, called on every notification
//! - one-time triggers, called once per direction match and re-armed either
//!   when scrolling stops for the reset delay or when the user scrolls the
//!   other way (subject to the debounce interval)
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use scrollwatch_core::host::ManualScrollSource;
//! use scrollwatch_core::{Direction, Host, ScrollNotifier, TriggerConfig};
//!
//! let source = Arc::new(ManualScrollSource::new(0.0));
//! let notifier = ScrollNotifier::new(Host::tokio(source.clone(), Duration::from_millis(16))?);
//!
//! let subscription = notifier.subscribe(|sample| {
//!     println!("{} {}", sample.position, sample.direction);
//!     Ok(())
//! });
//!
//! let id = notifier.add_one_time_trigger(
//!     TriggerConfig::default()
//!         .direction(Direction::Down)
//!         .on_fire(|_| Ok(())),
//! )?;
//!
//! source.scroll_to(240.0);
//! ```
//!
//! The registry lock is never held while user callbacks run, so callbacks may
//! unsubscribe, remove or reset registrations on the same notifier.

mod events;
pub mod global;
mod sample;
mod trigger;

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::host::Host;
use crate::{Error, Result};

pub use events::{CallbackOrigin, NotifierEvent, RearmCause};
pub use sample::{Direction, ScrollSample};
pub use trigger::{TriggerConfig, TriggerId, TriggerState};

use trigger::Trigger;

/// Callback shape shared by subscribers and triggers
pub(crate) type NotifyFn = dyn Fn(&ScrollSample) -> anyhow::Result<()> + Send + Sync;

/// Identifier of a persistent subscriber registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscriber-{}", self.0)
    }
}

struct State {
    subscribers: Vec<(SubscriberId, Arc<NotifyFn>)>,
    /// Ids are issued in increasing order, so key order is registration order
    triggers: BTreeMap<TriggerId, Trigger>,
    next_subscriber: u64,
    next_trigger: u64,
    listening: bool,
    frame_pending: bool,
    raw_position: f64,
    notified_position: f64,
    direction: Direction,
}

struct Shared {
    host: Host,
    state: Mutex<State>,
    /// Held for a whole notification pass and for reset expiry, never
    /// while registering, so passes cannot overlap across threads
    delivery: Mutex<()>,
    events: Mutex<Option<mpsc::UnboundedSender<NotifierEvent>>>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn delivery(&self) -> MutexGuard<'_, ()> {
        self.delivery.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: NotifierEvent) {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(ref tx) = *events {
            if tx.send(event).is_err() {
                warn!("Failed to send notifier event: receiver dropped");
                *events = None;
            }
        }
    }

    fn start_listening(this: &Arc<Self>, state: &mut State) {
        if state.listening {
            return;
        }
        let position = this.host.source.offset();
        state.raw_position = position;
        state.notified_position = position;
        state.listening = true;
        this.host.source.attach(RawScrollListener {
            shared: Arc::downgrade(this),
        });
        debug!("Scroll listener attached at offset {}", position);
        this.emit(NotifierEvent::ListenerAttached);
    }

    fn stop_listening_if_idle(&self, state: &mut State) {
        if state.listening && state.subscribers.is_empty() && state.triggers.is_empty() {
            self.host.source.detach();
            state.listening = false;
            debug!("Scroll listener detached, no registrations left");
            self.emit(NotifierEvent::ListenerDetached);
        }
    }

    fn handle_raw_scroll(this: &Arc<Self>) {
        let request_frame = {
            let mut state = this.state();
            if !state.listening {
                return;
            }
            state.raw_position = this.host.source.offset();
            for trigger in state.triggers.values_mut() {
                trigger.observe_scroll();
            }
            !std::mem::replace(&mut state.frame_pending, true)
        };

        if request_frame {
            let weak = Arc::downgrade(this);
            this.host.frames.request_frame(Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    Shared::flush_frame(&shared);
                }
            }));
        }
    }

    fn flush_frame(this: &Arc<Self>) {
        // A frame requested mid-pass waits here and then reads the latest raw
        // position, so a subscriber never sees positions out of order
        let _delivering = this.delivery();
        let (sample, subscribers, trigger_ids) = {
            let mut state = this.state();
            state.frame_pending = false;
            if !state.listening {
                return;
            }

            let direction =
                Direction::between(state.notified_position, state.raw_position, state.direction);
            state.direction = direction;
            state.notified_position = state.raw_position;

            let sample = ScrollSample {
                position: state.raw_position,
                direction,
                timestamp: Instant::now(),
            };
            let ids: Vec<TriggerId> = state.triggers.keys().copied().collect();
            (sample, state.subscribers.clone(), ids)
        };
        this.emit(NotifierEvent::Notified { sample });

        for (id, callback) in &subscribers {
            this.invoke(CallbackOrigin::Subscriber(*id), callback.as_ref(), &sample);
        }

        for id in trigger_ids {
            Shared::process_trigger(this, id, &sample);
        }
    }

    fn process_trigger(this: &Arc<Self>, id: TriggerId, sample: &ScrollSample) {
        let callback = {
            let mut state = this.state();
            let Some(trigger) = state.triggers.get_mut(&id) else {
                return;
            };

            let fire = trigger.should_fire(sample.direction);
            if fire {
                trigger.mark_fired(sample.timestamp);
            }
            // Firing or not, continued scrolling pushes the stop timer back
            if trigger.options.reset_on_stop {
                Shared::schedule_reset(this, id, trigger);
            }
            fire.then(|| Arc::clone(&trigger.callback))
        };

        if let Some(callback) = callback {
            debug!("{} fired at offset {} ({})", id, sample.position, sample.direction);
            this.emit(NotifierEvent::TriggerFired {
                id,
                sample: *sample,
            });
            this.invoke(CallbackOrigin::Trigger(id), callback.as_ref(), sample);
        }

        let mut state = this.state();
        if let Some(trigger) = state.triggers.get_mut(&id) {
            if trigger.can_rearm_on_reversal(sample.direction, sample.timestamp) {
                trigger.rearm(sample.timestamp);
                if let Some(timer) = trigger.take_timer() {
                    this.host.timers.clear_timeout(timer);
                }
                debug!("{} re-armed by reversal to {}", id, sample.direction);
                this.emit(NotifierEvent::TriggerRearmed {
                    id,
                    cause: RearmCause::Reversal,
                });
            }
        }
    }

    fn schedule_reset(this: &Arc<Self>, id: TriggerId, trigger: &mut Trigger) {
        if let Some(previous) = trigger.take_timer() {
            this.host.timers.clear_timeout(previous);
        }
        let generation = trigger.generation();
        let weak = Arc::downgrade(this);
        let timer = this.host.timers.set_timeout(
            trigger.options.reset_delay(),
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.expire_reset(id, generation);
                }
            }),
        );
        trigger.set_timer(timer);
    }

    fn expire_reset(&self, id: TriggerId, generation: u64) {
        let _delivering = self.delivery();
        let mut state = self.state();
        let Some(trigger) = state.triggers.get_mut(&id) else {
            return;
        };
        if !trigger.owns_timer(generation) {
            debug!("Ignoring superseded reset timer for {}", id);
            return;
        }

        trigger.take_timer();
        let was_fired = trigger.has_fired();
        trigger.rearm(Instant::now());
        if was_fired {
            debug!("{} re-armed after scrolling stopped", id);
            self.emit(NotifierEvent::TriggerRearmed {
                id,
                cause: RearmCause::ScrollStopped,
            });
        }
    }

    /// Run one callback, containing both `Err` returns and panics
    fn invoke(&self, origin: CallbackOrigin, callback: &NotifyFn, sample: &ScrollSample) {
        let message = match panic::catch_unwind(AssertUnwindSafe(|| callback(sample))) {
            Ok(Ok(())) => return,
            Ok(Err(e)) => format!("{:#}", e),
            Err(payload) => panic_message(payload.as_ref()),
        };

        let error = Error::CallbackFailure {
            origin,
            message: message.clone(),
        };
        warn!("{}", error);
        self.emit(NotifierEvent::CallbackFailed { origin, message });
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        for trigger in state.triggers.values_mut() {
            if let Some(timer) = trigger.take_timer() {
                self.host.timers.clear_timeout(timer);
            }
        }
        if state.listening {
            self.host.source.detach();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

/// Entry point for raw scroll events, handed to `ScrollSource::attach`
#[derive(Clone)]
pub struct RawScrollListener {
    shared: Weak<Shared>,
}

impl RawScrollListener {
    /// Record the source's current offset and schedule a notification
    pub fn on_scroll(&self) {
        if let Some(shared) = self.shared.upgrade() {
            Shared::handle_raw_scroll(&shared);
        }
    }
}

impl fmt::Debug for RawScrollListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawScrollListener")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

/// Handle returned by `ScrollNotifier::subscribe`
///
/// Dropping it does not unsubscribe.
#[must_use = "keep the Subscription to be able to unsubscribe"]
#[derive(Debug, Clone)]
pub struct Subscription {
    id: SubscriberId,
    shared: Weak<Shared>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Remove this registration; later calls are no-ops
    pub fn unsubscribe(&self) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        let mut state = shared.state();
        let before = state.subscribers.len();
        state.subscribers.retain(|(id, _)| *id != self.id);
        if state.subscribers.len() != before {
            debug!("Unsubscribed {}", self.id);
            shared.stop_listening_if_idle(&mut state);
        }
    }
}

/// Scroll observation point shared by subscribers and one-time triggers
///
/// Cloning yields another handle to the same notifier.
#[derive(Clone)]
pub struct ScrollNotifier {
    shared: Arc<Shared>,
}

impl ScrollNotifier {
    /// Create an independent notifier bound to `host`
    pub fn new(host: Host) -> Self {
        let position = host.source.offset();
        Self {
            shared: Arc::new(Shared {
                host,
                delivery: Mutex::new(()),
                state: Mutex::new(State {
                    subscribers: Vec::new(),
                    triggers: BTreeMap::new(),
                    next_subscriber: 0,
                    next_trigger: 0,
                    listening: false,
                    frame_pending: false,
                    raw_position: position,
                    notified_position: position,
                    direction: Direction::default(),
                }),
                events: Mutex::new(None),
            }),
        }
    }

    /// Forward lifecycle, trigger and failure events to `tx`
    pub fn set_event_sender(&self, tx: mpsc::UnboundedSender<NotifierEvent>) {
        let mut events = self
            .shared
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *events = Some(tx);
    }

    /// Register a callback for every coalesced notification
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ScrollSample) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut state = self.shared.state();
        state.next_subscriber += 1;
        let id = SubscriberId(state.next_subscriber);
        state.subscribers.push((id, Arc::new(callback)));
        Shared::start_listening(&self.shared, &mut state);
        debug!("Registered {}", id);

        Subscription {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Register a one-time, direction-gated trigger
    ///
    /// Fails with `Error::InvalidArgument` when the config has no callback.
    pub fn add_one_time_trigger(&self, config: TriggerConfig) -> Result<TriggerId> {
        let (options, callback) = config.into_parts();
        let Some(callback) = callback else {
            let error = Error::InvalidArgument("one-time trigger requires a callback".to_string());
            warn!("Rejected trigger registration: {}", error);
            return Err(error);
        };

        let mut state = self.shared.state();
        state.next_trigger += 1;
        let id = TriggerId(state.next_trigger);
        state.triggers.insert(id, Trigger::new(options, callback));
        Shared::start_listening(&self.shared, &mut state);
        debug!("Registered {} for {} scrolling", id, options.direction);

        Ok(id)
    }

    /// Remove a trigger and cancel its pending reset
    ///
    /// Returns `false` for unknown ids.
    pub fn remove_one_time_trigger(&self, id: TriggerId) -> bool {
        let mut state = self.shared.state();
        match state.triggers.remove(&id) {
            Some(mut trigger) => {
                if let Some(timer) = trigger.take_timer() {
                    self.shared.host.timers.clear_timeout(timer);
                }
                debug!("Removed {}", id);
                self.shared.stop_listening_if_idle(&mut state);
                true
            }
            None => {
                debug!("Ignoring removal of unknown {}", id);
                false
            }
        }
    }

    /// Arm a trigger again and cancel its pending reset, keeping it registered
    pub fn reset_one_time_trigger(&self, id: TriggerId) -> bool {
        let mut state = self.shared.state();
        let Some(trigger) = state.triggers.get_mut(&id) else {
            debug!("Ignoring reset of unknown {}", id);
            return false;
        };
        trigger.clear_fired();
        if let Some(timer) = trigger.take_timer() {
            self.shared.host.timers.clear_timeout(timer);
        }
        true
    }

    pub fn reset_all_one_time_triggers(&self) {
        let mut state = self.shared.state();
        for trigger in state.triggers.values_mut() {
            trigger.clear_fired();
            if let Some(timer) = trigger.take_timer() {
                self.shared.host.timers.clear_timeout(timer);
            }
        }
    }

    /// Current offset with its direction relative to the last raw event
    ///
    /// Does not modify any notifier state.
    pub fn get_scroll_position(&self) -> ScrollSample {
        let state = self.shared.state();
        let position = self.shared.host.source.offset();
        ScrollSample {
            position,
            direction: Direction::between(state.raw_position, position, state.direction),
            timestamp: Instant::now(),
        }
    }

    pub fn trigger_state(&self, id: TriggerId) -> Option<TriggerState> {
        self.shared.state().triggers.get(&id).map(Trigger::state)
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.state().subscribers.len()
    }

    pub fn trigger_count(&self) -> usize {
        self.shared.state().triggers.len()
    }

    /// Whether the raw scroll listener is attached to the source
    pub fn is_listening(&self) -> bool {
        self.shared.state().listening
    }
}

impl fmt::Debug for ScrollNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state();
        f.debug_struct("ScrollNotifier")
            .field("subscribers", &state.subscribers.len())
            .field("triggers", &state.triggers.len())
            .field("listening", &state.listening)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ManualFrames, ManualScrollSource, TokioFrames, TokioTimers};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Harness {
        source: Arc<ManualScrollSource>,
        frames: Arc<ManualFrames>,
        notifier: ScrollNotifier,
    }

    impl Harness {
        fn new() -> Self {
            let source = Arc::new(ManualScrollSource::new(0.0));
            let frames = Arc::new(ManualFrames::new());
            let host = Host::new(
                source.clone(),
                frames.clone(),
                Arc::new(TokioTimers::new().unwrap()),
            );
            Self {
                source,
                frames,
                notifier: ScrollNotifier::new(host),
            }
        }

        /// Raw scroll event followed by the frame it schedules
        fn scroll(&self, offset: f64) {
            self.source.scroll_to(offset);
            self.frames.run_pending();
        }
    }

    fn recorder() -> (
        Arc<Mutex<Vec<ScrollSample>>>,
        impl Fn(&ScrollSample) -> anyhow::Result<()> + Send + Sync + 'static,
    ) {
        let samples = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&samples);
        (samples, move |sample: &ScrollSample| -> anyhow::Result<()> {
            sink.lock().unwrap().push(*sample);
            Ok(())
        })
    }

    fn counter() -> (
        Arc<AtomicUsize>,
        impl Fn(&ScrollSample) -> anyhow::Result<()> + Send + Sync + 'static,
    ) {
        let hits = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&hits);
        (hits, move |_: &ScrollSample| -> anyhow::Result<()> {
            sink.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<NotifierEvent>) -> Vec<NotifierEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn test_raw_events_coalesce_into_one_notification() {
        let h = Harness::new();
        let (samples, record) = recorder();
        let _sub = h.notifier.subscribe(record);

        h.source.scroll_to(10.0);
        h.source.scroll_to(20.0);
        h.source.scroll_to(30.0);
        assert_eq!(h.frames.pending(), 1);
        assert_eq!(h.frames.run_pending(), 1);

        let samples = samples.lock().unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].position, 30.0);
        assert_eq!(samples[0].direction, Direction::Down);
    }

    #[tokio::test(start_paused = true)]
    async fn test_direction_measured_from_last_notified_position() {
        let h = Harness::new();
        let (samples, record) = recorder();
        let _sub = h.notifier.subscribe(record);

        h.scroll(30.0);
        // 40 -> 35 is upward between raw events, but 30 -> 35 is downward
        h.source.scroll_to(40.0);
        h.source.scroll_to(35.0);
        h.frames.run_pending();

        let samples = samples.lock().unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].position, 35.0);
        assert_eq!(samples[1].direction, Direction::Down);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listener_follows_registrations() {
        let h = Harness::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        h.notifier.set_event_sender(tx);
        assert!(!h.source.is_attached());

        let sub = h.notifier.subscribe(|_| Ok(()));
        let trigger = h
            .notifier
            .add_one_time_trigger(TriggerConfig::default().on_fire(|_| Ok(())))
            .unwrap();
        assert!(h.source.is_attached());
        assert!(h.notifier.is_listening());

        sub.unsubscribe();
        assert!(h.source.is_attached(), "trigger still registered");

        assert!(h.notifier.remove_one_time_trigger(trigger));
        assert!(!h.source.is_attached());
        assert!(!h.notifier.is_listening());

        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], NotifierEvent::ListenerAttached));
        assert!(matches!(events[1], NotifierEvent::ListenerDetached));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribe_is_idempotent_and_stops_delivery() {
        let h = Harness::new();
        let (first_hits, first) = counter();
        let (second_hits, second) = counter();
        let sub = h.notifier.subscribe(first);
        let _keep = h.notifier.subscribe(second);

        h.scroll(10.0);
        sub.unsubscribe();
        sub.unsubscribe();
        assert_eq!(h.notifier.subscriber_count(), 1);

        h.scroll(20.0);
        assert_eq!(first_hits.load(Ordering::SeqCst), 1);
        assert_eq!(second_hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscriber_may_unsubscribe_itself() {
        let h = Harness::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let hits = Arc::new(AtomicUsize::new(0));

        let inner_slot = Arc::clone(&slot);
        let inner_hits = Arc::clone(&hits);
        let sub = h.notifier.subscribe(move |_| {
            inner_hits.fetch_add(1, Ordering::SeqCst);
            if let Some(sub) = inner_slot.lock().unwrap().as_ref() {
                sub.unsubscribe();
            }
            Ok(())
        });
        *slot.lock().unwrap() = Some(sub);

        h.scroll(10.0);
        h.scroll(20.0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!h.source.is_attached());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_subscriber_does_not_block_others() {
        let h = Harness::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        h.notifier.set_event_sender(tx);

        let failing = h
            .notifier
            .subscribe(|_| Err(anyhow::anyhow!("subscriber exploded")));
        let (samples, record) = recorder();
        let _sub = h.notifier.subscribe(record);

        h.scroll(64.0);

        let samples = samples.lock().unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].position, 64.0);
        assert_eq!(samples[0].direction, Direction::Down);

        let failure = drain(&mut rx).into_iter().find_map(|event| match event {
            NotifierEvent::CallbackFailed { origin, message } => Some((origin, message)),
            _ => None,
        });
        let (origin, message) = failure.expect("failure reported");
        assert_eq!(origin, CallbackOrigin::Subscriber(failing.id()));
        assert!(message.contains("subscriber exploded"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_subscriber_does_not_block_others() {
        let h = Harness::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        h.notifier.set_event_sender(tx);

        let panicking = h
            .notifier
            .subscribe(|_| -> anyhow::Result<()> { panic!("subscriber panicked") });
        let (hits, count) = counter();
        let _sub = h.notifier.subscribe(count);

        h.scroll(64.0);
        h.scroll(128.0);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(h.notifier.subscriber_count(), 2);

        let failures: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter_map(|event| match event {
                NotifierEvent::CallbackFailed { origin, message } => Some((origin, message)),
                _ => None,
            })
            .collect();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].0, CallbackOrigin::Subscriber(panicking.id()));
        assert!(failures[0].1.contains("subscriber panicked"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_trigger_does_not_block_next_trigger() {
        let h = Harness::new();
        h.notifier
            .add_one_time_trigger(
                TriggerConfig::default().on_fire(|_| -> anyhow::Result<()> { panic!("boom") }),
            )
            .unwrap();
        let (hits, count) = counter();
        h.notifier
            .add_one_time_trigger(TriggerConfig::default().on_fire(count))
            .unwrap();

        h.scroll(10.0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_callback_is_rejected() {
        let h = Harness::new();
        let result = h.notifier.add_one_time_trigger(TriggerConfig::default());

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert_eq!(h.notifier.trigger_count(), 0);
        assert!(!h.source.is_attached());
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_ids_are_sequential() {
        let h = Harness::new();
        let first = h
            .notifier
            .add_one_time_trigger(TriggerConfig::default().on_fire(|_| Ok(())))
            .unwrap();
        let second = h
            .notifier
            .add_one_time_trigger(TriggerConfig::default().on_fire(|_| Ok(())))
            .unwrap();
        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_without_reset_path() {
        let h = Harness::new();
        let (hits, count) = counter();
        let id = h
            .notifier
            .add_one_time_trigger(
                TriggerConfig::default()
                    .direction(Direction::Down)
                    .require_actual_scroll(false)
                    .reset_on_stop(false)
                    .on_fire(count),
            )
            .unwrap();

        h.scroll(100.0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        h.scroll(200.0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let state = h.notifier.trigger_state(id).unwrap();
        assert!(state.has_fired);
        assert!(!state.reset_pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_requires_observed_raw_scroll() {
        let h = Harness::new();
        let _sub = h.notifier.subscribe(|_| Ok(()));

        // Raw event lands before the triggers exist; the frame runs after
        h.source.scroll_to(100.0);
        let (gated_hits, gated) = counter();
        let (eager_hits, eager) = counter();
        h.notifier
            .add_one_time_trigger(TriggerConfig::default().on_fire(gated))
            .unwrap();
        h.notifier
            .add_one_time_trigger(
                TriggerConfig::default()
                    .require_actual_scroll(false)
                    .on_fire(eager),
            )
            .unwrap();
        h.frames.run_pending();

        assert_eq!(gated_hits.load(Ordering::SeqCst), 0);
        assert_eq!(eager_hits.load(Ordering::SeqCst), 1);

        h.scroll(150.0);
        assert_eq!(gated_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearms_after_reset_delay() {
        let h = Harness::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        h.notifier.set_event_sender(tx);
        let id = h
            .notifier
            .add_one_time_trigger(
                TriggerConfig::default()
                    .reset_on_stop(true)
                    .reset_delay_ms(100)
                    .on_fire(|_| Ok(())),
            )
            .unwrap();

        h.scroll(50.0);
        assert!(h.notifier.trigger_state(id).unwrap().has_fired);

        tokio::time::sleep(Duration::from_millis(150)).await;

        let state = h.notifier.trigger_state(id).unwrap();
        assert!(!state.has_fired);
        assert!(!state.reset_pending);
        assert!(state.last_reset_at.is_some());
        assert!(drain(&mut rx).iter().any(|e| matches!(
            e,
            NotifierEvent::TriggerRearmed {
                cause: RearmCause::ScrollStopped,
                ..
            }
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn test_continued_scrolling_pushes_reset_back() {
        let h = Harness::new();
        let (hits, count) = counter();
        let id = h
            .notifier
            .add_one_time_trigger(TriggerConfig::default().reset_delay_ms(100).on_fire(count))
            .unwrap();

        h.scroll(50.0);
        tokio::time::sleep(Duration::from_millis(60)).await;
        h.scroll(80.0);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(h.notifier.trigger_state(id).unwrap().has_fired);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!h.notifier.trigger_state(id).unwrap().has_fired);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        h.scroll(120.0);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reversal_rearms_with_debounce() {
        let h = Harness::new();
        let (hits, count) = counter();
        h.notifier
            .add_one_time_trigger(
                TriggerConfig::default()
                    .reset_on_stop(false)
                    .debounce_interval_ms(300)
                    .on_fire(count),
            )
            .unwrap();

        h.scroll(100.0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // First reversal re-arms straight away
        h.scroll(50.0);
        h.scroll(120.0);
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        // Within the debounce interval of the last re-arm
        h.scroll(60.0);
        h.scroll(130.0);
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_millis(300)).await;
        h.scroll(70.0);
        h.scroll(140.0);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reversal_cancels_pending_reset() {
        let h = Harness::new();
        let id = h
            .notifier
            .add_one_time_trigger(TriggerConfig::default().reset_delay_ms(1000).on_fire(|_| Ok(())))
            .unwrap();

        h.scroll(100.0);
        assert!(h.notifier.trigger_state(id).unwrap().reset_pending);

        h.scroll(40.0);
        let state = h.notifier.trigger_state(id).unwrap();
        assert!(!state.has_fired);
        assert!(!state.reset_pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_up_trigger_ignores_downward_scroll() {
        let h = Harness::new();
        let (hits, count) = counter();
        h.notifier
            .add_one_time_trigger(TriggerConfig::default().direction(Direction::Up).on_fire(count))
            .unwrap();

        h.scroll(300.0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        h.scroll(200.0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_removed_trigger_ignores_stale_timer() {
        let h = Harness::new();
        let _sub = h.notifier.subscribe(|_| Ok(()));
        let (hits, count) = counter();
        let id = h
            .notifier
            .add_one_time_trigger(TriggerConfig::default().reset_delay_ms(100).on_fire(count))
            .unwrap();

        h.scroll(10.0);
        assert!(h.notifier.remove_one_time_trigger(id));
        assert!(!h.notifier.remove_one_time_trigger(id));
        assert!(h.source.is_attached(), "subscriber keeps the listener");

        tokio::time::sleep(Duration::from_millis(200)).await;
        h.scroll(20.0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(h.notifier.trigger_state(id).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_resets() {
        let h = Harness::new();
        let options = || TriggerConfig::default().reset_delay_ms(10_000).on_fire(|_| Ok(()));
        let first = h.notifier.add_one_time_trigger(options()).unwrap();
        let second = h.notifier.add_one_time_trigger(options()).unwrap();

        h.scroll(10.0);
        assert!(h.notifier.trigger_state(first).unwrap().has_fired);

        assert!(h.notifier.reset_one_time_trigger(first));
        let state = h.notifier.trigger_state(first).unwrap();
        assert!(!state.has_fired);
        assert!(!state.reset_pending);
        assert!(h.notifier.trigger_state(second).unwrap().has_fired);

        h.notifier.reset_all_one_time_triggers();
        assert!(!h.notifier.trigger_state(second).unwrap().has_fired);
        assert_eq!(h.notifier.trigger_count(), 2);

        assert!(!h.notifier.reset_one_time_trigger(TriggerId(99)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_resetting_itself_stays_armed() {
        let h = Harness::new();
        let slot: Arc<Mutex<Option<TriggerId>>> = Arc::new(Mutex::new(None));
        let hits = Arc::new(AtomicUsize::new(0));

        let notifier = h.notifier.clone();
        let inner_slot = Arc::clone(&slot);
        let inner_hits = Arc::clone(&hits);
        let id = h
            .notifier
            .add_one_time_trigger(
                TriggerConfig::default()
                    .reset_on_stop(false)
                    .on_fire(move |_| {
                        inner_hits.fetch_add(1, Ordering::SeqCst);
                        if let Some(id) = *inner_slot.lock().unwrap() {
                            notifier.reset_one_time_trigger(id);
                        }
                        Ok(())
                    }),
            )
            .unwrap();
        *slot.lock().unwrap() = Some(id);

        // Fired is recorded before the callback runs, so its reset wins
        h.scroll(10.0);
        let state = h.notifier.trigger_state(id).unwrap();
        assert!(!state.has_fired);
        assert!(state.last_fired_at.is_some());

        h.scroll(20.0);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_notification_passes_never_overlap() {
        let source = Arc::new(ManualScrollSource::new(0.0));
        let host = Host::new(
            source.clone(),
            Arc::new(TokioFrames::new(Duration::ZERO).unwrap()),
            Arc::new(TokioTimers::new().unwrap()),
        );
        let notifier = ScrollNotifier::new(host);

        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));
        let completed = Arc::new(Mutex::new(Vec::new()));

        let (a, m, c) = (
            Arc::clone(&active),
            Arc::clone(&max_active),
            Arc::clone(&completed),
        );
        let _sub = notifier.subscribe(move |sample| {
            let now = a.fetch_add(1, Ordering::SeqCst) + 1;
            m.fetch_max(now, Ordering::SeqCst);
            if sample.position == 10.0 {
                std::thread::sleep(Duration::from_millis(200));
            }
            c.lock().unwrap().push(sample.position);
            a.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        });

        let scroller = Arc::clone(&source);
        tokio::task::spawn_blocking(move || {
            scroller.scroll_to(10.0);
            std::thread::sleep(Duration::from_millis(50));
            scroller.scroll_to(20.0);
        })
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(max_active.load(Ordering::SeqCst), 1);
        assert_eq!(*completed.lock().unwrap(), vec![10.0, 20.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_scroll_position_has_no_side_effects() {
        let h = Harness::new();
        let (samples, record) = recorder();
        let _sub = h.notifier.subscribe(record);
        h.scroll(100.0);

        h.source.scroll_to(60.0);
        let sample = h.notifier.get_scroll_position();
        assert_eq!(sample.position, 60.0);
        // No movement since the last raw event keeps the last direction
        assert_eq!(sample.direction, Direction::Down);
        assert_eq!(h.notifier.get_scroll_position().direction, Direction::Down);

        // The pending frame still measures from the last notified position
        h.frames.run_pending();
        let samples = samples.lock().unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].direction, Direction::Up);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_scroll_position_while_idle() {
        let h = Harness::new();
        h.source.scroll_to(60.0);

        let sample = h.notifier.get_scroll_position();
        assert_eq!(sample.position, 60.0);
        assert_eq!(sample.direction, Direction::Down);
        assert_eq!(h.frames.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_notifier_detaches_listener() {
        let h = Harness::new();
        let _sub = h.notifier.subscribe(|_| Ok(()));
        assert!(h.source.is_attached());

        let Harness {
            source, notifier, ..
        } = h;
        drop(notifier);
        assert!(!source.is_attached());
    }
}
