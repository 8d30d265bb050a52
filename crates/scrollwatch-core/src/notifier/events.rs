use std::fmt;

use super::sample::ScrollSample;
use super::{SubscriberId, TriggerId};

/// Which registration a failing callback belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackOrigin {
    Subscriber(SubscriberId),
    Trigger(TriggerId),
}

impl fmt::Display for CallbackOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackOrigin::Subscriber(id) => write!(f, "{}", id),
            CallbackOrigin::Trigger(id) => write!(f, "{}", id),
        }
    }
}

/// Why a fired trigger was armed again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RearmCause {
    /// No scrolling for the configured reset delay
    ScrollStopped,
    /// Scrolled against the trigger's direction
    Reversal,
}

/// Events emitted by the notifier to an optional observer channel
#[derive(Debug, Clone)]
pub enum NotifierEvent {
    /// The raw scroll listener was attached to the source
    ListenerAttached,
    /// The raw scroll listener was detached because no registrations remain
    ListenerDetached,
    /// A coalesced notification is being delivered
    Notified { sample: ScrollSample },
    /// A trigger matched a notification; its callback runs right after
    TriggerFired { id: TriggerId, sample: ScrollSample },
    /// A fired trigger became eligible again
    TriggerRearmed { id: TriggerId, cause: RearmCause },
    /// A subscriber or trigger callback returned an error or panicked
    CallbackFailed {
        origin: CallbackOrigin,
        message: String,
    },
}
