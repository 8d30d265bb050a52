pub mod config;
pub mod error;
pub mod host;
pub mod notifier;
pub mod viewport;

pub use config::{AppConfig, NotifierConfig, TriggerOptions};
pub use error::{Error, Result};
pub use host::{FrameScheduler, Host, ScrollSource, TimerDriver, TimerId};
pub use notifier::{
    global, CallbackOrigin, Direction, NotifierEvent, RawScrollListener, RearmCause,
    ScrollNotifier, ScrollSample, SubscriberId, Subscription, TriggerConfig, TriggerId,
    TriggerState,
};
