//! Drives a scenario through a live notifier on the tokio runtime

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use scrollwatch_core::host::ManualScrollSource;
use scrollwatch_core::viewport::scroll_progress;
use scrollwatch_core::{
    AppConfig, Direction, Host, NotifierEvent, RearmCause, ScrollNotifier, TriggerConfig,
    TriggerId,
};

use crate::scenario::{PageGeometry, Scenario};

/// One line of run output
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Listener {
        at_ms: u64,
        attached: bool,
    },
    Notification {
        at_ms: u64,
        position: f64,
        direction: Direction,
        #[serde(skip_serializing_if = "Option::is_none")]
        progress: Option<f64>,
    },
    Fired {
        at_ms: u64,
        trigger: String,
        position: f64,
        direction: Direction,
    },
    Rearmed {
        at_ms: u64,
        trigger: String,
        cause: &'static str,
    },
    Failed {
        at_ms: u64,
        origin: String,
        message: String,
    },
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::Listener { at_ms, attached } => {
                let state = if *attached { "attached" } else { "detached" };
                write!(f, "[{:>6}ms] listener  {}", at_ms, state)
            }
            Record::Notification {
                at_ms,
                position,
                direction,
                progress,
            } => {
                write!(f, "[{:>6}ms] notify    {:>9.1} {:<4}", at_ms, position, direction)?;
                if let Some(p) = progress {
                    write!(f, " ({:.0}%)", p * 100.0)?;
                }
                Ok(())
            }
            Record::Fired {
                at_ms,
                trigger,
                position,
                direction,
            } => write!(
                f,
                "[{:>6}ms] fired     {} at {:.1} ({})",
                at_ms, trigger, position, direction
            ),
            Record::Rearmed {
                at_ms,
                trigger,
                cause,
            } => write!(f, "[{:>6}ms] re-armed  {} ({})", at_ms, trigger, cause),
            Record::Failed {
                at_ms,
                origin,
                message,
            } => write!(f, "[{:>6}ms] failed    {}: {}", at_ms, origin, message),
        }
    }
}

/// Totals for a finished run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub raw_events: usize,
    pub notifications: usize,
    /// Fire counts in declaration order
    pub fires: Vec<(String, usize)>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} raw events coalesced into {} notifications",
            self.raw_events, self.notifications
        )?;
        for (name, count) in &self.fires {
            writeln!(f, "  {} fired {} time(s)", name, count)?;
        }
        Ok(())
    }
}

struct Translator {
    start: Instant,
    names: HashMap<TriggerId, String>,
    page: Option<PageGeometry>,
}

impl Translator {
    fn elapsed_ms(&self, at: Instant) -> u64 {
        at.saturating_duration_since(self.start).as_millis() as u64
    }

    fn name(&self, id: TriggerId) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    fn translate(&self, event: NotifierEvent) -> Record {
        let now = self.elapsed_ms(Instant::now());
        match event {
            NotifierEvent::ListenerAttached => Record::Listener {
                at_ms: now,
                attached: true,
            },
            NotifierEvent::ListenerDetached => Record::Listener {
                at_ms: now,
                attached: false,
            },
            NotifierEvent::Notified { sample } => Record::Notification {
                at_ms: self.elapsed_ms(sample.timestamp),
                position: sample.position,
                direction: sample.direction,
                progress: self.page.map(|page| {
                    scroll_progress(sample.position, page.content_height, page.viewport_height)
                }),
            },
            NotifierEvent::TriggerFired { id, sample } => Record::Fired {
                at_ms: self.elapsed_ms(sample.timestamp),
                trigger: self.name(id),
                position: sample.position,
                direction: sample.direction,
            },
            NotifierEvent::TriggerRearmed { id, cause } => Record::Rearmed {
                at_ms: now,
                trigger: self.name(id),
                cause: match cause {
                    RearmCause::ScrollStopped => "scroll stopped",
                    RearmCause::Reversal => "reversal",
                },
            },
            NotifierEvent::CallbackFailed { origin, message } => Record::Failed {
                at_ms: now,
                origin: origin.to_string(),
                message,
            },
        }
    }
}

/// Run `scenario` in real time, handing every record to `emit`
pub async fn run<F>(scenario: &Scenario, config: &AppConfig, mut emit: F) -> Result<Report>
where
    F: FnMut(&Record),
{
    let source = Arc::new(ManualScrollSource::new(scenario.initial_offset));
    let host = Host::tokio(source.clone(), config.notifier.frame_interval())?;
    let notifier = ScrollNotifier::new(host);

    let (tx, mut rx) = mpsc::unbounded_channel();
    notifier.set_event_sender(tx);

    let notifications = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notifications);
    let subscription = notifier.subscribe(move |_| {
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(())
    });

    let mut names = HashMap::new();
    let mut fire_counts = Vec::new();
    for spec in &scenario.triggers {
        let options = spec.resolve(&config.trigger);
        let hits = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&hits);
        let id = notifier.add_one_time_trigger(TriggerConfig::new(options).on_fire(move |_| {
            sink.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }))?;
        debug!("Trigger '{}' registered as {}", spec.name, id);
        names.insert(id, spec.name.clone());
        fire_counts.push((id, spec.name.clone(), hits));
    }

    let start = Instant::now();
    let translator = Translator {
        start,
        names,
        page: scenario.page,
    };

    let events = scenario.events.clone();
    let feeder_source = Arc::clone(&source);
    let feeder = tokio::spawn(async move {
        for event in events {
            sleep_until(start + Duration::from_millis(event.at_ms)).await;
            feeder_source.scroll_to(event.offset);
        }
    });

    info!(
        "Replaying {} raw events against {} trigger(s)",
        scenario.events.len(),
        scenario.triggers.len()
    );

    let deadline = start + Duration::from_millis(scenario.duration_ms() + scenario.settle_ms);
    loop {
        tokio::select! {
            Some(event) = rx.recv() => emit(&translator.translate(event)),
            _ = sleep_until(deadline) => break,
        }
    }
    feeder.await?;

    subscription.unsubscribe();
    for (id, _, _) in &fire_counts {
        notifier.remove_one_time_trigger(*id);
    }
    while let Ok(event) = rx.try_recv() {
        emit(&translator.translate(event));
    }

    Ok(Report {
        raw_events: scenario.events.len(),
        notifications: notifications.load(Ordering::Relaxed),
        fires: fire_counts
            .into_iter()
            .map(|(_, name, hits)| (name, hits.load(Ordering::Relaxed)))
            .collect(),
    })
}
