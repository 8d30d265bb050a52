use std::time::Duration;

use anyhow::{bail, Result};
use scrollwatch_core::{AppConfig, Direction};

use crate::gesture::{EasingType, Gesture};
use crate::scenario::{Scenario, TriggerSpec};

pub struct SimulateArgs {
    pub from: f64,
    pub to: f64,
    pub duration_ms: u64,
    pub easing: EasingType,
    pub event_interval_ms: u64,
    pub json: bool,
}

/// Build a scenario with one trigger per direction from an eased gesture
pub fn build_scenario(config: &AppConfig, args: &SimulateArgs) -> Result<Scenario> {
    if !args.from.is_finite() || !args.to.is_finite() {
        bail!("--from and --to must be finite numbers");
    }
    if args.event_interval_ms == 0 {
        bail!("--event-interval-ms must be at least 1");
    }

    let gesture = Gesture {
        from: args.from,
        to: args.to,
        duration: Duration::from_millis(args.duration_ms),
        easing: args.easing,
    };

    let triggers = [Direction::Down, Direction::Up]
        .into_iter()
        .map(|direction| TriggerSpec {
            name: format!("on-{}", direction),
            direction: Some(direction),
            ..Default::default()
        })
        .collect();

    Ok(Scenario {
        initial_offset: args.from,
        // Long enough for a stop-timer re-arm to show up
        settle_ms: config.trigger.reset_delay_ms + 100,
        page: None,
        triggers,
        events: gesture.sample(Duration::from_millis(args.event_interval_ms)),
    })
}

pub async fn run(config: &AppConfig, args: SimulateArgs) -> Result<()> {
    let scenario = build_scenario(config, &args)?;
    super::run_and_print(&scenario, config, args.json).await?;
    Ok(())
}
