pub mod config;
pub mod replay;
pub mod simulate;

use anyhow::Result;
use scrollwatch_core::AppConfig;

use crate::runner::{self, Record, Report};
use crate::scenario::Scenario;

/// Run a scenario, printing records as they arrive and the report at the end
async fn run_and_print(scenario: &Scenario, config: &AppConfig, json: bool) -> Result<Report> {
    let report = runner::run(scenario, config, |record: &Record| {
        if json {
            match serde_json::to_string(record) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::warn!("Failed to encode record: {}", e),
            }
        } else {
            println!("{}", record);
        }
    })
    .await?;

    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!();
        print!("{}", report);
    }
    Ok(report)
}
