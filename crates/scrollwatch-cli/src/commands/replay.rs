use std::path::Path;

use anyhow::Result;
use scrollwatch_core::AppConfig;

use crate::scenario::Scenario;

pub async fn run(config: &AppConfig, path: &Path, json: bool) -> Result<()> {
    let scenario = Scenario::load(path)?;

    if scenario.events.is_empty() {
        println!("Scenario {} has no scroll events.", path.display());
        return Ok(());
    }

    super::run_and_print(&scenario, config, json).await?;
    Ok(())
}
