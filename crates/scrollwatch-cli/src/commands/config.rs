use std::path::Path;

use anyhow::Result;
use scrollwatch_core::AppConfig;
use tracing::info;

pub fn run(config: &AppConfig, config_path: &Path, path_only: bool, init: bool) -> Result<()> {
    if path_only {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("{} already exists, leaving it untouched", config_path.display());
        } else {
            AppConfig::default().save_to(config_path)?;
            info!("Wrote default configuration to {}", config_path.display());
            println!("Created {}", config_path.display());
        }
        return Ok(());
    }

    if !config_path.exists() {
        println!("# {} not found, showing defaults", config_path.display());
    }
    print!("{}", config.to_toml()?);
    Ok(())
}
