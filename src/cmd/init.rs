use crate::data::AppSettings;
use anyhow::Result;
use log::info;
use std::path::Path;

pub fn run() -> Result<()> {
    let dir = crate::data::persistence::get_data_dir()?;
    run_in_dir(&dir)?;
    println!("Config written to {}", dir.join("config.yaml").display());
    Ok(())
}

/// Writes the default config into `dir`. Exposed for unit testing.
pub(crate) fn run_in_dir(dir: &Path) -> Result<()> {
    AppSettings::default().save_to(dir)?;
    info!("initialized {}", dir.display());
    Ok(())
}
