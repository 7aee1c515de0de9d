use std::path::PathBuf;

use anyhow::{Context, Result};

pub fn database_file_path(override_path: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        return Ok(path);
    }
    let base = dirs::data_dir().context("unable to resolve data directory")?;
    Ok(base.join("nextep").join("nextep.db"))
}
