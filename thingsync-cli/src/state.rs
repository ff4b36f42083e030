use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$THINGSYNC_HOME`, or `~/.thingsync` when unset.
pub fn thingsync_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("THINGSYNC_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".thingsync"))
}

pub fn ensure_thingsync_home() -> Result<PathBuf> {
    let dir = thingsync_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_thingsync_home()?.join("config.toml"))
}

pub fn pending_path() -> Result<PathBuf> {
    Ok(ensure_thingsync_home()?.join("pending.json"))
}
