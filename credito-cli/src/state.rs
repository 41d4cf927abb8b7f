use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Directory override, mainly for tests and sandboxed runs
pub const HOME_ENV: &str = "CREDITO_HOME";

pub fn credito_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(HOME_ENV) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".credito"))
}

pub fn ensure_credito_home() -> Result<PathBuf> {
    let dir = credito_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
