use anyhow::{Context, Result};
use credito_extract::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use credito_extract::{GeminiConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::render::{CurrencyFormat, OutputFormat};
use crate::state::ensure_credito_home;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub extract: ExtractSection,
    pub output: OutputSection,
    pub log: LogSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractSection {
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// First backoff; doubled on each retry
    pub base_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub currency_symbol: String,
    pub decimal_separator: char,
    pub thousands_separator: char,
    pub default_format: OutputFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    pub level: String,
}

impl Default for ExtractSection {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.1,
            timeout_secs: 120,
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            currency_symbol: "R$".to_string(),
            decimal_separator: ',',
            thousands_separator: '.',
            default_format: OutputFormat::Table,
        }
    }
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl ExtractSection {
    pub fn gemini(&self) -> GeminiConfig {
        GeminiConfig {
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            temperature: self.temperature,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
    }
}

impl OutputSection {
    pub fn currency(&self) -> CurrencyFormat {
        CurrencyFormat {
            symbol: self.currency_symbol.clone(),
            decimal_separator: self.decimal_separator,
            thousands_separator: self.thousands_separator,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_credito_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config_to(cfg: &Config, p: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}
