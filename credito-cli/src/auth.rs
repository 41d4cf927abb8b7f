use anyhow::{Context, Result};
use credito_extract::{ApiKey, API_KEY_ENV};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::state::ensure_credito_home;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthState {
    pub gemini_api_key: Option<String>,
}

/// Where the effective key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Env,
    File,
    None,
}

fn auth_path() -> Result<PathBuf> {
    Ok(ensure_credito_home()?.join("auth.json"))
}

pub fn load_auth_from(p: &Path) -> Result<AuthState> {
    if !p.exists() {
        return Ok(AuthState::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_auth_to(auth: &AuthState, p: &Path) -> Result<()> {
    let s = serde_json::to_string_pretty(auth)?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

/// Environment wins over the stored key. Validation is left to the
/// extraction client so that it can report missing vs malformed.
pub fn pick_key(env: Option<String>, stored: &AuthState) -> (Option<String>, KeySource) {
    match env.filter(|k| !k.trim().is_empty()) {
        Some(k) => (Some(k), KeySource::Env),
        None => match &stored.gemini_api_key {
            Some(k) => (Some(k.clone()), KeySource::File),
            None => (None, KeySource::None),
        },
    }
}

pub fn configured_key() -> Result<(Option<String>, KeySource)> {
    let stored = load_auth_from(&auth_path()?)?;
    Ok(pick_key(std::env::var(API_KEY_ENV).ok(), &stored))
}

fn prompt_secret(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

pub fn paste_api_key() -> Result<()> {
    let p = auth_path()?;
    let mut auth = load_auth_from(&p)?;
    let raw = prompt_secret("Paste Gemini API key (starts with AIza)")?;
    let key = ApiKey::resolve(Some(raw.as_str()))?;
    auth.gemini_api_key = Some(key.expose().to_string());
    save_auth_to(&auth, &p)?;
    println!("Saved Gemini API key to {}", p.display());
    Ok(())
}

pub fn status() -> Result<()> {
    let (key, source) = configured_key()?;
    let shape = match ApiKey::resolve(key.as_deref()) {
        Ok(_) => "looks valid".to_string(),
        Err(e) => e.to_string(),
    };
    match source {
        KeySource::Env => println!("API key: from {API_KEY_ENV} ({shape})"),
        KeySource::File => println!("API key: from {} ({shape})", auth_path()?.display()),
        KeySource::None => println!("API key: not configured ({shape})"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides_file() {
        let stored = AuthState {
            gemini_api_key: Some("AIzaStored".into()),
        };
        let (key, src) = pick_key(Some("AIzaEnv".into()), &stored);
        assert_eq!(key.as_deref(), Some("AIzaEnv"));
        assert_eq!(src, KeySource::Env);

        let (key, src) = pick_key(Some("  ".into()), &stored);
        assert_eq!(key.as_deref(), Some("AIzaStored"));
        assert_eq!(src, KeySource::File);

        let (key, src) = pick_key(None, &AuthState::default());
        assert_eq!(key, None);
        assert_eq!(src, KeySource::None);
    }

    #[test]
    fn test_auth_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("auth.json");
        assert!(load_auth_from(&p).unwrap().gemini_api_key.is_none());

        let auth = AuthState {
            gemini_api_key: Some("AIzaSyTest".into()),
        };
        save_auth_to(&auth, &p).unwrap();
        assert_eq!(load_auth_from(&p).unwrap().gemini_api_key.as_deref(), Some("AIzaSyTest"));
    }
}
