//! Runtime settings resolved from CLI flags, environment and an optional config file.

use crate::cli::Cli;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Contents of `config.json`. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("asistente-musical").join("config.json"))
}

/// Load a config file. A missing file at the default location is not an error.
pub fn load_file_config(path: &Path, explicit: bool) -> Result<FileConfig> {
    if !path.exists() {
        if explicit {
            anyhow::bail!("config file not found: {}", path.display());
        }
        return Ok(FileConfig::default());
    }
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg = serde_json::from_str(&data)
        .with_context(|| format!("parse config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(cfg)
}

/// Merge CLI/env values over the file config over built-in defaults.
pub fn merge(args: &Cli, file: FileConfig) -> Result<Settings> {
    let api_key = args
        .api_key
        .clone()
        .or(file.api_key)
        .filter(|k| !k.trim().is_empty())
        .context(
            "API key not set: pass --api-key, set GEMINI_API_KEY or add api_key to the config file",
        )?;

    Ok(Settings {
        api_key,
        model: args
            .model
            .clone()
            .or(file.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        base_url: args
            .base_url
            .clone()
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        timeout: args
            .timeout
            .map(Duration::from)
            .or(file.timeout)
            .unwrap_or(DEFAULT_TIMEOUT),
        user_agent: format!("asistente-musical/{}", env!("CARGO_PKG_VERSION")),
    })
}

pub fn resolve(args: &Cli) -> Result<Settings> {
    let file = match args.config.as_deref() {
        Some(path) => load_file_config(path, true)?,
        None => match default_config_path() {
            Some(path) => load_file_config(&path, false)?,
            None => FileConfig::default(),
        },
    };
    merge(args, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(argv: &[&str]) -> Cli {
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn cli_overrides_file() {
        let args = parse(&[
            "asistente-musical",
            "--api-key",
            "cli",
            "--model",
            "m-cli",
            "--text",
            "ask",
            "hola",
        ]);
        let file = FileConfig {
            api_key: Some("file".into()),
            model: Some("m-file".into()),
            base_url: Some("http://localhost:9".into()),
            timeout: Some(Duration::from_secs(5)),
        };
        let s = merge(&args, file).unwrap();
        assert_eq!(s.api_key, "cli");
        assert_eq!(s.model, "m-cli");
        assert_eq!(s.base_url, "http://localhost:9");
        assert_eq!(s.timeout, Duration::from_secs(5));
    }

    #[test]
    fn defaults_apply_when_unset() {
        let args = parse(&["asistente-musical", "--api-key", "k", "ask", "hola"]);
        let s = merge(&args, FileConfig::default()).unwrap();
        assert_eq!(s.model, DEFAULT_MODEL);
        assert_eq!(s.base_url, DEFAULT_BASE_URL);
        assert_eq!(s.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn missing_key_is_an_error() {
        let mut args = parse(&["asistente-musical", "ask", "hola"]);
        args.api_key = None;
        assert!(merge(&args, FileConfig::default()).is_err());
    }

    #[test]
    fn reads_file_with_humantime_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_key":"abc","timeout":"90s"}"#).unwrap();
        let cfg = load_file_config(&path, true).unwrap();
        assert_eq!(cfg.api_key.as_deref(), Some("abc"));
        assert_eq!(cfg.timeout, Some(Duration::from_secs(90)));
        assert!(cfg.model.is_none());
    }

    #[test]
    fn explicit_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        assert!(load_file_config(&path, true).is_err());
        assert!(load_file_config(&path, false).is_ok());
    }
}
