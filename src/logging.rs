//! Tracing subscriber setup.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "warn,asistente_musical=info",
        2 => "warn,asistente_musical=debug",
        _ => "asistente_musical=trace,info",
    }
}

/// Install the global subscriber. `RUST_LOG` overrides `-v`.
///
/// With a log file everything goes there. Otherwise logs go to stderr, unless
/// `stderr_allowed` is false (the TUI owns the terminal), in which case logging
/// stays off.
pub fn init(verbosity: u8, log_file: Option<&Path>, stderr_allowed: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .try_init()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .context("install tracing subscriber")?;
    } else if stderr_allowed {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .context("install tracing subscriber")?;
    }
    Ok(())
}
