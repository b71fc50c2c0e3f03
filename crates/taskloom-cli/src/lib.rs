mod args;
mod commands;
mod fmclient;

pub use args::{Cli, LogLevel};

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Installs the process-wide `tracing` subscriber. `--log-level` seeds the
/// default filter; `RUST_LOG`/`TASKLOOM_LOG` (the latter bound to
/// `--log-level`'s `env` attribute) can override it per the usual
/// `EnvFilter` precedence.
pub fn init_logging(log_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.as_filter_str()));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

pub async fn run(cli: Cli) -> Result<i32> {
    let data_dir = expand_tilde(&cli.data_dir);
    commands::dispatch(cli.command, &data_dir, cli.format).await
}

fn expand_tilde(path: &str) -> std::path::PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return std::path::PathBuf::from(home).join(stripped);
    }
    std::path::PathBuf::from(path)
}
