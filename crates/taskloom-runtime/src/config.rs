use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{Error, Result};

/// Resolve the workspace data directory based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. `TASKLOOM_PATH` environment variable (with tilde expansion)
/// 3. XDG data directory
/// 4. `~/.taskloom` fallback
pub fn resolve_workspace_path(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var("TASKLOOM_PATH") {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("taskloom"));
    }

    if let Some(home) = std::env::var_os("HOME") {
        return Ok(PathBuf::from(home).join(".taskloom"));
    }

    Err(Error::Config(
        "could not determine workspace path: no HOME or XDG data directory found".to_string(),
    ))
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

/// Orchestrator-level defaults, overridable per task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorDefaults {
    #[serde(default = "default_max_verify_retries")]
    pub max_verify_retries: u32,
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_verify_retries() -> u32 {
    2
}
fn default_max_turns() -> u32 {
    300
}
fn default_timeout_secs() -> u64 {
    3600
}

impl Default for OrchestratorDefaults {
    fn default() -> Self {
        Self {
            max_verify_retries: default_max_verify_retries(),
            max_turns: default_max_turns(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Benchmark-runner-level defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BenchDefaults {
    #[serde(default = "default_model")]
    pub model: String,
    /// Accepted but out-of-scope: cross-task concurrency (spec §5).
    #[serde(default)]
    pub parallel: u32,
}

fn default_model() -> String {
    "claude-code".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub orchestrator: OrchestratorDefaults,
    #[serde(default)]
    pub bench: BenchDefaults,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(resolve_workspace_path(None)?.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.orchestrator.max_verify_retries, 2);
        assert_eq!(cfg.orchestrator.max_turns, 300);
        assert_eq!(cfg.bench.model, "claude-code");
    }

    #[test]
    fn explicit_path_wins_over_env_and_default() {
        let path = resolve_workspace_path(Some("/tmp/explicit-taskloom")).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/explicit-taskloom"));
    }

    #[test]
    fn load_from_missing_path_returns_default() {
        let cfg = Config::load_from(std::path::Path::new("/nonexistent/taskloom.toml")).unwrap();
        assert_eq!(cfg.orchestrator.max_turns, 300);
    }

    #[test]
    fn round_trips_through_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.orchestrator.max_verify_retries = 5;
        cfg.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.orchestrator.max_verify_retries, 5);
    }
}
