//! TestWorld pattern for declarative integration test setup, grounded on
//! `agtrace-testing::world::TestWorld`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use assert_cmd::Command;
use tempfile::TempDir;

/// Builder for constructing a [`TestWorld`] with fine-grained control —
/// e.g. testing a fresh install where the data directory does not exist yet.
pub struct TestWorldBuilder {
    skip_data_dir_creation: bool,
    env_vars: HashMap<String, String>,
}

impl TestWorldBuilder {
    pub fn new() -> Self {
        Self {
            skip_data_dir_creation: false,
            env_vars: HashMap::new(),
        }
    }

    pub fn without_data_dir(mut self) -> Self {
        self.skip_data_dir_creation = true;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> TestWorld {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base_path = temp_dir.path().to_path_buf();
        let data_dir = base_path.join(".taskloom");
        let workspace_dir = base_path.join("workspace");

        if !self.skip_data_dir_creation {
            std::fs::create_dir_all(&data_dir).expect("failed to create data dir");
        }
        std::fs::create_dir_all(&workspace_dir).expect("failed to create workspace dir");

        TestWorld {
            temp_dir,
            cwd: workspace_dir.clone(),
            data_dir,
            workspace_dir,
            env_vars: self.env_vars,
        }
    }
}

impl Default for TestWorldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A scratch environment for one test: an isolated temp directory, an
/// optional `.taskloom` data dir, and a configurable working directory for
/// the task workspace under test.
pub struct TestWorld {
    temp_dir: TempDir,
    cwd: PathBuf,
    data_dir: PathBuf,
    workspace_dir: PathBuf,
    env_vars: HashMap<String, String>,
}

impl TestWorld {
    pub fn builder() -> TestWorldBuilder {
        TestWorldBuilder::new()
    }

    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn workspace_dir(&self) -> &Path {
        &self.workspace_dir
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write_file(&self, rel_path: &str, content: &str) -> Result<()> {
        let path = self.workspace_dir.join(rel_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Configure a CLI command with this test environment's data-dir and cwd.
    pub fn configure_command<'a>(&self, cmd: &'a mut Command) -> &'a mut Command {
        cmd.arg("--data-dir").arg(&self.data_dir).arg("--format").arg("json");
        cmd.current_dir(&self.cwd);
        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }
        cmd
    }

    /// Run the `taskloom` binary with `args`, configured for this world.
    pub fn run(&self, args: &[&str]) -> Result<CliResult> {
        let mut cmd = Command::cargo_bin("taskloom")
            .map_err(|e| anyhow::anyhow!("failed to find taskloom binary: {e}"))?;
        self.configure_command(&mut cmd);
        cmd.args(args);
        let output = cmd.output()?;
        Ok(CliResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of running the `taskloom` binary once.
#[derive(Debug)]
pub struct CliResult {
    pub status: std::process::ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CliResult {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.stdout)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_creates_workspace_and_data_dirs() {
        let world = TestWorld::new();
        assert!(world.workspace_dir().exists());
        assert!(world.data_dir().exists());
    }

    #[test]
    fn without_data_dir_skips_creation() {
        let world = TestWorld::builder().without_data_dir().build();
        assert!(!world.data_dir().exists());
    }
}
