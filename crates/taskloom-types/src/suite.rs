use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// How a task's workspace is checked for success (spec §3 Task, §6 Suite file).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VerificationDirective {
    /// Run a shell script; pass iff it exits 0.
    Custom { script: String },
    /// Run a shell command and compare its trimmed stdout to `expected`.
    Output { command: String, expected: String },
    /// Run the suite's standard test runner against `./tests`.
    Test,
}

/// Immutable description of one benchmark task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub timeout_seconds: u64,
    pub max_turns: u32,
    pub verification: VerificationDirective,
    #[serde(default)]
    pub setup_files: HashMap<String, String>,
    #[serde(default)]
    pub setup_commands: Vec<String>,
    #[serde(default)]
    pub source_path: Option<String>,
}

/// A named, versioned collection of tasks with shared verification
/// conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suite {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source_repo: Option<String>,
    pub tasks: Vec<Task>,
}

impl Suite {
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }
}
