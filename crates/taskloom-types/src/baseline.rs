use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-task pass/fail classification stored in a baseline (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pass,
    Fail,
    Timeout,
    Error,
    Skip,
}

impl TaskStatus {
    pub fn is_pass(&self) -> bool {
        matches!(self, TaskStatus::Pass)
    }
}

/// A durable snapshot of a prior run's per-task outcomes and aggregate pass
/// rate, used as a comparison target (spec §3, §4.I).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineRecord {
    pub id: String,
    pub model: String,
    pub suite_name: String,
    pub suite_version: String,
    pub timestamp: String,
    pub pass_rate: f64,
    pub passed: u32,
    pub total: u32,
    pub task_results: BTreeMap<String, TaskStatus>,
    #[serde(default)]
    pub git_commit: Option<String>,
    #[serde(default)]
    pub git_branch: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl BaselineRecord {
    /// Build a record from task results, enforcing `passed <= total` and
    /// `pass_rate = passed/total` (spec §3 invariant).
    pub fn new(
        id: String,
        model: String,
        suite_name: String,
        suite_version: String,
        timestamp: String,
        task_results: BTreeMap<String, TaskStatus>,
    ) -> Self {
        let total = task_results.len() as u32;
        let passed = task_results.values().filter(|s| s.is_pass()).count() as u32;
        let pass_rate = if total > 0 {
            passed as f64 / total as f64
        } else {
            0.0
        };
        Self {
            id,
            model,
            suite_name,
            suite_version,
            timestamp,
            pass_rate,
            passed,
            total,
            task_results,
            git_commit: None,
            git_branch: None,
            notes: None,
        }
    }
}

/// Per-task delta between a baseline and the current run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDelta {
    pub task_id: String,
    /// Human-readable baseline status, or `"N/A"` if the task is new.
    pub baseline_status: String,
    pub current_status: TaskStatus,
    pub changed: bool,
    pub improved: bool,
    pub regressed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegressionSeverity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionAlert {
    pub severity: RegressionSeverity,
    pub affected_tasks: Vec<String>,
}

/// Categorical summary of a baseline comparison (spec §3/§8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Improved,
    Regressed,
    Unchanged,
    Mixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineComparison {
    pub deltas: Vec<TaskDelta>,
    pub pass_rate_delta: f64,
    pub pass_rate_delta_percent: f64,
    pub verdict: Verdict,
    #[serde(default)]
    pub regression_alert: Option<RegressionAlert>,
}

impl BaselineComparison {
    pub fn improved_tasks(&self) -> Vec<&str> {
        self.deltas
            .iter()
            .filter(|d| d.improved)
            .map(|d| d.task_id.as_str())
            .collect()
    }

    pub fn regressed_tasks(&self) -> Vec<&str> {
        self.deltas
            .iter()
            .filter(|d| d.regressed)
            .map(|d| d.task_id.as_str())
            .collect()
    }
}
