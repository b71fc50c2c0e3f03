use serde::{Deserialize, Serialize};

use crate::hud::RunSummary;

/// Terminal classification of one task run (spec §3 Task Run Result, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOutcome {
    Success,
    Failure,
    Timeout,
    Error,
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success)
    }
}

/// The result of running a single benchmark task (spec §3, §6 "Benchmark
/// results file").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRunResult {
    pub task_id: String,
    pub outcome: TaskOutcome,
    pub duration_ms: u64,
    pub turns: u32,
    pub tokens: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Provenance and identity for one benchmark run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchResultsMeta {
    pub run_id: String,
    pub model: String,
    pub started_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

/// The full on-disk shape of `results.json` (spec §6): written as an
/// intermediate checkpoint after each task, and finally at run end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchResults {
    pub meta: BenchResultsMeta,
    pub tasks: Vec<TaskRunResult>,
    pub summary: RunSummary,
}

impl BenchResults {
    /// Recomputes `summary` from `tasks`, matching the aggregate the runner
    /// reports via `runComplete` (spec §4.H).
    pub fn recompute_summary(&mut self) {
        let total = self.tasks.len() as u32;
        let passed = self
            .tasks
            .iter()
            .filter(|t| t.outcome.is_success())
            .count() as u32;
        let failed = self
            .tasks
            .iter()
            .filter(|t| t.outcome == TaskOutcome::Failure)
            .count() as u32;
        let timeout = self
            .tasks
            .iter()
            .filter(|t| t.outcome == TaskOutcome::Timeout)
            .count() as u32;
        let error = self
            .tasks
            .iter()
            .filter(|t| t.outcome == TaskOutcome::Error)
            .count() as u32;
        let total_duration_ms = self.tasks.iter().map(|t| t.duration_ms).sum();

        self.summary = RunSummary {
            pass_rate: if total > 0 {
                passed as f64 / total as f64
            } else {
                0.0
            },
            passed,
            failed,
            timeout,
            error,
            total_duration_ms,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recompute_summary_counts_each_outcome_class() {
        let mut results = BenchResults {
            meta: BenchResultsMeta {
                run_id: "r1".into(),
                model: "small-fm".into(),
                started_at: "2026-07-30T00:00:00Z".into(),
                completed_at: None,
                project_id: None,
            },
            tasks: vec![
                TaskRunResult {
                    task_id: "t1".into(),
                    outcome: TaskOutcome::Success,
                    duration_ms: 100,
                    turns: 2,
                    tokens: 50,
                    verification_output: None,
                    error_message: None,
                },
                TaskRunResult {
                    task_id: "t2".into(),
                    outcome: TaskOutcome::Failure,
                    duration_ms: 200,
                    turns: 10,
                    tokens: 80,
                    verification_output: None,
                    error_message: None,
                },
            ],
            summary: RunSummary::default(),
        };
        results.recompute_summary();
        assert_eq!(results.summary.passed, 1);
        assert_eq!(results.summary.failed, 1);
        assert_eq!(results.summary.pass_rate, 0.5);
        assert_eq!(results.summary.total_duration_ms, 300);
    }
}
