//! Baseline Store + Comparator (spec §4.I).

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use taskloom_types::{
    BaselineComparison, BaselineRecord, BenchResults, RegressionAlert, RegressionSeverity, TaskDelta,
    TaskOutcome, TaskStatus, Verdict,
};

use crate::Result;

/// Storage over an append-only `baselines.jsonl` file, tolerant of
/// malformed lines on read (spec §4.I, §8 invariant 9).
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn save(&self, record: &BaselineRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", serde_json::to_string(record)?)?;
        Ok(())
    }

    /// Reads and decodes every record, skipping lines that fail to parse.
    pub fn load_all(&self) -> Result<Vec<BaselineRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = std::fs::File::open(&self.path)?;
        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(record) => records.push(record),
                Err(err) => tracing::warn!(%err, "skipping malformed baseline line"),
            }
        }
        Ok(records)
    }

    /// The most recent baseline matching `model` (and `suite_name`, if
    /// given), sorted by timestamp descending.
    pub fn get_baseline(&self, model: &str, suite_name: Option<&str>) -> Result<Option<BaselineRecord>> {
        let mut matching = self.filter(model, suite_name)?;
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(matching.into_iter().next())
    }

    /// Ascending history for trend analysis, tail-truncated by `limit`.
    pub fn get_history(
        &self,
        model: Option<&str>,
        suite_name: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<BaselineRecord>> {
        let mut matching: Vec<BaselineRecord> = self
            .load_all()?
            .into_iter()
            .filter(|r| model.is_none_or(|m| r.model == m))
            .filter(|r| suite_name.is_none_or(|s| r.suite_name == s))
            .collect();
        matching.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        if let Some(limit) = limit
            && matching.len() > limit
        {
            let start = matching.len() - limit;
            matching = matching.split_off(start);
        }
        Ok(matching)
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::write(&self.path, "")?;
        }
        Ok(())
    }

    fn filter(&self, model: &str, suite_name: Option<&str>) -> Result<Vec<BaselineRecord>> {
        Ok(self
            .load_all()?
            .into_iter()
            .filter(|r| r.model == model)
            .filter(|r| suite_name.is_none_or(|s| r.suite_name == s))
            .collect())
    }
}

fn to_task_status(outcome: TaskOutcome) -> TaskStatus {
    match outcome {
        TaskOutcome::Success => TaskStatus::Pass,
        TaskOutcome::Failure => TaskStatus::Fail,
        TaskOutcome::Timeout => TaskStatus::Timeout,
        TaskOutcome::Error => TaskStatus::Error,
    }
}

/// Builds a [`BaselineRecord`] from a completed run, ready to [`BaselineStore::save`].
pub fn record_from_results(
    id: String,
    suite_name: String,
    suite_version: String,
    results: &BenchResults,
) -> BaselineRecord {
    let task_results: BTreeMap<String, TaskStatus> = results
        .tasks
        .iter()
        .map(|t| (t.task_id.clone(), to_task_status(t.outcome)))
        .collect();
    BaselineRecord::new(
        id,
        results.meta.model.clone(),
        suite_name,
        suite_version,
        results.meta.started_at.clone(),
        task_results,
    )
}

/// Compares `results` against `baseline` (spec §4.I).
pub fn compare(results: &BenchResults, baseline: &BaselineRecord) -> BaselineComparison {
    let mut deltas = Vec::with_capacity(results.tasks.len());
    for task in &results.tasks {
        let current_status = to_task_status(task.outcome);
        let baseline_status = baseline.task_results.get(&task.task_id).copied();
        let was_pass = baseline_status.is_some_and(|s| s.is_pass());
        let is_pass = current_status.is_pass();
        let changed = baseline_status.is_some_and(|s| s != current_status);
        deltas.push(TaskDelta {
            task_id: task.task_id.clone(),
            baseline_status: baseline_status.map(status_label).unwrap_or("N/A").to_string(),
            current_status,
            changed,
            improved: changed && !was_pass && is_pass,
            regressed: changed && was_pass && !is_pass,
        });
    }

    let current_pass_rate = if results.tasks.is_empty() {
        0.0
    } else {
        deltas.iter().filter(|d| d.current_status.is_pass()).count() as f64 / results.tasks.len() as f64
    };
    let pass_rate_delta = current_pass_rate - baseline.pass_rate;
    let pass_rate_delta_percent = if baseline.pass_rate == 0.0 {
        if pass_rate_delta == 0.0 { 0.0 } else { 100.0 * pass_rate_delta.signum() }
    } else {
        100.0 * pass_rate_delta / baseline.pass_rate
    };

    let improved_count = deltas.iter().filter(|d| d.improved).count();
    let regressed_count = deltas.iter().filter(|d| d.regressed).count();
    let verdict = match (improved_count > 0, regressed_count > 0) {
        (true, false) => Verdict::Improved,
        (false, true) => Verdict::Regressed,
        (true, true) => Verdict::Mixed,
        (false, false) => Verdict::Unchanged,
    };

    let regression_alert = if regressed_count > 0 {
        let severity = if regressed_count >= 3 || pass_rate_delta <= -0.10 {
            RegressionSeverity::Critical
        } else {
            RegressionSeverity::Warning
        };
        Some(RegressionAlert {
            severity,
            affected_tasks: deltas.iter().filter(|d| d.regressed).map(|d| d.task_id.clone()).collect(),
        })
    } else {
        None
    };

    BaselineComparison {
        deltas,
        pass_rate_delta,
        pass_rate_delta_percent,
        verdict,
        regression_alert,
    }
}

fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pass => "pass",
        TaskStatus::Fail => "fail",
        TaskStatus::Timeout => "timeout",
        TaskStatus::Error => "error",
        TaskStatus::Skip => "skip",
    }
}

/// If no baseline exists yet for this model+suite, creates and (optionally)
/// saves one from `results`; otherwise compares against the existing one.
pub fn compare_or_create_baseline(
    store: &BaselineStore,
    results: &BenchResults,
    suite_name: &str,
    suite_version: &str,
    new_id: impl FnOnce() -> String,
    auto_save: bool,
) -> Result<Option<BaselineComparison>> {
    match store.get_baseline(&results.meta.model, Some(suite_name))? {
        Some(baseline) => Ok(Some(compare(results, &baseline))),
        None => {
            if auto_save {
                let record = record_from_results(new_id(), suite_name.to_string(), suite_version.to_string(), results);
                store.save(&record)?;
            }
            Ok(None)
        }
    }
}

/// Saves a new baseline only when the pass-rate improvement over the
/// current baseline clears `min_improvement` (default 0.01 per spec §4.I).
pub fn update_baseline_if_improved(
    store: &BaselineStore,
    results: &BenchResults,
    suite_name: &str,
    suite_version: &str,
    new_id: impl FnOnce() -> String,
    min_improvement: f64,
) -> Result<bool> {
    let current_pass_rate = results.summary.pass_rate;
    let should_save = match store.get_baseline(&results.meta.model, Some(suite_name))? {
        Some(baseline) => current_pass_rate - baseline.pass_rate >= min_improvement,
        None => true,
    };
    if should_save {
        let record = record_from_results(new_id(), suite_name.to_string(), suite_version.to_string(), results);
        store.save(&record)?;
    }
    Ok(should_save)
}
