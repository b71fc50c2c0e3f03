//! Benchmark Runner (spec §4.H): drives the orchestrator over every
//! selected task in a suite, checkpointing results after each one.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use taskloom_engine::FmClient;
use taskloom_orchestrator::{self as orchestrator, OrchestratorConfig, OrchestratorOutcome, TerminationCause};
use taskloom_runtime::emit_hud;
use taskloom_types::{
    BenchResults, BenchResultsMeta, HudMessage, OutputStream, RunSummary, Suite, Task,
    TaskCompleteSummary, TaskOutcome, TaskPhase, TaskRunResult,
};

use crate::directive::{directive_command, run_directive_verification};
use crate::workspace::{materialize_workspace, run_setup_commands};
use crate::Result;

/// Everything the Benchmark Runner needs for one suite run.
pub struct RunnerConfig<'a> {
    pub suite: &'a Suite,
    /// Task-id allow-list; empty means every task in the suite.
    pub task_ids: &'a [String],
    pub output_dir: PathBuf,
    pub model: String,
    pub run_id: String,
    pub default_timeout: Duration,
    pub default_max_turns: u32,
    pub hud_enabled: bool,
}

fn select_tasks<'a>(suite: &'a Suite, task_ids: &[String]) -> Vec<&'a Task> {
    if task_ids.is_empty() {
        suite.tasks.iter().collect()
    } else {
        suite.tasks.iter().filter(|t| task_ids.contains(&t.id)).collect()
    }
}

/// Runs every selected task in `config.suite` to completion, checkpointing
/// `results.json` after each one (spec §4.H step 8).
pub async fn run_suite(client: &dyn FmClient, config: &RunnerConfig<'_>) -> Result<BenchResults> {
    let started_at = now_rfc3339();
    let selected = select_tasks(config.suite, config.task_ids);
    let total = selected.len();

    if config.hud_enabled {
        emit_hud(HudMessage::RunStart {
            suite_name: config.suite.name.clone(),
            selected_task_ids: selected.iter().map(|t| t.id.clone()).collect(),
        });
    }

    let mut results = BenchResults {
        meta: BenchResultsMeta {
            run_id: config.run_id.clone(),
            model: config.model.clone(),
            started_at,
            completed_at: None,
            project_id: None,
        },
        tasks: Vec::new(),
        summary: RunSummary::default(),
    };

    for (index, task) in selected.iter().enumerate() {
        tracing::info!(task_id = %task.id, index, total, "starting task");
        if config.hud_enabled {
            emit_hud(HudMessage::TaskStart {
                index,
                total,
                task_id: task.id.clone(),
            });
        }

        let result = run_one_task(client, config, task).await;
        results.tasks.push(result);
        results.recompute_summary();
        checkpoint(&config.output_dir, &results).await?;
    }

    results.meta.completed_at = Some(now_rfc3339());
    results.recompute_summary();
    checkpoint(&config.output_dir, &results).await?;

    if config.hud_enabled {
        emit_hud(HudMessage::RunComplete {
            summary: results.summary.clone(),
        });
    }

    Ok(results)
}

async fn run_one_task(client: &dyn FmClient, config: &RunnerConfig<'_>, task: &Task) -> TaskRunResult {
    let start = Instant::now();
    let task_dir = config.output_dir.join(&task.id);

    emit_progress(config, task, TaskPhase::Setup, None, start.elapsed());

    let workspace = match materialize_workspace(&config.output_dir, config.suite, task).await {
        Ok(ws) => ws,
        Err(err) => {
            return build_result(task, &start, TaskOutcome::Error, 0, 0, None, Some(format!("Setup failed: {err}")));
        }
    };

    if let Err(err) = run_setup_commands(&workspace, &task.setup_commands).await {
        return build_result(task, &start, TaskOutcome::Error, 0, 0, None, Some(err.to_string()));
    }

    let verify_command = directive_command(&task.verification, &workspace);
    let timeout = if task.timeout_seconds > 0 {
        Duration::from_secs(task.timeout_seconds)
    } else {
        config.default_timeout
    };
    let max_turns = if task.max_turns > 0 { task.max_turns } else { config.default_max_turns };

    let orchestrator_config = OrchestratorConfig {
        task_description: &task.description,
        workspace: &workspace,
        example_approaches: None,
        timeout,
        max_turns,
        suite_mode: true,
        verify_command: verify_command.as_deref(),
        max_verify_retries: 2,
        verify_progress_enabled: true,
    };

    emit_progress(config, task, TaskPhase::Agent, None, start.elapsed());
    let outcome = orchestrator::run(client, &orchestrator_config).await;
    write_output_file(&task_dir, &outcome.output).await.ok();

    for line in &outcome.output {
        emit_output(config, task, line.clone(), OutputStream::Agent);
    }

    // Silent-failure detection (spec §4.H step 4): ran zero turns but still
    // reported failure means the session never really started.
    if !outcome.success && outcome.turns == 0 {
        return build_result(
            task,
            &start,
            TaskOutcome::Error,
            0,
            outcome.tokens,
            None,
            Some("Agent session started but did not process any turns".to_string()),
        );
    }

    emit_progress(config, task, TaskPhase::Verification, Some(outcome.turns), start.elapsed());

    // Independent post-run verification (spec §4.H step 5): the
    // orchestrator's own retry loop only gates `task_complete` on the bare
    // command; the runner re-applies the full directive dispatch (output
    // directives get a Rust-side trimmed comparison) before reporting the
    // final outcome.
    let verification = match run_directive_verification(&task.verification, &workspace).await {
        Some(verify_outcome) => {
            emit_output(config, task, verify_outcome.raw_output.clone(), OutputStream::Verification);
            Some((verify_outcome.passed, verify_outcome.raw_output))
        }
        None => None,
    };

    let task_outcome = classify(&outcome, verification.as_ref().map(|(passed, _)| *passed));
    let result = build_result(
        task,
        &start,
        task_outcome,
        outcome.turns,
        outcome.tokens,
        verification.map(|(_, output)| output),
        outcome.error.clone(),
    );

    if config.hud_enabled {
        emit_hud(HudMessage::TaskComplete {
            task_id: task.id.clone(),
            summary: TaskCompleteSummary {
                outcome: outcome_label(result.outcome).to_string(),
                duration_ms: result.duration_ms,
                turns: result.turns,
                tokens: result.tokens,
                verification_output: result.verification_output.clone(),
            },
        });
    }

    result
}

/// Classify a task outcome (spec §4.H step 6). Timeout and other
/// orchestrator-level failures short-circuit before verification is even
/// consulted; only an orchestrator *success* defers to the verifier.
fn classify(outcome: &OrchestratorOutcome, verification_passed: Option<bool>) -> TaskOutcome {
    if !outcome.success {
        let is_timeout = outcome.cause == TerminationCause::Timeout
            || outcome.error.as_deref().is_some_and(|e| {
                let lower = e.to_lowercase();
                lower.contains("timeout") || lower.contains("timed out")
            });
        return if is_timeout { TaskOutcome::Timeout } else { TaskOutcome::Error };
    }

    match verification_passed {
        Some(false) => TaskOutcome::Failure,
        Some(true) | None => TaskOutcome::Success,
    }
}

fn outcome_label(outcome: TaskOutcome) -> &'static str {
    match outcome {
        TaskOutcome::Success => "success",
        TaskOutcome::Failure => "failure",
        TaskOutcome::Timeout => "timeout",
        TaskOutcome::Error => "error",
    }
}

#[allow(clippy::too_many_arguments)]
fn build_result(
    task: &Task,
    start: &Instant,
    outcome: TaskOutcome,
    turns: u32,
    tokens: u64,
    verification_output: Option<String>,
    error_message: Option<String>,
) -> TaskRunResult {
    TaskRunResult {
        task_id: task.id.clone(),
        outcome,
        duration_ms: start.elapsed().as_millis() as u64,
        turns,
        tokens,
        verification_output,
        error_message,
    }
}

fn emit_progress(config: &RunnerConfig<'_>, task: &Task, phase: TaskPhase, turn: Option<u32>, elapsed: Duration) {
    if config.hud_enabled {
        emit_hud(HudMessage::TaskProgress {
            task_id: task.id.clone(),
            phase,
            turn,
            elapsed_ms: elapsed.as_millis() as u64,
        });
    }
}

fn emit_output(config: &RunnerConfig<'_>, task: &Task, text: String, stream: OutputStream) {
    if config.hud_enabled {
        emit_hud(HudMessage::TaskOutput {
            task_id: task.id.clone(),
            text,
            stream,
        });
    }
}

async fn write_output_file(task_dir: &std::path::Path, lines: &[String]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(task_dir).await?;
    tokio::fs::write(task_dir.join("output.txt"), lines.join("\n")).await
}

async fn checkpoint(output_dir: &std::path::Path, results: &BenchResults) -> Result<()> {
    tokio::fs::create_dir_all(output_dir).await?;
    let json = serde_json::to_string_pretty(results)?;
    tokio::fs::write(output_dir.join("results.json"), json).await?;
    Ok(())
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use taskloom_types::VerificationDirective;

    struct CompleteImmediately;

    #[async_trait]
    impl FmClient for CompleteImmediately {
        async fn generate(&self, _prompt: &str) -> std::result::Result<String, String> {
            Ok(r#"<tool_call>{"tool": "task_complete", "args": {}}</tool_call>"#.to_string())
        }
    }

    fn sample_suite() -> Suite {
        Suite {
            name: "smoke".to_string(),
            version: "1.0.0".to_string(),
            description: None,
            source_repo: None,
            tasks: vec![Task {
                id: "t1".to_string(),
                name: "Write hello".to_string(),
                description: "Create hello.txt containing hi".to_string(),
                difficulty: None,
                category: None,
                timeout_seconds: 30,
                max_turns: 10,
                verification: VerificationDirective::Output {
                    command: "cat hello.txt".to_string(),
                    expected: "hi".to_string(),
                },
                setup_files: [("hello.txt".to_string(), "hi".to_string())].into_iter().collect(),
                setup_commands: vec![],
                source_path: None,
            }],
        }
    }

    #[tokio::test]
    async fn suite_with_pre_satisfied_task_reports_success_and_checkpoints() {
        let output = tempfile::TempDir::new().unwrap();
        let suite = sample_suite();
        let config = RunnerConfig {
            suite: &suite,
            task_ids: &[],
            output_dir: output.path().to_path_buf(),
            model: "claude-code".to_string(),
            run_id: "run-1".to_string(),
            default_timeout: Duration::from_secs(60),
            default_max_turns: 10,
            hud_enabled: false,
        };

        let results = run_suite(&CompleteImmediately, &config).await.unwrap();
        assert_eq!(results.tasks.len(), 1);
        assert_eq!(results.tasks[0].outcome, TaskOutcome::Success);
        assert_eq!(results.summary.passed, 1);
        assert!(output.path().join("results.json").exists());
    }

    #[tokio::test]
    async fn task_allow_list_filters_selection() {
        let output = tempfile::TempDir::new().unwrap();
        let suite = sample_suite();
        let config = RunnerConfig {
            suite: &suite,
            task_ids: &["nonexistent".to_string()],
            output_dir: output.path().to_path_buf(),
            model: "claude-code".to_string(),
            run_id: "run-1".to_string(),
            default_timeout: Duration::from_secs(60),
            default_max_turns: 10,
            hud_enabled: false,
        };
        let results = run_suite(&CompleteImmediately, &config).await.unwrap();
        assert!(results.tasks.is_empty());
    }
}
