//! Micro-Task Orchestrator (spec §4.C) — the heart of the system.
//!
//! A turn-by-turn control loop: build a prompt, call the FM, execute the
//! tool it chose, summarize, detect stuck/repeat patterns, invoke the
//! verifier, retry on failed verification, and terminate. Tool-level and
//! FM-call-level failures are never retried in this loop: they become step
//! summaries the next prompt includes, per spec §9's "errors are fed back
//! as context, not as exceptions."

mod error;
mod signature;
mod summary;

pub use error::{Error, Result};
pub use signature::action_signature;
pub use summary::summarize_step;

use std::path::Path;
use std::time::{Duration, Instant};

use taskloom_core::execute_tool;
use taskloom_engine::verifier::verify;
use taskloom_engine::{call_fm, FmClient, PromptInput};

/// Why the orchestrator entered its finalization path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizationReason {
    TaskComplete,
    RepeatSameAction,
    RepeatFailures,
}

/// Why the orchestrator stopped, independent of success/failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationCause {
    Timeout,
    MaxTurnsReached,
    TaskComplete,
    RepeatSameAction,
    RepeatFailures,
    VerifyRetriesExhausted,
    SafetyValve,
}

/// Outcome of one full task run.
#[derive(Debug, Clone)]
pub struct OrchestratorOutcome {
    pub success: bool,
    pub turns: u32,
    pub tokens: u64,
    pub duration_ms: u64,
    pub output: Vec<String>,
    pub error: Option<String>,
    pub cause: TerminationCause,
    pub verify_retry_count: u32,
    pub parse_error_count: u32,
}

/// Everything the orchestrator needs for one task run.
pub struct OrchestratorConfig<'a> {
    pub task_description: &'a str,
    pub workspace: &'a Path,
    /// Reference-only example approaches; never invoked as actions.
    pub example_approaches: Option<&'a str>,
    pub timeout: Duration,
    pub max_turns: u32,
    pub suite_mode: bool,
    /// Shell command run by the verifier, if any. Absent means the
    /// orchestrator trusts `hadAnySuccess` alone at finalization.
    pub verify_command: Option<&'a str>,
    pub max_verify_retries: u32,
    /// Whether `verify_progress` is a recognized tool for this run (spec
    /// §9: its availability is a configuration choice).
    pub verify_progress_enabled: bool,
}

/// Advisory, never-forced context handed to the FM alongside the task
/// description (spec §4.C step 3). A trivial no-op hint builder is the
/// default; callers with richer domain knowledge can build their own.
pub trait HintBuilder: Send + Sync {
    fn hint(&self, task_description: &str, tool_history: &[String], suite_mode: bool) -> Option<String>;
}

pub struct NoHints;

impl HintBuilder for NoHints {
    fn hint(&self, _task_description: &str, _tool_history: &[String], _suite_mode: bool) -> Option<String> {
        None
    }
}

/// Per-task state bounded for the lifetime of one [`run`] call.
struct TurnState {
    turn: u32,
    tokens: u64,
    tool_history: Vec<String>,
    step_history: Vec<String>,
    consecutive_failures: u32,
    had_any_success: bool,
    last_action_signature: Option<String>,
    repeat_count: u32,
    last_verification_feedback: Option<String>,
    verify_retry_count: u32,
    parse_error_count: u32,
    output: Vec<String>,
}

impl TurnState {
    fn new() -> Self {
        Self {
            turn: 0,
            tokens: 0,
            tool_history: Vec::new(),
            step_history: Vec::new(),
            consecutive_failures: 0,
            had_any_success: false,
            last_action_signature: None,
            repeat_count: 0,
            last_verification_feedback: None,
            verify_retry_count: 0,
            parse_error_count: 0,
            output: Vec::new(),
        }
    }

    fn previous_field(&self) -> String {
        let n = self.step_history.len();
        let start = n.saturating_sub(3);
        self.step_history[start..].join(" | ")
    }

    fn reset_repeat_gates(&mut self) {
        self.consecutive_failures = 0;
        self.repeat_count = 0;
        self.last_action_signature = None;
    }
}

/// Runs the micro-task orchestrator loop to completion for a single task.
///
/// `client` drives the FM Worker (4.B); tool execution goes through
/// `taskloom-core` (4.A); verification goes through `taskloom-engine`'s
/// verifier (4.D). Every suspension point (FM call, tool execution,
/// verifier run) is an `await` — there is no parallelism within one call.
pub async fn run(client: &dyn FmClient, config: &OrchestratorConfig<'_>) -> OrchestratorOutcome {
    run_with_hints(client, config, &NoHints).await
}

pub async fn run_with_hints(
    client: &dyn FmClient,
    config: &OrchestratorConfig<'_>,
    hints: &dyn HintBuilder,
) -> OrchestratorOutcome {
    let started_at = Instant::now();
    let mut state = TurnState::new();

    loop {
        // 1. Wall-clock timeout check at the top of every turn.
        if started_at.elapsed() >= config.timeout {
            return OrchestratorOutcome {
                success: state.had_any_success,
                turns: state.turn,
                tokens: state.tokens,
                duration_ms: started_at.elapsed().as_millis() as u64,
                output: state.output,
                error: Some("Task timed out".to_string()),
                cause: TerminationCause::Timeout,
                verify_retry_count: state.verify_retry_count,
                parse_error_count: state.parse_error_count,
            };
        }

        // 2. repeat_failures guard.
        if state.had_any_success && state.consecutive_failures >= 3 {
            if let Some(outcome) = finalize_async(
                &mut state,
                started_at,
                FinalizationReason::RepeatFailures,
                config,
            )
            .await
            {
                return outcome;
            }
            continue;
        }

        // Max turns.
        if state.turn >= config.max_turns {
            return OrchestratorOutcome {
                success: state.had_any_success,
                turns: state.turn,
                tokens: state.tokens,
                duration_ms: started_at.elapsed().as_millis() as u64,
                output: state.output,
                error: None,
                cause: TerminationCause::MaxTurnsReached,
                verify_retry_count: state.verify_retry_count,
                parse_error_count: state.parse_error_count,
            };
        }

        state.turn += 1;
        tracing::debug!(turn = state.turn, max_turns = config.max_turns, "orchestrator turn");

        // 3. Build previous + hint.
        let previous = state.previous_field();
        let hint = hints.hint(config.task_description, &state.tool_history, config.suite_mode);

        let prompt_input = PromptInput {
            task_description: Some(config.task_description),
            action: "Decide the next tool call to make progress on the task.",
            context: if config.suite_mode { "suite" } else { "standalone" },
            previous: &previous,
            example_approaches: config.example_approaches,
            verification_feedback: state.last_verification_feedback.as_deref(),
            domain_hint: hint.as_deref(),
        };

        // 4. Call the FM Worker.
        let parsed = match call_fm(client, &prompt_input).await {
            Ok(p) => p,
            Err(err) => {
                state.parse_error_count += 1;
                state.consecutive_failures += 1;
                state.step_history.push(format!("parse_error: {err}"));
                continue;
            }
        };

        if parsed.tool_name.is_empty() {
            state.parse_error_count += 1;
            state.consecutive_failures += 1;
            state.step_history.push("parse_error: no tool_call block found".to_string());
            continue;
        }

        // 5. Repeat-action detection.
        let signature = action_signature(&parsed.tool_name, &parsed.tool_args);
        if state.last_action_signature.as_deref() == Some(signature.as_str()) {
            state.repeat_count += 1;
        } else {
            state.repeat_count = 1;
            state.last_action_signature = Some(signature);
        }

        if state.repeat_count >= 3 {
            if let Some(outcome) = finalize_async(
                &mut state,
                started_at,
                FinalizationReason::RepeatSameAction,
                config,
            )
            .await
            {
                return outcome;
            }
            continue;
        }

        // 6. Safety valve.
        if state.had_any_success && state.turn > 10 {
            return OrchestratorOutcome {
                success: true,
                turns: state.turn,
                tokens: state.tokens,
                duration_ms: started_at.elapsed().as_millis() as u64,
                output: state.output,
                error: None,
                cause: TerminationCause::SafetyValve,
                verify_retry_count: state.verify_retry_count,
                parse_error_count: state.parse_error_count,
            };
        }

        // 7. task_complete.
        if parsed.tool_name == "task_complete" {
            if let Some(outcome) = finalize_async(
                &mut state,
                started_at,
                FinalizationReason::TaskComplete,
                config,
            )
            .await
            {
                return outcome;
            }
            continue;
        }

        if parsed.tool_name == "verify_progress" && !config.verify_progress_enabled {
            state.consecutive_failures += 1;
            state.step_history.push("verify_progress: not available in this configuration".to_string());
            continue;
        }

        // 8. Execute the tool.
        let tool_outcome = execute_tool(config.workspace, &parsed.tool_name, &parsed.tool_args).await;
        state.tool_history.push(parsed.tool_name.clone());
        let step_summary = summarize_step(&parsed.tool_name, &parsed.tool_args, &tool_outcome);
        state.step_history.push(step_summary.clone());
        state.output.push(step_summary);

        // 9. verify_progress signal handling.
        if parsed.tool_name == "verify_progress" {
            if let Some(command) = config.verify_command {
                let verify_outcome = verify(command, config.workspace).await;
                state.last_verification_feedback = Some(if verify_outcome.passed {
                    "All tests passing! You can call task_complete.".to_string()
                } else {
                    "Tests failing. Review the output above and fix the issues.".to_string()
                });
            }
        }

        // 10. Success/failure bookkeeping.
        if tool_outcome.success {
            state.had_any_success = true;
            state.consecutive_failures = 0;
        } else {
            state.consecutive_failures += 1;
        }
    }
}

/// Runs the finalization path for `reason`. Returns `Some(outcome)` when the
/// orchestrator should stop; `None` means the verifier rejected the
/// finalization and pushed feedback for another main-loop pass.
async fn finalize_async(
    state: &mut TurnState,
    started_at: Instant,
    reason: FinalizationReason,
    config: &OrchestratorConfig<'_>,
) -> Option<OrchestratorOutcome> {
    let cause = match reason {
        FinalizationReason::TaskComplete => TerminationCause::TaskComplete,
        FinalizationReason::RepeatSameAction => TerminationCause::RepeatSameAction,
        FinalizationReason::RepeatFailures => TerminationCause::RepeatFailures,
    };
    tracing::info!(?reason, turn = state.turn, "entering finalization path");

    let Some(command) = config.verify_command else {
        return Some(OrchestratorOutcome {
            success: state.had_any_success,
            turns: state.turn,
            tokens: state.tokens,
            duration_ms: started_at.elapsed().as_millis() as u64,
            output: std::mem::take(&mut state.output),
            error: None,
            cause,
            verify_retry_count: state.verify_retry_count,
            parse_error_count: state.parse_error_count,
        });
    };

    let verify_outcome = verify(command, config.workspace).await;
    if verify_outcome.passed {
        return Some(OrchestratorOutcome {
            success: true,
            turns: state.turn,
            tokens: state.tokens,
            duration_ms: started_at.elapsed().as_millis() as u64,
            output: std::mem::take(&mut state.output),
            error: None,
            cause,
            verify_retry_count: state.verify_retry_count,
            parse_error_count: state.parse_error_count,
        });
    }

    state.verify_retry_count += 1;
    if state.verify_retry_count >= config.max_verify_retries {
        return Some(OrchestratorOutcome {
            success: false,
            turns: state.turn,
            tokens: state.tokens,
            duration_ms: started_at.elapsed().as_millis() as u64,
            output: std::mem::take(&mut state.output),
            error: Some(format!(
                "Verification failed after {} attempts",
                state.verify_retry_count
            )),
            cause: TerminationCause::VerifyRetriesExhausted,
            verify_retry_count: state.verify_retry_count,
            parse_error_count: state.parse_error_count,
        });
    }

    // Give the FM another chance: push feedback, reset the repeat-detection
    // gates, and resume the main loop (spec §4.C finalization path).
    let feedback = verify_outcome
        .error_core
        .clone()
        .unwrap_or_else(|| "Verification failed.".to_string());
    state.last_verification_feedback = Some(feedback.clone());
    state.step_history.push(format!("verification failed: {feedback}"));
    state.reset_repeat_gates();
    None
}
