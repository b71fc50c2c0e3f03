use serde::{Deserialize, Serialize};

use crate::step::Step;

/// Phase of a single task run, as reported to live observers (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPhase {
    Setup,
    Agent,
    Verification,
}

/// Which stream a chunk of task output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStream {
    Agent,
    Verification,
}

/// Summary attached to `task_complete` HUD messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCompleteSummary {
    pub outcome: String,
    pub duration_ms: u64,
    pub turns: u32,
    pub tokens: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_output: Option<String>,
}

/// Summary attached to `run_complete` HUD messages.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunSummary {
    pub pass_rate: f64,
    pub passed: u32,
    pub failed: u32,
    pub timeout: u32,
    pub error: u32,
    pub total_duration_ms: u64,
}

/// A slimmed-down step, carrying only the fields the phase-1 HUD contract
/// exposes (tool_calls + observation), per spec §4.F.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectedStep {
    pub step_id: u64,
    pub tool_calls: Option<Vec<crate::step::ToolCall>>,
    pub observation: Option<crate::step::Observation>,
}

impl From<&Step> for ProjectedStep {
    fn from(step: &Step) -> Self {
        Self {
            step_id: step.step_id,
            tool_calls: step.tool_calls.clone(),
            observation: step.observation.clone(),
        }
    }
}

/// Every message a live observer (the "HUD") can receive. All messages are
/// one-way; senders ignore delivery failures (spec §5, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HudMessage {
    RunStart {
        suite_name: String,
        selected_task_ids: Vec<String>,
    },
    TaskStart {
        index: usize,
        total: usize,
        task_id: String,
    },
    TaskProgress {
        task_id: String,
        phase: TaskPhase,
        #[serde(skip_serializing_if = "Option::is_none")]
        turn: Option<u32>,
        elapsed_ms: u64,
    },
    TaskOutput {
        task_id: String,
        text: String,
        stream: OutputStream,
    },
    TaskComplete {
        task_id: String,
        summary: TaskCompleteSummary,
    },
    RunComplete {
        summary: RunSummary,
    },
    AtifStep {
        run_id: String,
        session_id: String,
        step: ProjectedStep,
    },
}
