use std::collections::{HashMap, HashSet};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::step::{Metrics, Step};

/// Identifies the agent whose behavior a trajectory records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub name: String,
    pub model: String,
}

/// Aggregated metrics over a whole trajectory.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FinalMetrics {
    #[serde(flatten)]
    pub totals: Metrics,
    pub total_steps: usize,
}

/// The schema-versioned, immutable record produced by [`finish`](ActiveTrajectoryState).
///
/// Steps are append-only and immutable once written; their order equals
/// their `step_id` order (spec §3 Trajectory invariant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trajectory {
    pub schema_version: String,
    pub session_id: String,
    pub agent: AgentDescriptor,
    pub steps: Vec<Step>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub final_metrics: FinalMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl Trajectory {
    pub const SCHEMA_VERSION: &'static str = "taskloom.trajectory.v1";

    /// Invariant 1 (spec §8): step ids are exactly `[1, 2, ..., len]`.
    pub fn has_dense_step_ids(&self) -> bool {
        self.steps
            .iter()
            .enumerate()
            .all(|(i, s)| s.step_id == (i + 1) as u64)
    }
}

/// The mutable scaffolding held while a trajectory is being produced.
///
/// Owned exclusively by the Trajectory Collector for its lifetime; created
/// by `start`, mutated only by `record*`/`register_subagent`, and consumed
/// by `finish` which turns it into an immutable [`Trajectory`].
pub struct ActiveTrajectoryState {
    pub session_id: String,
    pub parent_session_id: Option<String>,
    pub agent: AgentDescriptor,
    pub steps: Vec<Step>,
    pub step_counter: u64,
    pub emitted_tool_call_ids: HashSet<String>,
    pub subagents: HashMap<String, SubagentRef>,
    pub started_at: Instant,
    pub running_metrics: Metrics,
}

/// A reference to a subagent trajectory registered against a parent session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubagentRef {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trajectory_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl ActiveTrajectoryState {
    pub fn new(session_id: String, parent_session_id: Option<String>, agent: AgentDescriptor) -> Self {
        Self {
            session_id,
            parent_session_id,
            agent,
            steps: Vec::new(),
            step_counter: 0,
            emitted_tool_call_ids: HashSet::new(),
            subagents: HashMap::new(),
            started_at: Instant::now(),
            running_metrics: Metrics::default(),
        }
    }

    pub fn next_step_id(&mut self) -> u64 {
        self.step_counter += 1;
        self.step_counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_step_ids_detects_gaps() {
        let agent = AgentDescriptor {
            name: "a".into(),
            model: "m".into(),
        };
        let mut t = Trajectory {
            schema_version: Trajectory::SCHEMA_VERSION.to_string(),
            session_id: "s1".into(),
            agent,
            steps: vec![],
            notes: None,
            final_metrics: FinalMetrics::default(),
            extra: None,
        };
        assert!(t.has_dense_step_ids());
        t.steps.push(Step {
            step_id: 2,
            timestamp: "2026-07-30T00:00:00Z".into(),
            source: crate::step::Source::System,
            message: Value::Null,
            model_name: None,
            reasoning_content: None,
            tool_calls: None,
            observation: None,
            metrics: None,
            extra: None,
        });
        assert!(!t.has_dense_step_ids());
    }
}
