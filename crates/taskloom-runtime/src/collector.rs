//! Trajectory Collector (spec §4.E): owns the single active trajectory,
//! enforces lifecycle invariants, and produces well-formed [`Step`] records.

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use taskloom_types::{
    ActiveTrajectoryState, AgentDescriptor, FinalMetrics, Metrics, Observation, ObservationResult,
    Source, Step, SubagentRef, ToolCall, Trajectory,
};

use crate::{Error, Result};

/// The Collector's three-state lifecycle (spec §4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    Idle,
    Active,
    Finalizing,
}

/// Everything needed to record one agent step.
#[derive(Debug, Clone, Default)]
pub struct AgentStepInput {
    pub message: Value,
    pub model_name: Option<String>,
    pub reasoning_content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub metrics: Option<Metrics>,
    pub extra: Option<Value>,
}

pub struct TrajectoryCollector {
    state: CollectorState,
    active: Option<ActiveTrajectoryState>,
}

impl Default for TrajectoryCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl TrajectoryCollector {
    pub fn new() -> Self {
        Self {
            state: CollectorState::Idle,
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == CollectorState::Active
    }

    pub fn get_current_state(&self) -> CollectorState {
        self.state
    }

    /// Transition idle -> active. Generates a session id if absent.
    pub fn start(
        &mut self,
        session_id: Option<String>,
        agent: AgentDescriptor,
        parent_session_id: Option<String>,
    ) -> Result<String> {
        if self.state != CollectorState::Idle {
            return Err(Error::AlreadyStarted);
        }
        let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        self.active = Some(ActiveTrajectoryState::new(
            session_id.clone(),
            parent_session_id,
            agent,
        ));
        self.state = CollectorState::Active;
        tracing::debug!(session_id, "trajectory collector started");
        Ok(session_id)
    }

    fn active_mut(&mut self) -> Result<&mut ActiveTrajectoryState> {
        if self.state != CollectorState::Active {
            return Err(Error::NotStarted);
        }
        self.active.as_mut().ok_or(Error::NotStarted)
    }

    fn assign_missing_tool_call_ids(active: &mut ActiveTrajectoryState, calls: &mut [ToolCall]) {
        for call in calls.iter_mut() {
            if call.tool_call_id.is_empty() {
                call.tool_call_id = format!("call_{}", Uuid::new_v4());
            }
            active.emitted_tool_call_ids.insert(call.tool_call_id.clone());
        }
    }

    pub fn record_user_step(&mut self, message: Value, extra: Option<Value>) -> Result<u64> {
        let active = self.active_mut()?;
        let step_id = active.next_step_id();
        active.steps.push(Step {
            step_id,
            timestamp: Utc::now().to_rfc3339(),
            source: Source::User,
            message,
            model_name: None,
            reasoning_content: None,
            tool_calls: None,
            observation: None,
            metrics: None,
            extra,
        });
        Ok(step_id)
    }

    pub fn record_agent_step(&mut self, mut input: AgentStepInput) -> Result<u64> {
        let active = self.active_mut()?;
        if let Some(calls) = input.tool_calls.as_mut() {
            Self::assign_missing_tool_call_ids(active, calls);
        }
        if let Some(metrics) = &input.metrics {
            active.running_metrics.accumulate(metrics);
        }
        let step_id = active.next_step_id();
        active.steps.push(Step {
            step_id,
            timestamp: Utc::now().to_rfc3339(),
            source: Source::Agent,
            message: input.message,
            model_name: input.model_name,
            reasoning_content: input.reasoning_content,
            tool_calls: input.tool_calls,
            observation: None,
            metrics: input.metrics,
            extra: input.extra,
        });
        Ok(step_id)
    }

    pub fn record_system_step(&mut self, message: Value, extra: Option<Value>) -> Result<u64> {
        let active = self.active_mut()?;
        let step_id = active.next_step_id();
        active.steps.push(Step {
            step_id,
            timestamp: Utc::now().to_rfc3339(),
            source: Source::System,
            message,
            model_name: None,
            reasoning_content: None,
            tool_calls: None,
            observation: None,
            metrics: None,
            extra,
        });
        Ok(step_id)
    }

    /// Records an observation step. Fails if any `source_call_id` does not
    /// match a `tool_call_id` emitted earlier in this trajectory (spec §3
    /// invariant 2, §8 invariant 2).
    pub fn record_observation(
        &mut self,
        results: Vec<ObservationResult>,
        extra: Option<Value>,
    ) -> Result<u64> {
        let active = self.active_mut()?;
        for result in &results {
            if let Some(call_id) = &result.source_call_id
                && !active.emitted_tool_call_ids.contains(call_id)
            {
                return Err(Error::InvalidState(format!(
                    "observation references unknown tool_call_id: {}",
                    call_id
                )));
            }
        }
        let step_id = active.next_step_id();
        active.steps.push(Step {
            step_id,
            timestamp: Utc::now().to_rfc3339(),
            source: Source::System,
            message: Value::Null,
            model_name: None,
            reasoning_content: None,
            tool_calls: None,
            observation: Some(Observation { results }),
            metrics: None,
            extra,
        });
        Ok(step_id)
    }

    /// Idempotent: registering the same `session_id` twice leaves exactly
    /// one (the latest) entry (spec §8 invariant 8).
    pub fn register_subagent(
        &mut self,
        session_id: String,
        trajectory_path: Option<String>,
        extra: Option<Value>,
    ) -> Result<()> {
        let active = self.active_mut()?;
        active.subagents.insert(
            session_id.clone(),
            SubagentRef {
                session_id,
                trajectory_path,
                extra,
            },
        );
        Ok(())
    }

    /// Produce an immutable [`Trajectory`] snapshot and transition back to
    /// idle.
    pub fn finish(&mut self, notes: Option<String>) -> Result<Trajectory> {
        if self.state != CollectorState::Active {
            return Err(Error::NotStarted);
        }
        self.state = CollectorState::Finalizing;
        let active = self.active.take().ok_or(Error::NotStarted)?;

        let total_steps = active.steps.len();
        let trajectory = Trajectory {
            schema_version: Trajectory::SCHEMA_VERSION.to_string(),
            session_id: active.session_id,
            agent: active.agent,
            steps: active.steps,
            notes,
            final_metrics: FinalMetrics {
                totals: active.running_metrics,
                total_steps,
            },
            extra: active
                .parent_session_id
                .map(|p| serde_json::json!({ "parent_session_id": p })),
        };

        self.state = CollectorState::Idle;
        tracing::debug!(session_id = %trajectory.session_id, total_steps, "trajectory finished");
        Ok(trajectory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn agent() -> AgentDescriptor {
        AgentDescriptor {
            name: "test-agent".into(),
            model: "small-fm".into(),
        }
    }

    #[test]
    fn start_then_record_then_finish_produces_dense_ids() {
        let mut c = TrajectoryCollector::new();
        c.start(None, agent(), None).unwrap();
        c.record_user_step(json!("hello"), None).unwrap();
        c.record_agent_step(AgentStepInput {
            message: json!("ok"),
            ..Default::default()
        })
        .unwrap();
        let traj = c.finish(None).unwrap();
        assert!(traj.has_dense_step_ids());
        assert_eq!(traj.steps.len(), 2);
        assert_eq!(c.get_current_state(), CollectorState::Idle);
    }

    #[test]
    fn double_start_fails() {
        let mut c = TrajectoryCollector::new();
        c.start(None, agent(), None).unwrap();
        let err = c.start(None, agent(), None).unwrap_err();
        assert!(matches!(err, Error::AlreadyStarted));
    }

    #[test]
    fn record_before_start_fails_not_started() {
        let mut c = TrajectoryCollector::new();
        let err = c.record_user_step(json!("hi"), None).unwrap_err();
        assert!(matches!(err, Error::NotStarted));
    }

    #[test]
    fn record_after_finish_fails_not_started() {
        let mut c = TrajectoryCollector::new();
        c.start(None, agent(), None).unwrap();
        c.finish(None).unwrap();
        let err = c.record_user_step(json!("hi"), None).unwrap_err();
        assert!(matches!(err, Error::NotStarted));
    }

    #[test]
    fn tool_calls_without_ids_get_assigned_fresh_ones() {
        let mut c = TrajectoryCollector::new();
        c.start(None, agent(), None).unwrap();
        let step_id = c
            .record_agent_step(AgentStepInput {
                message: json!("calling a tool"),
                tool_calls: Some(vec![ToolCall {
                    tool_call_id: String::new(),
                    function_name: "write_file".into(),
                    arguments: json!({}),
                }]),
                ..Default::default()
            })
            .unwrap();
        let traj = c.finish(None).unwrap();
        let step = traj.steps.iter().find(|s| s.step_id == step_id).unwrap();
        assert!(!step.tool_calls.as_ref().unwrap()[0].tool_call_id.is_empty());
    }

    #[test]
    fn observation_with_unknown_source_call_id_is_rejected() {
        let mut c = TrajectoryCollector::new();
        c.start(None, agent(), None).unwrap();
        let err = c
            .record_observation(
                vec![ObservationResult {
                    source_call_id: Some("call_does_not_exist".into()),
                    content: json!("output"),
                    subagent_trajectory_refs: vec![],
                }],
                None,
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn observation_referencing_known_call_id_succeeds() {
        let mut c = TrajectoryCollector::new();
        c.start(None, agent(), None).unwrap();
        c.record_agent_step(AgentStepInput {
            message: json!("calling"),
            tool_calls: Some(vec![ToolCall {
                tool_call_id: "call_1".into(),
                function_name: "run_command".into(),
                arguments: json!({}),
            }]),
            ..Default::default()
        })
        .unwrap();
        c.record_observation(
            vec![ObservationResult {
                source_call_id: Some("call_1".into()),
                content: json!("ok"),
                subagent_trajectory_refs: vec![],
            }],
            None,
        )
        .unwrap();
        let traj = c.finish(None).unwrap();
        assert!(traj.has_dense_step_ids());
    }

    #[test]
    fn register_subagent_is_idempotent() {
        let mut c = TrajectoryCollector::new();
        c.start(None, agent(), None).unwrap();
        c.register_subagent("sub1".into(), Some("path/a".into()), None)
            .unwrap();
        c.register_subagent("sub1".into(), Some("path/b".into()), None)
            .unwrap();
        let active = c.active.as_ref().unwrap();
        assert_eq!(active.subagents.len(), 1);
        assert_eq!(
            active.subagents.get("sub1").unwrap().trajectory_path.as_deref(),
            Some("path/b")
        );
    }

    #[test]
    fn final_metrics_sum_per_step_metrics() {
        let mut c = TrajectoryCollector::new();
        c.start(None, agent(), None).unwrap();
        c.record_agent_step(AgentStepInput {
            message: json!("a"),
            metrics: Some(Metrics {
                prompt_tokens: Some(10),
                completion_tokens: Some(5),
                cached_tokens: None,
                cost_usd: Some(0.01),
            }),
            ..Default::default()
        })
        .unwrap();
        c.record_agent_step(AgentStepInput {
            message: json!("b"),
            metrics: Some(Metrics {
                prompt_tokens: Some(3),
                completion_tokens: Some(2),
                cached_tokens: Some(1),
                cost_usd: Some(0.02),
            }),
            ..Default::default()
        })
        .unwrap();
        let traj = c.finish(None).unwrap();
        assert_eq!(traj.final_metrics.totals.prompt_tokens, Some(13));
        assert_eq!(traj.final_metrics.totals.completion_tokens, Some(7));
        assert_eq!(traj.final_metrics.totals.cached_tokens, Some(1));
        assert_eq!(traj.final_metrics.total_steps, 2);
    }
}
