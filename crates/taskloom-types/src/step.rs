use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who produced a [`Step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    User,
    Agent,
    System,
}

/// A single tool invocation requested by the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool_call_id: String,
    pub function_name: String,
    /// Opaque, provider-specific argument payload.
    pub arguments: Value,
}

/// One result inside an [`Observation`].
///
/// `source_call_id`, when present, must match a `tool_call_id` emitted by an
/// earlier step in the same trajectory (invariant 2, spec §3/§8).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ObservationResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_call_id: Option<String>,
    /// Opaque result payload (condensed summary, raw output, structured JSON…).
    pub content: Value,
    /// Links to subagent trajectories spawned by this tool result, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subagent_trajectory_refs: Vec<String>,
}

/// A bundle of one or more tool results attached to a step.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Observation {
    pub results: Vec<ObservationResult>,
}

/// Per-step token/cost accounting. All fields are independently optional
/// because not every provider reports every figure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Metrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
}

impl Metrics {
    /// Fold another step's metrics into a running total. `None` fields on
    /// either side are treated as zero contributions (they don't poison the
    /// sum, matching the aggregation rule in spec §8 invariant 3).
    pub fn accumulate(&mut self, other: &Metrics) {
        if let Some(v) = other.prompt_tokens {
            self.prompt_tokens = Some(self.prompt_tokens.unwrap_or(0) + v);
        }
        if let Some(v) = other.completion_tokens {
            self.completion_tokens = Some(self.completion_tokens.unwrap_or(0) + v);
        }
        if let Some(v) = other.cached_tokens {
            self.cached_tokens = Some(self.cached_tokens.unwrap_or(0) + v);
        }
        if let Some(v) = other.cost_usd {
            self.cost_usd = Some(self.cost_usd.unwrap_or(0.0) + v);
        }
    }
}

/// A single immutable event in a trajectory.
///
/// `step_id` is monotonically increasing, 1-based, and scoped to the
/// trajectory that owns it (spec §3, invariant 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub step_id: u64,
    /// RFC 3339 timestamp.
    pub timestamp: String,
    pub source: Source,
    /// Opaque free-form payload (user text, agent text, system note, …).
    pub message: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation: Option<Observation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_accumulate_treats_absent_as_zero() {
        let mut total = Metrics::default();
        total.accumulate(&Metrics {
            prompt_tokens: Some(10),
            completion_tokens: None,
            cached_tokens: Some(2),
            cost_usd: None,
        });
        total.accumulate(&Metrics {
            prompt_tokens: Some(5),
            completion_tokens: Some(3),
            cached_tokens: None,
            cost_usd: Some(0.01),
        });
        assert_eq!(total.prompt_tokens, Some(15));
        assert_eq!(total.completion_tokens, Some(3));
        assert_eq!(total.cached_tokens, Some(2));
        assert_eq!(total.cost_usd, Some(0.01));
    }

    #[test]
    fn step_round_trips_through_json() {
        let step = Step {
            step_id: 1,
            timestamp: "2026-07-30T00:00:00Z".to_string(),
            source: Source::Agent,
            message: Value::String("hi".to_string()),
            model_name: Some("small-fm".to_string()),
            reasoning_content: None,
            tool_calls: Some(vec![ToolCall {
                tool_call_id: "call_1".to_string(),
                function_name: "write_file".to_string(),
                arguments: serde_json::json!({"path": "hello.txt", "content": "hi"}),
            }]),
            observation: None,
            metrics: None,
            extra: None,
        };
        let json = serde_json::to_string(&step).unwrap();
        let decoded: Step = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.step_id, 1);
        assert_eq!(decoded.tool_calls.unwrap()[0].function_name, "write_file");
    }
}
