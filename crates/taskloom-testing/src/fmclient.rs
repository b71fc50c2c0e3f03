//! A fake [`FmClient`] that replays a scripted sequence of tool calls,
//! grounded on `agtrace-testing`'s fixture-first approach to exercising the
//! CLI without a live provider.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use taskloom_engine::FmClient;

/// Replays `tool_name`/`args` pairs in order, one per `generate` call.
/// Once exhausted, every further call returns a `task_complete` so a test
/// run always terminates instead of looping forever.
pub struct ScriptedFmClient {
    steps: Mutex<Vec<(String, Value)>>,
}

impl ScriptedFmClient {
    pub fn new(steps: Vec<(&str, Value)>) -> Self {
        Self {
            steps: Mutex::new(
                steps
                    .into_iter()
                    .map(|(tool, args)| (tool.to_string(), args))
                    .rev()
                    .collect(),
            ),
        }
    }

    /// A client that signals `task_complete` on its very first turn.
    pub fn complete_immediately() -> Self {
        Self::new(vec![("task_complete", Value::Object(Default::default()))])
    }
}

#[async_trait]
impl FmClient for ScriptedFmClient {
    async fn generate(&self, _prompt: &str) -> Result<String, String> {
        let mut steps = self.steps.lock().unwrap();
        let (tool, args) = steps.pop().unwrap_or_else(|| ("task_complete".to_string(), Value::Object(Default::default())));
        Ok(format!(
            r#"<tool_call>{{"tool": "{tool}", "args": {args}}}</tool_call>"#
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn replays_steps_in_order_then_completes() {
        let client = ScriptedFmClient::new(vec![
            ("write_file", json!({"path": "a.txt", "content": "hi"})),
            ("run_command", json!({"command": "cat a.txt"})),
        ]);

        let first = client.generate("").await.unwrap();
        assert!(first.contains("write_file"));
        let second = client.generate("").await.unwrap();
        assert!(second.contains("run_command"));
        let third = client.generate("").await.unwrap();
        assert!(third.contains("task_complete"));
    }
}
