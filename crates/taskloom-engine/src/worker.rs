use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::parse::{parse_tool_call, ParsedCall};
use crate::prompt::{build_prompt, PromptInput};

/// Injectable FM client. Stateless and single-shot from the worker's point
/// of view — no retry happens inside `generate` (spec §4.B: "no retry
/// here").
#[async_trait]
pub trait FmClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, String>;
}

/// Build a prompt from `input`, invoke `client`, and parse exactly one tool
/// call out of the response.
pub async fn call_fm(client: &dyn FmClient, input: &PromptInput<'_>) -> Result<ParsedCall> {
    let prompt = build_prompt(input);
    tracing::debug!(prompt_len = prompt.len(), "invoking FM worker");
    let raw = client.generate(&prompt).await.map_err(Error::FmCall)?;
    Ok(parse_tool_call(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoClient(&'static str);

    #[async_trait]
    impl FmClient for EchoClient {
        async fn generate(&self, _prompt: &str) -> std::result::Result<String, String> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn call_fm_parses_client_response() {
        let client = EchoClient(
            r#"<tool_call>{"tool": "task_complete", "args": {}}</tool_call>"#,
        );
        let input = PromptInput {
            action: "decide next step",
            context: "",
            previous: "",
            ..Default::default()
        };
        let parsed = call_fm(&client, &input).await.unwrap();
        assert_eq!(parsed.tool_name, "task_complete");
    }

    struct FailingClient;

    #[async_trait]
    impl FmClient for FailingClient {
        async fn generate(&self, _prompt: &str) -> std::result::Result<String, String> {
            Err("network timeout".to_string())
        }
    }

    #[tokio::test]
    async fn call_fm_surfaces_client_errors() {
        let client = FailingClient;
        let input = PromptInput {
            action: "decide next step",
            context: "",
            previous: "",
            ..Default::default()
        };
        let result = call_fm(&client, &input).await;
        assert!(result.is_err());
    }
}
