//! Selects and invokes a foundation-model backend (spec §4.B, §6 `--model`).
//!
//! The wire format of any particular provider is explicitly out of scope
//! (spec §1 Non-goals), so every backend here is the same shape: pipe the
//! assembled prompt to a subprocess's stdin, read its stdout as the raw
//! response. Which subprocess runs is the only thing that varies by model.

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use taskloom_engine::FmClient;

/// Resolves a `--model` value into the subprocess invocation that backs it.
///
/// - `claude-code` → the `claude` CLI in print mode.
/// - `fm` / `foundation-models` → `$TASKLOOM_FM_COMMAND`, or `fm` if unset.
/// - `ollama:<model>` → `ollama run <model>`.
pub fn resolve(model: &str) -> ProcessFmClient {
    if let Some(ollama_model) = model.strip_prefix("ollama:") {
        return ProcessFmClient {
            program: "ollama".to_string(),
            args: vec!["run".to_string(), ollama_model.to_string()],
        };
    }

    match model {
        "claude-code" => ProcessFmClient {
            program: "claude".to_string(),
            args: vec!["--print".to_string()],
        },
        "fm" | "foundation-models" => {
            let program = std::env::var("TASKLOOM_FM_COMMAND").unwrap_or_else(|_| "fm".to_string());
            ProcessFmClient { program, args: vec![] }
        }
        other => {
            tracing::warn!(model = other, "unrecognized model id, invoking it as a bare command");
            ProcessFmClient {
                program: other.to_string(),
                args: vec![],
            }
        }
    }
}

/// An [`FmClient`] that pipes the prompt to a subprocess's stdin and reads
/// its stdout as the completion.
pub struct ProcessFmClient {
    program: String,
    args: Vec<String>,
}

#[async_trait]
impl FmClient for ProcessFmClient {
    async fn generate(&self, prompt: &str) -> Result<String, String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| format!("failed to spawn {}: {e}", self.program))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .await
                .map_err(|e| format!("failed to write prompt to {}: {e}", self.program))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| format!("failed waiting on {}: {e}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("{} exited with {}: {stderr}", self.program, output.status));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ollama_prefix_splits_into_run_subcommand() {
        let client = resolve("ollama:qwen2.5-coder");
        assert_eq!(client.program, "ollama");
        assert_eq!(client.args, vec!["run", "qwen2.5-coder"]);
    }

    #[test]
    fn claude_code_maps_to_print_mode() {
        let client = resolve("claude-code");
        assert_eq!(client.program, "claude");
        assert_eq!(client.args, vec!["--print"]);
    }

    #[tokio::test]
    async fn generate_surfaces_spawn_failures_as_err() {
        let client = ProcessFmClient {
            program: "definitely-not-a-real-binary-xyz".to_string(),
            args: vec![],
        };
        let result = client.generate("hi").await;
        assert!(result.is_err());
    }
}
