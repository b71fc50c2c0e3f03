//! Tool Executor (spec §4.A): pure mappings from a named tool invocation to
//! filesystem/subprocess effects and a condensed summary the FM can afford
//! to read. Every failure here is captured as data in [`ToolOutcome`] —
//! nothing propagates as an exception to the orchestrator loop.

mod condense;
mod error;
pub mod path;

pub use error::{Error, Result};

use serde_json::Value;
use std::path::Path;

use condense::truncate_preview;

const PREVIEW_CHARS: usize = 500;

/// Result of executing one tool call.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub success: bool,
    pub full_output: String,
    pub condensed_summary: String,
}

impl ToolOutcome {
    fn ok(full_output: impl Into<String>, condensed_summary: impl Into<String>) -> Self {
        Self {
            success: true,
            full_output: full_output.into(),
            condensed_summary: condensed_summary.into(),
        }
    }

    fn fail(full_output: impl Into<String>, condensed_summary: impl Into<String>) -> Self {
        Self {
            success: false,
            full_output: full_output.into(),
            condensed_summary: condensed_summary.into(),
        }
    }
}

/// Execute `tool_name` with `args` inside `workspace`. Never returns `Err`
/// for tool-level problems (missing file, nonzero exit, …) — those come
/// back as `ToolOutcome { success: false, .. }`. Only returns `Err` if the
/// workspace itself cannot be used (not expected in normal operation).
pub async fn execute_tool(workspace: &Path, tool_name: &str, args: &Value) -> ToolOutcome {
    match tool_name {
        "read_file" => read_file(workspace, args).await,
        "write_file" => write_file(workspace, args).await,
        "edit_file" => edit_file(workspace, args).await,
        "run_command" => run_command(workspace, args).await,
        "task_complete" => task_complete(),
        "verify_progress" => verify_progress(),
        other => ToolOutcome::fail(
            format!("Unknown tool: {}", other),
            format!("Unknown tool: {}", other),
        ),
    }
}

fn arg_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

fn arg_usize(args: &Value, key: &str) -> Option<usize> {
    args.get(key).and_then(Value::as_u64).map(|v| v as usize)
}

async fn read_file(workspace: &Path, args: &Value) -> ToolOutcome {
    let Some(rel_path) = arg_str(args, "path") else {
        return ToolOutcome::fail("Missing required argument: path", "Missing argument: path");
    };
    let full_path = path::resolve_in_workspace(workspace, rel_path);

    match tokio::fs::read_to_string(&full_path).await {
        Ok(content) => {
            let start = arg_usize(args, "start");
            let end = arg_usize(args, "end");
            let sliced = match (start, end) {
                (Some(s), Some(e)) => content
                    .lines()
                    .skip(s)
                    .take(e.saturating_sub(s))
                    .collect::<Vec<_>>()
                    .join("\n"),
                (Some(s), None) => content.lines().skip(s).collect::<Vec<_>>().join("\n"),
                _ => content.clone(),
            };
            let preview = truncate_preview(&sliced, PREVIEW_CHARS);
            ToolOutcome::ok(content, format!("Read `{}`: {}", rel_path, preview))
        }
        Err(e) => {
            let msg = format!("Error reading {}: {}", rel_path, e);
            ToolOutcome::fail(msg.clone(), msg)
        }
    }
}

async fn write_file(workspace: &Path, args: &Value) -> ToolOutcome {
    let Some(rel_path) = arg_str(args, "path") else {
        return ToolOutcome::fail("Missing required argument: path", "Missing argument: path");
    };
    let content = match args.get("content") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };

    let full_path = path::resolve_in_workspace(workspace, rel_path);
    if let Some(parent) = full_path.parent()
        && let Err(e) = tokio::fs::create_dir_all(parent).await
    {
        let msg = format!("Error creating directories for {}: {}", rel_path, e);
        return ToolOutcome::fail(msg.clone(), msg);
    }

    match tokio::fs::write(&full_path, &content).await {
        Ok(()) => {
            let basename = path::to_workspace_relative(rel_path);
            ToolOutcome::ok(
                format!("Wrote {} bytes to {}", content.len(), rel_path),
                format!("Created `{}`", basename.display()),
            )
        }
        Err(e) => {
            let msg = format!("Error writing {}: {}", rel_path, e);
            ToolOutcome::fail(msg.clone(), msg)
        }
    }
}

async fn edit_file(workspace: &Path, args: &Value) -> ToolOutcome {
    let (Some(rel_path), Some(old_text), Some(new_text)) = (
        arg_str(args, "path"),
        arg_str(args, "old_text"),
        arg_str(args, "new_text"),
    ) else {
        return ToolOutcome::fail(
            "Missing required argument: path, old_text, or new_text",
            "Missing argument",
        );
    };

    let full_path = path::resolve_in_workspace(workspace, rel_path);
    let content = match tokio::fs::read_to_string(&full_path).await {
        Ok(c) => c,
        Err(e) => {
            let msg = format!("Error reading {}: {}", rel_path, e);
            return ToolOutcome::fail(msg.clone(), msg);
        }
    };

    if !content.contains(old_text) {
        return ToolOutcome::fail("Text not found", "Text not found");
    }

    let updated = content.replacen(old_text, new_text, 1);
    match tokio::fs::write(&full_path, &updated).await {
        Ok(()) => ToolOutcome::ok(
            format!("Edited {}", rel_path),
            format!("Edited `{}`", rel_path),
        ),
        Err(e) => {
            let msg = format!("Error writing {}: {}", rel_path, e);
            ToolOutcome::fail(msg.clone(), msg)
        }
    }
}

async fn run_command(workspace: &Path, args: &Value) -> ToolOutcome {
    let Some(command) = arg_str(args, "command") else {
        return ToolOutcome::fail(
            "Missing required argument: command",
            "Missing argument: command",
        );
    };

    let output = match tokio::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(workspace)
        .output()
        .await
    {
        Ok(o) => o,
        Err(e) => {
            let msg = format!("Failed to spawn command: {}", e);
            return ToolOutcome::fail(msg.clone(), msg);
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let combined = format!("{}\n{}", stdout, stderr).trim().to_string();

    if output.status.success() {
        let preview = truncate_preview(&combined, PREVIEW_CHARS);
        ToolOutcome::ok(combined, format!("`{}` succeeded: {}", command, preview))
    } else {
        let code = output.status.code().unwrap_or(-1);
        let preview = truncate_preview(&combined, 200);
        ToolOutcome::fail(
            combined,
            format!("`{}` failed (exit {}): {}", command, code, preview),
        )
    }
}

fn task_complete() -> ToolOutcome {
    ToolOutcome::ok("task_complete", "TASK_COMPLETE")
}

fn verify_progress() -> ToolOutcome {
    ToolOutcome::ok("verify_progress", "VERIFY_PROGRESS_REQUESTED")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let write_out = execute_tool(
            dir.path(),
            "write_file",
            &json!({"path": "hello.txt", "content": "hi"}),
        )
        .await;
        assert!(write_out.success);
        assert_eq!(write_out.condensed_summary, "Created `hello.txt`");

        let read_out = execute_tool(dir.path(), "read_file", &json!({"path": "hello.txt"})).await;
        assert!(read_out.success);
        assert_eq!(read_out.full_output, "hi");
    }

    #[tokio::test]
    async fn absolute_app_path_maps_to_basename_in_workspace() {
        let dir = TempDir::new().unwrap();
        execute_tool(
            dir.path(),
            "write_file",
            &json!({"path": "/app/hello.txt", "content": "hi"}),
        )
        .await;
        assert!(dir.path().join("hello.txt").exists());
    }

    #[tokio::test]
    async fn read_missing_file_fails_locally() {
        let dir = TempDir::new().unwrap();
        let out = execute_tool(dir.path(), "read_file", &json!({"path": "nope.txt"})).await;
        assert!(!out.success);
    }

    #[tokio::test]
    async fn edit_file_requires_existing_text() {
        let dir = TempDir::new().unwrap();
        execute_tool(
            dir.path(),
            "write_file",
            &json!({"path": "hello.txt", "content": "Hi"}),
        )
        .await;
        let out = execute_tool(
            dir.path(),
            "edit_file",
            &json!({"path": "hello.txt", "old_text": "nope", "new_text": "x"}),
        )
        .await;
        assert!(!out.success);
        assert_eq!(out.condensed_summary, "Text not found");

        let out = execute_tool(
            dir.path(),
            "edit_file",
            &json!({"path": "hello.txt", "old_text": "Hi", "new_text": "hi"}),
        )
        .await;
        assert!(out.success);
    }

    #[tokio::test]
    async fn run_command_reports_exit_status() {
        let dir = TempDir::new().unwrap();
        let ok = execute_tool(dir.path(), "run_command", &json!({"command": "true"})).await;
        assert!(ok.success);

        let fail = execute_tool(dir.path(), "run_command", &json!({"command": "false"})).await;
        assert!(!fail.success);
    }

    #[tokio::test]
    async fn task_complete_and_verify_progress_are_signals() {
        let dir = TempDir::new().unwrap();
        let a = execute_tool(dir.path(), "task_complete", &json!({})).await;
        assert_eq!(a.condensed_summary, "TASK_COMPLETE");
        let b = execute_tool(dir.path(), "verify_progress", &json!({})).await;
        assert_eq!(b.condensed_summary, "VERIFY_PROGRESS_REQUESTED");
    }

    #[tokio::test]
    async fn unknown_tool_is_a_local_error() {
        let dir = TempDir::new().unwrap();
        let out = execute_tool(dir.path(), "frobnicate", &json!({})).await;
        assert!(!out.success);
        assert_eq!(out.condensed_summary, "Unknown tool: frobnicate");
    }
}
