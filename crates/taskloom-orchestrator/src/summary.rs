use serde_json::Value;
use taskloom_core::ToolOutcome;

/// Builds the one-line, tool-aware step summary the orchestrator keeps in
/// its compact history (spec §4.C step 8). `run_command` gets special
/// treatment: the command text and its exit disposition.
pub fn summarize_step(tool_name: &str, args: &Value, outcome: &ToolOutcome) -> String {
    let disposition = if outcome.success { "succeeded" } else { "failed" };
    match tool_name {
        "run_command" => {
            let command = args.get("command").and_then(|v| v.as_str()).unwrap_or("");
            format!("run_command `{command}` {disposition}: {}", outcome.condensed_summary)
        }
        "write_file" | "edit_file" | "read_file" => {
            let path = args.get("path").and_then(|v| v.as_str()).unwrap_or("");
            format!("{tool_name} `{path}` {disposition}: {}", outcome.condensed_summary)
        }
        other => format!("{other} {disposition}: {}", outcome.condensed_summary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outcome(success: bool, condensed_summary: &str) -> ToolOutcome {
        ToolOutcome {
            success,
            full_output: condensed_summary.to_string(),
            condensed_summary: condensed_summary.to_string(),
        }
    }

    #[test]
    fn run_command_summary_includes_command_text() {
        let outcome = outcome(true, "exit 0");
        let summary = summarize_step("run_command", &json!({"command": "pytest -q"}), &outcome);
        assert!(summary.contains("pytest -q"));
        assert!(summary.contains("succeeded"));
    }

    #[test]
    fn write_file_summary_includes_path() {
        let outcome = outcome(true, "Created `a.txt`");
        let summary = summarize_step("write_file", &json!({"path": "a.txt"}), &outcome);
        assert!(summary.contains("a.txt"));
    }

    #[test]
    fn failure_disposition_is_reported() {
        let outcome = outcome(false, "Text not found");
        let summary = summarize_step("edit_file", &json!({"path": "a.txt"}), &outcome);
        assert!(summary.contains("failed"));
    }
}
