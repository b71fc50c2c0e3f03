//! FM Worker prompt assembly (spec §4.B).
//!
//! The source this spec was distilled from carried two variants of this
//! prompt — a terser, skills-aware one and an older hint-heavy one. Per
//! spec §9 we adopt the skills-aware variant exclusively: skills are
//! surfaced as read-only "example approaches" text, never as callable
//! actions.

const TASK_DESCRIPTION_CAP: usize = 600;

const SYSTEM_PREAMBLE: &str = "You control a workspace through exactly one tool call per turn.\n\
Respond with a single <tool_call>{...}</tool_call> block containing JSON of the form\n\
{\"tool\": \"<name>\", \"args\": { ... }}.\n\
Recognized tools: read_file, write_file, edit_file, run_command, task_complete, verify_progress.\n\
Paths are workspace-relative; absolute /app/... paths are resolved to the workspace root.\n\
Emit valid JSON only inside the tool_call block. Do not call tools other than the ones listed.";

/// Everything the FM Worker needs to build one prompt.
#[derive(Debug, Clone, Default)]
pub struct PromptInput<'a> {
    pub task_description: Option<&'a str>,
    pub action: &'a str,
    pub context: &'a str,
    /// Summary of the last one to three steps.
    pub previous: &'a str,
    /// Skills are reference-only; never presented as callable.
    pub example_approaches: Option<&'a str>,
    pub verification_feedback: Option<&'a str>,
    pub domain_hint: Option<&'a str>,
}

fn truncate_chars(s: &str, limit: usize) -> String {
    if s.chars().count() <= limit {
        s.to_string()
    } else {
        s.chars().take(limit).collect()
    }
}

/// Assemble the full prompt text. The task description is hard-capped at
/// 600 chars here; every other field is the caller's responsibility to keep
/// within the size invariant (spec §4.B, §8 invariant 10) — exceeding it
/// upstream is a caller bug, not something this function silently fixes.
pub fn build_prompt(input: &PromptInput) -> String {
    let mut sections = vec![SYSTEM_PREAMBLE.to_string()];

    if let Some(desc) = input.task_description {
        sections.push(format!(
            "Task: {}",
            truncate_chars(desc, TASK_DESCRIPTION_CAP)
        ));
    }

    sections.push(format!("Action: {}", input.action));
    sections.push(format!("Context: {}", input.context));

    if !input.previous.is_empty() {
        sections.push(format!("Previous: {}", input.previous));
    }

    if let Some(skills) = input.example_approaches {
        sections.push(format!(
            "Example approaches (reference only, not callable):\n{}",
            skills
        ));
    }

    if let Some(feedback) = input.verification_feedback {
        sections.push(format!("Verification feedback: {}", feedback));
    }

    if let Some(hint) = input.domain_hint {
        sections.push(format!("Hint: {}", hint));
    }

    sections.join("\n\n")
}

/// Hard ceiling on prompt size: half of the FM's ~16K char / 4K token
/// window (spec §4.B).
pub const MAX_PROMPT_CHARS: usize = 8000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_description_is_truncated_to_600_chars() {
        let long_desc = "x".repeat(2000);
        let input = PromptInput {
            task_description: Some(&long_desc),
            action: "write_file",
            context: "",
            previous: "",
            ..Default::default()
        };
        let prompt = build_prompt(&input);
        let task_line = prompt.lines().find(|l| l.starts_with("Task:")).unwrap();
        assert!(task_line.len() <= TASK_DESCRIPTION_CAP + "Task: ".len());
    }

    #[test]
    fn prompt_size_invariant_holds_for_bounded_inputs() {
        let task = "t".repeat(600);
        let action = "a".repeat(400);
        let context = "c".repeat(200);
        let previous = "p".repeat(400);
        let input = PromptInput {
            task_description: Some(&task),
            action: &action,
            context: &context,
            previous: &previous,
            ..Default::default()
        };
        let prompt = build_prompt(&input);
        assert!(
            prompt.len() <= MAX_PROMPT_CHARS,
            "prompt was {} chars",
            prompt.len()
        );
    }
}
