//! Verification directive → verification command translation (spec §4.H
//! step 5).

use std::path::Path;

use taskloom_types::VerificationDirective;

use taskloom_engine::verifier::{verify, VerifyOutcome};

/// Standard suite test runner invoked for `Test` directives when a `tests/`
/// directory exists in the workspace. The source leaves the exact runner
/// unspecified; pytest is the closest fit for the suite fixtures this crate
/// targets.
const DEFAULT_TEST_RUNNER: &str = "pytest tests -q";

/// The bare shell command a directive runs, decided by exit code alone.
/// For `Output`, this is only the command half of the check — it says
/// nothing about `expected` — so it is only good enough for the
/// orchestrator's interim `verify_progress`/finalization gating (spec
/// §4.C), which only has room for a single exit-code-checked string. The
/// runner's own authoritative post-run check goes through
/// [`run_directive_verification`] instead. `None` means there is nothing
/// to check (a `Test` directive with no `tests/` directory) — the caller
/// treats an absent command as a vacuous pass.
pub fn directive_command(directive: &VerificationDirective, workspace: &Path) -> Option<String> {
    match directive {
        VerificationDirective::Custom { script } => Some(script.clone()),
        VerificationDirective::Output { command, .. } => Some(command.clone()),
        VerificationDirective::Test => {
            if workspace.join("tests").exists() {
                Some(DEFAULT_TEST_RUNNER.to_string())
            } else {
                None
            }
        }
    }
}

/// Runs the directive dispatch described by spec §4.H step 5, the
/// authoritative check the Benchmark Runner re-applies after the
/// orchestrator terminates. `Custom`/`Test` run their command and decide
/// pass/fail by exit code; `Output` runs its command, captures stdout,
/// and compares the trimmed result to `expected` in Rust rather than
/// folding the comparison into the shell command itself. `None` means
/// there is nothing to check.
pub async fn run_directive_verification(directive: &VerificationDirective, workspace: &Path) -> Option<VerifyOutcome> {
    match directive {
        VerificationDirective::Output { command, expected } => Some(verify_output(command, expected, workspace).await),
        _ => {
            let command = directive_command(directive, workspace)?;
            Some(verify(&command, workspace).await)
        }
    }
}

async fn verify_output(command: &str, expected: &str, workspace: &Path) -> VerifyOutcome {
    let output = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(workspace)
        .output()
        .await;

    let output = match output {
        Ok(o) => o,
        Err(err) => {
            let msg = format!("Failed to spawn verification command: {err}");
            return VerifyOutcome {
                passed: false,
                raw_output: msg.clone(),
                error_core: Some(msg),
                location: None,
            };
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout == expected.trim() {
        VerifyOutcome {
            passed: true,
            raw_output: stdout,
            error_core: None,
            location: None,
        }
    } else {
        VerifyOutcome {
            passed: false,
            raw_output: stdout.clone(),
            error_core: Some(format!("expected {expected:?}, got {stdout:?}")),
            location: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_directive_uses_script_verbatim() {
        let directive = VerificationDirective::Custom {
            script: "./check.sh".to_string(),
        };
        let dir = tempfile::TempDir::new().unwrap();
        assert_eq!(
            directive_command(&directive, dir.path()),
            Some("./check.sh".to_string())
        );
    }

    #[test]
    fn output_directive_command_is_the_bare_command() {
        let directive = VerificationDirective::Output {
            command: "cat hello.txt".to_string(),
            expected: "hi".to_string(),
        };
        let dir = tempfile::TempDir::new().unwrap();
        assert_eq!(
            directive_command(&directive, dir.path()),
            Some("cat hello.txt".to_string())
        );
    }

    #[tokio::test]
    async fn output_directive_verification_trims_stdout_whitespace() {
        let directive = VerificationDirective::Output {
            command: "printf ' hi \\n'".to_string(),
            expected: "hi".to_string(),
        };
        let dir = tempfile::TempDir::new().unwrap();
        let outcome = run_directive_verification(&directive, dir.path()).await.unwrap();
        assert!(outcome.passed);
        assert_eq!(outcome.raw_output, "hi");
    }

    #[tokio::test]
    async fn output_directive_verification_reports_actual_output_on_mismatch() {
        let directive = VerificationDirective::Output {
            command: "echo Hi".to_string(),
            expected: "hi".to_string(),
        };
        let dir = tempfile::TempDir::new().unwrap();
        let outcome = run_directive_verification(&directive, dir.path()).await.unwrap();
        assert!(!outcome.passed);
        assert_eq!(outcome.raw_output, "Hi");
        assert!(outcome.error_core.unwrap().contains("Hi"));
    }

    #[test]
    fn test_directive_without_tests_dir_is_vacuous() {
        let dir = tempfile::TempDir::new().unwrap();
        assert_eq!(directive_command(&VerificationDirective::Test, dir.path()), None);
    }

    #[test]
    fn test_directive_with_tests_dir_uses_default_runner() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("tests")).unwrap();
        assert_eq!(
            directive_command(&VerificationDirective::Test, dir.path()),
            Some(DEFAULT_TEST_RUNNER.to_string())
        );
    }
}
