//! Aggressive Verifier (spec §4.D): tests are the source of truth, not the
//! FM's self-assessment.

use std::path::Path;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

const ERROR_CORE_CAP: usize = 200;

/// Outcome of running one verification command.
#[derive(Debug, Clone)]
pub struct VerifyOutcome {
    pub passed: bool,
    pub raw_output: String,
    /// Short, actionable error extract (≤200 chars), present only on failure.
    pub error_core: Option<String>,
    /// `(file, line)` if the error core could be localized.
    pub location: Option<(String, u32)>,
}

fn strip_ansi(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());
    re.replace_all(text, "").into_owned()
}

fn error_patterns() -> &'static Vec<Regex> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // Rust/C-style compiler errors: "error[E0308]: mismatched types"
            r"(?m)^error(\[\w+\])?:\s*.+$",
            // pytest-style assertion: "assert 1 == 2"
            r"(?m)^E\s+.+$",
            // generic "expected X, got Y" / "expected X but got Y"
            r"(?mi)expected\s+.+?(,|\s+but)\s+got\s+.+$",
            // generic panics/exceptions
            r"(?mi)^(panic|traceback|exception):?\s*.+$",
            // plain "Error: ..." lines
            r"(?m)^Error:\s*.+$",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    })
}

fn location_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([\w./\\-]+\.\w+):(\d+)").unwrap())
}

/// Extract a short, actionable error core and optional `(file, line)`
/// location from verifier output. ANSI codes are stripped first.
pub fn extract_error_core(output: &str) -> (String, Option<(String, u32)>) {
    let clean = strip_ansi(output);

    let core = error_patterns()
        .iter()
        .find_map(|re| re.find(&clean).map(|m| m.as_str().trim().to_string()))
        .unwrap_or_else(|| {
            clean
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("(no output)")
                .trim()
                .to_string()
        });

    let truncated = if core.chars().count() > ERROR_CORE_CAP {
        core.chars().take(ERROR_CORE_CAP).collect()
    } else {
        core
    };

    let location = location_regex().captures(&clean).and_then(|c| {
        let file = c.get(1)?.as_str().to_string();
        let line: u32 = c.get(2)?.as_str().parse().ok()?;
        Some((file, line))
    });

    (truncated, location)
}

/// Run `command` inside `work_dir` and classify the result.
pub async fn verify(command: &str, work_dir: &Path) -> VerifyOutcome {
    let output = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(work_dir)
        .output()
        .await;

    let output = match output {
        Ok(o) => o,
        Err(e) => {
            let msg = format!("Failed to spawn verification command: {}", e);
            return VerifyOutcome {
                passed: false,
                raw_output: msg.clone(),
                error_core: Some(msg),
                location: None,
            };
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let combined = format!("{}\n{}", stdout, stderr);

    if output.status.success() {
        VerifyOutcome {
            passed: true,
            raw_output: combined,
            error_core: None,
            location: None,
        }
    } else {
        let (error_core, location) = extract_error_core(&combined);
        VerifyOutcome {
            passed: false,
            raw_output: combined,
            error_core: Some(error_core),
            location,
        }
    }
}

/// Callback invoked by [`run_verify_loop`] when verification fails. Should
/// attempt a fix and return `true` to retry, or `false` to abort.
#[async_trait]
pub trait OnVerifyFailure: Send + Sync {
    async fn apply_fix(&self, error_core: &str, location: Option<(&str, u32)>, attempt: u32) -> bool;
}

/// Run `command` up to `max_attempts` times, giving `on_failure` a chance to
/// fix the workspace between attempts. Returns the final [`VerifyOutcome`].
pub async fn run_verify_loop(
    command: &str,
    work_dir: &Path,
    max_attempts: u32,
    on_failure: &dyn OnVerifyFailure,
) -> VerifyOutcome {
    let mut attempt = 0;
    loop {
        let outcome = verify(command, work_dir).await;
        if outcome.passed {
            return outcome;
        }

        attempt += 1;
        if attempt >= max_attempts {
            return outcome;
        }

        let error_core = outcome.error_core.clone().unwrap_or_default();
        let location = outcome
            .location
            .as_ref()
            .map(|(f, l)| (f.as_str(), *l));
        if !on_failure.apply_fix(&error_core, location, attempt).await {
            return outcome;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn extracts_rustc_style_error_core() {
        let output = "Compiling foo\nerror[E0308]: mismatched types\n  --> src/main.rs:10:5\n";
        let (core, location) = extract_error_core(output);
        assert!(core.starts_with("error[E0308]"));
        assert_eq!(location, Some(("src/main.rs".to_string(), 10)));
    }

    #[test]
    fn extracts_pytest_assertion_core() {
        let output = "FAILED test_foo.py::test_bar\nE       assert 1 == 2\n";
        let (core, _) = extract_error_core(output);
        assert_eq!(core, "E       assert 1 == 2");
    }

    #[test]
    fn strips_ansi_before_matching() {
        let output = "\x1b[31merror: boom\x1b[0m\n";
        let (core, _) = extract_error_core(output);
        assert_eq!(core, "error: boom");
    }

    #[test]
    fn caps_error_core_at_200_chars() {
        let long_line = format!("Error: {}", "x".repeat(500));
        let (core, _) = extract_error_core(&long_line);
        assert!(core.chars().count() <= 200);
    }

    #[tokio::test]
    async fn verify_passes_on_zero_exit() {
        let dir = TempDir::new().unwrap();
        let outcome = verify("true", dir.path()).await;
        assert!(outcome.passed);
    }

    #[tokio::test]
    async fn verify_fails_on_nonzero_exit() {
        let dir = TempDir::new().unwrap();
        let outcome = verify("echo 'Error: boom' && false", dir.path()).await;
        assert!(!outcome.passed);
        assert!(outcome.error_core.unwrap().contains("boom"));
    }

    struct AlwaysRetry;

    #[async_trait]
    impl OnVerifyFailure for AlwaysRetry {
        async fn apply_fix(&self, _error_core: &str, _location: Option<(&str, u32)>, _attempt: u32) -> bool {
            true
        }
    }

    struct NeverRetry;

    #[async_trait]
    impl OnVerifyFailure for NeverRetry {
        async fn apply_fix(&self, _error_core: &str, _location: Option<(&str, u32)>, _attempt: u32) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn run_verify_loop_stops_when_callback_declines() {
        let dir = TempDir::new().unwrap();
        let outcome = run_verify_loop("false", dir.path(), 5, &NeverRetry).await;
        assert!(!outcome.passed);
    }

    #[tokio::test]
    async fn run_verify_loop_stops_at_max_attempts() {
        let dir = TempDir::new().unwrap();
        let outcome = run_verify_loop("false", dir.path(), 2, &AlwaysRetry).await;
        assert!(!outcome.passed);
    }
}
