//! Per-task workspace materialization (spec §4.H steps 1-2).

use std::path::{Path, PathBuf};

use taskloom_types::{Suite, Task};

use crate::{Error, Result};

/// Creates `output_dir/task_id/workspace/`, writes any inline `setup_files`,
/// and (when a source environment is available) copies `environment/*` and
/// `tests/` from it, rewriting `/app/` occurrences in test files to the
/// workspace's absolute path.
pub async fn materialize_workspace(output_dir: &Path, suite: &Suite, task: &Task) -> Result<PathBuf> {
    let task_dir = output_dir.join(&task.id);
    let workspace = task_dir.join("workspace");
    tokio::fs::create_dir_all(&workspace).await?;

    for (rel_path, content) in &task.setup_files {
        let dest = workspace.join(rel_path);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&dest, content).await?;
    }

    if let Some(source_root) = resolve_source_root(suite, task) {
        copy_environment(&source_root, &workspace).await?;
        copy_tests_with_rewrite(&source_root, &workspace).await?;
    }

    Ok(workspace)
}

/// `source_path` on the task wins; otherwise fall back to
/// `suite.source_repo/<task_id>` when the suite names a shared repo.
fn resolve_source_root(suite: &Suite, task: &Task) -> Option<PathBuf> {
    if let Some(path) = &task.source_path {
        return Some(PathBuf::from(path));
    }
    suite
        .source_repo
        .as_ref()
        .map(|repo| PathBuf::from(repo).join(&task.id))
}

/// Copies every file under `source_root/environment/`, excluding any
/// container definition file (`Dockerfile`, `docker-compose.yml`, …), into
/// `workspace`.
async fn copy_environment(source_root: &Path, workspace: &Path) -> Result<()> {
    let env_dir = source_root.join("environment");
    if !env_dir.exists() {
        return Ok(());
    }
    copy_tree(&env_dir, workspace, |path| !is_container_file(path)).await
}

/// Copies `source_root/tests/` into `workspace/tests/`, rewriting any
/// `/app/` occurrence in copied text files to `workspace`'s absolute path
/// (spec §4.H step 1).
async fn copy_tests_with_rewrite(source_root: &Path, workspace: &Path) -> Result<()> {
    let tests_dir = source_root.join("tests");
    if !tests_dir.exists() {
        return Ok(());
    }
    let dest_tests = workspace.join("tests");
    let workspace_str = workspace.to_string_lossy().into_owned();

    for entry in walkdir::WalkDir::new(&tests_dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(&tests_dir).unwrap();
        let dest = dest_tests.join(rel);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        match tokio::fs::read_to_string(entry.path()).await {
            Ok(text) => {
                let rewritten = text.replace("/app/", &format!("{}/", workspace_str));
                tokio::fs::write(&dest, rewritten).await?;
            }
            // Binary fixture: copy bytes unchanged.
            Err(_) => {
                tokio::fs::copy(entry.path(), &dest).await?;
            }
        }
    }
    Ok(())
}

async fn copy_tree(
    src: &Path,
    dest_root: &Path,
    include: impl Fn(&Path) -> bool,
) -> Result<()> {
    for entry in walkdir::WalkDir::new(src).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() || !include(entry.path()) {
            continue;
        }
        let rel = entry.path().strip_prefix(src).unwrap();
        let dest = dest_root.join(rel);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(entry.path(), &dest).await?;
    }
    Ok(())
}

fn is_container_file(path: &Path) -> bool {
    matches!(
        path.file_name().and_then(|n| n.to_str()),
        Some("Dockerfile") | Some("docker-compose.yml") | Some("docker-compose.yaml") | Some(".dockerignore")
    )
}

/// Runs each `setup_commands` entry in `workspace`, in order. Returns an
/// error on the first nonzero exit (spec §4.H step 2).
pub async fn run_setup_commands(workspace: &Path, commands: &[String]) -> Result<()> {
    for command in commands {
        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(workspace)
            .output()
            .await?;
        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::SetupFailed(format!(
                "`{command}` exited {}: {}{}",
                output.status.code().unwrap_or(-1),
                stdout,
                stderr
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use taskloom_types::VerificationDirective;

    fn sample_task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            name: "Sample".to_string(),
            description: "Do the thing".to_string(),
            difficulty: None,
            category: None,
            timeout_seconds: 60,
            max_turns: 10,
            verification: VerificationDirective::Test,
            setup_files: HashMap::new(),
            setup_commands: vec![],
            source_path: None,
        }
    }

    fn sample_suite() -> Suite {
        Suite {
            name: "smoke".to_string(),
            version: "1.0.0".to_string(),
            description: None,
            source_repo: None,
            tasks: vec![],
        }
    }

    #[tokio::test]
    async fn materializes_inline_setup_files() {
        let output = tempfile::TempDir::new().unwrap();
        let mut task = sample_task("t1");
        task.setup_files
            .insert("src/main.py".to_string(), "print('hi')".to_string());

        let ws = materialize_workspace(output.path(), &sample_suite(), &task)
            .await
            .unwrap();
        let content = tokio::fs::read_to_string(ws.join("src/main.py")).await.unwrap();
        assert_eq!(content, "print('hi')");
    }

    #[tokio::test]
    async fn setup_commands_stop_on_first_failure() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = run_setup_commands(dir.path(), &["true".to_string(), "false".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SetupFailed(_)));
    }

    #[tokio::test]
    async fn copies_environment_excluding_container_files() {
        let source = tempfile::TempDir::new().unwrap();
        let env_dir = source.path().join("environment");
        tokio::fs::create_dir_all(&env_dir).await.unwrap();
        tokio::fs::write(env_dir.join("app.py"), "x = 1").await.unwrap();
        tokio::fs::write(env_dir.join("Dockerfile"), "FROM scratch").await.unwrap();

        let output = tempfile::TempDir::new().unwrap();
        let mut task = sample_task("t1");
        task.source_path = Some(source.path().to_string_lossy().into_owned());

        let ws = materialize_workspace(output.path(), &sample_suite(), &task)
            .await
            .unwrap();
        assert!(ws.join("app.py").exists());
        assert!(!ws.join("Dockerfile").exists());
    }

    #[tokio::test]
    async fn tests_dir_rewrites_app_paths() {
        let source = tempfile::TempDir::new().unwrap();
        let tests_dir = source.path().join("tests");
        tokio::fs::create_dir_all(&tests_dir).await.unwrap();
        tokio::fs::write(tests_dir.join("test_it.py"), "open('/app/data.txt')")
            .await
            .unwrap();

        let output = tempfile::TempDir::new().unwrap();
        let mut task = sample_task("t1");
        task.source_path = Some(source.path().to_string_lossy().into_owned());

        let ws = materialize_workspace(output.path(), &sample_suite(), &task)
            .await
            .unwrap();
        let rewritten = tokio::fs::read_to_string(ws.join("tests/test_it.py"))
            .await
            .unwrap();
        assert!(rewritten.contains(&ws.to_string_lossy().into_owned()));
        assert!(!rewritten.contains("/app/"));
    }
}
