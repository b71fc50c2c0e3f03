//! Session Log (spec §4.G): an append-only per-session chain of tagged
//! entries, independent of the Trajectory Collector.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use taskloom_types::{SessionEntry, SessionOutcome, UsageStats};

use crate::storage::{append_line, read_lines_tolerant};
use crate::Result;

/// A live handle to an in-progress session chain.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub session_id: String,
    last_uuid: String,
    turn_count: u64,
    usage: UsageStats,
    files_modified: HashSet<String>,
}

/// Flattened metadata about one session, derived from its entry chain.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionMetadata {
    pub session_id: String,
    pub task_id: Option<String>,
    pub started_at: String,
    pub ended_at: Option<String>,
    pub outcome: Option<SessionOutcome>,
    pub total_turns: u64,
    pub total_usage: Option<UsageStats>,
    pub files_modified: Vec<String>,
    pub commits: Vec<String>,
    pub model: Option<String>,
    pub cwd: Option<String>,
    pub first_user_message: Option<Value>,
}

pub struct SessionLog {
    dir: PathBuf,
}

impl SessionLog {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{session_id}.jsonl"))
    }

    pub fn start_session(
        &self,
        task_id: Option<String>,
        model: Option<String>,
        provider: Option<String>,
        cwd: Option<String>,
        git_branch: Option<String>,
        session_id: Option<String>,
    ) -> Result<SessionHandle> {
        let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let uuid = Uuid::new_v4().to_string();
        let entry = SessionEntry::SessionStart {
            uuid: uuid.clone(),
            parent_uuid: None,
            timestamp: Utc::now().to_rfc3339(),
            cwd: cwd.unwrap_or_default(),
            model,
            provider,
            git_branch,
            version: env!("CARGO_PKG_VERSION").to_string(),
            task_id,
        };
        append_line(&self.path_for(&session_id), &entry)?;
        Ok(SessionHandle {
            session_id,
            last_uuid: uuid,
            turn_count: 0,
            usage: UsageStats::default(),
            files_modified: HashSet::new(),
        })
    }

    pub fn log_user_message(&self, handle: &mut SessionHandle, content: Value) -> Result<()> {
        let uuid = Uuid::new_v4().to_string();
        let entry = SessionEntry::User {
            uuid: uuid.clone(),
            parent_uuid: handle.last_uuid.clone(),
            timestamp: Utc::now().to_rfc3339(),
            content,
        };
        append_line(&self.path_for(&handle.session_id), &entry)?;
        handle.last_uuid = uuid;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn log_assistant_message(
        &self,
        handle: &mut SessionHandle,
        content: Value,
        model: Option<String>,
        message_id: Option<String>,
        usage: Option<UsageStats>,
        request_id: Option<String>,
        stop_reason: Option<String>,
    ) -> Result<()> {
        let uuid = Uuid::new_v4().to_string();
        let entry = SessionEntry::Assistant {
            uuid: uuid.clone(),
            parent_uuid: handle.last_uuid.clone(),
            timestamp: Utc::now().to_rfc3339(),
            content,
            model,
            message_id,
            usage,
            request_id,
            stop_reason,
        };
        append_line(&self.path_for(&handle.session_id), &entry)?;
        handle.last_uuid = uuid;
        handle.turn_count += 1;
        if let Some(usage) = usage {
            handle.usage.accumulate(&usage);
        }
        Ok(())
    }

    pub fn log_tool_result(
        &self,
        handle: &mut SessionHandle,
        tool_use_id: String,
        content: Value,
        is_error: bool,
    ) -> Result<()> {
        let uuid = Uuid::new_v4().to_string();
        let entry = SessionEntry::ToolResult {
            uuid: uuid.clone(),
            parent_uuid: handle.last_uuid.clone(),
            timestamp: Utc::now().to_rfc3339(),
            tool_use_id,
            content,
            is_error,
        };
        append_line(&self.path_for(&handle.session_id), &entry)?;
        handle.last_uuid = uuid;
        Ok(())
    }

    /// Pure handle update; writes nothing to disk.
    pub fn track_file_modified(&self, handle: &mut SessionHandle, path: String) {
        handle.files_modified.insert(path);
    }

    pub fn end_session(
        &self,
        handle: &SessionHandle,
        outcome: SessionOutcome,
        reason: Option<String>,
        commits: Vec<String>,
    ) -> Result<()> {
        let mut files_modified: Vec<String> = handle.files_modified.iter().cloned().collect();
        files_modified.sort();
        let entry = SessionEntry::SessionEnd {
            uuid: Uuid::new_v4().to_string(),
            parent_uuid: handle.last_uuid.clone(),
            timestamp: Utc::now().to_rfc3339(),
            outcome,
            reason,
            total_turns: handle.turn_count,
            usage: Some(handle.usage),
            files_modified,
            commits,
        };
        append_line(&self.path_for(&handle.session_id), &entry)
    }

    /// Tolerant load: malformed lines are skipped, never fail the whole read.
    pub fn load_session(&self, session_id: &str) -> Result<Vec<SessionEntry>> {
        let (entries, _skipped) = read_lines_tolerant(&self.path_for(session_id))?;
        Ok(entries)
    }

    pub fn list_sessions(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if let Some(stem) = entry.path().file_stem().and_then(|s| s.to_str())
                && entry.path().extension().is_some_and(|ext| ext == "jsonl")
            {
                ids.push(stem.to_string());
            }
        }
        ids.sort_by(|a, b| b.cmp(a));
        Ok(ids)
    }

    pub fn get_session_metadata(&self, session_id: &str) -> Result<Option<SessionMetadata>> {
        let entries = self.load_session(session_id)?;
        Ok(Self::metadata_from_entries(session_id, &entries))
    }

    fn metadata_from_entries(
        session_id: &str,
        entries: &[SessionEntry],
    ) -> Option<SessionMetadata> {
        let start = entries.iter().find_map(|e| match e {
            SessionEntry::SessionStart {
                timestamp,
                cwd,
                model,
                task_id,
                ..
            } => Some((timestamp.clone(), cwd.clone(), model.clone(), task_id.clone())),
            _ => None,
        })?;
        let (started_at, cwd, model, task_id) = start;

        let end = entries.iter().find_map(|e| match e {
            SessionEntry::SessionEnd {
                timestamp,
                outcome,
                total_turns,
                usage,
                files_modified,
                commits,
                ..
            } => Some((
                timestamp.clone(),
                *outcome,
                *total_turns,
                *usage,
                files_modified.clone(),
                commits.clone(),
            )),
            _ => None,
        });

        let first_user_message = entries.iter().find_map(|e| match e {
            SessionEntry::User { content, .. } => Some(content.clone()),
            _ => None,
        });

        let total_turns_from_entries = entries
            .iter()
            .filter(|e| matches!(e, SessionEntry::Assistant { .. }))
            .count() as u64;

        Some(match end {
            Some((ended_at, outcome, total_turns, usage, files_modified, commits)) => {
                SessionMetadata {
                    session_id: session_id.to_string(),
                    task_id,
                    started_at,
                    ended_at: Some(ended_at),
                    outcome: Some(outcome),
                    total_turns,
                    total_usage: usage,
                    files_modified,
                    commits,
                    model,
                    cwd: Some(cwd),
                    first_user_message,
                }
            }
            None => SessionMetadata {
                session_id: session_id.to_string(),
                task_id,
                started_at,
                ended_at: None,
                outcome: None,
                total_turns: total_turns_from_entries,
                total_usage: None,
                files_modified: Vec::new(),
                commits: Vec::new(),
                model,
                cwd: Some(cwd),
                first_user_message,
            },
        })
    }

    pub fn search_sessions(&self, term: &str) -> Result<Vec<SessionMetadata>> {
        let term = term.to_lowercase();
        let mut matches = Vec::new();
        for session_id in self.list_sessions()? {
            let entries = self.load_session(&session_id)?;
            let haystack = Self::concatenated_text(&entries).to_lowercase();
            if haystack.contains(&term)
                && let Some(meta) = Self::metadata_from_entries(&session_id, &entries)
            {
                matches.push(meta);
            }
        }
        Ok(matches)
    }

    fn concatenated_text(entries: &[SessionEntry]) -> String {
        entries
            .iter()
            .filter_map(|e| match e {
                SessionEntry::User { content, .. } | SessionEntry::Assistant { content, .. } => {
                    Some(value_to_text(content))
                }
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn find_sessions_by_task(&self, task_id: &str) -> Result<Vec<SessionMetadata>> {
        let mut matches = Vec::new();
        for session_id in self.list_sessions()? {
            if let Some(meta) = self.get_session_metadata(&session_id)?
                && meta.task_id.as_deref() == Some(task_id)
            {
                matches.push(meta);
            }
        }
        Ok(matches)
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn sessions_dir(workspace: &Path) -> PathBuf {
    workspace.join("sessions")
}
