use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Terminal outcome of a Session Log chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    Success,
    Failure,
    Blocked,
    Cancelled,
}

/// Token usage as reported alongside an assistant message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct UsageStats {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub cached_tokens: u64,
}

impl UsageStats {
    pub fn accumulate(&mut self, other: &UsageStats) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.cached_tokens += other.cached_tokens;
    }
}

/// One entry in a Session Log's linked chain (spec §3/§4.G/§6).
///
/// Every entry carries a fresh UUID and a `parent_uuid` pointing at the
/// previous entry in the chain; the chain must start with exactly one
/// `SessionStart` and end with at most one `SessionEnd`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEntry {
    SessionStart {
        uuid: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        parent_uuid: Option<String>,
        timestamp: String,
        cwd: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        provider: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        git_branch: Option<String>,
        version: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
    },
    User {
        uuid: String,
        parent_uuid: String,
        timestamp: String,
        content: Value,
    },
    Assistant {
        uuid: String,
        parent_uuid: String,
        timestamp: String,
        content: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        usage: Option<UsageStats>,
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        stop_reason: Option<String>,
    },
    ToolResult {
        uuid: String,
        parent_uuid: String,
        timestamp: String,
        tool_use_id: String,
        content: Value,
        #[serde(default)]
        is_error: bool,
    },
    SessionEnd {
        uuid: String,
        parent_uuid: String,
        timestamp: String,
        outcome: SessionOutcome,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        total_turns: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        usage: Option<UsageStats>,
        #[serde(default)]
        files_modified: Vec<String>,
        #[serde(default)]
        commits: Vec<String>,
    },
}

impl SessionEntry {
    pub fn uuid(&self) -> &str {
        match self {
            SessionEntry::SessionStart { uuid, .. }
            | SessionEntry::User { uuid, .. }
            | SessionEntry::Assistant { uuid, .. }
            | SessionEntry::ToolResult { uuid, .. }
            | SessionEntry::SessionEnd { uuid, .. } => uuid,
        }
    }

    pub fn parent_uuid(&self) -> Option<&str> {
        match self {
            SessionEntry::SessionStart { parent_uuid, .. } => parent_uuid.as_deref(),
            SessionEntry::User { parent_uuid, .. }
            | SessionEntry::Assistant { parent_uuid, .. }
            | SessionEntry::ToolResult { parent_uuid, .. }
            | SessionEntry::SessionEnd { parent_uuid, .. } => Some(parent_uuid),
        }
    }

    pub fn is_session_start(&self) -> bool {
        matches!(self, SessionEntry::SessionStart { .. })
    }

    pub fn is_session_end(&self) -> bool {
        matches!(self, SessionEntry::SessionEnd { .. })
    }
}
