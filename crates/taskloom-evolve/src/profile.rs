//! A tunable bundle of orchestrator defaults (spec SPEC_FULL "taskloom-evolve").

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// The knobs an evolutionary run is free to mutate. Mirrors
/// `taskloom-runtime::config::OrchestratorDefaults` rather than depending on
/// that crate — the contract here is data-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub max_verify_retries: u32,
    pub max_turns: u32,
    pub timeout_secs: u64,
}

impl Profile {
    pub fn baseline(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            max_verify_retries: 2,
            max_turns: 300,
            timeout_secs: 3600,
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("profile.json");
        let mut profile = Profile::baseline("seed");
        profile.max_turns = 150;
        profile.save_to(&path).unwrap();

        let loaded = Profile::load_from(&path).unwrap();
        assert_eq!(loaded, profile);
    }
}
