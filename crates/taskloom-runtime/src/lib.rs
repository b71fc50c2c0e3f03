mod collector;
mod config;
mod error;
mod session_log;
mod storage;
mod writer;

pub use collector::{AgentStepInput, CollectorState, TrajectoryCollector};
pub use config::{resolve_workspace_path, BenchDefaults, Config, OrchestratorDefaults};
pub use error::{Error, Result};
pub use session_log::{sessions_dir, SessionHandle, SessionLog, SessionMetadata};
pub use writer::{
    close_disk_writer, clear_hud_sender, emit_atif_step, emit_hud, hud_is_registered,
    register_disk_writer, set_hud_sender, unregister_disk_writer, write_step_to_disk, DiskWriter,
};
