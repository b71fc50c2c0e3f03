//! Streaming Writer + HUD fan-out (spec §4.F).
//!
//! Two process-wide singletons: a session-id-keyed map of disk writers, and
//! a single optional HUD sender. Both follow init-once /
//! replace-last-writer-wins semantics (spec §5 "Shared-resource policy");
//! registration and unregistration must be idempotent and safe to interleave
//! with step emission, and every failure here is logged, never propagated to
//! the Collector. Grounded on the thread + mpsc fan-out in the teacher's
//! `runtime/streamer.rs`, adapted from a filesystem-watch source to a
//! push-from-the-collector source.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::{Mutex, OnceLock};

use taskloom_types::{FinalMetrics, HudMessage, ProjectedStep, Step};

/// A single per-session append-only file.
pub struct DiskWriter {
    file: File,
    path: PathBuf,
}

impl DiskWriter {
    pub fn open(dir: &Path, session_id: &str) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{session_id}.jsonl"));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { file, path })
    }

    pub fn write_step(&mut self, step: &Step) -> std::io::Result<()> {
        let line = serde_json::to_string(step)?;
        writeln!(self.file, "{line}")
    }

    pub fn close(&mut self, final_metrics: &FinalMetrics, status: &str) -> std::io::Result<()> {
        let terminator = serde_json::json!({
            "type": "trajectory_end",
            "final_metrics": final_metrics,
            "status": status,
        });
        writeln!(self.file, "{terminator}")?;
        self.file.flush()
    }
}

type DiskWriterRegistry = Mutex<HashMap<String, DiskWriter>>;

fn disk_writers() -> &'static DiskWriterRegistry {
    static REGISTRY: OnceLock<DiskWriterRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Registers (or replaces) the disk writer for `session_id`. Idempotent:
/// calling twice for the same session just opens a fresh handle on the same
/// path.
pub fn register_disk_writer(dir: &Path, session_id: &str) {
    match DiskWriter::open(dir, session_id) {
        Ok(writer) => {
            disk_writers()
                .lock()
                .unwrap()
                .insert(session_id.to_string(), writer);
        }
        Err(err) => {
            tracing::warn!(session_id, %err, "failed to open disk writer");
        }
    }
}

/// Removes the disk writer for `session_id`, if any. Safe to call even if
/// none was registered.
pub fn unregister_disk_writer(session_id: &str) {
    disk_writers().lock().unwrap().remove(session_id);
}

/// Appends `step` to `session_id`'s disk log, if a writer is registered.
/// A silent no-op otherwise.
pub fn write_step_to_disk(session_id: &str, step: &Step) {
    let mut registry = disk_writers().lock().unwrap();
    if let Some(writer) = registry.get_mut(session_id)
        && let Err(err) = writer.write_step(step)
    {
        tracing::warn!(session_id, %err, "failed to persist step");
    }
}

/// Writes the terminator line and drops the writer for `session_id`.
pub fn close_disk_writer(session_id: &str, final_metrics: &FinalMetrics, status: &str) {
    let mut writer = disk_writers().lock().unwrap().remove(session_id);
    if let Some(writer) = writer.as_mut()
        && let Err(err) = writer.close(final_metrics, status)
    {
        tracing::warn!(session_id, %err, "failed to close disk writer");
    }
}

type HudSlot = Mutex<Option<Sender<HudMessage>>>;

fn hud_sender() -> &'static HudSlot {
    static SENDER: OnceLock<HudSlot> = OnceLock::new();
    SENDER.get_or_init(|| Mutex::new(None))
}

/// Registers the global HUD sender, replacing any previous one
/// (replace-last-writer-wins).
pub fn set_hud_sender(sender: Sender<HudMessage>) {
    *hud_sender().lock().unwrap() = Some(sender);
}

/// Unregisters the global HUD sender. A no-op if none was registered.
pub fn clear_hud_sender() {
    *hud_sender().lock().unwrap() = None;
}

pub fn hud_is_registered() -> bool {
    hud_sender().lock().unwrap().is_some()
}

/// Fire-and-forget delivery: a dropped or failed send never propagates.
pub fn emit_hud(message: HudMessage) {
    let guard = hud_sender().lock().unwrap();
    if let Some(sender) = guard.as_ref() {
        let _ = sender.send(message);
    }
}

/// Publishes the phase-1 `atif_step` projection of a just-recorded step.
pub fn emit_atif_step(run_id: &str, session_id: &str, step: &Step) {
    emit_hud(HudMessage::AtifStep {
        run_id: run_id.to_string(),
        session_id: session_id.to_string(),
        step: ProjectedStep::from(step),
    });
}
