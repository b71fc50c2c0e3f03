//! Benchmark Runner, per-task workspace lifecycle, and Baseline Store +
//! Comparator (spec §4.H, §4.I).

mod baseline;
mod directive;
mod error;
mod runner;
mod workspace;

pub use baseline::{
    compare, compare_or_create_baseline, record_from_results, update_baseline_if_improved, BaselineStore,
};
pub use directive::{directive_command, run_directive_verification};
pub use error::{Error, Result};
pub use runner::{run_suite, RunnerConfig};
pub use workspace::{materialize_workspace, run_setup_commands};
