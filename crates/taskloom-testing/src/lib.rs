//! Testing infrastructure shared across the taskloom workspace.
//!
//! - [`TestWorld`]: fluent interface for declarative test setup.
//! - `fixtures`: sample Suites/Tasks for exercising the benchmark runner.
//! - `fmclient`: a scripted fake [`taskloom_engine::FmClient`].

pub mod fixtures;
pub mod fmclient;
pub mod world;

pub use fmclient::ScriptedFmClient;
pub use world::{CliResult, TestWorld, TestWorldBuilder};
