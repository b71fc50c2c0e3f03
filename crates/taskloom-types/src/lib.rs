mod baseline;
mod error;
mod hud;
mod outcome;
mod session;
mod step;
mod suite;
mod trajectory;

pub use baseline::{
    BaselineComparison, BaselineRecord, RegressionAlert, RegressionSeverity, TaskDelta,
    TaskStatus, Verdict,
};
pub use error::{Error, Result};
pub use hud::{
    HudMessage, OutputStream, ProjectedStep, RunSummary, TaskCompleteSummary, TaskPhase,
};
pub use outcome::{BenchResults, BenchResultsMeta, TaskOutcome, TaskRunResult};
pub use session::{SessionEntry, SessionOutcome, UsageStats};
pub use step::{
    Metrics, Observation, ObservationResult, Source, Step, ToolCall,
};
pub use suite::{Suite, Task, VerificationDirective};
pub use trajectory::{
    ActiveTrajectoryState, AgentDescriptor, FinalMetrics, SubagentRef, Trajectory,
};
