// Namespaced subcommands (bench, session, baseline, config, evolve) rather
// than a flat command list — keeps `--help` readable as the surface grows
// and groups operations the way `session show` vs `session list` reads.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "taskloom")]
#[command(about = "Run micro-task benchmark suites against small foundation models", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(long, default_value = "~/.taskloom", global = true)]
    pub data_dir: String,

    #[arg(long, default_value = "plain", global = true)]
    pub format: OutputFormat,

    #[arg(long, default_value = "info", global = true, env = "TASKLOOM_LOG")]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run a benchmark suite against a model")]
    Bench {
        #[command(subcommand)]
        command: BenchCommand,
    },

    #[command(about = "Inspect the resolved configuration")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    #[command(about = "Inspect the Session Log (spec 4.G)")]
    Session {
        #[command(subcommand)]
        command: SessionCommand,
    },

    #[command(about = "Inspect and manage baselines (spec 4.I)")]
    Baseline {
        #[command(subcommand)]
        command: BaselineCommand,
    },

    #[command(about = "Exercise the evolutionary profile-tuner contract")]
    Evolve {
        #[command(subcommand)]
        command: EvolveCommand,
    },
}

#[derive(Subcommand)]
pub enum BenchCommand {
    #[command(
        about = "Run every (or selected) task in a suite",
        after_long_help = "EXAMPLES:
  taskloom bench run --suite suite.json --output ./runs/r1
  taskloom bench run --suite suite.json --output ./runs/r2 --tasks t1,t2 --baseline ./runs/r1/results.json
  taskloom bench run --suite suite.json --output ./runs/r3 --model ollama:qwen2.5-coder"
    )]
    Run {
        #[arg(long, help = "Path to the suite JSON file")]
        suite: PathBuf,

        #[arg(long, help = "Directory to write per-task workspaces and results.json into")]
        output: PathBuf,

        #[arg(long, value_delimiter = ',', help = "Comma-separated task-id allow-list (default: every task)")]
        tasks: Vec<String>,

        #[arg(long, help = "Prior results.json to compare against after the run")]
        baseline: Option<PathBuf>,

        #[arg(long, default_value = "claude-code", help = "claude-code | fm | foundation-models | ollama:<model>")]
        model: String,

        #[arg(long, default_value_t = 3600, help = "Default per-task timeout in seconds")]
        timeout: u64,

        #[arg(long, default_value_t = 300, help = "Default per-task max turns")]
        max_turns: u32,

        #[arg(long, default_value_t = 1, help = "Accepted but out-of-scope: cross-task concurrency")]
        parallel: u32,

        #[arg(long, help = "Run identifier (defaults to a generated UUID)")]
        run_id: Option<String>,

        #[arg(long, help = "Forward live progress to a HUD at this URL (accepted; delivery is fire-and-forget)")]
        hud_url: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Print the resolved workspace path and loaded configuration")]
    Show,
}

#[derive(Subcommand)]
pub enum SessionCommand {
    #[command(about = "Show one session's metadata and full entry chain")]
    Show {
        #[arg(help = "Session ID")]
        session_id: String,
    },

    #[command(about = "List known sessions, most recent first")]
    List {
        #[arg(long, default_value_t = 10, help = "Maximum number of sessions to show")]
        limit: usize,
    },

    #[command(about = "Search session user/assistant text for a substring")]
    Search {
        #[arg(help = "Case-insensitive substring to search for")]
        term: String,
    },
}

#[derive(Subcommand)]
pub enum BaselineCommand {
    #[command(about = "Show the most recent baseline for a model/suite")]
    Show {
        #[arg(long, help = "Path to baselines.jsonl")]
        path: PathBuf,

        #[arg(long)]
        model: String,

        #[arg(long)]
        suite: Option<String>,
    },

    #[command(about = "List baseline history for a model/suite")]
    History {
        #[arg(long, help = "Path to baselines.jsonl")]
        path: PathBuf,

        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        suite: Option<String>,

        #[arg(long)]
        limit: Option<usize>,
    },

    #[command(about = "Truncate a baseline store")]
    Clear {
        #[arg(long, help = "Path to baselines.jsonl")]
        path: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum EvolveCommand {
    #[command(about = "Propose the next mutated profile from a seed/current-best profile")]
    Propose {
        #[arg(long, help = "Path to the current-best profile JSON")]
        profile: PathBuf,

        #[arg(long, help = "Deterministic mutation seed")]
        seed: u64,

        #[arg(long, help = "Where to write the proposed candidate profile")]
        out: PathBuf,
    },

    #[command(about = "Score a candidate's benchmark results against the current best and keep the better one")]
    Record {
        #[arg(long, help = "Path to the current-best profile JSON (overwritten if the candidate wins)")]
        profile: PathBuf,

        #[arg(long, help = "Path to the candidate profile JSON produced by `evolve propose`")]
        candidate: PathBuf,

        #[arg(long, help = "Path to the candidate's results.json")]
        results: PathBuf,

        #[arg(long, help = "The current best's fitness score, tracked by the caller across invocations")]
        best_score: f64,
    },
}
