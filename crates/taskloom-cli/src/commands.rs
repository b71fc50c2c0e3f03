//! Command dispatch (spec §6 CLI surface). Each arm resolves its
//! dependencies, calls straight into the library crates, and prints a
//! plain-text or JSON rendering of the result — no TUI/dashboard layer,
//! per spec's Non-goals.

use std::time::Duration;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use uuid::Uuid;

use taskloom_bench::{compare, record_from_results, run_suite, BaselineStore, RunnerConfig};
use taskloom_evolve::{Fitness, Mutate, NudgeOneKnob, PassRateFitness, Profile};
use taskloom_runtime::{sessions_dir, Config, SessionLog};
use taskloom_types::Suite;

use crate::args::{BaselineCommand, BenchCommand, ConfigCommand, EvolveCommand, OutputFormat, SessionCommand};
use crate::fmclient;

pub async fn dispatch(
    command: crate::args::Commands,
    data_dir: &std::path::Path,
    format: OutputFormat,
) -> Result<i32> {
    use crate::args::Commands;

    match command {
        Commands::Bench { command } => bench(command, format).await,
        Commands::Config { command } => {
            config(command, format)?;
            Ok(0)
        }
        Commands::Session { command } => {
            session(command, data_dir, format)?;
            Ok(0)
        }
        Commands::Baseline { command } => {
            baseline(command, format)?;
            Ok(0)
        }
        Commands::Evolve { command } => {
            evolve(command, format)?;
            Ok(0)
        }
    }
}

async fn bench(command: BenchCommand, format: OutputFormat) -> Result<i32> {
    let BenchCommand::Run {
        suite,
        output,
        tasks,
        baseline,
        model,
        timeout,
        max_turns,
        parallel,
        run_id,
        hud_url,
    } = command;

    if parallel > 1 {
        tracing::warn!(parallel, "--parallel is accepted but cross-task concurrency is out of scope; running sequentially");
    }
    if let Some(url) = &hud_url {
        tracing::info!(hud_url = %url, "HUD forwarding is not wired to a live transport in this CLI; messages are emitted in-process only");
    }

    let suite_content = std::fs::read_to_string(&suite)
        .with_context(|| format!("reading suite file {}", suite.display()))?;
    let suite: Suite = serde_json::from_str(&suite_content).context("parsing suite JSON")?;

    let client = fmclient::resolve(&model);
    let run_id = run_id.unwrap_or_else(|| Uuid::new_v4().to_string());

    let config = RunnerConfig {
        suite: &suite,
        task_ids: &tasks,
        output_dir: output.clone(),
        model: model.clone(),
        run_id,
        default_timeout: Duration::from_secs(timeout),
        default_max_turns: max_turns,
        hud_enabled: false,
    };

    let results = run_suite(&client, &config).await.context("running suite")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Plain => print_results_plain(&results),
    }

    if let Some(baseline_path) = baseline {
        if baseline_path.exists() {
            let content = std::fs::read_to_string(&baseline_path)
                .with_context(|| format!("reading baseline file {}", baseline_path.display()))?;
            let prior_results: taskloom_types::BenchResults =
                serde_json::from_str(&content).context("parsing prior results.json")?;
            let baseline_record = record_from_results(
                prior_results.meta.run_id.clone(),
                suite.name.clone(),
                suite.version.clone(),
                &prior_results,
            );
            let comparison = compare(&results, &baseline_record);
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&comparison)?),
                OutputFormat::Plain => print_comparison_plain(&comparison),
            }
        } else {
            tracing::warn!(path = %baseline_path.display(), "baseline file does not exist, skipping comparison");
        }
    }

    let any_non_pass = results.summary.passed as usize != results.tasks.len();
    Ok(if any_non_pass { 1 } else { 0 })
}

fn print_results_plain(results: &taskloom_types::BenchResults) {
    println!("{} {}", "run".bold(), results.meta.run_id);
    for task in &results.tasks {
        let label = format!("{:?}", task.outcome).to_lowercase();
        println!("  {:<24} {}", task.task_id, label);
    }
    println!(
        "{} {}/{} passed ({:.1}%)",
        "summary".bold(),
        results.summary.passed,
        results.tasks.len(),
        results.summary.pass_rate * 100.0
    );
}

fn print_comparison_plain(comparison: &taskloom_types::BaselineComparison) {
    println!("{:?} (pass rate delta: {:+.1}%)", comparison.verdict, comparison.pass_rate_delta_percent);
    for delta in &comparison.deltas {
        if delta.changed {
            println!("  {:<24} {} -> {:?}", delta.task_id, delta.baseline_status, delta.current_status);
        }
    }
    if let Some(alert) = &comparison.regression_alert {
        println!("{:?} regression: {}", alert.severity, alert.affected_tasks.join(", "));
    }
}

fn config(command: ConfigCommand, format: OutputFormat) -> Result<()> {
    let ConfigCommand::Show = command;
    let path = taskloom_runtime::resolve_workspace_path(None)?;
    let cfg = Config::load()?;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({
                "workspace_path": path,
                "config": cfg,
            }))?);
        }
        OutputFormat::Plain => {
            println!("{} {}", "workspace".bold(), path.display());
            println!("  max_verify_retries = {}", cfg.orchestrator.max_verify_retries);
            println!("  max_turns          = {}", cfg.orchestrator.max_turns);
            println!("  timeout_secs       = {}", cfg.orchestrator.timeout_secs);
            println!("  model              = {}", cfg.bench.model);
        }
    }
    Ok(())
}

fn session(command: SessionCommand, data_dir: &std::path::Path, format: OutputFormat) -> Result<()> {
    let log = SessionLog::new(sessions_dir(data_dir));

    match command {
        SessionCommand::Show { session_id } => {
            let entries = log.load_session(&session_id)?;
            let meta = log
                .get_session_metadata(&session_id)?
                .with_context(|| format!("session {session_id} not found"))?;
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({ "metadata": meta_json(&meta), "entries": entries }))?
                ),
                OutputFormat::Plain => {
                    println!("{} {}", "session".bold(), meta.session_id);
                    println!("  started_at = {}", meta.started_at);
                    println!("  turns      = {}", meta.total_turns);
                    println!("  entries    = {}", entries.len());
                }
            }
        }
        SessionCommand::List { limit } => {
            let ids = log.list_sessions()?;
            for id in ids.into_iter().take(limit) {
                println!("{id}");
            }
        }
        SessionCommand::Search { term } => {
            let matches = log.search_sessions(&term)?;
            match format {
                OutputFormat::Json => {
                    let rendered: Vec<_> = matches.iter().map(meta_json).collect();
                    println!("{}", serde_json::to_string_pretty(&rendered)?);
                }
                OutputFormat::Plain => {
                    for meta in &matches {
                        println!("{}", meta.session_id);
                    }
                }
            }
        }
    }
    Ok(())
}

fn meta_json(meta: &taskloom_runtime::SessionMetadata) -> serde_json::Value {
    serde_json::json!({
        "session_id": meta.session_id,
        "task_id": meta.task_id,
        "started_at": meta.started_at,
        "ended_at": meta.ended_at,
        "total_turns": meta.total_turns,
    })
}

fn baseline(command: BaselineCommand, format: OutputFormat) -> Result<()> {
    match command {
        BaselineCommand::Show { path, model, suite } => {
            let store = BaselineStore::new(path);
            let record = store
                .get_baseline(&model, suite.as_deref())?
                .with_context(|| format!("no baseline found for model {model}"))?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
                OutputFormat::Plain => print_baseline_record_plain(&record),
            }
            Ok(())
        }
        BaselineCommand::History { path, model, suite, limit } => {
            let store = BaselineStore::new(path);
            let records = store.get_history(model.as_deref(), suite.as_deref(), limit)?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
                OutputFormat::Plain => records.iter().for_each(print_baseline_record_plain),
            }
            Ok(())
        }
        BaselineCommand::Clear { path } => {
            let store = BaselineStore::new(path);
            store.clear()?;
            println!("cleared");
            Ok(())
        }
    }
}

fn print_baseline_record_plain(record: &taskloom_types::BaselineRecord) {
    println!(
        "{:<24} {} {}/{} ({:.1}%)  {}",
        record.id,
        record.model,
        record.passed,
        record.total,
        record.pass_rate * 100.0,
        record.timestamp
    );
}

fn evolve(command: EvolveCommand, format: OutputFormat) -> Result<()> {
    match command {
        EvolveCommand::Propose { profile, seed, out } => {
            let base = Profile::load_from(&profile)?;
            let candidate = NudgeOneKnob.mutate(&base, seed);
            candidate.save_to(&out)?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&candidate)?),
                OutputFormat::Plain => println!(
                    "{} -> {} (max_verify_retries={}, max_turns={}, timeout_secs={})",
                    base.id, candidate.id, candidate.max_verify_retries, candidate.max_turns, candidate.timeout_secs
                ),
            }
            Ok(())
        }
        EvolveCommand::Record {
            profile,
            candidate,
            results,
            best_score,
        } => {
            let candidate_profile = Profile::load_from(&candidate)?;
            let results_content = std::fs::read_to_string(&results)
                .with_context(|| format!("reading results file {}", results.display()))?;
            let results: taskloom_types::BenchResults =
                serde_json::from_str(&results_content).context("parsing results JSON")?;

            let score = PassRateFitness.score(&results);
            let accepted = score > best_score;
            if accepted {
                candidate_profile.save_to(&profile)?;
            }

            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "score": score,
                        "best_score": best_score,
                        "accepted": accepted,
                    }))?
                ),
                OutputFormat::Plain => println!(
                    "score {score:.3} vs best {best_score:.3} -> {}",
                    if accepted { "accepted" } else { "rejected" }
                ),
            }
            Ok(())
        }
    }
}
