//! Fitness: how good a [`Profile`](crate::Profile)'s benchmark run was.

use taskloom_types::BenchResults;

/// Scores a completed benchmark run. Higher is better; the scale is up to
/// the implementation, only relative ordering matters to [`Generation`](crate::Generation).
pub trait Fitness: Send + Sync {
    fn score(&self, results: &BenchResults) -> f64;
}

/// The default: raw pass rate. Does not account for speed or token cost —
/// exactly the "naive" boundary spec §1 draws around this crate.
pub struct PassRateFitness;

impl Fitness for PassRateFitness {
    fn score(&self, results: &BenchResults) -> f64 {
        results.summary.pass_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskloom_types::{BenchResultsMeta, RunSummary};

    #[test]
    fn pass_rate_fitness_reads_summary_directly() {
        let results = BenchResults {
            meta: BenchResultsMeta {
                run_id: "r".into(),
                model: "small-fm".into(),
                started_at: "2026-07-30T00:00:00Z".into(),
                completed_at: None,
                project_id: None,
            },
            tasks: vec![],
            summary: RunSummary {
                pass_rate: 0.75,
                ..Default::default()
            },
        };
        assert_eq!(PassRateFitness.score(&results), 0.75);
    }
}
