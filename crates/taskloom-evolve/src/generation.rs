//! Generation loop skeleton: propose one mutated candidate, record its
//! benchmark outcome, accept it as the new best if it scores higher
//! (accept-if-better hill climbing — the only search policy this crate
//! implements; see [`crate::mutate`]).

use taskloom_types::BenchResults;

use crate::{Fitness, Mutate, Profile};

pub struct Generation {
    pub index: u32,
    pub current_best: Profile,
    pub best_score: f64,
}

impl Generation {
    pub fn first(seed: Profile) -> Self {
        Self {
            index: 0,
            current_best: seed,
            best_score: f64::NEG_INFINITY,
        }
    }

    /// Produces the next candidate to benchmark. The caller is responsible
    /// for actually running it (through `taskloom-bench`) and feeding the
    /// result back into [`Self::record`].
    pub fn propose(&self, mutate: &dyn Mutate) -> Profile {
        mutate.mutate(&self.current_best, self.index as u64)
    }

    /// Scores `candidate`'s benchmark `results` and, if it beats the
    /// current best, accepts it.
    pub fn record(&mut self, fitness: &dyn Fitness, candidate: Profile, results: &BenchResults) {
        let score = fitness.score(results);
        tracing::info!(
            generation = self.index,
            candidate_id = %candidate.id,
            score,
            best_score = self.best_score,
            "scored candidate profile"
        );
        if score > self.best_score {
            self.current_best = candidate;
            self.best_score = score;
        }
        self.index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NudgeOneKnob, PassRateFitness};
    use taskloom_types::{BenchResultsMeta, RunSummary};

    fn results_with_pass_rate(pass_rate: f64) -> BenchResults {
        BenchResults {
            meta: BenchResultsMeta {
                run_id: "r".into(),
                model: "small-fm".into(),
                started_at: "2026-07-30T00:00:00Z".into(),
                completed_at: None,
                project_id: None,
            },
            tasks: vec![],
            summary: RunSummary {
                pass_rate,
                ..Default::default()
            },
        }
    }

    #[test]
    fn accepts_candidate_only_when_it_scores_higher() {
        let mut generation = Generation::first(Profile::baseline("seed"));
        let candidate = generation.propose(&NudgeOneKnob);
        generation.record(&PassRateFitness, candidate.clone(), &results_with_pass_rate(0.5));
        assert_eq!(generation.current_best, candidate);
        assert_eq!(generation.best_score, 0.5);

        let worse_candidate = generation.propose(&NudgeOneKnob);
        generation.record(&PassRateFitness, worse_candidate, &results_with_pass_rate(0.3));
        assert_eq!(generation.current_best, candidate);
        assert_eq!(generation.best_score, 0.5);

        let better_candidate = generation.propose(&NudgeOneKnob);
        generation.record(&PassRateFitness, better_candidate.clone(), &results_with_pass_rate(0.9));
        assert_eq!(generation.current_best, better_candidate);
        assert_eq!(generation.best_score, 0.9);
    }

    #[test]
    fn index_advances_on_every_record_regardless_of_acceptance() {
        let mut generation = Generation::first(Profile::baseline("seed"));
        let candidate = generation.propose(&NudgeOneKnob);
        generation.record(&PassRateFitness, candidate, &results_with_pass_rate(0.0));
        assert_eq!(generation.index, 1);
    }
}
