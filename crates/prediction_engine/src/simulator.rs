//! Monte Carlo goal simulation.
//!
//! Each trial draws home and away goals from independent Poisson
//! distributions. Rates come from attack × opposing defense, shifted by the
//! form gap, with a fixed additive home bonus.

use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;

use crate::models::OutcomeProbs;
use crate::team::TeamProfile;

pub const DEFAULT_TRIALS: usize = 5000;
pub const MIN_LAMBDA: f64 = 0.2;
const HOME_GOAL_BONUS: f64 = 0.23;
const HOME_FORM_WEIGHT: f64 = 0.5;
const AWAY_FORM_WEIGHT: f64 = 0.35;
const TOP_SCORES: usize = 3;

pub const GOAL_BUCKETS: [&str; 3] = ["0-1", "2-3", "4+"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalRangeProb {
    pub range: &'static str,
    pub prob: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreProb {
    /// `"{home}-{away}"`
    pub score: String,
    pub prob: f64,
}

/// Raw counts behind the rates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationTally {
    pub win: usize,
    pub draw: usize,
    pub lose: usize,
    pub goal_buckets: [usize; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub trials: usize,
    pub lambda_home: f64,
    pub lambda_away: f64,
    pub outcomes: OutcomeProbs,
    pub goals_range: Vec<GoalRangeProb>,
    pub top_scores: Vec<ScoreProb>,
    #[serde(skip)]
    pub tally: SimulationTally,
}

/// Poisson rates for (home, away), each floored at [`MIN_LAMBDA`].
pub fn goal_rates(home: &TeamProfile, away: &TeamProfile) -> (f64, f64) {
    let lambda_home = home.attack * away.defense
        + HOME_GOAL_BONUS
        + (home.form - away.form) * HOME_FORM_WEIGHT;
    let lambda_away = away.attack * home.defense + (away.form - home.form) * AWAY_FORM_WEIGHT;
    (lambda_home.max(MIN_LAMBDA), lambda_away.max(MIN_LAMBDA))
}

/// Multiplicative Poisson sampler: multiply uniforms until the product drops
/// to `e^-λ`, return the number of multiplications minus one.
pub fn poisson_sample<R: Rng + ?Sized>(lambda: f64, rng: &mut R) -> u32 {
    let limit = (-lambda).exp();
    let mut product = 1.0;
    let mut k = 0u32;
    loop {
        k += 1;
        product *= rng.gen::<f64>();
        if product <= limit {
            return k - 1;
        }
    }
}

fn goal_bucket(total: u32) -> usize {
    match total {
        0 | 1 => 0,
        2 | 3 => 1,
        _ => 2,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GoalSimulator {
    trials: usize,
}

impl Default for GoalSimulator {
    fn default() -> Self {
        Self::new(DEFAULT_TRIALS)
    }
}

impl GoalSimulator {
    /// A trial count of zero is bumped to one.
    pub fn new(trials: usize) -> Self {
        Self {
            trials: trials.max(1),
        }
    }

    pub fn trials(&self) -> usize {
        self.trials
    }

    pub fn run(&self, home: &TeamProfile, away: &TeamProfile) -> SimulationResult {
        self.run_with_rng(home, away, &mut rand::thread_rng())
    }

    pub fn run_with_rng<R: Rng + ?Sized>(
        &self,
        home: &TeamProfile,
        away: &TeamProfile,
        rng: &mut R,
    ) -> SimulationResult {
        let (lambda_home, lambda_away) = goal_rates(home, away);
        let mut tally = SimulationTally::default();
        // (score, count) in first-seen order; the index map points into it.
        let mut scores: Vec<(String, usize)> = Vec::new();
        let mut score_index: HashMap<(u32, u32), usize> = HashMap::new();

        for _ in 0..self.trials {
            let hg = poisson_sample(lambda_home, rng);
            let ag = poisson_sample(lambda_away, rng);

            match hg.cmp(&ag) {
                std::cmp::Ordering::Greater => tally.win += 1,
                std::cmp::Ordering::Equal => tally.draw += 1,
                std::cmp::Ordering::Less => tally.lose += 1,
            }
            tally.goal_buckets[goal_bucket(hg + ag)] += 1;

            let slot = *score_index.entry((hg, ag)).or_insert_with(|| {
                scores.push((format!("{hg}-{ag}"), 0));
                scores.len() - 1
            });
            scores[slot].1 += 1;
        }

        let n = self.trials as f64;
        // Stable sort keeps first-seen order among equal counts.
        scores.sort_by(|a, b| b.1.cmp(&a.1));

        SimulationResult {
            trials: self.trials,
            lambda_home,
            lambda_away,
            outcomes: OutcomeProbs {
                win: tally.win as f64 / n,
                draw: tally.draw as f64 / n,
                lose: tally.lose as f64 / n,
            },
            goals_range: GOAL_BUCKETS
                .into_iter()
                .zip(tally.goal_buckets)
                .map(|(range, count)| GoalRangeProb {
                    range,
                    prob: count as f64 / n,
                })
                .collect(),
            top_scores: scores
                .into_iter()
                .take(TOP_SCORES)
                .map(|(score, count)| ScoreProb {
                    score,
                    prob: count as f64 / n,
                })
                .collect(),
            tally,
        }
    }
}
