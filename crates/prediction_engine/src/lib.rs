//! Prediction engine: three outcome models fused with tunable weights
//!
//! Rating (logistic over elo gap), strength (ratio) and a Poisson goal
//! simulation each give home win/draw/lose. The engine blends them, logs the
//! result and retunes the blend after every prediction.

pub mod fusion;
pub mod history;
pub mod models;
pub mod simulator;
pub mod team;

use fixture_scraper::CanonicalFixture;
use logger::{EventLogger, PredictionEvent, WeightsUpdatedEvent};
use parking_lot::{Mutex, RwLock};
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

pub use fusion::{fuse, rationale, EnsembleWeights, FusedProbabilities, WeightsError};
pub use history::{retune, HistoryRecord, HistoryStore, HISTORY_CAPACITY};
pub use models::{rating_model, strength_model, OutcomeProbs, RatingBreakdown};
pub use simulator::{GoalRangeProb, GoalSimulator, ScoreProb, SimulationResult, DEFAULT_TRIALS};
pub use team::{TeamProfile, TeamRegistry};

/// Full prediction payload for one fixture.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    #[serde(rename = "match")]
    pub fixture: CanonicalFixture,
    pub source: String,
    pub elo: RatingBreakdown,
    pub bt: OutcomeProbs,
    /// Simulated win/draw/lose rates.
    pub mc: OutcomeProbs,
    pub probability: FusedProbabilities,
    pub goals_range: Vec<GoalRangeProb>,
    pub top_scores: Vec<ScoreProb>,
    pub lambda_home: f64,
    pub lambda_away: f64,
    pub reason: String,
    pub simulate_count: usize,
    /// Weights in force after this prediction was logged (and retuned).
    pub weights: EnsembleWeights,
}

/// Shared prediction state: team profiles, blend weights and the rolling log.
pub struct PredictionEngine {
    teams: TeamRegistry,
    weights: RwLock<EnsembleWeights>,
    // Lock order: history before weights.
    history: Mutex<HistoryStore>,
    events: Option<Arc<EventLogger>>,
}

impl Default for PredictionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictionEngine {
    pub fn new() -> Self {
        Self {
            teams: TeamRegistry::new(),
            weights: RwLock::new(EnsembleWeights::default()),
            history: Mutex::new(HistoryStore::new()),
            events: None,
        }
    }

    pub fn with_event_log(mut self, events: Arc<EventLogger>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn teams(&self) -> &TeamRegistry {
        &self.teams
    }

    pub fn weights(&self) -> EnsembleWeights {
        *self.weights.read()
    }

    /// Operator override; rejected weights leave the current ones untouched.
    pub fn set_weights(&self, elo: f64, bt: f64, mc: f64) -> Result<EnsembleWeights, WeightsError> {
        let weights = EnsembleWeights::manual(elo, bt, mc)?;
        *self.weights.write() = weights;
        info!("ensemble weights set manually: elo={elo} bt={bt} mc={mc}");
        self.log_weights("manual", &weights);
        Ok(weights)
    }

    /// Newest-first page of the prediction log, plus its total length.
    pub fn history(&self, offset: usize, limit: Option<usize>) -> (Vec<HistoryRecord>, usize) {
        let history = self.history.lock();
        (history.page(offset, limit), history.len())
    }

    pub fn predict(&self, fixture: &CanonicalFixture, trials: usize) -> Prediction {
        self.predict_with_rng(fixture, trials, &mut rand::thread_rng())
    }

    /// Run all three models, blend, append to history and retune.
    pub fn predict_with_rng<R: Rng + ?Sized>(
        &self,
        fixture: &CanonicalFixture,
        trials: usize,
        rng: &mut R,
    ) -> Prediction {
        let home = self.teams.get_or_create(&fixture.home, &fixture.league);
        let away = self.teams.get_or_create(&fixture.away, &fixture.league);

        let rating = rating_model(&home, &away);
        let strength = strength_model(&home, &away);
        let simulation = GoalSimulator::new(trials).run_with_rng(&home, &away, rng);

        let used = self.weights();
        let fused = fuse(&used, &rating.probs, &strength, &simulation.outcomes);
        let reason = rationale(&fixture.home, &fixture.away, &rating, &strength, &simulation, &fused);
        debug!(
            "predicted {} vs {}: win={:.3} draw={:.3} lose={:.3}",
            fixture.home, fixture.away, fused.win, fused.draw, fused.lose
        );

        let weights = {
            let mut history = self.history.lock();
            let id = history.next_id();
            history.append(HistoryRecord {
                id,
                match_id: fixture.id,
                league: fixture.league.clone(),
                home: fixture.home.clone(),
                away: fixture.away.clone(),
                source: fixture.source.clone(),
                prediction: fused.outcome(),
                top_scores: simulation.top_scores.clone(),
                reason: reason.clone(),
                created_at: logger::now_iso(),
            });

            match retune(&history) {
                Some(tuned) => {
                    let mut current = self.weights.write();
                    if *current != tuned {
                        *current = tuned;
                        info!("ensemble weights retuned: elo={} bt={} mc={}", tuned.elo, tuned.bt, tuned.mc);
                        self.log_weights("retune", &tuned);
                    }
                    tuned
                }
                None => *self.weights.read(),
            }
        };

        if let Some(events) = &self.events {
            events.log_or_warn(&PredictionEvent {
                ts: logger::now_iso(),
                event: "PREDICTION",
                fixture_id: fixture.id,
                league: fixture.league.clone(),
                home: fixture.home.clone(),
                away: fixture.away.clone(),
                win: fused.win,
                draw: fused.draw,
                lose: fused.lose,
                weight_elo: used.elo,
                weight_bt: used.bt,
                weight_mc: used.mc,
            });
        }

        Prediction {
            fixture: fixture.clone(),
            source: fixture.source.clone(),
            elo: rating,
            bt: strength,
            mc: simulation.outcomes,
            probability: fused,
            goals_range: simulation.goals_range,
            top_scores: simulation.top_scores,
            lambda_home: simulation.lambda_home,
            lambda_away: simulation.lambda_away,
            reason,
            simulate_count: simulation.trials,
            weights,
        }
    }

    fn log_weights(&self, reason: &str, weights: &EnsembleWeights) {
        if let Some(events) = &self.events {
            events.log_or_warn(&WeightsUpdatedEvent {
                ts: logger::now_iso(),
                event: "WEIGHTS_UPDATED",
                reason: reason.to_string(),
                elo: weights.elo,
                bt: weights.bt,
                mc: weights.mc,
            });
        }
    }
}
