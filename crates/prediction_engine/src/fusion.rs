use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{OutcomeProbs, RatingBreakdown};
use crate::simulator::SimulationResult;

/// Allowed slack when checking a manual override sums to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-4;

const HANDICAP_WIN_SHIFT: f64 = 0.07;
const HANDICAP_DRAW_SHIFT: f64 = 0.02;
const HANDICAP_LOSE_SHIFT: f64 = 0.05;
const HANDICAP_FLOOR: f64 = 0.01;
const HANDICAP_DRAW_CAP: f64 = 0.5;

#[derive(Debug, Error, PartialEq)]
pub enum WeightsError {
    #[error("weight {0} must be a finite number")]
    NotFinite(&'static str),
    #[error("weights must sum to 1 (got {0:.4})")]
    BadSum(f64),
}

/// Blend coefficients for the rating, strength and simulation models.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleWeights {
    pub elo: f64,
    pub bt: f64,
    pub mc: f64,
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self {
            elo: 0.35,
            bt: 0.30,
            mc: 0.35,
        }
    }
}

impl EnsembleWeights {
    /// Checked constructor for operator overrides.
    pub fn manual(elo: f64, bt: f64, mc: f64) -> Result<Self, WeightsError> {
        for (name, value) in [("elo", elo), ("bt", bt), ("mc", mc)] {
            if !value.is_finite() {
                return Err(WeightsError::NotFinite(name));
            }
        }
        let sum = elo + bt + mc;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(WeightsError::BadSum(sum));
        }
        Ok(Self { elo, bt, mc })
    }

    pub fn sum(&self) -> f64 {
        self.elo + self.bt + self.mc
    }
}

/// Blended outcome plus the fixed handicap offsets.
///
/// The handicap fields are shifted independently and do not sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FusedProbabilities {
    pub win: f64,
    pub draw: f64,
    pub lose: f64,
    pub handicap_win: f64,
    pub handicap_draw: f64,
    pub handicap_lose: f64,
}

impl FusedProbabilities {
    pub fn outcome(&self) -> OutcomeProbs {
        OutcomeProbs {
            win: self.win,
            draw: self.draw,
            lose: self.lose,
        }
    }
}

pub fn fuse(
    weights: &EnsembleWeights,
    rating: &OutcomeProbs,
    strength: &OutcomeProbs,
    simulated: &OutcomeProbs,
) -> FusedProbabilities {
    let win = weights.elo * rating.win + weights.bt * strength.win + weights.mc * simulated.win;
    let draw = weights.elo * rating.draw + weights.bt * strength.draw + weights.mc * simulated.draw;
    let lose = 1.0 - win - draw;

    FusedProbabilities {
        win,
        draw,
        lose,
        handicap_win: (win - HANDICAP_WIN_SHIFT).max(HANDICAP_FLOOR),
        handicap_draw: (draw + HANDICAP_DRAW_SHIFT).min(HANDICAP_DRAW_CAP),
        handicap_lose: (lose + HANDICAP_LOSE_SHIFT).max(HANDICAP_FLOOR),
    }
}

/// One-sentence explanation of a prediction.
pub fn rationale(
    home: &str,
    away: &str,
    rating: &RatingBreakdown,
    strength: &OutcomeProbs,
    simulation: &SimulationResult,
    fused: &FusedProbabilities,
) -> String {
    let favoured = if fused.win >= fused.draw && fused.win >= fused.lose {
        home
    } else {
        away
    };
    format!(
        "Rating diff {:.0}, strength model home win {:.1}%, {} simulations give home/draw/away {:.1}%/{:.1}%/{:.1}%; lean: {} unbeaten.",
        rating.diff,
        strength.win * 100.0,
        simulation.trials,
        simulation.outcomes.win * 100.0,
        simulation.outcomes.draw * 100.0,
        simulation.outcomes.lose * 100.0,
        favoured,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{rating_model, strength_model};
    use crate::simulator::GoalSimulator;
    use crate::team::TeamRegistry;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn probs(win: f64, draw: f64, lose: f64) -> OutcomeProbs {
        OutcomeProbs { win, draw, lose }
    }

    #[test]
    fn manual_weights_are_checked() {
        assert!(EnsembleWeights::manual(0.4, 0.3, 0.3).is_ok());
        assert!(EnsembleWeights::manual(0.33333, 0.33333, 0.33334).is_ok());
        assert!(matches!(
            EnsembleWeights::manual(0.5, 0.3, 0.3),
            Err(WeightsError::BadSum(s)) if (s - 1.1).abs() < 1e-9
        ));
        assert_eq!(
            EnsembleWeights::manual(f64::NAN, 0.5, 0.5),
            Err(WeightsError::NotFinite("elo"))
        );
        assert_eq!(
            EnsembleWeights::manual(0.5, 0.5, f64::INFINITY),
            Err(WeightsError::NotFinite("mc"))
        );
    }

    #[test]
    fn fused_outcome_sums_to_one() {
        let cases = [
            (EnsembleWeights::default(), probs(0.7, 0.24, 0.06), probs(0.55, 0.22, 0.23), probs(0.5, 0.25, 0.25)),
            (EnsembleWeights { elo: 1.0, bt: 0.0, mc: 0.0 }, probs(0.99, 0.24, 0.01), probs(0.5, 0.22, 0.28), probs(0.1, 0.1, 0.8)),
            (EnsembleWeights { elo: 0.2, bt: 0.2, mc: 0.6 }, probs(0.3, 0.24, 0.46), probs(0.4, 0.22, 0.38), probs(0.0, 0.0, 1.0)),
        ];
        for (w, r, s, m) in cases {
            let f = fuse(&w, &r, &s, &m);
            assert!((f.win + f.draw + f.lose - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn handicap_offsets_are_fixed_and_clamped() {
        let w = EnsembleWeights { elo: 0.0, bt: 0.0, mc: 1.0 };
        let f = fuse(&w, &probs(0.0, 0.0, 0.0), &probs(0.0, 0.0, 0.0), &probs(0.5, 0.3, 0.2));
        assert!((f.handicap_win - 0.43).abs() < 1e-12);
        assert!((f.handicap_draw - 0.32).abs() < 1e-12);
        assert!((f.handicap_lose - 0.25).abs() < 1e-12);

        let f = fuse(&w, &probs(0.0, 0.0, 0.0), &probs(0.0, 0.0, 0.0), &probs(0.03, 0.49, 0.48));
        assert_eq!(f.handicap_win, HANDICAP_FLOOR);
        assert_eq!(f.handicap_draw, HANDICAP_DRAW_CAP);
    }

    #[test]
    fn rationale_names_favoured_side() {
        let registry = TeamRegistry::new();
        let home = registry.get_or_create("皇马", "西甲");
        let away = registry.get_or_create("马竞", "西甲");
        let rating = rating_model(&home, &away);
        let strength = strength_model(&home, &away);
        let sim = GoalSimulator::new(500).run_with_rng(&home, &away, &mut StdRng::seed_from_u64(5));

        let home_lean = FusedProbabilities {
            win: 0.5, draw: 0.3, lose: 0.2,
            handicap_win: 0.43, handicap_draw: 0.32, handicap_lose: 0.25,
        };
        let text = rationale("皇马", "马竞", &rating, &strength, &sim, &home_lean);
        assert!(text.starts_with("Rating diff 101,"));
        assert!(text.contains("500 simulations"));
        assert!(text.ends_with("lean: 皇马 unbeaten."));

        let away_lean = FusedProbabilities { win: 0.2, lose: 0.5, ..home_lean };
        let text = rationale("皇马", "马竞", &rating, &strength, &sim, &away_lean);
        assert!(text.ends_with("lean: 马竞 unbeaten."));
    }
}
