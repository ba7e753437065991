use serde::Serialize;

use crate::team::TeamProfile;

/// Home side's rating bonus before the logistic.
pub const HOME_ADVANTAGE_ELO: f64 = 50.0;
pub const ELO_SCALE: f64 = 120.0;
pub const RATING_DRAW: f64 = 0.24;
pub const STRENGTH_DRAW: f64 = 0.22;
const MIN_LOSE: f64 = 0.01;

/// Win/draw/lose from the home side's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutcomeProbs {
    pub win: f64,
    pub draw: f64,
    pub lose: f64,
}

impl OutcomeProbs {
    /// Fixed draw share; lose takes the remainder, floored.
    fn with_fixed_draw(win: f64, draw: f64) -> Self {
        Self {
            win,
            draw,
            lose: (1.0 - win - draw).max(MIN_LOSE),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingBreakdown {
    pub home: f64,
    pub away: f64,
    /// Rating difference including the home bonus.
    pub diff: f64,
    #[serde(flatten)]
    pub probs: OutcomeProbs,
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Logistic model over the rating difference.
pub fn rating_model(home: &TeamProfile, away: &TeamProfile) -> RatingBreakdown {
    let diff = home.elo - away.elo + HOME_ADVANTAGE_ELO;
    RatingBreakdown {
        home: home.elo,
        away: away.elo,
        diff,
        probs: OutcomeProbs::with_fixed_draw(logistic(diff / ELO_SCALE), RATING_DRAW),
    }
}

/// Ratio model over comparative strength.
pub fn strength_model(home: &TeamProfile, away: &TeamProfile) -> OutcomeProbs {
    let win = home.strength / (home.strength + away.strength);
    OutcomeProbs::with_fixed_draw(win, STRENGTH_DRAW)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::team::TeamRegistry;

    fn pair(home: &str, away: &str) -> (TeamProfile, TeamProfile) {
        let registry = TeamRegistry::new();
        (registry.get_or_create(home, ""), registry.get_or_create(away, ""))
    }

    #[test]
    fn equal_teams_favour_home_through_bonus() {
        let team = TeamProfile::synthetic("米兰", "意甲");
        let r = rating_model(&team, &team);
        assert_eq!(r.diff, HOME_ADVANTAGE_ELO);
        assert!((r.probs.win - logistic(50.0 / 120.0)).abs() < 1e-12);
        assert_eq!(r.probs.draw, RATING_DRAW);
        assert!((r.probs.win + r.probs.draw + r.probs.lose - 1.0).abs() < 1e-12);

        let s = strength_model(&team, &team);
        assert!((s.win - 0.5).abs() < 1e-12);
        assert!((s.lose - 0.28).abs() < 1e-12);
    }

    #[test]
    fn curated_pair_matches_hand_computation() {
        let (home, away) = pair("阿森纳", "切尔西");
        let r = rating_model(&home, &away);
        assert_eq!(r.diff, 1685.0 - 1602.0 + 50.0);
        assert!(r.probs.win > 0.75 && r.probs.win < 0.76);

        let s = strength_model(&home, &away);
        assert!((s.win - 1.18 / 2.2).abs() < 1e-12);
    }

    #[test]
    fn lose_is_floored() {
        let mut strong = TeamProfile::synthetic("强队", "英超");
        let weak = TeamProfile::synthetic("弱队", "英超");
        strong.elo = 2400.0;
        strong.strength = 50.0;

        assert_eq!(rating_model(&strong, &weak).probs.lose, 0.01);
        assert_eq!(strength_model(&strong, &weak).lose, 0.01);
    }

    #[test]
    fn breakdown_serializes_flat() {
        let (home, away) = pair("皇马", "马竞");
        let json = serde_json::to_value(rating_model(&home, &away)).unwrap();
        assert_eq!(json["home"], 1711.0);
        assert_eq!(json["draw"], RATING_DRAW);
        assert!(json.get("probs").is_none());
    }
}
