// Draft value: blends production, position-relative production and need.

use crate::config::{Thresholds, ValuationWeights};
use crate::rankings::PlayerSeasonRecord;
use crate::valuation::needs::PositionNeeds;

/// Scores candidates for one draft decision.
///
/// value = (ppg + relative_weight * ppg_vs_position_avg)
///         * (1 + need_weight * need)   if the position is needed
///         * unneeded_discount          otherwise
///         * elite_multiplier           if percentile >= elite_percentile
///
/// Scores are comparable within one call's candidate set only; there is no
/// normalization across positions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ValueScorer {
    pub weights: ValuationWeights,
    pub thresholds: Thresholds,
}

impl ValueScorer {
    pub fn new(weights: ValuationWeights, thresholds: Thresholds) -> Self {
        ValueScorer {
            weights,
            thresholds,
        }
    }

    pub fn is_elite(&self, player: &PlayerSeasonRecord) -> bool {
        player.position_percentile >= self.thresholds.elite_percentile
    }

    pub fn score(&self, player: &PlayerSeasonRecord, needs: &PositionNeeds) -> f64 {
        let w = &self.weights;
        let relative = player.ppg_vs_position_avg.unwrap_or(0.0);
        let mut value = player.points_per_game + w.relative_weight * relative;

        let need = needs.get(&player.position);
        if need > 0 {
            value *= 1.0 + w.need_weight * need as f64;
        } else {
            value *= w.unneeded_discount;
        }

        if self.is_elite(player) {
            value *= w.elite_multiplier;
        }

        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::pick::Position;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    fn player(pos: Position, ppg: f64, pct: f64, delta: Option<f64>) -> PlayerSeasonRecord {
        PlayerSeasonRecord {
            name: None,
            position: pos,
            season: 2023,
            games_played: 17,
            fantasy_points: ppg * 17.0,
            points_per_game: ppg,
            position_rank: 1,
            position_percentile: pct,
            ppg_vs_position_avg: delta,
        }
    }

    fn scenario_needs() -> PositionNeeds {
        [(Position::Quarterback, 2), (Position::RunningBack, 4)]
            .into_iter()
            .collect()
    }

    #[test]
    fn needed_non_elite_quarterback() {
        let scorer = ValueScorer::default();
        let qb = player(Position::Quarterback, 20.0, 0.5, Some(0.0));
        // 20 * (1 + 0.2 * 2)
        assert!(approx_eq(scorer.score(&qb, &scenario_needs()), 28.0, 1e-9));
    }

    #[test]
    fn needed_elite_running_back() {
        let scorer = ValueScorer::default();
        let rb = player(Position::RunningBack, 15.0, 0.9, Some(2.0));
        // (15 + 1) * 1.8 * 1.3
        assert!(approx_eq(scorer.score(&rb, &scenario_needs()), 37.44, 1e-9));
    }

    #[test]
    fn unneeded_position_is_discounted() {
        let scorer = ValueScorer::default();
        let te = player(Position::TightEnd, 10.0, 0.5, None);
        assert!(approx_eq(scorer.score(&te, &scenario_needs()), 5.0, 1e-9));
    }

    #[test]
    fn missing_delta_counts_as_zero() {
        let scorer = ValueScorer::default();
        let with = player(Position::Quarterback, 20.0, 0.5, Some(0.0));
        let without = player(Position::Quarterback, 20.0, 0.5, None);
        let needs = scenario_needs();
        assert_eq!(scorer.score(&with, &needs), scorer.score(&without, &needs));
    }

    #[test]
    fn elite_multiplier_applies_exactly_at_threshold() {
        let scorer = ValueScorer::default();
        let needs = scenario_needs();
        let below = player(Position::Quarterback, 18.0, 0.79, Some(1.0));
        let at = player(Position::Quarterback, 18.0, 0.8, Some(1.0));
        let ratio = scorer.score(&at, &needs) / scorer.score(&below, &needs);
        assert!(approx_eq(ratio, 1.3, 1e-12));
    }

    #[test]
    fn tuned_weights_change_the_score() {
        let weights = ValuationWeights {
            relative_weight: 1.0,
            need_weight: 0.0,
            unneeded_discount: 1.0,
            elite_multiplier: 2.0,
        };
        let thresholds = Thresholds {
            elite_percentile: 0.95,
            scarcity_threshold: 1.5,
        };
        let scorer = ValueScorer::new(weights, thresholds);
        let rb = player(Position::RunningBack, 15.0, 0.9, Some(2.0));
        assert!(approx_eq(scorer.score(&rb, &scenario_needs()), 17.0, 1e-9));
        assert!(!scorer.is_elite(&rb));
    }
}
