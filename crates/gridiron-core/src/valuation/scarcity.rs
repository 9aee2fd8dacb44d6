// Positional scarcity: how far the top decile stands above the median.
//
// A high score means the best players at a position are far better than a
// typical starter, so waiting on that position costs more.

use serde::Serialize;
use tracing::debug;

use crate::draft::pick::Position;
use crate::rankings::{PlayerSeasonRecord, RankingTable};
use crate::valuation::round2;

/// Scarcity analysis for a single position in one season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScarcityRecord {
    pub position: Position,
    pub total_players: usize,
    /// Mean points per game of the top `max(1, total / 10)` players.
    pub top_decile_avg_ppg: f64,
    pub median_ppg: f64,
    /// `top_decile_avg_ppg - median_ppg`.
    pub drop_off: f64,
    /// `drop_off / median_ppg`.
    pub scarcity_score: f64,
}

impl ScarcityRecord {
    /// Copy with every figure rounded to two decimals, for reports.
    pub fn rounded(&self) -> ScarcityRecord {
        ScarcityRecord {
            position: self.position.clone(),
            total_players: self.total_players,
            top_decile_avg_ppg: round2(self.top_decile_avg_ppg),
            median_ppg: round2(self.median_ppg),
            drop_off: round2(self.drop_off),
            scarcity_score: round2(self.scarcity_score),
        }
    }
}

/// Median of an ascending slice. Caller guarantees it is non-empty.
fn median_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

fn analyze_cohort(position: &Position, cohort: &[&PlayerSeasonRecord]) -> Option<ScarcityRecord> {
    if cohort.is_empty() {
        return None;
    }

    // Stable sort: equal ppg keeps table order when cutting the top decile.
    let mut by_ppg: Vec<f64> = cohort.iter().map(|r| r.points_per_game).collect();
    by_ppg.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    let top_n = (cohort.len() / 10).max(1);
    let top_avg = by_ppg[..top_n].iter().sum::<f64>() / top_n as f64;

    let mut ascending = by_ppg.clone();
    ascending.reverse();
    let median = median_sorted(&ascending);

    if median.abs() < f64::EPSILON {
        debug!(
            "omitting {} from scarcity: median points per game is zero ({} players)",
            position,
            cohort.len()
        );
        return None;
    }

    let drop_off = top_avg - median;
    let score = drop_off / median;
    if !score.is_finite() {
        debug!("omitting {} from scarcity: non-finite score", position);
        return None;
    }

    Some(ScarcityRecord {
        position: position.clone(),
        total_players: cohort.len(),
        top_decile_avg_ppg: top_avg,
        median_ppg: median,
        drop_off,
        scarcity_score: score,
    })
}

/// Compute scarcity for every position present in `season`, most scarce first.
///
/// Positions whose median is zero are left out. Ties in score keep the order
/// in which positions first appear in the table. A season without rows
/// yields an empty list.
pub fn position_scarcity(table: &RankingTable, season: i32) -> Vec<ScarcityRecord> {
    let mut positions: Vec<&Position> = Vec::new();
    let mut cohorts: Vec<Vec<&PlayerSeasonRecord>> = Vec::new();
    for (_, row) in table.season_rows(season) {
        match positions.iter().position(|p| **p == row.position) {
            Some(i) => cohorts[i].push(row),
            None => {
                positions.push(&row.position);
                cohorts.push(vec![row]);
            }
        }
    }

    let mut records: Vec<ScarcityRecord> = positions
        .iter()
        .zip(&cohorts)
        .filter_map(|(pos, cohort)| analyze_cohort(pos, cohort))
        .collect();

    records.sort_by(|a, b| {
        b.scarcity_score
            .partial_cmp(&a.scarcity_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    records
}

/// Scarcity score for `position`, if it was computed.
pub fn score_for(records: &[ScarcityRecord], position: &Position) -> Option<f64> {
    records
        .iter()
        .find(|r| &r.position == position)
        .map(|r| r.scarcity_score)
}
