// Percentile tiers within a position cohort.

use serde::Serialize;
use std::fmt;

use crate::rankings::PlayerSeasonRecord;

/// Percentile band within a position. Bands are half-open on the top:
/// Elite >= 0.9, Tier1 [0.75, 0.9), Tier2 [0.5, 0.75), Tier3 [0.25, 0.5),
/// Tier4 < 0.25.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Tier {
    Elite,
    Tier1,
    Tier2,
    Tier3,
    Tier4,
}

impl Tier {
    pub const ALL: [Tier; 5] = [Tier::Elite, Tier::Tier1, Tier::Tier2, Tier::Tier3, Tier::Tier4];

    pub fn from_percentile(pct: f64) -> Self {
        if pct >= 0.9 {
            Tier::Elite
        } else if pct >= 0.75 {
            Tier::Tier1
        } else if pct >= 0.5 {
            Tier::Tier2
        } else if pct >= 0.25 {
            Tier::Tier3
        } else {
            Tier::Tier4
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Elite => "Elite (Top 10%)",
            Tier::Tier1 => "Tier 1 (Top 25%)",
            Tier::Tier2 => "Tier 2 (Top 50%)",
            Tier::Tier3 => "Tier 3 (Top 75%)",
            Tier::Tier4 => "Tier 4 (Bottom 25%)",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Points-per-game summary of one tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierSummary {
    pub tier: Tier,
    pub label: &'static str,
    pub count: usize,
    pub avg_ppg: f64,
    pub min_ppg: f64,
    pub max_ppg: f64,
}

/// Summarize `rows` by tier, best tier first. Empty tiers are left out.
pub fn tier_breakdown<'a, I>(rows: I) -> Vec<TierSummary>
where
    I: IntoIterator<Item = &'a PlayerSeasonRecord>,
{
    let mut buckets: [Vec<f64>; 5] = Default::default();
    for row in rows {
        let idx = Tier::from_percentile(row.position_percentile) as usize;
        buckets[idx].push(row.points_per_game);
    }

    Tier::ALL
        .iter()
        .zip(buckets.iter())
        .filter(|(_, ppgs)| !ppgs.is_empty())
        .map(|(&tier, ppgs)| TierSummary {
            tier,
            label: tier.label(),
            count: ppgs.len(),
            avg_ppg: ppgs.iter().sum::<f64>() / ppgs.len() as f64,
            min_ppg: ppgs.iter().copied().fold(f64::INFINITY, f64::min),
            max_ppg: ppgs.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
        .collect()
}
