// Positional need: how many more players a team still wants at each position.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::LeagueConfig;
use crate::draft::pick::Position;
use crate::draft::roster::RosterState;

/// Outstanding need per position. Positions without need are absent and
/// read as 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PositionNeeds(BTreeMap<Position, u32>);

impl PositionNeeds {
    pub fn get(&self, pos: &Position) -> u32 {
        self.0.get(pos).copied().unwrap_or(0)
    }

    pub fn needs(&self, pos: &Position) -> bool {
        self.get(pos) > 0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Position, u32)> {
        self.0.iter().map(|(p, &n)| (p, n))
    }

    fn add(&mut self, pos: &Position, amount: u32) {
        if amount > 0 {
            *self.0.entry(pos.clone()).or_insert(0) += amount;
        }
    }
}

impl FromIterator<(Position, u32)> for PositionNeeds {
    fn from_iter<I: IntoIterator<Item = (Position, u32)>>(iter: I) -> Self {
        let mut needs = PositionNeeds::default();
        for (pos, n) in iter {
            needs.add(&pos, n);
        }
        needs
    }
}

/// Compute outstanding need for each position.
///
/// 1. Each starter position needs its unfilled starter slots.
/// 2. Open FLEX slots add 1 to every flex-eligible position.
/// 3. Open bench slots add 1 to every starter position.
///
/// Filling a slot never raises any position's need.
pub fn compute_needs(roster: &RosterState, league: &LeagueConfig) -> PositionNeeds {
    let mut needs = PositionNeeds::default();

    for pos in league.starter_positions() {
        let required = league.starters_at(pos);
        needs.add(pos, required.saturating_sub(roster.starters_filled(pos)));
    }

    if !roster.flex_full(league) {
        for pos in &league.flex_eligible {
            needs.add(pos, 1);
        }
    }

    if !roster.bench_full(league) {
        for pos in league.starter_positions() {
            needs.add(pos, 1);
        }
    }

    needs
}
