// Roster slot accounting and slot assignment.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::pick::Position;
use crate::config::LeagueConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("roster already holds {cap} {position} (position cap)")]
    AtPositionCap { position: Position, cap: u32 },

    #[error("no open starter, FLEX or bench slot for {position}")]
    NoOpenSlot { position: Position },

    #[error("slot {slot} holds {filled} players but has capacity {capacity}")]
    SlotOverfilled {
        slot: Slot,
        filled: u32,
        capacity: u32,
    },

    #[error("roster holds {rostered} {position}, above the cap of {cap}")]
    PositionOverCap {
        position: Position,
        rostered: u32,
        cap: u32,
    },
}

/// A roster slot designation: a position-specific starter slot, the shared
/// FLEX slots or the bench.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Slot {
    Starter(Position),
    Flex,
    Bench,
}

impl Slot {
    /// Parse a slot label. "FLEX" and "BENCH" (or "BE"/"BN") are the shared
    /// slots; anything else names a starter position.
    pub fn from_str_slot(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "FLEX" => Slot::Flex,
            "BENCH" | "BE" | "BN" => Slot::Bench,
            other => Slot::Starter(Position::from_str_pos(other)),
        }
    }

    pub fn display_str(&self) -> &str {
        match self {
            Slot::Starter(pos) => pos.display_str(),
            Slot::Flex => "FLEX",
            Slot::Bench => "BENCH",
        }
    }

    /// Number of players this slot can hold in `league`.
    pub fn capacity(&self, league: &LeagueConfig) -> u32 {
        match self {
            Slot::Starter(pos) => league.starters_at(pos),
            Slot::Flex => league.flex_spots,
            Slot::Bench => league.bench_spots,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.display_str())
    }
}

impl From<String> for Slot {
    fn from(s: String) -> Self {
        Slot::from_str_slot(&s)
    }
}

impl From<Slot> for String {
    fn from(s: Slot) -> String {
        s.display_str().to_string()
    }
}

/// Filled-slot counts for one team.
///
/// Tracks two views of the same players: how many occupy each slot, and how
/// many are rostered at each position regardless of slot. Counts only grow;
/// a roster is rebuilt from scratch when a draft is reset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RosterState {
    filled: BTreeMap<Slot, u32>,
    by_position: BTreeMap<Position, u32>,
}

impl RosterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Players occupying `slot`.
    pub fn filled(&self, slot: &Slot) -> u32 {
        self.filled.get(slot).copied().unwrap_or(0)
    }

    /// Players occupying the starter slots for `pos`.
    pub fn starters_filled(&self, pos: &Position) -> u32 {
        self.filled(&Slot::Starter(pos.clone()))
    }

    /// Players rostered at `pos` across all slots.
    pub fn rostered_at(&self, pos: &Position) -> u32 {
        self.by_position.get(pos).copied().unwrap_or(0)
    }

    pub fn total_players(&self) -> u32 {
        self.by_position.values().sum()
    }

    pub fn flex_full(&self, league: &LeagueConfig) -> bool {
        self.filled(&Slot::Flex) >= league.flex_spots
    }

    pub fn bench_full(&self, league: &LeagueConfig) -> bool {
        self.filled(&Slot::Bench) >= league.bench_spots
    }

    /// Whether every starter, FLEX and bench slot is occupied.
    pub fn is_full(&self, league: &LeagueConfig) -> bool {
        league
            .starter_positions()
            .all(|pos| self.starters_filled(pos) >= league.starters_at(pos))
            && self.flex_full(league)
            && self.bench_full(league)
    }

    /// The slot a player at `position` would take, without taking it.
    ///
    /// Slot assignment priority:
    /// 1. Starter slot for the position
    /// 2. FLEX (flex-eligible positions only)
    /// 3. Bench
    pub fn open_slot_for(
        &self,
        position: &Position,
        league: &LeagueConfig,
    ) -> Result<Slot, RosterError> {
        let cap = league.max_at(position);
        if self.rostered_at(position) >= cap {
            return Err(RosterError::AtPositionCap {
                position: position.clone(),
                cap,
            });
        }

        if self.starters_filled(position) < league.starters_at(position) {
            return Ok(Slot::Starter(position.clone()));
        }

        if league.is_flex_eligible(position) && !self.flex_full(league) {
            return Ok(Slot::Flex);
        }

        if !self.bench_full(league) {
            return Ok(Slot::Bench);
        }

        Err(RosterError::NoOpenSlot {
            position: position.clone(),
        })
    }

    /// Place a player at `position` into the best open slot.
    ///
    /// Either both the slot count and the position total grow by one, or the
    /// roster is left untouched and the reason is returned.
    pub fn assign(
        &mut self,
        position: &Position,
        league: &LeagueConfig,
    ) -> Result<Slot, RosterError> {
        let slot = self.open_slot_for(position, league)?;
        *self.filled.entry(slot.clone()).or_insert(0) += 1;
        *self.by_position.entry(position.clone()).or_insert(0) += 1;
        Ok(slot)
    }

    /// Verify slot counts against capacities and position totals against caps.
    ///
    /// `assign` upholds these on its own; this is for rosters that arrive from
    /// outside, e.g. deserialized state.
    pub fn check_invariants(&self, league: &LeagueConfig) -> Result<(), RosterError> {
        for (slot, &filled) in &self.filled {
            let capacity = slot.capacity(league);
            if filled > capacity {
                return Err(RosterError::SlotOverfilled {
                    slot: slot.clone(),
                    filled,
                    capacity,
                });
            }
        }
        for (position, &rostered) in &self.by_position {
            let cap = league.max_at(position);
            if rostered > cap {
                return Err(RosterError::PositionOverCap {
                    position: position.clone(),
                    rostered,
                    cap,
                });
            }
        }
        Ok(())
    }

    /// Non-empty slots with their counts, starters first in position order.
    pub fn slot_counts(&self) -> impl Iterator<Item = (&Slot, u32)> {
        self.filled
            .iter()
            .filter(|(_, &n)| n > 0)
            .map(|(slot, &n)| (slot, n))
    }

    /// Position totals for positions with at least one player.
    pub fn position_counts(&self) -> impl Iterator<Item = (&Position, u32)> {
        self.by_position
            .iter()
            .filter(|(_, &n)| n > 0)
            .map(|(pos, &n)| (pos, n))
    }
}
