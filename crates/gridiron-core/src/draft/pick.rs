// Positions and individual pick records.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::roster::Slot;
use crate::rankings::PlayerId;

/// Football positions used for ranking cohorts and roster slots.
///
/// Leagues may define positions this crate does not know about (IDP variants,
/// miscategorized rows). Those parse to `Other` instead of failing, and every
/// config lookup for them falls back to a permissive default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Position {
    Quarterback,
    RunningBack,
    WideReceiver,
    TightEnd,
    DefensivePlayer,
    TeamDefense,
    Kicker,
    Other(String),
}

impl Position {
    /// Parse a position string into a Position.
    ///
    /// Handles the abbreviations that appear in league configs and ranking
    /// exports:
    /// - "D/ST", "DST", "DEF", "D" -> TeamDefense
    /// - "IDP", "DP" -> DefensivePlayer
    /// - "K", "PK" -> Kicker
    ///
    /// Anything else is kept verbatim (trimmed, uppercased) as `Other`.
    pub fn from_str_pos(s: &str) -> Self {
        let upper = s.trim().to_uppercase();
        match upper.as_str() {
            "QB" => Position::Quarterback,
            "RB" => Position::RunningBack,
            "WR" => Position::WideReceiver,
            "TE" => Position::TightEnd,
            "IDP" | "DP" => Position::DefensivePlayer,
            "D/ST" | "DST" | "DEF" | "D" => Position::TeamDefense,
            "K" | "PK" => Position::Kicker,
            _ => Position::Other(upper),
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &str {
        match self {
            Position::Quarterback => "QB",
            Position::RunningBack => "RB",
            Position::WideReceiver => "WR",
            Position::TightEnd => "TE",
            Position::DefensivePlayer => "IDP",
            Position::TeamDefense => "D/ST",
            Position::Kicker => "K",
            Position::Other(name) => name,
        }
    }

    /// Whether this is one of the standard positions.
    pub fn is_known(&self) -> bool {
        !matches!(self, Position::Other(_))
    }

    /// Deterministic ordering index for roster display.
    pub fn sort_order(&self) -> u8 {
        match self {
            Position::Quarterback => 0,
            Position::RunningBack => 1,
            Position::WideReceiver => 2,
            Position::TightEnd => 3,
            Position::DefensivePlayer => 4,
            Position::TeamDefense => 5,
            Position::Kicker => 6,
            Position::Other(_) => 7,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.display_str())
    }
}

impl From<String> for Position {
    fn from(s: String) -> Self {
        Position::from_str_pos(&s)
    }
}

impl From<&str> for Position {
    fn from(s: &str) -> Self {
        Position::from_str_pos(s)
    }
}

impl From<Position> for String {
    fn from(p: Position) -> String {
        p.display_str().to_string()
    }
}

/// A single completed draft pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftPick {
    /// Sequential pick number (1-indexed).
    pub pick_number: u32,
    /// Draft round (1-indexed).
    pub round: u32,
    /// Index of the drafting team in the session's team list.
    pub team_idx: usize,
    /// Display name of the drafting team.
    pub team_name: String,
    /// Row identifier of the drafted player in the ranking table.
    pub player_id: PlayerId,
    /// Player display name, when the ranking table carries one.
    #[serde(default)]
    pub player_name: Option<String>,
    pub position: Position,
    /// The roster slot the player was assigned to.
    pub slot: Slot,
}
