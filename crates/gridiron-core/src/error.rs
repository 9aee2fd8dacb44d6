// Errors raised by recommendation queries and draft sessions.

use thiserror::Error;

use crate::config::ConfigError;
use crate::draft::roster::RosterError;
use crate::rankings::PlayerId;

#[derive(Debug, Error)]
pub enum DraftError {
    /// The ranking table has no rows for the requested season or position.
    #[error("no ranking data available: {0}")]
    DataUnavailable(String),

    #[error("unknown player id {0}")]
    UnknownPlayer(PlayerId),

    #[error("player {player} is from season {season}, but the draft uses {expected}")]
    SeasonMismatch {
        player: PlayerId,
        season: i32,
        expected: i32,
    },

    #[error("player {0} has already been drafted")]
    AlreadyDrafted(PlayerId),

    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error("the draft is complete: every roster is full")]
    DraftComplete,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = DraftError> = std::result::Result<T, E>;
