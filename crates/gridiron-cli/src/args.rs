//! Command-line argument definitions.

use clap::{Parser, Subcommand};
use gridiron_core::draft::pick::Position;

#[derive(Debug, Parser)]
#[clap(name = "gridiron", about = "Fantasy football draft recommendations")]
pub struct Cli {
    /// Season whose rankings drive the draft (defaults to config, then the latest season).
    #[clap(long, global = true)]
    pub season: Option<i32>,

    /// Print machine-readable JSON instead of text.
    #[clap(long, global = true)]
    pub json: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rank the best available players for a team.
    Recommend {
        /// 1-based draft slot of the team (defaults to your slot).
        #[clap(long, short)]
        team: Option<usize>,

        /// Number of recommendations (defaults to `draft.top_n`).
        #[clap(long)]
        top: Option<usize>,

        /// Narrow the list with the admission rule.
        #[clap(long)]
        rules: bool,
    },

    /// Best available players at one position by points per game.
    Best {
        #[clap(value_parser = parse_position)]
        position: Position,

        #[clap(short, default_value_t = 5)]
        n: usize,
    },

    /// Positional scarcity for the season, most scarce first.
    Scarcity,

    /// Percentile tier summary for one position.
    Tiers {
        #[clap(value_parser = parse_position)]
        position: Position,
    },

    /// Record the next pick for the team on the clock.
    Pick {
        /// Player id as shown by `recommend` or `best`.
        player_id: usize,
    },

    /// Show where the draft stands and your roster.
    Status,

    /// Discard the pick log and start a new draft.
    Reset,
}

fn parse_position(s: &str) -> Result<Position, String> {
    if s.trim().is_empty() {
        return Err("position must not be empty".into());
    }
    Ok(Position::from_str_pos(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_recommend_flags() {
        let cli = Cli::parse_from(["gridiron", "recommend", "--team", "3", "--top", "5", "--rules"]);
        match cli.command {
            Command::Recommend { team, top, rules } => {
                assert_eq!(team, Some(3));
                assert_eq!(top, Some(5));
                assert!(rules);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["gridiron", "scarcity", "--season", "2022", "--json"]);
        assert_eq!(cli.season, Some(2022));
        assert!(cli.json);
    }

    #[test]
    fn position_aliases_parse() {
        let cli = Cli::parse_from(["gridiron", "tiers", "dst"]);
        match cli.command {
            Command::Tiers { position } => assert_eq!(position, Position::TeamDefense),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn best_defaults_to_five() {
        let cli = Cli::parse_from(["gridiron", "best", "RB"]);
        match cli.command {
            Command::Best { position, n } => {
                assert_eq!(position, Position::RunningBack);
                assert_eq!(n, 5);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
