// Ranked player-season table: CSV loading and per-cohort ranking.
//
// Reads either an already-ranked table (position_rank / position_percentile
// columns present) or a consolidated season-stats table, in which case ranks,
// percentiles and the position-average delta are computed per
// (season, position) cohort.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use crate::draft::pick::Position;
use crate::valuation::round2;

/// Player-seasons with fewer games than this are dropped before ranking.
pub const MIN_GAMES_PLAYED: u32 = 4;

const BASE_COLUMNS: &[&str] = &[
    "position",
    "season",
    "games_played_season",
    "fantasy_points",
];
const RANK_COLUMNS: &[&str] = &["points_per_game", "position_rank", "position_percentile"];

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Row identity within a loaded [`RankingTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub usize);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// One player's season, ranked within its (season, position) cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSeasonRecord {
    pub name: Option<String>,
    pub position: Position,
    pub season: i32,
    pub games_played: u32,
    pub fantasy_points: f64,
    pub points_per_game: f64,
    /// 1 = best in cohort; tied players share the lowest rank.
    pub position_rank: u32,
    /// Share of the cohort at or below this player, in [0, 1].
    pub position_percentile: f64,
    /// Points per game above the cohort mean.
    pub ppg_vs_position_avg: Option<f64>,
}

impl PlayerSeasonRecord {
    /// Name for display, falling back to position and rank.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{}{} ({})", self.position, self.position_rank, self.season),
        }
    }
}

/// A consolidated season line before cohort ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonStats {
    pub name: Option<String>,
    pub position: Position,
    pub season: i32,
    pub games_played: u32,
    pub fantasy_points: f64,
    pub points_per_game: f64,
}

/// Read-only table of ranked player-seasons. A player's [`PlayerId`] is its
/// row index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankingTable {
    rows: Vec<PlayerSeasonRecord>,
}

impl RankingTable {
    pub fn new(rows: Vec<PlayerSeasonRecord>) -> Self {
        RankingTable { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: PlayerId) -> Option<&PlayerSeasonRecord> {
        self.rows.get(id.0)
    }

    /// All rows with their ids, in table order.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &PlayerSeasonRecord)> {
        self.rows.iter().enumerate().map(|(i, r)| (PlayerId(i), r))
    }

    /// Rows for one season, in table order.
    pub fn season_rows(
        &self,
        season: i32,
    ) -> impl Iterator<Item = (PlayerId, &PlayerSeasonRecord)> {
        self.iter().filter(move |(_, r)| r.season == season)
    }

    pub fn seasons(&self) -> BTreeSet<i32> {
        self.rows.iter().map(|r| r.season).collect()
    }

    pub fn latest_season(&self) -> Option<i32> {
        self.rows.iter().map(|r| r.season).max()
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RankingError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("{path} is missing required column `{column}`")]
    MissingColumn { path: String, column: String },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

/// A ranking-table row. Counting columns are read as f64 because exports
/// often write them with a trailing `.0`. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct RawRankedRow {
    #[serde(default, alias = "player_name", alias = "player_display_name")]
    name: Option<String>,
    position: String,
    season: f64,
    games_played_season: f64,
    fantasy_points: f64,
    points_per_game: f64,
    position_rank: f64,
    position_percentile: f64,
    #[serde(default)]
    ppg_vs_position_avg: Option<f64>,
}

/// A consolidated season-stats row without cohort columns.
#[derive(Debug, Deserialize)]
struct RawStatsRow {
    #[serde(default, alias = "player_name", alias = "player_display_name")]
    name: Option<String>,
    position: String,
    season: f64,
    games_played_season: f64,
    fantasy_points: f64,
    #[serde(default)]
    points_per_game: Option<f64>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

fn clean_name(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

fn check_columns(
    headers: &csv::StringRecord,
    required: &[&str],
    origin: &str,
) -> Result<(), RankingError> {
    for column in required {
        if !headers.iter().any(|h| h.trim() == *column) {
            return Err(RankingError::MissingColumn {
                path: origin.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

fn has_columns(headers: &csv::StringRecord, columns: &[&str]) -> bool {
    columns
        .iter()
        .all(|c| headers.iter().any(|h| h.trim() == *c))
}

// ---------------------------------------------------------------------------
// Reader-based loaders
// ---------------------------------------------------------------------------

fn ranked_rows<R: Read>(
    reader: &mut csv::Reader<R>,
) -> Result<Vec<PlayerSeasonRecord>, csv::Error> {
    let mut rows = Vec::new();
    for result in reader.deserialize::<RawRankedRow>() {
        match result {
            Ok(raw) => {
                if !all_finite(&[
                    raw.fantasy_points,
                    raw.points_per_game,
                    raw.position_percentile,
                    raw.season,
                ]) {
                    warn!(
                        "skipping {} row for {:?}: non-finite value",
                        raw.position.trim(),
                        raw.name
                    );
                    continue;
                }
                if raw.ppg_vs_position_avg.is_some_and(|d| !d.is_finite()) {
                    warn!("skipping row for {:?}: non-finite ppg_vs_position_avg", raw.name);
                    continue;
                }
                if !(0.0..=1.0).contains(&raw.position_percentile) {
                    warn!(
                        "skipping row for {:?}: position_percentile {} outside [0, 1]",
                        raw.name, raw.position_percentile
                    );
                    continue;
                }
                rows.push(PlayerSeasonRecord {
                    name: clean_name(raw.name),
                    position: Position::from_str_pos(&raw.position),
                    season: raw.season.round() as i32,
                    games_played: raw.games_played_season.max(0.0).round() as u32,
                    fantasy_points: raw.fantasy_points,
                    points_per_game: raw.points_per_game,
                    position_rank: raw.position_rank.max(1.0).round() as u32,
                    position_percentile: raw.position_percentile,
                    ppg_vs_position_avg: raw.ppg_vs_position_avg,
                });
            }
            Err(e) => {
                warn!("skipping malformed ranking row: {}", e);
            }
        }
    }
    Ok(rows)
}

fn stats_rows<R: Read>(reader: &mut csv::Reader<R>) -> Result<Vec<SeasonStats>, csv::Error> {
    let mut rows = Vec::new();
    for result in reader.deserialize::<RawStatsRow>() {
        match result {
            Ok(raw) => {
                if !all_finite(&[raw.fantasy_points, raw.games_played_season, raw.season]) {
                    warn!("skipping stats row for {:?}: non-finite value", raw.name);
                    continue;
                }
                let games = raw.games_played_season.max(0.0).round() as u32;
                let ppg = match raw.points_per_game {
                    Some(ppg) if ppg.is_finite() => ppg,
                    Some(_) => {
                        warn!("skipping stats row for {:?}: non-finite points_per_game", raw.name);
                        continue;
                    }
                    None if games > 0 => round2(raw.fantasy_points / games as f64),
                    None => 0.0,
                };
                rows.push(SeasonStats {
                    name: clean_name(raw.name),
                    position: Position::from_str_pos(&raw.position),
                    season: raw.season.round() as i32,
                    games_played: games,
                    fantasy_points: raw.fantasy_points,
                    points_per_game: ppg,
                });
            }
            Err(e) => {
                warn!("skipping malformed stats row: {}", e);
            }
        }
    }
    Ok(rows)
}

fn table_from_reader<R: Read>(rdr: R, origin: &str) -> Result<RankingTable, RankingError> {
    let csv_err = |source| RankingError::Csv {
        path: origin.to_string(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(rdr);
    let headers = reader.headers().map_err(csv_err)?.clone();
    check_columns(&headers, BASE_COLUMNS, origin)?;

    let table = if has_columns(&headers, &RANK_COLUMNS[1..]) {
        check_columns(&headers, RANK_COLUMNS, origin)?;
        RankingTable::new(ranked_rows(&mut reader).map_err(csv_err)?)
    } else {
        let stats = stats_rows(&mut reader).map_err(csv_err)?;
        info!(
            "{}: no rank columns, ranking {} season lines by cohort",
            origin,
            stats.len()
        );
        rank_cohorts(stats)
    };

    if table.is_empty() {
        return Err(RankingError::Validation(format!(
            "{origin} produced zero valid rows"
        )));
    }
    Ok(table)
}

/// Load a ranking table from any CSV source. See [`load_rankings`].
pub fn load_rankings_from_reader<R: Read>(rdr: R) -> Result<RankingTable, RankingError> {
    table_from_reader(rdr, "<input>")
}

/// Load a ranking table from a CSV file.
///
/// Files carrying `position_rank` and `position_percentile` are taken as
/// ranked; otherwise the rows are ranked per cohort with [`rank_cohorts`].
pub fn load_rankings(path: &Path) -> Result<RankingTable, RankingError> {
    let file = std::fs::File::open(path).map_err(|e| RankingError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    table_from_reader(file, &path.display().to_string())
}

// ---------------------------------------------------------------------------
// Cohort ranking
// ---------------------------------------------------------------------------

/// Rank consolidated season lines within each (season, position) cohort.
///
/// Lines with fewer than [`MIN_GAMES_PLAYED`] games are dropped. Within a
/// cohort, by points per game:
/// - rank: 1 + number of strictly better lines (tied lines share a rank)
/// - percentile: average ascending rank divided by cohort size
/// - delta: points per game minus the cohort mean
///
/// Output keeps the input order of the surviving lines.
pub fn rank_cohorts(stats: Vec<SeasonStats>) -> RankingTable {
    let before = stats.len();
    let stats: Vec<SeasonStats> = stats
        .into_iter()
        .filter(|s| s.games_played >= MIN_GAMES_PLAYED)
        .collect();
    if stats.len() < before {
        info!(
            "dropped {} season lines with fewer than {} games",
            before - stats.len(),
            MIN_GAMES_PLAYED
        );
    }

    let mut cohorts: HashMap<(i32, Position), Vec<usize>> = HashMap::new();
    for (i, s) in stats.iter().enumerate() {
        cohorts
            .entry((s.season, s.position.clone()))
            .or_default()
            .push(i);
    }

    let mut ranked: Vec<Option<PlayerSeasonRecord>> = vec![None; stats.len()];
    for members in cohorts.values() {
        let n = members.len() as f64;
        let mean = members
            .iter()
            .map(|&i| stats[i].points_per_game)
            .sum::<f64>()
            / n;

        for &i in members {
            let ppg = stats[i].points_per_game;
            let better = members
                .iter()
                .filter(|&&j| stats[j].points_per_game > ppg)
                .count();
            let worse = members
                .iter()
                .filter(|&&j| stats[j].points_per_game < ppg)
                .count();
            let tied = members.len() - better - worse;
            let avg_ascending_rank = worse as f64 + (tied as f64 + 1.0) / 2.0;

            let s = &stats[i];
            ranked[i] = Some(PlayerSeasonRecord {
                name: s.name.clone(),
                position: s.position.clone(),
                season: s.season,
                games_played: s.games_played,
                fantasy_points: s.fantasy_points,
                points_per_game: ppg,
                position_rank: better as u32 + 1,
                position_percentile: avg_ascending_rank / n,
                ppg_vs_position_avg: Some(ppg - mean),
            });
        }
    }

    RankingTable::new(ranked.into_iter().flatten().collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
