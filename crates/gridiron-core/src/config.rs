// Configuration loading and parsing (league.toml, strategy.toml).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::draft::pick::Position;

/// Cap applied to positions without an explicit `max_per_position` entry.
pub const DEFAULT_MAX_PER_POSITION: u32 = 99;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub strategy: StrategyConfig,
    pub db_path: String,
    pub data_paths: DataPaths,
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[league]` table in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
}

/// Roster rules for one league. Immutable for the duration of a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueConfig {
    #[serde(default = "default_league_name")]
    pub name: String,
    pub league_size: usize,
    /// Starting slots per position, e.g. `{QB = 1, RB = 2}`.
    #[serde(default)]
    pub starters_per_pos: BTreeMap<Position, u32>,
    #[serde(default)]
    pub flex_spots: u32,
    /// Positions allowed to fill a FLEX slot.
    #[serde(default)]
    pub flex_eligible: Vec<Position>,
    #[serde(default)]
    pub bench_spots: u32,
    /// Hard cap on rostered players per position.
    #[serde(default)]
    pub max_per_position: BTreeMap<Position, u32>,
    /// Optional display names, in draft-slot order.
    #[serde(default)]
    pub team_names: Vec<String>,
}

fn default_league_name() -> String {
    "Fantasy League".into()
}

impl Default for LeagueConfig {
    /// Ten-team league: QB, 2 RB, 2 WR, TE, IDP, D/ST, K starters, two
    /// RB/WR/TE flex spots and three bench spots.
    fn default() -> Self {
        let starters_per_pos = [
            (Position::Quarterback, 1),
            (Position::RunningBack, 2),
            (Position::WideReceiver, 2),
            (Position::TightEnd, 1),
            (Position::DefensivePlayer, 1),
            (Position::TeamDefense, 1),
            (Position::Kicker, 1),
        ]
        .into_iter()
        .collect();

        LeagueConfig {
            name: default_league_name(),
            league_size: 10,
            starters_per_pos,
            flex_spots: 2,
            flex_eligible: vec![
                Position::RunningBack,
                Position::WideReceiver,
                Position::TightEnd,
            ],
            bench_spots: 3,
            max_per_position: BTreeMap::new(),
            team_names: Vec::new(),
        }
    }
}

impl LeagueConfig {
    /// Starter slots required at `pos`. Unconfigured positions need none.
    pub fn starters_at(&self, pos: &Position) -> u32 {
        self.starters_per_pos.get(pos).copied().unwrap_or(0)
    }

    /// Roster cap for `pos`, falling back to [`DEFAULT_MAX_PER_POSITION`].
    pub fn max_at(&self, pos: &Position) -> u32 {
        match self.max_per_position.get(pos) {
            Some(&cap) => cap,
            None => {
                if !self.starters_per_pos.contains_key(pos) && !self.is_flex_eligible(pos) {
                    debug!("position {} not configured for league; using defaults", pos);
                }
                DEFAULT_MAX_PER_POSITION
            }
        }
    }

    pub fn is_flex_eligible(&self, pos: &Position) -> bool {
        self.flex_eligible.contains(pos)
    }

    /// Positions with at least one starter slot, in position order.
    pub fn starter_positions(&self) -> impl Iterator<Item = &Position> {
        self.starters_per_pos
            .iter()
            .filter(|(_, &count)| count > 0)
            .map(|(pos, _)| pos)
    }

    /// Total roster size: every starter, flex and bench slot.
    pub fn roster_size(&self) -> u32 {
        self.starters_per_pos.values().sum::<u32>() + self.flex_spots + self.bench_spots
    }

    /// Display name for the team drafting from `slot_idx` (0-based).
    pub fn team_name(&self, slot_idx: usize) -> String {
        self.team_names
            .get(slot_idx)
            .cloned()
            .unwrap_or_else(|| format!("Team {}", slot_idx + 1))
    }
}

// ---------------------------------------------------------------------------
// strategy.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire strategy.toml file.
#[derive(Debug, Clone, Deserialize)]
struct StrategyFile {
    #[serde(default)]
    valuation: ValuationWeights,
    #[serde(default)]
    thresholds: Thresholds,
    draft: DraftSection,
    database: DatabaseSection,
    data_paths: DataPaths,
}

#[derive(Debug, Clone, Deserialize)]
struct DraftSection {
    #[serde(default)]
    season: Option<i32>,
    #[serde(default = "default_top_n")]
    top_n: usize,
    #[serde(default = "default_draft_slot")]
    my_draft_slot: usize,
    #[serde(default)]
    apply_rules: bool,
}

fn default_top_n() -> usize {
    10
}

fn default_draft_slot() -> usize {
    1
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

/// The public strategy config assembled from the strategy.toml sections.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub weights: ValuationWeights,
    pub thresholds: Thresholds,
    /// Season whose rankings drive recommendations. `None` picks the latest
    /// season present in the ranking table.
    pub season: Option<i32>,
    pub top_n: usize,
    /// 1-based draft slot of the user's team.
    pub my_draft_slot: usize,
    /// Narrow recommendations with the admission rule by default.
    pub apply_rules: bool,
}

/// Coefficients of the draft-value formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationWeights {
    /// Weight on points-per-game above the position average.
    pub relative_weight: f64,
    /// Boost per unit of positional need.
    pub need_weight: f64,
    /// Multiplier applied when the position is not needed.
    pub unneeded_discount: f64,
    /// Multiplier applied to elite players.
    pub elite_multiplier: f64,
}

impl Default for ValuationWeights {
    fn default() -> Self {
        ValuationWeights {
            relative_weight: 0.5,
            need_weight: 0.2,
            unneeded_discount: 0.5,
            elite_multiplier: 1.3,
        }
    }
}

/// Cutoffs for the elite and scarce predicates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Position percentile at or above which a player is elite.
    pub elite_percentile: f64,
    /// Scarcity score strictly above which a position is scarce.
    pub scarcity_threshold: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            elite_percentile: 0.8,
            scarcity_threshold: 1.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub rankings: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` and
/// `config/strategy.toml`, relative to the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;

    let strategy_path = config_dir.join("strategy.toml");
    let strategy_text = read_file(&strategy_path)?;
    let strategy_file: StrategyFile =
        toml::from_str(&strategy_text).map_err(|e| ConfigError::ParseError {
            path: strategy_path.clone(),
            source: e,
        })?;

    let strategy = StrategyConfig {
        weights: strategy_file.valuation,
        thresholds: strategy_file.thresholds,
        season: strategy_file.draft.season,
        top_n: strategy_file.draft.top_n,
        my_draft_slot: strategy_file.draft.my_draft_slot,
        apply_rules: strategy_file.draft.apply_rules,
    };

    let config = Config {
        league: league_file.league,
        strategy,
        db_path: strategy_file.database.path,
        data_paths: strategy_file.data_paths,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }

        let target = config_dir.join(file_name);
        if target.exists() {
            continue;
        }
        std::fs::copy(&path, &target).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to copy {} to {}: {e}", path.display(), target.display()),
        })?;
        copied.push(target);
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validation(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

/// Check a league config on its own. Used by `load_config_from` and by
/// callers that build a `LeagueConfig` in code.
pub fn validate_league(league: &LeagueConfig) -> Result<(), ConfigError> {
    if league.league_size == 0 {
        return Err(validation("league.league_size", "must be greater than 0"));
    }

    if league.flex_spots > 0 && league.flex_eligible.is_empty() {
        return Err(validation(
            "league.flex_eligible",
            "must list at least one position when flex_spots > 0",
        ));
    }

    if league.roster_size() == 0 {
        return Err(validation(
            "league.starters_per_pos",
            "roster has no starter, flex or bench slots",
        ));
    }

    if !league.team_names.is_empty() && league.team_names.len() != league.league_size {
        return Err(validation(
            "league.team_names",
            format!(
                "expected {} names, got {}",
                league.league_size,
                league.team_names.len()
            ),
        ));
    }

    Ok(())
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_league(&config.league)?;

    let strategy = &config.strategy;
    let w = &strategy.weights;
    let weight_fields: &[(&str, f64)] = &[
        ("valuation.relative_weight", w.relative_weight),
        ("valuation.need_weight", w.need_weight),
        ("valuation.unneeded_discount", w.unneeded_discount),
        ("valuation.elite_multiplier", w.elite_multiplier),
    ];
    for (name, val) in weight_fields {
        if !val.is_finite() || *val < 0.0 {
            return Err(validation(name, format!("must be a finite value >= 0, got {val}")));
        }
    }

    let elite = strategy.thresholds.elite_percentile;
    if !(0.0..=1.0).contains(&elite) {
        return Err(validation(
            "thresholds.elite_percentile",
            format!("must be between 0.0 and 1.0 inclusive, got {elite}"),
        ));
    }
    if !strategy.thresholds.scarcity_threshold.is_finite() {
        return Err(validation("thresholds.scarcity_threshold", "must be finite"));
    }

    if strategy.top_n == 0 {
        return Err(validation("draft.top_n", "must be > 0"));
    }

    let slot = strategy.my_draft_slot;
    if slot == 0 || slot > config.league.league_size {
        return Err(validation(
            "draft.my_draft_slot",
            format!("must be between 1 and {}, got {slot}", config.league.league_size),
        ));
    }

    if config.data_paths.rankings.trim().is_empty() {
        return Err(validation("data_paths.rankings", "must not be empty"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
