// Draft recommender: scores the available pool for a roster and ranks it.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::LeagueConfig;
use crate::draft::pick::Position;
use crate::draft::roster::RosterState;
use crate::error::{DraftError, Result};
use crate::rankings::{PlayerId, PlayerSeasonRecord, RankingTable};
use crate::rules::{filter_candidates, Rule, RuleContext, RuleOutcome};
use crate::valuation::needs::{compute_needs, PositionNeeds};
use crate::valuation::round2;
use crate::valuation::scarcity::{position_scarcity, ScarcityRecord};
use crate::valuation::tiers::{tier_breakdown, TierSummary};
use crate::valuation::value::ValueScorer;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// A player's ranking line, figures rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerLine {
    pub player_id: PlayerId,
    pub name: Option<String>,
    pub position: Position,
    pub season: i32,
    pub points_per_game: f64,
    pub fantasy_points: f64,
    pub position_rank: u32,
    pub position_percentile: f64,
}

impl PlayerLine {
    fn new(player_id: PlayerId, record: &PlayerSeasonRecord) -> Self {
        PlayerLine {
            player_id,
            name: record.name.clone(),
            position: record.position.clone(),
            season: record.season,
            points_per_game: round2(record.points_per_game),
            fantasy_points: round2(record.fantasy_points),
            position_rank: record.position_rank,
            position_percentile: round2(record.position_percentile),
        }
    }
}

/// One recommended pick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub player: PlayerLine,
    pub value_score: f64,
}

/// Result of a recommendation query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationSet {
    pub season: i32,
    pub needs: PositionNeeds,
    /// The roster has no open slot; `candidates` is empty for that reason.
    pub roster_full: bool,
    pub rules: RuleOutcome,
    /// Best first. Equal scores keep ranking-table order.
    pub candidates: Vec<Recommendation>,
}

impl RecommendationSet {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Recommender
// ---------------------------------------------------------------------------

/// Owns the ranking table for a draft, the set of drafted players and a
/// per-season scarcity cache.
#[derive(Debug, Clone)]
pub struct DraftRecommender {
    table: RankingTable,
    scorer: ValueScorer,
    drafted: HashSet<PlayerId>,
    scarcity_cache: HashMap<i32, Vec<ScarcityRecord>>,
}

impl DraftRecommender {
    pub fn new(table: RankingTable, scorer: ValueScorer) -> Self {
        DraftRecommender {
            table,
            scorer,
            drafted: HashSet::new(),
            scarcity_cache: HashMap::new(),
        }
    }

    pub fn table(&self) -> &RankingTable {
        &self.table
    }

    pub fn scorer(&self) -> &ValueScorer {
        &self.scorer
    }

    pub fn is_drafted(&self, id: PlayerId) -> bool {
        self.drafted.contains(&id)
    }

    pub fn drafted_count(&self) -> usize {
        self.drafted.len()
    }

    /// Undrafted rows for `season`, in table order.
    pub fn available(&self, season: i32) -> impl Iterator<Item = (PlayerId, &PlayerSeasonRecord)> {
        self.table
            .season_rows(season)
            .filter(move |(id, _)| !self.drafted.contains(id))
    }

    fn require_season(&self, season: i32) -> Result<()> {
        if self.table.is_empty() {
            return Err(DraftError::DataUnavailable("ranking table is empty".into()));
        }
        if self.table.season_rows(season).next().is_none() {
            return Err(DraftError::DataUnavailable(format!(
                "no rankings for season {season}"
            )));
        }
        Ok(())
    }

    /// Top `top_n` available players for `roster`, by draft value.
    ///
    /// A full roster gives an empty set flagged `roster_full`. A season whose
    /// players are all drafted gives an empty set without the flag.
    ///
    /// The empty result is keyed on the roster having no open slot, not on
    /// every need being zero. The two agree unless the league has no starter
    /// slots: a bench-only roster has no needs yet still takes players, so it
    /// gets discounted candidates rather than an empty set.
    pub fn get_recommendations(
        &self,
        roster: &RosterState,
        league: &LeagueConfig,
        season: i32,
        top_n: usize,
    ) -> Result<RecommendationSet> {
        self.require_season(season)?;

        let needs = compute_needs(roster, league);
        if roster.is_full(league) {
            debug!("roster full; no recommendations");
            return Ok(RecommendationSet {
                season,
                needs,
                roster_full: true,
                rules: RuleOutcome::NotApplied,
                candidates: Vec::new(),
            });
        }

        let mut scored: Vec<(PlayerId, &PlayerSeasonRecord, f64)> = self
            .available(season)
            .map(|(id, record)| (id, record, self.scorer.score(record, &needs)))
            .collect();
        // Stable: equal scores keep table order.
        scored.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_n);

        let candidates = scored
            .into_iter()
            .map(|(id, record, value)| Recommendation {
                player: PlayerLine::new(id, record),
                value_score: round2(value),
            })
            .collect();

        Ok(RecommendationSet {
            season,
            needs,
            roster_full: false,
            rules: RuleOutcome::NotApplied,
            candidates,
        })
    }

    /// [`get_recommendations`](Self::get_recommendations) narrowed by `rule`.
    ///
    /// The rule sees the season's scarcity table. If it rejects every
    /// recommendation, the unfiltered list is returned and `rules` reports
    /// [`RuleOutcome::Bypassed`].
    pub fn get_filtered_recommendations(
        &mut self,
        roster: &RosterState,
        league: &LeagueConfig,
        season: i32,
        top_n: usize,
        rule: &Rule,
    ) -> Result<RecommendationSet> {
        let mut set = self.get_recommendations(roster, league, season, top_n)?;
        if set.roster_full {
            return Ok(set);
        }

        self.get_position_scarcity(season)?;
        let ctx = RuleContext {
            roster,
            league,
            scarcity: self.scarcity_cache.get(&season).map(Vec::as_slice),
            thresholds: self.scorer.thresholds,
        };

        // Rules judge the unrounded record, not the rounded line.
        let table = &self.table;
        let candidates = std::mem::take(&mut set.candidates);
        let with_records: Vec<(Recommendation, &PlayerSeasonRecord)> = candidates
            .into_iter()
            .filter_map(|rec| table.get(rec.player.player_id).map(|r| (rec, r)))
            .collect();
        let (kept, outcome) = filter_candidates(rule, &ctx, with_records, |c| c.1);

        set.candidates = kept.into_iter().map(|(rec, _)| rec).collect();
        set.rules = outcome;
        Ok(set)
    }

    /// Top `n` available players at `position` by points per game.
    pub fn get_best_available_by_position(
        &self,
        position: &Position,
        season: i32,
        n: usize,
    ) -> Result<Vec<PlayerLine>> {
        self.require_season(season)?;
        if !self
            .table
            .season_rows(season)
            .any(|(_, r)| &r.position == position)
        {
            return Err(DraftError::DataUnavailable(format!(
                "no {position} rankings for season {season}"
            )));
        }

        let mut pool: Vec<(PlayerId, &PlayerSeasonRecord)> = self
            .available(season)
            .filter(|(_, r)| &r.position == position)
            .collect();
        pool.sort_by(|a, b| {
            b.1.points_per_game
                .partial_cmp(&a.1.points_per_game)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        pool.truncate(n);

        Ok(pool
            .into_iter()
            .map(|(id, record)| PlayerLine::new(id, record))
            .collect())
    }

    /// Remove a player from the pool. Returns `false` if already drafted.
    pub fn mark_player_drafted(&mut self, id: PlayerId) -> Result<bool> {
        if self.table.get(id).is_none() {
            return Err(DraftError::UnknownPlayer(id));
        }
        Ok(self.drafted.insert(id))
    }

    /// Return every player to the pool. Cached scarcity is kept; it does not
    /// depend on who has been drafted.
    pub fn reset_draft(&mut self) {
        info!("resetting draft: {} players returned to pool", self.drafted.len());
        self.drafted.clear();
    }

    /// Scarcity for every position in `season`, computed once per season.
    pub fn get_position_scarcity(&mut self, season: i32) -> Result<&[ScarcityRecord]> {
        self.require_season(season)?;
        let table = &self.table;
        let records = self
            .scarcity_cache
            .entry(season)
            .or_insert_with(|| position_scarcity(table, season));
        Ok(records.as_slice())
    }

    /// Percentile tiers for `position` in `season`, drafted players included.
    pub fn get_tier_breakdowns(&self, position: &Position, season: i32) -> Result<Vec<TierSummary>> {
        self.require_season(season)?;
        let rows: Vec<&PlayerSeasonRecord> = self
            .table
            .season_rows(season)
            .map(|(_, r)| r)
            .filter(|r| &r.position == position)
            .collect();
        if rows.is_empty() {
            return Err(DraftError::DataUnavailable(format!(
                "no {position} rankings for season {season}"
            )));
        }
        Ok(tier_breakdown(rows))
    }

    /// Whether scarcity for `season` has been computed.
    pub fn has_cached_scarcity(&self, season: i32) -> bool {
        self.scarcity_cache.contains_key(&season)
    }
}
