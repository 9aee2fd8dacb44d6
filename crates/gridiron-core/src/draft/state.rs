// Draft session: teams, snake pick order, pick history.

use serde::Serialize;
use tracing::{info, warn};

use super::pick::DraftPick;
use super::roster::RosterState;
use crate::config::{validate_league, ConfigError, LeagueConfig};
use crate::error::{DraftError, Result};
use crate::rankings::PlayerId;
use crate::recommender::{DraftRecommender, RecommendationSet};
use crate::rules::Rule;

/// The state of a single team during the draft.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamState {
    /// 0-based draft slot.
    pub team_idx: usize,
    pub team_name: String,
    pub roster: RosterState,
}

/// Round (1-based) and team index (0-based) for a 1-based pick number in a
/// snake draft: 1..N, then N..1, and so on.
pub fn snake_position(pick_number: u32, num_teams: usize) -> (u32, usize) {
    let n = num_teams.max(1) as u32;
    let idx = pick_number.saturating_sub(1);
    let round = idx / n + 1;
    let offset = (idx % n) as usize;
    let team_idx = if round % 2 == 1 {
        offset
    } else {
        num_teams.max(1) - 1 - offset
    };
    (round, team_idx)
}

/// Serializable snapshot of where the draft stands.
#[derive(Debug, Clone, Serialize)]
pub struct DraftStatus {
    pub season: i32,
    pub picks_made: usize,
    pub total_picks: usize,
    pub round: u32,
    pub team_on_clock: Option<String>,
    pub complete: bool,
    pub my_team: TeamState,
}

/// One draft in progress: the league, each team's roster, the shared
/// recommender and the pick history.
#[derive(Debug, Clone)]
pub struct DraftSession {
    league: LeagueConfig,
    season: i32,
    recommender: DraftRecommender,
    teams: Vec<TeamState>,
    picks: Vec<DraftPick>,
    my_team_idx: usize,
    rule: Rule,
}

impl DraftSession {
    /// Create a session drafting `season` rankings.
    ///
    /// `my_draft_slot` is 1-based. The league is validated; a league with no
    /// teams or no roster slots cannot host a draft.
    pub fn new(
        league: LeagueConfig,
        recommender: DraftRecommender,
        season: i32,
        my_draft_slot: usize,
    ) -> Result<Self> {
        validate_league(&league)?;
        if my_draft_slot == 0 || my_draft_slot > league.league_size {
            return Err(ConfigError::ValidationError {
                field: "draft.my_draft_slot".into(),
                message: format!(
                    "must be between 1 and {}, got {my_draft_slot}",
                    league.league_size
                ),
            }
            .into());
        }

        let teams = (0..league.league_size)
            .map(|idx| TeamState {
                team_idx: idx,
                team_name: league.team_name(idx),
                roster: RosterState::new(),
            })
            .collect();

        Ok(DraftSession {
            league,
            season,
            recommender,
            teams,
            picks: Vec::new(),
            my_team_idx: my_draft_slot - 1,
            rule: Rule::should_recommend(),
        })
    }

    /// Replace the admission rule used by `recommend_for_team`.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rule = rule;
        self
    }

    pub fn league(&self) -> &LeagueConfig {
        &self.league
    }

    pub fn season(&self) -> i32 {
        self.season
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn recommender(&self) -> &DraftRecommender {
        &self.recommender
    }

    pub fn recommender_mut(&mut self) -> &mut DraftRecommender {
        &mut self.recommender
    }

    pub fn teams(&self) -> &[TeamState] {
        &self.teams
    }

    pub fn team(&self, team_idx: usize) -> Option<&TeamState> {
        self.teams.get(team_idx)
    }

    pub fn my_team_idx(&self) -> usize {
        self.my_team_idx
    }

    /// Reference to the user's team state.
    pub fn my_team(&self) -> &TeamState {
        &self.teams[self.my_team_idx]
    }

    pub fn picks(&self) -> &[DraftPick] {
        &self.picks
    }

    pub fn pick_count(&self) -> usize {
        self.picks.len()
    }

    /// Picks needed to fill every roster.
    pub fn total_picks(&self) -> usize {
        self.league.league_size * self.league.roster_size() as usize
    }

    /// Every team's roster is full.
    pub fn is_complete(&self) -> bool {
        self.teams.iter().all(|t| t.roster.is_full(&self.league))
    }

    pub fn next_pick_number(&self) -> u32 {
        self.picks.len() as u32 + 1
    }

    pub fn current_round(&self) -> u32 {
        snake_position(self.next_pick_number(), self.teams.len()).0
    }

    /// Index of the team making the next pick, or `None` once the draft is
    /// complete.
    pub fn team_on_clock(&self) -> Option<usize> {
        if self.is_complete() {
            return None;
        }
        Some(snake_position(self.next_pick_number(), self.teams.len()).1)
    }

    /// Record the next pick: `player_id` goes to the team on the clock.
    ///
    /// The player must exist in the session's season and be undrafted, and
    /// the team must have an open slot for the position. On any error the
    /// session is unchanged.
    pub fn record_pick(&mut self, player_id: PlayerId) -> Result<DraftPick> {
        let team_idx = self.team_on_clock().ok_or(DraftError::DraftComplete)?;

        let record = self
            .recommender
            .table()
            .get(player_id)
            .ok_or(DraftError::UnknownPlayer(player_id))?;
        if record.season != self.season {
            return Err(DraftError::SeasonMismatch {
                player: player_id,
                season: record.season,
                expected: self.season,
            });
        }
        if self.recommender.is_drafted(player_id) {
            return Err(DraftError::AlreadyDrafted(player_id));
        }
        let position = record.position.clone();
        let player_name = record.name.clone();

        let team = &mut self.teams[team_idx];
        let slot = team.roster.assign(&position, &self.league)?;
        self.recommender.mark_player_drafted(player_id)?;

        let pick_number = self.next_pick_number();
        let (round, _) = snake_position(pick_number, self.teams.len());
        let pick = DraftPick {
            pick_number,
            round,
            team_idx,
            team_name: self.teams[team_idx].team_name.clone(),
            player_id,
            player_name,
            position,
            slot,
        };
        info!(
            "pick {} (round {}): {} takes {} {} into {}",
            pick.pick_number,
            pick.round,
            pick.team_name,
            pick.position,
            pick.player_name.as_deref().unwrap_or("(unnamed)"),
            pick.slot
        );
        self.picks.push(pick.clone());
        Ok(pick)
    }

    /// Clear every roster, the pick history and the drafted set.
    pub fn reset(&mut self) {
        for team in &mut self.teams {
            team.roster = RosterState::new();
        }
        self.picks.clear();
        self.recommender.reset_draft();
    }

    /// Restore the session by replaying a saved pick log.
    ///
    /// Used for crash recovery. Picks are replayed in pick-number order
    /// through `record_pick`, so the snake order decides the team; a logged
    /// team that disagrees is reported and the replayed assignment wins.
    pub fn restore_from_picks(&mut self, mut picks: Vec<DraftPick>) -> Result<()> {
        self.reset();
        picks.sort_by_key(|p| p.pick_number);

        for logged in picks {
            let replayed = self.record_pick(logged.player_id)?;
            if replayed.team_idx != logged.team_idx || replayed.pick_number != logged.pick_number {
                warn!(
                    "pick log mismatch: logged pick {} for team {}, replayed as pick {} for team {}",
                    logged.pick_number,
                    logged.team_idx + 1,
                    replayed.pick_number,
                    replayed.team_idx + 1
                );
            }
        }
        Ok(())
    }

    /// Recommendations for `team_idx`, optionally narrowed by the session rule.
    pub fn recommend_for_team(
        &mut self,
        team_idx: usize,
        top_n: usize,
        apply_rules: bool,
    ) -> Result<RecommendationSet> {
        let team = self.teams.get(team_idx).ok_or_else(|| {
            DraftError::Config(ConfigError::ValidationError {
                field: "team".into(),
                message: format!(
                    "team {} does not exist in a {}-team league",
                    team_idx + 1,
                    self.league.league_size
                ),
            })
        })?;

        if apply_rules {
            self.recommender.get_filtered_recommendations(
                &team.roster,
                &self.league,
                self.season,
                top_n,
                &self.rule,
            )
        } else {
            self.recommender
                .get_recommendations(&team.roster, &self.league, self.season, top_n)
        }
    }

    pub fn status(&self) -> DraftStatus {
        DraftStatus {
            season: self.season,
            picks_made: self.picks.len(),
            total_picks: self.total_picks(),
            round: self.current_round(),
            team_on_clock: self
                .team_on_clock()
                .map(|idx| self.teams[idx].team_name.clone()),
            complete: self.is_complete(),
            my_team: self.my_team().clone(),
        }
    }
}
