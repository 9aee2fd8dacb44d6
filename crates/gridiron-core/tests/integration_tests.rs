// Integration tests for the draft recommendation engine.
//
// These tests exercise the library end-to-end through its public API: CSV
// loading, recommendation queries, rule filtering, a scripted snake draft and
// crash recovery through the SQLite pick log.

use std::path::PathBuf;

use gridiron_core::config::{LeagueConfig, Thresholds, ValuationWeights};
use gridiron_core::db::Database;
use gridiron_core::draft::pick::Position;
use gridiron_core::draft::roster::{RosterError, Slot};
use gridiron_core::draft::state::DraftSession;
use gridiron_core::error::DraftError;
use gridiron_core::rankings::{load_rankings, load_rankings_from_reader, PlayerId, RankingTable};
use gridiron_core::recommender::DraftRecommender;
use gridiron_core::rules::{Rule, RuleOutcome};
use gridiron_core::valuation::tiers::Tier;
use gridiron_core::valuation::value::ValueScorer;

// ===========================================================================
// Test helpers
// ===========================================================================

const SEASON: i32 = 2023;

// Fixture row ids (row order of tests/fixtures/rankings.csv).
const ALPHA: PlayerId = PlayerId(0);
const BRAVO: PlayerId = PlayerId(1);
const CHARLIE: PlayerId = PlayerId(2);
const DELTA: PlayerId = PlayerId(3);
const ECHO: PlayerId = PlayerId(4);
const FOXTROT: PlayerId = PlayerId(5);
const GOLF: PlayerId = PlayerId(6);
const HOTEL: PlayerId = PlayerId(7);
const INDIA: PlayerId = PlayerId(8);
const JULIET: PlayerId = PlayerId(9);
const KILO: PlayerId = PlayerId(10);
const ALPHA_2022: PlayerId = PlayerId(11);

fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() < eps
}

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/rankings.csv")
}

fn fixture_table() -> RankingTable {
    load_rankings(&fixture_path()).expect("fixture rankings should load")
}

/// Two teams: QB, RB and WR starters, one RB/WR flex, one bench spot, at
/// most one QB per team.
fn two_team_league() -> LeagueConfig {
    LeagueConfig {
        name: "Integration League".into(),
        league_size: 2,
        starters_per_pos: [
            (Position::Quarterback, 1),
            (Position::RunningBack, 1),
            (Position::WideReceiver, 1),
        ]
        .into_iter()
        .collect(),
        flex_spots: 1,
        flex_eligible: vec![Position::RunningBack, Position::WideReceiver],
        bench_spots: 1,
        max_per_position: [(Position::Quarterback, 1)].into_iter().collect(),
        team_names: vec!["Sharks".into(), "Jets".into()],
    }
}

fn new_session() -> DraftSession {
    let recommender = DraftRecommender::new(
        fixture_table(),
        ValueScorer::new(ValuationWeights::default(), Thresholds::default()),
    );
    DraftSession::new(two_team_league(), recommender, SEASON, 1).expect("session should build")
}

/// Full snake draft for the two-team league, in pick order.
const SCRIPT: [PlayerId; 10] = [
    DELTA, ALPHA, GOLF, BRAVO, HOTEL, ECHO, FOXTROT, INDIA, JULIET, KILO,
];

// ===========================================================================
// Loading
// ===========================================================================

#[test]
fn fixture_loads_and_skips_bad_rows() {
    let table = fixture_table();
    // Two trailing rows are invalid: a percentile above 1 and a non-numeric
    // point total.
    assert_eq!(table.len(), 13);
    assert_eq!(table.latest_season(), Some(2023));
    assert_eq!(table.seasons().into_iter().collect::<Vec<_>>(), vec![2022, 2023]);

    let delta = table.get(DELTA).unwrap();
    assert_eq!(delta.name.as_deref(), Some("Delta Dunn"));
    assert_eq!(delta.position, Position::RunningBack);
    assert_eq!(delta.position_rank, 1);
    assert_eq!(delta.ppg_vs_position_avg, Some(4.0));
}

#[test]
fn stats_csv_is_ranked_by_cohort() {
    let csv = "\
name,position,season,games_played_season,fantasy_points
Ace,QB,2023,10,200
Bo,QB,2023,10,150
Cy,QB,2023,2,60
Di,RB,2023,10,100
";
    let table = load_rankings_from_reader(csv.as_bytes()).unwrap();
    // Cy played fewer than the minimum games.
    assert_eq!(table.len(), 3);

    let ace = table.get(PlayerId(0)).unwrap();
    assert_eq!(ace.name.as_deref(), Some("Ace"));
    assert_eq!(ace.position_rank, 1);
    assert!(approx_eq(ace.points_per_game, 20.0, 1e-9));
    assert!(approx_eq(ace.position_percentile, 1.0, 1e-9));
    assert!(approx_eq(ace.ppg_vs_position_avg.unwrap(), 2.5, 1e-9));

    let bo = table.get(PlayerId(1)).unwrap();
    assert_eq!(bo.position_rank, 2);
    assert!(approx_eq(bo.position_percentile, 0.5, 1e-9));

    let di = table.get(PlayerId(2)).unwrap();
    assert_eq!(di.position, Position::RunningBack);
    assert_eq!(di.position_rank, 1);
    assert!(approx_eq(di.ppg_vs_position_avg.unwrap(), 0.0, 1e-9));
}

#[test]
fn missing_required_column_is_an_error() {
    let csv = "name,position,season\nAce,QB,2023\n";
    assert!(load_rankings_from_reader(csv.as_bytes()).is_err());
}

// ===========================================================================
// Recommendations
// ===========================================================================

#[test]
fn empty_roster_recommendations_ranked_by_value() {
    let mut session = new_session();
    let set = session.recommend_for_team(0, 5, false).unwrap();

    assert!(!set.roster_full);
    assert_eq!(set.rules, RuleOutcome::NotApplied);
    assert_eq!(set.needs.get(&Position::Quarterback), 2);
    assert_eq!(set.needs.get(&Position::RunningBack), 3);
    assert_eq!(set.needs.get(&Position::WideReceiver), 3);
    assert_eq!(set.needs.get(&Position::TightEnd), 0);

    let ids: Vec<PlayerId> = set.candidates.iter().map(|c| c.player.player_id).collect();
    assert_eq!(ids, vec![DELTA, ALPHA, GOLF, BRAVO, ECHO]);

    let values: Vec<f64> = set.candidates.iter().map(|c| c.value_score).collect();
    for (got, want) in values.iter().zip([41.6, 39.13, 33.28, 23.8, 22.4]) {
        assert!(approx_eq(*got, want, 0.005), "got {got}, want {want}");
    }
}

#[test]
fn rule_filter_keeps_elite_players_only() {
    let mut session = new_session();
    let set = session.recommend_for_team(0, 5, true).unwrap();

    // No position clears the scarcity threshold, so only elite players pass.
    let ids: Vec<PlayerId> = set.candidates.iter().map(|c| c.player.player_id).collect();
    assert_eq!(ids, vec![DELTA, ALPHA, GOLF]);
    assert_eq!(set.rules, RuleOutcome::Applied { rejected: 2 });
    assert!(session.recommender().has_cached_scarcity(SEASON));
}

#[test]
fn rule_filter_falls_back_when_everything_is_rejected() {
    let mut session = new_session();
    for id in [DELTA, ALPHA, GOLF] {
        session.record_pick(id).unwrap();
    }
    // Only non-elite players remain in the top two for the Jets.
    let set = session.recommend_for_team(1, 2, true).unwrap();
    assert_eq!(set.rules, RuleOutcome::Bypassed);
    assert_eq!(set.candidates.len(), 2);
}

#[test]
fn scarcity_and_tiers_for_fixture_season() {
    let mut session = new_session();
    let scarcity = session.recommender_mut().get_position_scarcity(SEASON).unwrap();
    let order: Vec<&Position> = scarcity.iter().map(|r| &r.position).collect();
    assert_eq!(
        order,
        vec![
            &Position::RunningBack,
            &Position::TightEnd,
            &Position::Quarterback,
            &Position::WideReceiver,
        ]
    );
    let rb = &scarcity[0];
    assert_eq!(rb.total_players, 3);
    assert!(approx_eq(rb.median_ppg, 14.0, 1e-9));
    assert!(approx_eq(rb.scarcity_score, 4.0 / 14.0, 1e-9));

    let tiers = session
        .recommender()
        .get_tier_breakdowns(&Position::Quarterback, SEASON)
        .unwrap();
    let labels: Vec<Tier> = tiers.iter().map(|t| t.tier).collect();
    assert_eq!(labels, vec![Tier::Elite, Tier::Tier2, Tier::Tier3]);
    assert_eq!(tiers.iter().map(|t| t.count).sum::<usize>(), 3);
}

#[test]
fn unknown_season_is_data_unavailable() {
    let mut session = new_session();
    let err = session
        .recommender_mut()
        .get_position_scarcity(1999)
        .unwrap_err();
    assert!(matches!(err, DraftError::DataUnavailable(_)));
}

// ===========================================================================
// Draft flow
// ===========================================================================

#[test]
fn scripted_snake_draft_fills_every_roster() {
    let mut session = new_session();

    for (i, id) in SCRIPT.iter().enumerate() {
        let pick = session.record_pick(*id).unwrap();
        assert_eq!(pick.pick_number, i as u32 + 1);
    }

    let teams: Vec<usize> = session.picks().iter().map(|p| p.team_idx).collect();
    assert_eq!(teams, vec![0, 1, 1, 0, 0, 1, 1, 0, 0, 1]);

    let slots: Vec<&Slot> = session.picks().iter().map(|p| &p.slot).collect();
    assert_eq!(slots[0], &Slot::Starter(Position::RunningBack));
    assert_eq!(slots[6], &Slot::Flex);
    assert_eq!(slots[7], &Slot::Flex);
    assert_eq!(slots[8], &Slot::Bench);

    assert!(session.is_complete());
    assert_eq!(session.team_on_clock(), None);
    assert_eq!(session.pick_count(), session.total_picks());
    for team in session.teams() {
        team.roster.check_invariants(session.league()).unwrap();
    }

    let err = session.record_pick(CHARLIE).unwrap_err();
    assert!(matches!(err, DraftError::DraftComplete));

    let set = session.recommend_for_team(0, 5, false).unwrap();
    assert!(set.roster_full);
    assert!(set.is_empty());
}

#[test]
fn invalid_picks_leave_session_unchanged() {
    let mut session = new_session();
    session.record_pick(DELTA).unwrap();
    session.record_pick(ALPHA).unwrap();

    // Jets already hold their one allowed QB.
    let err = session.record_pick(BRAVO).unwrap_err();
    assert!(matches!(
        err,
        DraftError::Roster(RosterError::AtPositionCap { .. })
    ));

    assert!(matches!(
        session.record_pick(DELTA).unwrap_err(),
        DraftError::AlreadyDrafted(_)
    ));
    assert!(matches!(
        session.record_pick(ALPHA_2022).unwrap_err(),
        DraftError::SeasonMismatch { season: 2022, expected: 2023, .. }
    ));
    assert!(matches!(
        session.record_pick(PlayerId(999)).unwrap_err(),
        DraftError::UnknownPlayer(_)
    ));

    assert_eq!(session.pick_count(), 2);
    assert_eq!(session.team_on_clock(), Some(1));
    assert!(!session.recommender().is_drafted(BRAVO));
}

#[test]
fn drafted_players_leave_recommendations() {
    let mut session = new_session();
    session.record_pick(DELTA).unwrap();
    session.record_pick(ALPHA).unwrap();

    let set = session.recommend_for_team(1, 20, false).unwrap();
    let ids: Vec<PlayerId> = set.candidates.iter().map(|c| c.player.player_id).collect();
    assert!(!ids.contains(&DELTA));
    assert!(!ids.contains(&ALPHA));
    assert_eq!(ids.len(), 9);
    assert!(set
        .candidates
        .windows(2)
        .all(|w| w[0].value_score >= w[1].value_score));

    let best_rb = session
        .recommender()
        .get_best_available_by_position(&Position::RunningBack, SEASON, 5)
        .unwrap();
    let rb_ids: Vec<PlayerId> = best_rb.iter().map(|p| p.player_id).collect();
    assert_eq!(rb_ids, vec![ECHO, FOXTROT]);
}

// ===========================================================================
// Crash recovery
// ===========================================================================

#[test]
fn crash_recovery_restores_picks_and_continues() {
    let db = Database::open(":memory:").unwrap();
    let draft_id = db.current_or_new_draft_id().unwrap();

    let mut session = new_session();
    for id in &SCRIPT[..5] {
        let pick = session.record_pick(*id).unwrap();
        db.record_pick(&pick, &draft_id).unwrap();
    }
    assert!(db.has_draft_in_progress(&draft_id).unwrap());

    let mut restored = new_session();
    restored
        .restore_from_picks(db.load_picks(&draft_id).unwrap())
        .unwrap();

    assert_eq!(restored.picks(), session.picks());
    assert_eq!(restored.teams(), session.teams());
    assert_eq!(restored.team_on_clock(), session.team_on_clock());

    for id in &SCRIPT[5..] {
        restored.record_pick(*id).unwrap();
    }
    assert!(restored.is_complete());
}

#[test]
fn crash_recovery_empty_log_is_fresh_draft() {
    let db = Database::open(":memory:").unwrap();
    let draft_id = db.current_or_new_draft_id().unwrap();
    assert!(!db.has_draft_in_progress(&draft_id).unwrap());

    let mut session = new_session();
    session
        .restore_from_picks(db.load_picks(&draft_id).unwrap())
        .unwrap();
    assert_eq!(session.pick_count(), 0);
    assert_eq!(session.team_on_clock(), Some(0));
}

#[test]
fn reset_returns_players_to_pool() {
    let mut session = new_session();
    session.record_pick(DELTA).unwrap();
    session.reset();

    assert_eq!(session.pick_count(), 0);
    assert!(!session.recommender().is_drafted(DELTA));
    let set = session.recommend_for_team(0, 1, false).unwrap();
    assert_eq!(set.candidates[0].player.player_id, DELTA);
}

#[test]
fn custom_rule_changes_filtering() {
    let mut session = new_session().with_rule(Rule::All(vec![]));
    let set = session.recommend_for_team(0, 4, true).unwrap();
    assert_eq!(set.rules, RuleOutcome::Applied { rejected: 0 });
    assert_eq!(set.candidates.len(), 4);
}

// ===========================================================================
// Shipped sample data
// ===========================================================================

#[test]
fn sample_rankings_work_with_default_league() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/player_rankings.csv");
    let table = load_rankings(&path).unwrap();
    let season = table.latest_season().unwrap();
    assert_eq!(season, 2023);

    let recommender = DraftRecommender::new(table, ValueScorer::default());
    let mut session = DraftSession::new(LeagueConfig::default(), recommender, season, 1).unwrap();
    assert_eq!(session.total_picks(), 140);

    let set = session.recommend_for_team(0, 10, true).unwrap();
    assert!(!set.is_empty());
    assert!(!set.rules.is_bypassed());

    let top = set.candidates[0].player.player_id;
    let pick = session.record_pick(top).unwrap();
    assert_eq!(pick.team_idx, 0);
    assert_eq!(session.team_on_clock(), Some(1));

    // Every team drafts its best-valued player that still fits.
    while let Some(team) = session.team_on_clock() {
        let ranked: Vec<PlayerId> = session
            .recommend_for_team(team, usize::MAX, false)
            .unwrap()
            .candidates
            .iter()
            .map(|c| c.player.player_id)
            .collect();
        let picked = ranked.into_iter().any(|id| session.record_pick(id).is_ok());
        assert!(
            picked,
            "team {} found no draftable player at pick {}",
            team + 1,
            session.picks().len() + 1
        );
    }

    assert!(session.is_complete());
    assert_eq!(session.picks().len(), 140);
    let league = LeagueConfig::default();
    for team in session.teams() {
        team.roster.check_invariants(&league).unwrap();
        assert!(team.roster.is_full(&league));
        for pos in league.starter_positions() {
            assert_eq!(team.roster.starters_filled(pos), league.starters_at(pos));
        }
    }
}
