// Draft admission rules: boolean predicates combined into an expression tree.

use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

use crate::config::{LeagueConfig, Thresholds};
use crate::draft::pick::Position;
use crate::draft::roster::RosterState;
use crate::rankings::PlayerSeasonRecord;
use crate::valuation::round2;
use crate::valuation::scarcity::{score_for, ScarcityRecord};

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// The team still wants a player at `pos`: a starter slot is open, or the
/// position is under its cap and the bench has room.
pub fn needs_position(roster: &RosterState, league: &LeagueConfig, pos: &Position) -> bool {
    let starter_open = roster.starters_filled(pos) < league.starters_at(pos);
    let bench_room = roster.rostered_at(pos) < league.max_at(pos) && !roster.bench_full(league);
    starter_open || bench_room
}

pub fn is_elite(player: &PlayerSeasonRecord, thresholds: &Thresholds) -> bool {
    player.position_percentile >= thresholds.elite_percentile
}

/// Compares the score as reported, rounded to two decimals. False when no
/// scarcity was computed for the position.
pub fn is_scarce(pos: &Position, scarcity: Option<&[ScarcityRecord]>, thresholds: &Thresholds) -> bool {
    scarcity
        .and_then(|records| score_for(records, pos))
        .is_some_and(|score| round2(score) > thresholds.scarcity_threshold)
}

pub fn at_max(roster: &RosterState, league: &LeagueConfig, pos: &Position) -> bool {
    roster.rostered_at(pos) >= league.max_at(pos)
}

/// Every starter slot at `pos` is filled. Trivially true for positions
/// without starter slots.
pub fn has_starter_at(roster: &RosterState, league: &LeagueConfig, pos: &Position) -> bool {
    roster.starters_filled(pos) >= league.starters_at(pos)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Predicate {
    NeedsPosition,
    IsElite,
    IsScarce,
    AtMax,
    HasStarterAt,
}

impl Predicate {
    pub fn name(&self) -> &'static str {
        match self {
            Predicate::NeedsPosition => "NeedsPosition",
            Predicate::IsElite => "IsElite",
            Predicate::IsScarce => "IsScarce",
            Predicate::AtMax => "AtMax",
            Predicate::HasStarterAt => "HasStarterAt",
        }
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// What a rule is evaluated against: the acting team's roster and the
/// season's scarcity table, if any.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub roster: &'a RosterState,
    pub league: &'a LeagueConfig,
    pub scarcity: Option<&'a [ScarcityRecord]>,
    pub thresholds: Thresholds,
}

impl RuleContext<'_> {
    pub fn check(&self, predicate: Predicate, player: &PlayerSeasonRecord) -> bool {
        let pos = &player.position;
        match predicate {
            Predicate::NeedsPosition => needs_position(self.roster, self.league, pos),
            Predicate::IsElite => is_elite(player, &self.thresholds),
            Predicate::IsScarce => is_scarce(pos, self.scarcity, &self.thresholds),
            Predicate::AtMax => at_max(self.roster, self.league, pos),
            Predicate::HasStarterAt => has_starter_at(self.roster, self.league, pos),
        }
    }
}

/// Boolean expression over predicates. An empty `All` is true, an empty
/// `Any` is false.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Rule {
    Pred(Predicate),
    Not(Box<Rule>),
    All(Vec<Rule>),
    Any(Vec<Rule>),
}

impl Rule {
    /// NeedsPosition AND NOT AtMax AND (IsElite OR IsScarce)
    pub fn should_recommend() -> Rule {
        Rule::All(vec![
            Rule::Pred(Predicate::NeedsPosition),
            Rule::Not(Box::new(Rule::Pred(Predicate::AtMax))),
            Rule::Any(vec![
                Rule::Pred(Predicate::IsElite),
                Rule::Pred(Predicate::IsScarce),
            ]),
        ])
    }

    pub fn evaluate(&self, ctx: &RuleContext<'_>, player: &PlayerSeasonRecord) -> bool {
        match self {
            Rule::Pred(p) => ctx.check(*p, player),
            Rule::Not(inner) => !inner.evaluate(ctx, player),
            Rule::All(rules) => rules.iter().all(|r| r.evaluate(ctx, player)),
            Rule::Any(rules) => rules.iter().any(|r| r.evaluate(ctx, player)),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, rules: &[Rule], op: &str) -> fmt::Result {
            for (i, r) in rules.iter().enumerate() {
                if i > 0 {
                    write!(f, " {op} ")?;
                }
                match r {
                    Rule::All(_) | Rule::Any(_) => write!(f, "({r})")?,
                    _ => write!(f, "{r}")?,
                }
            }
            Ok(())
        }
        match self {
            Rule::Pred(p) => write!(f, "{}", p.name()),
            Rule::Not(inner) => match inner.as_ref() {
                Rule::All(_) | Rule::Any(_) => write!(f, "NOT ({inner})"),
                _ => write!(f, "NOT {inner}"),
            },
            Rule::All(rules) if rules.is_empty() => write!(f, "TRUE"),
            Rule::Any(rules) if rules.is_empty() => write!(f, "FALSE"),
            Rule::All(rules) => join(f, rules, "AND"),
            Rule::Any(rules) => join(f, rules, "OR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// How a rule filter affected a candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RuleOutcome {
    /// No rule was applied.
    NotApplied,
    /// The rule ran and `rejected` candidates were removed.
    Applied { rejected: usize },
    /// The rule rejected every candidate, so the list was returned unfiltered.
    Bypassed,
}

impl RuleOutcome {
    pub fn is_bypassed(&self) -> bool {
        matches!(self, RuleOutcome::Bypassed)
    }
}

/// Keep the candidates `rule` admits, in their original order.
///
/// A non-empty input never comes back empty: if nothing passes, the input is
/// returned unchanged with [`RuleOutcome::Bypassed`].
pub fn filter_candidates<T, F>(
    rule: &Rule,
    ctx: &RuleContext<'_>,
    candidates: Vec<T>,
    player_of: F,
) -> (Vec<T>, RuleOutcome)
where
    F: Fn(&T) -> &PlayerSeasonRecord,
{
    if candidates.is_empty() {
        return (candidates, RuleOutcome::Applied { rejected: 0 });
    }

    let admitted: Vec<bool> = candidates
        .iter()
        .map(|c| rule.evaluate(ctx, player_of(c)))
        .collect();
    let kept = admitted.iter().filter(|&&ok| ok).count();

    if kept == 0 {
        warn!(
            "rule `{}` rejected all {} candidates; returning them unfiltered",
            rule,
            candidates.len()
        );
        return (candidates, RuleOutcome::Bypassed);
    }

    let rejected = candidates.len() - kept;
    debug!("rule `{}` rejected {} of {} candidates", rule, rejected, candidates.len());
    let filtered = candidates
        .into_iter()
        .zip(admitted)
        .filter_map(|(c, ok)| ok.then_some(c))
        .collect();
    (filtered, RuleOutcome::Applied { rejected })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn league() -> LeagueConfig {
        LeagueConfig {
            name: "rules".into(),
            league_size: 2,
            starters_per_pos: [(Position::Quarterback, 1), (Position::RunningBack, 2)]
                .into_iter()
                .collect(),
            flex_spots: 1,
            flex_eligible: vec![Position::RunningBack],
            bench_spots: 1,
            max_per_position: [(Position::Quarterback, 1), (Position::RunningBack, 4)]
                .into_iter()
                .collect(),
            team_names: vec![],
        }
    }

    fn player(pos: Position, pct: f64) -> PlayerSeasonRecord {
        PlayerSeasonRecord {
            name: None,
            position: pos,
            season: 2023,
            games_played: 17,
            fantasy_points: 200.0,
            points_per_game: 12.0,
            position_rank: 1,
            position_percentile: pct,
            ppg_vs_position_avg: None,
        }
    }

    fn scarcity(pos: Position, score: f64) -> ScarcityRecord {
        ScarcityRecord {
            position: pos,
            total_players: 10,
            top_decile_avg_ppg: 20.0,
            median_ppg: 10.0,
            drop_off: 10.0,
            scarcity_score: score,
        }
    }

    #[test]
    fn needs_position_and_at_max() {
        let league = league();
        let mut roster = RosterState::new();
        let qb = Position::Quarterback;
        assert!(needs_position(&roster, &league, &qb));
        assert!(!at_max(&roster, &league, &qb));
        assert!(!has_starter_at(&roster, &league, &qb));

        roster.assign(&qb, &league).unwrap();
        // cap of 1 reached: no starter slot open and no bench eligibility
        assert!(!needs_position(&roster, &league, &qb));
        assert!(at_max(&roster, &league, &qb));
        assert!(has_starter_at(&roster, &league, &qb));
    }

    #[test]
    fn unconfigured_position_uses_default_cap() {
        let league = league();
        let roster = RosterState::new();
        let k = Position::Kicker;
        // no starter slot, but under the default cap with bench room
        assert!(needs_position(&roster, &league, &k));
        assert!(!at_max(&roster, &league, &k));
        assert!(has_starter_at(&roster, &league, &k));
    }

    #[test]
    fn is_scarce_threshold_is_strict() {
        let t = Thresholds::default();
        let records = vec![
            scarcity(Position::TightEnd, 1.5),
            scarcity(Position::RunningBack, 1.6),
        ];
        assert!(!is_scarce(&Position::TightEnd, Some(records.as_slice()), &t));
        assert!(is_scarce(&Position::RunningBack, Some(records.as_slice()), &t));
        assert!(!is_scarce(&Position::Quarterback, Some(records.as_slice()), &t));
        assert!(!is_scarce(&Position::RunningBack, None, &t));
    }

    #[test]
    fn is_scarce_compares_reported_score() {
        let t = Thresholds::default();
        // 1.503 reports as 1.50, which does not clear a 1.5 threshold.
        let records = vec![
            scarcity(Position::TightEnd, 1.503),
            scarcity(Position::RunningBack, 1.506),
        ];
        assert!(!is_scarce(&Position::TightEnd, Some(records.as_slice()), &t));
        assert!(is_scarce(&Position::RunningBack, Some(records.as_slice()), &t));
    }

    #[test]
    fn should_recommend_truth_table() {
        let league = league();
        let roster = RosterState::new();
        let records = vec![scarcity(Position::RunningBack, 2.0)];
        let ctx = RuleContext {
            roster: &roster,
            league: &league,
            scarcity: Some(records.as_slice()),
            thresholds: Thresholds::default(),
        };
        let rule = Rule::should_recommend();

        // needed + elite
        assert!(rule.evaluate(&ctx, &player(Position::Quarterback, 0.85)));
        // needed, not elite, not scarce
        assert!(!rule.evaluate(&ctx, &player(Position::Quarterback, 0.5)));
        // needed, not elite, scarce
        assert!(rule.evaluate(&ctx, &player(Position::RunningBack, 0.5)));
    }

    #[test]
    fn should_recommend_rejects_capped_position() {
        let league = league();
        let mut roster = RosterState::new();
        roster.assign(&Position::Quarterback, &league).unwrap();
        let ctx = RuleContext {
            roster: &roster,
            league: &league,
            scarcity: None,
            thresholds: Thresholds::default(),
        };
        assert!(!Rule::should_recommend().evaluate(&ctx, &player(Position::Quarterback, 0.99)));
    }

    #[test]
    fn empty_combinators() {
        let league = league();
        let roster = RosterState::new();
        let ctx = RuleContext {
            roster: &roster,
            league: &league,
            scarcity: None,
            thresholds: Thresholds::default(),
        };
        let p = player(Position::Quarterback, 0.5);
        assert!(Rule::All(vec![]).evaluate(&ctx, &p));
        assert!(!Rule::Any(vec![]).evaluate(&ctx, &p));
    }

    #[test]
    fn display_reads_as_formula() {
        assert_eq!(
            Rule::should_recommend().to_string(),
            "NeedsPosition AND NOT AtMax AND (IsElite OR IsScarce)"
        );
    }

    #[test]
    fn filter_preserves_order() {
        let league = league();
        let roster = RosterState::new();
        let ctx = RuleContext {
            roster: &roster,
            league: &league,
            scarcity: None,
            thresholds: Thresholds::default(),
        };
        let candidates = vec![
            ("a", player(Position::RunningBack, 0.9)),
            ("b", player(Position::RunningBack, 0.1)),
            ("c", player(Position::Quarterback, 0.95)),
            ("d", player(Position::Quarterback, 0.2)),
        ];
        let (kept, outcome) =
            filter_candidates(&Rule::should_recommend(), &ctx, candidates, |c| &c.1);
        let names: Vec<&str> = kept.iter().map(|c| c.0).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(outcome, RuleOutcome::Applied { rejected: 2 });
    }

    #[test]
    fn filter_never_empties_nonempty_input() {
        let league = league();
        let roster = RosterState::new();
        let ctx = RuleContext {
            roster: &roster,
            league: &league,
            scarcity: None,
            thresholds: Thresholds::default(),
        };
        let candidates = vec![
            player(Position::RunningBack, 0.1),
            player(Position::Quarterback, 0.2),
        ];
        let (kept, outcome) =
            filter_candidates(&Rule::should_recommend(), &ctx, candidates.clone(), |c| c);
        assert_eq!(kept, candidates);
        assert!(outcome.is_bypassed());
    }

    #[test]
    fn filter_of_empty_input_is_empty() {
        let league = league();
        let roster = RosterState::new();
        let ctx = RuleContext {
            roster: &roster,
            league: &league,
            scarcity: None,
            thresholds: Thresholds::default(),
        };
        let (kept, outcome) = filter_candidates(
            &Rule::should_recommend(),
            &ctx,
            Vec::<PlayerSeasonRecord>::new(),
            |c| c,
        );
        assert!(kept.is_empty());
        assert!(!outcome.is_bypassed());
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_string(&RuleOutcome::Applied { rejected: 3 }).unwrap();
        assert_eq!(json, r#"{"status":"applied","rejected":3}"#);
    }
}
