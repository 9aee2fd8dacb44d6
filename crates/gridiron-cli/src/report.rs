// Plain-text rendering of query results for the terminal.

use std::fmt::Write;

use gridiron_core::draft::pick::DraftPick;
use gridiron_core::draft::state::DraftStatus;
use gridiron_core::recommender::{PlayerLine, RecommendationSet};
use gridiron_core::rules::RuleOutcome;
use gridiron_core::valuation::scarcity::ScarcityRecord;
use gridiron_core::valuation::tiers::TierSummary;

fn player_name(line: &PlayerLine) -> &str {
    line.name.as_deref().unwrap_or("(unnamed)")
}

pub fn recommendations(team_name: &str, set: &RecommendationSet) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Recommendations for {team_name} (season {})", set.season);

    if set.roster_full {
        out.push_str("Roster is full.\n");
        return out;
    }

    let needs: Vec<String> = set
        .needs
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(pos, n)| format!("{pos}:{n}"))
        .collect();
    let _ = writeln!(out, "Needs: {}", needs.join(" "));

    match set.rules {
        RuleOutcome::NotApplied => {}
        RuleOutcome::Applied { rejected } => {
            let _ = writeln!(out, "Rule filter removed {rejected} candidate(s)");
        }
        RuleOutcome::Bypassed => {
            out.push_str("Rule filter rejected every candidate; showing unfiltered list\n");
        }
    }

    if set.candidates.is_empty() {
        out.push_str("No players available.\n");
        return out;
    }

    for (i, rec) in set.candidates.iter().enumerate() {
        let p = &rec.player;
        let _ = writeln!(
            out,
            "{:>3}. [{:>4}] {:<24} {:<4} ppg {:>6.2}  pct {:.2}  value {:>7.2}",
            i + 1,
            p.player_id,
            player_name(p),
            p.position,
            p.points_per_game,
            p.position_percentile,
            rec.value_score
        );
    }
    out
}

pub fn best_available(lines: &[PlayerLine]) -> String {
    if lines.is_empty() {
        return "No players available.\n".into();
    }
    let mut out = String::new();
    for (i, p) in lines.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. [{:>4}] {:<24} ppg {:>6.2}  pts {:>7.2}  rank {:>3}  pct {:.2}",
            i + 1,
            p.player_id,
            player_name(p),
            p.points_per_game,
            p.fantasy_points,
            p.position_rank,
            p.position_percentile
        );
    }
    out
}

pub fn scarcity(records: &[ScarcityRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<5} {:>7} {:>10} {:>8} {:>8} {:>8}",
        "POS", "players", "top10 ppg", "median", "drop", "score"
    );
    for r in records.iter().map(ScarcityRecord::rounded) {
        let _ = writeln!(
            out,
            "{:<5} {:>7} {:>10.2} {:>8.2} {:>8.2} {:>8.2}",
            r.position, r.total_players, r.top_decile_avg_ppg, r.median_ppg, r.drop_off, r.scarcity_score
        );
    }
    out
}

pub fn tiers(tiers: &[TierSummary]) -> String {
    let mut out = String::new();
    for t in tiers {
        let _ = writeln!(
            out,
            "{:<22} {:>4} players  avg {:>6.2}  range {:.2}-{:.2}",
            t.label, t.count, t.avg_ppg, t.min_ppg, t.max_ppg
        );
    }
    out
}

pub fn pick(pick: &DraftPick) -> String {
    format!(
        "Pick {} (round {}): {} takes [{}] {} {} into {}\n",
        pick.pick_number,
        pick.round,
        pick.team_name,
        pick.player_id,
        pick.player_name.as_deref().unwrap_or("(unnamed)"),
        pick.position,
        pick.slot
    )
}

pub fn status(status: &DraftStatus) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Season {}: {} of {} picks made",
        status.season, status.picks_made, status.total_picks
    );
    match &status.team_on_clock {
        Some(team) => {
            let _ = writeln!(out, "Round {}, {} on the clock", status.round, team);
        }
        None => out.push_str("Draft complete\n"),
    }

    let _ = writeln!(out, "{} roster:", status.my_team.team_name);
    let mut any = false;
    for (slot, count) in status.my_team.roster.slot_counts() {
        any = true;
        let _ = writeln!(out, "  {slot:<6} {count}");
    }
    if !any {
        out.push_str("  (empty)\n");
    }
    out
}
