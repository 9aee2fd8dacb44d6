// Gridiron entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Open database, resolve the current draft id
// 4. Load rankings, choose the draft season
// 5. Build the draft session and replay the pick log
// 6. Run the requested command

mod args;
mod report;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use gridiron_core::config::{self, Config, LeagueConfig, StrategyConfig};
use gridiron_core::db::Database;
use gridiron_core::draft::state::DraftSession;
use gridiron_core::rankings::{self, PlayerId, RankingTable};
use gridiron_core::recommender::DraftRecommender;
use gridiron_core::valuation::scarcity::ScarcityRecord;
use gridiron_core::valuation::value::ValueScorer;

use args::{Cli, Command};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("gridiron starting: {:?}", cli.command);

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, {} teams, {} roster spots",
        config.league.name,
        config.league.league_size,
        config.league.roster_size()
    );

    // 3. Open database
    let db = Database::open(&config.db_path).context("failed to open database")?;
    let draft_id = db.current_or_new_draft_id()?;
    info!("Database opened at {} (draft {})", config.db_path, draft_id);

    // 4. Rankings and the draft season
    let path = std::path::Path::new(&config.data_paths.rankings);
    let table = rankings::load_rankings(path)
        .with_context(|| format!("failed to load rankings from {}", path.display()))?;
    info!("Loaded {} ranked player-seasons", table.len());

    let resetting = matches!(cli.command, Command::Reset);
    let stored = if resetting {
        None
    } else {
        db.get_draft_season()?
    };
    let season = draft_season(stored, cli.season, config.strategy.season, &table)?;
    if !table.seasons().contains(&season) {
        warn!("season {} not present in {}", season, path.display());
    }

    // 5. Session and pick-log replay
    let mut session = build_session(&config.league, &config.strategy, table, season)?;

    // A reset must work even when the stored log no longer replays.
    if !resetting {
        let picks = db.load_picks(&draft_id)?;
        if !picks.is_empty() {
            info!("Replaying {} logged picks", picks.len());
        }
        session
            .restore_from_picks(picks)
            .context("failed to replay the pick log; run `gridiron reset` to start over")?;
    }

    // 6. Run the command
    run(cli, &config, &db, &draft_id, &mut session)
}

/// Season the draft session is bound to.
///
/// Once a pick is logged the stored season wins, so the log always replays;
/// a different `--season` then only steers the read-only queries. Before the
/// first pick: `--season`, then `draft.season`, then the latest season.
fn draft_season(
    stored: Option<i32>,
    requested: Option<i32>,
    configured: Option<i32>,
    table: &RankingTable,
) -> anyhow::Result<i32> {
    if let Some(season) = stored {
        if let Some(r) = requested.filter(|r| *r != season) {
            info!("draft in progress uses season {}; --season {} applies to queries only", season, r);
        }
        return Ok(season);
    }
    requested
        .or(configured)
        .or_else(|| table.latest_season())
        .ok_or_else(|| anyhow!("ranking table has no seasons"))
}

/// Season for read-only queries: `--season` if given, else the draft's.
fn query_season(requested: Option<i32>, session: &DraftSession) -> i32 {
    requested.unwrap_or_else(|| session.season())
}

/// Draft commands act on the session's season and refuse another one.
fn check_draft_season(requested: Option<i32>, session: &DraftSession) -> anyhow::Result<()> {
    match requested {
        Some(r) if r != session.season() => bail!(
            "the draft in progress uses season {}; --season {} only applies to \
             best, scarcity and tiers (run `gridiron reset` to draft another season)",
            session.season(),
            r
        ),
        _ => Ok(()),
    }
}

fn build_session(
    league: &LeagueConfig,
    strategy: &StrategyConfig,
    table: RankingTable,
    season: i32,
) -> anyhow::Result<DraftSession> {
    let scorer = ValueScorer::new(strategy.weights, strategy.thresholds);
    let recommender = DraftRecommender::new(table, scorer);
    let session = DraftSession::new(league.clone(), recommender, season, strategy.my_draft_slot)?;
    Ok(session)
}

fn run(
    cli: Cli,
    config: &Config,
    db: &Database,
    draft_id: &str,
    session: &mut DraftSession,
) -> anyhow::Result<()> {
    let json = cli.json;
    let season = query_season(cli.season, session);

    match cli.command {
        Command::Recommend { team, top, rules } => {
            check_draft_season(cli.season, session)?;
            let team_idx = match team {
                Some(0) => bail!("--team is 1-based"),
                Some(n) => n - 1,
                None => session.my_team_idx(),
            };
            let top_n = top.unwrap_or(config.strategy.top_n);
            let apply_rules = rules || config.strategy.apply_rules;
            let set = session.recommend_for_team(team_idx, top_n, apply_rules)?;
            let team_name = config.league.team_name(team_idx);
            emit(json, &set, || report::recommendations(&team_name, &set))
        }
        Command::Best { position, n } => {
            let lines = session
                .recommender()
                .get_best_available_by_position(&position, season, n)?;
            emit(json, &lines, || report::best_available(&lines))
        }
        Command::Scarcity => {
            let records: Vec<ScarcityRecord> = session
                .recommender_mut()
                .get_position_scarcity(season)?
                .iter()
                .map(ScarcityRecord::rounded)
                .collect();
            emit(json, &records, || report::scarcity(&records))
        }
        Command::Tiers { position } => {
            let tiers = session
                .recommender()
                .get_tier_breakdowns(&position, season)?;
            emit(json, &tiers, || report::tiers(&tiers))
        }
        Command::Pick { player_id } => {
            check_draft_season(cli.season, session)?;
            let pick = session.record_pick(PlayerId(player_id))?;
            db.record_pick(&pick, draft_id)?;
            if db.get_draft_season()?.is_none() {
                db.set_draft_season(session.season())?;
            }
            emit(json, &pick, || report::pick(&pick))
        }
        Command::Status => {
            check_draft_season(cli.season, session)?;
            let status = session.status();
            emit(json, &status, || report::status(&status))
        }
        Command::Reset => {
            db.clear_draft()?;
            let new_id = Database::generate_draft_id();
            db.set_draft_id(&new_id)?;
            session.reset();
            info!("Draft {} discarded, started {}", draft_id, new_id);
            let status = session.status();
            emit(json, &status, || format!("Started new draft {new_id}\n"))
        }
    }
}

/// Print `value` as pretty JSON, or the text rendering.
fn emit<T, F>(json: bool, value: &T, text: F) -> anyhow::Result<()>
where
    T: Serialize,
    F: FnOnce() -> String,
{
    if json {
        let out = serde_json::to_string_pretty(value).context("failed to serialize output")?;
        println!("{out}");
    } else {
        print!("{}", text());
    }
    Ok(())
}

/// Initialize tracing to log to a file so stdout carries only command output.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("gridiron.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gridiron_core=info,gridiron_cli=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
