// SQLite persistence for the pick log and key-value draft state.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::draft::pick::{DraftPick, Position};
use crate::draft::roster::Slot;
use crate::rankings::PlayerId;

/// SQLite-backed pick log. Picks are scoped by draft id so a new draft never
/// sees an earlier draft's picks.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS draft_picks (
                pick_number INTEGER NOT NULL,
                round       INTEGER NOT NULL,
                team_idx    INTEGER NOT NULL,
                team_name   TEXT NOT NULL,
                player_id   INTEGER NOT NULL,
                player_name TEXT,
                position    TEXT NOT NULL,
                slot        TEXT NOT NULL,
                draft_id    TEXT NOT NULL,
                timestamp   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (pick_number, draft_id)
            );

            CREATE INDEX IF NOT EXISTS idx_draft_picks_draft_id ON draft_picks(draft_id);

            CREATE TABLE IF NOT EXISTS draft_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock).
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Record a single draft pick. Re-recording the same pick number for the
    /// same draft is a no-op.
    pub fn record_pick(&self, pick: &DraftPick, draft_id: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR IGNORE INTO draft_picks
                (pick_number, round, team_idx, team_name, player_id, player_name, position, slot, draft_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                pick.pick_number,
                pick.round,
                pick.team_idx as i64,
                pick.team_name,
                pick.player_id.0 as i64,
                pick.player_name,
                pick.position.display_str(),
                pick.slot.display_str(),
                draft_id,
            ],
        )
        .context("failed to record draft pick")?;
        Ok(())
    }

    /// Load the picks of one draft, ordered by pick number.
    pub fn load_picks(&self, draft_id: &str) -> Result<Vec<DraftPick>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT pick_number, round, team_idx, team_name, player_id, player_name, position, slot
                 FROM draft_picks WHERE draft_id = ?1 ORDER BY pick_number",
            )
            .context("failed to prepare load_picks query")?;

        let picks = stmt
            .query_map(params![draft_id], |row| {
                let team_idx: i64 = row.get(2)?;
                let player_id: i64 = row.get(4)?;
                let position: String = row.get(6)?;
                let slot: String = row.get(7)?;
                Ok(DraftPick {
                    pick_number: row.get(0)?,
                    round: row.get(1)?,
                    team_idx: team_idx as usize,
                    team_name: row.get(3)?,
                    player_id: PlayerId(player_id as usize),
                    player_name: row.get(5)?,
                    position: Position::from_str_pos(&position),
                    slot: Slot::from_str_slot(&slot),
                })
            })
            .context("failed to query draft picks")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map draft pick rows")?;

        Ok(picks)
    }

    /// Persist an arbitrary JSON value under `key`, replacing any previous
    /// value.
    pub fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json_str =
            serde_json::to_string(value).context("failed to serialize state value")?;
        conn.execute(
            "INSERT OR REPLACE INTO draft_state (key, value) VALUES (?1, ?2)",
            params![key, json_str],
        )
        .context("failed to save state")?;
        Ok(())
    }

    /// Load a previously saved JSON value by `key`.
    pub fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT value FROM draft_state WHERE key = ?1")
            .context("failed to prepare load_state query")?;

        let mut rows = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))
            .context("failed to query draft state")?;

        match rows.next() {
            Some(row_result) => {
                let json_str = row_result.context("failed to read state row")?;
                let value = serde_json::from_str(&json_str)
                    .context("failed to deserialize state value")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Whether any pick has been recorded for `draft_id`.
    pub fn has_draft_in_progress(&self, draft_id: &str) -> Result<bool> {
        let conn = self.conn();
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM draft_picks WHERE draft_id = ?1)",
                params![draft_id],
                |row| row.get(0),
            )
            .context("failed to check draft_picks existence")?;
        Ok(exists)
    }

    pub fn pick_count(&self, draft_id: &str) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM draft_picks WHERE draft_id = ?1",
                params![draft_id],
                |row| row.get(0),
            )
            .context("failed to count draft picks")?;
        Ok(count as usize)
    }

    /// Delete all picks and draft state in one transaction.
    pub fn clear_draft(&self) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        tx.execute("DELETE FROM draft_picks", [])
            .context("failed to delete draft picks")?;
        tx.execute("DELETE FROM draft_state", [])
            .context("failed to delete draft state")?;
        tx.commit().context("failed to commit clear_draft")?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Draft ID management
    // ------------------------------------------------------------------

    const DRAFT_ID_KEY: &'static str = "current_draft_id";

    /// The stored draft id, if a draft has been started.
    pub fn get_draft_id(&self) -> Result<Option<String>> {
        let value = self.load_state(Self::DRAFT_ID_KEY)?;
        Ok(value.and_then(|v| v.as_str().map(|s| s.to_string())))
    }

    pub fn set_draft_id(&self, draft_id: &str) -> Result<()> {
        self.save_state(
            Self::DRAFT_ID_KEY,
            &serde_json::Value::String(draft_id.to_string()),
        )
    }

    /// The stored draft id, or a freshly generated one that is then stored.
    pub fn current_or_new_draft_id(&self) -> Result<String> {
        if let Some(id) = self.get_draft_id()? {
            return Ok(id);
        }
        let id = Self::generate_draft_id();
        self.set_draft_id(&id)?;
        Ok(id)
    }

    /// New draft id from the current UTC time, e.g. `draft_20260228_143022_123`.
    pub fn generate_draft_id() -> String {
        chrono::Utc::now()
            .format("draft_%Y%m%d_%H%M%S_%3f")
            .to_string()
    }

    // ------------------------------------------------------------------
    // Draft season
    // ------------------------------------------------------------------

    const DRAFT_SEASON_KEY: &'static str = "draft_season";

    /// Season the logged picks were drafted from, once the first pick is in.
    pub fn get_draft_season(&self) -> Result<Option<i32>> {
        let value = self.load_state(Self::DRAFT_SEASON_KEY)?;
        Ok(value
            .and_then(|v| v.as_i64())
            .and_then(|s| i32::try_from(s).ok()))
    }

    pub fn set_draft_season(&self, season: i32) -> Result<()> {
        self.save_state(Self::DRAFT_SEASON_KEY, &serde_json::Value::from(season))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TEST_DRAFT_ID: &str = "test_draft_001";

    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory database should open")
    }

    fn sample_pick(pick_number: u32) -> DraftPick {
        DraftPick {
            pick_number,
            round: 1,
            team_idx: (pick_number as usize - 1) % 4,
            team_name: format!("Team {pick_number}"),
            player_id: PlayerId(pick_number as usize * 10),
            player_name: Some(format!("Player {pick_number}")),
            position: Position::TeamDefense,
            slot: Slot::Starter(Position::TeamDefense),
        }
    }

    #[test]
    fn open_creates_tables() {
        let db = test_db();
        let conn = db.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(tables, vec!["draft_picks", "draft_state"]);
    }

    #[test]
    fn insert_and_load_picks_round_trip() {
        let db = test_db();
        let mut flex = sample_pick(2);
        flex.position = Position::WideReceiver;
        flex.slot = Slot::Flex;
        flex.player_name = None;

        db.record_pick(&sample_pick(1), TEST_DRAFT_ID).unwrap();
        db.record_pick(&flex, TEST_DRAFT_ID).unwrap();

        let picks = db.load_picks(TEST_DRAFT_ID).unwrap();
        assert_eq!(picks, vec![sample_pick(1), flex]);
    }

    #[test]
    fn load_picks_ordered_by_pick_number() {
        let db = test_db();
        for n in [3, 1, 2] {
            db.record_pick(&sample_pick(n), TEST_DRAFT_ID).unwrap();
        }
        let numbers: Vec<u32> = db
            .load_picks(TEST_DRAFT_ID)
            .unwrap()
            .iter()
            .map(|p| p.pick_number)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn record_pick_idempotent_on_duplicate() {
        let db = test_db();
        db.record_pick(&sample_pick(1), TEST_DRAFT_ID).unwrap();
        let mut dup = sample_pick(1);
        dup.team_name = "Someone Else".into();
        db.record_pick(&dup, TEST_DRAFT_ID).unwrap();

        let picks = db.load_picks(TEST_DRAFT_ID).unwrap();
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].team_name, "Team 1");
    }

    #[test]
    fn picks_scoped_to_draft_id() {
        let db = test_db();
        db.record_pick(&sample_pick(1), "draft_a").unwrap();
        db.record_pick(&sample_pick(1), "draft_b").unwrap();
        db.record_pick(&sample_pick(2), "draft_b").unwrap();

        assert_eq!(db.pick_count("draft_a").unwrap(), 1);
        assert_eq!(db.pick_count("draft_b").unwrap(), 2);
        assert_eq!(db.load_picks("draft_c").unwrap(), vec![]);
    }

    #[test]
    fn save_and_load_state_round_trip() {
        let db = test_db();
        db.save_state("k", &json!({"round": 3})).unwrap();
        assert_eq!(db.load_state("k").unwrap(), Some(json!({"round": 3})));
        db.save_state("k", &json!("replaced")).unwrap();
        assert_eq!(db.load_state("k").unwrap(), Some(json!("replaced")));
        assert_eq!(db.load_state("missing").unwrap(), None);
    }

    #[test]
    fn has_draft_in_progress_false_then_true() {
        let db = test_db();
        assert!(!db.has_draft_in_progress(TEST_DRAFT_ID).unwrap());
        db.record_pick(&sample_pick(1), TEST_DRAFT_ID).unwrap();
        assert!(db.has_draft_in_progress(TEST_DRAFT_ID).unwrap());
    }

    #[test]
    fn clear_draft_resets_picks_and_state() {
        let db = test_db();
        db.record_pick(&sample_pick(1), TEST_DRAFT_ID).unwrap();
        db.set_draft_id(TEST_DRAFT_ID).unwrap();

        db.clear_draft().unwrap();
        assert_eq!(db.pick_count(TEST_DRAFT_ID).unwrap(), 0);
        assert_eq!(db.get_draft_id().unwrap(), None);
    }

    #[test]
    fn draft_id_persists_via_state_store() {
        let db = test_db();
        assert_eq!(db.get_draft_id().unwrap(), None);
        let id = db.current_or_new_draft_id().unwrap();
        assert!(id.starts_with("draft_"));
        assert_eq!(db.current_or_new_draft_id().unwrap(), id);
        assert_eq!(db.get_draft_id().unwrap().as_deref(), Some(id.as_str()));
    }

    #[test]
    fn draft_season_round_trip_and_cleared_with_draft() {
        let db = test_db();
        assert_eq!(db.get_draft_season().unwrap(), None);
        db.set_draft_season(2023).unwrap();
        assert_eq!(db.get_draft_season().unwrap(), Some(2023));

        db.clear_draft().unwrap();
        assert_eq!(db.get_draft_season().unwrap(), None);
    }

    #[test]
    fn generate_draft_id_format() {
        let id = Database::generate_draft_id();
        // draft_YYYYMMDD_HHMMSS_mmm
        assert_eq!(id.len(), "draft_20260228_143022_123".len());
        assert!(id.starts_with("draft_"));
    }
}
