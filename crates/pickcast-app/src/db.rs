// SQLite persistence for committed draft actions and key-value state.

use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use pickcast_core::{ActionKind, DraftAction, HeroId, Side};

/// SQLite-backed store for the ordered action list of each match, plus
/// JSON blobs such as simulation traces.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database at `path` and ensure the schema exists.
    /// Pass `":memory:"` for an ephemeral database.
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
            CREATE TABLE IF NOT EXISTS draft_actions (
                match_id   TEXT NOT NULL,
                step_index INTEGER NOT NULL,
                side       TEXT NOT NULL,
                action     TEXT NOT NULL,
                hero_id    INTEGER NOT NULL,
                slot       INTEGER NOT NULL,
                timestamp  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (match_id, step_index)
            );

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

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Draft actions
    // ------------------------------------------------------------------

    /// Append one committed action. Returns `false` when the step was
    /// already recorded, in which case the stored row is left untouched.
    pub fn record_action(&self, match_id: &str, step_index: usize, action: &DraftAction) -> Result<bool> {
        let conn = self.conn();
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO draft_actions
                    (match_id, step_index, side, action, hero_id, slot)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    match_id,
                    step_index as i64,
                    action.side.label(),
                    action.action.label(),
                    action.hero.0,
                    action.slot as i64,
                ],
            )
            .context("failed to record draft action")?;
        Ok(inserted == 1)
    }

    /// Every action of a match, in step order.
    pub fn load_actions(&self, match_id: &str) -> Result<Vec<DraftAction>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT step_index, side, action, hero_id, slot
                 FROM draft_actions WHERE match_id = ?1 ORDER BY step_index",
            )
            .context("failed to prepare load_actions query")?;

        let rows = stmt
            .query_map(params![match_id], read_action_row)
            .context("failed to query draft actions")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map draft action rows")?;

        rows.into_iter().map(decode_action).collect()
    }

    /// The action stored for one step, if any.
    pub fn action_at(&self, match_id: &str, step_index: usize) -> Result<Option<DraftAction>> {
        let conn = self.conn();
        let row = conn
            .query_row(
                "SELECT step_index, side, action, hero_id, slot
                 FROM draft_actions WHERE match_id = ?1 AND step_index = ?2",
                params![match_id, step_index as i64],
                read_action_row,
            )
            .optional()
            .context("failed to query draft action")?;
        row.map(decode_action).transpose()
    }

    /// Whether at least one action is recorded for `match_id`.
    pub fn has_draft_in_progress(&self, match_id: &str) -> Result<bool> {
        let conn = self.conn();
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM draft_actions WHERE match_id = ?1)",
                params![match_id],
                |row| row.get(0),
            )
            .context("failed to check draft_actions existence")?;
        Ok(exists)
    }

    pub fn action_count(&self, match_id: &str) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM draft_actions WHERE match_id = ?1",
                params![match_id],
                |row| row.get(0),
            )
            .context("failed to count draft actions")?;
        Ok(count as usize)
    }

    /// Delete the actions and state entries of one match.
    pub fn clear_match(&self, match_id: &str) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        tx.execute("DELETE FROM draft_actions WHERE match_id = ?1", params![match_id])
            .context("failed to delete draft actions")?;
        tx.execute(
            "DELETE FROM draft_state WHERE key = ?1",
            params![trace_key(match_id)],
        )
        .context("failed to delete draft state")?;
        tx.commit().context("failed to commit clear_match")?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Key-value state
    // ------------------------------------------------------------------

    /// Store `value` as JSON under `key`, replacing any previous value.
    pub fn save_state<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value).context("failed to serialize state value")?;
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO draft_state (key, value) VALUES (?1, ?2)",
                params![key, json],
            )
            .with_context(|| format!("failed to save state '{key}'"))?;
        Ok(())
    }

    /// Read the JSON stored under `key` back into a `T`.
    pub fn load_state<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let json: Option<String> = self
            .conn()
            .query_row(
                "SELECT value FROM draft_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("failed to load state '{key}'"))?;
        json.map(|j| {
            serde_json::from_str(&j).with_context(|| format!("state '{key}' has an unexpected shape"))
        })
        .transpose()
    }

    // ------------------------------------------------------------------
    // Match ID management
    // ------------------------------------------------------------------

    const MATCH_ID_KEY: &'static str = "current_match_id";

    /// The match most recently started from this database, if any.
    pub fn get_match_id(&self) -> Result<Option<String>> {
        self.load_state(Self::MATCH_ID_KEY)
    }

    pub fn set_match_id(&self, match_id: &str) -> Result<()> {
        self.save_state(Self::MATCH_ID_KEY, match_id)
    }

    /// New match id from the current UTC time, e.g. `match_20261019_143022_123`.
    pub fn generate_match_id() -> String {
        chrono::Utc::now().format("match_%Y%m%d_%H%M%S_%3f").to_string()
    }
}

type ActionRow = (i64, String, String, u32, i64);

fn read_action_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ActionRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn decode_action((step, side, action, hero, slot): ActionRow) -> Result<DraftAction> {
    let side = Side::from_str_side(&side).ok_or_else(|| anyhow!("step {step}: unknown side '{side}'"))?;
    let action = ActionKind::from_str_action(&action)
        .ok_or_else(|| anyhow!("step {step}: unknown action '{action}'"))?;
    let slot = usize::try_from(slot).with_context(|| format!("step {step}: negative slot"))?;
    Ok(DraftAction {
        side,
        action,
        hero: HeroId(hero),
        slot,
    })
}

/// State key under which a match's simulation trace is stored.
pub fn trace_key(match_id: &str) -> String {
    format!("trace:{match_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATCH: &str = "match_test";

    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory database should open")
    }

    fn ban(side: Side, hero: u32, slot: usize) -> DraftAction {
        DraftAction {
            side,
            action: ActionKind::Ban,
            hero: HeroId(hero),
            slot,
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
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert!(tables.contains(&"draft_actions".to_string()));
        assert!(tables.contains(&"draft_state".to_string()));
    }

    #[test]
    fn record_and_load_actions_in_step_order() {
        let db = test_db();
        db.record_action(MATCH, 1, &ban(Side::Red, 7, 0)).unwrap();
        db.record_action(MATCH, 0, &ban(Side::Blue, 3, 0)).unwrap();
        let actions = db.load_actions(MATCH).unwrap();
        assert_eq!(actions, vec![ban(Side::Blue, 3, 0), ban(Side::Red, 7, 0)]);
    }

    #[test]
    fn duplicate_step_is_ignored_and_reported() {
        let db = test_db();
        assert!(db.record_action(MATCH, 0, &ban(Side::Blue, 3, 0)).unwrap());
        assert!(!db.record_action(MATCH, 0, &ban(Side::Blue, 9, 0)).unwrap());
        let actions = db.load_actions(MATCH).unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].hero, HeroId(3));
    }

    #[test]
    fn action_at_reads_one_step() {
        let db = test_db();
        db.record_action(MATCH, 0, &ban(Side::Blue, 3, 0)).unwrap();
        assert_eq!(db.action_at(MATCH, 0).unwrap(), Some(ban(Side::Blue, 3, 0)));
        assert!(db.action_at(MATCH, 1).unwrap().is_none());
        assert!(db.action_at("other", 0).unwrap().is_none());
    }

    #[test]
    fn matches_are_isolated() {
        let db = test_db();
        db.record_action(MATCH, 0, &ban(Side::Blue, 3, 0)).unwrap();
        db.record_action("other", 0, &ban(Side::Blue, 4, 0)).unwrap();
        assert_eq!(db.action_count(MATCH).unwrap(), 1);
        assert!(db.has_draft_in_progress("other").unwrap());
        assert!(!db.has_draft_in_progress("missing").unwrap());
    }

    #[test]
    fn clear_match_removes_actions_and_trace() {
        let db = test_db();
        db.record_action(MATCH, 0, &ban(Side::Blue, 3, 0)).unwrap();
        db.save_state(&trace_key(MATCH), &[1, 2]).unwrap();
        db.record_action("other", 0, &ban(Side::Blue, 4, 0)).unwrap();

        db.clear_match(MATCH).unwrap();
        assert_eq!(db.action_count(MATCH).unwrap(), 0);
        assert!(db.load_state::<Vec<u32>>(&trace_key(MATCH)).unwrap().is_none());
        assert_eq!(db.action_count("other").unwrap(), 1);
    }

    #[test]
    fn state_round_trip_and_overwrite() {
        let db = test_db();
        assert!(db.load_state::<serde_json::Value>("k").unwrap().is_none());
        db.save_state("k", &serde_json::json!({"a": 1})).unwrap();
        db.save_state("k", &serde_json::json!({"a": 2})).unwrap();
        assert_eq!(
            db.load_state::<serde_json::Value>("k").unwrap(),
            Some(serde_json::json!({"a": 2}))
        );
    }

    #[test]
    fn state_of_the_wrong_shape_is_an_error() {
        let db = test_db();
        db.save_state("k", "not a list").unwrap();
        let err = db.load_state::<Vec<u32>>("k").unwrap_err();
        assert!(err.to_string().contains("unexpected shape"));
    }

    #[test]
    fn match_id_round_trip() {
        let db = test_db();
        assert!(db.get_match_id().unwrap().is_none());
        db.set_match_id("match_1").unwrap();
        assert_eq!(db.get_match_id().unwrap().as_deref(), Some("match_1"));
        assert!(Database::generate_match_id().starts_with("match_"));
    }

    #[test]
    fn corrupt_side_is_an_error() {
        let db = test_db();
        db.conn()
            .execute(
                "INSERT INTO draft_actions (match_id, step_index, side, action, hero_id, slot)
                 VALUES ('m', 0, 'GREEN', 'BAN', 1, 0)",
                [],
            )
            .unwrap();
        let err = db.load_actions("m").unwrap_err();
        assert!(err.to_string().contains("unknown side"));
    }
}
