// Session assembly and crash recovery.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use pickcast_core::data::load_reference;
use pickcast_core::scoring::context::ReferenceData;
use pickcast_core::{DraftState, HeroPool, TimerConfig};

use crate::config::Config;
use crate::db::Database;
use crate::room::RoomRegistry;

/// Everything a running service shares between rooms and simulations.
pub struct Session {
    pub config: Config,
    pub data: Arc<ReferenceData>,
    pub db: Arc<Database>,
}

impl Session {
    /// An empty room registry backed by this session's database and roster.
    pub fn registry(&self) -> RoomRegistry {
        RoomRegistry::new(Arc::clone(&self.db), Arc::clone(&self.data), self.config.timer)
    }
}

/// Open the database and load the reference data named by `config`.
pub fn load_session(config: Config) -> Result<Session> {
    let db = Database::open(&config.db_path).context("failed to open database")?;
    info!("Database opened at {}", config.db_path);

    let data = load_reference(&config.data_paths, &config.role_aliases, config.our_side)
        .context("failed to load reference data")?;

    Ok(Session {
        config,
        data: Arc::new(data),
        db: Arc::new(db),
    })
}

/// Rebuild the state of `match_id` from its persisted actions, or start a
/// fresh draft when nothing is recorded.
pub fn recover_room_state(
    db: &Database,
    match_id: &str,
    timer: TimerConfig,
    pool: &HeroPool,
) -> Result<DraftState> {
    if !db.has_draft_in_progress(match_id)? {
        info!("No draft in progress for match_id={}, starting fresh", match_id);
        return Ok(DraftState::new(timer));
    }

    let actions = db.load_actions(match_id)?;
    let state = DraftState::rehydrate(timer, &actions, pool)
        .with_context(|| format!("failed to rehydrate match {match_id}"))?;
    info!(
        "Crash recovery: restored {} actions for match_id={} (finished={})",
        actions.len(),
        match_id,
        state.is_finished()
    );
    Ok(state)
}
