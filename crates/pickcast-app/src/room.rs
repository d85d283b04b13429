// Draft rooms: one task per match owns its DraftState.
//
// Commands arrive over an mpsc channel and are handled one at a time, so a
// commit and a timer tick can never interleave. Replies go back on oneshot
// channels.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use pickcast_core::scoring::context::ReferenceData;
use pickcast_core::{DraftAction, DraftError, DraftState, HeroId, TimerConfig};

use crate::db::Database;
use crate::session::recover_room_state;

/// Capacity of a room's command queue.
const COMMAND_BUFFER: usize = 64;

/// Interval between scheduler ticks.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum RoomError {
    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error("failed to persist action: {0}")]
    Persist(String),

    #[error("step {step} is already recorded with hero {stored}")]
    Conflict { step: usize, stored: HeroId },

    #[error("draft room is closed")]
    Closed,
}

/// Messages understood by a room task.
#[derive(Debug)]
pub enum RoomCommand {
    Commit {
        hero: HeroId,
        reply: oneshot::Sender<Result<DraftAction, RoomError>>,
    },
    Tick,
    TogglePause {
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<DraftState>,
    },
    Close,
}

// ---------------------------------------------------------------------------
// Room task
// ---------------------------------------------------------------------------

pub struct DraftRoom {
    match_id: String,
    state: DraftState,
    data: Arc<ReferenceData>,
    db: Arc<Database>,
}

impl DraftRoom {
    pub fn new(match_id: &str, state: DraftState, data: Arc<ReferenceData>, db: Arc<Database>) -> Self {
        DraftRoom {
            match_id: match_id.to_string(),
            state,
            data,
            db,
        }
    }

    /// Start the room task. The task ends on `Close` or once every handle is
    /// dropped, and yields the final state.
    pub fn spawn(self) -> (RoomHandle, JoinHandle<DraftState>) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let handle = RoomHandle {
            match_id: self.match_id.clone(),
            tx,
        };
        let task = tokio::spawn(self.run(rx));
        (handle, task)
    }

    async fn run(mut self, mut rx: mpsc::Receiver<RoomCommand>) -> DraftState {
        info!(
            "Draft room {} open at step {}",
            self.match_id,
            self.state.step_index()
        );

        while let Some(cmd) = rx.recv().await {
            match cmd {
                RoomCommand::Commit { hero, reply } => {
                    let result = self.commit(hero);
                    if let Err(e) = &result {
                        warn!("Draft room {}: commit of {} rejected: {}", self.match_id, hero, e);
                    }
                    let _ = reply.send(result);
                }
                RoomCommand::Tick => self.tick(),
                RoomCommand::TogglePause { reply } => {
                    let _ = reply.send(self.state.toggle_pause());
                }
                RoomCommand::Snapshot { reply } => {
                    let _ = reply.send(self.state.clone());
                }
                RoomCommand::Close => break,
            }
        }

        info!("Draft room {} closed", self.match_id);
        self.state
    }

    /// Commit on a copy, persist, then publish. A failed write, or a step
    /// already recorded with a different action, leaves the room exactly as
    /// it was.
    fn commit(&mut self, hero_id: HeroId) -> Result<DraftAction, RoomError> {
        let hero = self
            .data
            .heroes
            .get(hero_id)
            .ok_or(DraftError::UnknownHero(hero_id))?;

        let step_index = self.state.step_index();
        let mut next = self.state.clone();
        let action = next.commit(hero)?;

        let persist = |e: anyhow::Error| RoomError::Persist(format!("{e:#}"));
        let inserted = self
            .db
            .record_action(&self.match_id, step_index, &action)
            .map_err(persist)?;
        if !inserted {
            // Another writer owns this step; only an identical action is accepted.
            match self.db.action_at(&self.match_id, step_index).map_err(persist)? {
                Some(stored) if stored == action => {
                    debug!("Draft room {}: step {} already recorded", self.match_id, step_index);
                }
                Some(stored) => {
                    return Err(RoomError::Conflict {
                        step: step_index,
                        stored: stored.hero,
                    });
                }
                None => {
                    return Err(RoomError::Persist(format!(
                        "step {step_index} was neither inserted nor found"
                    )));
                }
            }
        }

        self.state = next;
        Ok(action)
    }

    fn tick(&mut self) {
        let before = self.state.seconds_remaining();
        let after = self.state.tick();
        if before > 0 && after == 0 {
            if let Some(step) = self.state.current_step() {
                info!("Draft room {}: timer expired on {}", self.match_id, step.label);
            }
        }
        debug!("Draft room {} tick: {}s remaining", self.match_id, after);
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Cloneable client for one room.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    match_id: String,
    tx: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn match_id(&self) -> &str {
        &self.match_id
    }

    /// Whether the room task has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub async fn commit(&self, hero: HeroId) -> Result<DraftAction, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Commit { hero, reply }).await?;
        rx.await.map_err(|_| RoomError::Closed)?
    }

    pub async fn tick(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Tick).await
    }

    /// Flip the pause flag; returns the new value.
    pub async fn toggle_pause(&self) -> Result<bool, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::TogglePause { reply }).await?;
        rx.await.map_err(|_| RoomError::Closed)
    }

    pub async fn snapshot(&self) -> Result<DraftState, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| RoomError::Closed)
    }

    pub async fn close(&self) {
        let _ = self.tx.send(RoomCommand::Close).await;
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.tx.send(cmd).await.map_err(|_| RoomError::Closed)
    }
}

/// Send `Tick` to the room every second until the room closes.
pub fn spawn_ticker(handle: RoomHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            if handle.tick().await.is_err() {
                debug!("Ticker for {} stopped", handle.match_id());
                break;
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Open rooms keyed by match id.
pub struct RoomRegistry {
    rooms: HashMap<String, RoomHandle>,
    db: Arc<Database>,
    data: Arc<ReferenceData>,
    timer: TimerConfig,
}

impl RoomRegistry {
    pub fn new(db: Arc<Database>, data: Arc<ReferenceData>, timer: TimerConfig) -> Self {
        RoomRegistry {
            rooms: HashMap::new(),
            db,
            data,
            timer,
        }
    }

    /// Handle for `match_id`, starting the room (and rehydrating any
    /// persisted actions) if it is not already running.
    pub fn open(&mut self, match_id: &str) -> anyhow::Result<RoomHandle> {
        if let Some(handle) = self.rooms.get(match_id) {
            if !handle.is_closed() {
                return Ok(handle.clone());
            }
        }

        let state = recover_room_state(&self.db, match_id, self.timer, &self.data.heroes)?;
        let room = DraftRoom::new(match_id, state, Arc::clone(&self.data), Arc::clone(&self.db));
        let (handle, _task) = room.spawn();
        self.rooms.insert(match_id.to_string(), handle.clone());
        Ok(handle)
    }

    pub fn get(&self, match_id: &str) -> Option<RoomHandle> {
        self.rooms.get(match_id).cloned()
    }

    /// Stop the room for `match_id`. Returns whether it was registered.
    pub async fn close(&mut self, match_id: &str) -> bool {
        match self.rooms.remove(match_id) {
            Some(handle) => {
                handle.close().await;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
