// Integration tests for the draft service.
//
// These exercise the library crate's public API end to end: shipped
// reference data, draft rooms with persistence and recovery, the tick
// scheduler under a paused clock, and paced simulation playback.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use pickcast_app::db::{trace_key, Database};
use pickcast_app::playback::{spawn_simulation, stream_simulation};
use pickcast_app::room::{spawn_ticker, RoomError, RoomRegistry};
use pickcast_core::data::{load_reference, DataPaths};
use pickcast_core::hero::RoleAliases;
use pickcast_core::scoring::context::ReferenceData;
use pickcast_core::scoring::weights::ScoringWeights;
use pickcast_core::simulation::{run_to_completion, DraftStepRecord};
use pickcast_core::{
    ActionKind, DraftAction, DraftError, Hero, HeroId, HeroPool, Role, Side, Tier, TimerConfig,
};

use tokio::sync::mpsc;

// ===========================================================================
// Test helpers
// ===========================================================================

fn project_root() -> PathBuf {
    let cwd = std::env::current_dir().unwrap();
    if cwd.join("defaults").exists() {
        cwd
    } else {
        cwd.join("crates/pickcast-app")
    }
}

/// Twenty heroes that can play every role, primary role rotating with id and
/// win rates rising with id.
fn reference() -> Arc<ReferenceData> {
    let heroes = HeroPool::new(
        (1..=20u32)
            .map(|i| Hero {
                id: HeroId(i),
                name: format!("Hero {i}"),
                roles: {
                    let mut roles = Role::ALL.to_vec();
                    roles.rotate_left((i as usize - 1) % 5);
                    roles
                },
                tier: if i > 16 { Tier::A } else { Tier::B },
                win_rate: 45.0 + f64::from(i) * 0.5,
            })
            .collect(),
    );
    Arc::new(ReferenceData {
        heroes,
        ..ReferenceData::default()
    })
}

fn registry(db: &Arc<Database>) -> RoomRegistry {
    RoomRegistry::new(Arc::clone(db), reference(), TimerConfig::default())
}

fn memory_db() -> Arc<Database> {
    Arc::new(Database::open(":memory:").unwrap())
}

// ===========================================================================
// Reference data
// ===========================================================================

#[test]
fn shipped_reference_data_drives_a_full_simulation() {
    let root = project_root();
    let paths = DataPaths {
        strategy: Some("defaults/strategy.toml".into()),
        ..DataPaths::default()
    }
    .resolved(&root);
    let mut aliases = RoleAliases::new();
    aliases.insert("tank", Role::Roam);

    let data = load_reference(&paths, &aliases, Some(Side::Blue)).unwrap();
    assert_eq!(data.heroes.len(), 20);
    assert!(data.team.strategy.core.contains(&HeroId(4)));

    let records = run_to_completion(&data, &ScoringWeights::default());
    assert_eq!(records.len(), 18);
    let mut chosen: Vec<HeroId> = records.iter().filter_map(|r| r.chosen).collect();
    let total = chosen.len();
    chosen.sort();
    chosen.dedup();
    assert_eq!(chosen.len(), total, "a hero was chosen twice");

    // Blue never bans its own strategy core.
    for r in records.iter().filter(|r| r.side == Side::Blue && r.action == ActionKind::Ban) {
        assert!(!matches!(r.chosen, Some(HeroId(4)) | Some(HeroId(13))), "{}", r.label);
    }
}

// ===========================================================================
// Draft rooms
// ===========================================================================

#[tokio::test]
async fn committed_actions_survive_a_room_restart() {
    let db = memory_db();
    let mut rooms = registry(&db);

    let room = rooms.open("m1").unwrap();
    let first = room.commit(HeroId(20)).await.unwrap();
    assert_eq!(first.side, Side::Blue);
    assert_eq!(first.action, ActionKind::Ban);
    room.commit(HeroId(19)).await.unwrap();
    assert_eq!(db.action_count("m1").unwrap(), 2);

    assert!(rooms.close("m1").await);
    assert!(rooms.get("m1").is_none());

    // A fresh registry recovers the room from the database.
    let mut rooms = registry(&db);
    let room = rooms.open("m1").unwrap();
    let state = room.snapshot().await.unwrap();
    assert_eq!(state.step_index(), 2);
    assert_eq!(state.bans(Side::Blue), &[HeroId(20)]);
    assert_eq!(state.bans(Side::Red), &[HeroId(19)]);
}

#[tokio::test]
async fn rejected_commits_change_nothing() {
    let db = memory_db();
    let mut rooms = registry(&db);
    let room = rooms.open("m2").unwrap();
    room.commit(HeroId(3)).await.unwrap();

    match room.commit(HeroId(3)).await.unwrap_err() {
        RoomError::Draft(DraftError::HeroUnavailable(id)) => assert_eq!(id, HeroId(3)),
        other => panic!("expected HeroUnavailable, got: {other}"),
    }
    match room.commit(HeroId(99)).await.unwrap_err() {
        RoomError::Draft(DraftError::UnknownHero(id)) => assert_eq!(id, HeroId(99)),
        other => panic!("expected UnknownHero, got: {other}"),
    }

    let state = room.snapshot().await.unwrap();
    assert_eq!(state.step_index(), 1);
    assert_eq!(db.action_count("m2").unwrap(), 1);
}

#[tokio::test]
async fn registry_reuses_a_running_room() {
    let db = memory_db();
    let mut rooms = registry(&db);
    let a = rooms.open("m3").unwrap();
    let b = rooms.open("m3").unwrap();
    assert_eq!(rooms.len(), 1);

    a.commit(HeroId(7)).await.unwrap();
    let state = b.snapshot().await.unwrap();
    assert!(!state.is_available(HeroId(7)));
}

#[tokio::test]
async fn closed_room_rejects_commands() {
    let db = memory_db();
    let mut rooms = registry(&db);
    let room = rooms.open("m4").unwrap();
    rooms.close("m4").await;
    assert!(rooms.is_empty());
    assert!(!rooms.close("m4").await);

    assert!(matches!(room.snapshot().await, Err(RoomError::Closed)));
    assert!(matches!(room.commit(HeroId(1)).await, Err(RoomError::Closed)));
    assert_eq!(db.action_count("m4").unwrap(), 0);
}

#[tokio::test]
async fn commit_over_a_differently_recorded_step_is_a_conflict() {
    let db = memory_db();
    let mut rooms = registry(&db);
    let room = rooms.open("c1").unwrap();

    // Another writer records step 0 behind the room's back.
    let stored = DraftAction {
        side: Side::Blue,
        action: ActionKind::Ban,
        hero: HeroId(9),
        slot: 0,
    };
    assert!(db.record_action("c1", 0, &stored).unwrap());

    match room.commit(HeroId(3)).await.unwrap_err() {
        RoomError::Conflict { step, stored } => {
            assert_eq!(step, 0);
            assert_eq!(stored, HeroId(9));
        }
        other => panic!("expected Conflict, got: {other}"),
    }

    let state = room.snapshot().await.unwrap();
    assert_eq!(state.step_index(), 0);
    assert!(state.is_available(HeroId(3)));
    assert_eq!(db.action_count("c1").unwrap(), 1);
    assert_eq!(db.action_at("c1", 0).unwrap(), Some(stored));

    // The database wins on recovery.
    rooms.close("c1").await;
    let mut rooms = registry(&db);
    let state = rooms.open("c1").unwrap().snapshot().await.unwrap();
    assert_eq!(state.bans(Side::Blue), &[HeroId(9)]);
}

#[tokio::test]
async fn commit_matching_a_recorded_step_is_accepted() {
    let db = memory_db();
    let mut rooms = registry(&db);
    let room = rooms.open("c2").unwrap();

    let stored = DraftAction {
        side: Side::Blue,
        action: ActionKind::Ban,
        hero: HeroId(5),
        slot: 0,
    };
    db.record_action("c2", 0, &stored).unwrap();

    assert_eq!(room.commit(HeroId(5)).await.unwrap(), stored);
    let state = room.snapshot().await.unwrap();
    assert_eq!(state.step_index(), 1);
    assert_eq!(db.action_count("c2").unwrap(), 1);
}

#[tokio::test]
async fn finished_draft_rejects_further_commits() {
    let db = memory_db();
    let mut rooms = registry(&db);
    let room = rooms.open("m5").unwrap();

    let records = run_to_completion(&reference(), &ScoringWeights::default());
    for r in &records {
        room.commit(r.chosen.unwrap()).await.unwrap();
    }

    let state = room.snapshot().await.unwrap();
    assert!(state.is_finished());
    assert!(matches!(
        room.commit(HeroId(1)).await,
        Err(RoomError::Draft(DraftError::InvalidState))
    ));
    assert_eq!(db.action_count("m5").unwrap(), 18);
}

// ===========================================================================
// Timer
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn ticker_counts_down_once_per_second() {
    let db = memory_db();
    let mut rooms = registry(&db);
    let room = rooms.open("t1").unwrap();
    let ticker = spawn_ticker(room.clone());

    tokio::time::sleep(Duration::from_millis(5_500)).await;
    let state = room.snapshot().await.unwrap();
    assert_eq!(state.seconds_remaining(), 25);

    rooms.close("t1").await;
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(ticker.is_finished());
}

#[tokio::test(start_paused = true)]
async fn paused_room_ignores_ticks() {
    let db = memory_db();
    let mut rooms = registry(&db);
    let room = rooms.open("t2").unwrap();
    assert!(room.toggle_pause().await.unwrap());
    let _ticker = spawn_ticker(room.clone());

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    assert_eq!(room.snapshot().await.unwrap().seconds_remaining(), 30);

    assert!(!room.toggle_pause().await.unwrap());
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(room.snapshot().await.unwrap().seconds_remaining() < 30);
}

#[tokio::test(start_paused = true)]
async fn expired_timer_does_not_commit() {
    let db = memory_db();
    let mut rooms = registry(&db);
    let room = rooms.open("t3").unwrap();
    let _ticker = spawn_ticker(room.clone());

    tokio::time::sleep(Duration::from_secs(45)).await;
    let state = room.snapshot().await.unwrap();
    assert!(state.is_time_up());
    assert_eq!(state.step_index(), 0);
    assert_eq!(db.action_count("t3").unwrap(), 0);

    // Committing after expiry still works and resets the clock.
    room.commit(HeroId(2)).await.unwrap();
    assert_eq!(room.snapshot().await.unwrap().seconds_remaining(), 30);
}

// ===========================================================================
// Playback
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn playback_streams_every_step_in_order() {
    let data = reference();
    let weights = Arc::new(ScoringWeights::default());
    let expected = run_to_completion(&data, &weights);

    let (tx, mut rx) = mpsc::channel(32);
    let sent = stream_simulation(data, weights, Duration::from_millis(750), tx).await;
    assert_eq!(sent, 18);

    let mut streamed: Vec<DraftStepRecord> = Vec::new();
    while let Some(r) = rx.recv().await {
        streamed.push(r);
    }
    assert_eq!(streamed, expected);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_receiver_cancels_playback() {
    let (task, mut rx) = spawn_simulation(
        reference(),
        Arc::new(ScoringWeights::default()),
        Duration::from_millis(750),
    );
    let first = rx.recv().await.unwrap();
    assert_eq!(first.step_index, 0);
    let second = rx.recv().await.unwrap();
    assert_eq!(second.step_index, 1);
    drop(rx);

    let sent = task.await.unwrap();
    assert!((2..18).contains(&sent), "sent {sent}");
}

#[test]
fn simulation_trace_round_trips_through_state_table() {
    let db = Database::open(":memory:").unwrap();
    let records = run_to_completion(&reference(), &ScoringWeights::default());
    db.save_state(&trace_key("sim"), &records).unwrap();

    let restored: Vec<DraftStepRecord> = db.load_state(&trace_key("sim")).unwrap().unwrap();
    let ids = |rs: &[DraftStepRecord]| rs.iter().map(|r| (r.step_index, r.chosen)).collect::<Vec<_>>();
    assert_eq!(ids(&restored), ids(&records));
    assert_eq!(restored[4].label, records[4].label);
}
