// pickcast entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, stdout carries command output)
// 2. Load config, copying defaults on first run
// 3. Open database and load reference data
// 4. Dispatch the subcommand

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use tracing::{info, warn};

use pickcast_app::config;
use pickcast_app::db::{trace_key, Database};
use pickcast_app::playback::spawn_simulation;
use pickcast_app::session::{load_session, recover_room_state, Session};
use pickcast_core::recommend::recommend;
use pickcast_core::simulation::DraftStepRecord;
use pickcast_core::{DraftState, HeroId, Side};

const USAGE: &str = "\
usage: pickcast <command>

commands:
  simulate [match_id]            run a full simulated draft and store its trace
  recommend [match_id]           show recommendations for the current step
  commit <match_id> <hero_id>    commit a hero for the current step
  status <match_id>              show the state of a persisted draft";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("pickcast starting up");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        println!("{USAGE}");
        return Ok(());
    };

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: timer {}s/{}s, our side {:?}",
        config.timer.ban_seconds, config.timer.pick_seconds, config.our_side
    );

    let session = load_session(config)?;

    match command.as_str() {
        "simulate" => simulate(&session, args.get(1).cloned()).await,
        "recommend" => show_recommendations(&session, args.get(1).cloned()),
        "commit" => {
            let (Some(match_id), Some(hero)) = (args.get(1), args.get(2)) else {
                bail!("usage: pickcast commit <match_id> <hero_id>");
            };
            let hero: u32 = hero
                .parse()
                .with_context(|| format!("invalid hero id '{hero}'"))?;
            commit(&session, match_id, HeroId(hero)).await
        }
        "status" => {
            let Some(match_id) = args.get(1) else {
                bail!("usage: pickcast status <match_id>");
            };
            show_status(&session, match_id)
        }
        other => {
            println!("unknown command '{other}'\n\n{USAGE}");
            Ok(())
        }
    }
}

async fn simulate(session: &Session, match_id: Option<String>) -> anyhow::Result<()> {
    let match_id = match_id.unwrap_or_else(Database::generate_match_id);
    info!("Simulating draft {}", match_id);

    let (task, mut rx) = spawn_simulation(
        Arc::clone(&session.data),
        Arc::new(session.config.scoring.clone()),
        Duration::from_millis(session.config.pacing_ms),
    );

    let mut trace: Vec<DraftStepRecord> = Vec::new();
    loop {
        tokio::select! {
            record = rx.recv() => match record {
                Some(record) => {
                    print_record(&record);
                    trace.push(record);
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                warn!("Simulation interrupted after {} steps", trace.len());
                break;
            }
        }
    }
    drop(rx);
    let _ = task.await;

    session
        .db
        .save_state(&trace_key(&match_id), &trace)
        .context("failed to store simulation trace")?;
    session.db.set_match_id(&match_id)?;
    println!("\n{} steps stored as {}", trace.len(), trace_key(&match_id));
    Ok(())
}

fn show_recommendations(session: &Session, match_id: Option<String>) -> anyhow::Result<()> {
    let match_id = resolve_match_id(&session.db, match_id)?;
    let state = load_state(session, &match_id)?;

    match recommend(&state, &session.data, &session.config.scoring) {
        Some(recs) => {
            let json = serde_json::to_string_pretty(&recs)
                .context("failed to serialize recommendations")?;
            println!("{json}");
        }
        None => println!("{match_id}: draft is finished"),
    }
    Ok(())
}

async fn commit(session: &Session, match_id: &str, hero: HeroId) -> anyhow::Result<()> {
    let mut registry = session.registry();
    let handle = registry.open(match_id)?;
    let result = handle.commit(hero).await;
    registry.close(match_id).await;

    let action = result.with_context(|| format!("commit of hero {hero} rejected"))?;
    session.db.set_match_id(match_id)?;
    println!(
        "{} {} {}: {}",
        action.side,
        action.action,
        action.slot + 1,
        session.data.heroes.name_of(action.hero)
    );
    Ok(())
}

fn show_status(session: &Session, match_id: &str) -> anyhow::Result<()> {
    let state = load_state(session, match_id)?;

    match state.current_step() {
        Some(step) => println!(
            "{match_id}: step {} of 18, {} to act ({}s on the clock)",
            step.order, step.label, state.seconds_remaining()
        ),
        None => println!("{match_id}: draft finished"),
    }
    for side in [Side::Blue, Side::Red] {
        let names = |ids: &[HeroId]| -> String {
            ids.iter()
                .map(|&id| session.data.heroes.name_of(id))
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!("  {side} bans:  {}", names(state.bans(side)));
        println!("  {side} picks: {}", names(state.picks(side)));
    }
    Ok(())
}

fn load_state(session: &Session, match_id: &str) -> anyhow::Result<DraftState> {
    recover_room_state(&session.db, match_id, session.config.timer, &session.data.heroes)
}

fn resolve_match_id(db: &Database, match_id: Option<String>) -> anyhow::Result<String> {
    match match_id {
        Some(id) => Ok(id),
        None => db
            .get_match_id()?
            .context("no match id given and no current match recorded"),
    }
}

fn print_record(record: &DraftStepRecord) {
    let chosen = record.chosen_name.as_deref().unwrap_or("(no legal hero)");
    let category = record
        .top_category
        .map(|c| c.label().to_string())
        .unwrap_or_default();
    let marker = if record.fallback { " [fallback]" } else { "" };
    println!(
        "{:>2}. {:<12} {:<16} {:>7.1}  {}{}",
        record.step_index + 1,
        record.label,
        chosen,
        record.total_score,
        category,
        marker
    );
    println!("    {}", record.analysis.rationale);
}

/// Initialize tracing to log to a file, keeping stdout for command output.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("pickcast.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pickcast=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
