// Paced simulation playback over a channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use pickcast_core::scoring::context::ReferenceData;
use pickcast_core::scoring::weights::ScoringWeights;
use pickcast_core::simulation::{DraftStepRecord, Simulation};

/// Run a simulation, sending each step record to `tx` with `pacing` between
/// records. Stops early when the receiver is dropped. Returns the number of
/// records delivered.
pub async fn stream_simulation(
    data: Arc<ReferenceData>,
    weights: Arc<ScoringWeights>,
    pacing: Duration,
    tx: mpsc::Sender<DraftStepRecord>,
) -> usize {
    let mut sim = Simulation::new(&data, &weights);
    let mut sent = 0;

    while let Some(record) = sim.step() {
        if sent > 0 && !pacing.is_zero() {
            tokio::time::sleep(pacing).await;
        }
        if tx.send(record).await.is_err() {
            info!("Simulation playback cancelled after {} steps", sent);
            return sent;
        }
        sent += 1;
    }

    info!("Simulation playback finished: {} steps", sent);
    sent
}

/// Spawn `stream_simulation` and return its task and the receiving end.
pub fn spawn_simulation(
    data: Arc<ReferenceData>,
    weights: Arc<ScoringWeights>,
    pacing: Duration,
) -> (JoinHandle<usize>, mpsc::Receiver<DraftStepRecord>) {
    let (tx, rx) = mpsc::channel(1);
    let task = tokio::spawn(stream_simulation(data, weights, pacing, tx));
    (task, rx)
}
