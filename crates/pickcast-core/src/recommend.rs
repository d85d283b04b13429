// Live recommendations: four ranked top-5 panels for the side to act.
//
// Read-only over the draft; nothing is committed.

use serde::Serialize;
use tracing::debug;

use crate::draft::sequence::{ActionKind, DraftStepSpec, PICKS_PER_SIDE, BANS_PER_SIDE};
use crate::draft::state::DraftState;
use crate::scoring::context::{ReferenceData, ScoringContext};
use crate::scoring::weights::ScoringWeights;
use crate::scoring::{rank, Rubric};
use crate::simulation::{summarize, CandidateSummary};

pub const PANEL_SIZE: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct Recommendations {
    /// The step being recommended for.
    pub step: DraftStepSpec,
    /// Raw strength and team history.
    pub meta: Vec<CandidateSummary>,
    /// Synergy with allies and counters to enemies.
    pub analyst: Vec<CandidateSummary>,
    pub hybrid: Vec<CandidateSummary>,
    /// Ban suggestions, available even while picks are ongoing.
    pub smart_ban: Vec<CandidateSummary>,
}

/// Rank candidates for the current step of `state`. `None` once the draft is
/// finished.
pub fn recommend(
    state: &DraftState,
    data: &ReferenceData,
    weights: &ScoringWeights,
) -> Option<Recommendations> {
    let step = state.current_step()?;
    let ctx = ScoringContext::new(data, weights, state.tracker());

    let pick_step = as_action(&step, ActionKind::Pick, state);
    let ban_step = as_action(&step, ActionKind::Ban, state);

    let panel = |spec: &DraftStepSpec, rubric: Rubric| -> Vec<CandidateSummary> {
        rank(&data.heroes, &ctx, spec, rubric)
            .iter()
            .filter(|c| c.is_eligible())
            .take(PANEL_SIZE)
            .map(|c| summarize(data, c))
            .collect()
    };

    let recs = Recommendations {
        step,
        meta: panel(&pick_step, Rubric::META),
        analyst: panel(&pick_step, Rubric::ANALYST),
        hybrid: panel(&pick_step, Rubric::HYBRID),
        smart_ban: panel(&ban_step, Rubric::BAN),
    };
    debug!(
        "Recommendations for {}: meta={} analyst={} hybrid={} ban={}",
        step.label,
        recs.meta.len(),
        recs.analyst.len(),
        recs.hybrid.len(),
        recs.smart_ban.len()
    );
    Some(recs)
}

/// The current step re-cast as `action` for the same side, with the slot that
/// action would occupy next.
fn as_action(step: &DraftStepSpec, action: ActionKind, state: &DraftState) -> DraftStepSpec {
    if step.action == action {
        return *step;
    }
    let (taken, cap) = match action {
        ActionKind::Pick => (state.picks(step.side).len(), PICKS_PER_SIDE),
        ActionKind::Ban => (state.bans(step.side).len(), BANS_PER_SIDE),
    };
    let slot = (taken + 1).min(cap);
    DraftStepSpec {
        action,
        slot: u8::try_from(slot).unwrap_or(u8::MAX),
        ..*step
    }
}
