// Full-draft simulation: both sides play the scoring engine's top choice at
// every step, and each decision is recorded with its justification.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::draft::sequence::{ActionKind, BanPhase, DraftStepSpec, Side};
use crate::draft::state::{DraftState, TimerConfig};
use crate::hero::HeroId;
use crate::scoring::context::{ReferenceData, ScoringContext};
use crate::scoring::weights::ScoringWeights;
use crate::scoring::{rank, Contribution, Rubric, ScoreCategory, ScoredCandidate};

/// Number of alternatives listed per step.
pub const TOP_CANDIDATES: usize = 5;
/// Number of runner-ups compared against the chosen hero.
pub const WHY_NOT_COUNT: usize = 3;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A ranked alternative as shown in a step record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub hero: HeroId,
    pub name: String,
    pub total: f64,
    pub top_category: Option<ScoreCategory>,
    pub eligible: bool,
}

/// Why a runner-up lost to the chosen hero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhyNot {
    pub hero: HeroId,
    pub name: String,
    pub score_gap: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepAnalysis {
    pub slot_context: String,
    pub rationale: String,
    pub why_not: Vec<WhyNot>,
    /// Enemy picks the chosen hero has a positive matchup against.
    pub counters: Vec<HeroId>,
}

/// One finalized simulation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftStepRecord {
    pub step_index: usize,
    pub side: Side,
    pub action: ActionKind,
    pub label: String,
    /// `None` when no hero could legally fill the step.
    pub chosen: Option<HeroId>,
    pub chosen_name: Option<String>,
    pub total_score: f64,
    pub top_category: Option<ScoreCategory>,
    pub fallback: bool,
    pub top_candidates: Vec<CandidateSummary>,
    pub analysis: StepAnalysis,
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Step-by-step simulation over its own private `DraftState`.
///
/// Iterating yields one record per step; a caller that stops iterating keeps
/// every record produced so far.
pub struct Simulation<'a> {
    data: &'a ReferenceData,
    weights: &'a ScoringWeights,
    state: DraftState,
}

impl<'a> Simulation<'a> {
    pub fn new(data: &'a ReferenceData, weights: &'a ScoringWeights) -> Self {
        Simulation {
            data,
            weights,
            state: DraftState::new(TimerConfig::default()),
        }
    }

    /// The simulated draft so far.
    pub fn state(&self) -> &DraftState {
        &self.state
    }

    /// Play the current step. Returns `None` once the draft is finished.
    pub fn step(&mut self) -> Option<DraftStepRecord> {
        let step = self.state.current_step()?;
        let data = self.data;

        let ranked = {
            let ctx = ScoringContext::new(data, self.weights, self.state.tracker());
            rank(&data.heroes, &ctx, &step, Rubric::for_action(step.action))
        };

        let mut chosen: Option<ScoredCandidate> = None;
        if let Some(best) = ranked.iter().find(|c| c.is_eligible()) {
            match data.heroes.get(best.hero).map(|hero| self.state.commit(hero)) {
                Some(Ok(_)) => chosen = Some(best.clone()),
                Some(Err(e)) => warn!("Top candidate {} rejected at {}: {}", best.hero, step.label, e),
                None => warn!("Top candidate {} missing from roster", best.hero),
            }
        }

        let fallback = chosen.is_none();
        if fallback {
            chosen = self.commit_fallback(&step);
            if chosen.is_none() {
                // Cannot fail: current_step() was Some above.
                let _ = self.state.forfeit();
            }
        }

        let record = self.build_record(&step, &ranked, chosen.as_ref(), fallback);
        match &record.chosen_name {
            Some(name) => info!(
                "Simulated {}: {} ({:.1})",
                record.label, name, record.total_score
            ),
            None => warn!("Simulated {}: no hero available", record.label),
        }
        Some(record)
    }

    /// First roster hero the state machine accepts for this step.
    fn commit_fallback(&mut self, step: &DraftStepSpec) -> Option<ScoredCandidate> {
        let data = self.data;
        for hero in data.heroes.iter() {
            if !self.state.is_available(hero.id) {
                continue;
            }
            if self.state.commit(hero).is_ok() {
                warn!(
                    "No eligible candidate at {}, falling back to {}",
                    step.label, hero.name
                );
                return Some(ScoredCandidate {
                    hero: hero.id,
                    total: 0.0,
                    contributions: vec![Contribution {
                        category: ScoreCategory::Fallback,
                        points: 0.0,
                        reason: "no eligible hero; first roster hero the draft accepts".into(),
                    }],
                });
            }
        }
        None
    }

    fn build_record(
        &self,
        step: &DraftStepSpec,
        ranked: &[ScoredCandidate],
        chosen: Option<&ScoredCandidate>,
        fallback: bool,
    ) -> DraftStepRecord {
        let data = self.data;
        let top_candidates = ranked
            .iter()
            .take(TOP_CANDIDATES)
            .map(|c| summarize(data, c))
            .collect();

        let top_category = chosen.and_then(|c| {
            if fallback {
                Some(ScoreCategory::Fallback)
            } else {
                c.top_category()
            }
        });

        let analysis = StepAnalysis {
            slot_context: slot_context(step, self.weights),
            rationale: rationale(data, step, chosen, fallback),
            why_not: chosen
                .filter(|_| !fallback)
                .map(|c| why_not(data, c, ranked))
                .unwrap_or_default(),
            counters: match (chosen, step.action) {
                (Some(c), ActionKind::Pick) => data
                    .counters_for(c.hero, self.state.picks(step.side.opponent())),
                _ => Vec::new(),
            },
        };

        DraftStepRecord {
            step_index: step.index(),
            side: step.side,
            action: step.action,
            label: step.label.to_string(),
            chosen: chosen.map(|c| c.hero),
            chosen_name: chosen.map(|c| data.heroes.name_of(c.hero)),
            total_score: chosen.map(|c| c.total).unwrap_or(0.0),
            top_category,
            fallback,
            top_candidates,
            analysis,
        }
    }
}

impl Iterator for Simulation<'_> {
    type Item = DraftStepRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.step()
    }
}

/// Run a whole draft and return every step record in order.
pub fn run_to_completion(data: &ReferenceData, weights: &ScoringWeights) -> Vec<DraftStepRecord> {
    let records: Vec<DraftStepRecord> = Simulation::new(data, weights).collect();
    debug!("Simulation produced {} records", records.len());
    records
}

// ---------------------------------------------------------------------------
// Explanations
// ---------------------------------------------------------------------------

pub fn summarize(data: &ReferenceData, c: &ScoredCandidate) -> CandidateSummary {
    CandidateSummary {
        hero: c.hero,
        name: data.heroes.name_of(c.hero),
        total: c.total,
        top_category: c.top_category(),
        eligible: c.is_eligible(),
    }
}

fn slot_context(step: &DraftStepSpec, weights: &ScoringWeights) -> String {
    match (step.action, step.ban_phase()) {
        (ActionKind::Ban, Some(BanPhase::Opening)) => {
            format!("{}: opening ban, broad meta denial", step.label)
        }
        (ActionKind::Ban, _) => format!("{}: closing ban, protect picks and deny open roles", step.label),
        (ActionKind::Pick, _) if step.slot == 1 => {
            format!("{}: first pick, no enemy picks to react to", step.label)
        }
        (ActionKind::Pick, _) => format!(
            "{}: counter-play weighted x{:.2}",
            step.label,
            weights.counter_multiplier(step.slot)
        ),
    }
}

fn rationale(
    data: &ReferenceData,
    step: &DraftStepSpec,
    chosen: Option<&ScoredCandidate>,
    fallback: bool,
) -> String {
    let Some(c) = chosen else {
        return format!("No hero could fill {}; step passed", step.label);
    };
    let name = data.heroes.name_of(c.hero);
    if fallback {
        return format!("No eligible hero for {}; fell back to {}", step.label, name);
    }

    let mut reasons: Vec<&Contribution> = c.contributions.iter().filter(|x| x.points > 0.0).collect();
    reasons.sort_by(|a, b| {
        b.points
            .partial_cmp(&a.points)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let detail: Vec<String> = reasons
        .iter()
        .take(3)
        .map(|x| format!("{} ({:+.1})", x.reason, x.points))
        .collect();

    let verb = match step.action {
        ActionKind::Ban => "Banned",
        ActionKind::Pick => "Picked",
    };
    if detail.is_empty() {
        format!("{verb} {name} ({:.1}) as the best remaining option", c.total)
    } else {
        format!("{verb} {name} ({:.1}): {}", c.total, detail.join("; "))
    }
}

/// Compare the chosen hero against the next candidates in rank order.
fn why_not(data: &ReferenceData, chosen: &ScoredCandidate, ranked: &[ScoredCandidate]) -> Vec<WhyNot> {
    let chosen_name = data.heroes.name_of(chosen.hero);
    let lead = chosen.top_category();

    ranked
        .iter()
        .filter(|c| c.hero != chosen.hero)
        .take(WHY_NOT_COUNT)
        .map(|other| {
            let name = data.heroes.name_of(other.hero);
            let gap = chosen.total - other.total;
            let reason = if let Some(why) = other.rejection_reason() {
                format!("{name} was not eligible: {why}")
            } else {
                let theirs = other.top_category();
                match lead {
                    Some(cat) => {
                        let mut reason = format!(
                            "{name} scored {gap:.1} lower; {chosen_name} leads on {cat} ({:.1} vs {:.1})",
                            chosen.points_for(cat),
                            other.points_for(cat)
                        );
                        if let Some(their_cat) = theirs.filter(|t| *t != cat) {
                            reason.push_str(&format!(", {name} is strongest on {their_cat}"));
                        }
                        reason
                    }
                    None => format!("{name} scored {gap:.1} lower"),
                }
            };
            WhyNot {
                hero: other.hero,
                name,
                score_gap: gap,
                reason,
            }
        })
        .collect()
}
