// Scoring engine: hard filters followed by a chain of additive evaluators.
//
// Every evaluator is a pure function that appends tagged contributions to a
// `ScoreSheet`. The resulting `ScoredCandidate` carries the full audit trail,
// which is what the simulation trace and the recommendation panels display.

pub mod ban;
pub mod context;
pub mod pick;
pub mod weights;

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::draft::sequence::{ActionKind, DraftStepSpec};
use crate::hero::{Hero, HeroId, HeroPool};
use context::ScoringContext;

/// Score given to heroes that must not be chosen at all.
pub const INELIGIBLE_SCORE: f64 = -1_000_000.0;

// ---------------------------------------------------------------------------
// Score categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    Ineligible,
    /// Own strategy-core hero evaluated as a ban target.
    StrategyProtected,
    Fallback,
    BasePower,
    Tier,
    Synergy,
    Counter,
    TeamComfort,
    ThreatAffinity,
    FirstPickPreference,
    CounterEnemyPool,
    StrategyCore,
    Flex,
    StrategyAvoid,
    MetaDenial,
    Protect,
    Deny,
    TargetPreference,
    ProtectOwnPool,
}

impl ScoreCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ScoreCategory::Ineligible => "ineligible",
            ScoreCategory::StrategyProtected => "strategy protected",
            ScoreCategory::Fallback => "fallback",
            ScoreCategory::BasePower => "base power",
            ScoreCategory::Tier => "tier",
            ScoreCategory::Synergy => "synergy",
            ScoreCategory::Counter => "counter",
            ScoreCategory::TeamComfort => "team comfort",
            ScoreCategory::ThreatAffinity => "threat affinity",
            ScoreCategory::FirstPickPreference => "first-pick preference",
            ScoreCategory::CounterEnemyPool => "counter enemy pool",
            ScoreCategory::StrategyCore => "strategy core",
            ScoreCategory::Flex => "flex",
            ScoreCategory::StrategyAvoid => "strategy avoid",
            ScoreCategory::MetaDenial => "meta denial",
            ScoreCategory::Protect => "protect",
            ScoreCategory::Deny => "deny",
            ScoreCategory::TargetPreference => "target preference",
            ScoreCategory::ProtectOwnPool => "protect own pool",
        }
    }

    /// Categories that end evaluation and pin the score to the sentinel.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScoreCategory::Ineligible | ScoreCategory::StrategyProtected
        )
    }
}

impl fmt::Display for ScoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

/// One itemized score delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub category: ScoreCategory,
    pub points: f64,
    pub reason: String,
}

/// A hero's total score for one step, with the contributions that make it up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub hero: HeroId,
    pub total: f64,
    pub contributions: Vec<Contribution>,
}

impl ScoredCandidate {
    pub fn is_eligible(&self) -> bool {
        !self.contributions.iter().any(|c| c.category.is_terminal())
    }

    /// Sum of points for one category.
    pub fn points_for(&self, category: ScoreCategory) -> f64 {
        self.contributions
            .iter()
            .filter(|c| c.category == category)
            .map(|c| c.points)
            .sum()
    }

    /// Category with the largest summed positive points. Ties resolve to the
    /// category that contributed first.
    pub fn top_category(&self) -> Option<ScoreCategory> {
        let mut best: Option<(ScoreCategory, f64)> = None;
        for c in &self.contributions {
            if best.is_some_and(|(cat, _)| cat == c.category) {
                continue;
            }
            let points = self.points_for(c.category);
            if points <= 0.0 {
                continue;
            }
            match best {
                Some((_, best_points)) if best_points >= points => {}
                _ => best = Some((c.category, points)),
            }
        }
        best.map(|(cat, _)| cat)
    }

    /// First reason recorded for a terminal category, if any.
    pub fn rejection_reason(&self) -> Option<&str> {
        self.contributions
            .iter()
            .find(|c| c.category.is_terminal())
            .map(|c| c.reason.as_str())
    }
}

/// Accumulator the evaluators write into.
#[derive(Debug, Clone)]
pub struct ScoreSheet {
    hero: HeroId,
    total: f64,
    contributions: Vec<Contribution>,
    closed: bool,
}

impl ScoreSheet {
    pub fn new(hero: HeroId) -> Self {
        ScoreSheet {
            hero,
            total: 0.0,
            contributions: Vec::new(),
            closed: false,
        }
    }

    /// Add a delta. Zero deltas are dropped so the audit trail only lists
    /// what moved the score.
    pub fn add(&mut self, category: ScoreCategory, points: f64, reason: impl Into<String>) {
        if self.closed || points == 0.0 || !points.is_finite() {
            return;
        }
        self.total += points;
        self.contributions.push(Contribution {
            category,
            points,
            reason: reason.into(),
        });
    }

    /// Pin the score to the sentinel and stop further evaluation.
    pub fn reject(&mut self, category: ScoreCategory, reason: impl Into<String>) {
        if self.closed {
            return;
        }
        self.total = INELIGIBLE_SCORE;
        self.contributions.clear();
        self.contributions.push(Contribution {
            category,
            points: INELIGIBLE_SCORE,
            reason: reason.into(),
        });
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn finish(self) -> ScoredCandidate {
        ScoredCandidate {
            hero: self.hero,
            total: self.total,
            contributions: self.contributions,
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluator chains
// ---------------------------------------------------------------------------

/// A single scoring rule.
pub type Evaluator = fn(&Hero, &ScoringContext<'_>, &DraftStepSpec, &mut ScoreSheet);

/// A named set of evaluators run after the hard filters.
#[derive(Clone, Copy)]
pub struct Rubric {
    pub name: &'static str,
    pub evaluators: &'static [Evaluator],
}

impl fmt::Debug for Rubric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rubric")
            .field("name", &self.name)
            .field("evaluators", &self.evaluators.len())
            .finish()
    }
}

impl Rubric {
    /// Complete ban-phase logic.
    pub const BAN: Rubric = Rubric {
        name: "ban",
        evaluators: &[
            ban::strategy_guard,
            ban::strategy_avoid,
            ban::meta_denial,
            ban::protect,
            ban::deny,
            ban::target_preference,
            ban::protect_own_pool,
        ],
    };

    /// Complete pick-phase logic.
    pub const PICK: Rubric = Rubric {
        name: "pick",
        evaluators: &[
            pick::base_power,
            pick::tier,
            pick::synergy,
            pick::counter,
            pick::team_comfort,
            pick::threat_affinity,
            pick::first_pick_preference,
            pick::counter_enemy_pool,
            pick::strategy_core,
            pick::flex,
        ],
    };

    /// General meta and history view: raw strength plus what the team plays.
    pub const META: Rubric = Rubric {
        name: "meta",
        evaluators: &[
            pick::base_power,
            pick::tier,
            pick::team_comfort,
            pick::threat_affinity,
            pick::first_pick_preference,
        ],
    };

    /// Analyst view: only how the hero fits against the heroes on the board.
    pub const ANALYST: Rubric = Rubric {
        name: "analyst",
        evaluators: &[pick::synergy, pick::counter, pick::counter_enemy_pool],
    };

    /// Everything at once: the full pick logic under its own name.
    pub const HYBRID: Rubric = Rubric {
        name: "hybrid",
        evaluators: Rubric::PICK.evaluators,
    };

    /// The full rubric for an action type.
    pub fn for_action(action: ActionKind) -> Rubric {
        match action {
            ActionKind::Ban => Rubric::BAN,
            ActionKind::Pick => Rubric::PICK,
        }
    }
}

// ---------------------------------------------------------------------------
// Scoring entry points
// ---------------------------------------------------------------------------

/// Score `hero` for `step` with the full rubric for the step's action.
pub fn score(hero: &Hero, ctx: &ScoringContext<'_>, step: &DraftStepSpec) -> ScoredCandidate {
    score_with(hero, ctx, step, Rubric::for_action(step.action))
}

/// Score `hero` for `step` with an explicit rubric. The hard filters always
/// run first and short-circuit the rubric.
pub fn score_with(
    hero: &Hero,
    ctx: &ScoringContext<'_>,
    step: &DraftStepSpec,
    rubric: Rubric,
) -> ScoredCandidate {
    let mut sheet = ScoreSheet::new(hero.id);
    apply_filters(hero, ctx, step, &mut sheet);
    for evaluate in rubric.evaluators {
        if sheet.is_closed() {
            break;
        }
        evaluate(hero, ctx, step, &mut sheet);
    }
    sheet.finish()
}

/// Hard legality filters shared by every rubric.
fn apply_filters(hero: &Hero, ctx: &ScoringContext<'_>, step: &DraftStepSpec, sheet: &mut ScoreSheet) {
    if ctx.is_used(hero.id) {
        sheet.reject(ScoreCategory::Ineligible, "already banned or picked");
        return;
    }

    if ctx.global_bans(step.side).contains(&hero.id) {
        sheet.reject(
            ScoreCategory::Ineligible,
            format!("{} already used {} earlier in the series", step.side, hero.name),
        );
        return;
    }

    if step.action == ActionKind::Pick {
        let missing = ctx.missing_roles(step.side);
        if !hero.roles.iter().any(|r| missing.contains(r)) {
            let needs: Vec<&str> = missing.iter().map(|r| r.display_str()).collect();
            let reason = if needs.is_empty() {
                "all five roles are already filled".to_string()
            } else {
                format!("no open role (team still needs {})", needs.join(", "))
            };
            sheet.reject(ScoreCategory::Ineligible, reason);
        }
    }
}

/// Order candidates best first: higher total, then lower hero id.
pub fn compare_candidates(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.total
        .partial_cmp(&a.total)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.hero.cmp(&b.hero))
}

/// Score every roster hero and return them best first.
pub fn rank(
    pool: &HeroPool,
    ctx: &ScoringContext<'_>,
    step: &DraftStepSpec,
    rubric: Rubric,
) -> Vec<ScoredCandidate> {
    let mut ranked: Vec<ScoredCandidate> = pool
        .iter()
        .map(|hero| score_with(hero, ctx, step, rubric))
        .collect();
    ranked.sort_by(compare_candidates);
    ranked
}

/// The best eligible candidate from a ranked list.
pub fn best_eligible(ranked: &[ScoredCandidate]) -> Option<&ScoredCandidate> {
    ranked.iter().find(|c| c.is_eligible())
}
