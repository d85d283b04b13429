// Ban-phase evaluators. Opening bans deny the meta and the heroes that
// break our plan; closing bans protect our picks and deny the opponent's
// open roles.

use super::context::{Perspective, ScoringContext};
use super::{ScoreCategory, ScoreSheet};
use crate::draft::sequence::{BanPhase, DraftStepSpec};
use crate::hero::Hero;

fn phase(step: &DraftStepSpec) -> BanPhase {
    step.ban_phase().unwrap_or(BanPhase::Closing)
}

/// Never ban our own planned pick.
pub fn strategy_guard(hero: &Hero, ctx: &ScoringContext<'_>, step: &DraftStepSpec, sheet: &mut ScoreSheet) {
    if ctx.perspective(step.side) == Perspective::Own && ctx.data.team.strategy.core.contains(&hero.id) {
        sheet.reject(
            ScoreCategory::StrategyProtected,
            format!("{} is part of our strategy core", hero.name),
        );
    }
}

pub fn strategy_avoid(hero: &Hero, ctx: &ScoringContext<'_>, step: &DraftStepSpec, sheet: &mut ScoreSheet) {
    if ctx.perspective(step.side) != Perspective::Own || !ctx.data.team.strategy.avoid.contains(&hero.id) {
        return;
    }
    let w = ctx.weights;
    let bonus = match phase(step) {
        BanPhase::Opening => w.avoid_ban_bonus,
        BanPhase::Closing => w.avoid_ban_bonus_late,
    };
    sheet.add(ScoreCategory::StrategyAvoid, bonus, "breaks our planned strategy");
}

/// Opening bans only: strong heroes regardless of who would pick them.
pub fn meta_denial(hero: &Hero, ctx: &ScoringContext<'_>, step: &DraftStepSpec, sheet: &mut ScoreSheet) {
    if phase(step) != BanPhase::Opening {
        return;
    }
    let w = ctx.weights;
    let points = (hero.win_rate - 50.0).max(0.0) * w.meta_ban_weight + w.ban_tier_bonus(hero.tier);
    sheet.add(
        ScoreCategory::MetaDenial,
        points,
        format!("{}-tier, {:.1}% win rate", hero.tier.label(), hero.win_rate),
    );
}

/// Closing bans: remove heroes that beat what we already picked.
pub fn protect(hero: &Hero, ctx: &ScoringContext<'_>, step: &DraftStepSpec, sheet: &mut ScoreSheet) {
    if phase(step) != BanPhase::Closing {
        return;
    }
    for &ally in ctx.picks(step.side) {
        let edge = ctx.data.counters.edge(hero.id, ally);
        sheet.add(
            ScoreCategory::Protect,
            edge * ctx.weights.protect_weight,
            format!(
                "wins {:.1}% into our {}",
                50.0 + edge,
                ctx.data.heroes.name_of(ally)
            ),
        );
    }
}

/// Closing bans: strong heroes for a role the opponent still has to fill.
pub fn deny(hero: &Hero, ctx: &ScoringContext<'_>, step: &DraftStepSpec, sheet: &mut ScoreSheet) {
    if phase(step) != BanPhase::Closing {
        return;
    }
    let open = ctx.missing_roles(step.side.opponent());
    let Some(role) = hero.roles.iter().find(|r| open.contains(r)) else {
        return;
    };
    let w = ctx.weights;
    let points = (hero.win_rate - 50.0).max(0.0) * w.deny_weight + w.ban_tier_bonus(hero.tier) / 2.0;
    sheet.add(
        ScoreCategory::Deny,
        points,
        format!("{} still need a {}", step.side.opponent(), role),
    );
}

/// Predicted opponent: ban the heroes our team likes to open with.
pub fn target_preference(hero: &Hero, ctx: &ScoringContext<'_>, step: &DraftStepSpec, sheet: &mut ScoreSheet) {
    if ctx.perspective(step.side) != Perspective::Opponent {
        return;
    }
    if let Some(pref) = ctx
        .threats(Perspective::Opponent)
        .into_iter()
        .find(|e| e.hero == hero.id)
    {
        let w = ctx.weights;
        let points = (pref.win_rate / 100.0 * pref.weight * w.target_pref_weight).min(w.target_pref_cap);
        sheet.add(
            ScoreCategory::TargetPreference,
            points,
            format!("our favored first pick ({:.1}% win rate)", pref.win_rate),
        );
    }
}

/// Predicted opponent: they keep their own threats open.
pub fn protect_own_pool(hero: &Hero, ctx: &ScoringContext<'_>, step: &DraftStepSpec, sheet: &mut ScoreSheet) {
    if ctx.perspective(step.side) != Perspective::Opponent {
        return;
    }
    if let Some(own) = ctx
        .preferences(Perspective::Opponent)
        .into_iter()
        .find(|e| e.hero == hero.id)
    {
        sheet.add(
            ScoreCategory::ProtectOwnPool,
            -own.weight * ctx.weights.protect_own_pool_weight,
            format!("one of their own threats (level {:.1})", own.weight),
        );
    }
}
