// Pick-phase evaluators.

use super::context::{Perspective, ScoringContext};
use super::{ScoreCategory, ScoreSheet};
use crate::draft::sequence::DraftStepSpec;
use crate::hero::Hero;

pub fn base_power(hero: &Hero, ctx: &ScoringContext<'_>, _step: &DraftStepSpec, sheet: &mut ScoreSheet) {
    sheet.add(
        ScoreCategory::BasePower,
        hero.win_rate * ctx.weights.base_weight,
        format!("{:.1}% aggregate win rate", hero.win_rate),
    );
}

pub fn tier(hero: &Hero, ctx: &ScoringContext<'_>, _step: &DraftStepSpec, sheet: &mut ScoreSheet) {
    sheet.add(
        ScoreCategory::Tier,
        ctx.weights.tier_bonus(hero.tier),
        format!("{}-tier this patch", hero.tier.label()),
    );
}

/// One contribution per ally already on the acting side.
pub fn synergy(hero: &Hero, ctx: &ScoringContext<'_>, step: &DraftStepSpec, sheet: &mut ScoreSheet) {
    for &ally in ctx.picks(step.side) {
        let raw = ctx.data.synergy.score(hero.id, ally);
        sheet.add(
            ScoreCategory::Synergy,
            raw * ctx.weights.synergy_scale,
            format!("synergy {raw:+.1} with {}", ctx.data.heroes.name_of(ally)),
        );
    }
}

/// Matchup edge against each enemy pick, weighted by how late this pick is.
pub fn counter(hero: &Hero, ctx: &ScoringContext<'_>, step: &DraftStepSpec, sheet: &mut ScoreSheet) {
    let multiplier = ctx.weights.counter_multiplier(step.slot);
    for &enemy in ctx.picks(step.side.opponent()) {
        let edge = ctx.data.counters.edge(hero.id, enemy);
        sheet.add(
            ScoreCategory::Counter,
            edge * multiplier,
            format!(
                "{:.1}% into {}",
                50.0 + edge,
                ctx.data.heroes.name_of(enemy)
            ),
        );
    }
}

pub fn team_comfort(hero: &Hero, ctx: &ScoringContext<'_>, step: &DraftStepSpec, sheet: &mut ScoreSheet) {
    if ctx.perspective(step.side) != Perspective::Own {
        return;
    }
    let Some(&matches) = ctx.data.team.pool_history.get(&hero.id) else {
        return;
    };
    let w = ctx.weights;
    sheet.add(
        ScoreCategory::TeamComfort,
        (f64::from(matches) * w.comfort_per_match).min(w.comfort_cap),
        format!("played {matches} times by our roster"),
    );
}

/// Predicted opponent leans toward heroes on their known threat list.
pub fn threat_affinity(hero: &Hero, ctx: &ScoringContext<'_>, step: &DraftStepSpec, sheet: &mut ScoreSheet) {
    if ctx.perspective(step.side) != Perspective::Opponent {
        return;
    }
    if let Some(entry) = ctx
        .preferences(Perspective::Opponent)
        .into_iter()
        .find(|e| e.hero == hero.id)
    {
        sheet.add(
            ScoreCategory::ThreatAffinity,
            entry.weight * ctx.weights.threat_affinity_weight,
            format!("opponent comfort pick (threat level {:.1})", entry.weight),
        );
    }
}

pub fn first_pick_preference(
    hero: &Hero,
    ctx: &ScoringContext<'_>,
    step: &DraftStepSpec,
    sheet: &mut ScoreSheet,
) {
    if step.slot != 1 {
        return;
    }
    let perspective = ctx.perspective(step.side);
    if let Some(entry) = ctx
        .preferences(perspective)
        .into_iter()
        .find(|e| e.hero == hero.id)
    {
        let w = ctx.weights;
        let bonus = (entry.win_rate / 100.0 * entry.weight * w.first_pick_pref_weight)
            .min(w.first_pick_pref_cap);
        sheet.add(
            ScoreCategory::FirstPickPreference,
            bonus,
            format!("historical first pick ({:.1}% win rate)", entry.win_rate),
        );
    }
}

/// First pick only: pre-empt the other side's known threats before any enemy
/// pick exists.
pub fn counter_enemy_pool(
    hero: &Hero,
    ctx: &ScoringContext<'_>,
    step: &DraftStepSpec,
    sheet: &mut ScoreSheet,
) {
    if step.slot != 1 {
        return;
    }
    let perspective = ctx.perspective(step.side);
    for threat in ctx.threats(perspective) {
        if threat.hero == hero.id || ctx.is_used(threat.hero) {
            continue;
        }
        let edge = ctx.data.counters.edge(hero.id, threat.hero);
        sheet.add(
            ScoreCategory::CounterEnemyPool,
            edge * ctx.weights.threat_counter_weight,
            format!(
                "counters enemy threat {} ({:.1}%)",
                ctx.data.heroes.name_of(threat.hero),
                50.0 + edge
            ),
        );
    }
}

/// Strategy pieces grow more valuable on later, safer pick slots.
pub fn strategy_core(hero: &Hero, ctx: &ScoringContext<'_>, step: &DraftStepSpec, sheet: &mut ScoreSheet) {
    if ctx.perspective(step.side) != Perspective::Own
        || !ctx.data.team.strategy.core.contains(&hero.id)
    {
        return;
    }
    sheet.add(
        ScoreCategory::StrategyCore,
        ctx.weights.strategy_core_bonus(step.slot),
        format!("strategy core piece on pick {}", step.slot),
    );
}

pub fn flex(hero: &Hero, ctx: &ScoringContext<'_>, step: &DraftStepSpec, sheet: &mut ScoreSheet) {
    if step.slot > 2 || !hero.is_flex() {
        return;
    }
    let roles: Vec<&str> = hero.roles.iter().map(|r| r.display_str()).collect();
    sheet.add(
        ScoreCategory::Flex,
        ctx.weights.flex_bonus,
        format!("flexes {}", roles.join("/")),
    );
}
