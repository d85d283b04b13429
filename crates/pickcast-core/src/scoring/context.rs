// Reference data and the per-step scoring context.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::weights::ScoringWeights;
use crate::draft::availability::AvailabilityTracker;
use crate::draft::sequence::Side;
use crate::hero::{HeroId, HeroPool, Role};

// ---------------------------------------------------------------------------
// Pair tables
// ---------------------------------------------------------------------------

/// Symmetric synergy scores, looked up by unordered pair.
#[derive(Debug, Clone, Default)]
pub struct SynergyTable {
    scores: HashMap<(HeroId, HeroId), f64>,
}

impl SynergyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, a: HeroId, b: HeroId, score: f64) {
        self.scores.insert(pair_key(a, b), score);
    }

    /// Synergy of `a` with `b`; 0 when the pair is unknown.
    pub fn score(&self, a: HeroId, b: HeroId) -> f64 {
        self.scores.get(&pair_key(a, b)).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

fn pair_key(a: HeroId, b: HeroId) -> (HeroId, HeroId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Directional matchup table: win rate of `hero` against `opponent`.
#[derive(Debug, Clone, Default)]
pub struct CounterTable {
    win_rates: HashMap<(HeroId, HeroId), f64>,
}

impl CounterTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, hero: HeroId, opponent: HeroId, win_rate: f64) {
        self.win_rates.insert((hero, opponent), win_rate);
    }

    pub fn win_rate(&self, hero: HeroId, opponent: HeroId) -> Option<f64> {
        self.win_rates.get(&(hero, opponent)).copied()
    }

    /// Points above an even matchup; 0 for unknown or losing matchups.
    pub fn edge(&self, hero: HeroId, opponent: HeroId) -> f64 {
        self.win_rate(hero, opponent)
            .map(|wr| (wr - 50.0).max(0.0))
            .unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.win_rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.win_rates.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Team data
// ---------------------------------------------------------------------------

/// One entry of our historical first-pick preference list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirstPickPreference {
    pub hero: HeroId,
    pub win_rate: f64,
    pub pick_count: u32,
}

/// A hero the opposing team is dangerous on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyThreat {
    pub hero: HeroId,
    pub win_rate: f64,
    pub threat_level: f64,
}

/// Named hero sets of our planned composition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    /// Heroes we intend to pick; never banned by us.
    #[serde(default)]
    pub core: BTreeSet<HeroId>,
    /// Enemy heroes that break the plan; prioritized for banning.
    #[serde(default)]
    pub avoid: BTreeSet<HeroId>,
}

/// Heroes each side already used earlier in the series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalBans {
    #[serde(default)]
    pub blue: BTreeSet<HeroId>,
    #[serde(default)]
    pub red: BTreeSet<HeroId>,
}

impl GlobalBans {
    pub fn for_side(&self, side: Side) -> &BTreeSet<HeroId> {
        match side {
            Side::Blue => &self.blue,
            Side::Red => &self.red,
        }
    }
}

/// Everything known about our team and its opponent for this draft.
#[derive(Debug, Clone, Default)]
pub struct TeamProfile {
    /// The side our team plays.
    pub side: Option<Side>,
    /// Matches played per hero by our players.
    pub pool_history: HashMap<HeroId, u32>,
    pub first_pick_prefs: Vec<FirstPickPreference>,
    pub enemy_threats: Vec<EnemyThreat>,
    pub strategy: Strategy,
    pub global_bans: GlobalBans,
}

/// Read-only reference data for one draft session.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub heroes: HeroPool,
    pub synergy: SynergyTable,
    pub counters: CounterTable,
    pub team: TeamProfile,
}

impl ReferenceData {
    /// Heroes in `enemies` that `hero` has a winning matchup against.
    pub fn counters_for(&self, hero: HeroId, enemies: &[HeroId]) -> Vec<HeroId> {
        enemies
            .iter()
            .copied()
            .filter(|&enemy| self.counters.edge(hero, enemy) > 0.0)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Scoring context
// ---------------------------------------------------------------------------

/// Whose interests a score is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Perspective {
    /// Our team, with access to its history and strategy.
    Own,
    /// The opposing team, predicted from what we know about them.
    Opponent,
}

/// A hero paired with a win rate and weight, as used for preference and
/// threat lookups from either perspective.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolEntry {
    pub hero: HeroId,
    pub win_rate: f64,
    pub weight: f64,
}

/// Borrowed view over everything a scoring pass reads. Must not be mutated
/// while a pass is in flight; the borrow checker enforces this.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub data: &'a ReferenceData,
    pub weights: &'a ScoringWeights,
    pub tracker: &'a AvailabilityTracker,
}

impl<'a> ScoringContext<'a> {
    pub fn new(
        data: &'a ReferenceData,
        weights: &'a ScoringWeights,
        tracker: &'a AvailabilityTracker,
    ) -> Self {
        ScoringContext {
            data,
            weights,
            tracker,
        }
    }

    /// Perspective of `acting`: our side is `Own`, the other is predicted.
    /// Without a configured side, Blue is treated as ours.
    pub fn perspective(&self, acting: Side) -> Perspective {
        let ours = self.data.team.side.unwrap_or(Side::Blue);
        if acting == ours {
            Perspective::Own
        } else {
            Perspective::Opponent
        }
    }

    pub fn is_used(&self, hero: HeroId) -> bool {
        !self.tracker.is_available(hero)
    }

    pub fn picks(&self, side: Side) -> &'a [HeroId] {
        self.tracker.picks(side)
    }

    pub fn missing_roles(&self, side: Side) -> BTreeSet<Role> {
        self.tracker.missing_roles(side)
    }

    pub fn global_bans(&self, side: Side) -> &'a BTreeSet<HeroId> {
        self.data.team.global_bans.for_side(side)
    }

    /// First-pick preferences of the side acting from `perspective`. For the
    /// opponent this is their threat list, weighted by threat level.
    pub fn preferences(&self, perspective: Perspective) -> Vec<PoolEntry> {
        match perspective {
            Perspective::Own => self
                .data
                .team
                .first_pick_prefs
                .iter()
                .map(|p| PoolEntry {
                    hero: p.hero,
                    win_rate: p.win_rate,
                    weight: f64::from(p.pick_count),
                })
                .collect(),
            Perspective::Opponent => self
                .data
                .team
                .enemy_threats
                .iter()
                .map(|t| PoolEntry {
                    hero: t.hero,
                    win_rate: t.win_rate,
                    weight: t.threat_level,
                })
                .collect(),
        }
    }

    /// Heroes the other side is known to be dangerous on, seen from
    /// `perspective`. For us that is the enemy threat list; for the opponent
    /// it is our first-pick preference list.
    pub fn threats(&self, perspective: Perspective) -> Vec<PoolEntry> {
        match perspective {
            Perspective::Own => self.preferences(Perspective::Opponent),
            Perspective::Opponent => self.preferences(Perspective::Own),
        }
    }
}
