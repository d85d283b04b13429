// Ban/pick bookkeeping: which heroes are gone and which roles each side holds.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::sequence::Side;
use crate::hero::{Hero, HeroId, Role};

/// Bans and picks of one side, in commit order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideBoard {
    /// Picked heroes; index is the pick slot (0-4).
    pub picks: Vec<HeroId>,
    pub bans: Vec<HeroId>,
    /// Role each pick was slotted into, parallel to `picks`.
    pub pick_roles: Vec<Role>,
    pub filled_roles: BTreeSet<Role>,
}

impl SideBoard {
    /// Roles this side still has to fill.
    pub fn missing_roles(&self) -> BTreeSet<Role> {
        Role::ALL
            .iter()
            .copied()
            .filter(|r| !self.filled_roles.contains(r))
            .collect()
    }

    /// First role of `hero` that is still open, preferring `hint` when it is
    /// both one of the hero's roles and open.
    pub fn open_role_for(&self, hero: &Hero, hint: Option<Role>) -> Option<Role> {
        if let Some(role) = hint {
            if hero.has_role(role) && !self.filled_roles.contains(&role) {
                return Some(role);
            }
        }
        hero.roles
            .iter()
            .copied()
            .find(|r| !self.filled_roles.contains(r))
    }
}

/// Tracks every banned or picked hero and the per-side role fill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityTracker {
    used: BTreeSet<HeroId>,
    boards: [SideBoard; 2],
}

impl AvailabilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_available(&self, hero: HeroId) -> bool {
        !self.used.contains(&hero)
    }

    /// Every hero banned or picked so far.
    pub fn used(&self) -> &BTreeSet<HeroId> {
        &self.used
    }

    pub fn board(&self, side: Side) -> &SideBoard {
        &self.boards[side.index()]
    }

    pub fn picks(&self, side: Side) -> &[HeroId] {
        &self.boards[side.index()].picks
    }

    pub fn bans(&self, side: Side) -> &[HeroId] {
        &self.boards[side.index()].bans
    }

    pub fn missing_roles(&self, side: Side) -> BTreeSet<Role> {
        self.board(side).missing_roles()
    }

    pub fn record_ban(&mut self, side: Side, hero: HeroId) {
        self.used.insert(hero);
        self.boards[side.index()].bans.push(hero);
    }

    /// Record a pick and mark the role it fills.
    ///
    /// Role assignment priority:
    /// 1. `role_hint`, when it is one of the hero's roles and still open
    /// 2. The hero's first open role, in tag order
    /// 3. The hero's primary role, even though it is already filled
    ///
    /// Case 3 only happens when replaying data that was never validated; live
    /// commits reject it before reaching the tracker. Returns the role used.
    pub fn record_pick(&mut self, side: Side, hero: &Hero, role_hint: Option<Role>) -> Option<Role> {
        let board = &mut self.boards[side.index()];
        let role = board.open_role_for(hero, role_hint).or_else(|| {
            warn!(
                "{} pick {} ({}) has no open role, slotting into primary role",
                side, hero.id, hero.name
            );
            hero.primary_role()
        });

        self.used.insert(hero.id);
        board.picks.push(hero.id);
        if let Some(role) = role {
            board.pick_roles.push(role);
            board.filled_roles.insert(role);
        }
        role
    }
}
