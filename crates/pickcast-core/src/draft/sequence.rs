// The fixed 18-step global ban-pick order.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two competing teams. Blue holds first pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Blue,
    Red,
}

impl Side {
    pub fn opponent(&self) -> Side {
        match self {
            Side::Blue => Side::Red,
            Side::Red => Side::Blue,
        }
    }

    /// Index into per-side arrays (Blue = 0, Red = 1).
    pub fn index(&self) -> usize {
        match self {
            Side::Blue => 0,
            Side::Red => 1,
        }
    }

    pub fn from_str_side(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "BLUE" | "B" => Some(Side::Blue),
            "RED" | "R" => Some(Side::Red),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Side::Blue => "BLUE",
            Side::Red => "RED",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    Ban,
    Pick,
}

impl ActionKind {
    pub fn from_str_action(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "BAN" => Some(ActionKind::Ban),
            "PICK" => Some(ActionKind::Pick),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Ban => "BAN",
            ActionKind::Pick => "PICK",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Which ban round a ban step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BanPhase {
    /// Bans 1-4, before any pick: broad meta denial.
    Opening,
    /// Bans 5-8, after six picks: targeted protect/deny.
    Closing,
}

/// A single entry of the draft order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DraftStepSpec {
    /// 1-based position in the sequence.
    pub order: u8,
    pub side: Side,
    pub action: ActionKind,
    /// 1-based slot within this side's bans or picks.
    pub slot: u8,
    pub label: &'static str,
}

impl DraftStepSpec {
    /// Zero-based step index.
    pub fn index(&self) -> usize {
        usize::from(self.order) - 1
    }

    /// The ban round for ban steps; `None` for picks.
    pub fn ban_phase(&self) -> Option<BanPhase> {
        match self.action {
            ActionKind::Pick => None,
            ActionKind::Ban if self.index() < PICK_ROUND_ONE_START => Some(BanPhase::Opening),
            ActionKind::Ban => Some(BanPhase::Closing),
        }
    }
}

pub const TOTAL_STEPS: usize = 18;
pub const BANS_PER_SIDE: usize = 4;
pub const PICKS_PER_SIDE: usize = 5;

/// First step index of the opening pick round.
const PICK_ROUND_ONE_START: usize = 4;

const fn step(order: u8, side: Side, action: ActionKind, slot: u8, label: &'static str) -> DraftStepSpec {
    DraftStepSpec {
        order,
        side,
        action,
        slot,
        label,
    }
}

/// Tournament order: bans B,R,B,R; picks B,R,R,B,B,R; bans R,B,R,B; picks R,B,B,R.
pub const DRAFT_SEQUENCE: [DraftStepSpec; TOTAL_STEPS] = [
    step(1, Side::Blue, ActionKind::Ban, 1, "Blue Ban 1"),
    step(2, Side::Red, ActionKind::Ban, 1, "Red Ban 1"),
    step(3, Side::Blue, ActionKind::Ban, 2, "Blue Ban 2"),
    step(4, Side::Red, ActionKind::Ban, 2, "Red Ban 2"),
    step(5, Side::Blue, ActionKind::Pick, 1, "Blue Pick 1"),
    step(6, Side::Red, ActionKind::Pick, 1, "Red Pick 1"),
    step(7, Side::Red, ActionKind::Pick, 2, "Red Pick 2"),
    step(8, Side::Blue, ActionKind::Pick, 2, "Blue Pick 2"),
    step(9, Side::Blue, ActionKind::Pick, 3, "Blue Pick 3"),
    step(10, Side::Red, ActionKind::Pick, 3, "Red Pick 3"),
    step(11, Side::Red, ActionKind::Ban, 3, "Red Ban 3"),
    step(12, Side::Blue, ActionKind::Ban, 3, "Blue Ban 3"),
    step(13, Side::Red, ActionKind::Ban, 4, "Red Ban 4"),
    step(14, Side::Blue, ActionKind::Ban, 4, "Blue Ban 4"),
    step(15, Side::Red, ActionKind::Pick, 4, "Red Pick 4"),
    step(16, Side::Blue, ActionKind::Pick, 4, "Blue Pick 4"),
    step(17, Side::Blue, ActionKind::Pick, 5, "Blue Pick 5"),
    step(18, Side::Red, ActionKind::Pick, 5, "Red Pick 5"),
];

/// Look up the step at `index`; `None` once the draft is complete.
pub fn step_at(index: usize) -> Option<DraftStepSpec> {
    DRAFT_SEQUENCE.get(index).copied()
}
