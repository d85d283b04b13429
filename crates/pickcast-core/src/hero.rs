// Hero roster model: identifiers, roles, tiers.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable hero identifier. Ordering is used as the deterministic tie-break
/// everywhere candidates are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeroId(pub u32);

impl fmt::Display for HeroId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The five lane/position categories of a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Exp,
    Jungle,
    Mid,
    Gold,
    Roam,
}

impl Role {
    /// Every role in display order.
    pub const ALL: [Role; 5] = [Role::Exp, Role::Jungle, Role::Mid, Role::Gold, Role::Roam];

    /// Parse a role name using the built-in alias table.
    ///
    /// Handles the common community spellings:
    /// - "EXP Lane", "EXP", "Fighter Lane" -> Exp
    /// - "Jungle", "Jungler" -> Jungle
    /// - "Mid Lane", "Mid", "Mage Lane" -> Mid
    /// - "Gold Lane", "Gold", "Marksman Lane" -> Gold
    /// - "Roam", "Roamer", "Support" -> Roam
    pub fn from_str_role(s: &str) -> Option<Self> {
        match normalize(s).as_str() {
            "exp lane" | "exp" | "fighter lane" => Some(Role::Exp),
            "jungle" | "jungler" => Some(Role::Jungle),
            "mid lane" | "mid" | "mage lane" => Some(Role::Mid),
            "gold lane" | "gold" | "marksman lane" => Some(Role::Gold),
            "roam" | "roamer" | "support" => Some(Role::Roam),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Role::Exp => "EXP",
            Role::Jungle => "Jungle",
            Role::Mid => "Mid",
            Role::Gold => "Gold",
            Role::Roam => "Roam",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

fn normalize(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .replace(|c: char| c == '_' || c == '-', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Role-name resolver: the built-in aliases extended with configured ones.
///
/// Configured aliases take precedence, so a league that calls its roamers
/// "tank" can map that name without touching the built-in table.
#[derive(Debug, Clone, Default)]
pub struct RoleAliases {
    extra: HashMap<String, Role>,
}

impl RoleAliases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `alias` as another name for `role`.
    pub fn insert(&mut self, alias: &str, role: Role) {
        self.extra.insert(normalize(alias), role);
    }

    pub fn resolve(&self, name: &str) -> Option<Role> {
        self.extra
            .get(&normalize(name))
            .copied()
            .or_else(|| Role::from_str_role(name))
    }

    /// Parse a `/`-separated role list, preserving order and dropping
    /// duplicates. Unknown names are returned in the error slot.
    pub fn parse_list(&self, list: &str) -> Result<Vec<Role>, String> {
        let mut roles = Vec::new();
        for part in list.split('/').filter(|p| !p.trim().is_empty()) {
            let role = self.resolve(part).ok_or_else(|| part.trim().to_string())?;
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
        Ok(roles)
    }
}

/// Patch tier classification. `S` is the top tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    S,
    A,
    B,
    C,
    D,
}

impl Tier {
    pub fn from_str_tier(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "S" | "SS" | "S+" => Some(Tier::S),
            "A" => Some(Tier::A),
            "B" => Some(Tier::B),
            "C" => Some(Tier::C),
            "D" => Some(Tier::D),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::S => "S",
            Tier::A => "A",
            Tier::B => "B",
            Tier::C => "C",
            Tier::D => "D",
        }
    }
}

/// A hero as supplied for the active patch. Immutable during a draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hero {
    pub id: HeroId,
    pub name: String,
    /// Role tags; the first entry is the primary role.
    pub roles: Vec<Role>,
    pub tier: Tier,
    /// Aggregate win rate in percent (e.g. 52.4).
    pub win_rate: f64,
}

impl Hero {
    pub fn primary_role(&self) -> Option<Role> {
        self.roles.first().copied()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_flex(&self) -> bool {
        self.roles.len() >= 2
    }
}

/// The hero roster for one draft session, kept sorted by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeroPool {
    heroes: Vec<Hero>,
}

impl HeroPool {
    /// Build a pool, sorting by id and keeping the first entry for any
    /// duplicated id.
    pub fn new(mut heroes: Vec<Hero>) -> Self {
        heroes.sort_by_key(|h| h.id);
        heroes.dedup_by_key(|h| h.id);
        HeroPool { heroes }
    }

    pub fn get(&self, id: HeroId) -> Option<&Hero> {
        self.heroes
            .binary_search_by_key(&id, |h| h.id)
            .ok()
            .map(|idx| &self.heroes[idx])
    }

    pub fn contains(&self, id: HeroId) -> bool {
        self.get(id).is_some()
    }

    /// Display name for a hero id, falling back to the id itself.
    pub fn name_of(&self, id: HeroId) -> String {
        self.get(id)
            .map(|h| h.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hero> {
        self.heroes.iter()
    }

    pub fn first(&self) -> Option<&Hero> {
        self.heroes.first()
    }

    pub fn len(&self) -> usize {
        self.heroes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heroes.is_empty()
    }
}
