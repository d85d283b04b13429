// Tuning constants for the scoring engine.
//
// Every field has a default so a `[scoring]` table only needs to name the
// values it overrides.

use serde::{Deserialize, Serialize};

use crate::hero::Tier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    // --- pick phase ---
    /// Multiplier on the aggregate win rate (percent).
    pub base_weight: f64,
    pub tier_s_bonus: f64,
    pub tier_a_bonus: f64,
    /// Scale applied to raw pair synergy scores.
    pub synergy_scale: f64,
    /// Counter multiplier keyed by the side's pick slot (1-5).
    pub counter_slot_multipliers: [f64; 5],
    pub comfort_per_match: f64,
    pub comfort_cap: f64,
    /// Multiplier on `win_rate/100 * pick_count` for first-pick preferences.
    pub first_pick_pref_weight: f64,
    pub first_pick_pref_cap: f64,
    pub threat_counter_weight: f64,
    /// Opponent-perspective bonus per threat level for their own pool heroes.
    pub threat_affinity_weight: f64,
    /// Strategy core bonus keyed by the side's pick slot (1-5).
    pub strategy_core_slot_bonus: [f64; 5],
    pub flex_bonus: f64,

    // --- ban phase ---
    pub avoid_ban_bonus: f64,
    pub avoid_ban_bonus_late: f64,
    pub meta_ban_weight: f64,
    pub meta_ban_tier_s: f64,
    pub meta_ban_tier_a: f64,
    pub protect_weight: f64,
    pub deny_weight: f64,
    /// Opponent-perspective weight for banning our first-pick preferences.
    pub target_pref_weight: f64,
    pub target_pref_cap: f64,
    /// Opponent-perspective penalty per threat level for banning their own
    /// pool heroes.
    pub protect_own_pool_weight: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        ScoringWeights {
            base_weight: 1.0,
            tier_s_bonus: 10.0,
            tier_a_bonus: 5.0,
            synergy_scale: 0.3,
            counter_slot_multipliers: [1.0, 1.25, 1.5, 1.75, 2.0],
            comfort_per_match: 1.5,
            comfort_cap: 12.0,
            first_pick_pref_weight: 2.0,
            first_pick_pref_cap: 20.0,
            threat_counter_weight: 1.5,
            threat_affinity_weight: 4.0,
            strategy_core_slot_bonus: [8.0, 15.0, 20.0, 25.0, 30.0],
            flex_bonus: 3.0,
            avoid_ban_bonus: 30.0,
            avoid_ban_bonus_late: 15.0,
            meta_ban_weight: 2.0,
            meta_ban_tier_s: 15.0,
            meta_ban_tier_a: 8.0,
            protect_weight: 2.0,
            deny_weight: 1.5,
            target_pref_weight: 1.5,
            target_pref_cap: 20.0,
            protect_own_pool_weight: 5.0,
        }
    }
}

impl ScoringWeights {
    /// Pick-phase tier bonus.
    pub fn tier_bonus(&self, tier: Tier) -> f64 {
        match tier {
            Tier::S => self.tier_s_bonus,
            Tier::A => self.tier_a_bonus,
            _ => 0.0,
        }
    }

    /// Ban-phase meta-denial tier bonus.
    pub fn ban_tier_bonus(&self, tier: Tier) -> f64 {
        match tier {
            Tier::S => self.meta_ban_tier_s,
            Tier::A => self.meta_ban_tier_a,
            _ => 0.0,
        }
    }

    /// Counter multiplier for a 1-based pick slot, clamped to the table.
    pub fn counter_multiplier(&self, pick_slot: u8) -> f64 {
        self.counter_slot_multipliers[slot_index(pick_slot)]
    }

    /// Strategy core bonus for a 1-based pick slot, clamped to the table.
    pub fn strategy_core_bonus(&self, pick_slot: u8) -> f64 {
        self.strategy_core_slot_bonus[slot_index(pick_slot)]
    }

    /// Check the invariants the engine relies on. Returns the offending field
    /// and a message.
    pub fn validate(&self) -> Result<(), (String, String)> {
        let table = &self.strategy_core_slot_bonus;
        if table[1..].iter().any(|&b| b <= table[0]) {
            return Err((
                "scoring.strategy_core_slot_bonus".into(),
                "pick slot 1 must carry a strictly smaller bonus than slots 2-5".into(),
            ));
        }
        if table[1..].windows(2).any(|w| w[1] < w[0]) {
            return Err((
                "scoring.strategy_core_slot_bonus".into(),
                "bonuses for pick slots 2-5 must be non-decreasing".into(),
            ));
        }

        let non_negative: &[(&str, f64)] = &[
            ("scoring.comfort_cap", self.comfort_cap),
            ("scoring.first_pick_pref_cap", self.first_pick_pref_cap),
            ("scoring.target_pref_cap", self.target_pref_cap),
            ("scoring.synergy_scale", self.synergy_scale),
            ("scoring.flex_bonus", self.flex_bonus),
        ];
        for (name, val) in non_negative {
            if !val.is_finite() || *val < 0.0 {
                return Err((name.to_string(), format!("must be a non-negative number, got {val}")));
            }
        }
        if self.counter_slot_multipliers.iter().any(|m| !m.is_finite() || *m < 0.0) {
            return Err((
                "scoring.counter_slot_multipliers".into(),
                "multipliers must be non-negative numbers".into(),
            ));
        }
        Ok(())
    }
}

fn slot_index(pick_slot: u8) -> usize {
    usize::from(pick_slot.clamp(1, 5)) - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ScoringWeights::default().validate().is_ok());
    }

    #[test]
    fn later_slots_weight_counters_more() {
        let w = ScoringWeights::default();
        assert!(w.counter_multiplier(5) > w.counter_multiplier(1));
        assert_eq!(w.counter_multiplier(0), w.counter_multiplier(1));
        assert_eq!(w.counter_multiplier(9), w.counter_multiplier(5));
    }

    #[test]
    fn strategy_table_slot_one_must_be_smallest() {
        let w = ScoringWeights {
            strategy_core_slot_bonus: [20.0, 15.0, 20.0, 25.0, 30.0],
            ..ScoringWeights::default()
        };
        let (field, _) = w.validate().unwrap_err();
        assert_eq!(field, "scoring.strategy_core_slot_bonus");
    }

    #[test]
    fn strategy_table_slot_one_cannot_tie_a_later_slot() {
        let w = ScoringWeights {
            strategy_core_slot_bonus: [15.0, 15.0, 20.0, 25.0, 30.0],
            ..ScoringWeights::default()
        };
        let (field, msg) = w.validate().unwrap_err();
        assert_eq!(field, "scoring.strategy_core_slot_bonus");
        assert!(msg.contains("strictly smaller"));
    }

    #[test]
    fn strategy_table_must_not_decrease_after_slot_one() {
        let w = ScoringWeights {
            strategy_core_slot_bonus: [5.0, 15.0, 25.0, 20.0, 30.0],
            ..ScoringWeights::default()
        };
        assert!(w.validate().is_err());
    }

    #[test]
    fn negative_cap_rejected() {
        let w = ScoringWeights {
            comfort_cap: -1.0,
            ..ScoringWeights::default()
        };
        let (field, msg) = w.validate().unwrap_err();
        assert_eq!(field, "scoring.comfort_cap");
        assert!(msg.contains("non-negative"));
    }

    #[test]
    fn partial_toml_overrides_keep_defaults() {
        let w: ScoringWeights = toml::from_str("flex_bonus = 7.5\n").unwrap();
        assert_eq!(w.flex_bonus, 7.5);
        assert_eq!(w.tier_s_bonus, ScoringWeights::default().tier_s_bonus);
    }
}
