// Draft state machine: step cursor, countdown, pause, rehydration.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::availability::AvailabilityTracker;
use super::sequence::{step_at, ActionKind, DraftStepSpec, Side, TOTAL_STEPS};
use crate::error::DraftError;
use crate::hero::{Hero, HeroId, HeroPool, Role};

/// Countdown durations per action type, in ticks (seconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    pub ban_seconds: u32,
    pub pick_seconds: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        TimerConfig {
            ban_seconds: 30,
            pick_seconds: 30,
        }
    }
}

impl TimerConfig {
    pub fn duration_for(&self, action: ActionKind) -> u32 {
        match action {
            ActionKind::Ban => self.ban_seconds,
            ActionKind::Pick => self.pick_seconds,
        }
    }
}

/// A committed action as handed to persistence, and as read back for
/// rehydration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftAction {
    pub side: Side,
    pub action: ActionKind,
    pub hero: HeroId,
    /// Zero-based slot within this side's bans or picks.
    pub slot: usize,
}

/// Where the state machine is in the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DraftPhase {
    AwaitingAction(usize),
    Finished,
}

/// The complete state of one draft in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftState {
    step_index: usize,
    tracker: AvailabilityTracker,
    actions: Vec<DraftAction>,
    seconds_remaining: u32,
    paused: bool,
    finished: bool,
    timer: TimerConfig,
}

impl DraftState {
    /// Create an empty draft at step 0 with the first step's countdown.
    pub fn new(timer: TimerConfig) -> Self {
        let mut state = DraftState {
            step_index: 0,
            tracker: AvailabilityTracker::new(),
            actions: Vec::new(),
            seconds_remaining: 0,
            paused: false,
            finished: false,
            timer,
        };
        state.reset_countdown();
        state
    }

    pub fn phase(&self) -> DraftPhase {
        if self.finished {
            DraftPhase::Finished
        } else {
            DraftPhase::AwaitingAction(self.step_index)
        }
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    /// The step awaiting an action; `None` once finished.
    pub fn current_step(&self) -> Option<DraftStepSpec> {
        if self.finished {
            None
        } else {
            step_at(self.step_index)
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    /// Whether the countdown for the active step has run out. Advisory only:
    /// the state machine never commits on the caller's behalf.
    pub fn is_time_up(&self) -> bool {
        !self.finished && self.seconds_remaining == 0
    }

    pub fn timer(&self) -> TimerConfig {
        self.timer
    }

    pub fn tracker(&self) -> &AvailabilityTracker {
        &self.tracker
    }

    /// Every committed action, in order.
    pub fn actions(&self) -> &[DraftAction] {
        &self.actions
    }

    pub fn picks(&self, side: Side) -> &[HeroId] {
        self.tracker.picks(side)
    }

    pub fn bans(&self, side: Side) -> &[HeroId] {
        self.tracker.bans(side)
    }

    pub fn is_available(&self, hero: HeroId) -> bool {
        self.tracker.is_available(hero)
    }

    /// Commit `hero` for the current step.
    pub fn commit(&mut self, hero: &Hero) -> Result<DraftAction, DraftError> {
        self.commit_with_role(hero, None)
    }

    /// Commit `hero` for the current step, preferring `role_hint` when it is
    /// one of the hero's open roles.
    ///
    /// Fails without touching the state when the draft is finished, the hero
    /// is already used, or a pick has no open role for the hero.
    pub fn commit_with_role(
        &mut self,
        hero: &Hero,
        role_hint: Option<Role>,
    ) -> Result<DraftAction, DraftError> {
        let step = self.current_step().ok_or(DraftError::InvalidState)?;

        if !self.tracker.is_available(hero.id) {
            return Err(DraftError::HeroUnavailable(hero.id));
        }

        if step.action == ActionKind::Pick
            && self
                .tracker
                .board(step.side)
                .open_role_for(hero, role_hint)
                .is_none()
        {
            return Err(DraftError::RoleExhausted {
                side: step.side,
                hero: hero.id,
            });
        }

        let action = self.record(step, hero, role_hint);
        info!(
            "Committed {} {} slot {}: {} ({})",
            action.side,
            action.action,
            action.slot + 1,
            hero.name,
            hero.id
        );
        self.advance();
        Ok(action)
    }

    /// Pass on the current step without committing anything.
    ///
    /// Only used by simulations that have run out of legal heroes; afterwards
    /// `step_index` is ahead of the number of recorded actions.
    pub fn forfeit(&mut self) -> Result<DraftStepSpec, DraftError> {
        let step = self.current_step().ok_or(DraftError::InvalidState)?;
        warn!("{} forfeits {} with no legal hero", step.side, step.label);
        self.advance();
        Ok(step)
    }

    /// Advance the countdown by one tick. Returns the seconds remaining.
    pub fn tick(&mut self) -> u32 {
        if !self.paused && !self.finished {
            self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        }
        self.seconds_remaining
    }

    /// Flip the paused flag. Returns the new value.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        debug!("Draft timer paused={}", self.paused);
        self.paused
    }

    /// Rebuild a draft by replaying previously persisted actions.
    ///
    /// Each action goes through the same recording logic as `commit`, except
    /// that a pick with no open role is slotted leniently instead of rejected,
    /// so that whatever was persisted is reproduced exactly. Actions that
    /// disagree with the draft order, reuse a hero, or name a hero missing from
    /// the roster are rejected.
    pub fn rehydrate(
        timer: TimerConfig,
        actions: &[DraftAction],
        pool: &HeroPool,
    ) -> Result<Self, DraftError> {
        let mut state = DraftState::new(timer);

        for (index, persisted) in actions.iter().enumerate() {
            let step = step_at(index).ok_or(DraftError::InvalidState)?;
            if step.side != persisted.side || step.action != persisted.action {
                return Err(DraftError::SequenceMismatch {
                    index,
                    expected: format!("{} {}", step.side, step.action),
                    actual: format!("{} {}", persisted.side, persisted.action),
                });
            }
            let hero = pool
                .get(persisted.hero)
                .ok_or(DraftError::UnknownHero(persisted.hero))?;
            if !state.tracker.is_available(hero.id) {
                return Err(DraftError::HeroUnavailable(hero.id));
            }

            let recorded = state.record(step, hero, None);
            if recorded.slot != persisted.slot {
                warn!(
                    "Persisted slot {} for {} {} differs from replayed slot {}",
                    persisted.slot, persisted.side, persisted.action, recorded.slot
                );
            }
        }

        state.step_index = actions.len();
        state.finished = state.step_index >= TOTAL_STEPS;
        state.reset_countdown();
        info!(
            "Rehydrated draft at step {} (finished={})",
            state.step_index, state.finished
        );
        Ok(state)
    }

    fn record(&mut self, step: DraftStepSpec, hero: &Hero, role_hint: Option<Role>) -> DraftAction {
        let slot = match step.action {
            ActionKind::Ban => {
                let slot = self.tracker.bans(step.side).len();
                self.tracker.record_ban(step.side, hero.id);
                slot
            }
            ActionKind::Pick => {
                let slot = self.tracker.picks(step.side).len();
                self.tracker.record_pick(step.side, hero, role_hint);
                slot
            }
        };
        let action = DraftAction {
            side: step.side,
            action: step.action,
            hero: hero.id,
            slot,
        };
        self.actions.push(action);
        action
    }

    fn advance(&mut self) {
        self.step_index += 1;
        if self.step_index >= TOTAL_STEPS {
            self.finished = true;
            info!("Draft finished after {} actions", self.step_index);
        }
        self.reset_countdown();
    }

    fn reset_countdown(&mut self) {
        self.seconds_remaining = self
            .current_step()
            .map(|s| self.timer.duration_for(s.action))
            .unwrap_or(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::sequence::DRAFT_SEQUENCE;
    use crate::hero::Tier;

    /// 20 heroes, cycling through the five roles.
    fn test_pool() -> HeroPool {
        HeroPool::new(
            (1..=20)
                .map(|i| Hero {
                    id: HeroId(i),
                    name: format!("Hero {i}"),
                    roles: vec![Role::ALL[(i as usize - 1) % 5]],
                    tier: Tier::B,
                    win_rate: 50.0,
                })
                .collect(),
        )
    }

    /// A legal hero order for the full draft. Blue picks one of each role via
    /// heroes 1..5, Red via 6..10, and bans use 11..18.
    fn legal_order() -> Vec<u32> {
        let mut blue_picks = vec![1, 2, 3, 4, 5].into_iter();
        let mut red_picks = vec![6, 7, 8, 9, 10].into_iter();
        let mut bans = (11..=18).collect::<Vec<u32>>().into_iter();
        DRAFT_SEQUENCE
            .iter()
            .map(|s| match (s.action, s.side) {
                (ActionKind::Ban, _) => bans.next().unwrap(),
                (ActionKind::Pick, Side::Blue) => blue_picks.next().unwrap(),
                (ActionKind::Pick, Side::Red) => red_picks.next().unwrap(),
            })
            .collect()
    }

    #[test]
    fn new_state_awaits_first_step() {
        let state = DraftState::new(TimerConfig::default());
        assert_eq!(state.phase(), DraftPhase::AwaitingAction(0));
        assert_eq!(state.seconds_remaining(), 30);
        assert!(!state.is_finished());
        assert!(!state.is_paused());
        assert_eq!(state.current_step().unwrap().label, "Blue Ban 1");
    }

    #[test]
    fn step_index_tracks_commit_count() {
        let pool = test_pool();
        let mut state = DraftState::new(TimerConfig::default());
        for (n, id) in legal_order().into_iter().enumerate() {
            assert_eq!(state.step_index(), n);
            assert!(!state.is_finished());
            state.commit(pool.get(HeroId(id)).unwrap()).unwrap();
        }
        assert_eq!(state.step_index(), 18);
        assert!(state.is_finished());
        assert_eq!(state.phase(), DraftPhase::Finished);
        assert_eq!(state.seconds_remaining(), 0);
    }

    #[test]
    fn commit_records_slot_from_existing_count() {
        let pool = test_pool();
        let mut state = DraftState::new(TimerConfig::default());
        let a = state.commit(pool.get(HeroId(11)).unwrap()).unwrap();
        let b = state.commit(pool.get(HeroId(12)).unwrap()).unwrap();
        let c = state.commit(pool.get(HeroId(13)).unwrap()).unwrap();
        assert_eq!((a.side, a.action, a.slot), (Side::Blue, ActionKind::Ban, 0));
        assert_eq!((b.side, b.action, b.slot), (Side::Red, ActionKind::Ban, 0));
        assert_eq!((c.side, c.action, c.slot), (Side::Blue, ActionKind::Ban, 1));
        assert_eq!(state.bans(Side::Blue), &[HeroId(11), HeroId(13)]);
    }

    #[test]
    fn commit_after_finish_is_invalid_state() {
        let pool = test_pool();
        let mut state = DraftState::new(TimerConfig::default());
        for id in legal_order() {
            state.commit(pool.get(HeroId(id)).unwrap()).unwrap();
        }
        let err = state.commit(pool.get(HeroId(19)).unwrap()).unwrap_err();
        assert_eq!(err, DraftError::InvalidState);
        assert_eq!(state.step_index(), 18);
    }

    #[test]
    fn duplicate_hero_is_rejected_without_side_effects() {
        let pool = test_pool();
        let mut state = DraftState::new(TimerConfig::default());
        state.commit(pool.get(HeroId(1)).unwrap()).unwrap();
        state.tick();
        let before = state.clone();
        let err = state.commit(pool.get(HeroId(1)).unwrap()).unwrap_err();
        assert_eq!(err, DraftError::HeroUnavailable(HeroId(1)));
        assert_eq!(state, before);
    }

    #[test]
    fn pick_without_open_role_is_role_exhausted() {
        let pool = test_pool();
        let mut state = DraftState::new(TimerConfig::default());
        for id in [11, 12, 13, 14] {
            state.commit(pool.get(HeroId(id)).unwrap()).unwrap();
        }
        // Blue pick 1: hero 1 (Exp).
        state.commit(pool.get(HeroId(1)).unwrap()).unwrap();
        // Red pick 1 and 2.
        state.commit(pool.get(HeroId(6)).unwrap()).unwrap();
        state.commit(pool.get(HeroId(7)).unwrap()).unwrap();
        // Blue pick 2: hero 16 is also Exp, which Blue already holds.
        let err = state.commit(pool.get(HeroId(16)).unwrap()).unwrap_err();
        assert_eq!(
            err,
            DraftError::RoleExhausted {
                side: Side::Blue,
                hero: HeroId(16)
            }
        );
        assert_eq!(state.step_index(), 7);
        assert!(state.is_available(HeroId(16)));
    }

    #[test]
    fn forfeit_advances_without_recording() {
        let mut state = DraftState::new(TimerConfig::default());
        let step = state.forfeit().unwrap();
        assert_eq!(step.label, "Blue Ban 1");
        assert_eq!(state.step_index(), 1);
        assert!(state.actions().is_empty());
        for _ in 1..18 {
            state.forfeit().unwrap();
        }
        assert!(state.is_finished());
        assert_eq!(state.forfeit().unwrap_err(), DraftError::InvalidState);
    }

    #[test]
    fn tick_counts_down_and_floors_at_zero() {
        let mut state = DraftState::new(TimerConfig {
            ban_seconds: 2,
            pick_seconds: 5,
        });
        assert_eq!(state.tick(), 1);
        assert_eq!(state.tick(), 0);
        assert_eq!(state.tick(), 0);
        assert!(state.is_time_up());
        // Expiry never commits anything.
        assert_eq!(state.step_index(), 0);
    }

    #[test]
    fn commit_resets_countdown_to_next_phase_duration() {
        let pool = test_pool();
        let mut state = DraftState::new(TimerConfig {
            ban_seconds: 10,
            pick_seconds: 25,
        });
        for id in [11, 12, 13] {
            state.tick();
            state.commit(pool.get(HeroId(id)).unwrap()).unwrap();
            assert_eq!(state.seconds_remaining(), 10);
        }
        state.commit(pool.get(HeroId(14)).unwrap()).unwrap();
        assert_eq!(state.seconds_remaining(), 25);
    }

    #[test]
    fn paused_timer_does_not_tick() {
        let mut state = DraftState::new(TimerConfig::default());
        assert!(state.toggle_pause());
        assert_eq!(state.tick(), 30);
        assert!(!state.toggle_pause());
        assert_eq!(state.tick(), 29);
        assert_eq!(state.step_index(), 0);
    }

    #[test]
    fn rehydrate_matches_replayed_commits() {
        let pool = test_pool();
        let mut live = DraftState::new(TimerConfig::default());
        for id in legal_order() {
            live.commit(pool.get(HeroId(id)).unwrap()).unwrap();
        }
        let restored = DraftState::rehydrate(TimerConfig::default(), live.actions(), &pool).unwrap();
        assert_eq!(restored, live);
    }

    #[test]
    fn rehydrate_partial_sets_countdown_for_current_step() {
        let pool = test_pool();
        let timer = TimerConfig {
            ban_seconds: 15,
            pick_seconds: 40,
        };
        let mut live = DraftState::new(timer);
        for id in legal_order().into_iter().take(4) {
            live.commit(pool.get(HeroId(id)).unwrap()).unwrap();
        }
        let restored = DraftState::rehydrate(timer, live.actions(), &pool).unwrap();
        assert_eq!(restored.step_index(), 4);
        assert!(!restored.is_finished());
        assert_eq!(restored.seconds_remaining(), 40);
    }

    #[test]
    fn rehydrate_rejects_out_of_order_actions() {
        let pool = test_pool();
        let actions = vec![DraftAction {
            side: Side::Red,
            action: ActionKind::Ban,
            hero: HeroId(1),
            slot: 0,
        }];
        let err = DraftState::rehydrate(TimerConfig::default(), &actions, &pool).unwrap_err();
        assert!(matches!(err, DraftError::SequenceMismatch { index: 0, .. }));
    }

    #[test]
    fn rehydrate_rejects_unknown_and_duplicate_heroes() {
        let pool = test_pool();
        let unknown = vec![DraftAction {
            side: Side::Blue,
            action: ActionKind::Ban,
            hero: HeroId(999),
            slot: 0,
        }];
        assert_eq!(
            DraftState::rehydrate(TimerConfig::default(), &unknown, &pool).unwrap_err(),
            DraftError::UnknownHero(HeroId(999))
        );

        let duplicate = vec![
            DraftAction {
                side: Side::Blue,
                action: ActionKind::Ban,
                hero: HeroId(3),
                slot: 0,
            },
            DraftAction {
                side: Side::Red,
                action: ActionKind::Ban,
                hero: HeroId(3),
                slot: 0,
            },
        ];
        assert_eq!(
            DraftState::rehydrate(TimerConfig::default(), &duplicate, &pool).unwrap_err(),
            DraftError::HeroUnavailable(HeroId(3))
        );
    }
}
