//! Ruleset abstraction shared by search, perft and the greedy engine.
//!
//! Each ruleset generates legal actions and applies/reverts them in place.
//! The undo payload differs per ruleset, so it is an associated type and the
//! search is generic over the ruleset (static dispatch on the hot path).

use std::ops::{Deref, DerefMut};

use crate::actions::action::Action;
use crate::game_state::game_state::GameState;

pub trait RuleEngine {
    /// Undo record produced by `make` and consumed by `unmake`.
    type Delta: Copy + std::fmt::Debug;

    /// `true` when `make`/`unmake` switch the side to act themselves.
    /// Otherwise the caller flips the side around each child.
    const MANAGES_TURNS: bool;

    /// Clear `out` and fill it with the legal actions of the side to act.
    fn generate_legal(&self, state: &GameState, out: &mut Vec<Action>);

    fn make(&self, state: &mut GameState, action: &Action) -> Self::Delta;

    fn unmake(&self, state: &mut GameState, delta: &Self::Delta);

    /// Whether the side to act can currently pay for `action`.
    fn can_afford(&self, state: &GameState, action: &Action) -> bool;

    fn legal_actions(&self, state: &GameState) -> Vec<Action> {
        let mut out = Vec::new();
        self.generate_legal(state, &mut out);
        out
    }

    /// Legal actions with unaffordable ones filtered out.
    fn affordable_actions(&self, state: &GameState) -> Vec<Action> {
        let mut out = self.legal_actions(state);
        out.retain(|a| self.can_afford(state, a));
        out
    }
}

/// Applies an action on construction and reverts it on drop, along every
/// exit path (early `break`, `return`, `?`, unwinding).
pub struct ScopedMake<'a, R: RuleEngine> {
    rules: &'a R,
    state: &'a mut GameState,
    delta: R::Delta,
    flipped: bool,
}

impl<'a, R: RuleEngine> ScopedMake<'a, R> {
    pub fn new(rules: &'a R, state: &'a mut GameState, action: &Action) -> Self {
        let delta = rules.make(state, action);
        Self {
            rules,
            state,
            delta,
            flipped: false,
        }
    }

    /// Like [`ScopedMake::new`], and also hands the turn to the opponent when
    /// the ruleset leaves side switching to the caller.
    pub fn with_turn_handoff(rules: &'a R, state: &'a mut GameState, action: &Action) -> Self {
        let mut guard = Self::new(rules, state, action);
        if !R::MANAGES_TURNS {
            guard.state.flip_side();
            guard.flipped = true;
        }
        guard
    }

    #[inline]
    pub fn delta(&self) -> &R::Delta {
        &self.delta
    }
}

impl<R: RuleEngine> Deref for ScopedMake<'_, R> {
    type Target = GameState;

    fn deref(&self) -> &GameState {
        &*self.state
    }
}

impl<R: RuleEngine> DerefMut for ScopedMake<'_, R> {
    fn deref_mut(&mut self) -> &mut GameState {
        &mut *self.state
    }
}

impl<R: RuleEngine> Drop for ScopedMake<'_, R> {
    fn drop(&mut self) {
        if self.flipped {
            self.state.flip_side();
        }
        self.rules.unmake(&mut *self.state, &self.delta);
    }
}

#[cfg(test)]
mod tests {
    use super::{RuleEngine, ScopedMake};
    use crate::game_state::game_state::GameState;
    use crate::game_state::tactics_types::Side;
    use crate::move_generation::unit_ap_rules::BasicRules;
    use crate::utils::sample_positions::two_unit_skirmish;

    #[test]
    fn guard_reverts_on_drop() {
        let rules = BasicRules::default();
        let mut state = two_unit_skirmish();
        let key = state.key;
        let units = state.units.clone();
        let first = rules.legal_actions(&state)[0];

        {
            let guard = ScopedMake::with_turn_handoff(&rules, &mut state, &first);
            assert_eq!(guard.side_to_act, Side::Red);
            assert_ne!(guard.key, key);
        }

        assert_eq!(state.key, key);
        assert_eq!(state.units, units);
        assert_eq!(state.side_to_act, Side::Blue);
        assert!(state.undo_stack.is_empty());
    }

    #[test]
    fn guard_reverts_on_early_exit() {
        fn first_with_ap_left(rules: &BasicRules, state: &mut GameState) -> Option<u64> {
            for action in rules.legal_actions(state) {
                let guard = ScopedMake::new(rules, state, &action);
                if guard.units[0].ap > 0 {
                    return Some(guard.key);
                }
            }
            None
        }

        let rules = BasicRules::default();
        let mut state = two_unit_skirmish();
        let key = state.key;
        assert!(first_with_ap_left(&rules, &mut state).is_some());
        assert_eq!(state.key, key);
    }
}
