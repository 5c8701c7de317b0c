//! Make/unmake round-trip verification and the quick state demo.
//!
//! `undo_check` runs a seeded random walk over legal actions. At every step it
//! checks that the incremental key agrees with a from-scratch recompute and
//! that unmake restores the key and every unit field exactly.

use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::actions::action::Action;
use crate::game_state::game_state::GameState;
use crate::game_state::tactics_types::{Side, Unit};
use crate::move_generation::rule_engine::RuleEngine;
use crate::search::zobrist::compute_zobrist_key;

/// Longest random line before the walk unwinds back to the start position.
const MAX_WALK_LEN: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchKind {
    /// Incremental key after make differs from the scratch recompute.
    KeyDrift,
    /// Unmake did not restore the pre-make state.
    NotRestored,
    /// Unwinding a whole line did not return to the start position.
    LineNotRestored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoMismatch {
    pub step: usize,
    pub kind: MismatchKind,
    pub action: Option<Action>,
    pub expected_key: u64,
    pub actual_key: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UndoCheckReport {
    pub steps_run: usize,
    pub mismatch: Option<UndoMismatch>,
}

impl UndoCheckReport {
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.mismatch.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Fingerprint {
    key: u64,
    side: Side,
    team_ap: [i32; 2],
    units: Vec<Unit>,
    stack_len: usize,
}

impl Fingerprint {
    fn capture(state: &GameState) -> Self {
        Self {
            key: state.key,
            side: state.side_to_act,
            team_ap: state.team_ap,
            units: state.units.clone(),
            stack_len: state.undo_stack.len(),
        }
    }
}

/// Applies `action` and, for rulesets that leave turns to the caller, hands
/// the turn over the way the search does.
fn apply<R: RuleEngine>(rules: &R, state: &mut GameState, action: &Action) -> R::Delta {
    let delta = rules.make(state, action);
    if !R::MANAGES_TURNS {
        state.flip_side();
    }
    delta
}

fn revert<R: RuleEngine>(rules: &R, state: &mut GameState, delta: &R::Delta) {
    if !R::MANAGES_TURNS {
        state.flip_side();
    }
    rules.unmake(state, delta);
}

fn unwind<R: RuleEngine>(rules: &R, state: &mut GameState, line: &mut Vec<R::Delta>) {
    while let Some(delta) = line.pop() {
        revert(rules, state, &delta);
    }
}

/// Random make/unmake walk of `steps` actions seeded by `seed`.
///
/// Returns the first mismatch found; the state is always unwound to its
/// starting position before returning.
pub fn undo_check<R: RuleEngine>(
    rules: &R,
    game_state: &mut GameState,
    steps: usize,
    seed: u64,
) -> UndoCheckReport {
    let mut rng = StdRng::seed_from_u64(seed);
    let origin = Fingerprint::capture(game_state);
    let mut line: Vec<R::Delta> = Vec::with_capacity(MAX_WALK_LEN);
    let mut report = UndoCheckReport::default();

    for step in 0..steps {
        let actions = rules.affordable_actions(game_state);
        if actions.is_empty() || line.len() >= MAX_WALK_LEN {
            if line.is_empty() {
                break;
            }
            unwind(rules, game_state, &mut line);
            if Fingerprint::capture(game_state) != origin {
                report.mismatch = Some(UndoMismatch {
                    step,
                    kind: MismatchKind::LineNotRestored,
                    action: None,
                    expected_key: origin.key,
                    actual_key: game_state.key,
                });
                break;
            }
            report.steps_run = step + 1;
            continue;
        }

        let action = actions[rng.random_range(0..actions.len())];
        let before = Fingerprint::capture(game_state);

        let delta = apply(rules, game_state, &action);
        let scratch = compute_zobrist_key(game_state);
        if game_state.key != scratch {
            report.mismatch = Some(UndoMismatch {
                step,
                kind: MismatchKind::KeyDrift,
                action: Some(action),
                expected_key: scratch,
                actual_key: game_state.key,
            });
            revert(rules, game_state, &delta);
            break;
        }

        revert(rules, game_state, &delta);
        if Fingerprint::capture(game_state) != before {
            report.mismatch = Some(UndoMismatch {
                step,
                kind: MismatchKind::NotRestored,
                action: Some(action),
                expected_key: before.key,
                actual_key: game_state.key,
            });
            break;
        }

        line.push(apply(rules, game_state, &action));
        report.steps_run = step + 1;
    }

    unwind(rules, game_state, &mut line);

    match report.mismatch {
        Some(m) => warn!(
            "undo check mismatch at step {} ({:?}): expected {:#018x} got {:#018x}",
            m.step, m.kind, m.expected_key, m.actual_key
        ),
        None => info!("undo check ok for {} steps", report.steps_run),
    }
    report
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemoReport {
    pub legal_actions: usize,
    pub first_action: Option<Action>,
    pub key_before: u64,
    pub key_after_make: Option<u64>,
    pub key_after_unmake: Option<u64>,
}

/// Count legal actions and show the key across make/unmake of the first one.
pub fn demo<R: RuleEngine>(rules: &R, game_state: &mut GameState) -> DemoReport {
    let actions = rules.legal_actions(game_state);
    let mut report = DemoReport {
        legal_actions: actions.len(),
        key_before: game_state.key,
        ..DemoReport::default()
    };

    if let Some(first) = actions.first() {
        let delta = rules.make(game_state, first);
        report.first_action = Some(*first);
        report.key_after_make = Some(game_state.key);
        rules.unmake(game_state, &delta);
        report.key_after_unmake = Some(game_state.key);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::move_generation::team_pool_rules::TeamPoolRules;
    use crate::move_generation::unit_ap_rules::BasicRules;
    use crate::utils::sample_positions::{four_unit_team_pool, two_unit_skirmish};

    #[test]
    fn unit_ap_walk_round_trips() {
        let mut state = two_unit_skirmish();
        let key = state.key;
        let report = undo_check(&BasicRules::default(), &mut state, 2_000, 0xABCD_EF12_3456_7890);
        assert!(report.is_ok(), "{report:?}");
        assert!(report.steps_run > 0);
        assert_eq!(state.key, key);
    }

    #[test]
    fn team_pool_walk_round_trips() {
        let mut state = four_unit_team_pool();
        let key = state.key;
        let report = undo_check(&TeamPoolRules::default(), &mut state, 3_000, 7);
        assert!(report.is_ok(), "{report:?}");
        assert_eq!(report.steps_run, 3_000);
        assert_eq!(state.key, key);
        assert!(state.undo_stack.is_empty());
    }

    #[test]
    fn walk_detects_inconsistent_keys() {
        let mut state = two_unit_skirmish();
        state.key ^= 1;
        let report = undo_check(&BasicRules::default(), &mut state, 10, 1);
        let mismatch = report.mismatch.expect("corrupted key should be reported");
        assert_eq!(mismatch.kind, MismatchKind::KeyDrift);
        assert_eq!(mismatch.step, 0);
    }

    #[test]
    fn demo_restores_key() {
        let mut state = two_unit_skirmish();
        let report = demo(&BasicRules::default(), &mut state);
        assert_eq!(report.legal_actions, 5);
        assert_eq!(report.key_after_unmake, Some(report.key_before));
        assert_ne!(report.key_after_make, Some(report.key_before));
    }
}
