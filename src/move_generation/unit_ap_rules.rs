//! Per-unit action-point ruleset.
//!
//! Each unit of the side to act spends its own AP. Side switching is not
//! part of this ruleset; search and demos flip the side around each action.

use crate::actions::action::Action;
use crate::game_state::game_state::GameState;
use crate::game_state::tactics_rules::{ATTACK_AP_COST, MOVE_AP_COST};
use crate::game_state::tactics_types::{Side, Tile};
use crate::game_state::undo_state::UnitDelta;
use crate::move_generation::rule_engine::RuleEngine;

/// Orthogonal steps in generation order: +x, -x, +y, -y.
pub(crate) const STEPS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicRules {
    pub move_cost: u8,
    pub attack_cost: u8,
}

impl Default for BasicRules {
    fn default() -> Self {
        Self {
            move_cost: MOVE_AP_COST,
            attack_cost: ATTACK_AP_COST,
        }
    }
}

impl RuleEngine for BasicRules {
    type Delta = UnitDelta;
    const MANAGES_TURNS: bool = false;

    fn generate_legal(&self, state: &GameState, out: &mut Vec<Action>) {
        out.clear();

        for unit in &state.units {
            if !unit.alive || unit.team != state.side_to_act || unit.ap < 1 {
                continue;
            }
            let Some(tile) = unit.tile else {
                continue;
            };

            for dest in free_neighbours(state, tile) {
                out.push(Action::move_to(unit.id, dest, self.move_cost));
            }

            for enemy in adjacent_enemies(state, tile, unit.team) {
                out.push(Action::attack(unit.id, enemy, self.attack_cost));
            }

            out.push(Action::pass(unit.id, 0));
        }
    }

    #[inline]
    fn make(&self, state: &mut GameState, action: &Action) -> UnitDelta {
        state.make_atomic(action)
    }

    #[inline]
    fn unmake(&self, state: &mut GameState, delta: &UnitDelta) {
        state.unmake_atomic(delta);
    }

    #[inline]
    fn can_afford(&self, state: &GameState, action: &Action) -> bool {
        state.actor_can_afford(action)
    }
}

/// Unoccupied in-bounds tiles one orthogonal step from `tile`.
pub(crate) fn free_neighbours(state: &GameState, tile: Tile) -> impl Iterator<Item = Tile> + '_ {
    let (x, y) = state.tile_xy(tile);
    STEPS
        .into_iter()
        .filter_map(move |(dx, dy)| state.tile_at(x + dx, y + dy))
        .filter(move |&t| !state.is_occupied(t))
}

/// Ids of living enemies at Manhattan distance 1, in roster order.
pub(crate) fn adjacent_enemies(
    state: &GameState,
    tile: Tile,
    team: Side,
) -> impl Iterator<Item = usize> + '_ {
    state
        .units
        .iter()
        .filter(move |v| v.alive && v.team != team)
        .filter_map(move |v| v.tile.filter(|&t| state.manhattan(tile, t) == 1).map(|_| v.id))
}

#[cfg(test)]
mod tests {
    use super::BasicRules;
    use crate::actions::action::{Action, ActionKind};
    use crate::game_state::tactics_types::Side;
    use crate::move_generation::rule_engine::RuleEngine;
    use crate::search::zobrist::compute_zobrist_key;
    use crate::utils::sample_positions::two_unit_skirmish;

    #[test]
    fn generates_moves_attack_then_free_pass() {
        let rules = BasicRules::default();
        let state = two_unit_skirmish();
        let actions = rules.legal_actions(&state);

        assert_eq!(
            actions,
            vec![
                Action::move_to(0, 11, 1),
                Action::move_to(0, 17, 1),
                Action::move_to(0, 7, 1),
                Action::attack(0, 1, 1),
                Action::pass(0, 0),
            ]
        );
    }

    #[test]
    fn units_without_ap_generate_nothing() {
        let rules = BasicRules::default();
        let mut state = two_unit_skirmish();
        state.units[0].ap = 0;
        assert!(rules.legal_actions(&state).is_empty());
    }

    #[test]
    fn only_side_to_act_generates() {
        let rules = BasicRules::default();
        let mut state = two_unit_skirmish();
        state.flip_side();
        let actions = rules.legal_actions(&state);
        assert!(actions.iter().all(|a| a.actor == Some(1)));
        assert_eq!(state.side_to_act, Side::Red);
    }

    #[test]
    fn make_does_not_switch_sides() {
        let rules = BasicRules::default();
        let mut state = two_unit_skirmish();
        let delta = rules.make(&mut state, &Action::move_to(0, 7, 1));
        assert_eq!(state.side_to_act, Side::Blue);
        assert_eq!(state.key, compute_zobrist_key(&state));
        rules.unmake(&mut state, &delta);
        assert_eq!(state.key, compute_zobrist_key(&state));
    }

    #[test]
    fn affordability_uses_actor_ap() {
        let rules = BasicRules::default();
        let mut state = two_unit_skirmish();
        state.units[0].ap = 1;
        let expensive = Action {
            actor: Some(0),
            kind: ActionKind::Move { tile: 7 },
            ap_cost: 2,
        };
        assert!(!rules.can_afford(&state, &expensive));
        assert!(rules.can_afford(&state, &Action::move_to(0, 7, 1)));
        assert!(rules.can_afford(&state, &Action::end_turn()));
    }
}
