//! Deterministic action ordering for alpha-beta.
//!
//! Scores are built so that two actions with different signatures almost
//! never tie; the remaining ties fall back to signature order, which makes
//! the search tree reproducible for a given position and weight set.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::actions::action::{Action, ActionKind};
use crate::game_state::game_state::GameState;
use crate::search::board_scoring::{adjacent_enemy_count, nearest_enemy_distance};

const LETHAL_ATTACK_BONUS: i32 = 5000;
const DAMAGE_SCALE: i32 = 10;
const PASS_PENALTY: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderWeights {
    /// Per tile of distance closed toward the nearest enemy.
    pub pos: i32,
    /// Per adjacent threat escaped or removed.
    pub threat: i32,
    /// Per AP of action cost.
    pub cost: i32,
    pub end_turn_bias: i32,
}

impl Default for OrderWeights {
    fn default() -> Self {
        Self {
            pos: 8,
            threat: 6,
            cost: 0,
            end_turn_bias: 0,
        }
    }
}

/// Adjacent enemies left behind by a move.
pub fn threat_relief_for_move(state: &GameState, action: &Action) -> i32 {
    let ActionKind::Move { tile: dest } = action.kind else {
        return 0;
    };
    let Some(unit) = action.actor.and_then(|id| state.unit(id)) else {
        return 0;
    };
    let Some(from) = unit.tile else {
        return 0;
    };
    adjacent_enemy_count(state, from, unit.team) - adjacent_enemy_count(state, dest, unit.team)
}

/// 1 when the attack kills an enemy standing next to the attacker.
pub fn threat_relief_for_attack(state: &GameState, action: &Action, fallback_damage: i32) -> i32 {
    let ActionKind::Attack { target } = action.kind else {
        return 0;
    };
    let (Some(actor), Some(victim)) = (action.actor.and_then(|id| state.unit(id)), state.unit(target))
    else {
        return 0;
    };
    let (Some(a), Some(v)) = (actor.tile, victim.tile) else {
        return 0;
    };
    let adjacent = state.manhattan(a, v) == 1;
    i32::from(adjacent && state.is_lethal_attack(action, fallback_damage))
}

pub fn score_action_for_ordering(
    state: &GameState,
    action: &Action,
    weights: &OrderWeights,
    fallback_damage: i32,
) -> i32 {
    let mut score = match action.kind {
        ActionKind::Attack { target } => match state.unit(target) {
            Some(victim) => {
                let dealt = state
                    .attack_damage(action.actor, fallback_damage)
                    .min(victim.hp)
                    .max(0);
                let mut s = dealt * DAMAGE_SCALE;
                if victim.hp - dealt <= 0 {
                    s += LETHAL_ATTACK_BONUS;
                }
                s + threat_relief_for_attack(state, action, fallback_damage) * weights.threat
            }
            None => 0,
        },
        ActionKind::Move { tile } => match action.actor.and_then(|id| state.unit(id)) {
            Some(unit) => match unit.tile {
                Some(from) => {
                    let before = nearest_enemy_distance(state, from, unit.team);
                    let after = nearest_enemy_distance(state, tile, unit.team);
                    (before - after) * weights.pos
                        + threat_relief_for_move(state, action) * weights.threat
                }
                None => 0,
            },
            None => 0,
        },
        ActionKind::Pass => -PASS_PENALTY,
        ActionKind::EndTurn => weights.end_turn_bias,
    };

    // Fold the signature's low bit in so distinct actions rarely tie.
    score = (score << 1) | (action.signature() & 1) as i32;
    score - i32::from(action.ap_cost) * weights.cost
}

/// Best ordering score first, signature ascending among equals.
pub fn sort_actions_deterministic(
    state: &GameState,
    actions: &mut [Action],
    weights: &OrderWeights,
    fallback_damage: i32,
) {
    actions.sort_by_cached_key(|a| {
        (
            Reverse(score_action_for_ordering(state, a, weights, fallback_damage)),
            a.signature(),
        )
    });
}

/// Move `best` to the front keeping the relative order of everything else.
/// Returns `false` when `best` is not in the list.
pub fn prefer_best_move(actions: &mut [Action], best: &Action) -> bool {
    match actions.iter().position(|a| a == best) {
        Some(pos) => {
            actions[..=pos].rotate_right(1);
            true
        }
        None => false,
    }
}

/// Length of the leading run sharing the first action's ordering score.
pub fn top_tie_group_len(
    state: &GameState,
    ordered: &[Action],
    weights: &OrderWeights,
    fallback_damage: i32,
) -> usize {
    let Some(first) = ordered.first() else {
        return 0;
    };
    let top = score_action_for_ordering(state, first, weights, fallback_damage);
    ordered
        .iter()
        .take_while(|a| score_action_for_ordering(state, a, weights, fallback_damage) == top)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::tactics_rules::DEFAULT_ATTACK_DAMAGE;
    use crate::move_generation::rule_engine::RuleEngine;
    use crate::move_generation::team_pool_rules::TeamPoolRules;
    use crate::move_generation::unit_ap_rules::BasicRules;
    use crate::utils::sample_positions::{lethal_attack_scenario, two_unit_skirmish, two_unit_team_pool};

    #[test]
    fn lethal_attack_outranks_everything() {
        let state = lethal_attack_scenario();
        let mut actions = BasicRules::default().legal_actions(&state);
        sort_actions_deterministic(&state, &mut actions, &OrderWeights::default(), DEFAULT_ATTACK_DAMAGE);
        assert_eq!(actions[0], Action::attack(0, 1, 1));
        assert!(
            score_action_for_ordering(&state, &actions[0], &OrderWeights::default(), DEFAULT_ATTACK_DAMAGE)
                > 2 * LETHAL_ATTACK_BONUS
        );
    }

    #[test]
    fn skirmish_order_is_attack_moves_pass() {
        let state = two_unit_skirmish();
        let mut actions = BasicRules::default().legal_actions(&state);
        sort_actions_deterministic(&state, &mut actions, &OrderWeights::default(), DEFAULT_ATTACK_DAMAGE);
        // The three retreats tie on score and fall back to signature order.
        assert_eq!(
            actions,
            vec![
                Action::attack(0, 1, 1),
                Action::move_to(0, 7, 1),
                Action::move_to(0, 11, 1),
                Action::move_to(0, 17, 1),
                Action::pass(0, 0),
            ]
        );
        assert_eq!(
            top_tie_group_len(&state, &actions[1..], &OrderWeights::default(), DEFAULT_ATTACK_DAMAGE),
            3
        );
    }

    #[test]
    fn moving_away_relieves_threat() {
        let state = two_unit_skirmish();
        assert_eq!(threat_relief_for_move(&state, &Action::move_to(0, 11, 1)), 1);
        assert_eq!(threat_relief_for_attack(&state, &Action::attack(0, 1, 1), DEFAULT_ATTACK_DAMAGE), 0);

        let lethal = lethal_attack_scenario();
        assert_eq!(threat_relief_for_attack(&lethal, &Action::attack(0, 1, 1), DEFAULT_ATTACK_DAMAGE), 1);
    }

    #[test]
    fn end_turn_bias_and_cost_weight_apply() {
        let state = two_unit_team_pool();
        let biased = OrderWeights {
            end_turn_bias: 100,
            ..OrderWeights::default()
        };
        let mut actions = TeamPoolRules::default().legal_actions(&state);
        sort_actions_deterministic(&state, &mut actions, &biased, DEFAULT_ATTACK_DAMAGE);
        assert_eq!(actions[0], Action::end_turn());

        let costly = OrderWeights {
            cost: 3,
            ..OrderWeights::default()
        };
        let step = Action::move_to(0, 7, 1);
        assert_eq!(
            score_action_for_ordering(&state, &step, &costly, DEFAULT_ATTACK_DAMAGE),
            score_action_for_ordering(&state, &step, &OrderWeights::default(), DEFAULT_ATTACK_DAMAGE) - 3
        );
    }

    #[test]
    fn prefer_best_move_keeps_remaining_order() {
        let mut actions = vec![
            Action::attack(0, 1, 1),
            Action::move_to(0, 7, 1),
            Action::move_to(0, 11, 1),
            Action::pass(0, 0),
        ];
        assert!(prefer_best_move(&mut actions, &Action::move_to(0, 11, 1)));
        assert_eq!(
            actions,
            vec![
                Action::move_to(0, 11, 1),
                Action::attack(0, 1, 1),
                Action::move_to(0, 7, 1),
                Action::pass(0, 0),
            ]
        );
        assert!(!prefer_best_move(&mut actions, &Action::end_turn()));
    }
}
