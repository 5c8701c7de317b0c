//! Team action-point pool ruleset.
//!
//! Every action of a side is paid from one shared pool. A side keeps acting
//! until it ends its turn or drains the pool; either way the opponent takes
//! over with a refilled pool. Side flips and pool changes are hashed.

use crate::actions::action::{Action, ActionKind};
use crate::game_state::game_state::GameState;
use crate::game_state::tactics_rules::{ATTACK_AP_COST, DEFAULT_TURN_AP, MOVE_AP_COST};
use crate::game_state::tactics_types::Side;
use crate::game_state::undo_state::TeamPoolDelta;
use crate::move_generation::rule_engine::RuleEngine;
use crate::move_generation::unit_ap_rules::{adjacent_enemies, free_neighbours};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamPoolRules {
    pub move_cost: u8,
    pub attack_cost: u8,
    /// Pool granted to a side when its turn starts.
    pub turn_ap: i32,
}

impl Default for TeamPoolRules {
    fn default() -> Self {
        Self {
            move_cost: MOVE_AP_COST,
            attack_cost: ATTACK_AP_COST,
            turn_ap: DEFAULT_TURN_AP,
        }
    }
}

impl TeamPoolRules {
    pub fn with_turn_ap(turn_ap: i32) -> Self {
        Self {
            turn_ap,
            ..Self::default()
        }
    }

    /// Hand the turn over and refill the new side's pool.
    fn pass_turn(&self, state: &mut GameState) {
        state.flip_side();
        state.set_team_ap(state.side_to_act, self.turn_ap);
    }
}

impl RuleEngine for TeamPoolRules {
    type Delta = TeamPoolDelta;
    const MANAGES_TURNS: bool = true;

    fn generate_legal(&self, state: &GameState, out: &mut Vec<Action>) {
        out.clear();
        let side = state.side_to_act;
        let pool = state.team_ap[side.index()];

        for unit in &state.units {
            if !unit.alive || unit.team != side {
                continue;
            }
            let Some(tile) = unit.tile else {
                continue;
            };

            if pool >= i32::from(self.move_cost) {
                for dest in free_neighbours(state, tile) {
                    out.push(Action::move_to(unit.id, dest, self.move_cost));
                }
            }

            if pool >= i32::from(self.attack_cost) {
                for enemy in adjacent_enemies(state, tile, unit.team) {
                    out.push(Action::attack(unit.id, enemy, self.attack_cost));
                }
            }
        }

        out.push(Action::end_turn());
    }

    fn make(&self, state: &mut GameState, action: &Action) -> TeamPoolDelta {
        let side_before = state.side_to_act;
        let ap_before = state.team_ap;

        let base = state.make_atomic(action);
        let mut flipped_turn = false;

        if matches!(action.kind, ActionKind::EndTurn) {
            flipped_turn = true;
            self.pass_turn(state);
        } else {
            let spent = (state.team_ap[side_before.index()] - i32::from(action.ap_cost)).max(0);
            state.set_team_ap(side_before, spent);

            if spent == 0 {
                flipped_turn = true;
                self.pass_turn(state);
            }
        }

        TeamPoolDelta {
            base,
            side_before,
            ap_before,
            flipped_turn,
        }
    }

    fn unmake(&self, state: &mut GameState, delta: &TeamPoolDelta) {
        if delta.flipped_turn {
            state.flip_side();
        }

        for side in [Side::Blue, Side::Red] {
            state.set_team_ap(side, delta.ap_before[side.index()]);
        }

        state.unmake_atomic(&delta.base);
    }

    #[inline]
    fn can_afford(&self, state: &GameState, action: &Action) -> bool {
        state.team_ap[state.side_to_act.index()] >= i32::from(action.ap_cost)
    }
}
