//! Pluggable position evaluation.
//!
//! Search remains modular by delegating static scoring to `BoardScorer`.
//! `EvalWeights` is the weighted tactical evaluator used by the engines: HP,
//! closeness to the enemy, adjacency threats, and ally cohesion.

use serde::{Deserialize, Serialize};

use crate::game_state::game_state::GameState;
use crate::game_state::tactics_types::{Side, Tile};

/// Manhattan distances at or beyond this earn no proximity bonus.
pub const PROXIMITY_RANGE: i32 = 10;

pub trait BoardScorer {
    /// Score from the perspective of the side to act.
    fn score(&self, game_state: &GameState) -> i32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalWeights {
    pub hp: i32,
    pub pos: i32,
    pub threat_for: i32,
    pub threat_against: i32,
    pub cohesion: i32,
}

impl Default for EvalWeights {
    fn default() -> Self {
        Self {
            hp: 100,
            pos: 3,
            threat_for: 25,
            threat_against: 35,
            cohesion: 2,
        }
    }
}

impl BoardScorer for EvalWeights {
    #[inline]
    fn score(&self, game_state: &GameState) -> i32 {
        evaluate(game_state, self)
    }
}

/// Distance from `tile` to the nearest living enemy of `team`, 0 if none.
pub fn nearest_enemy_distance(state: &GameState, tile: Tile, team: Side) -> i32 {
    state
        .living_units(team.opposite())
        .filter_map(|e| e.tile)
        .map(|t| state.manhattan(tile, t))
        .min()
        .unwrap_or(0)
}

/// Distance from `tile` to the nearest other living ally of `team`.
fn nearest_ally_distance(state: &GameState, tile: Tile, team: Side) -> Option<i32> {
    state
        .living_units(team)
        .filter_map(|a| a.tile)
        .map(|t| state.manhattan(tile, t))
        .filter(|&d| d > 0)
        .min()
}

/// Ordered pairs (a of `team_a`, b of `team_b`) standing orthogonally adjacent.
pub fn count_adjacent_pairs(state: &GameState, team_a: Side, team_b: Side) -> i32 {
    let mut count = 0;
    for a in state.living_units(team_a) {
        for b in state.living_units(team_b) {
            if let (Some(ta), Some(tb)) = (a.tile, b.tile) {
                if state.manhattan(ta, tb) == 1 {
                    count += 1;
                }
            }
        }
    }
    count
}

/// Living enemies of `team` orthogonally adjacent to `tile`.
pub fn adjacent_enemy_count(state: &GameState, tile: Tile, team: Side) -> i32 {
    state
        .living_units(team.opposite())
        .filter_map(|e| e.tile)
        .filter(|&t| state.manhattan(tile, t) == 1)
        .count() as i32
}

/// 2 points per unit with an ally at distance 1, 1 point at distance 2.
pub fn ally_cohesion(state: &GameState, team: Side) -> i32 {
    state
        .living_units(team)
        .filter_map(|u| u.tile)
        .map(|tile| match nearest_ally_distance(state, tile, team) {
            Some(1) => 2,
            Some(2) => 1,
            _ => 0,
        })
        .sum()
}

/// Static evaluation from the perspective of `state.side_to_act`.
pub fn evaluate(state: &GameState, weights: &EvalWeights) -> i32 {
    let me = state.side_to_act;
    let them = me.opposite();
    let mut score = 0;

    for unit in state.units.iter().filter(|u| u.is_on_board()) {
        let Some(tile) = unit.tile else {
            continue;
        };
        let sign = if unit.team == me { 1 } else { -1 };
        score += sign * weights.hp * unit.hp;

        let d = nearest_enemy_distance(state, tile, unit.team);
        let proximity = if d > 0 {
            PROXIMITY_RANGE - d.min(PROXIMITY_RANGE)
        } else {
            0
        };
        score += sign * weights.pos * proximity;
    }

    score += weights.threat_for * count_adjacent_pairs(state, me, them);
    score -= weights.threat_against * count_adjacent_pairs(state, them, me);

    score += weights.cohesion * (ally_cohesion(state, me) - ally_cohesion(state, them));

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::action::Action;
    use crate::utils::sample_positions::{four_unit_team_pool, lethal_attack_scenario, two_unit_skirmish};

    #[test]
    fn mirrored_position_scores_threat_asymmetry_only() {
        let mut state = two_unit_skirmish();
        let w = EvalWeights::default();
        // Both units: 100 * 10 HP + 3 * 9 proximity, one adjacent pair each way.
        assert_eq!(evaluate(&state, &w), 25 - 35);
        state.flip_side();
        assert_eq!(evaluate(&state, &w), 25 - 35);
    }

    #[test]
    fn dead_units_do_not_count() {
        let mut state = lethal_attack_scenario();
        state.make_atomic(&Action::attack(0, 1, 1));
        state.flip_side();
        // Red to act with no living units: only the Blue survivor counts.
        assert_eq!(evaluate(&state, &EvalWeights::default()), -1000);
    }

    #[test]
    fn cohesion_rewards_close_allies() {
        let state = four_unit_team_pool();
        // Blue units on tiles 6 and 11 are adjacent, as are Red on 8 and 13.
        assert_eq!(ally_cohesion(&state, Side::Blue), 4);
        assert_eq!(ally_cohesion(&state, Side::Red), 4);
        assert_eq!(count_adjacent_pairs(&state, Side::Blue, Side::Red), 0);
    }

    #[test]
    fn scorer_trait_uses_weights() {
        let state = two_unit_skirmish();
        let hp_only = EvalWeights {
            hp: 1,
            pos: 0,
            threat_for: 0,
            threat_against: 0,
            cohesion: 0,
        };
        assert_eq!(hp_only.score(&state), 0);
        assert_eq!(EvalWeights::default().score(&state), -10);
    }

    #[test]
    fn nearest_enemy_distance_is_zero_without_enemies() {
        let mut state = two_unit_skirmish();
        state.units[1].alive = false;
        assert_eq!(nearest_enemy_distance(&state, 12, Side::Blue), 0);
        assert_eq!(adjacent_enemy_count(&state, 12, Side::Blue), 0);
    }
}
