//! Built-in positions used by the console, diagnostics, benches and tests.

use crate::game_state::game_state::GameState;
use crate::game_state::tactics_rules::{DEFAULT_TURN_AP, DEFAULT_ZOBRIST_SEED};
use crate::game_state::tactics_types::Side;

/// 5x5 board, one unit per side facing each other in the centre row.
/// Blue unit 0 on tile 12, Red unit 1 on tile 13, HP 10, AP 2.
pub fn two_unit_skirmish() -> GameState {
    let mut state = GameState::new(5, 5, Side::Blue);
    state.push_unit(Side::Blue, 12, 10, 2);
    state.push_unit(Side::Red, 13, 10, 2);
    state.init_zobrist(DEFAULT_ZOBRIST_SEED, state.units.len());
    state
}

/// Same layout as [`two_unit_skirmish`] with Blue starting a full turn pool.
pub fn two_unit_team_pool() -> GameState {
    let mut state = GameState::new(5, 5, Side::Blue);
    state.push_unit(Side::Blue, 12, 10, 2);
    state.push_unit(Side::Red, 13, 10, 2);
    state.team_ap = [DEFAULT_TURN_AP, 0];
    state.init_zobrist(DEFAULT_ZOBRIST_SEED, state.units.len());
    state
}

/// 5x5 board, two units per side, Blue to act with a full turn pool.
pub fn four_unit_team_pool() -> GameState {
    let mut state = GameState::new(5, 5, Side::Blue);
    state.push_unit(Side::Blue, 6, 10, 2);
    state.push_unit(Side::Blue, 11, 10, 2);
    state.push_unit(Side::Red, 8, 10, 2);
    state.push_unit(Side::Red, 13, 10, 2);
    state.team_ap = [DEFAULT_TURN_AP, 0];
    state.init_zobrist(DEFAULT_ZOBRIST_SEED, state.units.len());
    state
}

/// Blue unit next to a Red unit that dies to a single hit.
pub fn lethal_attack_scenario() -> GameState {
    let mut state = GameState::new(5, 5, Side::Blue);
    state.push_unit(Side::Blue, 12, 10, 2);
    state.push_unit(Side::Red, 13, 5, 2);
    state.init_zobrist(DEFAULT_ZOBRIST_SEED, state.units.len());
    state
}

/// 3x3 board, two units per side with one AP each. Small enough for
/// exhaustive minimax comparisons.
pub fn three_by_three_duel() -> GameState {
    let mut state = GameState::new(3, 3, Side::Blue);
    state.push_unit(Side::Blue, 0, 10, 1);
    state.push_unit(Side::Blue, 3, 5, 1);
    state.push_unit(Side::Red, 4, 5, 1);
    state.push_unit(Side::Red, 8, 10, 1);
    state.init_zobrist(DEFAULT_ZOBRIST_SEED, state.units.len());
    state
}
