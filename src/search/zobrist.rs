//! Zobrist hashing support for fast position identity.
//!
//! Tables are sized per position (roster length, board cells, AP range) and
//! generated from an explicit seed so hashes are deterministic across runs,
//! which perft and the undo checks rely on.

use crate::game_state::game_state::GameState;
use crate::game_state::tactics_types::{Side, Tile, UnitId};

/// Random tokens for every hashed feature of a position.
///
/// Generation order is fixed: both side tokens, then `max_units * board_size`
/// unit-position tokens, then `2 * (max_ap + 1)` team-AP tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZobristTables {
    pub max_units: usize,
    pub board_size: usize,
    pub max_ap: i32,
    side_to_act: [u64; 2],
    unit_pos: Vec<u64>,
    team_ap: Vec<u64>,
}

impl ZobristTables {
    pub fn build(seed: u64, max_units: usize, board_size: usize, max_ap: i32) -> Self {
        let max_ap = max_ap.max(0);
        let mut state = seed;

        let side_to_act = [next_random_u64(&mut state), next_random_u64(&mut state)];

        let mut unit_pos = vec![0u64; max_units * board_size];
        for key in &mut unit_pos {
            *key = next_random_u64(&mut state);
        }

        let mut team_ap = vec![0u64; 2 * (max_ap as usize + 1)];
        for key in &mut team_ap {
            *key = next_random_u64(&mut state);
        }

        Self {
            max_units,
            board_size,
            max_ap,
            side_to_act,
            unit_pos,
            team_ap,
        }
    }

    #[inline]
    pub fn side_key(&self, side: Side) -> u64 {
        self.side_to_act[side.index()]
    }

    #[inline]
    pub fn unit_pos_key(&self, unit: UnitId, tile: Tile) -> u64 {
        self.unit_pos[unit * self.board_size + tile as usize]
    }

    /// Team-AP token; `ap` is clamped into `0..=max_ap`.
    #[inline]
    pub fn team_ap_key(&self, side: Side, ap: i32) -> u64 {
        let ap = ap.clamp(0, self.max_ap) as usize;
        self.team_ap[side.index() * (self.max_ap as usize + 1) + ap]
    }

    /// Team-AP tokens are only hashed when the AP range is non-empty.
    #[inline]
    pub fn hashes_team_ap(&self) -> bool {
        self.max_ap > 0
    }
}

#[inline]
fn next_random_u64(state: &mut u64) -> u64 {
    // splitmix64
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Compute the full position key from scratch using the state's own tables.
pub fn compute_zobrist_key(game_state: &GameState) -> u64 {
    let z = &game_state.zobrist;
    let mut key = z.side_key(game_state.side_to_act);

    for unit in &game_state.units {
        if let (true, Some(tile)) = (unit.alive, unit.tile) {
            key ^= z.unit_pos_key(unit.id, tile);
        }
    }

    if z.hashes_team_ap() {
        key ^= z.team_ap_key(Side::Blue, game_state.team_ap[0]);
        key ^= z.team_ap_key(Side::Red, game_state.team_ap[1]);
    }

    key
}
