//! Core value types shared by the state, rules, and search layers.

use serde::{Deserialize, Serialize};

pub use crate::game_state::game_state::GameState;
pub use crate::game_state::undo_state::{TeamPoolDelta, UnitDelta};

/// Roster slot of a unit. Inside the engine the id doubles as the index into
/// `GameState::units` and into the Zobrist unit-position table.
pub type UnitId = usize;

/// Row-major board cell index (`y * width + x`).
pub type Tile = u16;

/// Team / side to act.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[default]
    Blue,
    Red,
}

impl Side {
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Side::Blue => 0,
            Side::Red => 1,
        }
    }

    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Blue => Side::Red,
            Side::Red => Side::Blue,
        }
    }

    #[inline]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Side::Blue),
            1 => Some(Side::Red),
            _ => None,
        }
    }
}

/// One combat unit on the grid.
///
/// Units are never removed from the roster; death is `alive == false` and the
/// tile stops counting as occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub team: Side,
    pub tile: Option<Tile>,
    pub hp: i32,
    /// Legacy per-unit action points, only consulted by the per-unit ruleset.
    pub ap: i32,
    pub alive: bool,
    pub attack: i32,
}

impl Unit {
    pub fn new(id: UnitId, team: Side, tile: Tile, hp: i32, ap: i32) -> Self {
        Self {
            id,
            team,
            tile: Some(tile),
            hp,
            ap,
            alive: true,
            attack: crate::game_state::tactics_rules::DEFAULT_ATTACK_DAMAGE,
        }
    }

    pub fn with_attack(mut self, attack: i32) -> Self {
        self.attack = attack;
        self
    }

    /// Alive and standing on the board.
    #[inline]
    pub fn is_on_board(&self) -> bool {
        self.alive && self.tile.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{Side, Unit};

    #[test]
    fn side_index_round_trips() {
        for side in [Side::Blue, Side::Red] {
            assert_eq!(Side::from_index(side.index()), Some(side));
            assert_eq!(side.opposite().opposite(), side);
        }
        assert_eq!(Side::from_index(2), None);
    }

    #[test]
    fn new_unit_uses_default_attack() {
        let unit = Unit::new(3, Side::Red, 7, 10, 2);
        assert_eq!(unit.attack, 5);
        assert!(unit.is_on_board());
        assert_eq!(unit.with_attack(9).attack, 9);
    }
}
