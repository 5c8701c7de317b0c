use crate::game_state::tactics_types::{Side, Tile, UnitId};

/// Undo record written by the shared atomic mutator (`GameState::make_atomic`).
///
/// `prev_key` is reasserted verbatim on unmake; it is never recomputed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitDelta {
    pub prev_key: u64,

    pub actor: Option<UnitId>,
    pub prev_actor_tile: Option<Tile>,
    pub prev_actor_ap: i32,
    pub prev_actor_hp: i32,
    pub prev_actor_alive: bool,

    pub target: Option<UnitId>,
    pub prev_target_hp: i32,
    pub prev_target_alive: bool,

    pub changed_pos: bool,
    pub changed_ap: bool,
    pub target_changed_hp: bool,
    pub target_changed_alive: bool,
}

/// Undo record of the team-AP-pool ruleset: the unit payload plus turn state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeamPoolDelta {
    pub base: UnitDelta,
    pub side_before: Side,
    pub ap_before: [i32; 2],
    pub flipped_turn: bool,
}
