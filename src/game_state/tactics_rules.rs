//! Rule constants shared by both rulesets and the sample positions.

/// Damage dealt by an attacker whose own attack power is missing or non-positive.
pub const DEFAULT_ATTACK_DAMAGE: i32 = 5;

/// Team action-point pool granted at the start of a turn.
pub const DEFAULT_TURN_AP: i32 = 5;

/// Upper bound of the team-AP hash range when nothing larger is observed.
pub const DEFAULT_MAX_AP: i32 = 5;

/// Hit points assumed when a snapshot actor reports neither current nor max HP.
pub const DEFAULT_UNIT_HP: i32 = 10;

/// Legacy per-unit AP handed to snapshot units.
pub const FALLBACK_UNIT_AP: i32 = 2;

/// Zobrist seed used by the built-in positions and diagnostics.
pub const DEFAULT_ZOBRIST_SEED: u64 = 0xC0FFEE;

/// AP cost of a move / attack in both rulesets.
pub const MOVE_AP_COST: u8 = 1;
pub const ATTACK_AP_COST: u8 = 1;
