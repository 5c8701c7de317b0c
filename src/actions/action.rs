//! Action model and its canonical 64-bit signature.
//!
//! Signatures order actions deterministically and identify them across
//! transposition-table stores, principal-variation reordering, and dedup.
//!
//! Fields are OR-ed together at fixed shifts (overlapping bits are
//! tolerated, the packing only has to be deterministic):
//! - `kind << 60`
//! - `ap_cost << 56`
//! - `actor << 40` (20 bits, all ones when absent)
//! - `target << 20` (20 bits, all ones when absent)
//! - `tile` (16 bits, all ones when absent)

use std::fmt;

use serde::Serialize;

use crate::game_state::tactics_types::{Tile, UnitId};

const KIND_SHIFT: u64 = 60;
const AP_COST_SHIFT: u64 = 56;
const ACTOR_SHIFT: u64 = 40;
const TARGET_SHIFT: u64 = 20;

const ID_MASK: u64 = 0xF_FFFF;
const TILE_MASK: u64 = 0xFFFF;

pub const KIND_MOVE: u64 = 0;
pub const KIND_ATTACK: u64 = 1;
pub const KIND_PASS: u64 = 2;
pub const KIND_END_TURN: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActionKind {
    Move { tile: Tile },
    Attack { target: UnitId },
    Pass,
    EndTurn,
}

/// A single unit action. Value type, regenerated at every ply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Action {
    /// Acting unit; `None` for team-level actions such as `EndTurn`.
    pub actor: Option<UnitId>,
    pub kind: ActionKind,
    pub ap_cost: u8,
}

impl Action {
    #[inline]
    pub const fn move_to(actor: UnitId, tile: Tile, ap_cost: u8) -> Self {
        Self {
            actor: Some(actor),
            kind: ActionKind::Move { tile },
            ap_cost,
        }
    }

    #[inline]
    pub const fn attack(actor: UnitId, target: UnitId, ap_cost: u8) -> Self {
        Self {
            actor: Some(actor),
            kind: ActionKind::Attack { target },
            ap_cost,
        }
    }

    #[inline]
    pub const fn pass(actor: UnitId, ap_cost: u8) -> Self {
        Self {
            actor: Some(actor),
            kind: ActionKind::Pass,
            ap_cost,
        }
    }

    #[inline]
    pub const fn end_turn() -> Self {
        Self {
            actor: None,
            kind: ActionKind::EndTurn,
            ap_cost: 0,
        }
    }

    #[inline]
    pub const fn kind_code(&self) -> u64 {
        match self.kind {
            ActionKind::Move { .. } => KIND_MOVE,
            ActionKind::Attack { .. } => KIND_ATTACK,
            ActionKind::Pass => KIND_PASS,
            ActionKind::EndTurn => KIND_END_TURN,
        }
    }

    #[inline]
    pub const fn target(&self) -> Option<UnitId> {
        match self.kind {
            ActionKind::Attack { target } => Some(target),
            _ => None,
        }
    }

    #[inline]
    pub const fn tile(&self) -> Option<Tile> {
        match self.kind {
            ActionKind::Move { tile } => Some(tile),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_move(&self) -> bool {
        matches!(self.kind, ActionKind::Move { .. })
    }

    #[inline]
    pub const fn is_attack(&self) -> bool {
        matches!(self.kind, ActionKind::Attack { .. })
    }

    /// Canonical packed identity of this action.
    #[inline]
    pub fn signature(&self) -> u64 {
        let actor = self.actor.map_or(ID_MASK, |id| id as u64 & ID_MASK);
        let target = self.target().map_or(ID_MASK, |id| id as u64 & ID_MASK);
        let tile = self.tile().map_or(TILE_MASK, |t| u64::from(t) & TILE_MASK);

        (self.kind_code() << KIND_SHIFT)
            | (u64::from(self.ap_cost) << AP_COST_SHIFT)
            | (actor << ACTOR_SHIFT)
            | (target << TARGET_SHIFT)
            | tile
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let actor = self.actor.map_or(-1, |id| id as i64);
        match self.kind {
            ActionKind::Move { tile } => write!(f, "Move({actor}->{tile})"),
            ActionKind::Attack { target } => write!(f, "Attack({actor}->{target})"),
            ActionKind::Pass => write!(f, "Pass({actor})"),
            ActionKind::EndTurn => write!(f, "EndTurn"),
        }
    }
}

/// Join a line of actions as `a -> b -> c`.
pub fn format_action_line(actions: &[Action]) -> String {
    actions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
