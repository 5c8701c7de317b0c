//! Core incremental tactics state representation.
//!
//! `GameState` is the central model for the engine. It stores the grid, the
//! unit roster, the team action-point pools, the side to act, the Zobrist
//! tables with the incremental key, and the undo stack used by make/unmake
//! style workflows in the rules and search layers.

use crate::actions::action::{Action, ActionKind};
use crate::game_state::tactics_rules::{DEFAULT_ATTACK_DAMAGE, DEFAULT_MAX_AP};
use crate::game_state::tactics_types::{Side, Tile, Unit, UnitId};
use crate::game_state::undo_state::UnitDelta;
use crate::search::zobrist::ZobristTables;

/// Incremental game state optimized for fast action making/unmaking.
#[derive(Debug, Clone)]
pub struct GameState {
    pub width: u16,
    pub height: u16,

    pub side_to_act: Side,
    /// Configured upper bound of the team-AP hash range.
    pub max_ap: i32,
    pub units: Vec<Unit>,
    pub team_ap: [i32; 2],

    // --- Incremental hashing ---
    pub zobrist: ZobristTables,
    pub key: u64,

    // --- Make/unmake stack ---
    pub undo_stack: Vec<UnitDelta>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            side_to_act: Side::Blue,
            max_ap: DEFAULT_MAX_AP,
            units: Vec::new(),
            team_ap: [0; 2],
            zobrist: ZobristTables::default(),
            key: 0,
            undo_stack: Vec::new(),
        }
    }
}

impl GameState {
    /// Empty board. Add units, fill `team_ap`, then call `init_zobrist`.
    #[inline]
    pub fn new(width: u16, height: u16, side_to_act: Side) -> Self {
        Self {
            width,
            height,
            side_to_act,
            ..Self::default()
        }
    }

    /// Append a unit; its id is its roster slot.
    pub fn push_unit(&mut self, team: Side, tile: Tile, hp: i32, ap: i32) -> UnitId {
        let id = self.units.len();
        self.units.push(Unit::new(id, team, tile, hp, ap));
        id
    }

    /// Build the Zobrist tables and compute `key` from scratch.
    ///
    /// Must run after `team_ap` is populated: the AP token range covers the
    /// larger of `max_ap` and both starting pools.
    pub fn init_zobrist(&mut self, seed: u64, max_units: usize) {
        let inferred_max_ap = self.team_ap[0].max(self.team_ap[1]);
        let z_max_ap = inferred_max_ap.max(self.max_ap);
        self.zobrist = ZobristTables::build(seed, max_units, self.board_size(), z_max_ap);

        self.key = self.zobrist.side_key(self.side_to_act);
        for i in 0..self.units.len() {
            let unit = self.units[i];
            if let (true, Some(tile)) = (unit.alive, unit.tile) {
                self.xor_unit_pos(unit.id, tile);
            }
        }
        self.xor_team_ap(Side::Blue, self.team_ap[0]);
        self.xor_team_ap(Side::Red, self.team_ap[1]);
    }

    /// Toggle one team-AP token. Call twice per AP change (out, then in).
    #[inline]
    pub fn xor_team_ap(&mut self, side: Side, ap: i32) {
        if self.zobrist.hashes_team_ap() {
            self.key ^= self.zobrist.team_ap_key(side, ap);
        }
    }

    /// Replace a team pool while keeping `key` consistent.
    #[inline]
    pub fn set_team_ap(&mut self, side: Side, ap: i32) {
        self.xor_team_ap(side, self.team_ap[side.index()]);
        self.team_ap[side.index()] = ap;
        self.xor_team_ap(side, ap);
    }

    #[inline]
    pub fn xor_unit_pos(&mut self, unit: UnitId, tile: Tile) {
        self.key ^= self.zobrist.unit_pos_key(unit, tile);
    }

    #[inline]
    pub fn flip_side(&mut self) {
        self.key ^= self.zobrist.side_key(self.side_to_act);
        self.side_to_act = self.side_to_act.opposite();
        self.key ^= self.zobrist.side_key(self.side_to_act);
    }

    #[inline]
    pub fn board_size(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }

    #[inline]
    pub fn tile_xy(&self, tile: Tile) -> (i32, i32) {
        let w = i32::from(self.width.max(1));
        let t = i32::from(tile);
        (t % w, t / w)
    }

    /// Tile index of `(x, y)`, or `None` when outside the board.
    #[inline]
    pub fn tile_at(&self, x: i32, y: i32) -> Option<Tile> {
        if x < 0 || y < 0 || x >= i32::from(self.width) || y >= i32::from(self.height) {
            return None;
        }
        Tile::try_from(y * i32::from(self.width) + x).ok()
    }

    #[inline]
    pub fn manhattan(&self, a: Tile, b: Tile) -> i32 {
        let (ax, ay) = self.tile_xy(a);
        let (bx, by) = self.tile_xy(b);
        (ax - bx).abs() + (ay - by).abs()
    }

    /// Bounds-checked roster lookup.
    #[inline]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id)
    }

    /// Living unit standing on `tile`.
    pub fn unit_at(&self, tile: Tile) -> Option<&Unit> {
        self.units
            .iter()
            .find(|u| u.alive && u.tile == Some(tile))
    }

    #[inline]
    pub fn is_occupied(&self, tile: Tile) -> bool {
        self.unit_at(tile).is_some()
    }

    /// Living units of `side` that are on the board.
    pub fn living_units(&self, side: Side) -> impl Iterator<Item = &Unit> + '_ {
        self.units
            .iter()
            .filter(move |u| u.team == side && u.is_on_board())
    }

    /// Damage `actor` deals: its own attack power if positive, else `fallback`.
    #[inline]
    pub fn attack_damage(&self, actor: Option<UnitId>, fallback: i32) -> i32 {
        actor
            .and_then(|id| self.unit(id))
            .map(|u| u.attack)
            .filter(|&atk| atk > 0)
            .unwrap_or(fallback)
    }

    /// Whether `action` is an attack that drops its target to 0 HP or below,
    /// judged on the current (pre-action) state.
    pub fn is_lethal_attack(&self, action: &Action, fallback_damage: i32) -> bool {
        let ActionKind::Attack { target } = action.kind else {
            return false;
        };
        let Some(t) = self.unit(target) else {
            return false;
        };
        t.hp - self.attack_damage(action.actor, fallback_damage) <= 0
    }

    /// Whether the acting unit can pay for `action` out of its own AP.
    /// Team-level actions are always affordable here.
    #[inline]
    pub fn actor_can_afford(&self, action: &Action) -> bool {
        match action.actor {
            Some(id) => self
                .unit(id)
                .is_some_and(|u| u.ap >= i32::from(action.ap_cost)),
            None => true,
        }
    }

    /// Atomic transition shared by every ruleset: actor AP, position, target
    /// HP and death. Turn order and team pools are left to the rules.
    ///
    /// The returned delta is also pushed on `undo_stack`.
    pub fn make_atomic(&mut self, action: &Action) -> UnitDelta {
        let mut delta = UnitDelta {
            prev_key: self.key,
            ..UnitDelta::default()
        };

        let actor = action.actor.filter(|&id| id < self.units.len());
        if let Some(id) = actor {
            let a = &mut self.units[id];
            delta.actor = Some(id);
            delta.prev_actor_tile = a.tile;
            delta.prev_actor_ap = a.ap;
            delta.prev_actor_hp = a.hp;
            delta.prev_actor_alive = a.alive;

            if action.ap_cost > 0 {
                a.ap -= i32::from(action.ap_cost);
                delta.changed_ap = true;
            }
        }

        match action.kind {
            ActionKind::Move { tile } => {
                if let Some(id) = actor {
                    let a = self.units[id];
                    if let (true, Some(from)) = (a.alive, a.tile) {
                        self.xor_unit_pos(id, from);
                        self.units[id].tile = Some(tile);
                        delta.changed_pos = true;
                        self.xor_unit_pos(id, tile);
                    }
                }
            }
            ActionKind::Attack { target } if target < self.units.len() => {
                let dmg = self.attack_damage(actor, DEFAULT_ATTACK_DAMAGE);
                let t = &mut self.units[target];
                delta.target = Some(target);
                delta.prev_target_hp = t.hp;
                delta.prev_target_alive = t.alive;

                t.hp -= dmg;
                delta.target_changed_hp = true;

                if t.hp <= 0 && t.alive {
                    t.alive = false;
                    delta.target_changed_alive = true;
                    if let Some(tile) = t.tile {
                        self.xor_unit_pos(target, tile);
                    }
                }
            }
            // Pass and EndTurn carry no unit mutation beyond AP.
            _ => {}
        }

        self.undo_stack.push(delta);
        delta
    }

    /// Reverse `make_atomic`. `key` is restored from the delta verbatim.
    pub fn unmake_atomic(&mut self, delta: &UnitDelta) {
        self.undo_stack.pop();

        if let Some(a) = delta.actor.and_then(|id| self.units.get_mut(id)) {
            a.tile = delta.prev_actor_tile;
            a.ap = delta.prev_actor_ap;
            a.hp = delta.prev_actor_hp;
            a.alive = delta.prev_actor_alive;
        }
        if let Some(t) = delta.target.and_then(|id| self.units.get_mut(id)) {
            t.hp = delta.prev_target_hp;
            t.alive = delta.prev_target_alive;
        }
        self.key = delta.prev_key;
    }
}
