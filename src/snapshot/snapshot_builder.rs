//! Builds engine states from host-side actors.
//!
//! The host exposes its actors through [`SnapshotActor`]. A session hands out
//! stable integer ids per actor across snapshots, while the engine itself
//! indexes units by roster slot.

use std::collections::HashMap;
use std::hash::Hash;

use log::{debug, info, warn};
use thiserror::Error;

use crate::game_state::game_state::GameState;
use crate::game_state::tactics_rules::{
    DEFAULT_ATTACK_DAMAGE, DEFAULT_TURN_AP, DEFAULT_UNIT_HP, DEFAULT_ZOBRIST_SEED, FALLBACK_UNIT_AP,
};
use crate::game_state::tactics_types::{Side, Tile, Unit};

/// Largest roster the action signature can address.
pub const MAX_ROSTER: usize = 0xF_FFFF;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("board must have non-zero width and height (got {width}x{height})")]
    ZeroSizedBoard { width: u16, height: u16 },
    #[error("board of {0} tiles exceeds the tile index range")]
    BoardTooLarge(usize),
    #[error("side to act must be 0 or 1 (got {0})")]
    InvalidSide(u8),
    #[error("roster of {0} units exceeds the id space")]
    RosterTooLarge(usize),
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamTag {
    NoTeam,
    Team(u8),
}

/// What the engine needs to know about one host actor.
pub trait SnapshotActor {
    type Key: Copy + Eq + Hash;

    /// Host identity, used for stable ids across snapshots.
    fn actor_key(&self) -> Self::Key;

    fn grid_coord(&self) -> Option<(i32, i32)>;

    fn team(&self) -> TeamTag;

    fn current_hp(&self) -> Option<i32>;

    fn max_hp(&self) -> Option<i32> {
        None
    }

    fn attack_power(&self) -> Option<i32> {
        None
    }

    fn is_dead(&self) -> bool {
        self.current_hp().is_some_and(|hp| hp <= 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotConfig {
    pub width: u16,
    pub height: u16,
    /// 0 for Blue, 1 for Red.
    pub side_to_act: u8,
    pub living_only: bool,
    /// Pool granted to the side to act; the other side starts at 0.
    pub team_ap_start: i32,
    pub zobrist_seed: u64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            width: 5,
            height: 5,
            side_to_act: 0,
            living_only: true,
            team_ap_start: DEFAULT_TURN_AP,
            zobrist_seed: DEFAULT_ZOBRIST_SEED,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Snapshot<K> {
    pub state: GameState,
    /// Host key per roster slot.
    pub actor_keys: Vec<K>,
    /// Session id per roster slot.
    pub stable_ids: Vec<u32>,
}

impl<K: Copy + Eq> Snapshot<K> {
    /// Roster slot of the actor with host key `key`.
    pub fn slot_of(&self, key: K) -> Option<usize> {
        self.actor_keys.iter().position(|&k| k == key)
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotSession<K> {
    ids: HashMap<K, u32>,
    next_id: u32,
}

impl<K: Copy + Eq + Hash> Default for SnapshotSession<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + Hash> SnapshotSession<K> {
    pub fn new() -> Self {
        Self {
            ids: HashMap::new(),
            next_id: 0,
        }
    }

    /// Id assigned on first sight of `key`, reused afterwards.
    pub fn stable_id(&mut self, key: K) -> u32 {
        let next = &mut self.next_id;
        *self.ids.entry(key).or_insert_with(|| {
            let id = *next;
            *next += 1;
            id
        })
    }

    pub fn reset_ids(&mut self) {
        self.ids.clear();
        self.next_id = 0;
    }

    #[inline]
    pub fn known_actors(&self) -> usize {
        self.ids.len()
    }

    pub fn build<'a, A, I>(&mut self, actors: I, config: &SnapshotConfig) -> SnapshotResult<Snapshot<K>>
    where
        A: SnapshotActor<Key = K> + 'a,
        I: IntoIterator<Item = &'a A>,
    {
        if config.width == 0 || config.height == 0 {
            return Err(SnapshotError::ZeroSizedBoard {
                width: config.width,
                height: config.height,
            });
        }
        let board_size = usize::from(config.width) * usize::from(config.height);
        if board_size > usize::from(Tile::MAX) {
            return Err(SnapshotError::BoardTooLarge(board_size));
        }
        let side = Side::from_index(usize::from(config.side_to_act))
            .ok_or(SnapshotError::InvalidSide(config.side_to_act))?;

        let mut state = GameState::new(config.width, config.height, side);
        let mut actor_keys = Vec::new();
        let mut stable_ids = Vec::new();

        for actor in actors {
            let Some(team) = team_side(actor.team()) else {
                continue;
            };
            let Some(tile) = actor
                .grid_coord()
                .and_then(|(x, y)| state.tile_at(x, y))
            else {
                continue;
            };
            if config.living_only && actor.is_dead() {
                continue;
            }
            if state.is_occupied(tile) {
                warn!("snapshot: tile {} already occupied, actor skipped", tile);
                continue;
            }
            if state.units.len() >= MAX_ROSTER {
                return Err(SnapshotError::RosterTooLarge(state.units.len() + 1));
            }

            let hp = actor
                .current_hp()
                .or_else(|| actor.max_hp())
                .unwrap_or(DEFAULT_UNIT_HP);
            let attack = actor
                .attack_power()
                .filter(|&a| a > 0)
                .unwrap_or(DEFAULT_ATTACK_DAMAGE);

            let mut unit =
                Unit::new(state.units.len(), team, tile, hp, FALLBACK_UNIT_AP).with_attack(attack);
            unit.alive = hp > 0;
            state.units.push(unit);
            actor_keys.push(actor.actor_key());
            stable_ids.push(self.stable_id(actor.actor_key()));
        }

        let pool = config.team_ap_start.max(0);
        state.team_ap[side.index()] = pool;
        state.max_ap = pool;
        state.init_zobrist(config.zobrist_seed, state.units.len());

        info!(
            "snapshot built: {}x{} board, {} units, {:?} to act, key {:#018x}",
            config.width,
            config.height,
            state.units.len(),
            side,
            state.key
        );
        Ok(Snapshot {
            state,
            actor_keys,
            stable_ids,
        })
    }
}

fn team_side(tag: TeamTag) -> Option<Side> {
    match tag {
        TeamTag::NoTeam => None,
        TeamTag::Team(t) => {
            let side = Side::from_index(usize::from(t));
            if side.is_none() {
                debug!("snapshot: unsupported team tag {}", t);
            }
            side
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::zobrist::compute_zobrist_key;

    #[derive(Debug, Clone, Copy)]
    struct HostActor {
        key: u64,
        coord: Option<(i32, i32)>,
        team: TeamTag,
        hp: Option<i32>,
        max_hp: Option<i32>,
        attack: Option<i32>,
    }

    impl HostActor {
        fn at(key: u64, x: i32, y: i32, team: u8) -> Self {
            Self {
                key,
                coord: Some((x, y)),
                team: TeamTag::Team(team),
                hp: Some(10),
                max_hp: None,
                attack: None,
            }
        }
    }

    impl SnapshotActor for HostActor {
        type Key = u64;

        fn actor_key(&self) -> u64 {
            self.key
        }
        fn grid_coord(&self) -> Option<(i32, i32)> {
            self.coord
        }
        fn team(&self) -> TeamTag {
            self.team
        }
        fn current_hp(&self) -> Option<i32> {
            self.hp
        }
        fn max_hp(&self) -> Option<i32> {
            self.max_hp
        }
        fn attack_power(&self) -> Option<i32> {
            self.attack
        }
    }

    #[test]
    fn eligible_actors_become_units_in_enumeration_order() {
        let actors = vec![
            HostActor {
                attack: Some(8),
                ..HostActor::at(100, 2, 2, 0)
            },
            HostActor {
                team: TeamTag::NoTeam,
                ..HostActor::at(101, 0, 0, 0)
            },
            HostActor {
                coord: None,
                ..HostActor::at(102, 0, 0, 1)
            },
            HostActor {
                hp: None,
                max_hp: Some(7),
                attack: Some(-1),
                ..HostActor::at(103, 3, 2, 1)
            },
            HostActor {
                coord: Some((9, 9)),
                ..HostActor::at(104, 0, 0, 1)
            },
        ];

        let mut session = SnapshotSession::new();
        let snap = session
            .build(&actors, &SnapshotConfig::default())
            .expect("valid config");

        assert_eq!(snap.actor_keys, vec![100, 103]);
        assert_eq!(snap.state.units.len(), 2);
        assert_eq!(snap.state.units[0].tile, Some(12));
        assert_eq!(snap.state.units[1].tile, Some(13));
        assert_eq!(snap.state.units[0].attack, 8);
        assert_eq!(snap.state.units[1].id, 1);
        assert_eq!(snap.state.units[1].hp, 7);
        assert_eq!(snap.state.units[1].attack, DEFAULT_ATTACK_DAMAGE);
        assert_eq!(snap.state.units[1].ap, FALLBACK_UNIT_AP);
        assert_eq!(snap.state.team_ap, [DEFAULT_TURN_AP, 0]);
        assert_eq!(snap.state.key, compute_zobrist_key(&snap.state));
        assert_eq!(snap.slot_of(103), Some(1));
    }

    #[test]
    fn dead_actors_are_filtered_only_when_asked() {
        let actors = vec![
            HostActor::at(1, 0, 0, 0),
            HostActor {
                hp: Some(0),
                ..HostActor::at(2, 1, 0, 1)
            },
        ];
        let mut session = SnapshotSession::new();
        let living = session.build(&actors, &SnapshotConfig::default()).expect("ok");
        assert_eq!(living.state.units.len(), 1);

        let config = SnapshotConfig {
            living_only: false,
            side_to_act: 1,
            ..SnapshotConfig::default()
        };
        let all = session.build(&actors, &config).expect("ok");
        assert_eq!(all.state.units.len(), 2);
        assert!(!all.state.units[1].alive);
        assert_eq!(all.state.side_to_act, Side::Red);
        assert_eq!(all.state.team_ap, [0, DEFAULT_TURN_AP]);
    }

    #[test]
    fn stable_ids_survive_snapshots_until_reset() {
        let first = vec![HostActor::at(7, 0, 0, 0), HostActor::at(9, 1, 0, 1)];
        let second = vec![HostActor::at(9, 1, 1, 1), HostActor::at(11, 2, 2, 0)];

        let mut session = SnapshotSession::new();
        let a = session.build(&first, &SnapshotConfig::default()).expect("ok");
        let b = session.build(&second, &SnapshotConfig::default()).expect("ok");
        assert_eq!(a.stable_ids, vec![0, 1]);
        assert_eq!(b.stable_ids, vec![1, 2]);
        assert_eq!(session.known_actors(), 3);

        session.reset_ids();
        assert_eq!(session.stable_id(11), 0);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let actors: Vec<HostActor> = Vec::new();
        let mut session = SnapshotSession::new();
        let zero = SnapshotConfig {
            width: 0,
            ..SnapshotConfig::default()
        };
        assert_eq!(
            session.build(&actors, &zero).err(),
            Some(SnapshotError::ZeroSizedBoard { width: 0, height: 5 })
        );
        let bad_side = SnapshotConfig {
            side_to_act: 2,
            ..SnapshotConfig::default()
        };
        assert_eq!(
            session.build(&actors, &bad_side).err(),
            Some(SnapshotError::InvalidSide(2))
        );
    }
}
