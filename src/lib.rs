//! Crate root module declarations for the tactics search engine.
//!
//! This file exposes all top-level subsystems (game state, rulesets, search,
//! engines, snapshot construction, the console front-end, and utility
//! helpers) so the binary, tests, and benches can import stable module paths.

pub mod game_state {
    pub mod game_state;
    pub mod tactics_rules;
    pub mod tactics_types;
    pub mod undo_state;
}

pub mod actions {
    pub mod action;
}

pub mod move_generation {
    pub mod perft;
    pub mod rule_engine;
    pub mod team_pool_rules;
    pub mod undo_check;
    pub mod unit_ap_rules;
}

pub mod search {
    pub mod board_scoring;
    pub mod iterative_deepening;
    pub mod move_ordering;
    pub mod transposition_table;
    pub mod zobrist;
}

pub mod engines {
    pub mod engine_config;
    pub mod engine_greedy;
    pub mod engine_iterative;
    pub mod engine_trait;
    pub mod time_management;
}

pub mod snapshot {
    pub mod snapshot_builder;
}

pub mod console {
    pub mod console_top;
}

pub mod utils {
    pub mod render_game_state;
    pub mod sample_positions;
    pub mod search_log;
}
