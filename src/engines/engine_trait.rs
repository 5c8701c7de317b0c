//! Engine abstraction layer used by the console front-end.
//!
//! Defines common per-turn request parameters and output payloads so the
//! greedy and searching engines can be driven through one interface.

use std::path::PathBuf;

use thiserror::Error;

use crate::actions::action::Action;
use crate::game_state::game_state::GameState;
use crate::move_generation::rule_engine::RuleEngine;
use crate::search::iterative_deepening::SearchStats;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown option: {0}")]
    UnknownOption(String),
    #[error("invalid value '{value}' for option {name}")]
    InvalidOptionValue { name: String, value: String },
    #[error("unknown preset: {0}")]
    UnknownPreset(String),
    #[error("failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("search log write failed: {0}")]
    SearchLogIo(#[from] std::io::Error),
    #[error("search log encode failed: {0}")]
    SearchLogEncode(#[from] serde_json::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Per-turn overrides on top of the engine's configured budget and caps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnRequest {
    pub soft_ms: Option<u64>,
    pub hard_ms: Option<u64>,
    pub max_depth: Option<u8>,
    pub root_k: Option<usize>,
    pub node_k: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineOutput {
    /// Actions to play this turn, in order.
    pub line: Vec<Action>,
    pub score: Option<i32>,
    pub stats: Option<SearchStats>,
    pub info_lines: Vec<String>,
}

pub trait Engine {
    fn name(&self) -> &str;

    fn new_game(&mut self) {}

    fn set_option(&mut self, name: &str, _value: &str) -> EngineResult<()> {
        Err(EngineError::UnknownOption(name.to_owned()))
    }

    /// Pick a line for the side to act. `game_state` is returned unchanged.
    fn choose_line<R: RuleEngine>(
        &mut self,
        rules: &R,
        game_state: &mut GameState,
        request: &TurnRequest,
    ) -> EngineOutput;
}
