//! One-line-per-search JSONL records for offline analysis and tuning.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use crate::actions::action::format_action_line;
use crate::engines::engine_trait::EngineResult;
use crate::game_state::game_state::GameState;
use crate::move_generation::rule_engine::RuleEngine;
use crate::move_generation::team_pool_rules::TeamPoolRules;
use crate::search::board_scoring::EvalWeights;
use crate::search::iterative_deepening::SearchResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchLogRecord {
    pub ts: i64,
    pub depth: u8,
    pub nodes: u64,
    pub ms: f64,
    pub score: i32,
    #[serde(rename = "W_HP")]
    pub w_hp: i32,
    #[serde(rename = "W_Pos")]
    pub w_pos: i32,
    #[serde(rename = "W_TFor")]
    pub w_threat_for: i32,
    #[serde(rename = "W_TAgainst")]
    pub w_threat_against: i32,
    #[serde(rename = "W_Coh")]
    pub w_cohesion: i32,
    pub pv: String,
}

impl SearchLogRecord {
    pub fn new(result: &SearchResult, weights: &EvalWeights) -> Self {
        Self {
            ts: Utc::now().timestamp_millis(),
            depth: result.reached_depth,
            nodes: result.nodes,
            ms: result.elapsed_ms(),
            score: result.best_score,
            w_hp: weights.hp,
            w_pos: weights.pos,
            w_threat_for: weights.threat_for,
            w_threat_against: weights.threat_against,
            w_cohesion: weights.cohesion,
            pv: format_action_line(&result.pv),
        }
    }
}

/// One replayed principal-variation step under the team-pool rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayStep {
    pub act: String,
    pub side: usize,
    pub ap_before: [i32; 2],
    pub ap_after: [i32; 2],
    pub flipped: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamPoolLogRecord {
    pub ts: i64,
    pub depth: u8,
    pub nodes: u64,
    pub ms: f64,
    pub score: i32,
    #[serde(rename = "teamAP_start")]
    pub team_ap_start: [i32; 2],
    pub side_start: usize,
    pub actions: Vec<ReplayStep>,
}

impl TeamPoolLogRecord {
    /// Replays `result.pv` on a copy of `root` to record pool changes and
    /// turn handoffs along the line.
    pub fn new(root: &GameState, rules: &TeamPoolRules, result: &SearchResult) -> Self {
        let mut state = root.clone();
        let actions = result
            .pv
            .iter()
            .map(|action| {
                let delta = rules.make(&mut state, action);
                ReplayStep {
                    act: action.to_string(),
                    side: delta.side_before.index(),
                    ap_before: delta.ap_before,
                    ap_after: state.team_ap,
                    flipped: delta.flipped_turn,
                }
            })
            .collect();

        Self {
            ts: Utc::now().timestamp_millis(),
            depth: result.reached_depth,
            nodes: result.nodes,
            ms: result.elapsed_ms(),
            score: result.best_score,
            team_ap_start: root.team_ap,
            side_start: root.side_to_act.index(),
            actions,
        }
    }
}

/// Append `record` as one JSON line, creating parent directories as needed.
pub fn append_record<T: Serialize>(path: &Path, record: &T) -> EngineResult<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let line = serde_json::to_string(record)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")?;
    Ok(())
}
