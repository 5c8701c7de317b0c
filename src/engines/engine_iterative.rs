use log::warn;
use serde::Serialize;

use crate::engines::engine_config::EngineConfig;
use crate::engines::engine_trait::{Engine, EngineError, EngineOutput, EngineResult, TurnRequest};
use crate::engines::time_management::TimeBudget;
use crate::game_state::game_state::GameState;
use crate::move_generation::rule_engine::RuleEngine;
use crate::move_generation::team_pool_rules::TeamPoolRules;
use crate::search::iterative_deepening::{
    iterative_deepening_search, SearchContext, SearchParams, SearchResult,
};
use crate::utils::search_log::{append_record, SearchLogRecord, TeamPoolLogRecord};

/// Iterative deepening engine owning its configuration and search context.
pub struct IterativeEngine {
    config: EngineConfig,
    context: SearchContext,
}

impl Default for IterativeEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl IterativeEngine {
    pub fn new(config: EngineConfig) -> Self {
        let context = SearchContext::new(config.tt_size_mb);
        Self { config, context }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn context(&self) -> &SearchContext {
        &self.context
    }

    /// Resize the table; sizes above the table's maximum are clamped.
    pub fn resize_tt(&mut self, size_mb: usize) {
        self.context.resize_tt(size_mb);
        self.config.tt_size_mb = self.context.tt().size_mb();
    }

    /// Configured parameters with the per-turn overrides applied.
    pub fn params_for(&self, request: &TurnRequest) -> SearchParams {
        let mut params = self.config.search_params();
        params.budget = TimeBudget::new(
            request.soft_ms.unwrap_or(params.budget.soft_ms),
            request.hard_ms.unwrap_or(params.budget.hard_ms),
        );
        if let Some(depth) = request.max_depth {
            params.max_depth = depth;
        }
        if let Some(k) = request.root_k {
            params.root_k = (k > 0).then_some(k);
        }
        if let Some(k) = request.node_k {
            params.node_k = (k > 0).then_some(k);
        }
        params
    }

    pub fn search<R: RuleEngine>(
        &mut self,
        rules: &R,
        game_state: &mut GameState,
        request: &TurnRequest,
    ) -> SearchResult {
        let params = self.params_for(request);
        iterative_deepening_search(rules, game_state, &params, &mut self.context)
    }

    /// Team-pool search whose log record replays the line's pool changes.
    pub fn choose_team_pool_line(
        &mut self,
        rules: &TeamPoolRules,
        game_state: &mut GameState,
        request: &TurnRequest,
    ) -> EngineOutput {
        let result = self.search(rules, game_state, request);
        let mut out = output_from(&result);
        if self.config.log_search {
            let record = TeamPoolLogRecord::new(game_state, rules, &result);
            self.write_log(&record, &mut out);
        }
        out
    }

    fn write_log<T: Serialize>(&self, record: &T, out: &mut EngineOutput) {
        if let Err(e) = append_record(&self.config.log_path, record) {
            warn!("search log {}: {}", self.config.log_path.display(), e);
            out.info_lines.push(format!("search log failed: {e}"));
        }
    }
}

fn output_from(result: &SearchResult) -> EngineOutput {
    let mut out = EngineOutput {
        line: result.pv.clone(),
        score: Some(result.best_score),
        stats: Some(result.stats),
        info_lines: Vec::new(),
    };
    out.info_lines.push(format!(
        "depth {} score {} nodes {} time {:.3} ms nps {:.0}",
        result.reached_depth,
        result.best_score,
        result.nodes,
        result.elapsed_ms(),
        result.nps()
    ));
    out.info_lines.push(format!(
        "tt hits {} exact {} lower {} upper {} qcalls {} dedup {}",
        result.stats.tt_hits,
        result.stats.tt_exact,
        result.stats.tt_lower,
        result.stats.tt_upper,
        result.stats.q_calls,
        result.stats.dedup_skips
    ));
    out.info_lines.push(format!("pv {}", result.pv_line()));
    out
}

impl Engine for IterativeEngine {
    fn name(&self) -> &str {
        "Tactics Iterative"
    }

    fn new_game(&mut self) {
        self.context.clear();
    }

    fn set_option(&mut self, name: &str, value: &str) -> EngineResult<()> {
        match self.config.set_option(name, value) {
            Ok(()) => {
                if name == "TTSizeMB" {
                    self.context.resize_tt(self.config.tt_size_mb);
                }
                Ok(())
            }
            Err(EngineError::UnknownPreset(preset)) => {
                warn!("unknown {} preset '{}'", name, preset);
                Err(EngineError::UnknownPreset(preset))
            }
            Err(e) => Err(e),
        }
    }

    fn choose_line<R: RuleEngine>(
        &mut self,
        rules: &R,
        game_state: &mut GameState,
        request: &TurnRequest,
    ) -> EngineOutput {
        let result = self.search(rules, game_state, request);
        let mut out = output_from(&result);
        if self.config.log_search {
            let record = SearchLogRecord::new(&result, &self.config.eval);
            self.write_log(&record, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::action::Action;
    use crate::move_generation::unit_ap_rules::BasicRules;
    use crate::utils::sample_positions::{lethal_attack_scenario, two_unit_team_pool};

    fn quick_engine() -> IterativeEngine {
        let mut config = EngineConfig::default();
        config.tt_size_mb = 1;
        config.soft_ms = 10_000;
        config.hard_ms = 20_000;
        config.max_depth = 2;
        IterativeEngine::new(config)
    }

    #[test]
    fn request_overrides_configured_knobs() {
        let engine = quick_engine();
        let params = engine.params_for(&TurnRequest {
            soft_ms: Some(5),
            max_depth: Some(9),
            root_k: Some(0),
            node_k: Some(3),
            ..TurnRequest::default()
        });
        assert_eq!(params.budget, TimeBudget::new(5, 20_000));
        assert_eq!(params.max_depth, 9);
        assert_eq!(params.root_k, None);
        assert_eq!(params.node_k, Some(3));
    }

    #[test]
    fn engine_finds_the_kill() {
        let mut engine = quick_engine();
        let mut state = lethal_attack_scenario();
        let out = engine.choose_line(&BasicRules::default(), &mut state, &TurnRequest::default());
        assert_eq!(out.line.first(), Some(&Action::attack(0, 1, 1)));
        assert!(out.score.is_some());
        assert_eq!(out.info_lines.len(), 3);
    }

    #[test]
    fn tt_resize_option_reaches_the_context() {
        let mut engine = quick_engine();
        engine.set_option("TTSizeMB", "2").expect("valid option");
        assert_eq!(engine.context().tt().size_mb(), 2);
        assert!(engine.set_option("Difficulty", "impossible").is_err());
    }

    #[test]
    fn team_pool_search_logs_replay_record() {
        let path = std::env::temp_dir().join(format!("tactics_core_engine_{}.jsonl", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let mut engine = quick_engine();
        engine.set_option("LogSearch", "1").expect("flag");
        engine
            .set_option("LogPath", path.to_str().expect("utf-8 temp path"))
            .expect("path");

        let mut state = two_unit_team_pool();
        let out = engine.choose_team_pool_line(&TeamPoolRules::default(), &mut state, &TurnRequest::default());
        assert!(!out.line.is_empty());

        let content = std::fs::read_to_string(&path).expect("log written");
        let json: serde_json::Value =
            serde_json::from_str(content.lines().next().expect("one line")).expect("valid json");
        assert_eq!(json["side_start"], 0);
        assert_eq!(
            json["actions"].as_array().map(Vec::len),
            Some(out.line.len())
        );
        let _ = std::fs::remove_file(&path);
    }
}
