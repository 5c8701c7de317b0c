use std::time::Instant;

use log::trace;

use crate::actions::action::Action;
use crate::engines::engine_trait::{Engine, EngineError, EngineOutput, EngineResult, TurnRequest};
use crate::game_state::game_state::GameState;
use crate::game_state::tactics_rules::DEFAULT_ATTACK_DAMAGE;
use crate::move_generation::rule_engine::RuleEngine;
use crate::search::move_ordering::{sort_actions_deterministic, OrderWeights};

/// Longest line the greedy engine plays in one turn by default.
pub const DEFAULT_GREEDY_LEN: usize = 8;

/// Plays the top-ordered affordable action repeatedly until the turn passes,
/// nothing is affordable, or `max_len` actions have been played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GreedyEngine {
    pub max_len: usize,
    pub order: OrderWeights,
    pub attack_damage: i32,
}

impl Default for GreedyEngine {
    fn default() -> Self {
        Self::new(DEFAULT_GREEDY_LEN)
    }
}

impl GreedyEngine {
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len,
            order: OrderWeights::default(),
            attack_damage: DEFAULT_ATTACK_DAMAGE,
        }
    }

    /// The greedy line from `game_state`. Every applied action is unwound
    /// before returning.
    pub fn greedy_line<R: RuleEngine>(&self, rules: &R, game_state: &mut GameState) -> Vec<Action> {
        let side = game_state.side_to_act;
        let mut line = Vec::new();
        let mut deltas = Vec::new();

        while line.len() < self.max_len {
            let mut actions = rules.affordable_actions(game_state);
            if actions.is_empty() {
                break;
            }
            sort_actions_deterministic(game_state, &mut actions, &self.order, self.attack_damage);
            let pick = actions[0];
            trace!("greedy step {}: {}", line.len() + 1, pick);

            deltas.push(rules.make(game_state, &pick));
            line.push(pick);
            if game_state.side_to_act != side {
                break;
            }
        }

        while let Some(delta) = deltas.pop() {
            rules.unmake(game_state, &delta);
        }
        line
    }
}

impl Engine for GreedyEngine {
    fn name(&self) -> &str {
        "Tactics Greedy"
    }

    fn set_option(&mut self, name: &str, value: &str) -> EngineResult<()> {
        let invalid = || EngineError::InvalidOptionValue {
            name: name.to_owned(),
            value: value.to_owned(),
        };
        match name {
            "GreedyLen" => self.max_len = value.parse().map_err(|_| invalid())?,
            "OrderPos" => self.order.pos = value.parse().map_err(|_| invalid())?,
            "OrderThreat" => self.order.threat = value.parse().map_err(|_| invalid())?,
            "OrderCost" => self.order.cost = value.parse().map_err(|_| invalid())?,
            "OrderEndTurnBias" => self.order.end_turn_bias = value.parse().map_err(|_| invalid())?,
            _ => return Err(EngineError::UnknownOption(name.to_owned())),
        }
        Ok(())
    }

    fn choose_line<R: RuleEngine>(
        &mut self,
        rules: &R,
        game_state: &mut GameState,
        request: &TurnRequest,
    ) -> EngineOutput {
        let started = Instant::now();
        let line = self.greedy_line(rules, game_state);

        let mut out = EngineOutput::default();
        out.info_lines = line
            .iter()
            .enumerate()
            .map(|(i, a)| format!("greedy step {}: {}", i + 1, a))
            .collect();
        out.info_lines.push(format!(
            "greedy done: {} actions in {:.3} ms",
            line.len(),
            started.elapsed().as_secs_f64() * 1000.0
        ));
        if let Some(depth) = request.max_depth {
            out.info_lines
                .push(format!("greedy ignores requested depth {depth}"));
        }
        out.line = line;
        out
    }
}
