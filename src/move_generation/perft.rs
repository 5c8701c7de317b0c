//! Exhaustive legal-action enumeration for correctness testing.
//!
//! Perft walks the raw legal-action tree with plain make/unmake. The side to
//! act is never flipped here, so per-unit rulesets count one side's action
//! sequences while team-pool rulesets follow their own turn handoffs.

use crate::actions::action::{Action, ActionKind};
use crate::game_state::game_state::GameState;
use crate::game_state::tactics_rules::DEFAULT_ATTACK_DAMAGE;
use crate::move_generation::rule_engine::RuleEngine;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerftCounts {
    pub nodes: u64,
    pub moves: u64,
    pub attacks: u64,
    pub kills: u64,
    pub passes: u64,
    pub end_turns: u64,
}

impl PerftCounts {
    fn merge(&mut self, rhs: PerftCounts) {
        self.nodes += rhs.nodes;
        self.moves += rhs.moves;
        self.attacks += rhs.attacks;
        self.kills += rhs.kills;
        self.passes += rhs.passes;
        self.end_turns += rhs.end_turns;
    }

    fn record_leaf(&mut self, state: &GameState, action: &Action) {
        self.nodes += 1;
        match action.kind {
            ActionKind::Move { .. } => self.moves += 1,
            ActionKind::Attack { .. } => {
                self.attacks += 1;
                if state.is_lethal_attack(action, DEFAULT_ATTACK_DAMAGE) {
                    self.kills += 1;
                }
            }
            ActionKind::Pass => self.passes += 1,
            ActionKind::EndTurn => self.end_turns += 1,
        }
    }
}

/// Number of leaf nodes `depth` plies below `game_state`.
pub fn perft<R: RuleEngine>(rules: &R, game_state: &mut GameState, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }

    let actions = rules.legal_actions(game_state);
    let mut nodes = 0u64;
    for action in &actions {
        let delta = rules.make(game_state, action);
        nodes += perft(rules, game_state, depth - 1);
        rules.unmake(game_state, &delta);
    }
    nodes
}

/// Perft with a breakdown of the action kinds played at the leaf ply.
pub fn perft_counts<R: RuleEngine>(rules: &R, game_state: &mut GameState, depth: u8) -> PerftCounts {
    if depth == 0 {
        return PerftCounts {
            nodes: 1,
            ..PerftCounts::default()
        };
    }

    let actions = rules.legal_actions(game_state);
    let mut total = PerftCounts::default();

    for action in &actions {
        if depth == 1 {
            total.record_leaf(game_state, action);
            continue;
        }
        let delta = rules.make(game_state, action);
        total.merge(perft_counts(rules, game_state, depth - 1));
        rules.unmake(game_state, &delta);
    }

    total
}

/// Leaf counts below each root action, in generation order.
pub fn perft_divide<R: RuleEngine>(
    rules: &R,
    game_state: &mut GameState,
    depth: u8,
) -> Vec<(Action, u64)> {
    if depth == 0 {
        return Vec::new();
    }

    rules
        .legal_actions(game_state)
        .into_iter()
        .map(|action| {
            let delta = rules.make(game_state, &action);
            let nodes = perft(rules, game_state, depth - 1);
            rules.unmake(game_state, &delta);
            (action, nodes)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::move_generation::team_pool_rules::TeamPoolRules;
    use crate::move_generation::unit_ap_rules::BasicRules;
    use crate::utils::sample_positions::{two_unit_skirmish, two_unit_team_pool};

    #[test]
    fn perft_depth_zero_counts_single_node() {
        let mut state = two_unit_skirmish();
        assert_eq!(perft(&BasicRules::default(), &mut state, 0), 1);
        assert_eq!(
            perft_counts(&BasicRules::default(), &mut state, 0),
            PerftCounts {
                nodes: 1,
                ..PerftCounts::default()
            }
        );
    }

    #[test]
    fn unit_ap_perft_matches_known_counts() {
        let rules = BasicRules::default();
        let mut state = two_unit_skirmish();
        let key = state.key;

        assert_eq!(perft(&rules, &mut state, 1), 5);
        assert_eq!(perft(&rules, &mut state, 2), 25);
        assert_eq!(state.key, key);
        assert!(state.undo_stack.is_empty());
    }

    #[test]
    fn team_pool_perft_matches_known_counts() {
        let rules = TeamPoolRules::default();
        let mut state = two_unit_team_pool();

        assert_eq!(perft(&rules, &mut state, 1), 5);
        assert_eq!(perft(&rules, &mut state, 2), 25);
    }

    #[test]
    fn leaf_breakdown_classifies_actions() {
        let rules = BasicRules::default();
        let mut state = two_unit_skirmish();

        let counts = perft_counts(&rules, &mut state, 1);
        assert_eq!(
            counts,
            PerftCounts {
                nodes: 5,
                moves: 3,
                attacks: 1,
                kills: 0,
                passes: 1,
                end_turns: 0,
            }
        );

        let deeper = perft_counts(&rules, &mut state, 2);
        assert_eq!(deeper.nodes, perft(&rules, &mut state, 2));
        // After the first hit the defender is down to 5 HP.
        assert_eq!(deeper.kills, 1);
    }

    #[test]
    fn divide_sums_to_perft() {
        let rules = TeamPoolRules::default();
        let mut state = two_unit_team_pool();
        let divide = perft_divide(&rules, &mut state, 2);
        assert_eq!(divide.len(), 5);
        let sum: u64 = divide.iter().map(|(_, n)| n).sum();
        assert_eq!(sum, perft(&rules, &mut state, 2));
    }
}
