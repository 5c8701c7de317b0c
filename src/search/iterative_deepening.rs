//! Iterative deepening negamax alpha-beta with transposition table,
//! quiescence, sibling deduplication and soft/hard time control.
//!
//! The search is generic over the ruleset. Children that leave the side to
//! act unchanged (a team-pool side spending AP) are searched without negating
//! the score or swapping the window; every other child is a normal negamax
//! step.

use std::time::Duration;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::actions::action::{format_action_line, Action};
use crate::engines::time_management::{TimeBudget, TimeManager};
use crate::game_state::game_state::GameState;
use crate::game_state::tactics_rules::DEFAULT_ATTACK_DAMAGE;
use crate::game_state::tactics_types::Side;
use crate::move_generation::rule_engine::{RuleEngine, ScopedMake};
use crate::search::board_scoring::{BoardScorer, EvalWeights};
use crate::search::move_ordering::{
    prefer_best_move, sort_actions_deterministic, threat_relief_for_attack, top_tie_group_len,
    OrderWeights,
};
use crate::search::transposition_table::{Bound, TTEntry, TranspositionTable};

/// Window bound. Far outside any reachable evaluation.
pub const INF: i32 = 1_000_000_000;

/// Default transposition table size.
pub const DEFAULT_TT_MB: usize = 64;

const NOISE_DEPTH_MIX: u64 = 0x9E37_79B9_7F4A_7C15;
const TIE_BREAK_SALT: u64 = 0xD1B5_4A32_D192_ED03;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchParams {
    pub budget: TimeBudget,
    pub max_depth: u8,
    /// Root breadth cap after ordering.
    pub root_k: Option<usize>,
    /// Interior-node breadth cap after ordering.
    pub node_k: Option<usize>,
    /// Node budget. Reaching it stops the search like the hard deadline.
    pub max_nodes: Option<u64>,
    pub dedup: bool,
    pub strict_quiescence: bool,
    /// Chance in percent of picking among tied root actions, both for the
    /// ordering tie and for equal search scores.
    pub epsilon: u8,
    pub noise_seed: u64,
    /// Damage assumed for attackers without their own attack power.
    pub attack_damage: i32,
    pub eval: EvalWeights,
    pub order: OrderWeights,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            budget: TimeBudget::default(),
            max_depth: 5,
            root_k: None,
            node_k: None,
            max_nodes: None,
            dedup: true,
            strict_quiescence: true,
            epsilon: 0,
            noise_seed: 12345,
            attack_damage: DEFAULT_ATTACK_DAMAGE,
            eval: EvalWeights::default(),
            order: OrderWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub tt_hits: u64,
    pub tt_exact: u64,
    pub tt_lower: u64,
    pub tt_upper: u64,
    pub q_calls: u64,
    pub dedup_skips: u64,
    pub completed_depth: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    /// Relative to the side to act at the root.
    pub best_score: i32,
    pub pv: Vec<Action>,
    pub reached_depth: u8,
    pub nodes: u64,
    pub elapsed: Duration,
    pub hard_stopped: bool,
    pub stats: SearchStats,
}

impl SearchResult {
    #[inline]
    pub fn best_action(&self) -> Option<Action> {
        self.pv.first().copied()
    }

    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    pub fn nps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.nodes as f64 / secs
        } else {
            0.0
        }
    }

    pub fn pv_line(&self) -> String {
        format_action_line(&self.pv)
    }
}

/// Caller-owned state that survives between search calls: the table and the
/// evaluation weights its scores were computed under.
#[derive(Debug, Clone)]
pub struct SearchContext {
    tt: TranspositionTable,
    last_eval: Option<EvalWeights>,
}

impl Default for SearchContext {
    fn default() -> Self {
        Self::new(DEFAULT_TT_MB)
    }
}

impl SearchContext {
    pub fn new(tt_size_mb: usize) -> Self {
        Self {
            tt: TranspositionTable::new_with_mb(tt_size_mb),
            last_eval: None,
        }
    }

    #[inline]
    pub fn tt(&self) -> &TranspositionTable {
        &self.tt
    }

    #[inline]
    pub fn tt_mut(&mut self) -> &mut TranspositionTable {
        &mut self.tt
    }

    pub fn resize_tt(&mut self, size_mb: usize) {
        self.tt.resize_mb(size_mb);
        info!(
            "transposition table resized to {} MB ({} buckets)",
            self.tt.size_mb(),
            self.tt.len()
        );
    }

    pub fn clear(&mut self) {
        self.tt.clear();
        self.last_eval = None;
    }

    /// Purge the table when `weights` differ from the last search's weights.
    /// Returns whether a purge happened.
    pub fn invalidate_on_weight_change(&mut self, weights: &EvalWeights) -> bool {
        let changed = self.last_eval.is_some_and(|prev| prev != *weights);
        if changed {
            self.tt.clear();
            info!("evaluation weights changed, transposition table cleared");
        }
        self.last_eval = Some(*weights);
        changed
    }
}

struct RootOutcome {
    score: i32,
    pv: Vec<Action>,
    complete: bool,
}

struct Searcher<'a, R: RuleEngine> {
    rules: &'a R,
    params: &'a SearchParams,
    clock: TimeManager,
    tt: Option<&'a mut TranspositionTable>,
    age: u16,
    hard_stop: bool,
    stats: SearchStats,
}

impl<'a, R: RuleEngine> Searcher<'a, R> {
    fn new(
        rules: &'a R,
        params: &'a SearchParams,
        tt: Option<&'a mut TranspositionTable>,
    ) -> Self {
        Self {
            rules,
            params,
            clock: TimeManager::start(params.budget),
            tt,
            age: 0,
            hard_stop: false,
            stats: SearchStats::default(),
        }
    }

    #[inline]
    fn evaluate(&self, state: &GameState) -> i32 {
        self.params.eval.score(state)
    }

    /// Samples the hard budget and the node budget. Once tripped it stays
    /// tripped.
    #[inline]
    fn out_of_time(&mut self) -> bool {
        if !self.hard_stop
            && (self.clock.hard_expired()
                || self.params.max_nodes.is_some_and(|cap| self.stats.nodes >= cap))
        {
            self.hard_stop = true;
        }
        self.hard_stop
    }

    fn ordered_actions(&self, state: &GameState) -> Vec<Action> {
        let mut actions = self.rules.affordable_actions(state);
        sort_actions_deterministic(
            state,
            &mut actions,
            &self.params.order,
            self.params.attack_damage,
        );
        actions
    }

    /// Moves and lethal attacks are the actions whose children can coincide
    /// under a different action order.
    #[inline]
    fn dedup_applies(&self, state: &GameState, action: &Action) -> bool {
        self.params.dedup
            && (action.is_move() || state.is_lethal_attack(action, self.params.attack_damage))
    }

    fn probe(&mut self, key: u64) -> Option<TTEntry> {
        self.tt.as_deref_mut().and_then(|tt| tt.probe(key))
    }

    fn store(&mut self, entry: TTEntry) {
        if self.hard_stop {
            return;
        }
        if let Some(tt) = self.tt.as_deref_mut() {
            tt.store(entry);
        }
    }

    fn child_value(
        &mut self,
        child: &mut GameState,
        parent_side: Side,
        depth: u8,
        alpha: i32,
        beta: i32,
        pv: &mut Vec<Action>,
    ) -> i32 {
        if child.side_to_act == parent_side {
            self.alpha_beta(child, depth, alpha, beta, pv)
        } else {
            -self.alpha_beta(child, depth, -beta, -alpha, pv)
        }
    }

    fn alpha_beta(
        &mut self,
        state: &mut GameState,
        depth: u8,
        mut alpha: i32,
        beta: i32,
        pv: &mut Vec<Action>,
    ) -> i32 {
        pv.clear();
        if self.out_of_time() {
            return self.evaluate(state);
        }

        let alpha_orig = alpha;
        let entry = self.probe(state.key);
        if let Some(e) = entry {
            self.stats.tt_hits += 1;
            if e.depth >= i16::from(depth) {
                match e.bound {
                    Bound::Exact => {
                        self.stats.tt_exact += 1;
                        pv.extend(e.best_move);
                        return e.score;
                    }
                    Bound::Lower if e.score >= beta => {
                        self.stats.tt_lower += 1;
                        return e.score;
                    }
                    Bound::Upper if e.score <= alpha => {
                        self.stats.tt_upper += 1;
                        return e.score;
                    }
                    _ => {}
                }
            }
        }

        if depth == 0 {
            return self.quiescence(state, alpha, beta);
        }

        let mut actions = self.ordered_actions(state);
        if actions.is_empty() {
            return self.evaluate(state);
        }
        if let Some(best) = entry.and_then(|e| e.best_move) {
            prefer_best_move(&mut actions, &best);
        }
        if let Some(k) = self.params.node_k.filter(|&k| k > 0) {
            actions.truncate(k);
        }

        let rules = self.rules;
        let side = state.side_to_act;
        let mut seen: Vec<u64> = Vec::with_capacity(actions.len());
        let mut child_pv = Vec::new();
        let mut best = -INF;

        for action in &actions {
            let dedup = self.dedup_applies(state, action);
            let mut child = ScopedMake::with_turn_handoff(rules, state, action);
            if dedup {
                if seen.contains(&child.key) {
                    self.stats.dedup_skips += 1;
                    continue;
                }
                seen.push(child.key);
            }

            self.stats.nodes += 1;
            let score = self.child_value(&mut child, side, depth - 1, alpha, beta, &mut child_pv);
            drop(child);

            if score > best {
                best = score;
                pv.clear();
                pv.push(*action);
                pv.extend_from_slice(&child_pv);
            }
            if best > alpha {
                alpha = best;
            }
            if alpha >= beta || self.hard_stop {
                break;
            }
        }

        let bound = if best <= alpha_orig {
            Bound::Upper
        } else if best >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.store(TTEntry {
            key: state.key,
            depth: i16::from(depth),
            score: best,
            bound,
            best_move: pv.first().copied(),
            age: self.age,
        });

        best
    }

    /// Fail-hard attack-only extension with stand-pat.
    fn quiescence(&mut self, state: &mut GameState, mut alpha: i32, beta: i32) -> i32 {
        self.stats.q_calls += 1;
        if self.out_of_time() {
            return self.evaluate(state);
        }

        let stand_pat = self.evaluate(state);
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        let damage = self.params.attack_damage;
        let strict = self.params.strict_quiescence;
        let mut actions = self.ordered_actions(state);
        actions.retain(|a| {
            a.is_attack()
                && (!strict
                    || state.is_lethal_attack(a, damage)
                    || threat_relief_for_attack(state, a, damage) > 0)
        });

        let rules = self.rules;
        let side = state.side_to_act;
        for action in &actions {
            let mut child = ScopedMake::with_turn_handoff(rules, state, action);
            self.stats.nodes += 1;
            let score = if child.side_to_act == side {
                self.quiescence(&mut child, alpha, beta)
            } else {
                -self.quiescence(&mut child, -beta, -alpha)
            };
            drop(child);

            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
            if self.hard_stop {
                break;
            }
        }

        alpha
    }

    /// One full-window pass over the root actions at `depth`.
    fn search_root(&mut self, state: &mut GameState, root: &[Action], depth: u8) -> RootOutcome {
        let rules = self.rules;
        let side = state.side_to_act;
        let mut lines: Vec<(i32, Vec<Action>)> = Vec::with_capacity(root.len());
        let mut complete = true;
        let mut seen: Vec<u64> = Vec::with_capacity(root.len());
        let mut child_pv = Vec::new();

        for action in root {
            if depth > 1 && self.clock.soft_expired() {
                complete = false;
                break;
            }

            let dedup = self.dedup_applies(state, action);
            let mut child = ScopedMake::with_turn_handoff(rules, state, action);
            if dedup {
                if seen.contains(&child.key) {
                    self.stats.dedup_skips += 1;
                    continue;
                }
                seen.push(child.key);
            }

            self.stats.nodes += 1;
            let score = self.child_value(&mut child, side, depth - 1, -INF, INF, &mut child_pv);
            drop(child);

            let mut line = Vec::with_capacity(child_pv.len() + 1);
            line.push(*action);
            line.extend_from_slice(&child_pv);
            lines.push((score, line));

            if self.hard_stop {
                complete = false;
                break;
            }
        }

        let (score, pv) = pick_root_line(state, lines, depth, self.params);
        RootOutcome { score, pv, complete }
    }
}

/// Best-scoring root line. Equal scores go to the smaller signature unless
/// the epsilon roll picks another member of the tied group.
fn pick_root_line(
    state: &GameState,
    mut lines: Vec<(i32, Vec<Action>)>,
    depth: u8,
    params: &SearchParams,
) -> (i32, Vec<Action>) {
    let Some(best) = lines.iter().map(|(score, _)| *score).max() else {
        return (-INF, Vec::new());
    };
    lines.retain(|(score, _)| *score == best);
    lines.sort_by_key(|(_, line)| line.first().map(Action::signature));

    let mut pick = 0;
    if params.epsilon > 0 && lines.len() > 1 {
        let seed = params.noise_seed
            ^ state.key
            ^ u64::from(depth).wrapping_mul(NOISE_DEPTH_MIX)
            ^ TIE_BREAK_SALT;
        let mut rng = StdRng::seed_from_u64(seed);
        if rng.random_range(0..100u32) < u32::from(params.epsilon) {
            pick = rng.random_range(0..lines.len());
        }
    }

    let (score, pv) = lines.swap_remove(pick);
    (score, pv)
}

/// With probability `epsilon`%, move a random member of the tied top group
/// to the front. Seeded from the position, the configured seed and depth.
fn apply_root_noise(state: &GameState, root: &mut [Action], params: &SearchParams) {
    if params.epsilon == 0 {
        return;
    }
    let ties = top_tie_group_len(state, root, &params.order, params.attack_damage);
    if ties < 2 {
        return;
    }

    let seed = params.noise_seed
        ^ state.key
        ^ u64::from(params.max_depth).wrapping_mul(NOISE_DEPTH_MIX);
    let mut rng = StdRng::seed_from_u64(seed);
    if rng.random_range(0..100u32) < u32::from(params.epsilon) {
        let pick = rng.random_range(0..ties);
        root.swap(0, pick);
    }
}

pub fn iterative_deepening_search<R: RuleEngine>(
    rules: &R,
    game_state: &mut GameState,
    params: &SearchParams,
    context: &mut SearchContext,
) -> SearchResult {
    context.invalidate_on_weight_change(&params.eval);

    let mut searcher = Searcher::new(rules, params, Some(&mut context.tt));
    let mut result = SearchResult {
        best_score: searcher.evaluate(game_state),
        ..SearchResult::default()
    };

    let mut root = searcher.ordered_actions(game_state);
    if let Some(k) = params.root_k.filter(|&k| k > 0) {
        root.truncate(k);
    }
    apply_root_noise(game_state, &mut root, params);

    if params.max_depth > 0 && !root.is_empty() {
        for depth in 1..=params.max_depth {
            if depth > 1 && searcher.clock.soft_expired() {
                break;
            }

            searcher.age = u16::from(depth);
            let outcome = searcher.search_root(game_state, &root, depth);

            // A cut-short deeper pass is not comparable with the previous one.
            if !outcome.complete && depth > 1 {
                break;
            }
            if outcome.pv.is_empty() {
                break;
            }

            result.best_score = outcome.score;
            result.pv = outcome.pv;
            result.reached_depth = depth;
            if outcome.complete {
                searcher.stats.completed_depth = depth;
            }
            debug!(
                "depth {} score {} nodes {} pv {}",
                depth,
                result.best_score,
                searcher.stats.nodes,
                format_action_line(&result.pv)
            );

            if !outcome.complete {
                break;
            }

            sort_actions_deterministic(
                game_state,
                &mut root,
                &params.order,
                params.attack_damage,
            );
            if let Some(best) = result.pv.first() {
                prefer_best_move(&mut root, best);
            }
        }
    }

    result.elapsed = searcher.clock.elapsed();
    result.hard_stopped = searcher.hard_stop;
    result.stats = searcher.stats;
    result.nodes = searcher.stats.nodes;

    info!(
        "search done: depth={} score={} nodes={} time={:.2}ms nps={:.0} pv={}",
        result.reached_depth,
        result.best_score,
        result.nodes,
        result.elapsed_ms(),
        result.nps(),
        result.pv_line()
    );
    result
}

/// Single full-window alpha-beta pass at a fixed depth, without the root
/// driver. The table is optional.
pub fn search_fixed_depth<R: RuleEngine>(
    rules: &R,
    game_state: &mut GameState,
    depth: u8,
    params: &SearchParams,
    tt: Option<&mut TranspositionTable>,
) -> SearchResult {
    let mut searcher = Searcher::new(rules, params, tt);
    searcher.age = u16::from(depth);

    let mut pv = Vec::new();
    let score = searcher.alpha_beta(game_state, depth, -INF, INF, &mut pv);
    if !searcher.hard_stop {
        searcher.stats.completed_depth = depth;
    }

    SearchResult {
        best_score: score,
        pv,
        reached_depth: searcher.stats.completed_depth,
        nodes: searcher.stats.nodes,
        elapsed: searcher.clock.elapsed(),
        hard_stopped: searcher.hard_stop,
        stats: searcher.stats,
    }
}
