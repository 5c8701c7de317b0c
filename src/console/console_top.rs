//! Line-oriented console front-end and command loop.
//!
//! Reads one command per line, runs diagnostics or searches on the built-in
//! sample positions, and writes plain-text responses.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use crate::actions::action::format_action_line;
use crate::engines::engine_config::EngineConfig;
use crate::engines::engine_greedy::GreedyEngine;
use crate::engines::engine_iterative::IterativeEngine;
use crate::engines::engine_trait::{Engine, EngineOutput, TurnRequest};
use crate::game_state::game_state::GameState;
use crate::move_generation::perft::{perft, perft_counts, perft_divide};
use crate::move_generation::team_pool_rules::TeamPoolRules;
use crate::move_generation::undo_check::{demo, undo_check};
use crate::move_generation::unit_ap_rules::BasicRules;
use crate::utils::render_game_state::{render_game_state, render_roster};
use crate::utils::sample_positions::{four_unit_team_pool, two_unit_skirmish};

const UNDO_CHECK_SEED: u64 = 0x5EED_FAC7;

pub fn run_stdio_loop(config: EngineConfig) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut console = ConsoleState::new(config);

    for line in stdin.lock().lines() {
        let line = line?;
        let should_quit = console.handle_command(&line, &mut stdout)?;
        stdout.flush()?;
        if should_quit {
            break;
        }
    }

    Ok(())
}

pub struct ConsoleState {
    unit_state: GameState,
    pool_state: GameState,
    engine: IterativeEngine,
}

fn arg<T: FromStr>(parts: &[&str], idx: usize) -> Option<T> {
    parts.get(idx).and_then(|s| s.parse().ok())
}

impl ConsoleState {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            unit_state: two_unit_skirmish(),
            pool_state: four_unit_team_pool(),
            engine: IterativeEngine::new(config),
        }
    }

    /// Handle one command line. Returns `true` on `quit`.
    pub fn handle_command(&mut self, line: &str, out: &mut impl Write) -> io::Result<bool> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(&cmd) = parts.first() else {
            return Ok(false);
        };

        match cmd {
            "demo" => {
                let report = demo(&BasicRules::default(), &mut self.unit_state);
                writeln!(out, "{}", render_game_state(&self.unit_state))?;
                writeln!(out, "legal actions: {}", report.legal_actions)?;
                match report.first_action {
                    Some(first) => writeln!(
                        out,
                        "first {}: key {:#018x} -> {:#018x} -> {:#018x}",
                        first,
                        report.key_before,
                        report.key_after_make.unwrap_or_default(),
                        report.key_after_unmake.unwrap_or_default()
                    )?,
                    None => writeln!(out, "no legal action")?,
                }
            }
            "perft" => {
                let depth = arg(&parts, 1).unwrap_or(1);
                let counts = perft_counts(&BasicRules::default(), &mut self.unit_state, depth);
                writeln!(
                    out,
                    "perft {}: nodes {} moves {} attacks {} kills {} passes {}",
                    depth, counts.nodes, counts.moves, counts.attacks, counts.kills, counts.passes
                )?;
            }
            "divide" => {
                let depth = arg(&parts, 1).unwrap_or(1);
                let rules = BasicRules::default();
                for (action, nodes) in perft_divide(&rules, &mut self.unit_state, depth) {
                    writeln!(out, "{action}: {nodes}")?;
                }
                writeln!(out, "total: {}", perft(&rules, &mut self.unit_state, depth))?;
            }
            "undocheck" => {
                let steps = arg(&parts, 1).unwrap_or(1_000);
                let a = undo_check(&BasicRules::default(), &mut self.unit_state, steps, UNDO_CHECK_SEED);
                let b = undo_check(&TeamPoolRules::default(), &mut self.pool_state, steps, UNDO_CHECK_SEED);
                for (label, report) in [("unit-ap", a), ("team-pool", b)] {
                    match report.mismatch {
                        None => writeln!(out, "undocheck {label}: ok ({} steps)", report.steps_run)?,
                        Some(m) => writeln!(
                            out,
                            "undocheck {label}: mismatch at step {} ({:?}) expected {:#018x} got {:#018x}",
                            m.step, m.kind, m.expected_key, m.actual_key
                        )?,
                    }
                }
            }
            "greedy" => {
                let mut greedy = GreedyEngine::new(arg(&parts, 1).unwrap_or(8));
                let output = greedy.choose_line(&TeamPoolRules::default(), &mut self.pool_state, &TurnRequest::default());
                write_output(out, &output)?;
            }
            "search" => {
                let request = TurnRequest {
                    soft_ms: arg(&parts, 1),
                    hard_ms: arg(&parts, 2),
                    max_depth: arg(&parts, 3),
                    root_k: arg(&parts, 4),
                    node_k: arg(&parts, 5),
                };
                let output = self
                    .engine
                    .choose_line(&BasicRules::default(), &mut self.unit_state, &request);
                write_output(out, &output)?;
            }
            "searchutbg" => {
                let request = TurnRequest {
                    soft_ms: arg(&parts, 1),
                    hard_ms: arg(&parts, 2),
                    max_depth: arg(&parts, 3),
                    ..TurnRequest::default()
                };
                let output = self.engine.choose_team_pool_line(
                    &TeamPoolRules::default(),
                    &mut self.pool_state,
                    &request,
                );
                write_output(out, &output)?;
            }
            "difficulty" => self.set_option_reply("Difficulty", parts.get(1).copied(), out)?,
            "evalprofile" => self.set_option_reply("EvalProfile", parts.get(1).copied(), out)?,
            "ttresize" => match arg::<usize>(&parts, 1) {
                Some(mb) => {
                    self.engine.resize_tt(mb);
                    let tt = self.engine.context().tt();
                    writeln!(out, "tt {} MB, {} buckets", tt.size_mb(), tt.len())?;
                }
                None => writeln!(out, "usage: ttresize <mb>")?,
            },
            "setoption" => {
                let name = parts.get(1).copied().unwrap_or_default();
                let value = parts.get(2..).map(|v| v.join(" "));
                self.set_option_reply(name, value.as_deref(), out)?;
            }
            "show" => {
                for state in [&self.unit_state, &self.pool_state] {
                    writeln!(out, "{}", render_game_state(state))?;
                    writeln!(out, "{}", render_roster(state))?;
                }
            }
            "quit" => return Ok(true),
            _ => writeln!(out, "unknown command: {cmd}")?,
        }

        Ok(false)
    }

    fn set_option_reply(&mut self, name: &str, value: Option<&str>, out: &mut impl Write) -> io::Result<()> {
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            return writeln!(out, "usage: {} <value>", if name.is_empty() { "setoption <name>" } else { name });
        };
        match self.engine.set_option(name, value) {
            Ok(()) => writeln!(out, "{name} = {value}"),
            Err(e) => writeln!(out, "error: {e}"),
        }
    }
}

fn write_output(out: &mut impl Write, output: &EngineOutput) -> io::Result<()> {
    for line in &output.info_lines {
        writeln!(out, "{line}")?;
    }
    writeln!(out, "line: {}", format_action_line(&output.line))
}
