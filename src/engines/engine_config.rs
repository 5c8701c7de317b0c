//! Engine configuration: defaults, TOML loading, environment overrides,
//! named presets and the runtime option surface.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::engines::engine_trait::{EngineError, EngineResult};
use crate::engines::time_management::TimeBudget;
use crate::game_state::tactics_rules::DEFAULT_ATTACK_DAMAGE;
use crate::search::board_scoring::EvalWeights;
use crate::search::iterative_deepening::{SearchParams, DEFAULT_TT_MB};
use crate::search::move_ordering::OrderWeights;
use crate::search::transposition_table::MAX_TT_MB;

pub const DEFAULT_LOG_PATH: &str = "search.jsonl";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifficultyPreset {
    Easy,
    Normal,
    Hard,
}

impl FromStr for DifficultyPreset {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "normal" => Ok(Self::Normal),
            "hard" => Ok(Self::Hard),
            _ => Err(EngineError::UnknownPreset(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalProfile {
    Balanced,
    Aggressive,
    Defensive,
}

impl EvalProfile {
    pub fn weights(self) -> EvalWeights {
        let (hp, pos, threat_for, threat_against, cohesion) = match self {
            Self::Balanced => (100, 3, 25, 35, 2),
            Self::Aggressive => (100, 5, 40, 25, 1),
            Self::Defensive => (100, 2, 20, 45, 3),
        };
        EvalWeights {
            hp,
            pos,
            threat_for,
            threat_against,
            cohesion,
        }
    }
}

impl FromStr for EvalProfile {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "balanced" => Ok(Self::Balanced),
            "aggressive" => Ok(Self::Aggressive),
            "defensive" => Ok(Self::Defensive),
            _ => Err(EngineError::UnknownPreset(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub eval: EvalWeights,
    pub order: OrderWeights,
    pub soft_ms: u64,
    pub hard_ms: u64,
    pub max_depth: u8,
    pub root_k: Option<usize>,
    pub node_k: Option<usize>,
    pub max_nodes: Option<u64>,
    pub dedup: bool,
    pub strict_quiescence: bool,
    pub epsilon: u8,
    pub noise_seed: u64,
    pub attack_damage: i32,
    pub tt_size_mb: usize,
    pub log_search: bool,
    pub log_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let search = SearchParams::default();
        Self {
            eval: search.eval,
            order: search.order,
            soft_ms: search.budget.soft_ms,
            hard_ms: search.budget.hard_ms,
            max_depth: search.max_depth,
            root_k: search.root_k,
            node_k: search.node_k,
            max_nodes: search.max_nodes,
            dedup: search.dedup,
            strict_quiescence: search.strict_quiescence,
            epsilon: search.epsilon,
            noise_seed: search.noise_seed,
            attack_damage: DEFAULT_ATTACK_DAMAGE,
            tt_size_mb: DEFAULT_TT_MB,
            log_search: false,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
        }
    }
}

/// Parse and assign an environment value, ignoring unparsable input.
macro_rules! env_override {
    ($lookup:expr, $target:expr, $key:expr) => {
        if let Some(raw) = $lookup($key) {
            match raw.trim().parse() {
                Ok(v) => $target = v,
                Err(_) => warn!("ignoring {}={}: not a valid value", $key, raw),
            }
        }
    };
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

/// Zero disables a breadth cap.
fn parse_cap(raw: &str) -> Option<Option<usize>> {
    raw.trim()
        .parse::<usize>()
        .ok()
        .map(|k| if k == 0 { None } else { Some(k) })
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> EngineResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a TOML file, then apply environment overrides.
    pub fn load_from_path(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        info!("loaded engine config from {}", path.display());
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply `TACTICS_*` overrides using `lookup` as the variable source.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        env_override!(lookup, self.soft_ms, "TACTICS_SOFT_MS");
        env_override!(lookup, self.hard_ms, "TACTICS_HARD_MS");
        env_override!(lookup, self.max_depth, "TACTICS_MAX_DEPTH");
        env_override!(lookup, self.tt_size_mb, "TACTICS_TT_MB");
        env_override!(lookup, self.epsilon, "TACTICS_EPSILON");
        env_override!(lookup, self.noise_seed, "TACTICS_NOISE_SEED");
        self.epsilon = self.epsilon.min(100);
        if self.tt_size_mb > MAX_TT_MB {
            warn!("TACTICS_TT_MB={} exceeds {} MB, clamped", self.tt_size_mb, MAX_TT_MB);
            self.tt_size_mb = MAX_TT_MB;
        }
    }

    pub fn apply_difficulty(&mut self, preset: DifficultyPreset) {
        let (soft, hard, depth, root_k, node_k) = match preset {
            DifficultyPreset::Easy => (150, 180, 4, Some(8), Some(6)),
            DifficultyPreset::Normal => (300, 350, 5, None, None),
            DifficultyPreset::Hard => (500, 600, 7, Some(16), Some(12)),
        };
        self.soft_ms = soft;
        self.hard_ms = hard;
        self.max_depth = depth;
        self.root_k = root_k;
        self.node_k = node_k;
        debug!("difficulty preset {:?} applied", preset);
    }

    pub fn apply_eval_profile(&mut self, profile: EvalProfile) {
        self.eval = profile.weights();
        debug!("evaluation profile {:?} applied", profile);
    }

    /// Snapshot of the search-relevant knobs.
    pub fn search_params(&self) -> SearchParams {
        SearchParams {
            budget: TimeBudget::new(self.soft_ms, self.hard_ms),
            max_depth: self.max_depth,
            root_k: self.root_k,
            node_k: self.node_k,
            max_nodes: self.max_nodes,
            dedup: self.dedup,
            strict_quiescence: self.strict_quiescence,
            epsilon: self.epsilon.min(100),
            noise_seed: self.noise_seed,
            attack_damage: self.attack_damage,
            eval: self.eval,
            order: self.order,
        }
    }

    /// Set one option by its console name.
    pub fn set_option(&mut self, name: &str, value: &str) -> EngineResult<()> {
        let invalid = || EngineError::InvalidOptionValue {
            name: name.to_owned(),
            value: value.to_owned(),
        };
        let int = || value.trim().parse::<i32>().map_err(|_| invalid());
        let ms = || value.trim().parse::<u64>().map_err(|_| invalid());

        match name {
            "W_HP" => self.eval.hp = int()?,
            "W_Pos" => self.eval.pos = int()?,
            "W_ThreatFor" => self.eval.threat_for = int()?,
            "W_ThreatAgainst" => self.eval.threat_against = int()?,
            "W_Coh" => self.eval.cohesion = int()?,
            "OrderPos" => self.order.pos = int()?,
            "OrderThreat" => self.order.threat = int()?,
            "OrderCost" => self.order.cost = int()?,
            "OrderEndTurnBias" => self.order.end_turn_bias = int()?,
            "QStrict" => self.strict_quiescence = parse_flag(value).ok_or_else(invalid)?,
            "Dedup" => self.dedup = parse_flag(value).ok_or_else(invalid)?,
            "LogSearch" => self.log_search = parse_flag(value).ok_or_else(invalid)?,
            "LogPath" => {
                if value.trim().is_empty() {
                    return Err(invalid());
                }
                self.log_path = PathBuf::from(value.trim());
            }
            "Epsilon" => {
                let pct = int()?;
                self.epsilon = pct.clamp(0, 100) as u8;
            }
            "NoiseSeed" => self.noise_seed = ms()?,
            "TTSizeMB" => {
                let mb: usize = value.trim().parse().map_err(|_| invalid())?;
                if mb > MAX_TT_MB {
                    return Err(invalid());
                }
                self.tt_size_mb = mb;
            }
            "SoftMs" => self.soft_ms = ms()?,
            "HardMs" => self.hard_ms = ms()?,
            "MaxDepth" => self.max_depth = value.trim().parse().map_err(|_| invalid())?,
            "RootK" => self.root_k = parse_cap(value).ok_or_else(invalid)?,
            "NodeK" => self.node_k = parse_cap(value).ok_or_else(invalid)?,
            "MaxNodes" => {
                let cap = ms()?;
                self.max_nodes = (cap > 0).then_some(cap);
            }
            "Difficulty" => self.apply_difficulty(value.trim().parse()?),
            "EvalProfile" => self.apply_eval_profile(value.trim().parse()?),
            _ => return Err(EngineError::UnknownOption(name.to_owned())),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_match_search_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.search_params(), SearchParams::default());
        assert_eq!(config.tt_size_mb, 64);
        assert!(!config.log_search);
        assert_eq!(config.log_path, PathBuf::from("search.jsonl"));
    }

    #[test]
    fn toml_fills_missing_fields_with_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            soft_ms = 100
            max_depth = 3
            root_k = 4

            [eval]
            hp = 50
            "#,
        )
        .expect("config should parse");
        assert_eq!(config.soft_ms, 100);
        assert_eq!(config.hard_ms, 350);
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.root_k, Some(4));
        assert_eq!(config.eval.hp, 50);
        assert_eq!(config.eval.pos, 3);
        assert_eq!(config.order, OrderWeights::default());
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(matches!(
            EngineConfig::from_toml_str("soft_ms = \"soon\""),
            Err(EngineError::ConfigParse(_))
        ));
        assert!(matches!(
            EngineConfig::load_from_path(Path::new("/nonexistent/tactics.toml")),
            Err(EngineError::ConfigRead { .. })
        ));
    }

    #[test]
    fn overrides_apply_and_skip_garbage() {
        let vars: HashMap<&str, &str> = [
            ("TACTICS_SOFT_MS", "42"),
            ("TACTICS_MAX_DEPTH", "deep"),
            ("TACTICS_EPSILON", "250"),
        ]
        .into_iter()
        .collect();

        let mut config = EngineConfig::default();
        config.apply_overrides_from(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.soft_ms, 42);
        assert_eq!(config.max_depth, 5);
        assert_eq!(config.epsilon, 100);
    }

    #[test]
    fn oversized_tables_are_refused_or_clamped() {
        let mut config = EngineConfig::default();
        assert!(matches!(
            config.set_option("TTSizeMB", "18446744073709551615"),
            Err(EngineError::InvalidOptionValue { .. })
        ));
        assert_eq!(config.tt_size_mb, 64);
        config.set_option("TTSizeMB", &MAX_TT_MB.to_string()).expect("largest size");
        assert_eq!(config.tt_size_mb, MAX_TT_MB);

        let mut config = EngineConfig::default();
        config.apply_overrides_from(|k| (k == "TACTICS_TT_MB").then(|| "999999999".to_owned()));
        assert_eq!(config.tt_size_mb, MAX_TT_MB);
    }

    #[test]
    fn presets_bulk_set_knobs() {
        let mut config = EngineConfig::default();
        config.set_option("Difficulty", "easy").expect("preset");
        assert_eq!(
            (config.soft_ms, config.hard_ms, config.max_depth, config.root_k, config.node_k),
            (150, 180, 4, Some(8), Some(6))
        );
        config.set_option("Difficulty", "normal").expect("preset");
        assert_eq!((config.root_k, config.node_k), (None, None));

        config.set_option("EvalProfile", "aggressive").expect("profile");
        assert_eq!(config.eval, EvalProfile::Aggressive.weights());
        assert!(matches!(
            config.set_option("Difficulty", "brutal"),
            Err(EngineError::UnknownPreset(_))
        ));
    }

    #[test]
    fn options_parse_by_console_name() {
        let mut config = EngineConfig::default();
        config.set_option("W_ThreatAgainst", "50").expect("weight");
        config.set_option("QStrict", "0").expect("flag");
        config.set_option("Epsilon", "150").expect("epsilon");
        config.set_option("RootK", "0").expect("cap");
        config.set_option("NodeK", "5").expect("cap");
        config.set_option("MaxNodes", "5000").expect("node budget");
        assert_eq!(config.search_params().max_nodes, Some(5000));
        config.set_option("MaxNodes", "0").expect("node budget");
        assert_eq!(config.max_nodes, None);
        assert_eq!(config.eval.threat_against, 50);
        assert!(!config.strict_quiescence);
        assert_eq!(config.epsilon, 100);
        assert_eq!(config.root_k, None);
        assert_eq!(config.node_k, Some(5));

        assert!(matches!(
            config.set_option("Dedup", "maybe"),
            Err(EngineError::InvalidOptionValue { .. })
        ));
        assert!(matches!(
            config.set_option("Bogus", "1"),
            Err(EngineError::UnknownOption(_))
        ));
    }
}
