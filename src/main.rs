use std::path::Path;
use std::process::ExitCode;

use log::{error, info};
use tactics_core::console::console_top::run_stdio_loop;
use tactics_core::engines::engine_config::EngineConfig;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Optional first argument: path to a TOML engine config.
    let config = match std::env::args().nth(1) {
        Some(path) => match EngineConfig::load_from_path(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => {
                error!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => {
            let mut config = EngineConfig::default();
            config.apply_env_overrides();
            config
        }
    };
    info!(
        "tactics console ready: soft {} ms, hard {} ms, depth {}",
        config.soft_ms, config.hard_ms, config.max_depth
    );

    match run_stdio_loop(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("console i/o: {e}");
            ExitCode::FAILURE
        }
    }
}
