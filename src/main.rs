use std::path::PathBuf;

use anyhow::{anyhow, Result};
use dotenv::dotenv;
use env_logger::Env;

use thermodog::{command, node_mgmt};

const LOG_LEVEL_ENV_VAR: &str = "LOGGING_LEVEL";
const DEFAULT_LOG_LEVEL: &str = "info";

fn main() -> Result<()> {
    let _ = dotenv();
    env_logger::Builder::from_env(Env::default().filter_or(LOG_LEVEL_ENV_VAR, DEFAULT_LOG_LEVEL))
        .init();

    let mut args = pico_args::Arguments::from_env();
    let config_path: PathBuf = args.value_from_str("--config")?;
    let unexpected = args.finish();
    if !unexpected.is_empty() {
        return Err(anyhow!("Unexpected arguments: {:?}", unexpected));
    }

    let config = node_mgmt::config::from_file(&config_path)?;
    log::info!("Loaded configuration from {}", config_path.display());

    command::run(config)
}
