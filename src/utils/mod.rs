pub mod codec;

use anyhow::{Context, Result};
use config::{Config as ConfigLoader, Environment, File};
use std::path::Path;
use tracing::info;

use crate::models::common::Config;

pub fn load_config<P: AsRef<Path>>(file_name: P) -> Result<Config> {
    let config_path = file_name.as_ref();
    info!("Config path: {}", config_path.to_string_lossy());

    // YAML file first, then NORMALIZER__* environment overrides
    let loader = ConfigLoader::builder()
        .add_source(File::from(config_path))
        .add_source(Environment::with_prefix("NORMALIZER").separator("__"))
        .build()
        .context("failed to read config file")?;

    let mut config: Config = loader
        .try_deserialize()
        .context("failed to parse config YAML")?;

    // Convert hyphens to underscores in all relevant fields
    config.chain_name = config.chain_name.replace('-', "_");
    config.validate()?;

    Ok(config)
}
