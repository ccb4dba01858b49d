//! Configuration handling
//!
//! Reads `gridbind.toml` from the config directory. A missing file means all
//! defaults.
//!
//! ## Environment Variables
//!
//! The following environment variables override config file settings:
//!
//! - `GRIDBIND_SEED_COUNT` - Number of synthetic orders
//! - `GRIDBIND_RNG_SEED` - Fixed seed for customer codes
//! - `GRIDBIND_SEARCH_IGNORE_CASE` - Default search case folding (`true`/`false`)
//!
//! These can be set in a `.env` file in the config directory.

use gridbind_core::EngineOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::seed::SeedConfig;

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "gridbind.toml";

/// Environment variable names
pub const ENV_SEED_COUNT: &str = "GRIDBIND_SEED_COUNT";
pub const ENV_RNG_SEED: &str = "GRIDBIND_RNG_SEED";
pub const ENV_SEARCH_IGNORE_CASE: &str = "GRIDBIND_SEARCH_IGNORE_CASE";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Synthetic data settings
    #[serde(default)]
    pub seed: SeedConfig,
    /// Query engine settings
    #[serde(default)]
    pub engine: EngineOptions,
}

impl Config {
    /// Load configuration from a directory
    ///
    /// This also loads any `.env` file in the directory and applies
    /// environment variable overrides.
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let env_path = dir.join(".env");
        if env_path.exists() {
            let _ = dotenvy::from_path(&env_path);
        }

        let mut config = Self::from_file(dir)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse the config file alone, without environment overrides.
    pub fn from_file(dir: &Path) -> anyhow::Result<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            tracing::debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, dir.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("{}: {}", config_path.display(), e))?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(count) = std::env::var(ENV_SEED_COUNT) {
            match count.parse::<usize>() {
                Ok(count) => self.seed.count = count,
                Err(_) => tracing::warn!("Ignoring {}={:?}", ENV_SEED_COUNT, count),
            }
        }

        if let Ok(seed) = std::env::var(ENV_RNG_SEED) {
            match seed.parse::<u64>() {
                Ok(seed) => self.seed.rng_seed = Some(seed),
                Err(_) => tracing::warn!("Ignoring {}={:?}", ENV_RNG_SEED, seed),
            }
        }

        if let Ok(flag) = std::env::var(ENV_SEARCH_IGNORE_CASE) {
            match flag.parse::<bool>() {
                Ok(flag) => self.engine.search_ignore_case = flag,
                Err(_) => tracing::warn!("Ignoring {}={:?}", ENV_SEARCH_IGNORE_CASE, flag),
            }
        }
    }

    /// Save configuration to a directory
    pub fn save(&self, dir: &Path) -> anyhow::Result<()> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }
}
