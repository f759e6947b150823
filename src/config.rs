use crate::error::{AppError, Result};
use crate::strategy::{
    DEFAULT_MAX_GROUP_SIZE, DEFAULT_PRUNE_CUTOFF, DEFAULT_TOLERANCE_BS, DEFAULT_TOLERANCE_USD,
    Strategy, StrategyId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const CONFIG_DIR_PREFIX: &str = "ledger-reconciler";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub report: ReportConfig,
    pub reconcile: ReconcileConfig,
}

/// Banner metadata for the report.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ReportConfig {
    pub company: String,
    pub account: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ReconcileConfig {
    pub strategy: StrategyId,
    pub tolerance_bs: Decimal,
    pub tolerance_usd: Decimal,
    pub max_group_size: usize,
    pub prune_cutoff: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyId::FondosTransito,
            tolerance_bs: DEFAULT_TOLERANCE_BS,
            tolerance_usd: DEFAULT_TOLERANCE_USD,
            max_group_size: DEFAULT_MAX_GROUP_SIZE,
            prune_cutoff: DEFAULT_PRUNE_CUTOFF,
        }
    }
}

impl ReconcileConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tolerance_bs.is_sign_negative() || self.tolerance_usd.is_sign_negative() {
            return Err(AppError::Config(format!(
                "Tolerances must not be negative (tolerance_bs = {}, tolerance_usd = {})",
                self.tolerance_bs, self.tolerance_usd
            )));
        }
        if self.max_group_size < 2 {
            return Err(AppError::Config(format!(
                "max_group_size must be at least 2, got {}",
                self.max_group_size
            )));
        }
        Ok(())
    }

    /// Registry strategy with the configured knobs applied.
    pub fn strategy(&self) -> Strategy {
        Strategy::get(self.strategy)
            .with_tolerances(self.tolerance_bs, self.tolerance_usd)
            .with_max_group_size(self.max_group_size)
            .with_prune_cutoff(self.prune_cutoff)
    }
}

impl Config {
    /// Read the config file, falling back to defaults when there is none.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file()?;

        if !config_path.exists() {
            debug!(path = ?config_path, "No config file, using defaults");
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a config file. An unknown `reconcile.strategy`
    /// is reported as [`AppError::StrategyUnknown`], as on the command line.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(contents).map_err(parse_error)?;
        if let Some(name) = table
            .get("reconcile")
            .and_then(|reconcile| reconcile.get("strategy"))
            .and_then(toml::Value::as_str)
        {
            name.parse::<StrategyId>()?;
        }

        let config: Config = toml::from_str(contents).map_err(parse_error)?;
        config.reconcile.validate()?;
        Ok(config)
    }

    fn xdg_dirs() -> xdg::BaseDirectories {
        xdg::BaseDirectories::with_prefix(CONFIG_DIR_PREFIX)
    }

    /// Get the config file path
    pub fn config_file() -> Result<PathBuf> {
        let xdg_dirs = Self::xdg_dirs();
        xdg_dirs
            .place_config_file("config.toml")
            .map_err(|e| AppError::Config(format!("Failed to create config directory: {}", e)))
    }
}

fn parse_error(e: toml::de::Error) -> AppError {
    AppError::Config(format!("Failed to parse config: {}", e))
}
