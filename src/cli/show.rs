use crate::config::Config;
use crate::error::Result;
use crate::strategy::{Strategy, StrategyId};
use clap::Subcommand;
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum ShowResource {
    /// Show the configuration file path
    Paths,
    /// List the available strategies and their defaults
    Strategies,
}

impl ShowResource {
    pub fn execute(&self) -> Result<()> {
        match self {
            ShowResource::Paths => show_paths(),
            ShowResource::Strategies => show_strategies(),
        }
    }
}

fn show_paths() -> Result<()> {
    let config_path = Config::config_file()?;

    info!(path = ?config_path, "Config path");

    Ok(())
}

fn show_strategies() -> Result<()> {
    for id in StrategyId::ALL {
        let strategy = Strategy::get(id);
        info!(
            id = %strategy.id,
            title = strategy.title,
            tolerance_bs = %strategy.tolerance_bs,
            tolerance_usd = %strategy.tolerance_usd,
            max_group_size = strategy.max_group_size,
            sheet = strategy.report.pending_sheet,
            "Strategy"
        );
    }

    Ok(())
}
