mod run;
mod show;

use crate::error::Result;
use clap::{Parser, Subcommand};

pub use run::RunArgs;
pub use show::ShowResource;

#[derive(Parser, Debug)]
#[command(name = "ledger-reconciler")]
#[command(about = "Reconcile dual-currency ledger accounts and report open balances", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Run(args) => args.execute(),
            Commands::Show { resource } => resource.execute(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile a prior and a current ledger dump
    Run(RunArgs),
    Show {
        #[command(subcommand)]
        resource: ShowResource,
    },
}
