use crate::config::{Config, ReconcileConfig};
use crate::engine::ReconcileEngine;
use crate::error::Result;
use crate::ledger::FileLedger;
use crate::reconcile::CancellationToken;
use crate::report::{ReportContext, WorkbookReporter};
use crate::strategy::StrategyId;
use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Prior period ledger dump (.csv, .txt, .xlsx, .xls)
    #[arg(long)]
    pub prior: PathBuf,

    /// Current period ledger dump
    #[arg(long)]
    pub current: PathBuf,

    /// Directory the report files are written to
    #[arg(long, short)]
    pub output: PathBuf,

    /// fondos_transito, fondos_depositar or devoluciones_proveedores
    #[arg(long)]
    pub strategy: Option<String>,

    #[arg(long)]
    pub tolerance_bs: Option<Decimal>,

    #[arg(long)]
    pub tolerance_usd: Option<Decimal>,

    #[arg(long)]
    pub max_group_size: Option<usize>,

    /// Closing date shown in the report banner (dd/mm/yyyy)
    #[arg(long, value_parser = parse_period_end)]
    pub period_end: Option<NaiveDate>,

    /// Give up matching after this many seconds
    #[arg(long, value_name = "SECS")]
    pub time_limit: Option<u64>,

    /// Also write a JSON run summary
    #[arg(long)]
    pub json: bool,
}

fn parse_period_end(value: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%d/%m/%Y")
        .map_err(|e| format!("expected dd/mm/yyyy: {e}"))
}

impl RunArgs {
    pub fn execute(&self) -> Result<()> {
        let config = Config::load()?;
        let reconcile = self.apply(config.reconcile)?;

        let context = ReportContext {
            company: config.report.company,
            account: config.report.account,
            period_end: self.period_end,
        };
        let source = FileLedger {
            prior: self.prior.clone(),
            current: self.current.clone(),
        };
        let reporter = WorkbookReporter::new(&self.output, self.json);
        let cancel = match self.time_limit {
            Some(secs) => CancellationToken::with_time_limit(Duration::from_secs(secs)),
            None => CancellationToken::new(),
        };

        let engine = ReconcileEngine::new(reconcile.strategy(), context, source, reporter)
            .with_cancellation(cancel);
        let summary = engine.run()?;

        info!(
            strategy = %summary.strategy,
            groups = summary.groups.len(),
            open = summary.open,
            output = %self.output.display(),
            "Run completed"
        );

        Ok(())
    }

    /// Layer the command-line overrides on top of the configured values.
    fn apply(&self, mut reconcile: ReconcileConfig) -> Result<ReconcileConfig> {
        if let Some(strategy) = &self.strategy {
            reconcile.strategy = strategy.parse::<StrategyId>()?;
        }
        if let Some(tolerance) = self.tolerance_bs {
            reconcile.tolerance_bs = tolerance;
        }
        if let Some(tolerance) = self.tolerance_usd {
            reconcile.tolerance_usd = tolerance;
        }
        if let Some(size) = self.max_group_size {
            reconcile.max_group_size = size;
        }
        reconcile.validate()?;
        Ok(reconcile)
    }
}
