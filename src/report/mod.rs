pub mod carry_forward;
mod formatting;
pub mod layout;
pub mod summary;
pub mod workbook;
pub mod writer;

pub use summary::RunSummary;

use crate::error::{Diagnostics, Result};
use crate::models::Movement;
use crate::reconcile::Reconciliation;
use crate::strategy::Strategy;
use chrono::NaiveDate;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Banner metadata printed above every sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportContext {
    pub company: String,
    pub account: String,
    /// Period closing date; the latest movement date when unset.
    pub period_end: Option<NaiveDate>,
}

/// Everything a reporter sees of a finished run.
#[derive(Debug, Clone, Copy)]
pub struct RunReport<'a> {
    pub pool: &'a [Movement],
    /// Pool indices of the movements left open.
    pub open: &'a [usize],
    pub reconciliation: &'a Reconciliation,
    pub strategy: &'a Strategy,
    pub diagnostics: &'a Diagnostics,
    pub context: &'a ReportContext,
}

pub trait Reporter {
    fn report(&self, run: &RunReport<'_>) -> Result<()>;
}

/// Writes the workbook, the carry-forward file and optionally the JSON
/// summary into one directory.
#[derive(Debug, Clone)]
pub struct WorkbookReporter {
    pub output_dir: PathBuf,
    pub json: bool,
}

impl WorkbookReporter {
    pub fn new(output_dir: impl Into<PathBuf>, json: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            json,
        }
    }

    pub fn workbook_path(&self, strategy: &Strategy) -> PathBuf {
        self.output_dir
            .join(format!("conciliacion_{}.xml", strategy.id))
    }

    pub fn carry_forward_path(&self, strategy: &Strategy) -> PathBuf {
        self.output_dir
            .join(format!("saldos_pendientes_{}.csv", strategy.id))
    }

    pub fn summary_path(&self, strategy: &Strategy) -> PathBuf {
        self.output_dir
            .join(format!("resumen_{}.json", strategy.id))
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}

impl Reporter for WorkbookReporter {
    #[instrument(name = "Writing report", skip_all, fields(dir = %self.output_dir.display()))]
    fn report(&self, run: &RunReport<'_>) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir)?;

        let workbook = layout::build_workbook(run);
        let path = self.workbook_path(run.strategy);
        let mut file = create(&path)?;
        writer::write_workbook(&mut file, &workbook)?;
        file.flush()?;
        info!(path = %path.display(), sheets = workbook.sheets.len(), "Workbook written");

        let path = self.carry_forward_path(run.strategy);
        let mut file = create(&path)?;
        carry_forward::write_carry_forward(&mut file, run.pool, run.open)?;
        file.flush()?;
        info!(path = %path.display(), rows = run.open.len(), "Carry-forward written");

        if self.json {
            let path = self.summary_path(run.strategy);
            let mut file = create(&path)?;
            RunSummary::new(run).write(&mut file)?;
            file.flush()?;
            info!(path = %path.display(), "Summary written");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::movement::test_helpers::{mock_date, mock_movement};
    use crate::reconcile::{CancellationToken, open_indices, reconcile};
    use crate::strategy::StrategyId;
    use rust_decimal::prelude::dec;

    #[test]
    fn test_workbook_reporter_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");
        let mut pool = vec![
            mock_movement("M1", dec!(100.00), dec!(3500.00), mock_date(2024, 1, 10)),
            mock_movement("M2", dec!(-100.00), dec!(-3500.00), mock_date(2024, 1, 11)),
            mock_movement("M3", dec!(40), dec!(1400), mock_date(2024, 1, 20)),
        ];
        let strategy = Strategy::get(StrategyId::FondosDepositar);
        let reconciliation = reconcile(&mut pool, &strategy, &CancellationToken::new()).unwrap();
        let open = open_indices(&pool);
        let reporter = WorkbookReporter::new(&output, true);

        reporter
            .report(&RunReport {
                pool: &pool,
                open: &open,
                reconciliation: &reconciliation,
                strategy: &strategy,
                diagnostics: &Diagnostics::default(),
                context: &ReportContext::default(),
            })
            .unwrap();

        let xml = std::fs::read_to_string(output.join("conciliacion_fondos_depositar.xml")).unwrap();
        assert!(xml.contains(r#"ss:Name="Pendientes por Depositar""#));
        let carry = std::fs::read_to_string(output.join("saldos_pendientes_fondos_depositar.csv")).unwrap();
        assert_eq!(carry.lines().count(), 2);
        assert!(output.join("resumen_fondos_depositar.json").exists());
    }

    #[test]
    fn test_summary_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = Strategy::get(StrategyId::FondosTransito);
        let reconciliation = Reconciliation {
            groups: vec![],
            complete: true,
        };
        let reporter = WorkbookReporter::new(dir.path(), false);

        reporter
            .report(&RunReport {
                pool: &[],
                open: &[],
                reconciliation: &reconciliation,
                strategy: &strategy,
                diagnostics: &Diagnostics::default(),
                context: &ReportContext::default(),
            })
            .unwrap();

        assert!(reporter.workbook_path(&strategy).exists());
        assert!(!reporter.summary_path(&strategy).exists());
    }
}
