use crate::error::{AppError, Diagnostics, Result};
use crate::ledger::LedgerSource;
use crate::models::Period;
use crate::reconcile::{CancellationToken, open_indices, reconcile};
use crate::report::{ReportContext, Reporter, RunReport, RunSummary};
use crate::strategy::Strategy;
use crate::unify::unify;
use tracing::{info, instrument};

/// Runs one reconciliation: load both periods, unify, match, report.
pub struct ReconcileEngine<S, R> {
    strategy: Strategy,
    context: ReportContext,
    source: S,
    reporter: R,
    cancel: CancellationToken,
}

impl<S, R> ReconcileEngine<S, R>
where
    S: LedgerSource,
    R: Reporter,
{
    pub fn new(strategy: Strategy, context: ReportContext, source: S, reporter: R) -> Self {
        Self {
            strategy,
            context,
            source,
            reporter,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(self, cancel: CancellationToken) -> Self {
        Self { cancel, ..self }
    }

    /// Returns the run summary, or [`AppError::Cancelled`] without
    /// reporting when the matcher did not finish.
    #[instrument(name = "Reconcile", skip_all, fields(strategy = %self.strategy.id))]
    pub fn run(&self) -> Result<RunSummary> {
        let prior = self.source.load(Period::Prior)?;
        let current = self.source.load(Period::Current)?;

        let mut diagnostics = Diagnostics::default();
        diagnostics.extend(prior.diagnostics);
        diagnostics.extend(current.diagnostics);

        let mut pool = unify(prior.movements, current.movements);
        let reconciliation = reconcile(&mut pool, &self.strategy, &self.cancel)?;
        if !reconciliation.complete {
            return Err(AppError::Cancelled);
        }

        let open = open_indices(&pool);
        let run = RunReport {
            pool: &pool,
            open: &open,
            reconciliation: &reconciliation,
            strategy: &self.strategy,
            diagnostics: &diagnostics,
            context: &self.context,
        };
        self.reporter.report(&run)?;

        let summary = RunSummary::new(&run);
        info!(
            groups = summary.groups.len(),
            reconciled = summary.reconciled,
            open = summary.open,
            warnings = summary.diagnostics.len(),
            "Reconciliation finished"
        );
        Ok(summary)
    }
}


#[cfg(test)]
mod tests {
    use super::mocks::*;
    use super::*;
    use crate::error::Warning;
    use crate::models::movement::test_helpers::{mock_date, mock_movement};
    use crate::strategy::StrategyId;
    use rust_decimal::prelude::dec;

    fn engine(
        source: MockLedgerSource,
        reporter: MockReporter,
    ) -> ReconcileEngine<MockLedgerSource, MockReporter> {
        ReconcileEngine::new(
            Strategy::get(StrategyId::FondosTransito),
            ReportContext::default(),
            source,
            reporter,
        )
    }

    #[test]
    fn test_run_matches_across_periods() {
        let reporter = MockReporter::default();
        let source = MockLedgerSource {
            prior: vec![mock_movement("A1", dec!(100), dec!(3500), mock_date(2023, 12, 28))],
            current: vec![
                mock_movement("A2", dec!(-100), dec!(-3500), mock_date(2024, 1, 3)),
                mock_movement("A3", dec!(25), dec!(900), mock_date(2024, 1, 9)),
            ],
            warnings: vec![],
        };

        let summary = engine(source, reporter.clone()).run().unwrap();

        assert!(summary.complete);
        assert_eq!(summary.groups.len(), 1);
        assert_eq!(summary.groups[0].members[0].period, Period::Prior);
        assert_eq!(summary.groups[0].members[1].period, Period::Current);
        assert_eq!(summary.open, 1);

        let reports = reporter.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].groups, 1);
        assert_eq!(reports[0].open, vec![2]);
        assert_eq!(reports[0].pool[2].entry, "A3");
    }

    #[test]
    fn test_run_collapses_duplicates() {
        let reporter = MockReporter::default();
        let carried = mock_movement("A1", dec!(100), dec!(3500), mock_date(2023, 12, 28));
        let source = MockLedgerSource {
            prior: vec![carried.clone()],
            current: vec![carried],
            warnings: vec![],
        };

        let summary = engine(source, reporter.clone()).run().unwrap();

        assert_eq!(summary.movements, 1);
        assert_eq!(summary.open, 1);
        assert!(summary.groups.is_empty());
        assert_eq!(reporter.reports.lock().unwrap()[0].pool[0].period, Period::Prior);
    }

    #[test]
    fn test_run_carries_diagnostics() {
        let reporter = MockReporter::default();
        let source = MockLedgerSource {
            prior: vec![],
            current: vec![],
            warnings: vec![Warning::ColumnMapping {
                source: "current.csv".to_string(),
                column: "Fuente".to_string(),
            }],
        };

        let summary = engine(source, reporter.clone()).run().unwrap();

        assert_eq!(summary.diagnostics.len(), 1);
        assert_eq!(summary.movements, 0);
        assert_eq!(reporter.reports.lock().unwrap()[0].warnings, 1);
    }

    #[test]
    fn test_cancelled_run_writes_no_report() {
        let reporter = MockReporter::default();
        let source = MockLedgerSource {
            prior: vec![mock_movement("A1", dec!(100), dec!(3500), mock_date(2024, 1, 2))],
            current: vec![mock_movement("A2", dec!(-100), dec!(-3500), mock_date(2024, 1, 3))],
            warnings: vec![],
        };
        let cancel = CancellationToken::with_time_limit(std::time::Duration::ZERO);

        let result = engine(source, reporter.clone())
            .with_cancellation(cancel)
            .run();

        assert!(matches!(result, Err(AppError::Cancelled)));
        assert!(reporter.reports.lock().unwrap().is_empty());
    }

    #[test]
    fn test_signalled_run_writes_no_report() {
        let reporter = MockReporter::default();
        let source = MockLedgerSource {
            prior: vec![],
            current: vec![
                mock_movement("A1", dec!(100), dec!(3500), mock_date(2024, 1, 2)),
                mock_movement("A2", dec!(-100), dec!(-3500), mock_date(2024, 1, 3)),
            ],
            warnings: vec![],
        };
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = engine(source, reporter.clone())
            .with_cancellation(cancel)
            .run();

        assert!(matches!(result, Err(AppError::Cancelled)));
        assert!(reporter.reports.lock().unwrap().is_empty());
    }

    #[test]
    fn test_input_error_is_fatal() {
        let reporter = MockReporter::default();
        let engine = ReconcileEngine::new(
            Strategy::get(StrategyId::FondosTransito),
            ReportContext::default(),
            FailingLedgerSource,
            reporter.clone(),
        );

        let result = engine.run();

        assert!(matches!(result, Err(AppError::InputRead { .. })));
        assert!(reporter.reports.lock().unwrap().is_empty());
    }
}
