use super::RunReport;
use crate::error::{Diagnostics, Result};
use crate::models::{GroupId, Movement, Period};
use crate::strategy::StrategyId;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

/// Where a movement came from: period dump, table row and entry number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberRef {
    pub period: Period,
    pub row: usize,
    pub entry: String,
}

impl From<&Movement> for MemberRef {
    fn from(m: &Movement) -> Self {
        Self {
            period: m.period,
            row: m.row,
            entry: m.entry.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub id: GroupId,
    pub class: String,
    pub members: Vec<MemberRef>,
    pub residual_bs: Decimal,
    pub residual_usd: Decimal,
}

/// Machine-readable outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub strategy: StrategyId,
    pub complete: bool,
    pub movements: usize,
    pub reconciled: usize,
    pub open: usize,
    pub open_bs: Decimal,
    pub open_usd: Decimal,
    pub groups: Vec<GroupSummary>,
    pub diagnostics: Diagnostics,
}

impl RunSummary {
    pub fn new(run: &RunReport<'_>) -> Self {
        let groups = run
            .reconciliation
            .groups
            .iter()
            .map(|g| GroupSummary {
                id: g.id,
                class: g.class.clone(),
                members: g.members.iter().map(|&idx| (&run.pool[idx]).into()).collect(),
                residual_bs: g.residual_bs,
                residual_usd: g.residual_usd,
            })
            .collect();

        Self {
            strategy: run.strategy.id,
            complete: run.reconciliation.complete,
            movements: run.pool.len(),
            reconciled: run.reconciliation.reconciled_count(),
            open: run.open.len(),
            open_bs: run.open.iter().map(|&idx| run.pool[idx].amount_bs()).sum(),
            open_usd: run.open.iter().map(|&idx| run.pool[idx].amount_usd()).sum(),
            groups,
            diagnostics: run.diagnostics.clone(),
        }
    }

    pub fn write<W: Write>(&self, w: W) -> Result<()> {
        serde_json::to_writer_pretty(w, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Warning;
    use crate::models::movement::test_helpers::{mock_date, mock_movement};
    use crate::reconcile::{CancellationToken, open_indices, reconcile};
    use crate::report::ReportContext;
    use crate::strategy::Strategy;
    use rust_decimal::prelude::dec;
    use serde_json::Value;

    #[test]
    fn test_summary() {
        let mut pool = vec![
            mock_movement("M1", dec!(100.00), dec!(3500.00), mock_date(2024, 1, 10)),
            mock_movement("M2", dec!(-100.25), dec!(-3501.50), mock_date(2024, 1, 11)),
            mock_movement("M3", dec!(40), dec!(1400), mock_date(2024, 1, 20)),
        ];
        let strategy = Strategy::get(StrategyId::FondosTransito);
        let reconciliation = reconcile(&mut pool, &strategy, &CancellationToken::new()).unwrap();
        let open = open_indices(&pool);
        let mut diagnostics = Diagnostics::default();
        diagnostics.push(Warning::DateParse {
            source: "current.csv".to_string(),
            row: 4,
            value: "31/02/2024".to_string(),
        });

        let summary = RunSummary::new(&RunReport {
            pool: &pool,
            open: &open,
            reconciliation: &reconciliation,
            strategy: &strategy,
            diagnostics: &diagnostics,
            context: &ReportContext::default(),
        });

        assert!(summary.complete);
        assert_eq!(summary.movements, 3);
        assert_eq!(summary.reconciled, 2);
        assert_eq!(summary.open, 1);
        assert_eq!(summary.open_usd, dec!(40));
        assert_eq!(summary.groups.len(), 1);
        assert_eq!(summary.groups[0].residual_bs, dec!(-1.50));

        let mut out = Vec::new();
        summary.write(&mut out).unwrap();
        let json: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["strategy"], "fondos_transito");
        assert_eq!(json["groups"][0]["id"], 1);
        assert_eq!(json["groups"][0]["members"][1]["entry"], "M2");
        assert_eq!(json["diagnostics"][0]["kind"], "date_parse");
    }
}
