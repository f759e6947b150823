mod table;

pub use table::{Cell, RawTable};

use crate::error::{Diagnostics, Result, Warning};
use crate::models::{Movement, MovementState, Period};
use crate::normalize::{Column, ColumnMap, parse_amount, parse_date, try_parse_amount};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Movements of one period together with the warnings raised reading them.
#[derive(Debug, Clone, Default)]
pub struct LoadedLedger {
    pub movements: Vec<Movement>,
    pub diagnostics: Diagnostics,
}

/// Where the engine obtains the prior and current period dumps from.
pub trait LedgerSource {
    fn load(&self, period: Period) -> Result<LoadedLedger>;
}

/// Ledger dumps stored as CSV or spreadsheet files.
#[derive(Debug, Clone)]
pub struct FileLedger {
    pub prior: PathBuf,
    pub current: PathBuf,
}

impl LedgerSource for FileLedger {
    #[instrument(name = "Loading ledger", skip(self))]
    fn load(&self, period: Period) -> Result<LoadedLedger> {
        let path = match period {
            Period::Prior => &self.prior,
            Period::Current => &self.current,
        };
        let table = RawTable::read(path)?;
        let ledger = movements_from_table(&table, period);
        info!(
            movements = ledger.movements.len(),
            warnings = ledger.diagnostics.len(),
            "Ledger loaded"
        );
        Ok(ledger)
    }
}

/// Turn raw rows into movements. Missing columns and unreadable cells are
/// reported as warnings and never abort the conversion.
pub fn movements_from_table(table: &RawTable, period: Period) -> LoadedLedger {
    let mut diagnostics = Diagnostics::default();
    let columns = ColumnMap::from_headers(&table.headers);

    for column in columns.missing() {
        diagnostics.push(Warning::ColumnMapping {
            source: table.source.clone(),
            column: column.header().to_string(),
        });
    }

    let mut movements = Vec::with_capacity(table.rows.len());
    for (idx, row) in table.rows.iter().enumerate() {
        if row.iter().all(Cell::is_blank) {
            continue;
        }
        let row_number = idx + 1;
        let mut reader = RowReader {
            table,
            row,
            row_number,
            columns: &columns,
            diagnostics: &mut diagnostics,
        };

        movements.push(Movement {
            entry: reader.text(Column::Entry),
            reference: reader.text(Column::Reference),
            date: reader.date(),
            debit_bs: reader.amount(Column::DebitBs),
            credit_bs: reader.amount(Column::CreditBs),
            debit_usd: reader.amount(Column::DebitUsd),
            credit_usd: reader.amount(Column::CreditUsd),
            source: reader.text(Column::Source),
            supplier: reader.text(Column::Supplier),
            period,
            row: row_number,
            state: MovementState::Open,
        });
    }

    LoadedLedger {
        movements,
        diagnostics,
    }
}

struct RowReader<'a> {
    table: &'a RawTable,
    row: &'a [Cell],
    row_number: usize,
    columns: &'a ColumnMap,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> RowReader<'a> {
    fn cell(&self, column: Column) -> Option<&'a Cell> {
        self.columns
            .position(column)
            .and_then(|idx| self.row.get(idx))
    }

    fn text(&self, column: Column) -> String {
        self.cell(column)
            .map(|c| c.to_text().trim().to_string())
            .unwrap_or_default()
    }

    fn date(&mut self) -> Option<NaiveDate> {
        match self.cell(Column::Date) {
            None => None,
            Some(Cell::Date(date)) => Some(*date),
            Some(cell) => {
                let text = cell.to_text();
                parse_date(&text).unwrap_or_else(|_| {
                    self.diagnostics.push(Warning::DateParse {
                        source: self.table.source.clone(),
                        row: self.row_number,
                        value: text.clone(),
                    });
                    None
                })
            }
        }
    }

    fn amount(&mut self, column: Column) -> Decimal {
        let Some(cell) = self.cell(column) else {
            return Decimal::ZERO;
        };
        let text = cell.to_text();
        if try_parse_amount(&text).is_none() {
            self.diagnostics.push(Warning::AmountParse {
                source: self.table.source.clone(),
                row: self.row_number,
                column: column.header().to_string(),
                value: text.clone(),
            });
        }
        parse_amount(&text)
    }
}
