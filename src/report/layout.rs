use super::RunReport;
use super::workbook::{BANNER_ROWS, CellValue, NumberFormat, RowKind, Sheet, Workbook};
use crate::models::Movement;
use crate::normalize::{format_date, normalize_counterparty};
use crate::reconcile::Group;
use crate::strategy::ReportColumn;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

pub const DETAIL_SHEET: &str = "Conciliacion";
pub const SUPPLIER_SHEET: &str = "Resumen por Proveedor";
pub const DIAGNOSTICS_SHEET: &str = "Diagnosticos";

/// A column of a report listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Group,
    Date,
    Entry,
    Reference,
    Source,
    Supplier,
    AmountBs,
    AmountUsd,
    DebitSideBs,
    CreditSideBs,
    DebitSideUsd,
    CreditSideUsd,
    Rate,
}

impl Field {
    fn header(&self) -> &'static str {
        match self {
            Field::Group => "Grupo",
            Field::Date => "Fecha",
            Field::Entry => "Asiento",
            Field::Reference => "Referencia",
            Field::Source => "Fuente",
            Field::Supplier => "Proveedor",
            Field::AmountBs => "Monto Bs",
            Field::AmountUsd => "Monto USD",
            Field::DebitSideBs => "Débito Bs",
            Field::CreditSideBs => "Crédito Bs",
            Field::DebitSideUsd => "Débito USD",
            Field::CreditSideUsd => "Crédito USD",
            Field::Rate => "Tasa",
        }
    }

    /// Number format of summed columns; `None` for columns without a total.
    fn total_format(&self) -> Option<NumberFormat> {
        match self {
            Field::AmountBs | Field::DebitSideBs | Field::CreditSideBs => Some(NumberFormat::Bs),
            Field::AmountUsd | Field::DebitSideUsd | Field::CreditSideUsd => {
                Some(NumberFormat::Usd)
            }
            _ => None,
        }
    }

    fn value(&self, movement: &Movement) -> CellValue {
        let positive = |amount: Decimal| amount.max(Decimal::ZERO);
        let negative = |amount: Decimal| amount.min(Decimal::ZERO);
        match self {
            Field::Group => movement
                .group()
                .map(|g| CellValue::Integer(g.0 as i64))
                .unwrap_or(CellValue::Empty),
            Field::Date => CellValue::date(movement.date),
            Field::Entry => CellValue::text(&movement.entry),
            Field::Reference => CellValue::text(&movement.reference),
            Field::Source => CellValue::text(&movement.source),
            Field::Supplier => CellValue::text(&movement.supplier),
            Field::AmountBs => CellValue::Number(movement.amount_bs(), NumberFormat::Bs),
            Field::AmountUsd => CellValue::Number(movement.amount_usd(), NumberFormat::Usd),
            Field::DebitSideBs => {
                CellValue::Number(positive(movement.amount_bs()), NumberFormat::Bs)
            }
            Field::CreditSideBs => {
                CellValue::Number(negative(movement.amount_bs()), NumberFormat::Bs)
            }
            Field::DebitSideUsd => {
                CellValue::Number(positive(movement.amount_usd()), NumberFormat::Usd)
            }
            Field::CreditSideUsd => {
                CellValue::Number(negative(movement.amount_usd()), NumberFormat::Usd)
            }
            Field::Rate => movement
                .rate()
                .map(|r| CellValue::Number(r, NumberFormat::Rate))
                .unwrap_or(CellValue::Empty),
        }
    }

    fn amount(&self, movement: &Movement) -> Decimal {
        match self.value(movement) {
            CellValue::Number(amount, _) => amount,
            _ => Decimal::ZERO,
        }
    }
}

impl From<ReportColumn> for Field {
    fn from(column: ReportColumn) -> Self {
        match column {
            ReportColumn::Date => Field::Date,
            ReportColumn::Entry => Field::Entry,
            ReportColumn::Reference => Field::Reference,
            ReportColumn::Source => Field::Source,
            ReportColumn::Supplier => Field::Supplier,
            ReportColumn::AmountBs => Field::AmountBs,
            ReportColumn::AmountUsd => Field::AmountUsd,
            ReportColumn::Rate => Field::Rate,
        }
    }
}

/// Build the report workbook for one run.
pub fn build_workbook(run: &RunReport<'_>) -> Workbook {
    let banner = banner(run);
    let mut sheets = vec![pending_sheet(run, &banner), detail_sheet(run, &banner)];
    if run.strategy.report.counterparty_summary {
        sheets.push(supplier_sheet(run, &banner));
    }
    if !run.diagnostics.is_empty() {
        let mut sheet = Sheet::new(DIAGNOSTICS_SHEET, banner.clone(), vec!["Advertencia".to_string()]);
        for warning in run.diagnostics.iter() {
            sheet.push(RowKind::Data, vec![CellValue::text(warning.to_string())]);
        }
        sheets.push(sheet);
    }
    Workbook { sheets }
}

fn banner(run: &RunReport<'_>) -> [String; BANNER_ROWS] {
    let account = if run.context.account.is_empty() {
        run.strategy.title.to_string()
    } else {
        format!("{} - {}", run.context.account, run.strategy.title)
    };
    let period_end = run
        .context
        .period_end
        .or_else(|| run.pool.iter().filter_map(|m| m.date).max());
    [
        run.context.company.clone(),
        account,
        format!("Período al {}", format_date(period_end)),
    ]
}

fn date_then_position(pool: &[Movement], idx: usize) -> (NaiveDate, usize) {
    (pool[idx].date.unwrap_or(NaiveDate::MAX), idx)
}

/// Open balances, oldest first.
fn pending_sheet(run: &RunReport<'_>, banner: &[String; BANNER_ROWS]) -> Sheet {
    let fields: Vec<Field> = run.strategy.report.columns.iter().map(|&c| c.into()).collect();
    let mut open = run.open.to_vec();
    open.sort_by_key(|&idx| date_then_position(run.pool, idx));

    let mut sheet = listing(run.strategy.report.pending_sheet, banner, &fields);
    let rows = push_movements(&mut sheet, &fields, open.iter().map(|&idx| &run.pool[idx]));
    push_total(&mut sheet, &fields, "Total", rows.into_iter().collect(), run.pool, &open);
    sheet
}

/// Reconciled movements by group, then date.
fn detail_sheet(run: &RunReport<'_>, banner: &[String; BANNER_ROWS]) -> Sheet {
    let mut fields = vec![Field::Group];
    for &column in run.strategy.report.columns {
        match (column, run.strategy.report.split_detail_amounts) {
            (ReportColumn::AmountBs, true) => {
                fields.extend([Field::DebitSideBs, Field::CreditSideBs])
            }
            (ReportColumn::AmountUsd, true) => {
                fields.extend([Field::DebitSideUsd, Field::CreditSideUsd])
            }
            (other, _) => fields.push(other.into()),
        }
    }

    let mut members: Vec<(usize, &Group)> = run
        .reconciliation
        .groups
        .iter()
        .flat_map(|g| g.members.iter().map(move |&idx| (idx, g)))
        .collect();
    members.sort_by_key(|(idx, group)| (group.id, date_then_position(run.pool, *idx)));
    let indices: Vec<usize> = members.iter().map(|(idx, _)| *idx).collect();

    let mut sheet = listing(DETAIL_SHEET, banner, &fields);
    let rows = push_movements(&mut sheet, &fields, indices.iter().map(|&idx| &run.pool[idx]));
    push_total(&mut sheet, &fields, "Total", rows.into_iter().collect(), run.pool, &indices);
    sheet
}

/// Open movements per counterparty, with subtotals and a grand total.
fn supplier_sheet(run: &RunReport<'_>, banner: &[String; BANNER_ROWS]) -> Sheet {
    let fields = [
        Field::Supplier,
        Field::Date,
        Field::Entry,
        Field::Reference,
        Field::AmountBs,
        Field::AmountUsd,
    ];

    let mut by_supplier: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for &idx in run.open {
        by_supplier
            .entry(normalize_counterparty(&run.pool[idx].supplier))
            .or_default()
            .push(idx);
    }

    let mut sheet = listing(SUPPLIER_SHEET, banner, &fields);
    let mut subtotal_rows = Vec::new();
    for members in by_supplier.values_mut() {
        members.sort_by_key(|&idx| date_then_position(run.pool, idx));
        let display_name = run.pool[members[0]].supplier.clone();
        let label = if display_name.is_empty() {
            "Sin proveedor".to_string()
        } else {
            display_name
        };

        let rows = push_movements(&mut sheet, &fields, members.iter().map(|&idx| &run.pool[idx]));
        let subtotal = push_summary(
            &mut sheet,
            &fields,
            RowKind::Subtotal,
            format!("Subtotal {label}"),
            rows.into_iter().collect(),
            run.pool,
            members,
        );
        subtotal_rows.push(subtotal..=subtotal);
    }

    let open: Vec<usize> = by_supplier.values().flatten().copied().collect();
    push_total(&mut sheet, &fields, "Total general", subtotal_rows, run.pool, &open);
    sheet
}

fn listing(name: &str, banner: &[String; BANNER_ROWS], fields: &[Field]) -> Sheet {
    Sheet::new(
        name,
        banner.clone(),
        fields.iter().map(|f| f.header().to_string()).collect(),
    )
}

/// Append one data row per movement; returns the sheet rows used, if any.
fn push_movements<'a>(
    sheet: &mut Sheet,
    fields: &[Field],
    movements: impl Iterator<Item = &'a Movement>,
) -> Option<RangeInclusive<usize>> {
    let first = sheet.next_row_number();
    for movement in movements {
        sheet.push(RowKind::Data, fields.iter().map(|f| f.value(movement)).collect());
    }
    let last = sheet.next_row_number();
    (last > first).then(|| first..=last - 1)
}

fn push_total(
    sheet: &mut Sheet,
    fields: &[Field],
    label: &str,
    rows: Vec<RangeInclusive<usize>>,
    pool: &[Movement],
    members: &[usize],
) -> usize {
    push_summary(sheet, fields, RowKind::Total, label.to_string(), rows, pool, members)
}

/// Append a row holding `label` in the first column and a `SUM` over `rows`
/// in every amount column.
fn push_summary(
    sheet: &mut Sheet,
    fields: &[Field],
    kind: RowKind,
    label: String,
    rows: Vec<RangeInclusive<usize>>,
    pool: &[Movement],
    members: &[usize],
) -> usize {
    let mut cells = Vec::with_capacity(fields.len());
    for (col, field) in fields.iter().enumerate() {
        let cell = match field.total_format() {
            Some(format) => CellValue::Sum {
                rows: rows.clone(),
                total: members.iter().map(|&idx| field.amount(&pool[idx])).sum(),
                format,
            },
            None if col == 0 => CellValue::text(label.clone()),
            None => CellValue::Empty,
        };
        cells.push(cell);
    }
    sheet.push(kind, cells)
}
