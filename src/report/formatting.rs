use super::workbook::{CellValue, NumberFormat, RowKind};
use std::ops::RangeInclusive;

/// A named cell style of the workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Style {
    pub id: &'static str,
    pub bold: bool,
    pub centered: bool,
    pub number_format: Option<&'static str>,
}

const fn style(id: &'static str, bold: bool, number_format: Option<&'static str>) -> Style {
    Style {
        id,
        bold,
        centered: false,
        number_format,
    }
}

pub(super) const BANNER: Style = Style {
    id: "banner",
    bold: true,
    centered: true,
    number_format: None,
};
pub(super) const HEADER: Style = style("header", true, None);
pub(super) const DATE: Style = style("date", false, Some("dd/mm/yyyy"));

/// Every style the writer declares, in declaration order.
pub(super) const STYLES: [Style; 10] = [
    BANNER,
    HEADER,
    DATE,
    style("text", false, None),
    style("bs", false, Some("#,##0.00")),
    style("usd", false, Some("$#,##0.00")),
    style("rate", false, Some("#,##0.0000")),
    style("total", true, None),
    style("total_bs", true, Some("#,##0.00")),
    style("total_usd", true, Some("$#,##0.00")),
];

/// Style id for a cell given the kind of row it sits in.
pub(super) fn style_id(cell: &CellValue, row: RowKind) -> &'static str {
    let emphasized = row != RowKind::Data;
    let format = match cell {
        CellValue::Number(_, format) | CellValue::Sum { format, .. } => Some(*format),
        _ => None,
    };

    match (format, emphasized) {
        (Some(NumberFormat::Bs), false) => "bs",
        (Some(NumberFormat::Bs), true) => "total_bs",
        (Some(NumberFormat::Usd), false) => "usd",
        (Some(NumberFormat::Usd), true) => "total_usd",
        (Some(NumberFormat::Rate), _) => "rate",
        (None, _) if matches!(cell, CellValue::Date(_)) => DATE.id,
        (None, true) => "total",
        (None, false) => "text",
    }
}

/// `SUM` over `rows` of a 1-based column, in R1C1 notation.
pub(super) fn sum_formula(rows: &[RangeInclusive<usize>], column: usize) -> String {
    let ranges: Vec<String> = rows
        .iter()
        .map(|r| {
            if r.start() == r.end() {
                format!("R{}C{column}", r.start())
            } else {
                format!("R{}C{column}:R{}C{column}", r.start(), r.end())
            }
        })
        .collect();
    format!("=SUM({})", ranges.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::dec;

    #[test]
    fn test_style_ids_are_declared() {
        let cells = [
            CellValue::Empty,
            CellValue::text("x"),
            CellValue::Integer(1),
            CellValue::Number(dec!(1), NumberFormat::Bs),
            CellValue::Number(dec!(1), NumberFormat::Usd),
            CellValue::Number(dec!(1), NumberFormat::Rate),
            CellValue::Date(chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
        ];
        for cell in &cells {
            for row in [RowKind::Data, RowKind::Subtotal, RowKind::Total] {
                let id = style_id(cell, row);
                assert!(STYLES.iter().any(|s| s.id == id), "{id} not declared");
            }
        }
    }

    #[test]
    fn test_total_styles() {
        let sum = CellValue::Sum {
            rows: vec![6..=8],
            total: dec!(0),
            format: NumberFormat::Usd,
        };
        assert_eq!(style_id(&sum, RowKind::Total), "total_usd");
        assert_eq!(style_id(&CellValue::text("Total"), RowKind::Total), "total");
        assert_eq!(
            style_id(&CellValue::Number(dec!(1), NumberFormat::Bs), RowKind::Data),
            "bs"
        );
    }

    #[test]
    fn test_sum_formula() {
        assert_eq!(sum_formula(&[6..=10], 5), "=SUM(R6C5:R10C5)");
        assert_eq!(sum_formula(&[9..=9, 14..=14], 6), "=SUM(R9C6,R14C6)");
    }
}
