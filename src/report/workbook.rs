use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::ops::RangeInclusive;

/// Rows taken by the merged title banner.
pub const BANNER_ROWS: usize = 3;
/// Sheet row (1-based) holding the column headers.
pub const HEADER_ROW: usize = BANNER_ROWS + 2;
/// Sheet row (1-based) of the first data row.
pub const FIRST_DATA_ROW: usize = HEADER_ROW + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    Bs,
    Usd,
    Rate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Integer(i64),
    Number(Decimal, NumberFormat),
    Date(NaiveDate),
    /// Sum of this cell's column over the given sheet rows. `total` is the
    /// value the formula evaluates to, stored so readers that do not
    /// recalculate still show it.
    Sum {
        rows: Vec<RangeInclusive<usize>>,
        total: Decimal,
        format: NumberFormat,
    },
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn date(value: Option<NaiveDate>) -> Self {
        value.map(CellValue::Date).unwrap_or(CellValue::Empty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowKind {
    #[default]
    Data,
    Subtotal,
    Total,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub kind: RowKind,
    pub cells: Vec<CellValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    /// Title lines, each merged across the full sheet width.
    pub banner: [String; BANNER_ROWS],
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, banner: [String; BANNER_ROWS], headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            banner,
            headers,
            rows: Vec::new(),
        }
    }

    /// Sheet row number the next pushed row will occupy.
    pub fn next_row_number(&self) -> usize {
        FIRST_DATA_ROW + self.rows.len()
    }

    pub fn push(&mut self, kind: RowKind, cells: Vec<CellValue>) -> usize {
        let number = self.next_row_number();
        self.rows.push(Row { kind, cells });
        number
    }

    pub fn width(&self) -> usize {
        self.headers.len().max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

#[cfg(test)]
impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}
