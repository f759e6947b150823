use crate::error::{AppError, Result};
use calamine::{Data, DataType, Reader, open_workbook_auto};
use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use tracing::{debug, instrument};

/// A single cell as read from a CSV or spreadsheet file.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Textual form of the cell; numbers keep their full precision.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
            Cell::Date(d) => d.format("%d/%m/%Y").to_string(),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Int(i) => Cell::Text(i.to_string()),
            Data::Float(f) => Cell::Number(*f),
            Data::DateTime(_) | Data::DateTimeIso(_) => {
                data.as_date().map(Cell::Date).unwrap_or(Cell::Empty)
            }
            other => Cell::Text(other.to_string()),
        }
    }
}

/// Header row plus data rows of one input file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub source: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Read a table, choosing the decoder from the file extension.
    #[instrument(name = "Reading table", skip_all, fields(path = %path.display()))]
    pub fn read(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let table = match extension.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Self::read_workbook(path)?,
            _ => Self::read_csv(path)?,
        };

        debug!(rows = table.rows.len(), columns = table.headers.len(), "Table read");
        Ok(table)
    }

    fn read_csv(path: &Path) -> Result<Self> {
        let source = path.display().to_string();
        let bytes = fs::read(path).map_err(|e| input_error(&source, e))?;
        let text = String::from_utf8(bytes).map_err(|e| input_error(&source, e))?;
        Self::from_csv_str(&source, &text)
    }

    /// Parse delimited text. The delimiter is `;` when the header line has
    /// one, `,` otherwise; a leading byte-order mark is ignored.
    pub fn from_csv_str(source: &str, text: &str) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let header_line = text.lines().next().unwrap_or_default();
        let delimiter = if header_line.contains(';') { b';' } else { b',' };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| input_error(source, e))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| input_error(source, e))?;
            rows.push(
                record
                    .iter()
                    .map(|field| match field {
                        "" => Cell::Empty,
                        text => Cell::Text(text.to_string()),
                    })
                    .collect(),
            );
        }

        Ok(RawTable {
            source: source.to_string(),
            headers,
            rows,
        })
    }

    fn read_workbook(path: &Path) -> Result<Self> {
        let source = path.display().to_string();
        let mut workbook = open_workbook_auto(path).map_err(|e| input_error(&source, e))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| input_error(&source, "workbook has no worksheets"))?
            .map_err(|e| input_error(&source, e))?;

        let mut rows = range.rows();
        let headers = rows
            .next()
            .map(|header| header.iter().map(|c| c.to_string()).collect())
            .unwrap_or_default();
        let rows = rows.map(|row| row.iter().map(Cell::from).collect()).collect();

        Ok(RawTable {
            source,
            headers,
            rows,
        })
    }
}

fn input_error(source: &str, reason: impl std::fmt::Display) -> AppError {
    AppError::InputRead {
        path: source.to_string(),
        reason: reason.to_string(),
    }
}
