use super::text::normalize_header;
use std::fmt;

/// The canonical input columns, in the order of the original ledger schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Entry,
    Reference,
    Date,
    DebitBs,
    CreditBs,
    DebitUsd,
    CreditUsd,
    Source,
    Supplier,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Column::Entry,
        Column::Reference,
        Column::Date,
        Column::DebitBs,
        Column::CreditBs,
        Column::DebitUsd,
        Column::CreditUsd,
        Column::Source,
        Column::Supplier,
    ];

    /// Header text used when writing tables back out.
    pub fn header(&self) -> &'static str {
        match self {
            Column::Entry => "Asiento",
            Column::Reference => "Referencia",
            Column::Date => "Fecha",
            Column::DebitBs => "Débito Bolivar",
            Column::CreditBs => "Crédito Bolivar",
            Column::DebitUsd => "Débito Dolar",
            Column::CreditUsd => "Crédito Dolar",
            Column::Source => "Fuente",
            Column::Supplier => "Nombre del Proveedor",
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Column::Source | Column::Supplier)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

const DEBIT_SYNONYMS: [&str; 3] = ["debito", "debitos", "debe"];
const CREDIT_SYNONYMS: [&str; 3] = ["credito", "creditos", "haber"];
const BS_SYNONYMS: [&str; 4] = ["ves", "bolivar", "local", "bs"];
const USD_SYNONYMS: [&str; 4] = ["dolar", "dolares", "usd", "me"];

fn contains_any(header: &str, synonyms: &[&str]) -> bool {
    synonyms.iter().any(|s| header.contains(s))
}

/// Identify which canonical column a raw header denotes, if any.
pub fn classify_header(raw: &str) -> Option<Column> {
    let header = normalize_header(raw);
    if header.is_empty() {
        return None;
    }

    let debit = contains_any(&header, &DEBIT_SYNONYMS);
    let credit = contains_any(&header, &CREDIT_SYNONYMS);
    let bs = contains_any(&header, &BS_SYNONYMS);
    let usd = contains_any(&header, &USD_SYNONYMS);

    match (debit, credit, bs, usd) {
        (true, false, true, _) => return Some(Column::DebitBs),
        (true, false, false, true) => return Some(Column::DebitUsd),
        (false, true, true, _) => return Some(Column::CreditBs),
        (false, true, false, true) => return Some(Column::CreditUsd),
        _ => {}
    }

    match header.as_str() {
        "asiento" | "nasiento" | "numeroasiento" => Some(Column::Entry),
        "referencia" | "ref" => Some(Column::Reference),
        "fecha" => Some(Column::Date),
        "fuente" => Some(Column::Source),
        h if h.contains("proveedor") => Some(Column::Supplier),
        _ => None,
    }
}

/// Positions of the canonical columns within one table's header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    positions: [Option<usize>; 9],
}

impl ColumnMap {
    /// Map a header row. The first header matching a canonical column wins.
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        let mut map = ColumnMap::default();
        for (idx, header) in headers.iter().enumerate() {
            if let Some(column) = classify_header(header.as_ref()) {
                let slot = &mut map.positions[column as usize];
                if slot.is_none() {
                    *slot = Some(idx);
                }
            }
        }
        map
    }

    pub fn position(&self, column: Column) -> Option<usize> {
        self.positions[column as usize]
    }

    /// Required columns that were not found. Optional columns are never reported.
    pub fn missing(&self) -> Vec<Column> {
        Column::ALL
            .into_iter()
            .filter(|c| !c.is_optional() && self.position(*c).is_none())
            .collect()
    }
}
