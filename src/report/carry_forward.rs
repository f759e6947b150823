//! Open balances exported in the ledger's own column layout so the next
//! period's run can take them as its prior dump.

use crate::error::Result;
use crate::models::Movement;
use crate::normalize::{format_amount, format_date};
use chrono::NaiveDate;
use csv::WriterBuilder;
use serde::Serialize;
use std::io::Write;

const BOM: &str = "\u{feff}";

#[derive(Serialize)]
struct CarryForwardRow<'a> {
    #[serde(rename = "Asiento")]
    entry: &'a str,
    #[serde(rename = "Referencia")]
    reference: &'a str,
    #[serde(rename = "Fecha")]
    date: String,
    #[serde(rename = "Débito Bolivar")]
    debit_bs: String,
    #[serde(rename = "Crédito Bolivar")]
    credit_bs: String,
    #[serde(rename = "Débito Dolar")]
    debit_usd: String,
    #[serde(rename = "Crédito Dolar")]
    credit_usd: String,
    #[serde(rename = "Fuente")]
    source: &'a str,
    #[serde(rename = "Nombre del Proveedor")]
    supplier: &'a str,
}

impl<'a> From<&'a Movement> for CarryForwardRow<'a> {
    fn from(m: &'a Movement) -> Self {
        Self {
            entry: &m.entry,
            reference: &m.reference,
            date: format_date(m.date),
            debit_bs: format_amount(m.debit_bs),
            credit_bs: format_amount(m.credit_bs),
            debit_usd: format_amount(m.debit_usd),
            credit_usd: format_amount(m.credit_usd),
            source: &m.source,
            supplier: &m.supplier,
        }
    }
}

/// Write the open movements of `pool`, oldest first, as `;`-separated UTF-8
/// with a byte-order mark.
pub fn write_carry_forward<W: Write>(mut w: W, pool: &[Movement], open: &[usize]) -> Result<()> {
    let mut ordered = open.to_vec();
    ordered.sort_by_key(|&idx| (pool[idx].date.unwrap_or(NaiveDate::MAX), idx));

    w.write_all(BOM.as_bytes())?;
    let mut wrt = WriterBuilder::new().delimiter(b';').from_writer(&mut w);
    if ordered.is_empty() {
        wrt.write_record([
            "Asiento",
            "Referencia",
            "Fecha",
            "Débito Bolivar",
            "Crédito Bolivar",
            "Débito Dolar",
            "Crédito Dolar",
            "Fuente",
            "Nombre del Proveedor",
        ])?;
    }
    for idx in ordered {
        wrt.serialize(CarryForwardRow::from(&pool[idx]))?;
    }
    wrt.flush()?;
    Ok(())
}
