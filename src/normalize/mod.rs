//! Text and amount normalization shared by the ledger readers and writers.

pub mod amount;
pub mod columns;
pub mod text;

pub use amount::{format_amount, parse_amount, try_parse_amount};
pub use columns::{Column, ColumnMap};
pub use text::{format_date, normalize_counterparty, parse_date};
