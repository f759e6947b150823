use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to read input {path}: {reason}")]
    InputRead { path: String, reason: String },

    #[error("Unknown strategy '{0}' (expected one of: {1})")]
    StrategyUnknown(String, String),

    #[error("Reconciliation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Non-fatal findings collected while reading and normalizing input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A canonical column was not found and has been filled with zeros/blanks.
    ColumnMapping { source: String, column: String },
    /// A cell could not be read as an amount and was coerced to 0.00.
    AmountParse {
        source: String,
        row: usize,
        column: String,
        value: String,
    },
    /// A date cell could not be read; the movement is treated as undated.
    DateParse {
        source: String,
        row: usize,
        value: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::ColumnMapping { source, column } => {
                write!(f, "{source}: column '{column}' not found, filled with defaults")
            }
            Warning::AmountParse {
                source,
                row,
                column,
                value,
            } => write!(
                f,
                "{source}: row {row}, column '{column}': cannot parse amount '{value}', using 0.00"
            ),
            Warning::DateParse { source, row, value } => {
                write!(f, "{source}: row {row}: cannot parse date '{value}', left undated")
            }
        }
    }
}

/// Accumulated warnings for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Warning>);

impl Diagnostics {
    pub fn push(&mut self, warning: Warning) {
        tracing::warn!("{}", warning);
        self.0.push(warning);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.0.iter()
    }
}
