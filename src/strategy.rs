//! Catalogue of reconciliation strategies.
//!
//! A strategy is a declarative bundle: it decides which movements take part,
//! how they are partitioned, the tolerances a group must meet and how the
//! report is laid out. The matcher itself knows nothing about accounts.

use crate::error::AppError;
use crate::models::Movement;
use crate::normalize::normalize_counterparty;
use rust_decimal::Decimal;
use rust_decimal::prelude::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_TOLERANCE_BS: Decimal = dec!(2.00);
pub const DEFAULT_TOLERANCE_USD: Decimal = dec!(0.50);
pub const DEFAULT_MAX_GROUP_SIZE: usize = 4;
pub const DEFAULT_PRUNE_CUTOFF: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum StrategyId {
    FondosTransito,
    FondosDepositar,
    DevolucionesProveedores,
}

impl StrategyId {
    pub const ALL: [StrategyId; 3] = [
        StrategyId::FondosTransito,
        StrategyId::FondosDepositar,
        StrategyId::DevolucionesProveedores,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyId::FondosTransito => "fondos_transito",
            StrategyId::FondosDepositar => "fondos_depositar",
            StrategyId::DevolucionesProveedores => "devoluciones_proveedores",
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        StrategyId::ALL
            .into_iter()
            .find(|id| id.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<_> = StrategyId::ALL.iter().map(|id| id.as_str()).collect();
                AppError::StrategyUnknown(s.to_string(), known.join(", "))
            })
    }
}

impl TryFrom<String> for StrategyId {
    type Error = AppError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// How movements are split into classes that are matched independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    /// A single class holding every candidate.
    AllTogether,
    /// One class per normalized counterparty name.
    Counterparty,
}

impl GroupKey {
    pub fn key_for(&self, movement: &Movement) -> String {
        match self {
            GroupKey::AllTogether => String::new(),
            GroupKey::Counterparty => normalize_counterparty(&movement.supplier),
        }
    }
}

/// Ordering criteria applied to candidate groups, most significant first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreaker {
    /// `|Σ bs| + 100·|Σ usd|`, smaller first.
    ResidualCost,
    /// Groups holding earlier-dated movements first; undated sort last.
    EarliestDate,
    /// Fewer members first.
    SmallerGroup,
}

pub const DEFAULT_TIE_BREAKERS: &[TieBreaker] = &[
    TieBreaker::ResidualCost,
    TieBreaker::EarliestDate,
    TieBreaker::SmallerGroup,
];

/// Columns a strategy shows in its listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportColumn {
    Date,
    Entry,
    Reference,
    Source,
    Supplier,
    AmountBs,
    AmountUsd,
    Rate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLayout {
    /// Name of the open-balances sheet.
    pub pending_sheet: &'static str,
    pub columns: &'static [ReportColumn],
    /// Split reconciled amounts into debit-side and credit-side columns.
    pub split_detail_amounts: bool,
    /// Add the per-counterparty breakdown of open movements.
    pub counterparty_summary: bool,
}

const FUNDS_COLUMNS: &[ReportColumn] = &[
    ReportColumn::Date,
    ReportColumn::Entry,
    ReportColumn::Reference,
    ReportColumn::Source,
    ReportColumn::AmountBs,
    ReportColumn::AmountUsd,
    ReportColumn::Rate,
];

const SUPPLIER_COLUMNS: &[ReportColumn] = &[
    ReportColumn::Date,
    ReportColumn::Entry,
    ReportColumn::Reference,
    ReportColumn::Supplier,
    ReportColumn::AmountBs,
    ReportColumn::AmountUsd,
    ReportColumn::Rate,
];

#[derive(Debug, Clone)]
pub struct Strategy {
    pub id: StrategyId,
    pub title: &'static str,
    pub tolerance_bs: Decimal,
    pub tolerance_usd: Decimal,
    pub max_group_size: usize,
    /// Pool size above which the size-k passes are pruned.
    pub prune_cutoff: usize,
    pub candidate_filter: fn(&Movement) -> bool,
    pub group_key: GroupKey,
    pub requires_sign_diversity: bool,
    pub tie_breakers: &'static [TieBreaker],
    pub report: ReportLayout,
}

fn has_any_amount(m: &Movement) -> bool {
    !m.amount_usd().is_zero() || !m.amount_bs().is_zero()
}

fn has_bs_amount(m: &Movement) -> bool {
    !m.amount_bs().is_zero()
}

fn has_supplier(m: &Movement) -> bool {
    !m.supplier.trim().is_empty()
}

impl Strategy {
    /// Registry entry for `id` with default tolerances.
    pub fn get(id: StrategyId) -> Self {
        let base = Strategy {
            id,
            title: "",
            tolerance_bs: DEFAULT_TOLERANCE_BS,
            tolerance_usd: DEFAULT_TOLERANCE_USD,
            max_group_size: DEFAULT_MAX_GROUP_SIZE,
            prune_cutoff: DEFAULT_PRUNE_CUTOFF,
            candidate_filter: has_any_amount,
            group_key: GroupKey::AllTogether,
            requires_sign_diversity: true,
            tie_breakers: DEFAULT_TIE_BREAKERS,
            report: ReportLayout {
                pending_sheet: "Pendientes",
                columns: FUNDS_COLUMNS,
                split_detail_amounts: true,
                counterparty_summary: false,
            },
        };

        match id {
            StrategyId::FondosTransito => Strategy {
                title: "Fondos en Tránsito",
                report: ReportLayout {
                    pending_sheet: "Pendientes Transito",
                    ..base.report.clone()
                },
                ..base
            },
            StrategyId::FondosDepositar => Strategy {
                title: "Fondos por Depositar",
                candidate_filter: has_bs_amount,
                report: ReportLayout {
                    pending_sheet: "Pendientes por Depositar",
                    ..base.report.clone()
                },
                ..base
            },
            StrategyId::DevolucionesProveedores => Strategy {
                title: "Devoluciones a Proveedores",
                candidate_filter: has_supplier,
                group_key: GroupKey::Counterparty,
                report: ReportLayout {
                    pending_sheet: "Devoluciones Pendientes",
                    columns: SUPPLIER_COLUMNS,
                    split_detail_amounts: false,
                    counterparty_summary: true,
                },
                ..base
            },
        }
    }

    pub fn with_tolerances(self, tolerance_bs: Decimal, tolerance_usd: Decimal) -> Self {
        Strategy {
            tolerance_bs,
            tolerance_usd,
            ..self
        }
    }

    pub fn with_max_group_size(self, max_group_size: usize) -> Self {
        Strategy {
            max_group_size,
            ..self
        }
    }

    pub fn with_prune_cutoff(self, prune_cutoff: usize) -> Self {
        Strategy {
            prune_cutoff,
            ..self
        }
    }

    pub fn accepts(&self, movement: &Movement) -> bool {
        (self.candidate_filter)(movement)
    }
}
