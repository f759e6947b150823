use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::fmt;

/// Identifier assigned to a reconciled group, unique within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct GroupId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "group")]
pub enum MovementState {
    #[default]
    Open,
    Reconciled(GroupId),
}

/// Which of the two input dumps a movement was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Prior,
    Current,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Prior => write!(f, "prior"),
            Period::Current => write!(f, "current"),
        }
    }
}

/// One ledger line after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Movement {
    pub entry: String,
    pub reference: String,
    pub date: Option<NaiveDate>,
    pub debit_bs: Decimal,
    pub credit_bs: Decimal,
    pub debit_usd: Decimal,
    pub credit_usd: Decimal,
    pub source: String,
    pub supplier: String,
    pub period: Period,
    /// 1-based row number in the originating table, header excluded.
    pub row: usize,
    pub state: MovementState,
}

/// Fields that identify an exact duplicate across the two periods.
pub type DedupKey = (
    String,
    String,
    Option<NaiveDate>,
    Decimal,
    Decimal,
    Decimal,
    Decimal,
);

impl Movement {
    /// Signed local-currency amount (debit minus credit).
    pub fn amount_bs(&self) -> Decimal {
        round_amount(self.debit_bs.saturating_sub(self.credit_bs))
    }

    /// Signed foreign-currency amount (debit minus credit).
    pub fn amount_usd(&self) -> Decimal {
        round_amount(self.debit_usd.saturating_sub(self.credit_usd))
    }

    /// Bs per USD implied by the two amounts, when the USD side is non-zero.
    pub fn rate(&self) -> Option<Decimal> {
        let usd = self.amount_usd();
        if usd.is_zero() {
            return None;
        }
        self.amount_bs()
            .checked_div(usd)
            .map(|r| r.abs().round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero))
    }

    pub fn is_open(&self) -> bool {
        self.state == MovementState::Open
    }

    pub fn group(&self) -> Option<GroupId> {
        match self.state {
            MovementState::Open => None,
            MovementState::Reconciled(id) => Some(id),
        }
    }

    pub fn dedup_key(&self) -> DedupKey {
        (
            self.entry.clone(),
            self.reference.clone(),
            self.date,
            self.debit_bs,
            self.credit_bs,
            self.debit_usd,
            self.credit_usd,
        )
    }
}

/// Round to two decimals, half away from zero.
pub fn round_amount(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}


#[cfg(test)]
mod tests {
    use super::test_helpers::*;
    use super::*;
    use rust_decimal::prelude::dec;

    #[test]
    fn test_signed_amounts() {
        let m = mock_movement("A1", dec!(-100.25), dec!(3500.00), None);
        assert_eq!(m.amount_usd(), dec!(-100.25));
        assert_eq!(m.amount_bs(), dec!(3500.00));
        assert_eq!(m.credit_usd, dec!(100.25));
        assert_eq!(m.debit_bs, dec!(3500.00));
    }

    #[test]
    fn test_rate() {
        let m = mock_movement("A1", dec!(100.00), dec!(3650.00), None);
        assert_eq!(m.rate(), Some(dec!(36.5000)));

        let bs_only = mock_movement("A2", dec!(0), dec!(10.00), None);
        assert_eq!(bs_only.rate(), None);
    }

    #[test]
    fn test_round_amount_half_away_from_zero() {
        assert_eq!(round_amount(dec!(1.005)), dec!(1.01));
        assert_eq!(round_amount(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round_amount(dec!(1.004)), dec!(1.00));
    }

    #[test]
    fn test_state_helpers() {
        let mut m = mock_movement("A1", dec!(1), dec!(1), None);
        assert!(m.is_open());
        assert_eq!(m.group(), None);

        m.state = MovementState::Reconciled(GroupId(7));
        assert!(!m.is_open());
        assert_eq!(m.group(), Some(GroupId(7)));
    }
}
