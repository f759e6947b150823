use crate::models::{GroupId, Movement};
use crate::strategy::{Strategy, TieBreaker};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::dec;
use serde::Serialize;
use std::cmp::Ordering;

/// USD mismatches weigh this many times more than Bs mismatches.
const USD_COST_WEIGHT: Decimal = dec!(100);

/// A committed set of movements whose amounts cancel out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub id: GroupId,
    /// Partition class the group was found in; empty for single-class strategies.
    pub class: String,
    /// Indices into the movement pool, ascending.
    pub members: Vec<usize>,
    pub residual_bs: Decimal,
    pub residual_usd: Decimal,
}

/// A subset of one class that satisfies the group predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Candidate {
    pub members: Vec<usize>,
    pub residual_bs: Decimal,
    pub residual_usd: Decimal,
    pub cost: Decimal,
    /// Member dates, ascending, undated last.
    pub dates: Vec<NaiveDate>,
}

impl Candidate {
    /// Evaluate the group predicate for `members`. Returns `None` unless the
    /// subset has at least two members, both residuals within tolerance and,
    /// when the strategy asks for it, both signs on the dominant axis.
    pub fn evaluate(pool: &[Movement], members: &[usize], strategy: &Strategy) -> Option<Self> {
        if members.len() < 2 {
            return None;
        }

        let movements = members.iter().map(|&idx| &pool[idx]);
        let residual_bs = checked_total(movements.clone().map(Movement::amount_bs))?;
        let residual_usd = checked_total(movements.clone().map(Movement::amount_usd))?;

        if residual_bs.abs() > strategy.tolerance_bs || residual_usd.abs() > strategy.tolerance_usd {
            return None;
        }

        if strategy.requires_sign_diversity && !has_sign_diversity(movements.clone()) {
            return None;
        }

        if movements
            .clone()
            .all(|m| m.amount_bs().is_zero() && m.amount_usd().is_zero())
        {
            return None;
        }

        let mut sorted = members.to_vec();
        sorted.sort_unstable();
        let mut dates: Vec<NaiveDate> = movements.map(|m| date_rank(m.date)).collect();
        dates.sort_unstable();

        Some(Candidate {
            members: sorted,
            residual_bs,
            residual_usd,
            cost: USD_COST_WEIGHT
                .checked_mul(residual_usd.abs())?
                .checked_add(residual_bs.abs())?,
            dates,
        })
    }

    /// Order candidates by the strategy's tie-breakers, then by members so
    /// the result never depends on enumeration order.
    pub fn compare(&self, other: &Self, tie_breakers: &[TieBreaker]) -> Ordering {
        tie_breakers
            .iter()
            .map(|tb| match tb {
                TieBreaker::ResidualCost => self.cost.cmp(&other.cost),
                TieBreaker::EarliestDate => self.dates.cmp(&other.dates),
                TieBreaker::SmallerGroup => self.members.len().cmp(&other.members.len()),
            })
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| self.members.cmp(&other.members))
    }
}

/// Sum of `amounts`, or `None` if it leaves `Decimal`'s range.
fn checked_total(mut amounts: impl Iterator<Item = Decimal>) -> Option<Decimal> {
    amounts.try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
}

/// Undated movements sort after every real date.
pub(crate) fn date_rank(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or(NaiveDate::MAX)
}

/// Whether the movements carry both a positive and a negative amount on the
/// dominant axis: USD when any of them has a USD amount, Bs otherwise.
pub(crate) fn has_sign_diversity<'a>(movements: impl Iterator<Item = &'a Movement> + Clone) -> bool {
    let usd_axis = movements.clone().any(|m| !m.amount_usd().is_zero());
    let amounts = movements.map(|m| {
        if usd_axis {
            m.amount_usd()
        } else {
            m.amount_bs()
        }
    });

    let (mut positive, mut negative) = (false, false);
    for amount in amounts {
        positive |= amount.is_sign_positive() && !amount.is_zero();
        negative |= amount.is_sign_negative() && !amount.is_zero();
    }
    positive && negative
}
