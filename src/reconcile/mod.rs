//! The reconciliation engine: partitions a movement pool into groups that
//! cancel out and a residual of open movements.

mod cancel;
mod group;
mod matcher;

pub use cancel::CancellationToken;
pub use group::Group;
pub use matcher::{Matcher, Reconciliation};

use crate::error::Result;
use crate::models::Movement;
use crate::strategy::Strategy;

/// Match `pool` under `strategy`. See [`Matcher::run`].
pub fn reconcile(
    pool: &mut [Movement],
    strategy: &Strategy,
    cancel: &CancellationToken,
) -> Result<Reconciliation> {
    Matcher::new(strategy, cancel.clone()).run(pool)
}

/// Pool indices of movements still open, in pool order.
pub fn open_indices(pool: &[Movement]) -> Vec<usize> {
    pool.iter()
        .enumerate()
        .filter(|(_, m)| m.is_open())
        .map(|(idx, _)| idx)
        .collect()
}
