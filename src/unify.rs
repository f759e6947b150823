use crate::models::Movement;
use crate::models::movement::DedupKey;
use std::collections::HashSet;
use tracing::{info, instrument};

/// Concatenate prior and current period movements, keeping only the first
/// occurrence of every exact duplicate.
///
/// Order is preserved: prior rows first, then current rows, each in their
/// original order. `source` and `supplier` are not part of the duplicate key.
#[instrument(name = "Unifying periods", skip_all)]
pub fn unify(prior: Vec<Movement>, current: Vec<Movement>) -> Vec<Movement> {
    let total = prior.len() + current.len();
    let mut seen: HashSet<DedupKey> = HashSet::with_capacity(total);

    let pool: Vec<Movement> = prior
        .into_iter()
        .chain(current)
        .filter(|m| seen.insert(m.dedup_key()))
        .collect();

    info!(
        movements = pool.len(),
        duplicates = total - pool.len(),
        "Periods unified"
    );
    pool
}
