use super::cancel::CancellationToken;
use super::group::{Candidate, Group, date_rank};
use crate::error::{AppError, Result};
use crate::models::{GroupId, Movement, MovementState};
use crate::strategy::Strategy;
use indicatif::ProgressStyle;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};
use tracing::{Span, debug, info, instrument, warn};
use tracing_indicatif::span_ext::IndicatifSpanExt;

/// Result of one matcher run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub groups: Vec<Group>,
    /// `false` when the run was cancelled; `groups` then holds only the
    /// classes that finished before the signal was seen.
    pub complete: bool,
}

impl Reconciliation {
    pub fn reconciled_count(&self) -> usize {
        self.groups.iter().map(|g| g.members.len()).sum()
    }
}

/// Finds disjoint groups of movements that cancel out under a strategy.
pub struct Matcher<'s> {
    strategy: &'s Strategy,
    cancel: CancellationToken,
}

impl<'s> Matcher<'s> {
    pub fn new(strategy: &'s Strategy, cancel: CancellationToken) -> Self {
        Self { strategy, cancel }
    }

    /// Match every partition class of `pool`, marking members of committed
    /// groups as reconciled. Movements rejected by the candidate filter, or
    /// already reconciled, are left untouched.
    pub fn run(&self, pool: &mut [Movement]) -> Result<Reconciliation> {
        self.run_with(pool, |_, _| {})
    }

    /// Like [`Matcher::run`], calling `after_pass(class, size)` each time a
    /// size-k pass over a class completes.
    #[instrument(name = "Matching", skip_all, fields(strategy = %self.strategy.id))]
    fn run_with(
        &self,
        pool: &mut [Movement],
        mut after_pass: impl FnMut(&str, usize),
    ) -> Result<Reconciliation> {
        let classes = self.partition(pool);

        let span = Span::current();
        span.pb_set_style(&progress_style()?);
        span.pb_set_message("Matching classes");
        span.pb_set_length(classes.len() as u64);

        let mut groups = Vec::new();
        let mut next_id = 1;

        for (class, members) in classes {
            if self.cancel.is_cancelled() {
                warn!(groups = groups.len(), "Cancelled between classes");
                return Ok(Reconciliation {
                    groups,
                    complete: false,
                });
            }

            let accepted = self.match_class(pool, &members, &mut |size| after_pass(&class, size));
            let Some(accepted) = accepted else {
                warn!(class = %class, groups = groups.len(), "Cancelled, discarding class in progress");
                return Ok(Reconciliation {
                    groups,
                    complete: false,
                });
            };

            for candidate in accepted {
                groups.push(commit(pool, GroupId(next_id), &class, candidate));
                next_id += 1;
            }
            span.pb_inc(1);
        }

        let reconciliation = Reconciliation {
            groups,
            complete: true,
        };
        info!(
            groups = reconciliation.groups.len(),
            reconciled = reconciliation.reconciled_count(),
            "Matching finished"
        );
        Ok(reconciliation)
    }

    /// Open candidates keyed by partition class, each class ordered by date
    /// (undated last) and then by pool position.
    fn partition(&self, pool: &[Movement]) -> BTreeMap<String, Vec<usize>> {
        let mut classes: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, movement) in pool.iter().enumerate() {
            if movement.is_open() && self.strategy.accepts(movement) {
                classes
                    .entry(self.strategy.group_key.key_for(movement))
                    .or_default()
                    .push(idx);
            }
        }
        for members in classes.values_mut() {
            members.sort_by_key(|&idx| (date_rank(pool[idx].date), idx));
        }
        classes
    }

    /// Run the size-2 pass and then the size-k passes over one class.
    /// Returns `None` if cancelled before the class completed.
    #[instrument(name = "Matching class", skip_all, fields(members = members.len()))]
    fn match_class(
        &self,
        pool: &[Movement],
        members: &[usize],
        after_pass: &mut dyn FnMut(usize),
    ) -> Option<Vec<Candidate>> {
        let cutoff = self.strategy.prune_cutoff;
        let mut committed: HashSet<usize> = HashSet::new();
        let mut accepted = Vec::new();

        for size in 2..=self.strategy.max_group_size {
            let open: Vec<usize> = members
                .iter()
                .copied()
                .filter(|idx| !committed.contains(idx))
                .collect();
            if open.len() < size {
                break;
            }
            if size > 2 && self.cancel.is_cancelled() {
                return None;
            }

            let search = if size > 2 && open.len() > cutoff {
                let pruned = self.prune(pool, &open);
                if size > 3 && pruned.len() > cutoff {
                    debug!(size, pool = pruned.len(), "Pool above cutoff, stopping at triples");
                    break;
                }
                pruned
            } else {
                open
            };

            let mut candidates = Search::new(pool, self.strategy, &search, size).run();
            candidates.sort_by(|a, b| a.compare(b, self.strategy.tie_breakers));

            let before = accepted.len();
            for candidate in candidates {
                if candidate.members.iter().any(|idx| committed.contains(idx)) {
                    continue;
                }
                committed.extend(candidate.members.iter().copied());
                accepted.push(candidate);
            }
            debug!(size, groups = accepted.len() - before, "Pass finished");
            after_pass(size);
        }

        Some(accepted)
    }

    /// Keep only movements whose `|monto_usd|` lies within the USD tolerance
    /// of some other movement's `|monto_usd|`.
    fn prune(&self, pool: &[Movement], open: &[usize]) -> Vec<usize> {
        let tolerance = self.strategy.tolerance_usd;
        let mut by_magnitude: Vec<(Decimal, usize)> = open
            .iter()
            .map(|&idx| (pool[idx].amount_usd().abs(), idx))
            .collect();
        by_magnitude.sort();

        by_magnitude
            .iter()
            .enumerate()
            .filter(|(pos, (value, _))| {
                let near_prev = *pos > 0 && *value - by_magnitude[pos - 1].0 <= tolerance;
                let near_next = by_magnitude
                    .get(pos + 1)
                    .is_some_and(|(next, _)| *next - *value <= tolerance);
                near_prev || near_next
            })
            .map(|(_, (_, idx))| *idx)
            .collect()
    }
}

fn progress_style() -> Result<ProgressStyle> {
    ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
        .map_err(|e| AppError::Other(e.into()))
}

/// Enumerates subsets of a fixed size whose amounts cancel on the search
/// axis. The last member of each subset is looked up by binary search in
/// the axis-sorted pool instead of being enumerated.
struct Search<'a> {
    pool: &'a [Movement],
    strategy: &'a Strategy,
    sorted: Vec<(Decimal, usize)>,
    size: usize,
    tolerance: Decimal,
    found: Vec<Candidate>,
}

impl<'a> Search<'a> {
    fn new(pool: &'a [Movement], strategy: &'a Strategy, members: &[usize], size: usize) -> Self {
        // Search on USD when any member carries it, on Bs otherwise.
        let usd_axis = members.iter().any(|&idx| !pool[idx].amount_usd().is_zero());
        let (axis, tolerance): (fn(&Movement) -> Decimal, Decimal) = if usd_axis {
            (Movement::amount_usd, strategy.tolerance_usd)
        } else {
            (Movement::amount_bs, strategy.tolerance_bs)
        };

        let mut sorted: Vec<(Decimal, usize)> =
            members.iter().map(|&idx| (axis(&pool[idx]), idx)).collect();
        sorted.sort();

        Self {
            pool,
            strategy,
            sorted,
            size,
            tolerance,
            found: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Candidate> {
        let mut prefix = Vec::with_capacity(self.size);
        self.extend(0, Decimal::ZERO, &mut prefix);
        self.found
    }

    fn extend(&mut self, start: usize, sum: Decimal, prefix: &mut Vec<usize>) {
        if prefix.len() + 1 == self.size {
            let low = -sum - self.tolerance;
            let high = -sum + self.tolerance;
            let from = start.max(self.sorted.partition_point(|(v, _)| *v < low));
            let to = self.sorted.partition_point(|(v, _)| *v <= high);

            for pos in from..to {
                prefix.push(self.sorted[pos].1);
                if let Some(candidate) = Candidate::evaluate(self.pool, prefix, self.strategy) {
                    self.found.push(candidate);
                }
                prefix.pop();
            }
            return;
        }

        for pos in start..self.sorted.len() {
            let (value, idx) = self.sorted[pos];
            prefix.push(idx);
            self.extend(pos + 1, sum + value, prefix);
            prefix.pop();
        }
    }
}

fn commit(pool: &mut [Movement], id: GroupId, class: &str, candidate: Candidate) -> Group {
    for &idx in &candidate.members {
        pool[idx].state = MovementState::Reconciled(id);
    }
    Group {
        id,
        class: class.to_string(),
        members: candidate.members,
        residual_bs: candidate.residual_bs,
        residual_usd: candidate.residual_usd,
    }
}
