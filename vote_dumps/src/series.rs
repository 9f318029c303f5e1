use log::{debug, warn};
use snafu::{ensure, OptionExt};

use crate::errors::*;
use crate::snapshot::*;

/// A pair of consecutive snapshots: the earlier one first.
pub type SnapshotPair<'a> = (&'a IndexedSnapshot, &'a IndexedSnapshot);

/// The ordered sequence of dumps for one contest.
///
/// Indices always match the positions of the snapshots in the input.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TimeSeries {
    snapshots: Vec<IndexedSnapshot>,
}

fn adjacent(items: Vec<&IndexedSnapshot>) -> Vec<SnapshotPair<'_>> {
    items.windows(2).map(|w| (w[0], w[1])).collect()
}

impl TimeSeries {
    pub fn new(snapshots: Vec<Snapshot>) -> TimeSeries {
        TimeSeries {
            snapshots: snapshots
                .into_iter()
                .enumerate()
                .map(|(idx, s)| IndexedSnapshot::new(idx, s))
                .collect(),
        }
    }

    pub fn snapshots(&self) -> &[IndexedSnapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// True if no non-empty snapshot is dated after the next non-empty snapshot.
    /// Equal timestamps are fine.
    pub fn is_chronological(&self) -> bool {
        self.non_empty_pairs()
            .iter()
            .all(|(prev, curr)| prev.timestamp() <= curr.timestamp())
    }

    /// All the adjacent pairs, empty snapshots included.
    pub fn pairs(&self) -> Vec<SnapshotPair<'_>> {
        adjacent(self.snapshots.iter().collect())
    }

    /// The pairs a report is made of: the leading snapshot followed by every non-empty
    /// snapshot. Empty snapshots after the first one are skipped.
    pub fn report_pairs(&self) -> Vec<SnapshotPair<'_>> {
        adjacent(
            self.snapshots
                .iter()
                .enumerate()
                .filter(|(idx, s)| *idx == 0 || !s.is_empty())
                .map(|(_, s)| s)
                .collect(),
        )
    }

    /// The adjacent pairs of non-empty snapshots, which the pairwise heuristics work on.
    pub fn non_empty_pairs(&self) -> Vec<SnapshotPair<'_>> {
        adjacent(self.snapshots.iter().filter(|s| !s.is_empty()).collect())
    }

    /// Checks the structure of the series before anything is derived from it.
    ///
    /// A series that is not in chronological order is only reported with a warning.
    pub fn validate(&self, candidate1: &Candidate, candidate2: &Candidate) -> DumpResult<()> {
        ensure!(
            candidate1 != candidate2,
            ValidationSnafu {
                message: format!("the two tracked candidates are both {}", candidate1),
            }
        );
        ensure!(
            !candidate1.is_third_party() && !candidate2.is_third_party(),
            ValidationSnafu {
                message: format!(
                    "{} is reserved for the third party and cannot be tracked",
                    Candidate::third_party()
                ),
            }
        );

        let first = self.snapshots.first().context(ValidationSnafu {
            message: "the time series has no snapshot, expected a leading empty one",
        })?;
        ensure!(
            first.is_empty() && first.vote_shares().values().all(|s| s.is_zero()),
            ValidationSnafu {
                message: format!(
                    "the time series must start with an empty snapshot, found {} votes",
                    first.total_votes()
                ),
            }
        );

        for s in self.snapshots.iter() {
            ensure!(
                s.shares_in_bounds(),
                ValidationSnafu {
                    message: format!(
                        "snapshot {}: vote shares {:?} out of bounds",
                        s.index(),
                        s.vote_shares()
                    ),
                }
            );
            if s.is_empty() {
                continue;
            }
            ensure!(
                s.total_votes() > 0,
                ValidationSnafu {
                    message: format!(
                        "snapshot {}: non-positive vote total {}",
                        s.index(),
                        s.total_votes()
                    ),
                }
            );
            for c in [candidate1, candidate2] {
                ensure!(
                    s.has_candidate(c),
                    ValidationSnafu {
                        message: format!("snapshot {}: missing candidate {}", s.index(), c),
                    }
                );
                ensure!(
                    s.votes_for(c) > 0,
                    ValidationSnafu {
                        message: format!(
                            "snapshot {}: candidate {} has {} votes",
                            s.index(),
                            c,
                            s.votes_for(c)
                        ),
                    }
                );
            }
        }

        if !self.is_chronological() {
            warn!(
                "validate: the {} snapshots are not in chronological order, continuing anyway",
                self.len()
            );
        }
        debug!("validate: {} snapshots ok", self.len());
        Ok(())
    }
}
