use std::collections::BTreeMap;
use std::fmt::Display;

use chrono::{DateTime, FixedOffset};
use log::debug;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use snafu::ensure;

use crate::errors::*;

const THIRD_PARTY_KEY: &str = "other";

/// The identifier of a candidate, as found in the vote dumps (for example `bidenj`).
///
/// The key `other` is reserved: it stands for all the candidates that are not tracked
/// in a report, combined.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Candidate(String);

impl Candidate {
    pub fn new(name: &str) -> Candidate {
        Candidate(name.to_string())
    }

    /// The sentinel for "all the other candidates".
    pub fn third_party() -> Candidate {
        Candidate(THIRD_PARTY_KEY.to_string())
    }

    pub fn is_third_party(&self) -> bool {
        self.0 == THIRD_PARTY_KEY
    }

    pub fn name(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Candidate {
    fn from(name: &str) -> Candidate {
        Candidate::new(name)
    }
}

/// Rounds an exact vote count to a whole number of votes, half up.
pub fn round_votes(exact: Decimal) -> i64 {
    let rounded = exact.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    rounded.to_i64().unwrap_or(if rounded.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

fn share_in_bounds(share: Decimal) -> bool {
    share >= Decimal::ZERO && share <= Decimal::ONE
}

/// Read-only access to the content of a vote dump.
///
/// Implemented both by the bare `Snapshot` and by `IndexedSnapshot`, which remembers
/// the position of the dump in its input.
pub trait SnapshotView {
    fn vote_shares(&self) -> &BTreeMap<Candidate, Decimal>;
    fn total_votes(&self) -> i64;
    fn timestamp(&self) -> DateTime<FixedOffset>;

    /// An empty snapshot has no votes at all. Time series start with one.
    fn is_empty(&self) -> bool {
        self.total_votes() == 0
    }

    fn has_candidate(&self, candidate: &Candidate) -> bool {
        self.vote_shares().contains_key(candidate)
    }

    /// The share of the candidate, or zero if the candidate does not appear.
    fn vote_share(&self, candidate: &Candidate) -> Decimal {
        self.vote_shares()
            .get(candidate)
            .cloned()
            .unwrap_or(Decimal::ZERO)
    }

    fn shares_sum(&self) -> Decimal {
        self.vote_shares().values().cloned().sum()
    }

    /// All the shares are in [0, 1] and so is their sum.
    fn shares_in_bounds(&self) -> bool {
        self.vote_shares().values().all(|s| share_in_bounds(*s))
            && share_in_bounds(self.shares_sum())
    }

    /// The unrounded number of votes of the candidate.
    fn exact_votes(&self, candidate: &Candidate) -> Decimal {
        self.vote_share(candidate) * Decimal::from(self.total_votes())
    }

    fn votes_for(&self, candidate: &Candidate) -> i64 {
        round_votes(self.exact_votes(candidate))
    }

    /// The share left to everyone but the two given candidates.
    fn third_party_share(&self, candidate1: &Candidate, candidate2: &Candidate) -> Decimal {
        Decimal::ONE - self.vote_share(candidate1) - self.vote_share(candidate2)
    }

    fn exact_third_party_votes(&self, candidate1: &Candidate, candidate2: &Candidate) -> Decimal {
        self.third_party_share(candidate1, candidate2) * Decimal::from(self.total_votes())
    }
}

/// One vote dump: the cumulative state of the count at a point in time.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Snapshot {
    vote_shares: BTreeMap<Candidate, Decimal>,
    total_votes: i64,
    timestamp: DateTime<FixedOffset>,
}

impl Snapshot {
    pub fn new(
        vote_shares: BTreeMap<Candidate, Decimal>,
        total_votes: i64,
        timestamp: DateTime<FixedOffset>,
    ) -> Snapshot {
        Snapshot {
            vote_shares,
            total_votes,
            timestamp,
        }
    }

    /// A snapshot without any vote.
    pub fn empty(timestamp: DateTime<FixedOffset>) -> Snapshot {
        Snapshot::new(BTreeMap::new(), 0, timestamp)
    }
}

impl SnapshotView for Snapshot {
    fn vote_shares(&self) -> &BTreeMap<Candidate, Decimal> {
        &self.vote_shares
    }

    fn total_votes(&self) -> i64 {
        self.total_votes
    }

    fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }
}

/// A snapshot together with its zero-based position in the input.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct IndexedSnapshot {
    index: usize,
    snapshot: Snapshot,
}

impl IndexedSnapshot {
    pub fn new(index: usize, snapshot: Snapshot) -> IndexedSnapshot {
        IndexedSnapshot { index, snapshot }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

impl SnapshotView for IndexedSnapshot {
    fn vote_shares(&self) -> &BTreeMap<Candidate, Decimal> {
        self.snapshot.vote_shares()
    }

    fn total_votes(&self) -> i64 {
        self.snapshot.total_votes()
    }

    fn timestamp(&self) -> DateTime<FixedOffset> {
        self.snapshot.timestamp()
    }
}

/// Checks the conditions shared by the pairwise heuristics: both snapshots carry votes,
/// their shares are in bounds and they are in temporal order.
pub(crate) fn check_heuristic_pair<S: SnapshotView>(prev: &S, curr: &S) -> DumpResult<()> {
    for (label, s) in [("previous", prev), ("current", curr)] {
        ensure!(
            s.shares_in_bounds(),
            PreconditionSnafu {
                message: format!("{} snapshot has vote shares out of bounds", label),
            }
        );
        ensure!(
            s.total_votes() > 0,
            PreconditionSnafu {
                message: format!(
                    "{} snapshot has a non-positive vote total {}",
                    label,
                    s.total_votes()
                ),
            }
        );
    }
    ensure!(
        prev.timestamp() <= curr.timestamp(),
        PreconditionSnafu {
            message: format!(
                "snapshots out of order: {} is after {}",
                prev.timestamp(),
                curr.timestamp()
            ),
        }
    );
    debug!(
        "check_heuristic_pair: {} -> {} ok",
        prev.timestamp(),
        curr.timestamp()
    );
    Ok(())
}
