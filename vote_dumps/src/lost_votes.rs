use log::{debug, info};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

use crate::errors::*;
use crate::series::{SnapshotPair, TimeSeries};
use crate::snapshot::*;

/// The change in vote share that both candidates must exceed for a decrease to count.
pub const SHARE_MARGIN: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

/// Votes that disappeared between two dumps.
///
/// The amounts are the signed deltas, so they are normally negative.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VoteLossData {
    #[serde(rename = "totalVotesLost")]
    pub total_votes_lost: Decimal,
    #[serde(rename = "candidate1VotesLost")]
    pub candidate1_votes_lost: Decimal,
    #[serde(rename = "candidate2VotesLost")]
    pub candidate2_votes_lost: Decimal,
    #[serde(rename = "thirdPartyVotesLost")]
    pub third_party_votes_lost: Decimal,
}

impl VoteLossData {
    pub const EMPTY: VoteLossData = VoteLossData {
        total_votes_lost: Decimal::ZERO,
        candidate1_votes_lost: Decimal::ZERO,
        candidate2_votes_lost: Decimal::ZERO,
        third_party_votes_lost: Decimal::ZERO,
    };
}

impl Default for VoteLossData {
    fn default() -> Self {
        VoteLossData::EMPTY
    }
}

impl Add for VoteLossData {
    type Output = VoteLossData;
    fn add(self, rhs: VoteLossData) -> VoteLossData {
        VoteLossData {
            total_votes_lost: self.total_votes_lost + rhs.total_votes_lost,
            candidate1_votes_lost: self.candidate1_votes_lost + rhs.candidate1_votes_lost,
            candidate2_votes_lost: self.candidate2_votes_lost + rhs.candidate2_votes_lost,
            third_party_votes_lost: self.third_party_votes_lost + rhs.third_party_votes_lost,
        }
    }
}

impl AddAssign for VoteLossData {
    fn add_assign(&mut self, rhs: VoteLossData) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for VoteLossData {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(VoteLossData::EMPTY, |acc, x| acc + x)
    }
}

/// Flags pairs of dumps in which the total and both candidates lost votes at once,
/// while both vote shares moved by more than `SHARE_MARGIN`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LostVotes {
    candidate1: Candidate,
    candidate2: Candidate,
}

impl LostVotes {
    pub fn new(candidate1: &Candidate, candidate2: &Candidate) -> LostVotes {
        LostVotes {
            candidate1: candidate1.clone(),
            candidate2: candidate2.clone(),
        }
    }

    /// Returns the signed deltas when the rule triggers, and `VoteLossData::EMPTY` otherwise.
    pub fn apply<S: SnapshotView>(&self, prev: &S, curr: &S) -> DumpResult<VoteLossData> {
        check_heuristic_pair(prev, curr)?;
        let (c1, c2) = (&self.candidate1, &self.candidate2);

        let share_moved =
            |c: &Candidate| (curr.vote_share(c) - prev.vote_share(c)).abs() > SHARE_MARGIN;
        let votes_dropped = |c: &Candidate| curr.exact_votes(c) < prev.exact_votes(c);

        let triggered = share_moved(c1)
            && share_moved(c2)
            && curr.total_votes() < prev.total_votes()
            && votes_dropped(c1)
            && votes_dropped(c2);
        if !triggered {
            return Ok(VoteLossData::EMPTY);
        }

        let res = VoteLossData {
            total_votes_lost: Decimal::from(curr.total_votes() - prev.total_votes()),
            candidate1_votes_lost: curr.exact_votes(c1) - prev.exact_votes(c1),
            candidate2_votes_lost: curr.exact_votes(c2) - prev.exact_votes(c2),
            third_party_votes_lost: curr.exact_third_party_votes(c1, c2)
                - prev.exact_third_party_votes(c1, c2),
        };
        debug!(
            "LostVotes::apply: {} -> {}: {:?}",
            prev.timestamp(),
            curr.timestamp(),
            res
        );
        Ok(res)
    }

    /// Sums the rule over all the adjacent non-empty pairs of a series.
    pub fn over_series(&self, series: &TimeSeries) -> DumpResult<VoteLossData> {
        series.validate(&self.candidate1, &self.candidate2)?;
        self.over_pairs(&series.non_empty_pairs())
    }

    /// Sums the rule over pairs taken from a series that was already validated.
    pub fn over_pairs(&self, pairs: &[SnapshotPair<'_>]) -> DumpResult<VoteLossData> {
        let mut total = VoteLossData::EMPTY;
        for (prev, curr) in pairs.iter() {
            total += self.apply(*prev, *curr)?;
        }
        info!("LostVotes::over_pairs: {} pairs: {:?}", pairs.len(), total);
        Ok(total)
    }
}
