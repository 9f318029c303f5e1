use log::{debug, info};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

use crate::errors::*;
use crate::series::{SnapshotPair, TimeSeries};
use crate::snapshot::*;

const MARGIN_RATE: Decimal = Decimal::from_parts(49999, 0, 0, false, 8);
const MARGIN_BASE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// The number of votes below which a decrease is treated as noise:
/// `0.00049999 * total + 50`.
pub fn margin<S: SnapshotView>(snapshot: &S) -> Decimal {
    MARGIN_RATE * Decimal::from(snapshot.total_votes()) + MARGIN_BASE
}

/// Votes moved from one entity to another, as apportioned by `FindFraud`.
///
/// All the fields are non-negative.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VoteSwapData {
    #[serde(rename = "candidate1ToCandidate2")]
    pub candidate1_to_candidate2: Decimal,
    #[serde(rename = "candidate1ToThirdParty")]
    pub candidate1_to_third_party: Decimal,
    #[serde(rename = "candidate2ToCandidate1")]
    pub candidate2_to_candidate1: Decimal,
    #[serde(rename = "candidate2ToThirdParty")]
    pub candidate2_to_third_party: Decimal,
    #[serde(rename = "thirdPartyToCandidate1")]
    pub third_party_to_candidate1: Decimal,
    #[serde(rename = "thirdPartyToCandidate2")]
    pub third_party_to_candidate2: Decimal,
}

impl VoteSwapData {
    pub const EMPTY: VoteSwapData = VoteSwapData {
        candidate1_to_candidate2: Decimal::ZERO,
        candidate1_to_third_party: Decimal::ZERO,
        candidate2_to_candidate1: Decimal::ZERO,
        candidate2_to_third_party: Decimal::ZERO,
        third_party_to_candidate1: Decimal::ZERO,
        third_party_to_candidate2: Decimal::ZERO,
    };

    pub fn lost_by_candidate1(&self) -> Decimal {
        self.candidate1_to_candidate2 + self.candidate1_to_third_party
    }

    pub fn lost_by_candidate2(&self) -> Decimal {
        self.candidate2_to_candidate1 + self.candidate2_to_third_party
    }

    pub fn lost_by_third_party(&self) -> Decimal {
        self.third_party_to_candidate1 + self.third_party_to_candidate2
    }

    pub fn gained_by_candidate1(&self) -> Decimal {
        self.candidate2_to_candidate1 + self.third_party_to_candidate1
    }

    pub fn gained_by_candidate2(&self) -> Decimal {
        self.candidate1_to_candidate2 + self.third_party_to_candidate2
    }

    pub fn gained_by_third_party(&self) -> Decimal {
        self.candidate1_to_third_party + self.candidate2_to_third_party
    }

    pub fn total(&self) -> Decimal {
        self.lost_by_candidate1() + self.lost_by_candidate2() + self.lost_by_third_party()
    }
}

impl Default for VoteSwapData {
    fn default() -> Self {
        VoteSwapData::EMPTY
    }
}

impl Add for VoteSwapData {
    type Output = VoteSwapData;
    fn add(self, rhs: VoteSwapData) -> VoteSwapData {
        VoteSwapData {
            candidate1_to_candidate2: self.candidate1_to_candidate2 + rhs.candidate1_to_candidate2,
            candidate1_to_third_party: self.candidate1_to_third_party
                + rhs.candidate1_to_third_party,
            candidate2_to_candidate1: self.candidate2_to_candidate1 + rhs.candidate2_to_candidate1,
            candidate2_to_third_party: self.candidate2_to_third_party
                + rhs.candidate2_to_third_party,
            third_party_to_candidate1: self.third_party_to_candidate1
                + rhs.third_party_to_candidate1,
            third_party_to_candidate2: self.third_party_to_candidate2
                + rhs.third_party_to_candidate2,
        }
    }
}

impl AddAssign for VoteSwapData {
    fn add_assign(&mut self, rhs: VoteSwapData) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for VoteSwapData {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(VoteSwapData::EMPTY, |acc, x| acc + x)
    }
}

/// Splits `lost` between two gainers, in the given order, each receiving at most
/// what it gained.
///
/// `swaps_for_loser` only calls this when `lost` is at most the largest gain, so the
/// whole loss is always placed and the remainder below stays at zero.
fn apportion(lost: Decimal, gains: [Decimal; 2]) -> [Decimal; 2] {
    let mut remaining = lost;
    let mut res = [Decimal::ZERO; 2];
    for (slot, gain) in res.iter_mut().zip(gains) {
        if gain > Decimal::ZERO && remaining > Decimal::ZERO {
            let moved = remaining.min(gain);
            *slot = moved;
            remaining -= moved;
        }
    }
    if remaining > Decimal::ZERO {
        debug!("apportion: {} votes left unattributed", remaining);
    }
    res
}

/// The swap for one losing entity.
///
/// `loser_delta` is the change of the loser, `gains` the changes of the two other
/// entities in the order they are served. Returns `None` when the loss is within the
/// margin, when nobody gained, or when the loss is larger than the largest gain.
fn swaps_for_loser(
    loser_delta: Decimal,
    gains: [Decimal; 2],
    margin: Decimal,
) -> Option<[Decimal; 2]> {
    let lost = -loser_delta;
    if lost <= margin {
        return None;
    }
    let best_gain = gains[0].max(gains[1]);
    if best_gain <= Decimal::ZERO || lost > best_gain {
        return None;
    }
    Some(apportion(lost, gains))
}

/// Looks for votes lost by one entity and gained at the same time by another.
///
/// The apportionment order is fixed: a losing candidate gives to the other candidate
/// before the third party. For a losing third party, the bias flag decides which
/// candidate is served first: with `biased_against_candidate1`, candidate 1 is.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FindFraud {
    candidate1: Candidate,
    candidate2: Candidate,
    biased_against_candidate1: bool,
}

impl FindFraud {
    pub fn new(
        candidate1: &Candidate,
        candidate2: &Candidate,
        biased_against_candidate1: bool,
    ) -> FindFraud {
        FindFraud {
            candidate1: candidate1.clone(),
            candidate2: candidate2.clone(),
            biased_against_candidate1,
        }
    }

    pub fn is_biased_against_candidate1(&self) -> bool {
        self.biased_against_candidate1
    }

    /// The same heuristic, with the bias flag flipped.
    pub fn swap_bias(&self) -> FindFraud {
        FindFraud {
            biased_against_candidate1: !self.biased_against_candidate1,
            ..self.clone()
        }
    }

    pub fn having_bias_against_candidate1(&self) -> FindFraud {
        FindFraud {
            biased_against_candidate1: true,
            ..self.clone()
        }
    }

    pub fn having_bias_against_candidate2(&self) -> FindFraud {
        FindFraud {
            biased_against_candidate1: false,
            ..self.clone()
        }
    }

    pub fn apply<S: SnapshotView>(&self, prev: &S, curr: &S) -> DumpResult<VoteSwapData> {
        check_heuristic_pair(prev, curr)?;
        let (c1, c2) = (&self.candidate1, &self.candidate2);
        let margin = margin(prev);

        let delta1 = curr.exact_votes(c1) - prev.exact_votes(c1);
        let delta2 = curr.exact_votes(c2) - prev.exact_votes(c2);
        let delta3 = curr.exact_third_party_votes(c1, c2) - prev.exact_third_party_votes(c1, c2);

        let mut res = VoteSwapData::EMPTY;
        if let Some([to2, to3]) = swaps_for_loser(delta1, [delta2, delta3], margin) {
            res.candidate1_to_candidate2 = to2;
            res.candidate1_to_third_party = to3;
        }
        if let Some([to1, to3]) = swaps_for_loser(delta2, [delta1, delta3], margin) {
            res.candidate2_to_candidate1 = to1;
            res.candidate2_to_third_party = to3;
        }
        if self.biased_against_candidate1 {
            if let Some([to1, to2]) = swaps_for_loser(delta3, [delta1, delta2], margin) {
                res.third_party_to_candidate1 = to1;
                res.third_party_to_candidate2 = to2;
            }
        } else if let Some([to2, to1]) = swaps_for_loser(delta3, [delta2, delta1], margin) {
            res.third_party_to_candidate1 = to1;
            res.third_party_to_candidate2 = to2;
        }

        if res != VoteSwapData::EMPTY {
            debug!(
                "FindFraud::apply: {} -> {} (margin {}): {:?}",
                prev.timestamp(),
                curr.timestamp(),
                margin,
                res
            );
        }
        Ok(res)
    }

    /// Sums the heuristic over all the adjacent non-empty pairs of a series.
    pub fn over_series(&self, series: &TimeSeries) -> DumpResult<VoteSwapData> {
        series.validate(&self.candidate1, &self.candidate2)?;
        self.over_pairs(&series.non_empty_pairs())
    }

    /// Sums the heuristic over pairs taken from a series that was already validated.
    pub fn over_pairs(&self, pairs: &[SnapshotPair<'_>]) -> DumpResult<VoteSwapData> {
        let mut total = VoteSwapData::EMPTY;
        for (prev, curr) in pairs.iter() {
            total += self.apply(*prev, *curr)?;
        }
        info!(
            "FindFraud::over_pairs: biased against candidate 1: {}: {:?}",
            self.biased_against_candidate1, total
        );
        Ok(total)
    }
}
