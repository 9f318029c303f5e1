use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use log::{debug, info};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::errors::*;
use crate::series::TimeSeries;
use crate::snapshot::*;

/// Number of decimal places kept in a report.
pub const REPORT_DECIMALS: u32 = 3;

/// Rounds an exact value for presentation in a report, always with the same number
/// of decimal places.
pub fn present(value: Decimal) -> Decimal {
    let mut res =
        value.round_dp_with_strategy(REPORT_DECIMALS, RoundingStrategy::MidpointAwayFromZero);
    res.rescale(REPORT_DECIMALS);
    res
}

/// The three series of numbers in a report entry.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Bucket {
    Candidate1,
    Candidate2,
    ThirdParty,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Candidate1, Bucket::Candidate2, Bucket::ThirdParty];

    fn key(&self) -> &'static str {
        match self {
            Bucket::Candidate1 => "candidate1",
            Bucket::Candidate2 => "candidate2",
            Bucket::ThirdParty => "thirdParty",
        }
    }
}

/// The numbers of one candidate (or of the third party) in a report entry.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CandidateData {
    pub candidate: Candidate,
    #[serde(rename = "voteShare")]
    pub vote_share: Decimal,
    #[serde(rename = "totalVotes")]
    pub total_votes: Decimal,
    #[serde(rename = "deltaVotes")]
    pub delta_votes: Decimal,
    #[serde(rename = "deltaVoteShare")]
    pub delta_vote_share: Decimal,
}

/// One line of a report: a snapshot compared to the one before it.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    #[serde(rename = "originalIndex")]
    pub original_index: usize,
    pub timestamp: DateTime<FixedOffset>,
    #[serde(rename = "deltaSecondsFromPrev")]
    pub delta_seconds_from_prev: i64,
    #[serde(rename = "totalVotes")]
    pub total_votes: i64,
    #[serde(rename = "deltaVotesFromPrev")]
    pub delta_votes_from_prev: i64,
    pub candidate1: CandidateData,
    pub candidate2: CandidateData,
    #[serde(rename = "thirdParty")]
    pub third_party: CandidateData,
}

impl ReportEntry {
    pub fn data(&self, bucket: Bucket) -> &CandidateData {
        match bucket {
            Bucket::Candidate1 => &self.candidate1,
            Bucket::Candidate2 => &self.candidate2,
            Bucket::ThirdParty => &self.third_party,
        }
    }
}

// Unrounded figures for one bucket.
struct ExactData {
    share: Decimal,
    total: Decimal,
    delta: Decimal,
    delta_share: Decimal,
}

impl ExactData {
    fn present(&self, candidate: &Candidate) -> CandidateData {
        CandidateData {
            candidate: candidate.clone(),
            vote_share: present(self.share),
            total_votes: present(self.total),
            delta_votes: present(self.delta),
            delta_vote_share: present(self.delta_share),
        }
    }
}

/// The share of the new votes that went to one bucket. Zero when no vote was added.
fn delta_share(delta: Decimal, delta_votes: i64) -> Decimal {
    if delta_votes == 0 {
        Decimal::ZERO
    } else {
        delta / Decimal::from(delta_votes)
    }
}

fn candidate_exact(prev: &IndexedSnapshot, curr: &IndexedSnapshot, c: &Candidate) -> ExactData {
    let delta = curr.exact_votes(c) - prev.exact_votes(c);
    ExactData {
        share: curr.vote_share(c),
        total: curr.exact_votes(c),
        delta,
        delta_share: delta_share(delta, curr.total_votes() - prev.total_votes()),
    }
}

fn derive_entry(
    prev: &IndexedSnapshot,
    curr: &IndexedSnapshot,
    c1: &Candidate,
    c2: &Candidate,
) -> ReportEntry {
    let data1 = candidate_exact(prev, curr, c1);
    let data2 = candidate_exact(prev, curr, c2);
    // The third party is always the complement of the two candidates, including
    // for the delta vote share.
    let third = ExactData {
        share: curr.third_party_share(c1, c2),
        total: curr.exact_third_party_votes(c1, c2),
        delta: curr.exact_third_party_votes(c1, c2) - prev.exact_third_party_votes(c1, c2),
        delta_share: Decimal::ONE - data1.delta_share - data2.delta_share,
    };
    ReportEntry {
        original_index: curr.index(),
        timestamp: curr.timestamp(),
        delta_seconds_from_prev: (curr.timestamp() - prev.timestamp()).num_seconds(),
        total_votes: curr.total_votes(),
        delta_votes_from_prev: curr.total_votes() - prev.total_votes(),
        candidate1: data1.present(c1),
        candidate2: data2.present(c2),
        third_party: third.present(&Candidate::third_party()),
    }
}

/// A named quantity of a report entry, used to sort reports.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Metric {
    TotalVotes,
    DeltaVotes,
    DeltaSeconds,
    VoteShare(Bucket),
    DeltaVotesOf(Bucket),
    DeltaVoteShare(Bucket),
}

impl Metric {
    pub fn value(&self, entry: &ReportEntry) -> Decimal {
        match self {
            Metric::TotalVotes => Decimal::from(entry.total_votes),
            Metric::DeltaVotes => Decimal::from(entry.delta_votes_from_prev),
            Metric::DeltaSeconds => Decimal::from(entry.delta_seconds_from_prev),
            Metric::VoteShare(b) => entry.data(*b).vote_share,
            Metric::DeltaVotesOf(b) => entry.data(*b).delta_votes,
            Metric::DeltaVoteShare(b) => entry.data(*b).delta_vote_share,
        }
    }
}

/// Parses `totalVotes`, `deltaVotes`, `deltaSeconds` or `<bucket>.<field>` where the
/// bucket is `candidate1`, `candidate2` or `thirdParty` and the field is `voteShare`,
/// `deltaVotes` or `deltaVoteShare`.
impl FromStr for Metric {
    type Err = DumpError;

    fn from_str(s: &str) -> Result<Metric, DumpError> {
        let unknown = || UnknownMetricSnafu { name: s }.fail();
        match s.split_once('.') {
            None => match s {
                "totalVotes" => Ok(Metric::TotalVotes),
                "deltaVotes" => Ok(Metric::DeltaVotes),
                "deltaSeconds" => Ok(Metric::DeltaSeconds),
                _ => unknown(),
            },
            Some((bucket, field)) => {
                let b = match Bucket::ALL.iter().find(|b| b.key() == bucket) {
                    Some(b) => *b,
                    None => return unknown(),
                };
                match field {
                    "voteShare" => Ok(Metric::VoteShare(b)),
                    "deltaVotes" => Ok(Metric::DeltaVotesOf(b)),
                    "deltaVoteShare" => Ok(Metric::DeltaVoteShare(b)),
                    _ => unknown(),
                }
            }
        }
    }
}

/// The per-dump view of a time series, for two tracked candidates.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    candidate1: Candidate,
    candidate2: Candidate,
    entries: Vec<ReportEntry>,
}

impl Report {
    pub fn new(
        candidate1: &Candidate,
        candidate2: &Candidate,
        entries: Vec<ReportEntry>,
    ) -> Report {
        Report {
            candidate1: candidate1.clone(),
            candidate2: candidate2.clone(),
            entries,
        }
    }

    /// Validates the series and derives one entry for each of its non-empty snapshots,
    /// compared to the previous non-empty one (or to the leading empty snapshot).
    pub fn from_series(
        series: &TimeSeries,
        candidate1: &Candidate,
        candidate2: &Candidate,
    ) -> DumpResult<Report> {
        series.validate(candidate1, candidate2)?;
        let entries: Vec<ReportEntry> = series
            .report_pairs()
            .into_iter()
            .map(|(prev, curr)| derive_entry(prev, curr, candidate1, candidate2))
            .collect();
        info!(
            "Report::from_series: {} entries from {} snapshots",
            entries.len(),
            series.len()
        );
        Ok(Report::new(candidate1, candidate2, entries))
    }

    pub fn candidate1(&self) -> &Candidate {
        &self.candidate1
    }

    pub fn candidate2(&self) -> &Candidate {
        &self.candidate2
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A copy of the report, sorted by decreasing value of the metric.
    ///
    /// The sort is stable. The result is not in chronological order anymore.
    pub fn sort_by_desc<F>(&self, metric: F) -> Report
    where
        F: Fn(&ReportEntry) -> Decimal,
    {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| metric(b).cmp(&metric(a)));
        Report {
            entries,
            ..self.clone()
        }
    }

    pub fn sort_by_metric(&self, metric: Metric) -> Report {
        debug!("sort_by_metric: {:?}", metric);
        self.sort_by_desc(|e| metric.value(e))
    }

    pub fn to_json(&self) -> DumpResult<String> {
        serde_json::to_string_pretty(self).context(JsonSnafu {})
    }

    /// Reads a report back. Annotations, if present, are ignored.
    pub fn from_json(s: &str) -> DumpResult<Report> {
        serde_json::from_str(s).context(JsonSnafu {})
    }
}
