use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::errors::*;
use crate::report::*;
use crate::snapshot::Candidate;

/// A suspicious count in a single report entry.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum Anomaly {
    #[serde(rename = "negativeTotalVotes")]
    NegativeTotalVotes,
    #[serde(rename = "zeroTotalVotes")]
    ZeroTotalVotes,
    #[serde(rename = "negativeDeltaVotes")]
    NegativeDeltaVotes,
    #[serde(rename = "zeroDeltaVotes")]
    ZeroDeltaVotes,
}

/// An anomaly in an entry, either for the entry as a whole (no candidate) or for
/// one candidate of the entry.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct LocalAnomaly {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate: Option<Candidate>,
    pub anomaly: Anomaly,
}

/// A run of consecutive entries in which a candidate received exactly the same share
/// of the new votes.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RepeatedDeltaVoteShare {
    pub candidate: Candidate,
    #[serde(rename = "deltaVoteShare")]
    pub delta_vote_share: Decimal,
    #[serde(rename = "runLength")]
    pub run_length: usize,
    #[serde(rename = "startIndex")]
    pub start_index: usize,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedEntry {
    #[serde(flatten)]
    pub entry: ReportEntry,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<LocalAnomaly>,
}

/// A report with its findings attached. The report itself is left untouched.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedReport {
    candidate1: Candidate,
    candidate2: Candidate,
    #[serde(default)]
    anomalies: Vec<RepeatedDeltaVoteShare>,
    entries: Vec<AnnotatedEntry>,
}

impl AnnotatedReport {
    pub fn anomalies(&self) -> &[RepeatedDeltaVoteShare] {
        &self.anomalies
    }

    pub fn entries(&self) -> &[AnnotatedEntry] {
        &self.entries
    }

    /// The report without its annotations.
    pub fn strip(&self) -> Report {
        Report::new(
            &self.candidate1,
            &self.candidate2,
            self.entries.iter().map(|ae| ae.entry.clone()).collect(),
        )
    }

    pub fn to_json(&self) -> DumpResult<String> {
        serde_json::to_string_pretty(self).context(JsonSnafu {})
    }

    pub fn from_json(s: &str) -> DumpResult<AnnotatedReport> {
        serde_json::from_str(s).context(JsonSnafu {})
    }
}

fn count_anomalies(total: Decimal, delta: Decimal) -> Vec<Anomaly> {
    let mut res = Vec::new();
    if total < Decimal::ZERO {
        res.push(Anomaly::NegativeTotalVotes);
    }
    if total.is_zero() {
        res.push(Anomaly::ZeroTotalVotes);
    }
    if delta < Decimal::ZERO {
        res.push(Anomaly::NegativeDeltaVotes);
    }
    if delta.is_zero() {
        res.push(Anomaly::ZeroDeltaVotes);
    }
    res
}

/// The anomalies of one entry, entry-wide first, then per candidate.
pub fn local_anomalies(entry: &ReportEntry) -> Vec<LocalAnomaly> {
    let mut res: Vec<LocalAnomaly> = count_anomalies(
        Decimal::from(entry.total_votes),
        Decimal::from(entry.delta_votes_from_prev),
    )
    .into_iter()
    .map(|anomaly| LocalAnomaly {
        candidate: None,
        anomaly,
    })
    .collect();
    for bucket in Bucket::ALL {
        let data = entry.data(bucket);
        for anomaly in count_anomalies(data.total_votes, data.delta_votes) {
            res.push(LocalAnomaly {
                candidate: Some(data.candidate.clone()),
                anomaly,
            });
        }
    }
    res
}

/// Finds the runs of at least two consecutive entries (in original order) that share
/// the same delta vote share, for each candidate and the third party.
///
/// Runs do not overlap: a run stops at the first different value and the next one
/// starts there.
pub fn repeated_delta_vote_shares(report: &Report) -> Vec<RepeatedDeltaVoteShare> {
    let mut ordered: Vec<&ReportEntry> = report.entries().iter().collect();
    ordered.sort_by_key(|e| e.original_index);

    let mut res = Vec::new();
    for bucket in Bucket::ALL {
        let mut start = 0;
        while start < ordered.len() {
            let value = ordered[start].data(bucket).delta_vote_share;
            let mut end = start + 1;
            while end < ordered.len() && ordered[end].data(bucket).delta_vote_share == value {
                end += 1;
            }
            if end - start >= 2 {
                let finding = RepeatedDeltaVoteShare {
                    candidate: ordered[start].data(bucket).candidate.clone(),
                    delta_vote_share: value,
                    run_length: end - start,
                    start_index: ordered[start].original_index,
                };
                debug!("repeated_delta_vote_shares: {:?}", finding);
                res.push(finding);
            }
            start = end;
        }
    }
    res
}

/// Attaches the local anomalies to each entry and the repeated shares to the report.
pub fn annotate(report: &Report) -> AnnotatedReport {
    let entries: Vec<AnnotatedEntry> = report
        .entries()
        .iter()
        .map(|e| AnnotatedEntry {
            entry: e.clone(),
            anomalies: local_anomalies(e),
        })
        .collect();
    let anomalies = repeated_delta_vote_shares(report);
    debug!(
        "annotate: {} report findings, {} entries with anomalies",
        anomalies.len(),
        entries.iter().filter(|e| !e.anomalies.is_empty()).count()
    );
    AnnotatedReport {
        candidate1: report.candidate1().clone(),
        candidate2: report.candidate2().clone(),
        anomalies,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use rust_decimal_macros::dec;

    fn data(name: &str, total: Decimal, delta: Decimal, dvs: Decimal) -> CandidateData {
        CandidateData {
            candidate: Candidate::new(name),
            vote_share: dec!(0.5),
            total_votes: total,
            delta_votes: delta,
            delta_vote_share: dvs,
        }
    }

    fn entry(idx: usize, total: i64, delta: i64, dvs1: Decimal) -> ReportEntry {
        ReportEntry {
            original_index: idx,
            timestamp: DateTime::parse_from_rfc3339("2020-11-04T01:00:00Z").unwrap(),
            delta_seconds_from_prev: 60,
            total_votes: total,
            delta_votes_from_prev: delta,
            candidate1: data("bidenj", dec!(100), dec!(10), dvs1),
            candidate2: data("trumpd", dec!(90), dec!(9), dec!(0.4) + Decimal::from(idx)),
            third_party: data("other", dec!(10), dec!(1), dec!(0.1) - Decimal::from(idx)),
        }
    }

    fn report(entries: Vec<ReportEntry>) -> Report {
        Report::new(&Candidate::new("bidenj"), &Candidate::new("trumpd"), entries)
    }

    #[test]
    fn one_run_for_three_equal_values() {
        let r = report(vec![
            entry(3, 100, 10, dec!(0.1)),
            entry(4, 110, 10, dec!(0.2)),
            entry(5, 120, 10, dec!(0.5)),
            entry(6, 130, 10, dec!(0.5)),
            entry(7, 140, 10, dec!(0.5)),
            entry(8, 150, 10, dec!(0.3)),
        ]);
        let runs = repeated_delta_vote_shares(&r);
        assert_eq!(
            runs,
            vec![RepeatedDeltaVoteShare {
                candidate: Candidate::new("bidenj"),
                delta_vote_share: dec!(0.5),
                run_length: 3,
                start_index: 5,
            }]
        );
    }

    #[test]
    fn runs_do_not_overlap() {
        let r = report(vec![
            entry(0, 100, 10, dec!(0.5)),
            entry(1, 110, 10, dec!(0.5)),
            entry(2, 120, 10, dec!(0.6)),
            entry(3, 130, 10, dec!(0.6)),
            entry(4, 140, 10, dec!(0.6)),
            entry(5, 150, 10, dec!(0.5)),
        ]);
        let runs: Vec<(usize, usize)> = repeated_delta_vote_shares(&r)
            .iter()
            .map(|f| (f.start_index, f.run_length))
            .collect();
        assert_eq!(runs, vec![(0, 2), (2, 3)]);
    }

    #[test]
    fn runs_are_found_in_original_order() {
        let r = report(vec![
            entry(0, 100, 10, dec!(0.5)),
            entry(1, 110, 10, dec!(0.7)),
            entry(2, 120, 10, dec!(0.5)),
        ]);
        assert!(repeated_delta_vote_shares(&r).is_empty());
        let sorted = r.sort_by_metric(Metric::DeltaVoteShare(Bucket::Candidate1));
        assert!(repeated_delta_vote_shares(&sorted).is_empty());
    }

    #[test]
    fn local_checks() {
        let mut e = entry(0, 0, -5, dec!(0.5));
        e.candidate2.total_votes = dec!(-1);
        e.candidate2.delta_votes = Decimal::ZERO;
        let found = local_anomalies(&e);
        assert_eq!(
            found,
            vec![
                LocalAnomaly {
                    candidate: None,
                    anomaly: Anomaly::ZeroTotalVotes
                },
                LocalAnomaly {
                    candidate: None,
                    anomaly: Anomaly::NegativeDeltaVotes
                },
                LocalAnomaly {
                    candidate: Some(Candidate::new("trumpd")),
                    anomaly: Anomaly::NegativeTotalVotes
                },
                LocalAnomaly {
                    candidate: Some(Candidate::new("trumpd")),
                    anomaly: Anomaly::ZeroDeltaVotes
                },
            ]
        );
        assert!(local_anomalies(&entry(1, 100, 10, dec!(0.5))).is_empty());
    }

    #[test]
    fn strip_restores_the_report() {
        let r = report(vec![
            entry(0, 100, 0, dec!(0.5)),
            entry(1, 110, 10, dec!(0.5)),
            entry(2, 120, -10, dec!(0.6)),
        ]);
        let annotated = annotate(&r);
        assert_eq!(annotated.anomalies().len(), 1);
        assert_eq!(annotated.entries()[0].anomalies.len(), 1);
        assert!(annotated.entries()[1].anomalies.is_empty());
        assert_eq!(annotated.strip(), r);
    }

    #[test]
    fn annotated_json_round_trip() {
        let r = report(vec![
            entry(0, 100, 0, dec!(0.5)),
            entry(1, 110, 10, dec!(0.5)),
        ]);
        let annotated = annotate(&r);
        let js = annotated.to_json().unwrap();
        assert!(js.contains("\"zeroDeltaVotes\""));
        assert!(js.contains("\"runLength\": 2"));
        let back = AnnotatedReport::from_json(&js).unwrap();
        assert_eq!(back, annotated);
        assert_eq!(back.strip(), r);
        // The annotated form still reads as a plain report.
        assert_eq!(Report::from_json(&js).unwrap(), r);
    }
}
