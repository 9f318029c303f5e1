use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use snafu::{ensure, ResultExt};

use crate::errors::*;
use crate::report::Report;
use crate::series::TimeSeries;
use crate::snapshot::*;

/// A builder for assembling a time series in code.
///
/// ```
/// use rust_decimal::Decimal;
/// use vote_dumps::builder::Builder;
/// # use vote_dumps::DumpError;
///
/// let mut builder = Builder::new("bidenj", "trumpd")?.starting_at("2020-11-03T20:00:00Z")?;
///
/// builder.add_dump_simple("2020-11-03T21:00:00Z", 1000, Decimal::new(6, 1), Decimal::new(35, 2))?;
///
/// let report = builder.report()?;
/// assert_eq!(report.entries().len(), 1);
///
/// # Ok::<(), DumpError>(())
/// ```
pub struct Builder {
    pub(crate) _candidates: (Candidate, Candidate),
    pub(crate) _snapshots: Vec<Snapshot>,
}

fn parse_timestamp(timestamp: &str) -> DumpResult<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(timestamp).context(TimestampSnafu { value: timestamp })
}

impl Builder {
    pub fn new(candidate1: &str, candidate2: &str) -> DumpResult<Builder> {
        ensure!(
            candidate1 != candidate2,
            ValidationSnafu {
                message: format!("the two tracked candidates are both {}", candidate1),
            }
        );
        Ok(Builder {
            _candidates: (Candidate::new(candidate1), Candidate::new(candidate2)),
            _snapshots: Vec::new(),
        })
    }

    /// Starts the series with the mandatory empty snapshot, dropping anything added
    /// before.
    pub fn starting_at(self, timestamp: &str) -> DumpResult<Builder> {
        Ok(Builder {
            _candidates: self._candidates,
            _snapshots: vec![Snapshot::empty(parse_timestamp(timestamp)?)],
        })
    }

    /// Adds a dump with the shares of the two tracked candidates only.
    ///
    /// The third party gets the rest.
    pub fn add_dump_simple(
        &mut self,
        timestamp: &str,
        total_votes: i64,
        share1: Decimal,
        share2: Decimal,
    ) -> DumpResult<()> {
        let shares = vec![
            (self._candidates.0.clone(), share1),
            (self._candidates.1.clone(), share2),
        ];
        self.add_dump(parse_timestamp(timestamp)?, total_votes, &shares)
    }

    /// Adds a dump, possibly with other candidates than the tracked ones.
    pub fn add_dump(
        &mut self,
        timestamp: DateTime<FixedOffset>,
        total_votes: i64,
        shares: &[(Candidate, Decimal)],
    ) -> DumpResult<()> {
        let snapshot = Snapshot::new(shares.iter().cloned().collect(), total_votes, timestamp);
        self.add_snapshot(&snapshot)
    }

    pub fn add_snapshot(&mut self, snapshot: &Snapshot) -> DumpResult<()> {
        self._snapshots.push(snapshot.clone());
        Ok(())
    }

    /// The validated time series.
    pub fn build(&self) -> DumpResult<TimeSeries> {
        let series = TimeSeries::new(self._snapshots.clone());
        series.validate(&self._candidates.0, &self._candidates.1)?;
        Ok(series)
    }

    pub fn report(&self) -> DumpResult<Report> {
        Report::from_series(&self.build()?, &self._candidates.0, &self._candidates.1)
    }
}
