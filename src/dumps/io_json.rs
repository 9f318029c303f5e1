// Reading election night time series, and writing reports.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::DateTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::value::RawValue;

use crate::dumps::*;

#[derive(Debug, Deserialize)]
struct FeedFile {
    data: FeedData,
}

#[derive(Debug, Deserialize)]
struct FeedData {
    races: Vec<FeedRace>,
}

#[derive(Debug, Deserialize)]
struct FeedRace {
    state_name: String,
    timeseries: Vec<FeedSnapshot>,
}

#[derive(Debug, Deserialize)]
struct FeedSnapshot {
    #[serde(default)]
    vote_shares: BTreeMap<String, Box<RawValue>>,
    votes: i64,
    timestamp: String,
}

/// The time series of one state, as read from a file. It is not validated yet.
#[derive(Debug, Clone)]
pub struct StateSeries {
    pub name: String,
    pub series: TimeSeries,
}

pub fn read_time_series(path: &Path) -> CliResult<StateSeries> {
    let p = path.display().to_string();
    info!("Attempting to read time series {:?}", p);
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path: p.clone() })?;
    parse_time_series(&contents, &p)
}

// Shares are parsed from the raw text of the JSON number and never go through f64.
fn parse_share(raw: &RawValue) -> Result<Decimal, rust_decimal::Error> {
    let text = raw.get().trim();
    Decimal::from_str(text).or_else(|_| Decimal::from_scientific(text))
}

pub fn parse_time_series(contents: &str, path: &str) -> CliResult<StateSeries> {
    let feed: FeedFile = serde_json::from_str(contents).context(ParsingJsonSnafu { path })?;
    let num_races = feed.data.races.len();
    let race = feed
        .data
        .races
        .into_iter()
        .next()
        .context(MissingRaceSnafu { path })?;
    if num_races > 1 {
        warn!(
            "{}: {} races found, only reading the first one ({})",
            path, num_races, race.state_name
        );
    }

    let mut snapshots: Vec<Snapshot> = Vec::with_capacity(race.timeseries.len());
    for (index, dump) in race.timeseries.iter().enumerate() {
        let timestamp =
            DateTime::parse_from_rfc3339(&dump.timestamp).context(ParsingTimestampSnafu {
                value: dump.timestamp.clone(),
                index,
                path,
            })?;
        let mut shares: BTreeMap<Candidate, Decimal> = BTreeMap::new();
        for (name, raw) in dump.vote_shares.iter() {
            let share = parse_share(raw).context(ParsingShareSnafu {
                value: raw.get(),
                candidate: name.clone(),
                path,
            })?;
            shares.insert(Candidate::new(name), share);
        }
        snapshots.push(Snapshot::new(shares, dump.votes, timestamp));
    }
    debug!(
        "parse_time_series: {}: {} snapshots for {}",
        path,
        snapshots.len(),
        race.state_name
    );
    Ok(StateSeries {
        name: race.state_name,
        series: TimeSeries::new(snapshots),
    })
}

pub fn write_report(path: &Path, contents: &str) -> CliResult<()> {
    info!("Writing report {:?}", path);
    fs::write(path, contents).context(WritingFileSnafu {
        path: path.display().to_string(),
    })
}

pub fn read_json_value(path: &Path) -> CliResult<JSValue> {
    let p = path.display().to_string();
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path: p.clone() })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path: p })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const FEED: &str = r#"{"data": {"races": [
      {"state_name": "Pennsylvania", "timeseries": [
        {"vote_shares": {}, "votes": 0, "timestamp": "2020-11-03T20:00:00-05:00"},
        {"vote_shares": {"bidenj": 0.1, "trumpd": 0.88, "jorgensenj": 1.5e-2},
         "votes": 2000, "timestamp": "2020-11-03T20:15:00-05:00"}
      ]},
      {"state_name": "Ignored", "timeseries": []}
    ]}}"#;

    #[test]
    fn reads_the_first_race() {
        let state = parse_time_series(FEED, "pa.json").unwrap();
        assert_eq!(state.name, "Pennsylvania");
        assert_eq!(state.series.len(), 2);
        let s = &state.series.snapshots()[1];
        assert_eq!(s.index(), 1);
        assert_eq!(s.total_votes(), 2000);
        assert_eq!(s.vote_share(&Candidate::new("bidenj")), dec!(0.1));
        assert_eq!(s.vote_share(&Candidate::new("jorgensenj")), dec!(0.015));
        assert_eq!(s.exact_votes(&Candidate::new("trumpd")), dec!(1760));
        assert!(state.series.snapshots()[0].is_empty());
        assert!(state
            .series
            .validate(&Candidate::new("bidenj"), &Candidate::new("trumpd"))
            .is_ok());
    }

    #[test]
    fn shares_keep_all_their_digits() {
        let feed = r#"{"data": {"races": [{"state_name": "Arizona", "timeseries": [
            {"vote_shares": {}, "votes": 0, "timestamp": "2020-11-03T20:00:00-07:00"},
            {"vote_shares": {"bidenj": 0.12345678901234567891, "trumpd": 0.5},
             "votes": 100000, "timestamp": "2020-11-03T20:15:00-07:00"}
        ]}]}}"#;
        let state = parse_time_series(feed, "az.json").unwrap();
        let s = &state.series.snapshots()[1];
        let share = s.vote_share(&Candidate::new("bidenj"));
        assert_eq!(share, dec!(0.12345678901234567891));
        assert_eq!(share.to_string(), "0.12345678901234567891");
        assert_eq!(
            s.exact_votes(&Candidate::new("bidenj")),
            dec!(12345.678901234567891)
        );
    }

    #[test]
    fn malformed_feeds() {
        assert!(matches!(
            parse_time_series(r#"{"data": {"races": []}}"#, "x.json"),
            Err(CliError::MissingRace { .. })
        ));
        assert!(matches!(
            parse_time_series(r#"{"data": {}}"#, "x.json"),
            Err(CliError::ParsingJson { .. })
        ));
        let bad_ts = r#"{"data": {"races": [{"state_name": "X", "timeseries": [
            {"vote_shares": {}, "votes": 0, "timestamp": "election night"}]}]}}"#;
        assert!(matches!(
            parse_time_series(bad_ts, "x.json"),
            Err(CliError::ParsingTimestamp { index: 0, .. })
        ));
        let bad_share = r#"{"data": {"races": [{"state_name": "X", "timeseries": [
            {"vote_shares": {"bidenj": "half"}, "votes": 10, "timestamp": "2020-11-03T20:00:00Z"}
        ]}]}}"#;
        assert!(matches!(
            parse_time_series(bad_share, "x.json"),
            Err(CliError::ParsingShare { .. })
        ));
    }

    #[test]
    fn missing_file() {
        let res = read_time_series(Path::new("/nonexistent/votedumps/ga.json"));
        assert!(matches!(res, Err(CliError::OpeningJson { .. })));
    }
}
