// Report export in CSV format.

use std::fs::File;
use std::io;

use crate::dumps::*;

const CANDIDATE_FIELDS: [&str; 4] = ["voteShare", "totalVotes", "deltaVotes", "deltaVoteShare"];

/// One column per entry field, the candidate data being flattened as
/// `<candidate>_<field>`.
pub fn report_header(report: &Report) -> Vec<String> {
    let mut res: Vec<String> = vec![
        "originalIndex",
        "timestamp",
        "deltaSecondsFromPrev",
        "totalVotes",
        "deltaVotesFromPrev",
    ]
    .into_iter()
    .map(|s| s.to_string())
    .collect();
    let candidates = [
        report.candidate1().clone(),
        report.candidate2().clone(),
        Candidate::third_party(),
    ];
    for c in candidates.iter() {
        for field in CANDIDATE_FIELDS {
            res.push(format!("{}_{}", c, field));
        }
    }
    res
}

fn entry_record(entry: &ReportEntry) -> Vec<String> {
    let mut res = vec![
        entry.original_index.to_string(),
        entry.timestamp.to_rfc3339(),
        entry.delta_seconds_from_prev.to_string(),
        entry.total_votes.to_string(),
        entry.delta_votes_from_prev.to_string(),
    ];
    for bucket in Bucket::ALL {
        let data = entry.data(bucket);
        res.push(data.vote_share.to_string());
        res.push(data.total_votes.to_string());
        res.push(data.delta_votes.to_string());
        res.push(data.delta_vote_share.to_string());
    }
    res
}

pub fn write_records<W: io::Write>(writer: W, report: &Report) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(report_header(report))?;
    for entry in report.entries() {
        wtr.write_record(entry_record(entry))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_report_csv(report: &Report, path: &Path) -> CliResult<()> {
    let p = path.display().to_string();
    info!("Writing CSV report {:?}", p);
    let file = File::create(path).context(WritingFileSnafu { path: p.clone() })?;
    write_records(file, report).context(WritingCsvSnafu { path: p })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use vote_dumps::builder::Builder;

    #[test]
    fn flattened_columns() {
        let mut b = Builder::new("bidenj", "trumpd")
            .unwrap()
            .starting_at("2020-11-03T20:00:00Z")
            .unwrap();
        b.add_dump_simple("2020-11-03T20:30:00Z", 1000, Decimal::new(6, 1), Decimal::new(35, 2))
            .unwrap();
        let report = b.report().unwrap();

        let mut buf: Vec<u8> = Vec::new();
        write_records(&mut buf, &report).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("originalIndex,timestamp,deltaSecondsFromPrev,"));
        assert!(lines[0].contains("bidenj_voteShare,bidenj_totalVotes"));
        assert!(lines[0].ends_with("other_deltaVotes,other_deltaVoteShare"));
        assert_eq!(
            lines[1],
            "1,2020-11-03T20:30:00+00:00,1800,1000,1000,\
             0.600,600.000,600.000,0.600,\
             0.350,350.000,350.000,0.350,\
             0.050,50.000,50.000,0.050"
        );
    }
}
