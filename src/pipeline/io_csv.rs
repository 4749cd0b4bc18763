// Primitives for reading OpenElections-style precinct CSV files.

use std::io;

use log::debug;
use serde::Deserialize;
use snafu::prelude::*;

use ticket_engine::VoteRow;

use crate::pipeline::{
    BadVoteCountSnafu, CsvLineParseSnafu, MissingColumnSnafu, OpeningCsvSnafu, TicketResult,
};

/// One raw line of a precinct file. Every field is optional at this level;
/// the header check below is what makes an absent column fail fast.
#[derive(Debug, Deserialize)]
struct PrecinctRecord {
    #[serde(default)]
    county: Option<String>,
    #[serde(default)]
    precinct: Option<String>,
    #[serde(default)]
    office: Option<String>,
    #[serde(default)]
    district: Option<String>,
    #[serde(default)]
    party: Option<String>,
    #[serde(default)]
    candidate: Option<String>,
    #[serde(default)]
    votes: Option<String>,
}

const REQUIRED_COLUMNS: &[&str] = &["office", "district", "party", "candidate", "votes"];

pub fn read_precinct_file(path: &str) -> TicketResult<Vec<VoteRow>> {
    let reader = csv::Reader::from_path(path).context(OpeningCsvSnafu { path })?;
    read_precinct_csv(reader, path)
}

pub fn read_precinct_csv<R: io::Read>(
    mut reader: csv::Reader<R>,
    path: &str,
) -> TicketResult<Vec<VoteRow>> {
    let headers = reader.headers().context(OpeningCsvSnafu { path })?.clone();
    for required in REQUIRED_COLUMNS {
        ensure!(
            headers.iter().any(|h| h.trim() == *required),
            MissingColumnSnafu { name: *required }
        );
    }
    ensure!(
        headers
            .iter()
            .any(|h| h.trim() == "county" || h.trim() == "precinct"),
        MissingColumnSnafu { name: "county" }
    );

    let mut res: Vec<VoteRow> = Vec::new();
    for (idx, record) in reader.deserialize::<PrecinctRecord>().enumerate() {
        // The header occupies line 1.
        let lineno = idx + 2;
        let record = record.context(CsvLineParseSnafu { lineno })?;
        debug!("read_precinct_csv: line {}: {:?}", lineno, record);
        let votes = parse_votes(record.votes, lineno)?;
        res.push(VoteRow {
            county: clean_field(record.county).unwrap_or_default(),
            precinct: clean_field(record.precinct).unwrap_or_default(),
            office: clean_field(record.office).unwrap_or_default(),
            district: clean_field(record.district),
            party: clean_field(record.party),
            candidate: clean_field(record.candidate).unwrap_or_default(),
            votes,
        });
    }
    Ok(res)
}

fn clean_field(value: Option<String>) -> Option<String> {
    match value {
        Some(s) => {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        }
        None => None,
    }
}

fn parse_votes(value: Option<String>, lineno: usize) -> TicketResult<u64> {
    let raw = value.unwrap_or_default();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    if let Ok(v) = trimmed.parse::<u64>() {
        return Ok(v);
    }
    // Spreadsheet exports occasionally render counts as floats.
    match trimmed.parse::<f64>() {
        Ok(f) if f >= 0.0 && f.fract() == 0.0 => Ok(f as u64),
        _ => BadVoteCountSnafu {
            value: trimmed.to_string(),
            lineno,
        }
        .fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::TicketError;

    fn reader(data: &str) -> csv::Reader<&[u8]> {
        csv::Reader::from_reader(data.as_bytes())
    }

    #[test]
    fn reads_well_formed_rows() {
        let data = "\
county,precinct,office,district,party,candidate,votes
Barbour,1,Governor,,DEM,John Smith,120
Barbour,1,Governor,,REP,Jane Doe,98.0
Barbour,2,U.S. House,1,DEM,John Smith,
";
        let rows = read_precinct_csv(reader(data), "test.csv").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].candidate, "John Smith");
        assert_eq!(rows[0].votes, 120);
        assert_eq!(rows[0].district, None);
        assert_eq!(rows[1].votes, 98);
        assert_eq!(rows[2].district.as_deref(), Some("1"));
        assert_eq!(rows[2].votes, 0);
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let data = "\
county,precinct,office,district,party,votes
Barbour,1,Governor,,DEM,120
";
        let res = read_precinct_csv(reader(data), "test.csv");
        match res {
            Err(TicketError::MissingColumn { name }) => assert_eq!(name, "candidate"),
            x => panic!("expected a MissingColumn error, got {:?}", x),
        }
    }

    #[test]
    fn bad_vote_counts_are_fatal() {
        let data = "\
county,precinct,office,district,party,candidate,votes
Barbour,1,Governor,,DEM,John Smith,lots
";
        let res = read_precinct_csv(reader(data), "test.csv");
        match res {
            Err(TicketError::BadVoteCount { value, lineno }) => {
                assert_eq!(value, "lots");
                assert_eq!(lineno, 2);
            }
            x => panic!("expected a BadVoteCount error, got {:?}", x),
        }
    }

    #[test]
    fn rows_with_missing_labels_pass_through_for_the_caller_to_drop() {
        let data = "\
county,precinct,office,district,party,candidate,votes
Barbour,1,,,DEM,John Smith,5
Barbour,1,Governor,,,,7
";
        let rows = read_precinct_csv(reader(data), "test.csv").unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].office.is_empty());
        assert!(rows[1].candidate.is_empty());
    }
}
