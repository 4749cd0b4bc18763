// Output emitters. Every file is rendered in memory first and written in a
// single call, so a failing run never leaves a partial file behind.

use std::fs;

use log::warn;
use snafu::prelude::*;
use text_diff::print_diff;

use ticket_engine::{ChangeRecord, Ticket, VoteRow};

use crate::pipeline::{
    ReadingReferenceSnafu, SavingOutputSnafu, TicketResult, WritingOutputSnafu,
};

pub fn write_tickets(
    out_dir: &str,
    state: &str,
    year: &str,
    tickets: &[Ticket],
) -> TicketResult<String> {
    let path = format!("{}/{}__{}__tickets.csv", out_dir, state, year);
    let contents = render_tickets(tickets).context(WritingOutputSnafu { path: path.clone() })?;
    fs::write(&path, contents).context(SavingOutputSnafu { path: path.clone() })?;
    Ok(path)
}

pub fn write_changes(
    out_dir: &str,
    state: &str,
    year: &str,
    changes: &[ChangeRecord],
) -> TicketResult<String> {
    let path = format!("{}/{}__{}__ticket__changes.csv", out_dir, state, year);
    let contents = render_changes(changes).context(WritingOutputSnafu { path: path.clone() })?;
    fs::write(&path, contents).context(SavingOutputSnafu { path: path.clone() })?;
    Ok(path)
}

/// Writes the consolidated statewide precinct file, in the conventional
/// `YYYY__state__general__precinct.csv` naming.
pub fn write_statewide(
    out_dir: &str,
    state: &str,
    year: &str,
    rows: &[VoteRow],
) -> TicketResult<String> {
    let path = format!("{}/{}__{}__general__precinct.csv", out_dir, year, state);
    let contents = render_statewide(rows).context(WritingOutputSnafu { path: path.clone() })?;
    fs::write(&path, contents).context(SavingOutputSnafu { path: path.clone() })?;
    Ok(path)
}

pub fn check_reference(produced_path: &str, reference_path: &str) -> TicketResult<()> {
    let produced = fs::read_to_string(produced_path).context(ReadingReferenceSnafu {
        path: produced_path,
    })?;
    let reference = fs::read_to_string(reference_path).context(ReadingReferenceSnafu {
        path: reference_path,
    })?;
    if produced != reference {
        warn!("Found differences with the reference file");
        print_diff(reference.as_str(), produced.as_str(), "\n");
        whatever!(
            "Difference detected between {} and reference {}",
            produced_path,
            reference_path
        );
    }
    Ok(())
}

fn render_tickets(tickets: &[Ticket]) -> Result<String, csv::Error> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["office", "district", "candidate", "party"])?;
    for t in tickets {
        wtr.write_record([
            t.office.as_str(),
            t.district.as_str(),
            t.candidate.as_str(),
            t.party.as_str(),
        ])?;
    }
    finish(wtr)
}

fn render_changes(changes: &[ChangeRecord]) -> Result<String, csv::Error> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["iteration", "old", "new", "office"])?;
    for c in changes {
        wtr.write_record([
            c.iteration.to_string().as_str(),
            c.old.as_str(),
            c.new.as_str(),
            c.office.as_str(),
        ])?;
    }
    finish(wtr)
}

fn render_statewide(rows: &[VoteRow]) -> Result<String, csv::Error> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record([
        "county",
        "precinct",
        "office",
        "district",
        "party",
        "candidate",
        "votes",
    ])?;
    for r in rows {
        wtr.write_record([
            r.county.as_str(),
            r.precinct.as_str(),
            r.office.as_str(),
            r.district.as_deref().unwrap_or(""),
            r.party.as_deref().unwrap_or(""),
            r.candidate.as_str(),
            r.votes.to_string().as_str(),
        ])?;
    }
    finish(wtr)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, csv::Error> {
    let bytes = wtr
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    // The writer only ever receives valid UTF-8.
    Ok(String::from_utf8_lossy(&bytes).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tickets_render_with_blank_optionals() {
        let tickets = vec![
            Ticket {
                office: "GOVERNOR".to_string(),
                district: String::new(),
                candidate: "JOHN SMITH".to_string(),
                party: "DEM".to_string(),
            },
            Ticket {
                office: "U.S. HOUSE".to_string(),
                district: "2".to_string(),
                candidate: "JANE DOE".to_string(),
                party: String::new(),
            },
        ];
        let rendered = render_tickets(&tickets).unwrap();
        assert_eq!(
            rendered,
            "office,district,candidate,party\n\
             GOVERNOR,,JOHN SMITH,DEM\n\
             U.S. HOUSE,2,JANE DOE,\n"
        );
    }

    #[test]
    fn changes_render_one_line_per_merge() {
        let changes = vec![ChangeRecord {
            iteration: 1,
            old: "SMYTH JOHN".to_string(),
            new: "SMITH JOHN".to_string(),
            office: "GOVERNOR".to_string(),
        }];
        let rendered = render_changes(&changes).unwrap();
        assert_eq!(
            rendered,
            "iteration,old,new,office\n1,SMYTH JOHN,SMITH JOHN,GOVERNOR\n"
        );
    }

    #[test]
    fn statewide_rows_keep_their_vote_counts() {
        let rows = vec![VoteRow {
            county: "Kanawha".to_string(),
            precinct: "1".to_string(),
            office: "Governor".to_string(),
            district: None,
            party: Some("REP".to_string()),
            candidate: "JANE DOE".to_string(),
            votes: 98,
        }];
        let rendered = render_statewide(&rows).unwrap();
        assert_eq!(
            rendered,
            "county,precinct,office,district,party,candidate,votes\n\
             Kanawha,1,Governor,,REP,JANE DOE,98\n"
        );
    }
}
