// Converter for the 2008 West Virginia county result workbooks.
//
// Each workbook holds one sheet per county: a `COUNTY NAME:` header line,
// then one block per precinct. Every block lists the contested offices with
// their office codes between the `TOTAL BY CONTEST` and `TOTAL BY CANDIDATE`
// markers, followed by one line per candidate carrying the office code, a
// "PARTY - NAME" cell and the vote count. Office results are not
// consistently contiguous, so the office code is what identifies a vote
// line, not its position.

use calamine::{open_workbook, DataType, Reader, Xlsx};
use log::debug;
use snafu::prelude::*;

use ticket_engine::VoteRow;

use crate::pipeline::{EmptyExcelSnafu, OpeningExcelSnafu, TicketResult};

const OFFICE_TITLES: &[(&str, &str)] = &[
    ("U.S. President", "President"),
    ("U.S. Senate", "U.S. Senate"),
    ("U.S. House of Representatives", "U.S. House"),
    ("Governor", "Governor"),
    ("Secretary of State", "Secretary of State"),
    ("State Treasurer", "State Treasurer"),
    ("Auditor", "State Auditor"),
    ("Commissioner of Agriculture", "Commissioner of Agriculture"),
    ("Attorney General", "Attorney General"),
    ("State Senate", "State Senate"),
    ("House of Delegates", "State House"),
];

const PARTY_CODES: &[(&str, &str)] = &[("D", "DEM"), ("R", "REP"), ("M", "MTN"), ("C", "CON")];

// Congressional district of each county, relevant for U.S. House results only.
const US_HOUSE_DISTRICTS: &[(&str, &str)] = &[
    ("Barbour", "1"),
    ("Berkeley", "2"),
    ("Boone", "3"),
    ("Braxton", "2"),
    ("Brooke", "1"),
    ("Cabell", "3"),
    ("Calhoun", "2"),
    ("Clay", "2"),
    ("Doddridge", "1"),
    ("Fayette", "3"),
    ("Gilmer", "1"),
    ("Grant", "1"),
    ("Greenbrier", "3"),
    ("Hampshire", "2"),
    ("Hancock", "1"),
    ("Hardy", "2"),
    ("Harrison", "1"),
    ("Jackson", "2"),
    ("Jefferson", "2"),
    ("Kanawha", "2"),
    ("Lewis", "2"),
    ("Lincoln", "3"),
    ("Logan", "3"),
    ("Marion", "1"),
    ("Marshall", "1"),
    ("Mason", "3"),
    ("McDowell", "3"),
    ("Mercer", "3"),
    ("Mineral", "1"),
    ("Mingo", "3"),
    ("Monongalia", "1"),
    ("Monroe", "3"),
    ("Morgan", "2"),
    ("Nicholas", "3"),
    ("Ohio", "1"),
    ("Pendleton", "2"),
    ("Pleasants", "1"),
    ("Pocahontas", "3"),
    ("Preston", "1"),
    ("Putnam", "2"),
    ("Raleigh", "3"),
    ("Randolph", "2"),
    ("Ritchie", "1"),
    ("Roane", "2"),
    ("Summers", "3"),
    ("Taylor", "1"),
    ("Tucker", "1"),
    ("Tyler", "1"),
    ("Upshur", "2"),
    ("Wayne", "3"),
    ("Webster", "3"),
    ("Wetzel", "1"),
    ("Wirt", "2"),
    ("Wood", "1"),
    ("Wyoming", "3"),
];

pub fn read_workbook(path: &str) -> TicketResult<Vec<VoteRow>> {
    let mut workbook: Xlsx<_> =
        open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = workbook
        .worksheet_range_at(0)
        .context(EmptyExcelSnafu { path })?
        .context(OpeningExcelSnafu { path })?;
    let rows: Vec<Vec<DataType>> = wrange.rows().map(|r| r.to_vec()).collect();
    parse_county_sheet(&rows)
}

pub fn parse_county_sheet(rows: &[Vec<DataType>]) -> TicketResult<Vec<VoteRow>> {
    let county = rows
        .first()
        .and_then(|r| cell_str(r, 0))
        .and_then(|s| s.strip_prefix("COUNTY NAME:").map(|c| c.trim().to_string()));
    let county = match county {
        Some(c) if !c.is_empty() => c,
        _ => whatever!("workbook does not start with a COUNTY NAME header"),
    };

    let mut res: Vec<VoteRow> = Vec::new();
    for block in precinct_blocks(rows) {
        let offices = contested_offices(block.rows);
        debug!(
            "precinct {}: {} contested offices",
            block.precinct,
            offices.len()
        );
        parse_vote_lines(&block, &offices, &county, &mut res);
    }
    Ok(res)
}

struct PrecinctBlock<'a> {
    precinct: String,
    rows: &'a [Vec<DataType>],
}

fn precinct_blocks(rows: &[Vec<DataType>]) -> Vec<PrecinctBlock<'_>> {
    let mut starts: Vec<(usize, String)> = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let precinct = cell_str(row, 0)
            .and_then(|s| s.strip_prefix("PRECINCT:").map(|p| p.trim().to_string()));
        if let Some(p) = precinct {
            starts.push((i, p));
        }
    }
    let mut blocks: Vec<PrecinctBlock<'_>> = Vec::new();
    for (k, (start, precinct)) in starts.iter().enumerate() {
        let end = starts.get(k + 1).map(|(i, _)| *i).unwrap_or(rows.len());
        blocks.push(PrecinctBlock {
            precinct: precinct.clone(),
            rows: &rows[*start..end],
        });
    }
    blocks
}

/// The office-code table of one precinct block: code -> workbook title.
fn contested_offices(rows: &[Vec<DataType>]) -> Vec<(String, String)> {
    let mut offices: Vec<(String, String)> = Vec::new();
    let mut parsing = false;
    for row in rows {
        if let Some(head) = cell_str(row, 0) {
            if head.starts_with("TOTAL BY CONTEST") {
                parsing = true;
                continue;
            }
            if head.starts_with("TOTAL BY CANDIDATE") {
                break;
            }
        }
        if !parsing {
            continue;
        }
        let cells: Vec<&DataType> = row.iter().filter(|c| !is_blank(c)).collect();
        if cells.is_empty() {
            continue;
        }
        if cells.len() != 3 {
            // End of the contest table.
            parsing = false;
            continue;
        }
        if let (DataType::String(code), DataType::String(title)) = (cells[0], cells[1]) {
            offices.push((code.trim().to_string(), title.trim().to_string()));
        }
    }
    offices
}

fn parse_vote_lines(
    block: &PrecinctBlock<'_>,
    offices: &[(String, String)],
    county: &str,
    out: &mut Vec<VoteRow>,
) {
    let mut parsing = false;
    for row in block.rows {
        if !parsing {
            parsing = cell_str(row, 0)
                .map(|s| s.starts_with("TOTAL BY CANDIDATE"))
                .unwrap_or(false);
            continue;
        }
        let code = match cell_str(row, 1) {
            Some(c) => c,
            None => continue,
        };
        let title = match offices.iter().find(|(c, _)| *c == code) {
            Some((_, t)) => t.as_str(),
            None => continue,
        };
        let office = match lookup(OFFICE_TITLES, title) {
            Some(o) => o,
            None => continue,
        };
        let (party_code, candidate) = match cell_str(row, 3).as_deref().and_then(split_party) {
            Some(pc) => pc,
            None => continue,
        };
        let votes = cell_u64(row, 5).unwrap_or(0);
        let district = if office == "U.S. House" {
            lookup(US_HOUSE_DISTRICTS, county).map(|d| d.to_string())
        } else {
            None
        };
        out.push(VoteRow {
            county: county.to_string(),
            precinct: block.precinct.clone(),
            office: office.to_string(),
            district,
            party: lookup(PARTY_CODES, party_code.as_str()).map(|p| p.to_string()),
            candidate,
            votes,
        });
    }
}

fn split_party(cell: &str) -> Option<(String, String)> {
    cell.split_once(" - ")
        .map(|(p, c)| (p.trim().to_string(), c.trim().to_string()))
}

fn lookup<'a>(table: &'a [(&str, &str)], key: &str) -> Option<&'a str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

fn cell_str(row: &[DataType], idx: usize) -> Option<String> {
    match row.get(idx) {
        Some(DataType::String(s)) => {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        }
        Some(DataType::Int(i)) => Some(i.to_string()),
        Some(DataType::Float(f)) if f.fract() == 0.0 => Some((*f as i64).to_string()),
        Some(DataType::Float(f)) => Some(f.to_string()),
        _ => None,
    }
}

fn cell_u64(row: &[DataType], idx: usize) -> Option<u64> {
    match row.get(idx) {
        Some(DataType::Int(i)) if *i >= 0 => Some(*i as u64),
        Some(DataType::Float(f)) if *f >= 0.0 => Some(*f as u64),
        Some(DataType::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

fn is_blank(cell: &DataType) -> bool {
    match cell {
        DataType::Empty => true,
        DataType::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::DataType as DT;

    fn s(v: &str) -> DT {
        DT::String(v.to_string())
    }

    fn blank() -> DT {
        DT::Empty
    }

    fn sheet() -> Vec<Vec<DT>> {
        vec![
            vec![s("COUNTY NAME: Kanawha")],
            vec![blank()],
            vec![s("PRECINCT: 1")],
            vec![s("TOTAL BY CONTEST")],
            vec![s("001"), s("U.S. President"), DT::Float(450.0)],
            vec![s("002"), s("Governor"), DT::Float(430.0)],
            vec![s("003"), s("Mingo Co Magistrate"), DT::Float(50.0)],
            vec![s("TOTAL BY CANDIDATE")],
            vec![
                blank(),
                s("001"),
                blank(),
                s("D - BARACK OBAMA"),
                blank(),
                DT::Float(250.0),
            ],
            vec![
                blank(),
                s("001"),
                blank(),
                s("R - JOHN MCCAIN"),
                blank(),
                DT::Float(200.0),
            ],
            vec![
                blank(),
                s("002"),
                blank(),
                s("D - JOE MANCHIN"),
                blank(),
                DT::Float(300.0),
            ],
            vec![
                blank(),
                s("003"),
                blank(),
                s("D - SOME LOCAL"),
                blank(),
                DT::Float(40.0),
            ],
            vec![s("PRECINCT: 2")],
            vec![s("TOTAL BY CONTEST")],
            vec![s("001"), s("U.S. President"), DT::Float(90.0)],
            vec![s("TOTAL BY CANDIDATE")],
            vec![
                blank(),
                s("001"),
                blank(),
                s("D - BARACK OBAMA"),
                blank(),
                DT::Float(90.0),
            ],
        ]
    }

    #[test]
    fn parses_precinct_blocks() {
        let rows = parse_county_sheet(&sheet()).unwrap();
        // The magistrate contest is not a tracked office and is skipped.
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].county, "Kanawha");
        assert_eq!(rows[0].precinct, "1");
        assert_eq!(rows[0].office, "President");
        assert_eq!(rows[0].candidate, "BARACK OBAMA");
        assert_eq!(rows[0].party.as_deref(), Some("DEM"));
        assert_eq!(rows[0].votes, 250);
        assert_eq!(rows[1].party.as_deref(), Some("REP"));
        assert_eq!(rows[2].office, "Governor");
        assert_eq!(rows[3].precinct, "2");
        assert_eq!(rows[3].votes, 90);
    }

    #[test]
    fn house_rows_get_the_county_district() {
        let sheet = vec![
            vec![s("COUNTY NAME: Kanawha")],
            vec![s("PRECINCT: 7")],
            vec![s("TOTAL BY CONTEST")],
            vec![s("010"), s("U.S. House of Representatives"), DT::Float(10.0)],
            vec![s("TOTAL BY CANDIDATE")],
            vec![
                blank(),
                s("010"),
                blank(),
                s("D - SHELLEY CAPITO"),
                blank(),
                DT::Float(10.0),
            ],
        ];
        let rows = parse_county_sheet(&sheet).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].office, "U.S. House");
        assert_eq!(rows[0].district.as_deref(), Some("2"));
    }

    #[test]
    fn missing_county_header_is_fatal() {
        let sheet = vec![vec![s("PRECINCT: 1")]];
        assert!(parse_county_sheet(&sheet).is_err());
    }
}
