mod config;
pub mod normalize;
pub mod similarity;

use log::{debug, info, warn};

use std::collections::{HashMap, HashSet};

pub use crate::config::*;
pub use crate::normalize::{normalize_candidates, normalize_offices};

/// Runs the full resolution pipeline over a table of precinct rows:
/// label normalization, iterative fuzzy merging to a fixpoint, ticket
/// assembly and the near-match audit.
///
/// The caller must have dropped rows with a missing office or candidate
/// beforehand. The input is not modified; the outcome carries the final
/// ticket table, the full merge log, the surviving near-match warnings and
/// per-iteration statistics.
pub fn resolve_tickets(
    rows: &[VoteRow],
    rules: &ResolveRules,
) -> Result<TicketOutcome, EngineErrors> {
    if rows.is_empty() {
        return Err(EngineErrors::EmptyTable);
    }
    info!(
        "resolve_tickets: processing {} rows, rules: {:?}",
        rows.len(),
        rules
    );

    let mut table: Vec<VoteRow> = rows.to_vec();

    let before = distinct_count(table.iter().map(|r| r.candidate.as_str()));
    let cleaned = normalize_candidates(
        &table
            .iter()
            .map(|r| r.candidate.clone())
            .collect::<Vec<String>>(),
    );
    for (row, candidate) in table.iter_mut().zip(cleaned) {
        row.candidate = candidate;
    }
    let after = distinct_count(table.iter().map(|r| r.candidate.as_str()));
    info!("candidates: {} distinct labels, {} after cleaning", before, after);

    let before = distinct_count(table.iter().map(|r| r.office.as_str()));
    let cleaned = normalize_offices(
        &table
            .iter()
            .map(|r| r.office.clone())
            .collect::<Vec<String>>(),
    );
    for (row, office) in table.iter_mut().zip(cleaned) {
        row.office = office;
    }
    let after = distinct_count(table.iter().map(|r| r.office.as_str()));
    info!("offices: {} distinct labels, {} after cleaning", before, after);

    let mut changes: Vec<ChangeRecord> = Vec::new();
    let mut iterations: Vec<IterationStats> = Vec::new();
    let mut iteration: u32 = 1;
    loop {
        if iteration > rules.max_iterations {
            return Err(EngineErrors::NoConvergence);
        }
        let accepted = match_pass(&table, rules);
        let merges = accepted.len();

        if merges > 0 {
            let subst: HashMap<String, String> = accepted
                .iter()
                .map(|m| (m.old.clone(), m.new.clone()))
                .collect();
            for row in table.iter_mut() {
                if let Some(new) = subst.get(&row.candidate) {
                    row.candidate = new.clone();
                }
            }
        }
        for m in accepted {
            changes.push(ChangeRecord {
                iteration,
                old: m.old,
                new: m.new,
                office: m.office,
            });
        }

        let distinct = distinct_count(table.iter().map(|r| r.candidate.as_str()));
        info!(
            "iteration {}: {} merges, {} distinct labels",
            iteration, merges, distinct
        );
        iterations.push(IterationStats {
            iteration,
            merges,
            distinct_labels: distinct,
        });
        // The converging, empty iteration is recorded too.
        if merges == 0 {
            break;
        }
        iteration += 1;
    }

    let tickets = assemble_tickets(&table);
    let warnings = find_near_matches(&table, rules);
    for w in warnings.iter() {
        warn!("near match in {}: {} & {}", w.office, w.label_a, w.label_b);
    }

    Ok(TicketOutcome {
        tickets,
        changes,
        warnings,
        iterations,
    })
}

struct AcceptedMatch {
    old: String,
    new: String,
    office: String,
}

/// One merge pass over the current table.
///
/// Labels are visited from most to least frequent so that rare, noisy
/// variants get absorbed into the common spelling. Within a single pass a
/// label chosen as a merge target is frozen: it can keep absorbing other
/// labels but can no longer be merged away itself, which rules out merge
/// cycles inside the pass. Pairs whose first-observed offices differ are
/// discarded regardless of score.
fn match_pass(table: &[VoteRow], rules: &ResolveRules) -> Vec<AcceptedMatch> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut labels: Vec<&str> = Vec::new();
    for row in table.iter() {
        let seen = counts.entry(row.candidate.as_str()).or_insert(0);
        if *seen == 0 {
            labels.push(row.candidate.as_str());
        }
        *seen += 1;
    }
    // Stable sort: ties keep their first-appearance order.
    labels.sort_by_key(|l| std::cmp::Reverse(counts[l]));

    let mut office_of: HashMap<&str, &str> = HashMap::new();
    for row in table.iter() {
        office_of
            .entry(row.candidate.as_str())
            .or_insert(row.office.as_str());
    }

    let mut superseded: HashSet<&str> = HashSet::new();
    let mut targets: HashSet<&str> = HashSet::new();
    let mut accepted: Vec<AcceptedMatch> = Vec::new();

    for &name in labels.iter() {
        if superseded.contains(name) {
            continue;
        }
        for &other in labels.iter() {
            if other == name || superseded.contains(other) || targets.contains(other) {
                continue;
            }
            let score = similarity::token_set_ratio(name, other);
            if score < rules.match_threshold {
                continue;
            }
            let name_office = office_of[name];
            if name_office != office_of[other] {
                debug!(
                    "match_pass: dropping cross-office match {:?} / {:?} (score {})",
                    name, other, score
                );
                continue;
            }
            debug!(
                "match_pass: {:?} -> {:?} in {:?} (score {})",
                other, name, name_office, score
            );
            superseded.insert(other);
            targets.insert(name);
            accepted.push(AcceptedMatch {
                old: other.to_string(),
                new: name.to_string(),
                office: name_office.to_string(),
            });
        }
    }
    accepted
}

/// Extracts one ticket per distinct (office, candidate) pair, offices and
/// candidates in first-seen order. District and party come from the first
/// row observed for the pair; later disagreements are logged and passed
/// through, never raised.
pub fn assemble_tickets(table: &[VoteRow]) -> Vec<Ticket> {
    let mut offices: Vec<&str> = Vec::new();
    let mut seen_offices: HashSet<&str> = HashSet::new();
    for row in table.iter() {
        if seen_offices.insert(row.office.as_str()) {
            offices.push(row.office.as_str());
        }
    }

    let mut tickets: Vec<Ticket> = Vec::new();
    for office in offices {
        let mut seen: HashSet<&str> = HashSet::new();
        for row in table.iter().filter(|r| r.office == office) {
            if row.candidate.is_empty() {
                continue;
            }
            if !seen.insert(row.candidate.as_str()) {
                continue;
            }
            tickets.push(Ticket {
                office: office.to_string(),
                district: row.district.clone().unwrap_or_default(),
                candidate: row.candidate.clone(),
                party: row.party.clone().unwrap_or_default(),
            });
        }
    }

    report_inconsistent_rows(table, &tickets);
    tickets
}

// Data-quality diagnostic only: flags candidates whose district or party
// varies across rows.
fn report_inconsistent_rows(table: &[VoteRow], tickets: &[Ticket]) {
    let mut by_key: HashMap<(&str, &str), &Ticket> = HashMap::new();
    for t in tickets.iter() {
        by_key.insert((t.office.as_str(), t.candidate.as_str()), t);
    }
    let mut reported: HashSet<(&str, &str)> = HashSet::new();
    for row in table.iter() {
        let key = (row.office.as_str(), row.candidate.as_str());
        if let Some(t) = by_key.get(&key) {
            let district = row.district.clone().unwrap_or_default();
            let party = row.party.clone().unwrap_or_default();
            if (district != t.district || party != t.party) && reported.insert(key) {
                warn!(
                    "inconsistent district/party for {:?} in {:?}: keeping first-seen ({:?}, {:?})",
                    row.candidate, row.office, t.district, t.party
                );
            }
        }
    }
}

/// Flags pairs of canonical labels within an office that score above the
/// warning threshold on plain edit similarity. Read-only: no label is
/// changed on the basis of a warning.
pub fn find_near_matches(table: &[VoteRow], rules: &ResolveRules) -> Vec<NearMatchWarning> {
    let mut offices: Vec<&str> = Vec::new();
    let mut seen_offices: HashSet<&str> = HashSet::new();
    for row in table.iter() {
        if seen_offices.insert(row.office.as_str()) {
            offices.push(row.office.as_str());
        }
    }

    let mut warnings: Vec<NearMatchWarning> = Vec::new();
    for office in offices {
        let mut candidates: Vec<&str> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for row in table.iter().filter(|r| r.office == office) {
            if !row.candidate.is_empty() && seen.insert(row.candidate.as_str()) {
                candidates.push(row.candidate.as_str());
            }
        }
        // Office groups hold tens of candidates at most, the quadratic
        // scan is fine.
        for (i, a) in candidates.iter().enumerate() {
            for b in candidates.iter().skip(i + 1) {
                if similarity::ratio(a, b) >= rules.warn_threshold {
                    warnings.push(NearMatchWarning {
                        office: office.to_string(),
                        label_a: (*a).to_string(),
                        label_b: (*b).to_string(),
                    });
                }
            }
        }
    }
    warnings
}

fn distinct_count<'a, I: Iterator<Item = &'a str>>(labels: I) -> usize {
    let mut seen: HashSet<&str> = HashSet::new();
    for l in labels {
        seen.insert(l);
    }
    seen.len()
}
