// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// One precinct-level tally line, as produced by the input readers.
///
/// The engine never mutates the caller's rows: each stage takes a slice
/// and returns an owned, rewritten table.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteRow {
    pub county: String,
    pub precinct: String,
    pub office: String,
    pub district: Option<String>,
    pub party: Option<String>,
    pub candidate: String,
    pub votes: u64,
}

// ******** Output data structures *********

/// A canonical (office, district, candidate, party) record representing one
/// real candidate's appearance in one contest.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Ticket {
    pub office: String,
    pub district: String,
    pub candidate: String,
    pub party: String,
}

/// One accepted merge decision: `old` was rewritten to `new` under `office`
/// during the given resolver iteration. Append-only; insertion order within
/// an iteration is preserved.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ChangeRecord {
    pub iteration: u32,
    pub old: String,
    pub new: String,
    pub office: String,
}

/// A pair of canonical labels that survived resolution but still look
/// suspiciously similar. Informational only.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct NearMatchWarning {
    pub office: String,
    pub label_a: String,
    pub label_b: String,
}

/// Statistics for one resolver iteration.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct IterationStats {
    pub iteration: u32,
    pub merges: usize,
    pub distinct_labels: usize,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TicketOutcome {
    pub tickets: Vec<Ticket>,
    pub changes: Vec<ChangeRecord>,
    pub warnings: Vec<NearMatchWarning>,
    pub iterations: Vec<IterationStats>,
}

/// Errors that prevent the resolution from completing successfully.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum EngineErrors {
    EmptyTable,
    NoConvergence,
}

impl Error for EngineErrors {}

impl Display for EngineErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineErrors::EmptyTable => write!(f, "ticket_engine: empty input table"),
            EngineErrors::NoConvergence => {
                write!(f, "ticket_engine: resolver exceeded the iteration ceiling")
            }
        }
    }
}

// ********* Configuration **********

/// The knobs of the resolver.
///
/// The two thresholds are inherited from the historical cleaning scripts and
/// have no documented derivation; they are parameters, not constants.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct ResolveRules {
    /// Minimum token-set score (0-100) for a merge to be accepted.
    pub match_threshold: u32,
    /// Minimum edit-similarity score (0-100) for a surviving pair to be flagged.
    pub warn_threshold: u32,
    /// Each iteration strictly reduces the distinct-label count, so the loop
    /// always terminates on real data. Exceeding this ceiling is an internal
    /// invariant violation, not a silent stop.
    pub max_iterations: u32,
}

impl ResolveRules {
    pub const DEFAULT_RULES: ResolveRules = ResolveRules {
        match_threshold: 85,
        warn_threshold: 75,
        max_iterations: 64,
    };
}
