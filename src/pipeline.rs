use log::{debug, info};

use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use ticket_engine::{ResolveRules, VoteRow};

use crate::args::Args;
use crate::pipeline::config_reader::*;

pub mod io_common;
pub mod io_csv;
pub mod io_wv2008;
pub mod output;

#[derive(Debug, Snafu)]
pub enum TicketError {
    #[snafu(display("Error opening workbook {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Workbook {path} has no readable sheet"))]
    EmptyExcel { path: String },
    #[snafu(display("Error opening csv file {path}"))]
    OpeningCsv { source: csv::Error, path: String },
    #[snafu(display("Error parsing csv line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Missing required column {name}"))]
    MissingColumn { name: String },
    #[snafu(display("Bad vote count {value:?} on line {lineno}"))]
    BadVoteCount { value: String, lineno: usize },
    #[snafu(display(""))]
    OpeningJson { source: std::io::Error },
    #[snafu(display(""))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display(""))]
    MissingParentDir {},
    #[snafu(display("Error scanning input directory {path}"))]
    ScanningInputs {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error creating output directory {path}"))]
    CreatingOutputDir {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error rendering output file {path}"))]
    WritingOutput { source: csv::Error, path: String },
    #[snafu(display("Error saving output file {path}"))]
    SavingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading reference file {path}"))]
    ReadingReference {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Ticket resolution failed"))]
    Resolution { source: ticket_engine::EngineErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type TicketResult<T> = Result<T, TicketError>;

pub mod config_reader {
    use crate::pipeline::*;

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct OutputSettings {
        #[serde(rename = "stateName")]
        pub state_name: String,
        pub year: String,
        #[serde(rename = "outputDirectory")]
        pub output_directory: Option<String>,
        #[serde(rename = "writeStatewideFile")]
        pub write_statewide_file: Option<bool>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct FileSource {
        pub provider: String,
        #[serde(rename = "filePath")]
        pub file_path: String,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct TicketRules {
        #[serde(rename = "matchThreshold")]
        pub match_threshold: Option<u32>,
        #[serde(rename = "warnThreshold")]
        pub warn_threshold: Option<u32>,
        #[serde(rename = "maxIterations")]
        pub max_iterations: Option<u32>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct TicketConfig {
        #[serde(rename = "outputSettings")]
        pub output_settings: OutputSettings,
        #[serde(rename = "resultFileSources")]
        pub result_file_sources: Vec<FileSource>,
        pub rules: Option<TicketRules>,
    }

    pub fn read_config(path: &str) -> TicketResult<TicketConfig> {
        let contents = fs::read_to_string(path).context(OpeningJsonSnafu {})?;
        debug!("read config: {:?}", contents);
        let config: TicketConfig =
            serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
        Ok(config)
    }
}

/// The fully assembled settings for one run, after merging the JSON
/// configuration (if any) with the command-line flags.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub state: String,
    pub year: String,
    pub out_dir: String,
    pub sources: Vec<FileSource>,
    pub rules: ResolveRules,
    pub consolidate: bool,
    pub reference: Option<String>,
}

pub fn run_pipeline(args: &Args) -> TicketResult<()> {
    let run = assemble_run(args)?;
    info!(
        "Getting tickets for {} in {} ({} result files)",
        run.state,
        run.year,
        run.sources.len()
    );

    let mut rows: Vec<VoteRow> = Vec::new();
    for source in run.sources.iter() {
        let mut file_rows = read_result_file(source)?;
        info!("{}: {} rows", source.file_path, file_rows.len());
        rows.append(&mut file_rows);
    }

    // Engine precondition: rows without an office or candidate are dropped
    // before resolution starts.
    let total = rows.len();
    rows.retain(|r| !r.office.trim().is_empty() && !r.candidate.trim().is_empty());
    if rows.len() < total {
        info!(
            "dropped {} rows with a missing office or candidate",
            total - rows.len()
        );
    }

    let outcome = ticket_engine::resolve_tickets(&rows, &run.rules).context(ResolutionSnafu {})?;
    info!(
        "{} tickets, {} merges over {} iterations, {} near-match warnings",
        outcome.tickets.len(),
        outcome.changes.len(),
        outcome.iterations.len(),
        outcome.warnings.len()
    );

    // All computation is done; only now do any files get written.
    fs::create_dir_all(&run.out_dir).context(CreatingOutputDirSnafu {
        path: run.out_dir.clone(),
    })?;
    let tickets_path = output::write_tickets(&run.out_dir, &run.state, &run.year, &outcome.tickets)?;
    output::write_changes(&run.out_dir, &run.state, &run.year, &outcome.changes)?;
    if run.consolidate {
        output::write_statewide(&run.out_dir, &run.state, &run.year, &rows)?;
    }
    info!("Finished and saved to file at {}", tickets_path);

    if let Some(reference) = run.reference.as_ref() {
        output::check_reference(&tickets_path, reference)?;
    }
    Ok(())
}

fn assemble_run(args: &Args) -> TicketResult<RunSettings> {
    let mut state = args.state.clone();
    let mut year = args.year.clone();
    let mut out_dir = args.out.clone();
    let mut sources: Vec<FileSource> = Vec::new();
    let mut rules = ResolveRules::DEFAULT_RULES;
    let mut consolidate = args.consolidate;

    if let Some(config_path) = args.config.as_ref() {
        let config = read_config(config_path)?;
        info!("config: {:?}", config);
        let root = Path::new(config_path.as_str())
            .parent()
            .context(MissingParentDirSnafu {})?;

        if state.is_none() {
            state = Some(config.output_settings.state_name.clone());
        }
        if year.is_none() {
            year = Some(config.output_settings.year.clone());
        }
        if out_dir.is_none() {
            out_dir = config.output_settings.output_directory.clone();
        }
        consolidate =
            consolidate || config.output_settings.write_statewide_file.unwrap_or(false);

        for source in config.result_file_sources.iter() {
            let p = root.join(source.file_path.as_str());
            sources.push(FileSource {
                provider: source.provider.clone(),
                file_path: p.display().to_string(),
            });
        }
        if let Some(config_rules) = config.rules {
            if let Some(t) = config_rules.match_threshold {
                rules.match_threshold = t;
            }
            if let Some(t) = config_rules.warn_threshold {
                rules.warn_threshold = t;
            }
            if let Some(n) = config_rules.max_iterations {
                rules.max_iterations = n;
            }
        }
    }

    if let Some(input) = args.input.as_ref() {
        let provider = args.input_type.clone().unwrap_or_else(|| "csv".to_string());
        if Path::new(input.as_str()).is_dir() {
            let files = io_common::find_precinct_files(input, year.as_deref())?;
            ensure_whatever!(!files.is_empty(), "No precinct files found under {}", input);
            sources = files
                .into_iter()
                .map(|f| FileSource {
                    provider: "csv".to_string(),
                    file_path: f,
                })
                .collect();
        } else {
            sources = vec![FileSource {
                provider,
                file_path: input.clone(),
            }];
        }
    }

    ensure_whatever!(
        !sources.is_empty(),
        "No result files specified; pass --input or --config"
    );
    let state = match state {
        Some(s) => s,
        None => whatever!("No state name specified; pass --state or a configuration file"),
    };
    let year = match year {
        Some(y) => y,
        None => whatever!("No election year specified; pass --year or a configuration file"),
    };

    if let Some(t) = args.match_threshold {
        rules.match_threshold = t;
    }
    if let Some(t) = args.warn_threshold {
        rules.warn_threshold = t;
    }

    Ok(RunSettings {
        state,
        year,
        out_dir: out_dir.unwrap_or_else(|| ".".to_string()),
        sources,
        rules,
        consolidate,
        reference: args.reference.clone(),
    })
}

fn read_result_file(source: &FileSource) -> TicketResult<Vec<VoteRow>> {
    info!("Attempting to read result file {:?}", source.file_path);
    match source.provider.as_str() {
        "csv" => io_csv::read_precinct_file(&source.file_path),
        "wv2008" => io_wv2008::read_workbook(&source.file_path),
        x => whatever!("Provider not implemented {:?}", x),
    }
}
