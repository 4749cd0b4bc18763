use clap::Parser;

/// Normalizes precinct-level election results and extracts the canonical
/// "tickets" (unique office-candidate pairs) by iterative fuzzy matching.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) JSON run configuration describing the result files to read,
    /// the state/year metadata and the resolver thresholds. Command-line flags override
    /// values read from the configuration.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path or directory) The precinct results to read. A directory is scanned for
    /// general-election precinct CSV files; a single file is read according to --input-type.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of a single input file: 'csv' for an OpenElections-style
    /// precinct CSV, 'wv2008' for a 2008 West Virginia county workbook (xlsx).
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// The state slug used in output file names, e.g. west_virginia.
    #[clap(long, value_parser)]
    pub state: Option<String>,

    /// The election year, used both to filter discovered files and in output file names.
    #[clap(long, value_parser)]
    pub year: Option<String>,

    /// (directory, default '.') Where the ticket and change-log files are written.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference tickets file. If provided, tktcv checks that the produced
    /// tickets file matches the reference and fails on any difference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// Minimum token-set score (0-100) for two candidate labels to be merged.
    #[clap(long, value_parser)]
    pub match_threshold: Option<u32>,

    /// Minimum edit-similarity score (0-100) for a surviving pair to be reported.
    #[clap(long, value_parser)]
    pub warn_threshold: Option<u32>,

    /// If passed as an argument, also writes the consolidated statewide precinct file
    /// next to the ticket outputs.
    #[clap(long, takes_value = false)]
    pub consolidate: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
