use clap::{Parser, Subcommand};

/// Reports and anomaly checks for the successive vote dumps of election night feeds.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,

    /// (file path, optional) A JSON file with the settings of the run. The input paths it
    /// lists are relative to the directory of the file. Options passed on the command line
    /// override the values of the file.
    #[clap(short, long, value_parser, global = true)]
    pub config: Option<String>,

    /// (file paths) The JSON time series files to process, one state per file.
    #[clap(short, long, value_parser, global = true)]
    pub input: Vec<String>,

    /// (default bidenj) The key of the first tracked candidate in the vote shares.
    #[clap(long, value_parser, global = true)]
    pub candidate1: Option<String>,

    /// (default trumpd) The key of the second tracked candidate in the vote shares.
    #[clap(long, value_parser, global = true)]
    pub candidate2: Option<String>,

    /// (directory, default '.') Where the reports are written.
    #[clap(short, long, value_parser, global = true)]
    pub out: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard error.
    #[clap(long, takes_value = false, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Writes one report for each input file.
    Report {
        /// Attaches the anomalies and the repeated delta vote shares to the report.
        #[clap(long, takes_value = false)]
        annotate: bool,

        /// Sorts the entries by decreasing value of a metric, for example `deltaVotes` or
        /// `candidate1.deltaVoteShare`.
        #[clap(long, value_parser)]
        sort_by: Option<String>,

        /// Also writes the report in CSV format.
        #[clap(long, takes_value = false)]
        csv: bool,

        /// (file path) A reference report in JSON format. If provided, votedumps will check
        /// that the generated report matches the reference. Requires a single input.
        #[clap(short, long, value_parser)]
        reference: Option<String>,
    },
    /// Prints the votes lost between consecutive dumps, per file and in total.
    LostVotes,
    /// Prints the votes swapped between entities, for both choices of bias.
    Swaps,
}
