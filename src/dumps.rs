use log::{debug, info, warn};

use serde::Serialize;
use serde_json::Value as JSValue;
use snafu::{prelude::*, Snafu};
use std::fs;
use std::path::{Path, PathBuf};
use text_diff::print_diff;

use vote_dumps::*;

use crate::args::{Args, Command};
use crate::dumps::config_reader::*;
use crate::dumps::io_common::*;

pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_json;

pub const DEFAULT_CANDIDATE1: &str = "bidenj";
pub const DEFAULT_CANDIDATE2: &str = "trumpd";

#[derive(Debug, Snafu)]
pub enum CliError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON content of {path}: {source}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing JSON: {source}"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("No race found in {path}"))]
    MissingRace { path: String },
    #[snafu(display("Invalid vote share {value} for {candidate} in {path}"))]
    ParsingShare {
        source: rust_decimal::Error,
        value: String,
        candidate: String,
        path: String,
    },
    #[snafu(display("Invalid timestamp {value:?} at index {index} in {path}"))]
    ParsingTimestamp {
        source: chrono::ParseError,
        value: String,
        index: usize,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing CSV file {path}"))]
    WritingCsv { source: csv::Error, path: String },
    #[snafu(display("Cannot analyse {path}: {source}"))]
    Analysis { source: DumpError, path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type CliResult<T> = Result<T, CliError>;

/// The settings of a run, once the command line and the configuration file are merged.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub candidate1: Candidate,
    pub candidate2: Candidate,
    pub inputs: Vec<PathBuf>,
    pub output_directory: PathBuf,
    pub annotate: bool,
    pub sort_by: Option<Metric>,
    pub write_csv: bool,
    pub reference: Option<PathBuf>,
}

pub fn resolve_settings(args: &Args) -> CliResult<Settings> {
    let (config, root) = match &args.config {
        Some(p) => {
            let config = read_config(p)?;
            let root = Path::new(p)
                .parent()
                .map(|x| x.to_path_buf())
                .unwrap_or_default();
            (config, root)
        }
        None => (RunConfig::default(), PathBuf::new()),
    };
    debug!("resolve_settings: config: {:?} root: {:?}", config, root);

    let inputs: Vec<PathBuf> = if !args.input.is_empty() {
        args.input.iter().map(PathBuf::from).collect()
    } else {
        config.inputs.iter().map(|p| root.join(p)).collect()
    };
    if inputs.is_empty() {
        whatever!("No input file: use --input or list the inputs in the configuration file")
    }

    let candidate1 = args
        .candidate1
        .clone()
        .or(config.candidate1)
        .unwrap_or_else(|| DEFAULT_CANDIDATE1.to_string());
    let candidate2 = args
        .candidate2
        .clone()
        .or(config.candidate2)
        .unwrap_or_else(|| DEFAULT_CANDIDATE2.to_string());
    if candidate1 == candidate2 {
        whatever!("The two tracked candidates are both {}", candidate1)
    }

    let output_directory = match (&args.out, &config.output_directory) {
        (Some(out), _) => PathBuf::from(out),
        (None, Some(out)) => root.join(out),
        (None, None) => PathBuf::from("."),
    };

    let (cli_annotate, cli_sort_by, cli_csv, reference) = match &args.command {
        Command::Report {
            annotate,
            sort_by,
            csv,
            reference,
        } => (*annotate, sort_by.clone(), *csv, reference.clone()),
        Command::LostVotes | Command::Swaps => (false, None, false, None),
    };

    let sort_by = match cli_sort_by.or(config.sort_by) {
        None => None,
        Some(name) => match name.parse::<Metric>() {
            Ok(m) => Some(m),
            Err(e) => {
                whatever!("Cannot sort the reports: {}", e)
            }
        },
    };

    if reference.is_some() && inputs.len() != 1 {
        whatever!(
            "A reference report can only be checked with a single input, got {} inputs",
            inputs.len()
        )
    }

    Ok(Settings {
        candidate1: Candidate::new(&candidate1),
        candidate2: Candidate::new(&candidate2),
        inputs,
        output_directory,
        annotate: cli_annotate || config.annotate.unwrap_or(false),
        sort_by,
        write_csv: cli_csv || config.write_csv.unwrap_or(false),
        reference: reference.map(PathBuf::from),
    })
}

pub fn run(args: &Args) -> CliResult<()> {
    let settings = resolve_settings(args)?;
    info!("settings: {:?}", settings);
    match args.command {
        Command::Report { .. } => run_reports(&settings).map(|_| ()),
        Command::LostVotes => run_lost_votes(&settings).map(|_| ()),
        Command::Swaps => run_swaps(&settings).map(|_| ()),
    }
}

/// Runs `process` on every input in turn. A failing input is reported and skipped.
///
/// Returns the successful results and the number of failures.
fn process_batch<T, F>(settings: &Settings, mut process: F) -> (Vec<(PathBuf, T)>, usize)
where
    F: FnMut(&Path) -> CliResult<T>,
{
    let mut res = Vec::new();
    let mut failures = 0;
    for path in settings.inputs.iter() {
        match process(path) {
            Ok(x) => res.push((path.clone(), x)),
            Err(e) => {
                failures += 1;
                warn!("Skipping {:?}: {:?}", path, e);
                eprintln!("Skipping {}: {}", path.display(), e);
            }
        }
    }
    (res, failures)
}

fn check_failures(failures: usize, settings: &Settings) -> CliResult<()> {
    if failures > 0 {
        whatever!(
            "{} of {} input files could not be processed",
            failures,
            settings.inputs.len()
        )
    }
    Ok(())
}

fn to_json_line<T: Serialize>(x: &T) -> CliResult<String> {
    serde_json::to_string(x).context(SerializingJsonSnafu {})
}

/// Writes the report of each input. Returns the paths of the JSON reports.
pub fn run_reports(settings: &Settings) -> CliResult<Vec<PathBuf>> {
    let (written, failures) = process_batch(settings, |path| write_report(path, settings));
    for (input, output) in written.iter() {
        println!("{}: {}", input.display(), output.display());
    }
    check_failures(failures, settings)?;
    Ok(written.into_iter().map(|(_, output)| output).collect())
}

fn write_report(path: &Path, settings: &Settings) -> CliResult<PathBuf> {
    let state = io_json::read_time_series(path)?;
    let report = Report::from_series(&state.series, &settings.candidate1, &settings.candidate2)
        .context(AnalysisSnafu {
            path: path.display().to_string(),
        })?;
    info!("{}: {} report entries", state.name, report.len());
    let report = match settings.sort_by {
        Some(metric) => report.sort_by_metric(metric),
        None => report,
    };

    let js = if settings.annotate {
        annotate(&report).to_json()
    } else {
        report.to_json()
    }
    .context(AnalysisSnafu {
        path: path.display().to_string(),
    })?;

    fs::create_dir_all(&settings.output_directory).context(WritingFileSnafu {
        path: settings.output_directory.display().to_string(),
    })?;
    let out_path = output_path(&settings.output_directory, path, "json");
    io_json::write_report(&out_path, &js)?;
    if settings.write_csv {
        io_csv::write_report_csv(&report, &output_path(&settings.output_directory, path, "csv"))?;
    }

    if let Some(reference) = &settings.reference {
        check_reference(&js, reference)?;
    }
    Ok(out_path)
}

fn check_reference(generated: &str, reference_path: &Path) -> CliResult<()> {
    let reference = io_json::read_json_value(reference_path)?;
    info!("reference: {:?}", reference_path);
    let ours: JSValue = serde_json::from_str(generated).context(SerializingJsonSnafu {})?;
    let pretty_ref = serde_json::to_string_pretty(&reference).context(SerializingJsonSnafu {})?;
    let pretty_ours = serde_json::to_string_pretty(&ours).context(SerializingJsonSnafu {})?;
    if pretty_ref != pretty_ours {
        warn!("Found differences with the reference report");
        print_diff(pretty_ref.as_str(), pretty_ours.as_ref(), "\n");
        whatever!(
            "Difference detected between the generated report and the reference {}",
            reference_path.display()
        )
    }
    Ok(())
}

/// Reads and validates one input. The heuristics then fold its pairs without
/// validating again.
fn read_validated(path: &Path, settings: &Settings) -> CliResult<io_json::StateSeries> {
    let state = io_json::read_time_series(path)?;
    state
        .series
        .validate(&settings.candidate1, &settings.candidate2)
        .context(AnalysisSnafu {
            path: path.display().to_string(),
        })?;
    Ok(state)
}

/// Prints the votes lost in each input and in total.
pub fn run_lost_votes(settings: &Settings) -> CliResult<VoteLossData> {
    let heuristic = LostVotes::new(&settings.candidate1, &settings.candidate2);
    let (results, failures) = process_batch(settings, |path| {
        let state = read_validated(path, settings)?;
        let pairs = state.series.non_empty_pairs();
        let lost = heuristic.over_pairs(&pairs).context(AnalysisSnafu {
            path: path.display().to_string(),
        })?;
        Ok((state.name, lost))
    });
    for (path, (name, lost)) in results.iter() {
        println!("{} ({}): {}", name, simplify_file_name(path), to_json_line(lost)?);
    }
    let total: VoteLossData = results.iter().map(|(_, (_, lost))| *lost).sum();
    println!("total: {}", to_json_line(&total)?);
    check_failures(failures, settings)?;
    Ok(total)
}

/// Prints the swapped votes in each input and in total, for both choices of bias.
pub fn run_swaps(settings: &Settings) -> CliResult<(VoteSwapData, VoteSwapData)> {
    let against1 = FindFraud::new(&settings.candidate1, &settings.candidate2, true);
    let against2 = against1.swap_bias();
    let (results, failures) = process_batch(settings, |path| {
        let state = read_validated(path, settings)?;
        let ctx = || AnalysisSnafu {
            path: path.display().to_string(),
        };
        let pairs = state.series.non_empty_pairs();
        let s1 = against1.over_pairs(&pairs).context(ctx())?;
        let s2 = against2.over_pairs(&pairs).context(ctx())?;
        Ok((state.name, s1, s2))
    });
    for (path, (name, s1, s2)) in results.iter() {
        let label = format!("{} ({})", name, simplify_file_name(path));
        println!("{} against {}: {}", label, settings.candidate1, to_json_line(s1)?);
        println!("{} against {}: {}", label, settings.candidate2, to_json_line(s2)?);
    }
    let total1: VoteSwapData = results.iter().map(|(_, (_, s1, _))| *s1).sum();
    let total2: VoteSwapData = results.iter().map(|(_, (_, _, s2))| *s2).sum();
    println!("total against {}: {}", settings.candidate1, to_json_line(&total1)?);
    println!("total against {}: {}", settings.candidate2, to_json_line(&total2)?);
    check_failures(failures, settings)?;
    Ok((total1, total2))
}
