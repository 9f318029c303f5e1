use snafu::Snafu;

/// Errors that prevent a report or a heuristic from being computed.
///
/// - `Validation`: the time series breaks one of its structural rules
/// (missing candidate, shares out of bounds, non-positive totals, no leading
/// empty snapshot). This is fatal for the series at hand only.
///
/// - `Precondition`: a heuristic was called on a pair of snapshots it is not
/// defined for. On a validated series this points to a bug in the caller.
///
/// - `Json`, `Timestamp`, `UnknownMetric`: an external representation could
/// not be read.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DumpError {
    #[snafu(display("invalid time series: {message}"))]
    Validation { message: String },

    #[snafu(display("heuristic precondition violated: {message}"))]
    Precondition { message: String },

    #[snafu(display("malformed JSON report: {source}"))]
    Json { source: serde_json::Error },

    #[snafu(display("malformed timestamp {value:?}: {source}"))]
    Timestamp {
        value: String,
        source: chrono::ParseError,
    },

    #[snafu(display("unknown report metric {name:?}"))]
    UnknownMetric { name: String },
}

pub type DumpResult<T> = Result<T, DumpError>;
