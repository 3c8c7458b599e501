use thiserror::Error;

use channels::DispatchError;
use theory::TheoryError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("channel count must be at least 1")]
    NoChannels,

    #[error("{name} must be finite and positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("request count must be at least 1")]
    NoRequests,

    #[error("{0} does not fit in a duration")]
    DurationOutOfRange(&'static str),

    #[error("sweep end {end} is below start {start}")]
    EmptySweep { start: f64, end: f64 },

    #[error("sweep {start}..={end} by {step} exceeds {limit} arrival rates")]
    TooManyPoints {
        start: f64,
        end: f64,
        step: f64,
        limit: usize,
    },
}

/// A results-file line that cannot be read back.
#[derive(Error, Debug, PartialEq)]
pub enum RowParseError {
    #[error("expected 12 fields, found {0}")]
    FieldCount(usize),

    #[error("field {index} is not a number: {value:?}")]
    Number { index: usize, value: String },
}

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("I/O on {path} failed: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {source}")]
    Row {
        line: usize,
        #[source]
        source: RowParseError,
    },

    #[error("no result rows to plot")]
    Empty,

    #[error("rendering {path} failed: {reason}")]
    Rendering { path: String, reason: String },
}

#[derive(Error, Debug)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("simulation run failed: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("theoretical model rejected inputs: {0}")]
    Theory(#[from] TheoryError),

    #[error("appending results to {path} failed: {source}")]
    Results {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("experiment invariant violated: {0}")]
    Invariant(String),
}
