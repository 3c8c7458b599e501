use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::driver::ExperimentOutcome;
use crate::error::{RowParseError, SimError};

/// One line of the results file:
/// `lambda mu P0 Pn Q A k expP0 expPn expQ expA expK`.
///
/// λ and μ are written as given; every metric uses 4 decimals. An
/// undefined experimental metric is written as `NaN`.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultsRow {
    pub lambda: f64,
    pub mu: f64,
    pub theory: [f64; 5],
    pub experiment: [Option<f64>; 5],
}

impl From<&ExperimentOutcome> for ResultsRow {
    fn from(o: &ExperimentOutcome) -> Self {
        let t = &o.theory;
        let e = &o.empirical;

        Self {
            lambda: o.lambda,
            mu: o.mu,
            theory: [t.p0, t.pn, t.q, t.a, t.k],
            experiment: [e.p0, e.pn, e.q, e.a, e.k],
        }
    }
}

impl fmt::Display for ResultsRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.lambda, self.mu)?;
        for v in self.theory {
            write!(f, " {v:.4}")?;
        }
        for v in self.experiment {
            match v {
                Some(v) => write!(f, " {v:.4}")?,
                None => f.write_str(" NaN")?,
            }
        }
        Ok(())
    }
}

/// Reads a line written by `Display` back. Fields may be separated by any
/// whitespace, and a `,` decimal separator is accepted for files produced
/// under a comma locale. `NaN` experimental values become `None`.
impl FromStr for ResultsRow {
    type Err = RowParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 12 {
            return Err(RowParseError::FieldCount(fields.len()));
        }

        let values = fields
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                raw.replace(',', ".")
                    .parse::<f64>()
                    .map_err(|_| RowParseError::Number {
                        index,
                        value: raw.to_string(),
                    })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        let mut theory = [0.0; 5];
        theory.copy_from_slice(&values[2..7]);

        let mut experiment = [None; 5];
        for (slot, &v) in experiment.iter_mut().zip(&values[7..]) {
            *slot = (!v.is_nan()).then_some(v);
        }

        Ok(Self {
            lambda: values[0],
            mu: values[1],
            theory,
            experiment,
        })
    }
}

/// Destination for completed result rows.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn append(&self, row: &ResultsRow) -> Result<(), SimError>;
}

/// Appends rows to a text file. The file is opened in append mode for
/// every row and never truncated; single-process use only.
#[derive(Clone, Debug)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SimError {
        SimError::Results {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl ResultSink for FileSink {
    async fn append(&self, row: &ResultsRow) -> Result<(), SimError> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        let line = format!("{row}\n");
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        file.flush().await.map_err(|e| self.io_error(e))?;

        tracing::debug!(path = %self.path.display(), "results row appended");
        Ok(())
    }
}
