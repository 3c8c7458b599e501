//! Charts of a results file.
//!
//! Reads the rows appended by a sweep, orders them by arrival rate and
//! draws one PNG per metric: the closed-form curve against the measured
//! one, λ on the x axis. Files are named `p-1.png` .. `p-5.png` in metric
//! order (P0, Pn, Q, A, k).

use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::info;

use crate::error::PlotError;
use crate::results::ResultsRow;

const NAVY: RGBColor = RGBColor(0, 0, 128);
const CRIMSON: RGBColor = RGBColor(220, 20, 60);

/// The five compared metrics, in results-file column order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    P0,
    Pn,
    Q,
    A,
    K,
}

impl Metric {
    pub const ALL: [Metric; 5] = [Metric::P0, Metric::Pn, Metric::Q, Metric::A, Metric::K];

    /// Column offset within `ResultsRow::theory` / `experiment`.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::P0 => "P0",
            Metric::Pn => "Pn",
            Metric::Q => "Q",
            Metric::A => "A",
            Metric::K => "k",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Metric::P0 => "idle probability",
            Metric::Pn => "blocking probability",
            Metric::Q => "relative throughput",
            Metric::A => "absolute throughput",
            Metric::K => "mean busy channels",
        }
    }

    pub fn file_name(self) -> String {
        format!("p-{}.png", self.index() + 1)
    }
}

/// Parses every non-blank line of a results file and sorts the rows by λ.
pub fn parse_rows(text: &str) -> Result<Vec<ResultsRow>, PlotError> {
    let mut rows = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            line.parse::<ResultsRow>()
                .map_err(|source| PlotError::Row { line: i + 1, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    rows.sort_by(|a, b| a.lambda.total_cmp(&b.lambda));
    Ok(rows)
}

/// `(λ, theory)` and `(λ, experiment)` points for one metric. Undefined
/// experimental values are left out of the second series.
pub fn series(rows: &[ResultsRow], metric: Metric) -> (Vec<(f64, f64)>, Vec<(f64, f64)>) {
    let i = metric.index();

    let theory = rows.iter().map(|r| (r.lambda, r.theory[i])).collect();
    let experiment = rows
        .iter()
        .filter_map(|r| r.experiment[i].map(|v| (r.lambda, v)))
        .collect();

    (theory, experiment)
}

/// Reads `results` and writes the five charts into `out_dir`, creating it
/// if needed. Returns the written paths in metric order.
pub fn plot_results_file(results: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, PlotError> {
    let text = std::fs::read_to_string(results).map_err(|source| PlotError::Io {
        path: results.display().to_string(),
        source,
    })?;

    let rows = parse_rows(&text)?;
    render_all(&rows, out_dir)
}

pub fn render_all(rows: &[ResultsRow], out_dir: &Path) -> Result<Vec<PathBuf>, PlotError> {
    let Some(first) = rows.first() else {
        return Err(PlotError::Empty);
    };

    std::fs::create_dir_all(out_dir).map_err(|source| PlotError::Io {
        path: out_dir.display().to_string(),
        source,
    })?;

    let mut written = Vec::with_capacity(Metric::ALL.len());
    for metric in Metric::ALL {
        let path = out_dir.join(metric.file_name());
        render_metric(rows, metric, first.mu, &path)?;
        info!(metric = metric.label(), path = %path.display(), "chart written");
        written.push(path);
    }

    Ok(written)
}

fn render_metric(
    rows: &[ResultsRow],
    metric: Metric,
    mu: f64,
    path: &Path,
) -> Result<(), PlotError> {
    let failed = |reason: String| PlotError::Rendering {
        path: path.display().to_string(),
        reason,
    };

    let (theory, experiment) = series(rows, metric);
    let x_range = padded_range(theory.iter().map(|p| p.0));
    let y_range = padded_range(theory.iter().chain(&experiment).map(|p| p.1));

    let root = BitMapBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| failed(format!("Failed to fill background: {e}")))?;

    let title = format!(
        "{} ({}) vs arrival rate, μ = {mu}",
        metric.description(),
        metric.label()
    );

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28).into_font())
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)
        .map_err(|e| failed(format!("Failed to build chart: {e}")))?;

    chart
        .configure_mesh()
        .x_desc("Arrival rate (λ)")
        .y_desc(metric.label())
        .light_line_style(BLACK.mix(0.05))
        .draw()
        .map_err(|e| failed(format!("Failed to configure mesh: {e}")))?;

    chart
        .draw_series(LineSeries::new(theory.iter().copied(), NAVY.stroke_width(2)))
        .map_err(|e| failed(format!("Failed to draw theory line: {e}")))?
        .label("theory")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], NAVY));
    chart
        .draw_series(theory.iter().map(|&p| Circle::new(p, 4, NAVY.filled())))
        .map_err(|e| failed(format!("Failed to draw theory points: {e}")))?;

    chart
        .draw_series(LineSeries::new(experiment.iter().copied(), CRIMSON.stroke_width(2)))
        .map_err(|e| failed(format!("Failed to draw experiment line: {e}")))?
        .label("experiment")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], CRIMSON));
    chart
        .draw_series(
            experiment
                .iter()
                .map(|&p| Circle::new(p, 4, CRIMSON.stroke_width(2))),
        )
        .map_err(|e| failed(format!("Failed to draw experiment points: {e}")))?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| failed(format!("Failed to draw legend: {e}")))?;

    root.present()
        .map_err(|e| failed(format!("Failed to save chart: {e}")))?;

    Ok(())
}

/// Min..max of `values` with 5% padding; a degenerate or empty range is
/// widened so the axis still has extent.
fn padded_range(values: impl Iterator<Item = f64>) -> std::ops::Range<f64> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if lo > hi {
        return 0.0..1.0;
    }
    if (hi - lo).abs() < f64::EPSILON {
        let pad = if lo.abs() < f64::EPSILON { 1.0 } else { lo.abs() * 0.1 };
        return (lo - pad)..(hi + pad);
    }

    let pad = (hi - lo) * 0.05;
    (lo - pad)..(hi + pad)
}
