//! Experiment driver.
//!
//! One experiment = one arrival rate: submit a fixed-rate stream of
//! requests, wait for every channel to drain, then set the observed
//! counters against the closed-form model. A sweep repeats this for every
//! λ in the configured range, printing a report and appending one results
//! row per point.

use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::{Instrument, field, info, warn};

use channels::{Dispatcher, Empirical, RequestId, Snapshot};
use common::logger::{RunId, child_span, root_span, warn_if_slow};
use theory::Theoretical;

use crate::config::ExperimentConfig;
use crate::error::SimError;
use crate::report;
use crate::results::{ResultSink, ResultsRow};

/// Everything observed and derived for one arrival rate.
#[derive(Clone, Debug)]
pub struct ExperimentOutcome {
    pub run_id: RunId,
    pub started_at: DateTime<Local>,
    pub channels: usize,
    pub lambda: f64,
    pub mu: f64,
    pub theory: Theoretical,
    pub snapshot: Snapshot,
    pub empirical: Empirical,
}

/// Runs one experiment at arrival rate `lambda`.
///
/// `cfg` is validated first; `lambda` need not lie on the configured sweep
/// but must yield a representable inter-arrival gap.
pub async fn run_experiment(
    cfg: &ExperimentConfig,
    lambda: f64,
) -> Result<ExperimentOutcome, SimError> {
    cfg.validate()?;
    let gap = cfg.inter_arrival(lambda)?;

    let run_id = RunId::new();
    let span = root_span("experiment", &run_id);
    span.record("lambda", field::display(lambda));

    experiment(cfg, lambda, gap, run_id).instrument(span).await
}

async fn experiment(
    cfg: &ExperimentConfig,
    lambda: f64,
    gap: Duration,
    run_id: RunId,
) -> Result<ExperimentOutcome, SimError> {
    let started_at = Local::now();
    let theory = Theoretical::compute(lambda, cfg.mu, cfg.channels)?;

    info!(
        channels = cfg.channels,
        mu = cfg.mu,
        rho = theory.rho,
        requests = cfg.requests,
        "experiment started"
    );

    let dispatcher = Dispatcher::new(cfg.channels, cfg.service_time()?)?;

    generate_arrivals(&dispatcher, cfg.requests, gap)
        .instrument(child_span("arrivals"))
        .await;

    let snapshot = dispatcher
        .wait_for_drain(cfg.poll_interval)
        .instrument(child_span("drain"))
        .await?;

    if !snapshot.is_consistent() || snapshot.counters.requests != cfg.requests {
        return Err(SimError::Invariant(format!(
            "counters do not add up after drain: {:?}",
            snapshot.counters
        )));
    }

    let empirical = snapshot.empirical(lambda);

    info!(
        processed = snapshot.counters.processed,
        rejected = snapshot.counters.rejected,
        "experiment finished"
    );

    Ok(ExperimentOutcome {
        run_id,
        started_at,
        channels: cfg.channels,
        lambda,
        mu: cfg.mu,
        theory,
        snapshot,
        empirical,
    })
}

/// Submits ids `1..=count`, sleeping `gap` after each one.
async fn generate_arrivals(dispatcher: &Dispatcher, count: u64, gap: Duration) {
    for id in 1..=count {
        dispatcher.submit(RequestId(id));
        tokio::time::sleep(gap).await;
    }
}

/// Runs every λ of the configured sweep, in order.
///
/// The report for each point goes to stdout; the results row goes to
/// `sink`. A sink failure aborts the sweep.
pub async fn run_sweep<S>(
    cfg: &ExperimentConfig,
    sink: Option<&S>,
) -> Result<Vec<ExperimentOutcome>, SimError>
where
    S: ResultSink + ?Sized,
{
    cfg.validate()?;

    let points = cfg.lambda.points();
    let mut outcomes = Vec::with_capacity(points.len());

    for lambda in points {
        let outcome = run_experiment(cfg, lambda).await?;

        print!("{}", report::render(&outcome));

        if let Some(sink) = sink {
            warn_if_slow(
                "append_results",
                Duration::from_millis(250),
                sink.append(&ResultsRow::from(&outcome)),
            )
            .await
            .inspect_err(|e| warn!(error = %e, lambda, "could not record results"))?;
        }

        outcomes.push(outcome);
    }

    Ok(outcomes)
}
