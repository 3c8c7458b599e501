use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use common::logger::LogFormat;

use crate::config::{ExperimentConfig, Sweep};

#[derive(Debug, Parser)]
#[command(name = "loss-sim", version, about = "Multi-channel loss system (M/M/n/n) simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Number of service channels (n)
    #[arg(short = 'n', long, default_value_t = 3)]
    pub channels: usize,

    /// Service rate μ; each request is served for exactly 1/μ seconds
    #[arg(long, default_value_t = 0.2)]
    pub mu: f64,

    /// Arrival rate λ (start of the sweep when --lambda-end is given)
    #[arg(short = 'l', long, default_value_t = 0.5)]
    pub lambda: f64,

    /// Last arrival rate of the sweep (inclusive)
    #[arg(long)]
    pub lambda_end: Option<f64>,

    /// Arrival rate increment between sweep points
    #[arg(long, default_value_t = 0.5)]
    pub lambda_step: f64,

    /// Requests submitted per arrival rate
    #[arg(short = 'r', long, default_value_t = 20)]
    pub requests: u64,

    /// Wall-clock seconds per model second (1.0 = real time)
    #[arg(long, default_value_t = 1.0)]
    pub time_scale: f64,

    /// Drain polling interval in milliseconds
    #[arg(long, default_value_t = 100)]
    pub poll_ms: u64,

    /// File that receives one result row per arrival rate
    #[arg(long, default_value = "data.txt")]
    pub results: PathBuf,

    /// Do not append result rows
    #[arg(long)]
    pub no_results: bool,

    /// Emit JSON log lines (also enabled by APP_ENV=production)
    #[arg(long, env = "LOSS_SIM_JSON_LOGS", global = true)]
    pub json_logs: bool,
}

/// Without a subcommand the simulation sweep runs.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Draw one chart per metric (p-1.png .. p-5.png) from a results file
    Plot {
        /// Results file written by earlier runs
        #[arg(long, default_value = "data.txt")]
        results: PathBuf,

        /// Directory that receives the charts
        #[arg(long, default_value = "result")]
        out: PathBuf,
    },
}

impl Cli {
    pub fn log_format(&self) -> LogFormat {
        let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
        if self.json_logs || is_production {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }

    /// Convert CLI flags → experiment configuration (not yet validated)
    pub fn to_config(&self) -> ExperimentConfig {
        let lambda = match self.lambda_end {
            Some(end) => Sweep {
                start: self.lambda,
                end,
                step: self.lambda_step,
            },
            None => Sweep::single(self.lambda),
        };

        ExperimentConfig {
            channels: self.channels,
            mu: self.mu,
            lambda,
            requests: self.requests,
            time_scale: self.time_scale,
            poll_interval: Duration::from_millis(self.poll_ms),
            results_path: (!self.no_results).then(|| self.results.clone()),
        }
    }
}
