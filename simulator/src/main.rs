use clap::Parser;

use common::logger::init_logger;
use simulator::{
    cli::{Cli, Command},
    driver::run_sweep,
    plot::plot_results_file,
    results::FileSink,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger("loss-sim", cli.log_format());

    if let Some(Command::Plot { results, out }) = &cli.command {
        let written = plot_results_file(results, out)?;
        tracing::info!(charts = written.len(), out = %out.display(), "charts generated");
        return Ok(());
    }

    let cfg = cli.to_config();
    cfg.validate()?;

    let sink = cfg.results_path.clone().map(FileSink::new);

    tracing::info!(
        channels = cfg.channels,
        mu = cfg.mu,
        points = cfg.lambda.points().len(),
        results = ?cfg.results_path,
        "starting loss system simulation"
    );

    let outcomes = run_sweep(&cfg, sink.as_ref()).await?;

    tracing::info!(experiments = outcomes.len(), "all experiments completed");

    Ok(())
}
