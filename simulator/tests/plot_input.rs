use std::time::Duration;

use common::logger::RunId;
use simulator::config::{ExperimentConfig, Sweep};
use simulator::driver::run_sweep;
use simulator::plot::{Metric, parse_rows, series};
use simulator::results::FileSink;

#[tokio::test(start_paused = true)]
async fn sweep_output_reads_back_for_charting() {
    let path = std::env::temp_dir().join(format!("loss-sim-plot-{}.txt", RunId::new()));
    let cfg = ExperimentConfig {
        channels: 2,
        mu: 1.0,
        lambda: Sweep {
            start: 1.0,
            end: 3.0,
            step: 1.0,
        },
        requests: 6,
        time_scale: 1.0,
        poll_interval: Duration::from_millis(100),
        results_path: Some(path.clone()),
    };

    let outcomes = run_sweep(&cfg, Some(&FileSink::new(&path))).await.unwrap();
    let text = tokio::fs::read_to_string(&path).await.unwrap();
    let _ = tokio::fs::remove_file(&path).await;

    let rows = parse_rows(&text).unwrap();
    assert_eq!(rows.len(), outcomes.len());

    let (theory, experiment) = series(&rows, Metric::Pn);
    let lambdas: Vec<f64> = theory.iter().map(|p| p.0).collect();
    assert_eq!(lambdas, vec![1.0, 2.0, 3.0]);
    assert_eq!(experiment.len(), 3);

    for ((_, pn), outcome) in theory.iter().zip(&outcomes) {
        assert!((pn - outcome.theory.pn).abs() < 5e-5);
    }
}
