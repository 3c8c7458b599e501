//! Human-readable comparison of the closed-form model against a run.

use std::fmt::Write;

use crate::driver::ExperimentOutcome;

const UNDEFINED: &str = "undefined";

/// Renders the full report for one experiment.
pub fn render(o: &ExperimentOutcome) -> String {
    let mut out = String::new();
    let c = &o.snapshot.counters;
    let t = &o.theory;
    let e = &o.empirical;

    // Writing into a String cannot fail.
    let _ = writeln!(
        out,
        "\n{}-channel loss system, run {} started {}",
        o.channels,
        o.run_id.short(),
        o.started_at.format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(out, "λ = {}, μ = {}, ρ = {:.2}", o.lambda, o.mu, t.rho);

    let _ = writeln!(out, "\nSimulation results:");
    let _ = writeln!(out, "Total requests: {}", c.requests);
    let _ = writeln!(out, "Processed: {} (exp. Q = {})", c.processed, fmt_opt(e.q));
    let _ = writeln!(out, "Rejected: {} (exp. Pn = {})", c.rejected, fmt_opt(e.pn));

    let _ = writeln!(out, "\nComparison:");
    let _ = writeln!(
        out,
        "| {:<30} | {:>9} | {:>11} | {:>10} |",
        "Metric", "Theory", "Experiment", "Deviation"
    );
    let _ = writeln!(out, "|{:-<32}|{:-<11}|{:-<13}|{:-<12}|", "", "", "", "");

    let rows = [
        ("Idle probability (P0)", t.p0, e.p0),
        ("Blocking probability (Pn)", t.pn, e.pn),
        ("Relative throughput (Q)", t.q, e.q),
        ("Absolute throughput (A)", t.a, e.a),
        ("Mean busy channels (k)", t.k, e.k),
    ];
    for (name, theory, experiment) in rows {
        out.push_str(&comparison_line(name, theory, experiment));
    }

    out
}

/// One table row; deviation is `theory - experiment`.
pub fn comparison_line(name: &str, theory: f64, experiment: Option<f64>) -> String {
    format!(
        "| {:<30} | {:>9.4} | {:>11} | {:>10} |\n",
        name,
        theory,
        fmt_opt(experiment),
        fmt_opt(experiment.map(|x| theory - x))
    )
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.4}"),
        None => UNDEFINED.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_line_uses_four_decimals() {
        let line = comparison_line("Blocking probability (Pn)", 0.5, Some(0.25));

        assert!(line.contains("0.5000"));
        assert!(line.contains("0.2500"));
        assert!(line.ends_with("|\n"));
    }

    #[test]
    fn undefined_experiment_is_reported_as_such() {
        let line = comparison_line("Idle probability (P0)", 0.2, None);

        assert!(line.contains("0.2000"));
        assert_eq!(line.matches(UNDEFINED).count(), 2);
    }

    #[test]
    fn deviation_keeps_sign() {
        let line = comparison_line("Mean busy channels (k)", 1.0, Some(1.5));
        assert!(line.contains("-0.5000"));
    }
}
