use std::time::Duration;

use tracing::{Span, field};

use super::RunId;

/// Root span for one experiment run. `lambda` is recorded once known.
pub fn root_span(name: &'static str, run_id: &RunId) -> Span {
    tracing::info_span!(
        "run",
        name = %name,
        run_id = %run_id.short(),
        lambda = field::Empty
    )
}

/// Child span (inherits run_id from the enclosing root span).
pub fn child_span(name: &'static str) -> Span {
    tracing::info_span!("phase", name = %name)
}

pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let start = std::time::Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}

