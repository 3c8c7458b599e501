use std::time::Duration;

/// Per-run counters. Owned by the dispatcher and only touched under its lock.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    pub requests: u64,
    pub processed: u64,
    pub rejected: u64,

    /// Time the whole system spent with every channel idle.
    pub idle_time: Duration,

    /// Span from run start to the latest state transition (arrival or release).
    pub total_elapsed: Duration,
}

/// Point-in-time copy of the dispatcher state, taken under the lock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub channels: usize,
    pub busy: usize,
    pub counters: Counters,
    pub busy_time: Duration,
}

/// Experimental estimates of the loss-system metrics.
///
/// `None` marks a metric whose denominator was zero (no requests, or no
/// elapsed time) and is therefore undefined for this run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Empirical {
    pub p0: Option<f64>,
    pub pn: Option<f64>,
    pub q: Option<f64>,
    pub a: Option<f64>,
    pub k: Option<f64>,
}

impl Snapshot {
    pub fn is_consistent(&self) -> bool {
        self.counters.processed + self.counters.rejected == self.counters.requests
            && self.busy <= self.channels
    }

    /// Derives the experimental metrics for arrival rate `lambda`.
    ///
    /// Time-based metrics are ratios of durations, so they do not depend on
    /// any wall-clock scaling applied by the driver.
    pub fn empirical(&self, lambda: f64) -> Empirical {
        let c = &self.counters;
        let total = c.total_elapsed.as_secs_f64();
        let requests = c.requests as f64;

        let q = ratio(c.processed as f64, requests);

        Empirical {
            p0: ratio(c.idle_time.as_secs_f64(), total),
            pn: ratio(c.rejected as f64, requests),
            q,
            a: q.map(|q| lambda * q),
            k: ratio(self.busy_time.as_secs_f64(), total),
        }
    }
}

fn ratio(num: f64, den: f64) -> Option<f64> {
    if den > 0.0 { Some(num / den) } else { None }
}
