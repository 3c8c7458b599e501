use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Small slack so that `start + i*step` still reaches an `end` that is a
/// whole number of steps away despite rounding.
const SWEEP_EPSILON: f64 = 1e-9;

/// Upper bound on the number of arrival rates a single sweep may visit.
pub const MAX_SWEEP_POINTS: usize = 10_000;

/// Range of arrival rates to run. A single point is `start == end`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sweep {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl Sweep {
    pub fn single(lambda: f64) -> Self {
        Self {
            start: lambda,
            end: lambda,
            step: 1.0,
        }
    }

    /// Number of arrival rates the sweep visits, or `None` when it cannot
    /// be enumerated (non-finite bounds, or more than [`MAX_SWEEP_POINTS`]).
    pub fn point_count(&self) -> Option<usize> {
        if self.end <= self.start {
            return Some(1);
        }

        let steps = ((self.end - self.start) / self.step + SWEEP_EPSILON).floor();
        if steps.is_nan() || steps >= MAX_SWEEP_POINTS as f64 {
            return None;
        }
        if steps <= 0.0 {
            return Some(1);
        }

        (steps as usize).checked_add(1)
    }

    /// Arrival rates `start, start + step, ...` up to and including `end`.
    ///
    /// Each point is computed as `start + i * step` so that rounding does
    /// not accumulate across a long sweep. A sweep that
    /// [`point_count`](Self::point_count) rejects is cut off after
    /// [`MAX_SWEEP_POINTS`] rates.
    pub fn points(&self) -> Vec<f64> {
        let count = self.point_count().unwrap_or(MAX_SWEEP_POINTS);

        (0..count)
            .map(|i| self.start + i as f64 * self.step)
            .collect()
    }
}

#[derive(Clone, Debug)]
pub struct ExperimentConfig {
    // =========================
    // Model
    // =========================
    /// Number of identical service channels (n).
    pub channels: usize,

    /// Service rate μ. Every admitted request holds its channel for
    /// exactly `1/μ` model seconds; service time is not sampled.
    pub mu: f64,

    /// Arrival rate(s) λ. Requests arrive every `1/λ` model seconds.
    pub lambda: Sweep,

    /// Requests submitted per experiment (per λ point).
    pub requests: u64,

    // =========================
    // Execution
    // =========================
    /// Wall-clock seconds per model second.
    ///
    /// `1.0` runs in real time; smaller values
    /// shrink every sleep proportionally. Ratio metrics are unaffected.
    pub time_scale: f64,

    /// How often the driver checks whether every channel has drained.
    pub poll_interval: Duration,

    // =========================
    // Output
    // =========================
    /// Append-only results file; one row per λ point. `None` disables it.
    pub results_path: Option<PathBuf>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            channels: 3,
            mu: 0.2,
            lambda: Sweep::single(0.5),
            requests: 20,
            time_scale: 1.0,
            poll_interval: Duration::from_millis(100),
            results_path: Some(PathBuf::from("data.txt")),
        }
    }
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channels == 0 {
            return Err(ConfigError::NoChannels);
        }
        if self.requests == 0 {
            return Err(ConfigError::NoRequests);
        }

        positive("mu", self.mu)?;
        positive("time scale", self.time_scale)?;
        positive("lambda", self.lambda.start)?;

        if self.lambda.end < self.lambda.start {
            return Err(ConfigError::EmptySweep {
                start: self.lambda.start,
                end: self.lambda.end,
            });
        }
        if self.lambda.end > self.lambda.start {
            positive("lambda step", self.lambda.step)?;
        }
        if self.lambda.point_count().is_none() {
            return Err(ConfigError::TooManyPoints {
                start: self.lambda.start,
                end: self.lambda.end,
                step: self.lambda.step,
                limit: MAX_SWEEP_POINTS,
            });
        }

        // Durations are derived per run; make sure the extreme ones exist.
        self.service_time()?;
        self.inter_arrival(self.lambda.start)?;

        Ok(())
    }

    /// Wall-clock service time of one request.
    pub fn service_time(&self) -> Result<Duration, ConfigError> {
        positive("mu", self.mu)?;
        scaled(self.time_scale / self.mu, "service time")
    }

    /// Wall-clock gap between two arrivals at rate `lambda`.
    pub fn inter_arrival(&self, lambda: f64) -> Result<Duration, ConfigError> {
        positive("lambda", lambda)?;
        scaled(self.time_scale / lambda, "inter-arrival time")
    }
}

fn scaled(secs: f64, what: &'static str) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::DurationOutOfRange(what))
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_lab_setup() {
        let cfg = ExperimentConfig::default();

        assert_eq!(cfg.channels, 3);
        assert_eq!(cfg.requests, 20);
        assert_eq!(cfg.lambda.points(), vec![0.5]);
        assert_eq!(cfg.service_time().unwrap(), Duration::from_secs(5));
        assert_eq!(cfg.inter_arrival(0.5).unwrap(), Duration::from_secs(2));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn sweep_includes_both_ends() {
        let sweep = Sweep {
            start: 0.5,
            end: 8.0,
            step: 0.5,
        };

        let points = sweep.points();

        assert_eq!(points.len(), 16);
        assert_eq!(points[0], 0.5);
        assert_eq!(points[15], 8.0);
    }

    #[test]
    fn sweep_with_step_past_end_is_single_point() {
        let sweep = Sweep {
            start: 1.0,
            end: 1.5,
            step: 2.0,
        };
        assert_eq!(sweep.points(), vec![1.0]);
    }

    #[test]
    fn time_scale_shrinks_durations() {
        let cfg = ExperimentConfig {
            time_scale: 0.5,
            ..Default::default()
        };

        assert_eq!(cfg.service_time().unwrap(), Duration::from_millis(2500));
        assert_eq!(cfg.inter_arrival(0.5).unwrap(), Duration::from_secs(1));
    }

    #[test]
    fn extreme_rates_are_errors_not_panics() {
        let cfg = ExperimentConfig::default();

        assert!(matches!(
            cfg.inter_arrival(1e-320),
            Err(ConfigError::DurationOutOfRange("inter-arrival time"))
        ));
        assert!(matches!(
            cfg.inter_arrival(0.0),
            Err(ConfigError::NotPositive { name: "lambda", .. })
        ));
        assert!(matches!(
            ExperimentConfig { mu: 1e-300, ..cfg }.service_time(),
            Err(ConfigError::DurationOutOfRange("service time"))
        ));
    }

    #[test]
    fn microscopic_step_is_rejected_up_front() {
        let sweep = Sweep {
            start: 0.5,
            end: 8.0,
            step: 1e-300,
        };
        let cfg = ExperimentConfig {
            lambda: sweep,
            ..Default::default()
        };

        assert_eq!(sweep.point_count(), None);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::TooManyPoints { limit: MAX_SWEEP_POINTS, .. })
        ));
        assert_eq!(sweep.points().len(), MAX_SWEEP_POINTS);
    }

    #[test]
    fn unbounded_sweep_end_is_rejected() {
        let sweep = Sweep {
            start: 1.0,
            end: f64::INFINITY,
            step: 1.0,
        };

        assert_eq!(sweep.point_count(), None);
    }

    #[test]
    fn largest_allowed_sweep_is_accepted() {
        let sweep = Sweep {
            start: 1.0,
            end: MAX_SWEEP_POINTS as f64,
            step: 1.0,
        };

        assert_eq!(sweep.point_count(), Some(MAX_SWEEP_POINTS));
        assert_eq!(sweep.points().last(), Some(&(MAX_SWEEP_POINTS as f64)));
    }

    #[test]
    fn rejects_invalid_values() {
        let bad = |f: fn(&mut ExperimentConfig)| {
            let mut cfg = ExperimentConfig::default();
            f(&mut cfg);
            cfg.validate().unwrap_err()
        };

        assert!(matches!(bad(|c| c.channels = 0), ConfigError::NoChannels));
        assert!(matches!(bad(|c| c.requests = 0), ConfigError::NoRequests));
        assert!(matches!(
            bad(|c| c.mu = 0.0),
            ConfigError::NotPositive { name: "mu", .. }
        ));
        assert!(matches!(
            bad(|c| c.time_scale = f64::INFINITY),
            ConfigError::NotPositive { name: "time scale", .. }
        ));
        assert!(matches!(
            bad(|c| c.lambda = Sweep { start: 2.0, end: 1.0, step: 0.5 }),
            ConfigError::EmptySweep { .. }
        ));
        assert!(matches!(
            bad(|c| c.lambda = Sweep { start: 1.0, end: 2.0, step: 0.0 }),
            ConfigError::NotPositive { name: "lambda step", .. }
        ));
        assert!(matches!(
            bad(|c| c.mu = 1e-300),
            ConfigError::DurationOutOfRange("service time")
        ));
    }
}
