//! One A/B test run: two measurement series plus the metadata the
//! benchmarking harness logged alongside them.
//!
//! The harness already ran a permutation test once at log time, so the
//! default is to trust the precomputed p-value and mean difference
//! verbatim. Recomputation is opt-in via a [`ResamplePolicy`] and, being
//! expensive, is memoized: the derived statistic is computed at most once
//! per pair and never changes afterwards. A failed computation caches
//! nothing, so the error path stays retryable.

use std::cell::OnceCell;

use crate::stats::{mean, permutation_test, ResamplePolicy, Result, Statistic};

/// A single A/B test run loaded from the metrics log.
#[derive(Debug, Clone)]
pub struct SamplePair {
    /// Baseline measurements (sample A)
    pub data_a: Vec<f64>,
    /// Candidate measurements (sample B); length need not match A
    pub data_b: Vec<f64>,
    /// CI run that produced this result; used for disambiguation only
    pub build_number: u64,
    /// Measurement unit, e.g. "Milliseconds"
    pub unit: String,
    /// Name of the measured quantity
    pub metric: String,

    precomputed: Statistic,
    resample: Option<ResamplePolicy>,
    derived: OnceCell<Statistic>,
}

impl SamplePair {
    pub fn new(
        data_a: Vec<f64>,
        data_b: Vec<f64>,
        p_value: f64,
        mean_difference: f64,
        build_number: u64,
        unit: String,
        metric: String,
        resample: Option<ResamplePolicy>,
    ) -> Self {
        Self {
            data_a,
            data_b,
            build_number,
            unit,
            metric,
            precomputed: Statistic {
                p_value,
                mean_difference,
            },
            resample,
            derived: OnceCell::new(),
        }
    }

    /// The pair's statistic: the precomputed values when no resample policy
    /// is set (no computation at all), otherwise the memoized result of a
    /// fresh permutation test.
    pub fn statistic(&self) -> Result<Statistic> {
        let Some(policy) = self.resample else {
            return Ok(self.precomputed);
        };
        if let Some(statistic) = self.derived.get() {
            return Ok(*statistic);
        }
        let test = permutation_test(&self.data_a, &self.data_b, policy)?;
        Ok(*self.derived.get_or_init(|| test.statistic))
    }

    pub fn p_value(&self) -> Result<f64> {
        Ok(self.statistic()?.p_value)
    }

    pub fn mean_difference(&self) -> Result<f64> {
        Ok(self.statistic()?.mean_difference)
    }

    /// Effect size normalized by the baseline mean.
    pub fn relative_mean_difference(&self) -> Result<f64> {
        Ok(self.mean_difference()? / mean(&self.data_a))
    }
}
