// Statistical machinery for A/B test evaluation
//
// Implements exactly one hypothesis test: a paired permutation test on the
// difference of means. Under the null hypothesis the two samples are
// exchangeable, so the pooled observations are relabeled into two groups of
// the original sizes and the difference of means is recomputed per
// relabeling. Small problems are enumerated exactly; larger ones fall back
// to seeded Monte-Carlo shuffles.
//
// Also hosts the Shannon entropy helper the dimension-reduction engine uses
// to rank configuration dimensions.

mod entropy;
mod permutation;

pub use entropy::shannon_entropy;
pub use permutation::{
    permutation_test, PermutationTest, ResampleMethod, ResamplePolicy, EXACT_ENUMERATION_LIMIT,
};

use thiserror::Error;

/// Errors for statistical computations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    /// A permutation test needs at least one observation on each side
    #[error("cannot run a permutation test on empty samples (|a|={len_a}, |b|={len_b})")]
    InsufficientSample { len_a: usize, len_b: usize },

    /// Zero resamples is meaningless, not "use the precomputed values"
    #[error("resample count must be positive, got {0}")]
    InvalidResampleCount(i64),
}

pub type Result<T> = std::result::Result<T, StatsError>;

/// The two derived values of a regression test: significance and effect size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistic {
    /// Two-sided p-value of the observed difference of means
    pub p_value: f64,
    /// Observed difference of means, `mean(b) - mean(a)`
    pub mean_difference: f64,
}

/// Arithmetic mean of a sample. Returns 0.0 for an empty slice; callers that
/// care reject empty samples before getting here.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}
