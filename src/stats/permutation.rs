// Paired permutation test on the difference of means
//
// Exact enumeration walks every way of assigning the pooled observations to
// a group of size |a|; the Monte-Carlo path shuffles the pooled vector with
// a seedable RNG. Both report the two-sided p-value with the add-one
// correction (extreme + 1) / (evaluated + 1), which is unbiased for
// Monte-Carlo estimates and yields exactly 1.0 for identical samples.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::{mean, Result, Statistic, StatsError};

/// Upper bound on exact enumeration. Above this many index combinations the
/// test always falls back to Monte-Carlo sampling, regardless of how many
/// resamples were requested.
pub const EXACT_ENUMERATION_LIMIT: u64 = 100_000;

/// How a statistic should be recomputed from the raw samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResamplePolicy {
    /// Requested number of resamples. Validated to be positive; also serves
    /// as the ceiling under which exact enumeration is preferred.
    pub resamples: i64,
    /// Seed for the Monte-Carlo path. `None` draws from OS entropy, so
    /// repeated runs will show small p-value jitter.
    pub seed: Option<u64>,
}

/// Which evaluation strategy a permutation test ended up using
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResampleMethod {
    /// All `C(n, k)` relabelings were enumerated
    Exact { combinations: u64 },
    /// `iterations` random shuffles of the pooled observations
    MonteCarlo { iterations: u64 },
}

/// Outcome of a permutation test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PermutationTest {
    pub statistic: Statistic,
    pub method: ResampleMethod,
}

/// `C(n, k)` with an early exit: returns `cap + 1` as soon as the running
/// product exceeds `cap`, so huge binomials never overflow or get computed.
fn binomial_capped(n: usize, k: usize, cap: u64) -> u64 {
    if k == 0 || k >= n {
        return 1;
    }
    let cap_wide = u128::from(cap);
    let mut value: u128 = 1;
    for i in 1..=k {
        value = value * (n - k + i) as u128 / i as u128;
        if value > cap_wide {
            return cap.saturating_add(1);
        }
    }
    value as u64
}

/// A permuted difference counts as "at least as extreme" up to a relative
/// tolerance, so relabelings that reproduce the observed split are not lost
/// to floating-point rounding.
fn is_extreme(permuted: f64, observed_abs: f64) -> bool {
    permuted.abs() >= observed_abs * (1.0 - 1e-9)
}

/// Run the paired permutation test over two samples.
///
/// The observed statistic is `mean(data_b) - mean(data_a)` (candidate minus
/// baseline), and is returned unchanged as the effect size; only the p-value
/// comes from resampling.
///
/// Exact enumeration is used when the number of index combinations
/// `C(|a| + |b|, min(|a|, |b|))` is within both the requested resample count
/// and [`EXACT_ENUMERATION_LIMIT`]; otherwise the test performs
/// `policy.resamples` Monte-Carlo shuffles.
///
/// # Errors
/// [`StatsError::InsufficientSample`] if either sample is empty,
/// [`StatsError::InvalidResampleCount`] if the policy asks for a
/// non-positive number of resamples.
pub fn permutation_test(data_a: &[f64], data_b: &[f64], policy: ResamplePolicy) -> Result<PermutationTest> {
    if policy.resamples <= 0 {
        return Err(StatsError::InvalidResampleCount(policy.resamples));
    }
    if data_a.is_empty() || data_b.is_empty() {
        return Err(StatsError::InsufficientSample {
            len_a: data_a.len(),
            len_b: data_b.len(),
        });
    }

    let observed = mean(data_b) - mean(data_a);
    let observed_abs = observed.abs();

    let mut pooled = Vec::with_capacity(data_a.len() + data_b.len());
    pooled.extend_from_slice(data_a);
    pooled.extend_from_slice(data_b);
    let pooled_sum: f64 = pooled.iter().sum();

    let exact_budget = EXACT_ENUMERATION_LIMIT.min(policy.resamples as u64);
    let combinations = binomial_capped(pooled.len(), data_a.len().min(data_b.len()), exact_budget);

    let (extreme, evaluated, method) = if combinations <= exact_budget {
        let (extreme, evaluated) = enumerate_exact(&pooled, data_a.len(), pooled_sum, observed_abs);
        (extreme, evaluated, ResampleMethod::Exact { combinations })
    } else {
        let iterations = policy.resamples as u64;
        let extreme = sample_monte_carlo(&pooled, data_a.len(), pooled_sum, observed_abs, iterations, policy.seed);
        (extreme, iterations, ResampleMethod::MonteCarlo { iterations })
    };

    let p_value = (extreme as f64 + 1.0) / (evaluated as f64 + 1.0);

    Ok(PermutationTest {
        statistic: Statistic {
            p_value,
            mean_difference: observed,
        },
        method,
    })
}

/// Walk every assignment of `len_a` pooled observations to group A,
/// counting relabelings whose mean difference is at least as extreme as the
/// observed one. Returns (extreme, evaluated).
fn enumerate_exact(pooled: &[f64], len_a: usize, pooled_sum: f64, observed_abs: f64) -> (u64, u64) {
    let mut extreme = 0u64;
    let mut evaluated = 0u64;

    // Depth-first over index combinations, carrying the partial group-A sum.
    fn recurse(
        pooled: &[f64],
        len_a: usize,
        start: usize,
        picked: usize,
        sum_a: f64,
        pooled_sum: f64,
        observed_abs: f64,
        extreme: &mut u64,
        evaluated: &mut u64,
    ) {
        if picked == len_a {
            let len_b = pooled.len() - len_a;
            let mean_a = sum_a / len_a as f64;
            let mean_b = (pooled_sum - sum_a) / len_b as f64;
            if is_extreme(mean_b - mean_a, observed_abs) {
                *extreme += 1;
            }
            *evaluated += 1;
            return;
        }
        let remaining = len_a - picked;
        for i in start..=pooled.len() - remaining {
            recurse(
                pooled,
                len_a,
                i + 1,
                picked + 1,
                sum_a + pooled[i],
                pooled_sum,
                observed_abs,
                extreme,
                evaluated,
            );
        }
    }

    recurse(pooled, len_a, 0, 0, 0.0, pooled_sum, observed_abs, &mut extreme, &mut evaluated);
    (extreme, evaluated)
}

/// Estimate the extreme count from random shuffles of the pooled vector.
fn sample_monte_carlo(
    pooled: &[f64],
    len_a: usize,
    pooled_sum: f64,
    observed_abs: f64,
    iterations: u64,
    seed: Option<u64>,
) -> u64 {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let len_b = pooled.len() - len_a;
    let mut indices: Vec<usize> = (0..pooled.len()).collect();
    let mut extreme = 0u64;

    for _ in 0..iterations {
        indices.shuffle(&mut rng);
        let sum_a: f64 = indices[..len_a].iter().map(|&i| pooled[i]).sum();
        let mean_a = sum_a / len_a as f64;
        let mean_b = (pooled_sum - sum_a) / len_b as f64;
        if is_extreme(mean_b - mean_a, observed_abs) {
            extreme += 1;
        }
    }

    extreme
}
