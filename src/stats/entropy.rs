// Shannon entropy of a count distribution
//
// The dimension-reduction engine ranks configuration dimensions by the
// entropy of their group-size distributions; only the relative ordering
// matters, so the base is fixed to the natural logarithm.

/// Shannon entropy (nats) of a frequency distribution given as raw counts.
/// Zero counts contribute nothing; an all-zero or empty distribution has
/// entropy 0.0.
pub fn shannon_entropy<I>(counts: I) -> f64
where
    I: IntoIterator<Item = usize>,
{
    let counts: Vec<usize> = counts.into_iter().filter(|&c| c > 0).collect();
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.ln()
        })
        .sum()
}
