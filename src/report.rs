//! Reduction of retained runs into plottable numeric series.
//!
//! This stage is a pure projection: every number here is either copied from
//! a run or derived from statistics the regression tester already produced.
//! Drawing is someone else's job (the [`crate::render::Renderer`] trait);
//! these series are the contract it consumes.

use crate::sample::SamplePair;
use crate::stats::{mean, Result};

/// Fixed significance convention for volcano plots: the threshold line sits
/// at `y = 1 / 0.01`, i.e. p = 0.01 on the log-scaled inverse-p axis.
pub const SIGNIFICANCE_INVERSE_P: f64 = 1.0 / 0.01;

/// Marker drawn on p-value histograms, same convention.
pub const SIGNIFICANCE_P: f64 = 0.01;

/// Scatter series for a volcano plot: effect size against significance.
///
/// `y = 1/p` is plotted on a logarithmic axis, which visually encodes
/// `-log(p)` without transforming the values here.
#[derive(Debug, Clone, PartialEq)]
pub struct VolcanoSeries {
    /// Unit of the x axis ("Percent" when relative)
    pub unit: String,
    /// Effect size per run: mean difference, or relative mean difference
    pub mean_differences: Vec<f64>,
    /// `1 / p_value` per run, parallel to `mean_differences`
    pub inverse_p: Vec<f64>,
    /// Whether effect sizes were normalized by the baseline mean
    pub relative: bool,
    /// Average over every raw data point of every run, for the absolute
    /// annotation line
    pub all_points_average: f64,
    /// Average absolute relative regression, for the relative annotation
    pub average_abs_regression: f64,
    /// Sorted p-values, the Bonferroni-Holm correction input
    pub sorted_p_values: Vec<f64>,
    /// Sorted absolute mean differences, the matching effect-size list
    pub sorted_abs_differences: Vec<f64>,
}

impl VolcanoSeries {
    pub fn run_count(&self) -> usize {
        self.mean_differences.len()
    }
}

/// What a histogram should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistogramKind {
    PValues,
    RelativeRegressions,
}

/// Flat numeric sequence for an external histogram renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSeries {
    pub kind: HistogramKind,
    pub values: Vec<f64>,
    /// Vertical marker, only meaningful for p-value histograms
    pub marker: Option<f64>,
}

/// Raw series and annotations for a single run's A/B overlay plot.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSeries {
    pub data_a: Vec<f64>,
    pub data_b: Vec<f64>,
    pub metric: String,
    pub unit: String,
    pub build_number: u64,
    pub a_mean: f64,
    pub b_mean: f64,
    pub mean_difference: f64,
    pub relative_change: f64,
    pub p_value: f64,
}

impl RunSeries {
    /// One-line annotation: the observed change, its direction, and the
    /// p-value the harness assigned to it.
    pub fn summary(&self) -> String {
        format!(
            "build {}: change of {} (from {} to {}, {:+.2}%) has p-value {}",
            self.build_number,
            format_with_reduced_unit(self.mean_difference, &self.unit),
            format_with_reduced_unit(self.a_mean, &self.unit),
            format_with_reduced_unit(self.b_mean, &self.unit),
            self.relative_change * 100.0,
            self.p_value,
        )
    }
}

/// Reduce retained runs to a volcano scatter series.
///
/// With `relative` set, effect sizes are normalized by each run's baseline
/// mean and the unit becomes "Percent". Statistic errors (from opt-in
/// recomputation) propagate; nothing is silently skipped.
pub fn volcano_series(results: &[&SamplePair], relative: bool) -> Result<VolcanoSeries> {
    let unit = if relative {
        "Percent".to_string()
    } else {
        results.first().map(|r| r.unit.clone()).unwrap_or_default()
    };

    let mut mean_differences = Vec::with_capacity(results.len());
    let mut inverse_p = Vec::with_capacity(results.len());
    let mut sorted_p_values = Vec::with_capacity(results.len());
    let mut sorted_abs_differences = Vec::with_capacity(results.len());

    for result in results {
        let difference = if relative {
            result.relative_mean_difference()?
        } else {
            result.mean_difference()?
        };
        mean_differences.push(difference);
        inverse_p.push(1.0 / result.p_value()?);
        sorted_p_values.push(result.p_value()?);
        sorted_abs_differences.push(result.mean_difference()?.abs());
    }
    sorted_p_values.sort_by(|a, b| a.total_cmp(b));
    sorted_abs_differences.sort_by(|a, b| a.total_cmp(b));

    let all_points: Vec<f64> = results
        .iter()
        .flat_map(|r| r.data_a.iter().chain(r.data_b.iter()).copied())
        .collect();
    let average_abs_regression = mean(
        &mean_differences
            .iter()
            .map(|d| d.abs())
            .collect::<Vec<f64>>(),
    );

    Ok(VolcanoSeries {
        unit,
        mean_differences,
        inverse_p,
        relative,
        all_points_average: mean(&all_points),
        average_abs_regression,
        sorted_p_values,
        sorted_abs_differences,
    })
}

/// Flatten retained runs into a histogram series.
pub fn histogram_series(results: &[&SamplePair], kind: HistogramKind) -> Result<HistogramSeries> {
    let mut values = Vec::with_capacity(results.len());
    for result in results {
        values.push(match kind {
            HistogramKind::PValues => result.p_value()?,
            HistogramKind::RelativeRegressions => result.relative_mean_difference()?,
        });
    }
    let marker = match kind {
        HistogramKind::PValues => Some(SIGNIFICANCE_P),
        HistogramKind::RelativeRegressions => None,
    };
    Ok(HistogramSeries {
        kind,
        values,
        marker,
    })
}

/// Project one run into its overlay series plus annotation numbers.
pub fn run_series(result: &SamplePair) -> Result<RunSeries> {
    let a_mean = mean(&result.data_a);
    Ok(RunSeries {
        data_a: result.data_a.clone(),
        data_b: result.data_b.clone(),
        metric: result.metric.clone(),
        unit: result.unit.clone(),
        build_number: result.build_number,
        a_mean,
        b_mean: mean(&result.data_b),
        mean_difference: result.mean_difference()?,
        relative_change: result.relative_mean_difference()?,
        p_value: result.p_value()?,
    })
}

/// Render a value with a human-friendly scaling of its EMF unit, e.g.
/// `1_530_000 Microseconds` becomes `"1.53s"`.
pub fn format_with_reduced_unit(value: f64, unit: &str) -> String {
    const TIME_STEPS: [(&str, f64); 4] = [("s", 1.0), ("ms", 1e-3), ("us", 1e-6), ("ns", 1e-9)];
    const BYTE_STEPS: [(&str, f64); 4] = [
        ("GB", 1e9),
        ("MB", 1e6),
        ("KB", 1e3),
        ("B", 1.0),
    ];

    let reduce = |value: f64, steps: &[(&str, f64)], suffix: &str| {
        let magnitude = value.abs();
        let (label, scale) = steps
            .iter()
            .copied()
            .find(|(_, scale)| magnitude >= *scale)
            .unwrap_or(steps[steps.len() - 1]);
        format!("{:.2}{label}{suffix}", value / scale)
    };

    let in_seconds = |value: f64| match unit {
        "Seconds" => Some(value),
        "Milliseconds" => Some(value * 1e-3),
        "Microseconds" => Some(value * 1e-6),
        "Nanoseconds" => Some(value * 1e-9),
        _ => None,
    };

    if let Some(seconds) = in_seconds(value) {
        return reduce(seconds, &TIME_STEPS, "");
    }

    let (byte_value, per_second) = match unit {
        "Bytes" => (Some(value), ""),
        "Kilobytes" => (Some(value * 1e3), ""),
        "Megabytes" => (Some(value * 1e6), ""),
        "Gigabytes" => (Some(value * 1e9), ""),
        "Bytes/Second" => (Some(value), "/s"),
        "Kilobytes/Second" => (Some(value * 1e3), "/s"),
        "Megabytes/Second" => (Some(value * 1e6), "/s"),
        "Gigabytes/Second" => (Some(value * 1e9), "/s"),
        _ => (None, ""),
    };
    if let Some(bytes) = byte_value {
        return reduce(bytes, &BYTE_STEPS, per_second);
    }

    match unit {
        "Percent" => format!("{value:.2}%"),
        _ => format!("{value:.2} {unit}"),
    }
}
