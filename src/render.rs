//! Terminal rendering of the reporting series.
//!
//! Only the [`Renderer`] trait matters to the rest of the crate; the ASCII
//! backend below is deliberately small. It draws into a fixed character
//! grid: volcano scatters with a log-scaled inverse-p axis, bar histograms,
//! and A/B line overlays, following the same axis conventions as the plots
//! the series were designed for.

use colored::Colorize;

use crate::report::{
    format_with_reduced_unit, HistogramKind, HistogramSeries, RunSeries, VolcanoSeries,
    SIGNIFICANCE_INVERSE_P,
};

/// Rendering collaborator: consumes finished numeric series, returns
/// nothing. Implementations must not recompute statistics.
pub trait Renderer {
    fn volcano(&mut self, series: &VolcanoSeries);
    fn histogram(&mut self, series: &HistogramSeries);
    fn run_overlay(&mut self, series: &RunSeries);
}

const PLOT_WIDTH: usize = 70;
const PLOT_HEIGHT: usize = 20;
/// The inverse-p axis spans p = 1 down to p = 1e-4, like the original
/// volcano layout; smaller p-values are clamped to the top row.
const MAX_LOG_INVERSE_P: f64 = 4.0;

/// Character-grid renderer writing to stdout.
#[derive(Debug, Default)]
pub struct AsciiRenderer;

impl AsciiRenderer {
    pub fn new() -> Self {
        Self
    }

    fn print_grid(grid: &[Vec<char>]) {
        for row in grid {
            println!("  {}", row.iter().collect::<String>());
        }
    }

    /// Map `value` from [min, max] to a column index.
    fn column(value: f64, min: f64, max: f64) -> usize {
        if max <= min {
            return PLOT_WIDTH / 2;
        }
        let fraction = (value - min) / (max - min);
        ((fraction * (PLOT_WIDTH - 1) as f64).round() as usize).min(PLOT_WIDTH - 1)
    }

    /// Map an inverse-p value to a row (row 0 is the most significant).
    fn inverse_p_row(inverse_p: f64) -> usize {
        let log = inverse_p.log10().clamp(0.0, MAX_LOG_INVERSE_P);
        let fraction = log / MAX_LOG_INVERSE_P;
        PLOT_HEIGHT - 1 - ((fraction * (PLOT_HEIGHT - 1) as f64).round() as usize)
    }
}

impl Renderer for AsciiRenderer {
    fn volcano(&mut self, series: &VolcanoSeries) {
        println!(
            "\nVolcano plot of recent A/B-Tests. Each point represents one test run. \
             Total number of runs: {}",
            series.run_count()
        );
        if series.run_count() == 0 {
            println!("(no runs to plot)");
            return;
        }
        if series.relative {
            println!(
                "The average reported regression is {}.",
                format!("{:.2}%", series.average_abs_regression * 100.0).bold()
            );
        } else {
            println!(
                "The average value across all runs so far is {}.",
                format_with_reduced_unit(series.all_points_average, &series.unit).bold()
            );
        }
        println!(
            "The sorted p-values/mean regressions (used in Bonferroni-Holm correction) are\n  {:?}\nand\n  {:?}",
            series.sorted_p_values, series.sorted_abs_differences
        );

        let min_x = series
            .mean_differences
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);
        let max_x = series
            .mean_differences
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);

        let mut grid = vec![vec![' '; PLOT_WIDTH]; PLOT_HEIGHT];
        let threshold_row = Self::inverse_p_row(SIGNIFICANCE_INVERSE_P);
        grid[threshold_row] = vec!['-'; PLOT_WIDTH];

        for (difference, inverse_p) in series.mean_differences.iter().zip(&series.inverse_p) {
            let row = Self::inverse_p_row(*inverse_p);
            let col = Self::column(*difference, min_x, max_x);
            grid[row][col] = '*';
        }

        println!("  {}", "-log10(p) 4..0, threshold line at p = 0.01".dimmed());
        Self::print_grid(&grid);
        println!(
            "  {:<24}{:^24}{:>24}",
            format!("{min_x:.3}"),
            format!("regression ({})", series.unit),
            format!("{max_x:.3}")
        );
        println!();
    }

    fn histogram(&mut self, series: &HistogramSeries) {
        const BINS: usize = 60;
        const BAR_HEIGHT: usize = 15;

        let label = match series.kind {
            HistogramKind::PValues => "p-value",
            HistogramKind::RelativeRegressions => "relative regression",
        };
        println!(
            "\nHistogram of {label}s across {} runs",
            series.values.len()
        );
        if series.values.is_empty() {
            println!("(no runs to plot)");
            return;
        }

        let min = series.values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = series
            .values
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let width = if max > min { max - min } else { 1.0 };

        let mut counts = [0usize; BINS];
        for value in &series.values {
            let bin = (((value - min) / width) * (BINS - 1) as f64).round() as usize;
            counts[bin.min(BINS - 1)] += 1;
        }
        let tallest = counts.iter().copied().max().unwrap_or(1).max(1);

        let marker_bin = series
            .marker
            .filter(|marker| (min..=max).contains(marker))
            .map(|marker| ((((marker - min) / width) * (BINS - 1) as f64).round() as usize).min(BINS - 1));

        for level in (1..=BAR_HEIGHT).rev() {
            let row: String = counts
                .iter()
                .enumerate()
                .map(|(bin, &count)| {
                    let filled = count * BAR_HEIGHT >= level * tallest && count > 0;
                    if filled {
                        '#'
                    } else if marker_bin == Some(bin) {
                        '|'
                    } else {
                        ' '
                    }
                })
                .collect();
            println!("  {row}");
        }
        println!("  {}", "-".repeat(BINS));
        println!("  {:<28}{:>30}", format!("{min:.4}"), format!("{max:.4}"));
        if let Some(marker) = series.marker {
            println!("  {}", format!("| marks {label} = {marker}").red());
        }
        println!();
    }

    fn run_overlay(&mut self, series: &RunSeries) {
        println!(
            "\nSee below the plot for build {}. A/B-Testing determined that the observed change of \
             {} from {} to {} ({:+.2}%) has a p-value of {} of being a genuine performance change.",
            series.build_number,
            format_with_reduced_unit(series.mean_difference, &series.unit).bold(),
            format_with_reduced_unit(series.a_mean, &series.unit).bold(),
            format_with_reduced_unit(series.b_mean, &series.unit).bold(),
            series.relative_change * 100.0,
            series.p_value.to_string().bold(),
        );

        let all: Vec<f64> = series
            .data_a
            .iter()
            .chain(series.data_b.iter())
            .copied()
            .collect();
        if all.is_empty() {
            println!("(no data points recorded for this run)");
            return;
        }
        let min = all.iter().copied().fold(f64::INFINITY, f64::min);
        let max = all.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = if max > min { max - min } else { 1.0 };
        let longest = series.data_a.len().max(series.data_b.len()).max(2);

        let mut grid = vec![vec![' '; PLOT_WIDTH]; PLOT_HEIGHT];
        let mut place = |data: &[f64], glyph: char| {
            for (i, value) in data.iter().enumerate() {
                let col = ((i as f64 / (longest - 1) as f64) * (PLOT_WIDTH - 1) as f64).round() as usize;
                let fraction = (value - min) / span;
                let row = PLOT_HEIGHT - 1 - ((fraction * (PLOT_HEIGHT - 1) as f64).round() as usize);
                let cell = &mut grid[row][col.min(PLOT_WIDTH - 1)];
                *cell = if *cell == ' ' || *cell == glyph { glyph } else { '*' };
            }
        };
        place(&series.data_a, 'a');
        place(&series.data_b, 'b');

        Self::print_grid(&grid);
        println!(
            "  y: {} ({}), a = baseline, b = candidate, * = overlap",
            series.metric, series.unit
        );
        println!();
    }
}
