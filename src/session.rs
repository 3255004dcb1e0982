//! The interactive analysis session: ask-first dimensions, the entropy
//! loop, and the investigation menus over the reduced table.
//!
//! The session owns no terminal and no plotting: it talks to a
//! [`Prompt`] and a [`Renderer`], which is what makes the whole flow
//! drivable from tests. Aborting any prompt is a normal, terminal
//! transition; the state is kept as last resolved, never rolled back.

use anyhow::{Context, Result};
use colored::Colorize;

use crate::engine::{AggregateAction, EnginePhase, Investigation, MetricAction, SelectionState};
use crate::ingest::Ingested;
use crate::prompt::Prompt;
use crate::render::Renderer;
use crate::report::{histogram_series, run_series, volcano_series, HistogramKind};
use crate::sample::SamplePair;
use crate::table::ResultTable;

/// Dimensions common to every performance test, disambiguated up front
/// regardless of their entropy.
pub const ASK_FIRST_DIMENSIONS: [&str; 4] =
    ["performance_test", "instance", "guest_kernel", "host_kernel"];

/// Outcome of one resolution step.
enum Reduction {
    Continue(SelectionState),
    Aborted(SelectionState),
}

/// One interactive pass over an ingested result set.
pub struct Session<'a, P: Prompt, R: Renderer> {
    prompt: &'a mut P,
    renderer: &'a mut R,
}

impl<'a, P: Prompt, R: Renderer> Session<'a, P, R> {
    pub fn new(prompt: &'a mut P, renderer: &'a mut R) -> Self {
        Self { prompt, renderer }
    }

    /// Run the full session: group, reduce, investigate. Returns the final
    /// selection state (useful to callers and tests; the interactive binary
    /// drops it).
    pub fn run(&mut self, ingested: Ingested) -> Result<SelectionState> {
        let table = ResultTable::group(ingested.rows, ingested.dimensions);
        tracing::debug!(
            groups = table.groups.len(),
            runs = table.run_count(),
            "grouped result table"
        );
        let mut state = SelectionState::new(table);

        for dimension in ASK_FIRST_DIMENSIONS {
            if !state.is_free(dimension) {
                continue;
            }
            match self.resolve_dimension(state, dimension)? {
                Reduction::Continue(next) => state = next,
                Reduction::Aborted(next) => return Ok(next),
            }
        }

        while state.phase() == EnginePhase::Active {
            let Some(dimension) = state.max_entropy_dimension() else {
                break;
            };
            match self.resolve_dimension(state, &dimension)? {
                Reduction::Continue(next) => state = next,
                Reduction::Aborted(next) => return Ok(next),
            }
        }

        match self.prompt.investigation() {
            Some(Investigation::PerMetric) => self.per_metric(&state)?,
            Some(Investigation::Holistic) => self.holistic(&state)?,
            None => {}
        }
        Ok(state)
    }

    /// Ask about one dimension and apply the answer. Dimensions that are
    /// not applicable are skipped; single-value domains are resolved
    /// without a prompt, since asking adds no information.
    fn resolve_dimension(&mut self, state: SelectionState, dimension: &str) -> Result<Reduction> {
        let domain = state.domain(dimension);
        if domain.is_empty() {
            return Ok(Reduction::Continue(state));
        }
        if domain.len() == 1 {
            println!(
                "Value of dimension '{}' is pre-determined to be '{}' by previous selections.",
                dimension.bold(),
                domain[0]
            );
            let next = state
                .eliminate(dimension, &domain)
                .context("auto-resolving a pre-determined dimension")?;
            return Ok(Reduction::Continue(next));
        }

        match self.prompt.select_values(dimension, &domain) {
            Some(chosen) if !chosen.is_empty() => {
                let next = state
                    .eliminate(dimension, &chosen)
                    .with_context(|| format!("eliminating on dimension '{dimension}'"))?;
                Ok(Reduction::Continue(next))
            }
            // An empty selection cannot make forward progress; treat it
            // exactly like an abort.
            _ => Ok(Reduction::Aborted(state)),
        }
    }

    /// One-by-one deep dive into each retained metric group.
    fn per_metric(&mut self, state: &SelectionState) -> Result<()> {
        let table = state.table();
        for group in &table.groups {
            println!("Showing details for A/B-Tests performed with the following parameters:");
            for (dimension, value) in table.dimensions.iter().zip(&group.key) {
                if !value.is_absent() {
                    println!("{:<20} {value}", dimension.bold());
                }
            }
            println!();

            loop {
                match self.prompt.metric_action() {
                    MetricAction::Volcano => {
                        let runs: Vec<&SamplePair> = group.runs.iter().collect();
                        let series = volcano_series(&runs, false)
                            .context("computing volcano series for a metric group")?;
                        self.renderer.volcano(&series);
                    }
                    MetricAction::BuildDetail => {
                        let Some(build) = self.prompt.build_number(
                            "What's the build number (found in the run URL) of the run you want to display?",
                        ) else {
                            continue;
                        };
                        match group.runs.iter().find(|run| run.build_number == build) {
                            Some(run) => {
                                let series = run_series(run)
                                    .context("computing overlay series for a run")?;
                                self.renderer.run_overlay(&series);
                            }
                            None => println!("No data for build number {build} found"),
                        }
                    }
                    MetricAction::NextMetric => break,
                    MetricAction::Exit => return Ok(()),
                }
            }
        }
        Ok(())
    }

    /// Aggregate view of every retained run, optionally restricted to one
    /// build.
    fn holistic(&mut self, state: &SelectionState) -> Result<()> {
        let table = state.table();
        println!(
            "Performing holistic analysis of p-values logged by A/B-Tests matching the following dimensions:"
        );
        let domains: Vec<(String, Vec<String>)> = table
            .dimensions
            .iter()
            .map(|dimension| (dimension.clone(), state.domain(dimension)))
            .collect();
        for (dimension, values) in &domains {
            if values.len() == 1 {
                println!("{:<20} {}", dimension.bold(), values[0]);
            }
        }
        println!("\nThis will include p-values across the following space:");
        for (dimension, values) in &domains {
            if values.len() > 1 {
                println!("{:<20} {values:?}", dimension.bold());
            }
        }

        let build = self.prompt.build_number(
            "Do you want to limit the analysis to a specific buildkite build? \
             (for 'yes', provide build number, for 'no' leave empty)",
        );
        let results: Vec<&SamplePair> = table
            .all_runs()
            .filter(|run| build.map_or(true, |build| run.build_number == build))
            .collect();

        loop {
            match self.prompt.aggregate_action() {
                AggregateAction::Volcano => {
                    let series = volcano_series(&results, true)
                        .context("computing aggregate volcano series")?;
                    self.renderer.volcano(&series);
                }
                AggregateAction::PValueHistogram => {
                    let series = histogram_series(&results, HistogramKind::PValues)
                        .context("computing p-value histogram")?;
                    self.renderer.histogram(&series);
                }
                AggregateAction::RegressionHistogram => {
                    let series = histogram_series(&results, HistogramKind::RelativeRegressions)
                        .context("computing regression histogram")?;
                    self.renderer.histogram(&series);
                }
                AggregateAction::Exit => return Ok(()),
            }
        }
    }
}
