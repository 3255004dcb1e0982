// Closed command sets for the interactive menus
//
// The prompt collaborator answers with one of these variants, never with a
// free-form string, so menu dispatch is a total match.

/// Top-level choice once the table is reduced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Investigation {
    /// Aggregate view of the p-value distribution across all retained runs
    Holistic,
    /// One-by-one walk through each retained metric group
    PerMetric,
}

/// Per-metric deep-dive menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricAction {
    /// Volcano plot of this group's historical runs
    Volcano,
    /// Overlay plot of one run, selected by build number
    BuildDetail,
    /// Move on to the next metric group
    NextMetric,
    Exit,
}

/// Holistic aggregate menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateAction {
    /// Volcano plot of relative regressions
    Volcano,
    /// Histogram of p-values
    PValueHistogram,
    /// Histogram of relative regressions
    RegressionHistogram,
    Exit,
}
