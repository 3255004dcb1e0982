// Entropy-guided dimension reduction
//
// The grouped table usually spans far more configuration combinations than
// an analyst wants to wade through. Each round, the engine scores every
// still-free dimension by the Shannon entropy of its group distribution,
// asks about the most informative one, and eliminates the groups that are
// inconsistent with the answer, until every dimension is pinned down or no
// informative dimension remains.
//
// The elimination rule deliberately keeps groups with an absent value for
// the asked dimension: a dimension that does not apply to a performance
// test must never exclude that test's results.

mod commands;
mod state;

pub use commands::{AggregateAction, Investigation, MetricAction};
pub use state::{EnginePhase, SelectionState};

use thiserror::Error;

/// Errors raised by the reduction engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The selection collaborator answered with values that are not in the
    /// current candidate set. That is a collaborator bug, not analyst
    /// input, and aborts the session.
    #[error("elimination on '{dimension}' references values outside the candidate set: {values:?}")]
    AmbiguousElimination {
        dimension: String,
        values: Vec<String>,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
