// Selection state and the elimination step
//
// The state is an immutable value: each elimination consumes it and returns
// a new one, so every round can be tested in isolation and there is nothing
// to roll back (aborting simply keeps the last state).

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::stats::shannon_entropy;
use crate::table::ResultTable;

use super::{EngineError, Result};

/// Where the reduction loop stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    /// At least one free dimension still has a defined entropy
    Active,
    /// Every dimension is resolved or not applicable; nothing left to ask
    Resolved,
}

/// Working state of one interactive reduction session.
#[derive(Debug, Clone)]
pub struct SelectionState {
    table: ResultTable,
    free: Vec<String>,
    resolved: BTreeMap<String, Vec<String>>,
}

impl SelectionState {
    /// Start a session with every table dimension free.
    pub fn new(table: ResultTable) -> Self {
        let free = table.dimensions.clone();
        Self {
            table,
            free,
            resolved: BTreeMap::new(),
        }
    }

    pub fn table(&self) -> &ResultTable {
        &self.table
    }

    /// Consume the state, yielding the retained table.
    pub fn into_table(self) -> ResultTable {
        self.table
    }

    /// Dimensions not yet asked about, in table order.
    pub fn free_dimensions(&self) -> &[String] {
        &self.free
    }

    /// Dimensions already resolved, with the accepted value sets.
    pub fn resolved(&self) -> &BTreeMap<String, Vec<String>> {
        &self.resolved
    }

    pub fn is_free(&self, dimension: &str) -> bool {
        self.free.iter().any(|d| d == dimension)
    }

    pub fn phase(&self) -> EnginePhase {
        let any_informative = self.free.iter().any(|d| self.entropy(d).is_some());
        if any_informative {
            EnginePhase::Active
        } else {
            EnginePhase::Resolved
        }
    }

    /// Distinct present values of `dimension` across retained groups,
    /// sorted for stable presentation. Absence markers are not candidates;
    /// they survive any elimination anyway.
    pub fn domain(&self, dimension: &str) -> Vec<String> {
        let mut values: Vec<String> = self
            .table
            .groups
            .iter()
            .filter_map(|group| {
                group
                    .value_for(&self.table.dimensions, dimension)
                    .value()
                    .map(str::to_string)
            })
            .collect();
        values.sort();
        values.dedup();
        values
    }

    /// Shannon entropy of the group distribution along `dimension`.
    ///
    /// `None` means the dimension is not applicable to any retained group
    /// (no present value at all) and must be excluded from selection.
    /// That is different from `Some(0.0)`, a dimension that is applicable
    /// but already forced to a single value by earlier choices.
    pub fn entropy(&self, dimension: &str) -> Option<f64> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for group in &self.table.groups {
            if let Some(value) = group.value_for(&self.table.dimensions, dimension).value() {
                *counts.entry(value).or_insert(0) += 1;
            }
        }
        if counts.is_empty() {
            return None;
        }
        Some(shannon_entropy(counts.into_values()))
    }

    /// The free dimension whose answer currently carries the most
    /// information. Ties go to the lexicographically-first name so that
    /// identical data always produces the identical question sequence.
    pub fn max_entropy_dimension(&self) -> Option<String> {
        let mut ordered: Vec<&String> = self.free.iter().collect();
        ordered.sort();

        let mut best: Option<(&String, f64)> = None;
        for dimension in ordered {
            let Some(entropy) = self.entropy(dimension) else {
                continue;
            };
            tracing::debug!(%dimension, entropy, "scored dimension");
            match best {
                Some((_, best_entropy)) if entropy <= best_entropy => {}
                _ => best = Some((dimension, entropy)),
            }
        }
        best.map(|(dimension, _)| dimension.clone())
    }

    /// Apply an answer: keep groups whose value for `dimension` is one of
    /// the chosen values or absent, mark the dimension resolved, and return
    /// the shrunken state.
    ///
    /// # Errors
    /// [`EngineError::AmbiguousElimination`] if any chosen value is not in
    /// the current candidate domain.
    pub fn eliminate(mut self, dimension: &str, chosen: &[String]) -> Result<Self> {
        let domain = self.domain(dimension);
        let unknown: Vec<String> = chosen
            .iter()
            .filter(|&value| !domain.contains(value))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(EngineError::AmbiguousElimination {
                dimension: dimension.to_string(),
                values: unknown,
            });
        }

        let index = self
            .table
            .dimensions
            .iter()
            .position(|d| d == dimension)
            .unwrap_or_else(|| panic!("unknown dimension {dimension}"));
        let before = self.table.groups.len();
        self.table.groups.retain(|group| match group.key[index].value() {
            Some(value) => chosen.iter().any(|c| c == value),
            None => true,
        });
        tracing::debug!(
            %dimension,
            before,
            after = self.table.groups.len(),
            "eliminated groups"
        );

        self.free.retain(|d| d != dimension);
        self.resolved
            .insert(dimension.to_string(), chosen.to_vec());
        Ok(self)
    }
}
