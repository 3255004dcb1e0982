//! Grouping of ingested runs by their configuration dimensions.
//!
//! Every run carries a value (or an explicit absence marker) for each
//! discovered dimension; runs sharing the full dimension tuple form one
//! group. Grouping is a pure partition and preserves first-appearance
//! order; display ordering is the caller's business.

use std::collections::HashMap;

use crate::sample::SamplePair;

/// Value of one dimension on one run.
///
/// Absence comes in two flavors that never coalesce with present values or
/// with each other: `Missing` is an explicit null in the log, while
/// `NotApplicable` means the record did not mention the dimension at all
/// (e.g. `fio_mode` on a snapshot-restore test). Both are immune to
/// value-based elimination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DimValue {
    Present(String),
    Missing,
    NotApplicable,
}

impl DimValue {
    /// The value string when present.
    pub fn value(&self) -> Option<&str> {
        match self {
            DimValue::Present(value) => Some(value),
            DimValue::Missing | DimValue::NotApplicable => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        !matches!(self, DimValue::Present(_))
    }
}

impl std::fmt::Display for DimValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DimValue::Present(value) => write!(f, "{value}"),
            DimValue::Missing => write!(f, "<missing>"),
            DimValue::NotApplicable => write!(f, "<n/a>"),
        }
    }
}

/// One ingested run before grouping: its dimension values plus the result.
#[derive(Debug, Clone)]
pub struct Row {
    pub dimensions: HashMap<String, DimValue>,
    pub result: SamplePair,
}

/// One row of the grouped table: a concrete dimension tuple and the runs
/// that share it.
#[derive(Debug, Clone)]
pub struct Group {
    /// One value per table dimension, in table dimension order
    pub key: Vec<DimValue>,
    /// The runs sharing this tuple, in ingestion order
    pub runs: Vec<SamplePair>,
}

impl Group {
    /// This group's value for the named dimension, given the table's
    /// dimension order.
    pub fn value_for<'a>(&'a self, dimensions: &[String], dimension: &str) -> &'a DimValue {
        let index = dimensions
            .iter()
            .position(|d| d == dimension)
            .unwrap_or_else(|| panic!("unknown dimension {dimension}"));
        &self.key[index]
    }
}

/// The grouped result table: dimension names plus insertion-ordered groups.
#[derive(Debug, Clone)]
pub struct ResultTable {
    pub dimensions: Vec<String>,
    pub groups: Vec<Group>,
}

impl ResultTable {
    /// Partition rows by exact equality of their full dimension tuple.
    ///
    /// A row's tuple is built in `dimensions` order; a dimension the row
    /// does not mention contributes [`DimValue::NotApplicable`]. Groups come
    /// out in first-appearance order.
    pub fn group(rows: Vec<Row>, dimensions: Vec<String>) -> Self {
        let mut index_by_key: HashMap<Vec<DimValue>, usize> = HashMap::new();
        let mut groups: Vec<Group> = Vec::new();

        for row in rows {
            let key: Vec<DimValue> = dimensions
                .iter()
                .map(|dimension| {
                    row.dimensions
                        .get(dimension)
                        .cloned()
                        .unwrap_or(DimValue::NotApplicable)
                })
                .collect();

            match index_by_key.get(&key) {
                Some(&at) => groups[at].runs.push(row.result),
                None => {
                    index_by_key.insert(key.clone(), groups.len());
                    groups.push(Group {
                        key,
                        runs: vec![row.result],
                    });
                }
            }
        }

        Self { dimensions, groups }
    }

    /// Total number of runs across all groups.
    pub fn run_count(&self) -> usize {
        self.groups.iter().map(|group| group.runs.len()).sum()
    }

    /// All runs of all groups, in table order.
    pub fn all_runs(&self) -> impl Iterator<Item = &SamplePair> {
        self.groups.iter().flat_map(|group| group.runs.iter())
    }
}
