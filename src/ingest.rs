//! Ingestion of A/B test results from EMF-style ndjson metric logs.
//!
//! A log line is an A/B record iff it carries a non-null `metric` field and
//! an `_aws` EMF envelope; all other lines (plain log output, unrelated
//! metrics) are skipped. A/B records must be complete: a missing or
//! mistyped required field rejects the record with its line number instead
//! of coercing a default.
//!
//! The configuration dimension set is not hardcoded; it is discovered from
//! the union of the `Dimensions` declarations in the EMF envelopes, and the
//! measurement unit is the one declared for the `mean_difference` metric.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::sample::SamplePair;
use crate::stats::ResamplePolicy;
use crate::table::{DimValue, Row};

/// Errors raised while loading a metrics log
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to read log file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An A/B record that cannot be used as logged; never silently skipped
    #[error("line {line}: malformed A/B record: {message}")]
    MalformedRecord { line: usize, message: String },

    #[error("line {line}: record is missing {field}")]
    MissingField { line: usize, field: &'static str },

    #[error("no A/B test records found in {path}")]
    NoRecords { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, IngestError>;

/// The EMF `_aws` envelope, reduced to what this tool reads.
#[derive(Debug, Deserialize)]
struct EmfEnvelope {
    #[serde(rename = "CloudWatchMetrics")]
    cloudwatch_metrics: Vec<MetricDirective>,
}

#[derive(Debug, Deserialize)]
struct MetricDirective {
    #[serde(rename = "Dimensions", default)]
    dimensions: Vec<Vec<String>>,
    #[serde(rename = "Metrics", default)]
    metrics: Vec<MetricDeclaration>,
}

#[derive(Debug, Deserialize)]
struct MetricDeclaration {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Unit")]
    unit: String,
}

/// One fully-parsed A/B record, dimension values still untyped.
#[derive(Debug, Deserialize)]
pub struct EmfRecord {
    #[serde(rename = "_aws")]
    aws: EmfEnvelope,
    metric: String,
    data_a: Vec<f64>,
    data_b: Vec<f64>,
    p_value: f64,
    mean_difference: f64,
    buildkite_build_number: u64,
    #[serde(flatten)]
    fields: serde_json::Map<String, Value>,
}

impl EmfRecord {
    /// The declared unit of the `mean_difference` metric.
    fn unit(&self) -> Option<&str> {
        self.aws
            .cloudwatch_metrics
            .first()?
            .metrics
            .iter()
            .find(|m| m.name == "mean_difference")
            .map(|m| m.unit.as_str())
    }

    /// The dimension names this record declares (first dimension set).
    fn dimension_names(&self) -> impl Iterator<Item = &String> {
        self.aws
            .cloudwatch_metrics
            .first()
            .and_then(|directive| directive.dimensions.first())
            .into_iter()
            .flatten()
    }

    fn dimension_value(&self, name: &str) -> DimValue {
        match self.fields.get(name) {
            None => DimValue::NotApplicable,
            Some(Value::Null) => DimValue::Missing,
            Some(Value::String(s)) => DimValue::Present(s.clone()),
            Some(Value::Number(n)) => DimValue::Present(n.to_string()),
            Some(Value::Bool(b)) => DimValue::Present(b.to_string()),
            Some(other) => {
                tracing::warn!(dimension = name, ?other, "non-scalar dimension value, treating as not applicable");
                DimValue::NotApplicable
            }
        }
    }
}

/// Result of ingesting a log: the discovered dimension names (sorted, for
/// reproducible grouping) and one row per A/B record.
#[derive(Debug)]
pub struct Ingested {
    pub dimensions: Vec<String>,
    pub rows: Vec<Row>,
}

/// Is this parsed line an A/B record at all? Lines that aren't are normal
/// in mixed logs and skipped without complaint.
fn is_ab_record(value: &Value) -> bool {
    let Value::Object(map) = value else {
        return false;
    };
    map.get("metric").is_some_and(|m| !m.is_null()) && map.contains_key("_aws")
}

/// Parse a single ndjson line into an A/B record, if it is one.
///
/// Returns `Ok(None)` for non-A/B lines. An A/B line that fails to parse
/// completely is an error carrying the 1-based line number.
pub fn parse_line(line: &str, line_number: usize) -> Result<Option<EmfRecord>> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    let Ok(value) = serde_json::from_str::<Value>(line) else {
        tracing::warn!(line = line_number, "skipping unparseable log line");
        return Ok(None);
    };
    if !is_ab_record(&value) {
        return Ok(None);
    }

    let record: EmfRecord =
        serde_json::from_value(value).map_err(|e| IngestError::MalformedRecord {
            line: line_number,
            message: e.to_string(),
        })?;
    if record.unit().is_none() {
        return Err(IngestError::MissingField {
            line: line_number,
            field: "a unit declaration for mean_difference",
        });
    }
    Ok(Some(record))
}

/// Load every A/B record from an EMF ndjson log.
///
/// `metric_filter` restricts ingestion to matching metric names;
/// `resample` is attached to every produced [`SamplePair`], turning later
/// statistic reads into fresh permutation tests.
pub fn load_results(
    path: &Path,
    metric_filter: Option<&Regex>,
    resample: Option<ResamplePolicy>,
) -> Result<Ingested> {
    let contents = fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut records = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        if let Some(record) = parse_line(line, index + 1)? {
            if let Some(filter) = metric_filter {
                if !filter.is_match(&record.metric) {
                    continue;
                }
            }
            records.push(record);
        }
    }
    if records.is_empty() {
        return Err(IngestError::NoRecords {
            path: path.to_path_buf(),
        });
    }

    let mut dimensions: Vec<String> = records
        .iter()
        .flat_map(|record| record.dimension_names().cloned())
        .collect();
    dimensions.sort();
    dimensions.dedup();
    tracing::debug!(?dimensions, records = records.len(), "ingested A/B records");

    let rows = records
        .into_iter()
        .map(|record| {
            let values: HashMap<String, DimValue> = dimensions
                .iter()
                .map(|name| (name.clone(), record.dimension_value(name)))
                .collect();
            let unit = record.unit().unwrap_or_default().to_string();
            Row {
                dimensions: values,
                result: SamplePair::new(
                    record.data_a,
                    record.data_b,
                    record.p_value,
                    record.mean_difference,
                    record.buildkite_build_number,
                    unit,
                    record.metric,
                    resample,
                ),
            }
        })
        .collect();

    Ok(Ingested { dimensions, rows })
}
