//! Tabular projection of query results
//!
//! Columns are discovered from the data unless the caller fixes them. Range
//! results are pivoted: every series is one row and every step-aligned sample
//! time becomes a column.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Duration;

use super::OutputZone;
use crate::api::query::{LabelSet, QueryResult};

/// Column holding the sample time of instant results
pub const TIMESTAMP_COLUMN: &str = "__timestamp__";
/// Column holding the sample value of instant results
pub const VALUE_COLUMN: &str = "__value__";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

fn label_columns<'a>(explicit: &[String], sets: impl Iterator<Item = &'a LabelSet>) -> Vec<String> {
    if !explicit.is_empty() {
        return explicit.to_vec();
    }
    let mut seen = BTreeSet::new();
    for set in sets {
        seen.extend(set.keys().cloned());
    }
    seen.into_iter().collect()
}

fn label_row(set: &LabelSet) -> HashMap<String, String> {
    set.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

/// Truncate down to a multiple of `step` since the Unix epoch.
pub fn align_to_step(ts: DateTime<Utc>, step: Option<Duration>) -> DateTime<Utc> {
    let step_ms = step.map(|s| s.as_millis() as i64).unwrap_or(0);
    if step_ms <= 0 {
        return ts;
    }
    let aligned = ts.timestamp_millis().div_euclid(step_ms) * step_ms;
    DateTime::from_timestamp_millis(aligned).unwrap_or(ts)
}

impl Table {
    pub fn from_label_sets(sets: &[LabelSet], explicit: &[String]) -> Self {
        Table {
            columns: label_columns(explicit, sets.iter()),
            rows: sets.iter().map(label_row).collect(),
        }
    }

    /// Project a result into rows and columns. Plain lists and raw text have
    /// no columns and yield `None`.
    pub fn from_query_result(
        result: &QueryResult,
        explicit: &[String],
        zone: OutputZone,
        step: Option<Duration>,
    ) -> Option<Self> {
        let table = match result {
            QueryResult::Scalar(sample) => {
                let row = HashMap::from([
                    (TIMESTAMP_COLUMN.to_string(), zone.format_precise(sample.timestamp())),
                    (VALUE_COLUMN.to_string(), sample.value().to_string()),
                ]);
                Table {
                    columns: vec![TIMESTAMP_COLUMN.to_string(), VALUE_COLUMN.to_string()],
                    rows: vec![row],
                }
            }
            QueryResult::Vector(samples) => {
                let mut columns = label_columns(explicit, samples.iter().map(|s| &s.metric));
                columns.push(TIMESTAMP_COLUMN.to_string());
                columns.push(VALUE_COLUMN.to_string());

                let rows = samples
                    .iter()
                    .map(|sample| {
                        let mut row = label_row(&sample.metric);
                        row.insert(
                            TIMESTAMP_COLUMN.to_string(),
                            zone.format_precise(sample.value.timestamp()),
                        );
                        row.insert(VALUE_COLUMN.to_string(), sample.value.value().to_string());
                        row
                    })
                    .collect();
                Table { columns, rows }
            }
            QueryResult::Matrix(series) => {
                let mut columns = label_columns(explicit, series.iter().map(|s| &s.metric));
                // keyed by aligned time so columns come out in time order
                let mut time_columns: BTreeMap<i64, String> = BTreeMap::new();

                let rows = series
                    .iter()
                    .map(|s| {
                        let mut row = label_row(&s.metric);
                        for sample in &s.values {
                            let aligned = align_to_step(sample.timestamp(), step);
                            let name = zone.format_seconds(aligned);
                            time_columns.insert(aligned.timestamp_millis(), name.clone());
                            row.insert(name, sample.value().to_string());
                        }
                        row
                    })
                    .collect();

                let mut seen = BTreeSet::new();
                columns.extend(time_columns.into_values().filter(|name| seen.insert(name.clone())));
                Table { columns, rows }
            }
            QueryResult::LabelSets(sets) => Table::from_label_sets(sets, explicit),
            QueryResult::StringList(_) | QueryResult::RawText(_) => return None,
        };
        Some(table)
    }

    /// Rows joined by `separator`, one line each; missing cells stay empty.
    pub fn write(&self, out: &mut String, separator: &str, header: bool) {
        if header {
            out.push_str(&self.columns.join(separator));
            out.push('\n');
        }
        for row in &self.rows {
            let line: Vec<&str> = self
                .columns
                .iter()
                .map(|c| row.get(c).map(String::as_str).unwrap_or(""))
                .collect();
            out.push_str(&line.join(separator));
            out.push('\n');
        }
    }
}
