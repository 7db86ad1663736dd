//! Query result handling
//!
//! Decodes the JSON shapes returned by the backend into one sum type.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::Result;

pub type LabelSet = BTreeMap<String, String>;

/// `[<unix seconds>, "<value>"]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SamplePair(pub f64, pub String);

impl SamplePair {
    /// Sample time at millisecond precision
    pub fn timestamp(&self) -> DateTime<Utc> {
        let millis = (self.0 * 1000.0).round() as i64;
        DateTime::from_timestamp_millis(millis).unwrap_or_default()
    }

    /// The value exactly as the backend formatted it
    pub fn value(&self) -> &str {
        &self.1
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VectorSample {
    #[serde(default)]
    pub metric: LabelSet,
    pub value: SamplePair,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RangeSeries {
    #[serde(default)]
    pub metric: LabelSet,
    #[serde(default)]
    pub values: Vec<SamplePair>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "resultType", content = "result", rename_all = "lowercase")]
enum ResultData {
    Scalar(SamplePair),
    String(SamplePair),
    Vector(Vec<VectorSample>),
    Matrix(Vec<RangeSeries>),
}

#[derive(Debug, Deserialize)]
struct QueryEnvelope {
    data: ResultData,
}

#[derive(Debug, Deserialize)]
struct ListEnvelope<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

/// Every result shape the backend can return
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Scalar(SamplePair),
    /// Instant query result
    Vector(Vec<VectorSample>),
    /// Range query result
    Matrix(Vec<RangeSeries>),
    /// Series listing: label sets without samples
    LabelSets(Vec<LabelSet>),
    /// Label values or metric names
    StringList(Vec<String>),
    /// Federation text format
    RawText(String),
}

impl QueryResult {
    /// Decode a `query` / `query_range` response. String results are treated
    /// like scalars.
    pub fn from_query_body(body: &[u8]) -> Result<Self> {
        let envelope: QueryEnvelope = serde_json::from_slice(body)?;
        Ok(match envelope.data {
            ResultData::Scalar(sample) | ResultData::String(sample) => QueryResult::Scalar(sample),
            ResultData::Vector(samples) => QueryResult::Vector(samples),
            ResultData::Matrix(series) => QueryResult::Matrix(series),
        })
    }

    /// Decode a `series` response
    pub fn from_series_body(body: &[u8]) -> Result<Self> {
        let envelope: ListEnvelope<LabelSet> = serde_json::from_slice(body)?;
        Ok(QueryResult::LabelSets(envelope.data))
    }

    /// Decode a `label/<name>/values` or `labels` response
    pub fn from_list_body(body: &[u8]) -> Result<Self> {
        let envelope: ListEnvelope<String> = serde_json::from_slice(body)?;
        Ok(QueryResult::StringList(envelope.data))
    }

    pub fn from_text(body: &[u8]) -> Self {
        QueryResult::RawText(String::from_utf8_lossy(body).into_owned())
    }

    pub fn result_type(&self) -> &'static str {
        match self {
            QueryResult::Scalar(_) => "scalar",
            QueryResult::Vector(_) => "vector",
            QueryResult::Matrix(_) => "matrix",
            QueryResult::LabelSets(_) => "series",
            QueryResult::StringList(_) => "list",
            QueryResult::RawText(_) => "text",
        }
    }
}
