use std::time::Duration;

use super::time::format_seconds;
use crate::api::constants::{self, headers};

/// One backend call. Every variant maps to exactly one HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryRequest {
    /// Federation snapshot of all matching series, as plain text
    Snapshot { selectors: Vec<String> },
    Instant {
        query: String,
        time: Option<String>,
        timeout: Option<Duration>,
    },
    Range {
        query: String,
        start: String,
        end: String,
        step: Duration,
        timeout: Option<Duration>,
    },
    Series {
        selectors: Vec<String>,
        start: String,
        end: String,
    },
    LabelValues { name: String },
    Labels {
        selectors: Vec<String>,
        start: Option<String>,
        end: Option<String>,
    },
}

fn push_opt(params: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        params.push((key, value.to_string()));
    }
}

fn push_matchers(params: &mut Vec<(&'static str, String)>, selectors: &[String]) {
    for selector in selectors {
        params.push(("match[]", selector.clone()));
    }
}

impl QueryRequest {
    pub fn path(&self) -> String {
        match self {
            QueryRequest::Snapshot { .. } => constants::FEDERATE_PATH.to_string(),
            QueryRequest::Instant { .. } => constants::query_path(),
            QueryRequest::Range { .. } => constants::query_range_path(),
            QueryRequest::Series { .. } => constants::series_path(),
            QueryRequest::LabelValues { name } => constants::label_values_path(name),
            QueryRequest::Labels { .. } => constants::labels_path(),
        }
    }

    /// Query string parameters; empty values are left out.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        match self {
            QueryRequest::Snapshot { selectors } => push_matchers(&mut params, selectors),
            QueryRequest::Instant { query, time, timeout } => {
                push_opt(&mut params, "query", Some(query.as_str()));
                push_opt(&mut params, "time", time.as_deref());
                push_opt(&mut params, "timeout", timeout.map(format_seconds).as_deref());
            }
            QueryRequest::Range {
                query,
                start,
                end,
                step,
                timeout,
            } => {
                push_opt(&mut params, "query", Some(query.as_str()));
                push_opt(&mut params, "start", Some(start.as_str()));
                push_opt(&mut params, "end", Some(end.as_str()));
                push_opt(&mut params, "step", Some(format_seconds(*step).as_str()));
                push_opt(&mut params, "timeout", timeout.map(format_seconds).as_deref());
            }
            QueryRequest::Series { selectors, start, end } => {
                push_matchers(&mut params, selectors);
                push_opt(&mut params, "start", Some(start.as_str()));
                push_opt(&mut params, "end", Some(end.as_str()));
            }
            QueryRequest::LabelValues { .. } => {}
            QueryRequest::Labels { selectors, start, end } => {
                push_opt(&mut params, "start", start.as_deref());
                push_opt(&mut params, "end", end.as_deref());
                push_matchers(&mut params, selectors);
            }
        }
        params
    }

    /// Content type requested from the backend
    pub fn accept(&self) -> &'static str {
        match self {
            QueryRequest::Snapshot { .. } => headers::CONTENT_TYPE_TEXT,
            _ => headers::CONTENT_TYPE_JSON,
        }
    }

    /// Step of a range query, used to align rendered timestamps
    pub fn step(&self) -> Option<Duration> {
        match self {
            QueryRequest::Range { step, .. } => Some(*step),
            _ => None,
        }
    }
}
