//! Builds backend requests from command inputs
//!
//! Fills in default time ranges and picks the step size of range queries, so
//! that a command only has to hand over what the user typed.

use chrono::{DateTime, Utc};
use log::debug;
use std::time::Duration;

use super::request::QueryRequest;
use super::time::{default_time_range, parse_time, select_step};
use crate::api::constants::METRIC_NAME_LABEL;
use crate::error::{MaiaError, Result};

/// Time parameters of a `query` invocation
#[derive(Debug, Clone, Default)]
pub struct QueryWindow {
    /// Evaluation time of an instant query
    pub time: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub step: Option<Duration>,
    pub timeout: Option<Duration>,
}

impl QueryWindow {
    /// A range is requested as soon as either bound is given.
    pub fn is_range(&self) -> bool {
        self.start.as_deref().is_some_and(|s| !s.is_empty())
            || self.end.as_deref().is_some_and(|e| !e.is_empty())
    }
}

/// Steps are sent in whole seconds
const MIN_STEP: Duration = Duration::from_secs(1);

fn wrap_selector(selector: Option<&str>) -> String {
    format!("{{{}}}", selector.unwrap_or_default())
}

fn positive(duration: Option<Duration>) -> Option<Duration> {
    duration.filter(|d| !d.is_zero())
}

pub fn snapshot(selector: Option<&str>) -> QueryRequest {
    QueryRequest::Snapshot {
        selectors: vec![wrap_selector(selector)],
    }
}

pub fn series(
    selector: Option<&str>,
    start: Option<&str>,
    end: Option<&str>,
    now: DateTime<Utc>,
) -> Result<QueryRequest> {
    let (start, end) = default_time_range(start, end, now)?;
    Ok(QueryRequest::Series {
        selectors: vec![wrap_selector(selector)],
        start,
        end,
    })
}

pub fn label_values(name: Option<&str>) -> Result<QueryRequest> {
    let name = name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| MaiaError::config("missing argument: label-name"))?;
    Ok(QueryRequest::LabelValues {
        name: name.to_string(),
    })
}

/// Label values of the reserved metric-name label
pub fn metric_names() -> QueryRequest {
    QueryRequest::LabelValues {
        name: METRIC_NAME_LABEL.to_string(),
    }
}

pub fn labels(selector: Option<&str>, start: Option<&str>, end: Option<&str>) -> QueryRequest {
    let selectors = selector
        .filter(|s| !s.is_empty())
        .map(|s| vec![wrap_selector(Some(s))])
        .unwrap_or_default();
    QueryRequest::Labels {
        selectors,
        start: start.map(str::to_string),
        end: end.map(str::to_string),
    }
}

/// Instant query, or range query when the window has a bound.
pub fn query(expr: &str, window: &QueryWindow, now: DateTime<Utc>) -> Result<QueryRequest> {
    let timeout = positive(window.timeout);

    if !window.is_range() {
        return Ok(QueryRequest::Instant {
            query: expr.to_string(),
            time: window.time.clone().filter(|t| !t.is_empty()),
            timeout,
        });
    }

    let (start, end) = default_time_range(window.start.as_deref(), window.end.as_deref(), now)?;
    let step = match positive(window.step) {
        Some(step) if step < MIN_STEP => {
            return Err(MaiaError::config(format!(
                "invalid --step {}ms: the step must be at least one second",
                step.as_millis()
            )));
        }
        Some(step) => step,
        None => {
            let range = (parse_time(&end)? - parse_time(&start)?)
                .to_std()
                .unwrap_or_default();
            let step = select_step(range);
            debug!("No step given, using {}s for a range of {}s", step.as_secs(), range.as_secs());
            step
        }
    };

    Ok(QueryRequest::Range {
        query: expr.to_string(),
        start,
        end,
        step,
        timeout,
    })
}
