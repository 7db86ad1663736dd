//! Output encodings for backend responses
//!
//! Dispatch happens on the declared content type first and the requested
//! format second. Rendering produces a complete `String`; nothing is written
//! to stdout until it succeeded.

pub mod table;
pub mod template;

use chrono::{DateTime, Local, SecondsFormat, Utc};
use clap::ValueEnum;
use log::{debug, warn};
use std::str::FromStr;
use std::time::Duration;

use crate::api::constants::headers;
use crate::api::query::QueryResult;
use crate::error::{MaiaError, Result};

pub use table::Table;
pub use template::render_template;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Bare values, one per line (tables without header)
    Value,
    /// The backend's JSON response
    Json,
    /// Columns discovered from the result
    Table,
    /// Handlebars template applied to the JSON response
    Template,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Value => "value",
            OutputFormat::Json => "json",
            OutputFormat::Table => "table",
            OutputFormat::Template => "template",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time zone rendered timestamps are shown in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputZone {
    #[default]
    Local,
    Named(chrono_tz::Tz),
}

impl FromStr for OutputZone {
    type Err = MaiaError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("local") {
            return Ok(OutputZone::Local);
        }
        s.parse::<chrono_tz::Tz>()
            .map(OutputZone::Named)
            .map_err(|_| MaiaError::config(format!("unknown time zone '{}'", s)))
    }
}

/// Drop trailing zeros of the fractional second, and the dot if nothing is
/// left.
fn trim_fraction(formatted: String) -> String {
    let Some(dot) = formatted.find('.') else {
        return formatted;
    };
    let digits_end = formatted[dot + 1..]
        .find(|c: char| !c.is_ascii_digit())
        .map(|i| dot + 1 + i)
        .unwrap_or(formatted.len());
    let fraction = formatted[dot + 1..digits_end].trim_end_matches('0');

    let mut trimmed = formatted[..dot].to_string();
    if !fraction.is_empty() {
        trimmed.push('.');
        trimmed.push_str(fraction);
    }
    trimmed.push_str(&formatted[digits_end..]);
    trimmed
}

impl OutputZone {
    fn format(&self, ts: DateTime<Utc>, precision: SecondsFormat) -> String {
        match self {
            OutputZone::Local => ts.with_timezone(&Local).to_rfc3339_opts(precision, true),
            OutputZone::Named(tz) => ts.with_timezone(tz).to_rfc3339_opts(precision, true),
        }
    }

    /// RFC 3339 with as many fractional digits as needed
    pub fn format_precise(&self, ts: DateTime<Utc>) -> String {
        trim_fraction(self.format(ts, SecondsFormat::Nanos))
    }

    /// RFC 3339 at whole seconds
    pub fn format_seconds(&self, ts: DateTime<Utc>) -> String {
        self.format(ts, SecondsFormat::Secs)
    }
}

/// How a response is to be rendered
#[derive(Debug, Clone)]
pub struct RenderSpec {
    pub format: OutputFormat,
    /// Fixed column list; empty means discover from the result
    pub columns: Vec<String>,
    pub separator: String,
    pub template: Option<String>,
    pub zone: OutputZone,
    /// Step of a range query, used to align matrix columns
    pub step: Option<Duration>,
}

impl RenderSpec {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            columns: Vec::new(),
            separator: " ".to_string(),
            template: None,
            zone: OutputZone::default(),
            step: None,
        }
    }
}

/// Shape of the JSON payload a response carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// `data` is a list of strings (label values, metric names, label names)
    StringList,
    /// `data` is a list of label sets (series)
    LabelSets,
    /// `data` is a query result envelope
    QueryResult,
}

enum ContentKind {
    Json,
    Text,
    Other,
}

fn classify(content_type: Option<&str>) -> ContentKind {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|m| m.trim().to_ascii_lowercase())
        .unwrap_or_default();
    if mime == headers::CONTENT_TYPE_JSON {
        ContentKind::Json
    } else if mime.starts_with(headers::CONTENT_TYPE_TEXT) {
        ContentKind::Text
    } else {
        ContentKind::Other
    }
}

const ESCAPED_AMPERSAND: &str = "\\u0026";

/// JSON exactly as received, except that `&` is never left escaped.
///
/// Only a real `\u0026` escape is replaced; an escaped backslash followed by
/// the text `u0026` stays as it is.
fn json_passthrough(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let mut out = String::with_capacity(text.len());
    let mut rest: &str = &text;
    let mut backslashes = 0usize;

    while let Some(c) = rest.chars().next() {
        if c == '\\' && backslashes % 2 == 0 && rest.starts_with(ESCAPED_AMPERSAND) {
            out.push('&');
            rest = &rest[ESCAPED_AMPERSAND.len()..];
            backslashes = 0;
            continue;
        }
        backslashes = if c == '\\' { backslashes + 1 } else { 0 };
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

fn decode(body: &[u8], payload: Payload) -> Result<QueryResult> {
    match payload {
        Payload::StringList => QueryResult::from_list_body(body),
        Payload::LabelSets => QueryResult::from_series_body(body),
        Payload::QueryResult => QueryResult::from_query_body(body),
    }
}

/// Value and table output of a decoded result. Tables get a header, value
/// dumps do not; lists and raw text only exist as values.
fn render_plain(result: QueryResult, spec: &RenderSpec) -> Result<String> {
    let header = spec.format == OutputFormat::Table;
    let mut out = String::new();
    debug!("Rendering {} result as {}", result.result_type(), spec.format);

    if let Some(table) = Table::from_query_result(&result, &spec.columns, spec.zone, spec.step) {
        table.write(&mut out, &spec.separator, header);
        return Ok(out);
    }

    match result {
        QueryResult::RawText(text) if !header => Ok(text),
        QueryResult::StringList(values) if !header => {
            for value in values {
                out.push_str(&value);
                out.push('\n');
            }
            Ok(out)
        }
        _ => Err(MaiaError::UnsupportedFormat(spec.format.to_string())),
    }
}

fn render_json(body: &[u8], payload: Payload, spec: &RenderSpec) -> Result<String> {
    match spec.format {
        OutputFormat::Json => Ok(json_passthrough(body)),
        OutputFormat::Template => render_template(body, spec.template.as_deref()),
        OutputFormat::Value | OutputFormat::Table => render_plain(decode(body, payload)?, spec),
    }
}

/// Render a successful response body.
pub fn render(
    body: &[u8],
    content_type: Option<&str>,
    payload: Payload,
    spec: &RenderSpec,
) -> Result<String> {
    match classify(content_type) {
        ContentKind::Json => render_json(body, payload, spec),
        ContentKind::Text => match spec.format {
            OutputFormat::Json | OutputFormat::Template => {
                Err(MaiaError::UnsupportedFormat(spec.format.to_string()))
            }
            OutputFormat::Value | OutputFormat::Table => {
                render_plain(QueryResult::from_text(body), spec)
            }
        },
        ContentKind::Other => {
            warn!(
                "Response body: {}",
                String::from_utf8_lossy(body).replace(['\n', '\r'], " ")
            );
            Err(MaiaError::UnexpectedContentType(
                content_type.unwrap_or_default().to_string(),
            ))
        }
    }
}
