use handlebars::Handlebars;
use serde_json::{Map, Value};

use crate::error::{MaiaError, Result};

/// Render `template` against the decoded JSON response.
///
/// Strict mode: a reference to a field the response does not have is an
/// error rather than an empty string. Output is not HTML-escaped.
pub fn render_template(body: &[u8], template: Option<&str>) -> Result<String> {
    let template = template
        .filter(|t| !t.is_empty())
        .ok_or_else(|| MaiaError::config("missing --template parameter"))?;

    let data: Map<String, Value> = serde_json::from_slice(body)
        .map_err(|e| MaiaError::Template(format!("response cannot be bound: {}", e)))?;

    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry.register_escape_fn(handlebars::no_escape);

    registry
        .render_template(template, &data)
        .map_err(|e| MaiaError::Template(e.to_string()))
}
