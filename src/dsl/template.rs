//! `${name}` variable substitution.
//!
//! Deliberately not a general templating language: no filters, no
//! control flow, no nested expressions. A single variable reference is
//! substituted with its rendered string form; a reference to a name
//! absent from `vars` is left verbatim so a typo is visible in the
//! output rather than silently becoming an empty string.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

static VAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex is valid"));

/// Renders `${name}` references against a flat variable map.
#[derive(Debug, Clone, Default)]
pub struct Templater;

impl Templater {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Substitute every `${name}` reference in `template` with the
    /// string form of `vars[name]`, or leave the reference untouched if
    /// `name` isn't bound. Pure: never mutates `vars`. Idempotent:
    /// rendering the output again is a no-op, since a resolved
    /// substitution can't itself contain `${...}` syntax unless the
    /// variable's value happened to contain one literally, which is
    /// rendered verbatim rather than recursively re-expanded.
    #[must_use]
    pub fn render(&self, template: &str, vars: &HashMap<String, JsonValue>) -> String {
        VAR_RE
            .replace_all(template, |caps: &regex::Captures| {
                let name = &caps[1];
                match vars.get(name) {
                    Some(value) => value_to_string(value),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    /// Recursively render every string leaf of a JSON value, leaving
    /// numbers, bools, null, and structure untouched. Used to render a
    /// whole step (after it's been turned into a `serde_json::Value`)
    /// in one pass rather than field by field.
    #[must_use]
    pub fn deep_render(&self, value: &JsonValue, vars: &HashMap<String, JsonValue>) -> JsonValue {
        match value {
            JsonValue::String(s) => JsonValue::String(self.render(s, vars)),
            JsonValue::Array(items) => {
                JsonValue::Array(items.iter().map(|v| self.deep_render(v, vars)).collect())
            }
            JsonValue::Object(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.deep_render(v, vars)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

/// How a resolved variable's value is stringified when substituted into
/// a template. Strings are inserted verbatim (no surrounding quotes);
/// everything else is JSON-encoded.
fn value_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod template_test;
