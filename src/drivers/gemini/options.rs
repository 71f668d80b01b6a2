//! Gemini-only schema options.
//!
//! These write Gemini keywords into [`Schema::extensions`]; the shared builder
//! applies them like any other option.

use crate::schema::{BuildArg, Schema, SchemaOption};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
struct Keyword {
    key: &'static str,
    value: Value,
}

impl SchemaOption for Keyword {
    fn apply(&self, schema: &mut Schema) {
        schema.set_extension(self.key, self.value.clone());
    }
}

fn keyword(key: &'static str, value: Value) -> BuildArg {
    BuildArg::option(Keyword { key, value })
}

/// Value format hint, e.g. `date-time` on strings or `int32` on integers.
pub fn format(text: impl Into<String>) -> BuildArg {
    keyword("format", json!(text.into()))
}

pub fn nullable() -> BuildArg {
    keyword("nullable", json!(true))
}

/// Restrict a string node to a fixed set of values.
pub fn enum_values<I, S>(values: I) -> BuildArg
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let values: Vec<String> = values.into_iter().map(Into::into).collect();
    keyword("enum", json!(values))
}

pub fn minimum(value: f64) -> BuildArg {
    keyword("minimum", json!(value))
}

pub fn maximum(value: f64) -> BuildArg {
    keyword("maximum", json!(value))
}

pub fn min_items(count: u64) -> BuildArg {
    keyword("minItems", json!(count))
}

pub fn max_items(count: u64) -> BuildArg {
    keyword("maxItems", json!(count))
}
