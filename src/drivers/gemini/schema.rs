//! Gemini `Schema` object encoding.
//!
//! Gemini spells types in uppercase (`OBJECT`, `STRING`, ...) and keeps the
//! order of object properties in a separate `propertyOrdering` list, since the
//! `properties` map itself is unordered.

use super::GEMINI_BACKEND;
use crate::schema::{at_path, Schema, SchemaKind, EXTENSION_KEYS};
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiSchema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, GeminiSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    required: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    property_ordering: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    items: Option<Box<GeminiSchema>>,
    /// Extension keywords on encode; everything unrecognised on decode.
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

/// Encode a schema tree as a Gemini `Schema` object.
pub fn encode(schema: &Schema) -> Value {
    serde_json::to_value(to_wire(schema)).unwrap_or(Value::Null)
}

pub fn encode_bytes(schema: &Schema) -> Result<Vec<u8>> {
    serde_json::to_vec(&to_wire(schema)).map_err(|e| {
        Error::parse_with_context(
            format!("failed to serialize Gemini schema: {}", e),
            ErrorContext::new()
                .with_field_path(schema.name())
                .with_source("gemini_schema"),
        )
    })
}

/// Decode a Gemini (or plain JSON Schema) document. `type` may use any letter case.
pub fn parse(raw: &[u8]) -> Result<Schema> {
    let wire: GeminiSchema = serde_json::from_slice(raw).map_err(|e| {
        Error::parse_with_context(
            format!("invalid Gemini schema: {}", e),
            ErrorContext::new()
                .with_field_path("$")
                .with_source("gemini_schema"),
        )
    })?;
    let name = wire.title.clone().unwrap_or_default();
    let schema = from_wire(wire, name, "$")?;
    debug!(name = schema.name(), kind = %schema.kind(), "parsed Gemini schema");
    Ok(schema)
}

fn to_wire(schema: &Schema) -> GeminiSchema {
    let mut wire = GeminiSchema {
        kind: Some(json!(schema.kind().as_str().to_ascii_uppercase())),
        title: Some(schema.name().to_string()).filter(|n| !n.is_empty()),
        description: schema.description().map(str::to_string),
        ..GeminiSchema::default()
    };

    match schema.kind() {
        SchemaKind::Object => {
            for child in schema.properties() {
                wire.properties
                    .insert(child.name().to_string(), to_wire(child));
                wire.property_ordering.push(child.name().to_string());
            }
            wire.required = schema.required_properties().to_vec();
        }
        SchemaKind::Array => {
            wire.items = schema.items().map(|i| Box::new(to_wire(i)));
        }
        _ => {}
    }

    for (key, value) in schema.extensions() {
        if EXTENSION_KEYS.contains(&key.as_str()) {
            wire.extra.insert(key.clone(), value.clone());
        }
    }
    wire
}

fn from_wire(mut wire: GeminiSchema, name: String, path: &str) -> Result<Schema> {
    let type_value = wire.kind.take().ok_or_else(|| {
        Error::parse_with_context(
            "schema node has no 'type'",
            ErrorContext::new()
                .with_field_path(path)
                .with_source("gemini_schema"),
        )
    })?;
    let (kind, nullable) = SchemaKind::from_type_value(&type_value).map_err(|e| at_path(e, path))?;

    let mut schema = Schema::new(GEMINI_BACKEND, kind, name);
    if let Some(desc) = wire.description.take() {
        schema.set_description(desc);
    }
    for key in EXTENSION_KEYS {
        if let Some(v) = wire.extra.remove(*key) {
            schema.set_extension(*key, v);
        }
    }
    if nullable {
        schema.set_extension("nullable", json!(true));
    }

    match kind {
        SchemaKind::Object => {
            let required = std::mem::take(&mut wire.required);
            let mut properties = std::mem::take(&mut wire.properties);

            let mut ordered = Vec::with_capacity(properties.len());
            for key in &wire.property_ordering {
                if let Some(child) = properties.remove(key) {
                    ordered.push((key.clone(), child));
                }
            }
            // Whatever the ordering list did not mention follows, sorted by name.
            ordered.extend(properties);

            for (key, child) in ordered {
                let child_path = format!("{}.{}", path, key);
                let mut child = from_wire(child, key.clone(), &child_path)?;
                child.set_required(required.contains(&key));
                schema.insert_property(child)?;
            }
        }
        SchemaKind::Array => {
            if let Some(items) = wire.items.take() {
                let item_name = items.title.clone().unwrap_or_default();
                let items = from_wire(*items, item_name, &format!("{}[]", path))?;
                schema.set_items(items)?;
            }
        }
        _ => {}
    }

    Ok(schema)
}
