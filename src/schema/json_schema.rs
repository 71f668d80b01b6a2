//! Plain JSON Schema encoding of [`Schema`] trees, and reflection of Rust types.
//!
//! This is the encoding produced by `schemars`, so it doubles as the intermediate
//! form for [`super::SchemaBuilder::from_type`]. Object properties are emitted as a
//! JSON map and therefore come back sorted by name.

use super::{BackendId, Schema, SchemaKind, EXTENSION_KEYS};
use crate::{Error, ErrorContext, Result};
use schemars::gen::SchemaSettings;
use serde_json::{json, Map, Value};

pub fn to_json_schema(schema: &Schema) -> Value {
    let mut map = Map::new();
    map.insert("type".into(), json!(schema.kind().as_str()));

    if !schema.name().is_empty() {
        map.insert("title".into(), schema.name().into());
    }
    if let Some(desc) = schema.description() {
        map.insert("description".into(), desc.into());
    }

    match schema.kind() {
        SchemaKind::Object => {
            let mut properties = Map::new();
            for child in schema.properties() {
                properties.insert(child.name().to_string(), to_json_schema(child));
            }
            map.insert("properties".into(), properties.into());

            if !schema.required_properties().is_empty() {
                map.insert("required".into(), schema.required_properties().into());
            }
            map.insert("additionalProperties".into(), json!(false));
        }
        SchemaKind::Array => {
            if let Some(items) = schema.items() {
                map.insert("items".into(), to_json_schema(items));
            }
        }
        _ => {}
    }

    for (key, value) in schema.extensions() {
        map.insert(key.clone(), value.clone());
    }

    map.into()
}

/// Decode a JSON Schema document. The root name comes from `title`.
pub fn from_json_schema(value: &Value, backend: BackendId) -> Result<Schema> {
    let name = value
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    parse_node(value, name, backend, "$")
}

fn parse_node(value: &Value, name: String, backend: BackendId, path: &str) -> Result<Schema> {
    let obj = value.as_object().ok_or_else(|| {
        Error::parse_with_context(
            "schema node must be a JSON object",
            ErrorContext::new()
                .with_field_path(path)
                .with_source("json_schema"),
        )
    })?;

    let type_value = obj.get("type").ok_or_else(|| {
        Error::parse_with_context(
            "schema node has no 'type'",
            ErrorContext::new()
                .with_field_path(path)
                .with_source("json_schema"),
        )
    })?;
    let (kind, nullable) =
        SchemaKind::from_type_value(type_value).map_err(|e| super::at_path(e, path))?;

    let mut schema = Schema::new(backend, kind, name);
    if let Some(desc) = obj.get("description").and_then(Value::as_str) {
        schema.set_description(desc);
    }
    for key in EXTENSION_KEYS {
        if let Some(v) = obj.get(*key) {
            schema.set_extension(*key, v.clone());
        }
    }
    if nullable {
        schema.set_extension("nullable", json!(true));
    }

    match kind {
        SchemaKind::Object => {
            let required: Vec<&str> = obj
                .get("required")
                .and_then(Value::as_array)
                .map(|names| names.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();

            if let Some(props) = obj.get("properties") {
                let props = props.as_object().ok_or_else(|| {
                    Error::parse_with_context(
                        "'properties' must be a JSON object",
                        ErrorContext::new()
                            .with_field_path(path)
                            .with_source("json_schema"),
                    )
                })?;
                for (key, child) in props {
                    let child_path = format!("{}.{}", path, key);
                    let mut child = parse_node(child, key.clone(), backend, &child_path)?;
                    child.set_required(required.contains(&key.as_str()));
                    schema.insert_property(child)?;
                }
            }
        }
        SchemaKind::Array => {
            if let Some(items) = obj.get("items") {
                let item_name = items
                    .get("title")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let items = parse_node(items, item_name, backend, &format!("{}[]", path))?;
                schema.set_items(items)?;
            }
        }
        _ => {}
    }

    Ok(schema)
}

/// Reflect `T` into JSON Schema bytes with subschemas inlined and `Option<_>`
/// fields rendered as `nullable`.
pub fn reflect_json_schema<T: schemars::JsonSchema>() -> Result<Vec<u8>> {
    let generator = SchemaSettings::openapi3()
        .with(|s| s.inline_subschemas = true)
        .into_generator();
    let root = generator.into_root_schema_for::<T>();
    serde_json::to_vec(&root).map_err(|e| {
        Error::parse_with_context(
            format!("failed to serialize reflected schema: {}", e),
            ErrorContext::new()
                .with_details(std::any::type_name::<T>())
                .with_source("schema_reflection"),
        )
    })
}
