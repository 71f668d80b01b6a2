//! Backend-neutral schema model for structured output.
//!
//! A [`Schema`] is one node of an output-shape tree. Nodes are assembled through a
//! [`SchemaBuilder`] from chained [`BuildArg`]s: child schemas contribute nested
//! nodes, options mutate the node under construction. Each backend driver owns the
//! raw encoding of the tree (see [`crate::drivers::BackendDriver::encode_schema`]).
//!
//! # Examples
//!
//! ```
//! use fluent_llm::drivers::mock::MockDriver;
//! use fluent_llm::schema::SchemaKind;
//! use fluent_llm::Model;
//!
//! let model = Model::new(MockDriver::new(), "mock-1").unwrap();
//! let b = model.new_schema();
//! let person = b.object(
//!     "person",
//!     vec![
//!         b.string("name", vec![b.required(), b.description("Full name")]).into(),
//!         b.integer("age", vec![]).into(),
//!     ],
//! );
//!
//! assert_eq!(person.kind(), SchemaKind::Object);
//! assert_eq!(person.required_properties(), ["name"]);
//! ```

pub mod build;
pub mod builder;
pub mod json_schema;

pub use build::{description, required, BuildArg, BuildArgType, Description, Required, SchemaOption};
pub use builder::SchemaBuilder;
pub use json_schema::{from_json_schema, reflect_json_schema, to_json_schema};

use crate::{Error, ErrorContext, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Keywords carried in [`Schema::extensions`] that raw-schema codecs read and write.
pub const EXTENSION_KEYS: &[&str] = &[
    "format", "nullable", "enum", "minimum", "maximum", "minItems", "maxItems",
];

/// Attach the location of a schema node to a parse error raised while decoding it.
pub(crate) fn at_path(err: Error, path: &str) -> Error {
    match err {
        Error::Parse { message, context } => Error::Parse {
            message,
            context: context.with_field_path(path),
        },
        other => other,
    }
}

/// Identity of the backend whose builder produced a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackendId(&'static str);

impl BackendId {
    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Kind of a schema node. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Object,
    String,
    Integer,
    Number,
    Boolean,
    Array,
}

impl SchemaKind {
    /// JSON Schema spelling of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::Object => "object",
            SchemaKind::String => "string",
            SchemaKind::Integer => "integer",
            SchemaKind::Number => "number",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Array => "array",
        }
    }

    /// Kinds that cannot hold child schemas.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, SchemaKind::Object | SchemaKind::Array)
    }

    /// Read a raw `type` keyword: either a single name or a list such as
    /// `["string", "null"]`. Returns the kind and whether `null` was listed.
    pub fn from_type_value(value: &Value) -> Result<(SchemaKind, bool)> {
        match value {
            Value::String(s) => Ok((s.parse()?, false)),
            Value::Array(types) => {
                let mut nullable = false;
                let mut kind = None;
                for t in types {
                    match t.as_str() {
                        Some(s) if s.eq_ignore_ascii_case("null") => nullable = true,
                        Some(s) if kind.is_none() => kind = Some(s.parse()?),
                        Some(_) => {
                            return Err(Error::parse_with_context(
                                "union types are not supported",
                                ErrorContext::new().with_details(value.to_string()),
                            ))
                        }
                        None => {
                            return Err(Error::parse_with_context(
                                "type list entries must be strings",
                                ErrorContext::new().with_details(value.to_string()),
                            ))
                        }
                    }
                }
                kind.map(|k| (k, nullable)).ok_or_else(|| {
                    Error::parse_with_context(
                        "type list names no concrete type",
                        ErrorContext::new().with_details(value.to_string()),
                    )
                })
            }
            other => Err(Error::parse_with_context(
                "type must be a string or a list of strings",
                ErrorContext::new().with_details(other.to_string()),
            )),
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SchemaKind {
    type Err = Error;

    /// Case-insensitive: accepts `object` as well as Gemini's `OBJECT`.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "object" => Ok(SchemaKind::Object),
            "string" => Ok(SchemaKind::String),
            "integer" => Ok(SchemaKind::Integer),
            "number" => Ok(SchemaKind::Number),
            "boolean" => Ok(SchemaKind::Boolean),
            "array" => Ok(SchemaKind::Array),
            _ => Err(Error::parse_with_context(
                format!("unsupported schema type '{}'", s),
                ErrorContext::new().with_source("schema"),
            )),
        }
    }
}

/// One node of a structured-output schema tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    backend: BackendId,
    name: String,
    kind: SchemaKind,
    required: bool,
    description: Option<String>,
    properties: Vec<Schema>,
    required_properties: Vec<String>,
    items: Option<Box<Schema>>,
    extensions: BTreeMap<String, Value>,
}

impl Schema {
    /// Empty node. Drivers use this when decoding raw schemas; applications go
    /// through [`SchemaBuilder`].
    pub fn new(backend: BackendId, kind: SchemaKind, name: impl Into<String>) -> Self {
        Self {
            backend,
            name: name.into(),
            kind,
            required: false,
            description: None,
            properties: Vec::new(),
            required_properties: Vec::new(),
            items: None,
            extensions: BTreeMap::new(),
        }
    }

    pub fn backend(&self) -> BackendId {
        self.backend
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SchemaKind {
        self.kind
    }

    /// Whether this node is required by its parent object.
    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Child nodes of an object, in insertion order.
    pub fn properties(&self) -> &[Schema] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Schema> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Names of required children, in the order they were first marked.
    pub fn required_properties(&self) -> &[String] {
        &self.required_properties
    }

    pub fn items(&self) -> Option<&Schema> {
        self.items.as_deref()
    }

    /// Backend-specific keywords set by backend options.
    pub fn extensions(&self) -> &BTreeMap<String, Value> {
        &self.extensions
    }

    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    pub fn set_required(&mut self, required: bool) {
        self.required = required;
    }

    pub fn set_extension(&mut self, key: impl Into<String>, value: Value) {
        self.extensions.insert(key.into(), value);
    }

    /// Add a child to an object node. A child with the same name is replaced in place.
    pub fn insert_property(&mut self, child: Schema) -> Result<()> {
        if self.kind != SchemaKind::Object {
            return Err(self.reject_child(&child));
        }
        self.check_same_backend(&child)?;

        let name = child.name.clone();
        let required = child.required;
        match self.properties.iter_mut().find(|p| p.name == name) {
            Some(slot) => *slot = child,
            None => self.properties.push(child),
        }

        let listed = self.required_properties.iter().position(|n| *n == name);
        match (required, listed) {
            (true, None) => self.required_properties.push(name),
            (false, Some(idx)) => {
                self.required_properties.remove(idx);
            }
            _ => {}
        }
        Ok(())
    }

    /// Set the element schema of an array node. Only one element schema is allowed.
    pub fn set_items(&mut self, items: Schema) -> Result<()> {
        if self.kind != SchemaKind::Array {
            return Err(self.reject_child(&items));
        }
        self.check_same_backend(&items)?;
        if let Some(existing) = &self.items {
            return Err(Error::configuration_with_context(
                format!(
                    "array schema '{}' already has element schema '{}'",
                    self.name, existing.name
                ),
                ErrorContext::new()
                    .with_field_path(items.name.clone())
                    .with_source("schema_builder"),
            ));
        }
        self.items = Some(Box::new(items));
        Ok(())
    }

    fn reject_child(&self, child: &Schema) -> Error {
        Error::configuration_with_context(
            format!(
                "{} schema '{}' does not accept child schema '{}'",
                self.kind, self.name, child.name
            ),
            ErrorContext::new()
                .with_field_path(child.name.clone())
                .with_source("schema_builder"),
        )
    }

    fn check_same_backend(&self, child: &Schema) -> Result<()> {
        if child.backend != self.backend {
            return Err(Error::configuration_with_context(
                format!(
                    "child schema '{}' was built for backend '{}', parent '{}' for '{}'",
                    child.name, child.backend, self.name, self.backend
                ),
                ErrorContext::new().with_source("schema_builder"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TEST: BackendId = BackendId::new("test");

    #[test]
    fn test_kind_parse_is_case_insensitive() {
        assert_eq!("OBJECT".parse::<SchemaKind>().unwrap(), SchemaKind::Object);
        assert_eq!("integer".parse::<SchemaKind>().unwrap(), SchemaKind::Integer);
        assert!("null".parse::<SchemaKind>().unwrap_err().is_parse());
    }

    #[test]
    fn test_kind_from_type_list() {
        let (kind, nullable) = SchemaKind::from_type_value(&json!(["string", "null"])).unwrap();
        assert_eq!(kind, SchemaKind::String);
        assert!(nullable);

        assert!(SchemaKind::from_type_value(&json!(["string", "integer"])).is_err());
        assert!(SchemaKind::from_type_value(&json!(["null"])).is_err());
        assert!(SchemaKind::from_type_value(&json!(3)).is_err());
    }

    #[test]
    fn test_insert_property_replaces_and_tracks_required() {
        let mut obj = Schema::new(TEST, SchemaKind::Object, "o");
        let mut a = Schema::new(TEST, SchemaKind::String, "a");
        a.set_required(true);
        obj.insert_property(a).unwrap();
        obj.insert_property(Schema::new(TEST, SchemaKind::Integer, "b")).unwrap();
        assert_eq!(obj.required_properties(), ["a"]);

        // Same name, no longer required: replaced in place and dropped from the set.
        obj.insert_property(Schema::new(TEST, SchemaKind::Number, "a")).unwrap();
        let names: Vec<_> = obj.properties().iter().map(Schema::name).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(obj.property("a").unwrap().kind(), SchemaKind::Number);
        assert!(obj.required_properties().is_empty());
    }

    #[test]
    fn test_primitive_rejects_children() {
        let mut s = Schema::new(TEST, SchemaKind::String, "s");
        let err = s
            .insert_property(Schema::new(TEST, SchemaKind::String, "child"))
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_children_must_share_backend() {
        let mut obj = Schema::new(TEST, SchemaKind::Object, "o");
        let foreign = Schema::new(BackendId::new("other"), SchemaKind::String, "s");
        assert!(obj.insert_property(foreign).unwrap_err().is_configuration());
    }

    #[test]
    fn test_array_accepts_single_items() {
        let mut arr = Schema::new(TEST, SchemaKind::Array, "tags");
        arr.set_items(Schema::new(TEST, SchemaKind::String, "tag")).unwrap();
        assert!(arr
            .set_items(Schema::new(TEST, SchemaKind::String, "again"))
            .unwrap_err()
            .is_configuration());
        assert_eq!(arr.items().unwrap().name(), "tag");
    }
}
