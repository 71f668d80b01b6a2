use super::build::{self, BuildArg};
use super::{json_schema, BackendId, Schema, SchemaKind};
use crate::drivers::BackendDriver;
use crate::{Error, ErrorContext, Result};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Fluent constructor for [`Schema`] trees owned by one backend.
///
/// The infallible constructors panic with a configuration error on misuse (a
/// child schema passed to a primitive, a second array element schema, a child
/// from another backend). Use the `try_*` twins to get the error back instead.
pub struct SchemaBuilder<D> {
    driver: Arc<D>,
}

impl<D> Clone for SchemaBuilder<D> {
    fn clone(&self) -> Self {
        Self {
            driver: self.driver.clone(),
        }
    }
}

impl<D: BackendDriver> fmt::Debug for SchemaBuilder<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaBuilder")
            .field("backend", &self.driver.id())
            .finish()
    }
}

#[track_caller]
fn built(result: Result<Schema>) -> Schema {
    match result {
        Ok(schema) => schema,
        Err(e) => panic!("{}", e),
    }
}

impl<D: BackendDriver> SchemaBuilder<D> {
    pub(crate) fn new(driver: Arc<D>) -> Self {
        Self { driver }
    }

    pub fn backend(&self) -> BackendId {
        self.driver.id()
    }

    /// Decode a schema in the backend's native serialized form.
    pub fn from_raw_schema(&self, raw: &[u8]) -> Result<Schema> {
        let schema = self.driver.parse_raw_schema(raw)?;
        debug!(
            backend = %self.backend(),
            name = schema.name(),
            kind = %schema.kind(),
            "parsed raw schema"
        );
        Ok(schema)
    }

    /// Reflect a Rust type into a schema via its `JsonSchema` implementation.
    pub fn from_type<T: schemars::JsonSchema>(&self) -> Result<Schema> {
        let raw = json_schema::reflect_json_schema::<T>()?;
        self.from_raw_schema(&raw)
    }

    /// Serialize a schema into the backend's native form.
    pub fn to_raw_schema(&self, schema: &Schema) -> Result<Vec<u8>> {
        if schema.backend() != self.backend() {
            return Err(Error::configuration_with_context(
                format!(
                    "schema '{}' belongs to backend '{}', not '{}'",
                    schema.name(),
                    schema.backend(),
                    self.backend()
                ),
                ErrorContext::new().with_source("schema_builder"),
            ));
        }
        self.driver.encode_schema(schema)
    }

    pub fn try_object(&self, name: impl Into<String>, args: Vec<BuildArg>) -> Result<Schema> {
        Schema::build(self.backend(), SchemaKind::Object, name, args)
    }

    pub fn try_string(&self, name: impl Into<String>, args: Vec<BuildArg>) -> Result<Schema> {
        Schema::build(self.backend(), SchemaKind::String, name, args)
    }

    pub fn try_integer(&self, name: impl Into<String>, args: Vec<BuildArg>) -> Result<Schema> {
        Schema::build(self.backend(), SchemaKind::Integer, name, args)
    }

    pub fn try_number(&self, name: impl Into<String>, args: Vec<BuildArg>) -> Result<Schema> {
        Schema::build(self.backend(), SchemaKind::Number, name, args)
    }

    pub fn try_boolean(&self, name: impl Into<String>, args: Vec<BuildArg>) -> Result<Schema> {
        Schema::build(self.backend(), SchemaKind::Boolean, name, args)
    }

    pub fn try_array(&self, name: impl Into<String>, args: Vec<BuildArg>) -> Result<Schema> {
        Schema::build(self.backend(), SchemaKind::Array, name, args)
    }

    /// Object node. Child schemas become properties; required children are
    /// also listed in the object's required set.
    #[track_caller]
    pub fn object(&self, name: impl Into<String>, args: Vec<BuildArg>) -> Schema {
        built(self.try_object(name, args))
    }

    #[track_caller]
    pub fn string(&self, name: impl Into<String>, args: Vec<BuildArg>) -> Schema {
        built(self.try_string(name, args))
    }

    #[track_caller]
    pub fn integer(&self, name: impl Into<String>, args: Vec<BuildArg>) -> Schema {
        built(self.try_integer(name, args))
    }

    #[track_caller]
    pub fn number(&self, name: impl Into<String>, args: Vec<BuildArg>) -> Schema {
        built(self.try_number(name, args))
    }

    #[track_caller]
    pub fn boolean(&self, name: impl Into<String>, args: Vec<BuildArg>) -> Schema {
        built(self.try_boolean(name, args))
    }

    /// Array node. Exactly one child schema may be given; it describes the elements.
    #[track_caller]
    pub fn array(&self, name: impl Into<String>, args: Vec<BuildArg>) -> Schema {
        built(self.try_array(name, args))
    }

    pub fn description(&self, text: impl Into<String>) -> BuildArg {
        build::description(text)
    }

    pub fn required(&self) -> BuildArg {
        build::required()
    }
}
