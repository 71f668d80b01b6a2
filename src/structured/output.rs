//! Structured-output configuration attached to a generation call.

use crate::schema::Schema;

/// MIME type requested from the backend when a schema is attached.
pub const JSON_MIME_TYPE: &str = "application/json";

/// Schema-constrained output settings derived from a prompt's schema.
///
/// Example:
///
/// ```
/// use fluent_llm::drivers::mock::MockDriver;
/// use fluent_llm::structured::{StructuredOutputConfig, JSON_MIME_TYPE};
/// use fluent_llm::Model;
///
/// let model = Model::new(MockDriver::new(), "mock-1").unwrap();
/// let b = model.new_schema();
/// let config = StructuredOutputConfig::from_schema(b.object("answer", vec![]));
///
/// assert_eq!(config.mime_type, JSON_MIME_TYPE);
/// assert_eq!(config.schema_name(), "answer");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredOutputConfig {
    /// Response MIME type requested from the backend.
    pub mime_type: String,

    /// Shape the response must follow.
    pub schema: Schema,
}

impl StructuredOutputConfig {
    pub fn from_schema(schema: Schema) -> Self {
        Self {
            mime_type: JSON_MIME_TYPE.to_string(),
            schema,
        }
    }

    /// Name of the root schema node; `response` when the root is anonymous.
    pub fn schema_name(&self) -> &str {
        match self.schema.name() {
            "" => "response",
            name => name,
        }
    }
}
