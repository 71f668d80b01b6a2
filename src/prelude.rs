//! Minimal prelude for application code.
//!
//! Goal: reduce import noise without hiding important concepts.

pub use crate::client::{LlmResponse, Model, ModelBuilder, PromptBuilder, Response};
pub use crate::drivers::{BackendDriver, Credentials, GeminiDriver, MockDriver};
pub use crate::schema::{BuildArg, Schema, SchemaBuilder, SchemaKind, SchemaOption};
pub use crate::structured::decode_as;
pub use crate::{Error, Result};
pub use tokio_util::sync::CancellationToken;
