//! Prompt/response façade.
//!
//! [`Model`] binds a model name to a backend driver. Prompts are prepared with
//! [`Model::prompt`], optionally constrained with a schema, and executed into a
//! [`Response`] whose text is extracted on first access.

pub mod builder;
pub mod core;
pub mod prompt;
pub mod response;

pub use builder::ModelBuilder;
pub use core::Model;
pub use prompt::PromptBuilder;
pub use response::{LlmResponse, Response};
