//! # fluent-llm
//!
//! Provider-agnostic fluent façade for prompting LLMs, with schema-constrained
//! structured output.
//!
//! ## Overview
//!
//! A [`Model`] binds a model name to a backend driver. Application code builds
//! output schemas through the model's [`schema::SchemaBuilder`], attaches one to a
//! prompt, executes it, and decodes the response text into its own types. The
//! backend connection is created on first use and cached; failures are never
//! cached, so a later call simply retries.
//!
//! ## Key Features
//!
//! - **Memo cells**: [`lazy::MemoCell`] and [`lazy::MemoCellFallible`] compute once and cache
//! - **Schemas**: backend-tagged [`schema::Schema`] trees built from chained [`schema::BuildArg`]s,
//!   or reflected from Rust types through `schemars`
//! - **Drivers**: [`drivers::GeminiDriver`] over HTTP, [`drivers::MockDriver`] for tests
//! - **Cancellation**: every suspension point honours a caller-owned [`CancellationToken`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fluent_llm::drivers::GeminiDriver;
//! use fluent_llm::{CancellationToken, Model};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Capital {
//!     city: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> fluent_llm::Result<()> {
//!     let model = Model::builder(GeminiDriver::from_env()?, "gemini-2.0-flash")
//!         .credentials(GeminiDriver::credentials_from_env())
//!         .build()?;
//!
//!     let b = model.new_schema();
//!     let schema = b.object("capital", vec![b.string("city", vec![b.required()]).into()]);
//!
//!     let response = model
//!         .prompt("What is the capital of France?")
//!         .with_schema(schema)
//!         .execute(&CancellationToken::new())
//!         .await?;
//!
//!     let capital: Capital = response.decode()?;
//!     println!("{}", capital.city);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Model, prompt builder and response |
//! | [`drivers`] | Backend driver trait, Gemini and mock drivers |
//! | [`schema`] | Schema node model, builder and build arguments |
//! | [`structured`] | Structured-output configuration and response decoding |
//! | [`lazy`] | Memoized value cells |
//! | [`transport`] | HTTP client used by network drivers |

pub mod client;
pub mod drivers;
pub mod lazy;
pub mod prelude;
pub mod schema;
pub mod structured;
pub mod transport;

// Re-export main types for convenience
pub use client::{LlmResponse, Model, ModelBuilder, PromptBuilder, Response};
pub use structured::decode_as;
pub use tokio_util::sync::CancellationToken;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
