//! Structured output: the generation-side configuration and response decoding.
//!
//! - `StructuredOutputConfig`: what a driver receives when a prompt carries a schema
//! - `decode_as`: parse a response's text into a caller-declared type
//!
//! # Examples
//!
//! ```
//! use fluent_llm::structured::decode_text;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct Answer {
//!     value: i64,
//! }
//!
//! let answer: Answer = decode_text(r#"{"value": 42}"#).unwrap();
//! assert_eq!(answer.value, 42);
//! assert!(decode_text::<Answer>("forty-two").unwrap_err().is_decode());
//! ```

pub mod decode;
pub mod output;

pub use decode::{decode_as, decode_text};
pub use output::{StructuredOutputConfig, JSON_MIME_TYPE};
