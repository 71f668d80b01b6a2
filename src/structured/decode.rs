//! Decoding response text into caller-declared shapes.

use crate::client::LlmResponse;
use crate::{Error, Result};
use serde::de::DeserializeOwned;

/// Deserialize a response's text as JSON into `T`.
///
/// Fails with [`Error::Decode`] when the text is not a valid `T`.
pub fn decode_as<T: DeserializeOwned>(response: &impl LlmResponse) -> Result<T> {
    decode_text(response.text())
}

pub fn decode_text<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(Error::decode::<T>)
}
