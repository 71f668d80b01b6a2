use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::drivers::{BackendDriver, RawResult, UsageInfo};
use crate::lazy::MemoCell;
use crate::structured::decode_as;
use crate::Result;

/// Anything that carries generated text.
pub trait LlmResponse {
    fn text(&self) -> &str;
}

/// Result of a generation call. Text extraction runs on first access only.
pub struct Response {
    model: String,
    raw: Arc<RawResult>,
    text: MemoCell<String>,
}

impl Response {
    pub(crate) fn new<D: BackendDriver>(driver: Arc<D>, model: &str, raw: RawResult) -> Self {
        let raw = Arc::new(raw);
        let source = raw.clone();
        Self {
            model: model.to_string(),
            raw,
            text: MemoCell::boxed(move || driver.extract_text(&source)),
        }
    }

    pub fn text(&self) -> &str {
        self.text.get()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn raw(&self) -> &RawResult {
        &self.raw
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.raw.finish_reason.as_deref()
    }

    pub fn usage(&self) -> Option<&UsageInfo> {
        self.raw.usage.as_ref()
    }

    /// Deserialize the text as JSON into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        decode_as(self)
    }
}

impl LlmResponse for Response {
    fn text(&self) -> &str {
        Response::text(self)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Response{{model=({}), text='{}'}}", self.model, self.text())
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("model", &self.model)
            .field("finish_reason", &self.raw.finish_reason)
            .field("text", &self.text)
            .finish()
    }
}
