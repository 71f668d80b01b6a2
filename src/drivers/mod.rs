//! Backend driver abstraction.
//!
//! A [`BackendDriver`] is the outbound boundary of the façade: it creates the
//! connection handle, performs the generation call, and owns the backend's raw
//! schema encoding. [`crate::Model`] is generic over the driver, so one model
//! instance always talks to exactly one backend.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use tokio_util::sync::CancellationToken;

use crate::schema::{BackendId, Schema};
use crate::structured::StructuredOutputConfig;
use crate::Result;

pub use gemini::GeminiDriver;
pub use mock::MockDriver;

/// API credentials handed to [`BackendDriver::create_connection`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    api_key: Option<String>,
}

impl Credentials {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
        }
    }

    /// First non-empty value among the given environment variables.
    pub fn from_env(vars: &[&str]) -> Self {
        let api_key = vars
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty());
        Self { api_key }
    }

    pub fn key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = self.api_key.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials").field("api_key", &key).finish()
    }
}

/// Parameters of one generation call.
#[derive(Debug, Clone, Copy)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub structured_output: Option<&'a StructuredOutputConfig>,
}

/// Token usage information.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageInfo {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Backend result of a generation call, before text extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResult {
    /// Raw provider response body.
    pub body: Value,
    /// Finish reason normalized to `stop` / `length` / `content_filter` / lowercase provider value.
    pub finish_reason: Option<String>,
    pub usage: Option<UsageInfo>,
}

impl RawResult {
    pub fn new(body: Value) -> Self {
        Self {
            body,
            finish_reason: None,
            usage: None,
        }
    }
}

/// Core trait for backend-specific adaptation.
#[async_trait]
pub trait BackendDriver: Send + Sync + fmt::Debug + 'static {
    /// Handle returned by [`Self::create_connection`], shared read-only afterwards.
    type Connection: Send + Sync + 'static;

    /// Identity stamped on every schema this backend builds.
    fn id(&self) -> BackendId;

    /// Create the connection handle. Must observe `cancel`.
    async fn create_connection(
        &self,
        credentials: &Credentials,
        cancel: CancellationToken,
    ) -> Result<Self::Connection>;

    async fn generate(
        &self,
        connection: &Self::Connection,
        request: GenerateRequest<'_>,
    ) -> Result<RawResult>;

    /// Text payload of a raw result; empty when the backend returned none.
    fn extract_text(&self, raw: &RawResult) -> String;

    /// Decode the backend's native schema encoding.
    fn parse_raw_schema(&self, raw: &[u8]) -> Result<Schema>;

    /// Encode a schema into the backend's native form.
    fn encode_schema(&self, schema: &Schema) -> Result<Vec<u8>>;
}
