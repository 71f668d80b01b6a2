//! Google Gemini `generateContent` driver.
//!
//! - The API key travels in the `x-goog-api-key` header, one UUID per request in `x-request-id`.
//! - Structured output goes into `generationConfig.responseMimeType` / `responseSchema`.
//! - Response text is the concatenation of `candidates[0].content.parts[*].text`,
//!   skipping thought parts.

pub mod options;
pub mod schema;

use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use super::{BackendDriver, Credentials, GenerateRequest, RawResult, UsageInfo};
use crate::client::Model;
use crate::schema::{BackendId, Schema};
use crate::transport::{HttpConfig, HttpReply, HttpTransport};
use crate::{Error, ErrorContext, Result};

pub const GEMINI_BACKEND: BackendId = BackendId::new("gemini");

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variables searched for an API key, in order.
pub const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// A model served by Gemini.
pub type GeminiModel = Model<GeminiDriver>;

#[derive(Debug, Clone)]
pub struct GeminiDriver {
    base_url: String,
    http: HttpConfig,
}

impl GeminiDriver {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            http: HttpConfig::default(),
        }
    }

    /// Driver configured from `GEMINI_BASE_URL` and the `FLUENT_LLM_HTTP_*` variables.
    pub fn from_env() -> Result<Self> {
        let driver = Self::new().with_http_config(HttpConfig::from_env());
        match std::env::var("GEMINI_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => driver.with_base_url(url.trim()),
            _ => Ok(driver),
        }
    }

    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Result<Self> {
        let base_url = base_url.as_ref();
        Url::parse(base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid Gemini base URL: {}", e),
                ErrorContext::new()
                    .with_details(base_url.to_string())
                    .with_source("gemini"),
            )
        })?;
        self.base_url = base_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    pub fn with_http_config(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials_from_env() -> Credentials {
        Credentials::from_env(API_KEY_ENV_VARS)
    }

    fn endpoint(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

impl Default for GeminiDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP client plus the key it authenticates with.
pub struct GeminiConnection {
    transport: HttpTransport,
    api_key: String,
}

impl fmt::Debug for GeminiConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConnection")
            .field("transport", &self.transport)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// `generateContent` body for a single user turn.
pub(crate) fn build_request_body(request: &GenerateRequest<'_>) -> Value {
    let mut body = json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": request.prompt }],
        }],
    });

    if let Some(config) = request.structured_output {
        body["generationConfig"] = json!({
            "responseMimeType": config.mime_type,
            "responseSchema": schema::encode(&config.schema),
        });
    }
    body
}

/// Finish reason and usage from a `generateContent` reply.
pub(crate) fn parse_response(body: Value) -> RawResult {
    let finish_reason = body
        .pointer("/candidates/0/finishReason")
        .and_then(Value::as_str)
        .map(|r| match r {
            "STOP" => "stop".to_string(),
            "MAX_TOKENS" => "length".to_string(),
            "SAFETY" | "RECITATION" => "content_filter".to_string(),
            other => other.to_lowercase(),
        });

    let usage = body.get("usageMetadata").map(|u| UsageInfo {
        prompt_tokens: u["promptTokenCount"].as_u64().unwrap_or(0),
        completion_tokens: u["candidatesTokenCount"].as_u64().unwrap_or(0),
        total_tokens: u["totalTokenCount"].as_u64().unwrap_or(0),
    });

    RawResult {
        body,
        finish_reason,
        usage,
    }
}

fn remote_error(reply: &HttpReply) -> Error {
    let message = reply
        .body
        .pointer("/error/message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| Some(reply.text.trim().to_string()).filter(|t| !t.is_empty()))
        .unwrap_or_else(|| format!("HTTP {}", reply.status));

    Error::Remote {
        status: reply.status,
        message,
        retryable: reply.status == 429 || reply.status >= 500,
    }
}

#[async_trait]
impl BackendDriver for GeminiDriver {
    type Connection = GeminiConnection;

    fn id(&self) -> BackendId {
        GEMINI_BACKEND
    }

    async fn create_connection(
        &self,
        credentials: &Credentials,
        cancel: CancellationToken,
    ) -> Result<GeminiConnection> {
        if cancel.is_cancelled() {
            return Err(Error::connection_cancelled());
        }
        let api_key = credentials
            .key()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::missing_credentials(
                    "Gemini API key is missing",
                    "set GEMINI_API_KEY or pass credentials to the model builder",
                )
            })?;

        let transport = HttpTransport::new(&self.http)?;
        debug!(base_url = %self.base_url, "created Gemini connection");
        Ok(GeminiConnection {
            transport,
            api_key: api_key.to_string(),
        })
    }

    async fn generate(
        &self,
        connection: &GeminiConnection,
        request: GenerateRequest<'_>,
    ) -> Result<RawResult> {
        let url = self.endpoint(request.model);
        let body = build_request_body(&request);
        let request_id = Uuid::new_v4().to_string();
        info!(
            model = request.model,
            request_id = %request_id,
            structured = request.structured_output.is_some(),
            "Gemini generateContent"
        );

        let headers = [
            ("x-goog-api-key", connection.api_key.as_str()),
            ("x-request-id", request_id.as_str()),
        ];
        let reply = connection.transport.post_json(&url, &headers, &body).await?;

        if !reply.is_success() {
            let err = remote_error(&reply);
            warn!(status = reply.status, request_id = %request_id, error = %err, "Gemini request failed");
            return Err(err);
        }
        Ok(parse_response(reply.body))
    }

    fn extract_text(&self, raw: &RawResult) -> String {
        let parts = raw
            .body
            .pointer("/candidates/0/content/parts")
            .and_then(Value::as_array);
        let Some(parts) = parts else {
            debug!("Gemini reply has no candidate parts");
            return String::new();
        };

        parts
            .iter()
            .filter(|p| !p.get("thought").and_then(Value::as_bool).unwrap_or(false))
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect()
    }

    fn parse_raw_schema(&self, raw: &[u8]) -> Result<Schema> {
        schema::parse(raw)
    }

    fn encode_schema(&self, schema: &Schema) -> Result<Vec<u8>> {
        schema::encode_bytes(schema)
    }
}
