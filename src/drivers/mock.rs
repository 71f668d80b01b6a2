//! Scriptable in-process driver for tests and offline demos.
//!
//! Replies are served from a FIFO queue; when it runs dry the prompt is echoed
//! back. Clones share state, so a test can keep a handle on the driver it gave
//! to a [`crate::Model`] and inspect what was sent.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{BackendDriver, Credentials, GenerateRequest, RawResult};
use crate::schema::{from_json_schema, to_json_schema, BackendId, Schema};
use crate::structured::StructuredOutputConfig;
use crate::{Error, ErrorContext, Result};

pub const MOCK_BACKEND: BackendId = BackendId::new("mock");

/// One `generate` call as the driver received it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub model: String,
    pub prompt: String,
    pub structured_output: Option<StructuredOutputConfig>,
    /// Sequence number of the connection the call went through, starting at 1.
    pub connection: usize,
}

#[derive(Debug, Default)]
struct MockState {
    replies: VecDeque<Result<String>>,
    connect_failures: usize,
    connect_delay: Option<Duration>,
    generate_delay: Option<Duration>,
    connection_attempts: usize,
    connected_keys: Vec<Option<String>>,
    calls: Vec<RecordedCall>,
}

#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

/// Handle returned by [`MockDriver`]; identifies which connection served a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockConnection {
    pub id: usize,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a successful reply.
    pub fn push_reply(&self, text: impl Into<String>) {
        self.lock().replies.push_back(Ok(text.into()));
    }

    /// Queue a failed generation.
    pub fn push_error(&self, err: Error) {
        self.lock().replies.push_back(Err(err));
    }

    /// Fail the next `n` connection attempts.
    pub fn fail_connections(&self, n: usize) {
        self.lock().connect_failures = n;
    }

    pub fn connect_delay(&self, delay: Duration) {
        self.lock().connect_delay = Some(delay);
    }

    pub fn generate_delay(&self, delay: Duration) {
        self.lock().generate_delay = Some(delay);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn connection_attempts(&self) -> usize {
        self.lock().connection_attempts
    }

    /// API keys of the connections created so far, in creation order.
    pub fn connected_keys(&self) -> Vec<Option<String>> {
        self.lock().connected_keys.clone()
    }
}

#[async_trait]
impl BackendDriver for MockDriver {
    type Connection = MockConnection;

    fn id(&self) -> BackendId {
        MOCK_BACKEND
    }

    async fn create_connection(
        &self,
        credentials: &Credentials,
        cancel: CancellationToken,
    ) -> Result<MockConnection> {
        let delay = {
            let mut state = self.lock();
            state.connection_attempts += 1;
            state.connect_delay
        };

        if let Some(delay) = delay {
            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::connection_cancelled()),
                _ = tokio::time::sleep(delay) => {}
            }
        }
        if cancel.is_cancelled() {
            return Err(Error::connection_cancelled());
        }

        let mut state = self.lock();
        if state.connect_failures > 0 {
            state.connect_failures -= 1;
            return Err(Error::connection_with_context(
                "scripted connection failure",
                ErrorContext::new().with_source("mock"),
            ));
        }
        state.connected_keys.push(credentials.key().map(str::to_string));
        let id = state.connected_keys.len();
        debug!(id, "created mock connection");
        Ok(MockConnection { id })
    }

    async fn generate(
        &self,
        connection: &MockConnection,
        request: GenerateRequest<'_>,
    ) -> Result<RawResult> {
        let delay = {
            let mut state = self.lock();
            state.calls.push(RecordedCall {
                model: request.model.to_string(),
                prompt: request.prompt.to_string(),
                structured_output: request.structured_output.cloned(),
                connection: connection.id,
            });
            state.generate_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self.lock().replies.pop_front();
        let text = match reply {
            Some(reply) => reply?,
            None => request.prompt.to_string(),
        };

        Ok(RawResult {
            body: json!({ "text": text }),
            finish_reason: Some("stop".to_string()),
            usage: None,
        })
    }

    fn extract_text(&self, raw: &RawResult) -> String {
        raw.body
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    fn parse_raw_schema(&self, raw: &[u8]) -> Result<Schema> {
        let value: Value = serde_json::from_slice(raw).map_err(|e| {
            Error::parse_with_context(
                format!("invalid JSON schema: {}", e),
                ErrorContext::new().with_field_path("$").with_source("mock"),
            )
        })?;
        from_json_schema(&value, MOCK_BACKEND)
    }

    fn encode_schema(&self, schema: &Schema) -> Result<Vec<u8>> {
        serde_json::to_vec(&to_json_schema(schema)).map_err(|e| {
            Error::parse_with_context(
                format!("failed to serialize JSON schema: {}", e),
                ErrorContext::new().with_source("mock"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> GenerateRequest<'_> {
        GenerateRequest {
            model: "mock-1",
            prompt,
            structured_output: None,
        }
    }

    #[tokio::test]
    async fn test_scripted_replies_then_echo() {
        let driver = MockDriver::new();
        driver.push_reply("first");
        driver.push_error(Error::generation_with_context(
            "boom",
            ErrorContext::new().with_source("mock"),
        ));

        let conn = driver
            .create_connection(&Credentials::none(), CancellationToken::new())
            .await
            .unwrap();
        let raw = driver.generate(&conn, request("a")).await.unwrap();
        assert_eq!(driver.extract_text(&raw), "first");
        assert!(driver.generate(&conn, request("b")).await.unwrap_err().is_generation());
        let raw = driver.generate(&conn, request("echo me")).await.unwrap();
        assert_eq!(driver.extract_text(&raw), "echo me");

        let prompts: Vec<_> = driver.calls().into_iter().map(|c| c.prompt).collect();
        assert_eq!(prompts, ["a", "b", "echo me"]);
    }

    #[tokio::test]
    async fn test_connection_failures_are_counted() {
        let driver = MockDriver::new();
        driver.fail_connections(2);
        let creds = Credentials::api_key("k");

        for _ in 0..2 {
            let err = driver
                .create_connection(&creds, CancellationToken::new())
                .await
                .unwrap_err();
            assert!(err.is_connection());
        }
        let conn = driver
            .create_connection(&creds, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(conn.id, 1);
        assert_eq!(driver.connection_attempts(), 3);
        assert_eq!(driver.connected_keys(), [Some("k".to_string())]);
    }

    #[test]
    fn test_schema_codec_round_trip() {
        let driver = MockDriver::new();
        let raw = br#"{"type": "object", "title": "point", "properties": {"x": {"type": "number"}}, "required": ["x"]}"#;
        let schema = driver.parse_raw_schema(raw).unwrap();
        assert_eq!(schema.backend(), MOCK_BACKEND);
        let again = driver
            .parse_raw_schema(&driver.encode_schema(&schema).unwrap())
            .unwrap();
        assert_eq!(again, schema);
    }
}
