use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::core::Model;
use super::response::Response;
use crate::drivers::{BackendDriver, GenerateRequest};
use crate::schema::Schema;
use crate::structured::StructuredOutputConfig;
use crate::{Error, ErrorContext, Result};

/// A prompt being prepared against a [`Model`].
pub struct PromptBuilder<'a, D: BackendDriver> {
    model: &'a Model<D>,
    text: String,
    schema: Option<Schema>,
}

impl<'a, D: BackendDriver> PromptBuilder<'a, D> {
    pub(crate) fn new(model: &'a Model<D>, text: String) -> Self {
        Self {
            model,
            text,
            schema: None,
        }
    }

    /// Constrain the response to `schema`. The last call wins.
    ///
    /// # Panics
    ///
    /// When `schema` was built for another backend than the model's.
    #[track_caller]
    pub fn with_schema(self, schema: Schema) -> Self {
        match self.try_with_schema(schema) {
            Ok(builder) => builder,
            Err(e) => panic!("{}", e),
        }
    }

    pub fn try_with_schema(mut self, schema: Schema) -> Result<Self> {
        let backend = self.model.backend();
        if schema.backend() != backend {
            return Err(Error::configuration_with_context(
                format!(
                    "schema '{}' was built for backend '{}' but model {} uses '{}'",
                    schema.name(),
                    schema.backend(),
                    self.model,
                    backend
                ),
                ErrorContext::new().with_source("prompt_builder"),
            ));
        }
        self.schema = Some(schema);
        Ok(self)
    }

    pub fn prompt_text(&self) -> &str {
        &self.text
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    /// Connect if needed, then run one generation call.
    ///
    /// `cancel` aborts either step; the connection is only cached once it succeeds.
    pub async fn execute(self, cancel: &CancellationToken) -> Result<Response> {
        let model = self.model;
        let connection = model.connection(cancel).await?;

        let structured_output = self.schema.map(StructuredOutputConfig::from_schema);
        let request = GenerateRequest {
            model: model.name(),
            prompt: &self.text,
            structured_output: structured_output.as_ref(),
        };

        let raw = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(model = model.name(), "generation cancelled");
                return Err(Error::generation_cancelled());
            }
            result = model.driver().generate(connection, request) => result?,
        };

        Ok(Response::new(model.shared_driver().clone(), model.name(), raw))
    }
}
