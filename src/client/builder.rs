use std::sync::Arc;

use tracing::debug;

use super::core::Model;
use crate::drivers::{BackendDriver, Credentials};
use crate::{Error, ErrorContext, Result};

/// Builder for [`Model`].
pub struct ModelBuilder<D: BackendDriver> {
    driver: D,
    name: String,
    credentials: Credentials,
}

impl<D: BackendDriver> ModelBuilder<D> {
    pub fn new(driver: D, name: impl Into<String>) -> Self {
        Self {
            driver,
            name: name.into(),
            credentials: Credentials::none(),
        }
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Shorthand for `credentials(Credentials::api_key(key))`.
    pub fn api_key(self, key: impl Into<String>) -> Self {
        self.credentials(Credentials::api_key(key))
    }

    pub fn build(self) -> Result<Model<D>> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::configuration_with_context(
                "model name must not be empty",
                ErrorContext::new().with_source("model_builder"),
            ));
        }
        debug!(model = %name, backend = %self.driver.id(), "model configured");
        Ok(Model::from_parts(name, Arc::new(self.driver), self.credentials))
    }
}
