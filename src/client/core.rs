use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::builder::ModelBuilder;
use super::prompt::PromptBuilder;
use crate::drivers::{BackendDriver, Credentials};
use crate::lazy::MemoCellFallible;
use crate::schema::{BackendId, SchemaBuilder};
use crate::{Error, Result};

type ConnectionCell<D> = MemoCellFallible<<D as BackendDriver>::Connection, Error>;

/// A named model served by one backend driver.
///
/// The backend connection is created lazily by the first [`PromptBuilder::execute`]
/// and shared by every later call. A failed or cancelled attempt is not cached;
/// the next call tries again.
pub struct Model<D: BackendDriver> {
    name: String,
    driver: Arc<D>,
    credentials: Credentials,
    connection: ConnectionCell<D>,
}

fn connection_cell<D: BackendDriver>(driver: Arc<D>, credentials: Credentials) -> ConnectionCell<D> {
    MemoCellFallible::new(move |cancel: CancellationToken| {
        let driver = driver.clone();
        let credentials = credentials.clone();
        async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!("connection attempt cancelled");
                    Err(Error::connection_cancelled())
                }
                result = driver.create_connection(&credentials, cancel.clone()) => result,
            }
        }
    })
}

impl<D: BackendDriver> Model<D> {
    pub fn builder(driver: D, name: impl Into<String>) -> ModelBuilder<D> {
        ModelBuilder::new(driver, name)
    }

    /// Model with no credentials. Fails when `name` is blank.
    pub fn new(driver: D, name: impl Into<String>) -> Result<Self> {
        Self::builder(driver, name).build()
    }

    pub(crate) fn from_parts(name: String, driver: Arc<D>, credentials: Credentials) -> Self {
        let connection = connection_cell(driver.clone(), credentials.clone());
        Self {
            name,
            driver,
            credentials,
            connection,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub(crate) fn shared_driver(&self) -> &Arc<D> {
        &self.driver
    }

    pub fn backend(&self) -> BackendId {
        self.driver.id()
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Replace the credentials. A different API key drops the cached connection.
    pub fn set_credentials(&mut self, credentials: Credentials) {
        if credentials.key() != self.credentials.key() {
            debug!(model = %self.name, "credentials changed, dropping connection");
            self.connection = connection_cell(self.driver.clone(), credentials.clone());
        }
        self.credentials = credentials;
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_computed()
    }

    /// Drop the cached connection so the next call reconnects. Returns whether one was cached.
    pub fn disconnect(&mut self) -> bool {
        self.connection.reset().is_some()
    }

    pub fn prompt(&self, text: impl Into<String>) -> PromptBuilder<'_, D> {
        PromptBuilder::new(self, text.into())
    }

    /// Schema builder for this model's backend.
    pub fn new_schema(&self) -> SchemaBuilder<D> {
        SchemaBuilder::new(self.driver.clone())
    }

    pub(crate) async fn connection(&self, cancel: &CancellationToken) -> Result<&D::Connection> {
        self.connection.get(cancel).await
    }
}

impl<D: BackendDriver> fmt::Display for Model<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.name)
    }
}

impl<D: BackendDriver> fmt::Debug for Model<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("backend", &self.backend())
            .field("credentials", &self.credentials)
            .field("connected", &self.is_connected())
            .finish()
    }
}
