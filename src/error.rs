use thiserror::Error;

/// Marker stored in [`ErrorContext::source`] when an operation was aborted by its cancellation token.
pub const CANCELLATION_SOURCE: &str = "cancellation";

/// Marker stored in [`ErrorContext::source`] when a backend refused to connect without credentials.
pub const MISSING_CREDENTIALS_SOURCE: &str = "missing_credentials";

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or schema location that caused the error (e.g., "properties.address.city")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "schema_builder", "gemini_driver")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for fluent-llm.
///
/// Configuration errors are programmer errors: the fluent APIs panic with their
/// `Display` text, the `try_*` variants hand them back. Every other category is
/// returned to the caller and never retried by the library.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Connection error: {message}{}", format_context(.context))]
    Connection {
        message: String,
        context: ErrorContext,
    },

    #[error("Generation error: {message}{}", format_context(.context))]
    Generation {
        message: String,
        context: ErrorContext,
    },

    #[error("Remote error: HTTP {status}: {message}")]
    Remote {
        status: u16,
        message: String,
        retryable: bool,
    },

    #[error("Schema parse error: {message}{}", format_context(.context))]
    Parse {
        message: String,
        context: ErrorContext,
    },

    #[error("Decode error: response text is not a valid {target}: {source}")]
    Decode {
        target: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::configuration_with_context(msg, ErrorContext::new())
    }

    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn connection_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Connection {
            message: msg.into(),
            context,
        }
    }

    pub fn generation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Generation {
            message: msg.into(),
            context,
        }
    }

    pub fn parse_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Parse {
            message: msg.into(),
            context,
        }
    }

    pub fn decode<T>(source: serde_json::Error) -> Self {
        Error::Decode {
            target: std::any::type_name::<T>(),
            source,
        }
    }

    /// Connection attempt aborted through its cancellation token.
    pub fn connection_cancelled() -> Self {
        Self::connection_with_context(
            "connection attempt cancelled",
            ErrorContext::new().with_source(CANCELLATION_SOURCE),
        )
    }

    /// Connection refused because no usable credentials were supplied.
    pub fn missing_credentials(msg: impl Into<String>, details: impl Into<String>) -> Self {
        Self::connection_with_context(
            msg,
            ErrorContext::new()
                .with_details(details)
                .with_source(MISSING_CREDENTIALS_SOURCE),
        )
    }

    /// Generation call aborted through its cancellation token.
    pub fn generation_cancelled() -> Self {
        Self::generation_with_context(
            "generation cancelled",
            ErrorContext::new().with_source(CANCELLATION_SOURCE),
        )
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. }
            | Error::Connection { context, .. }
            | Error::Generation { context, .. }
            | Error::Parse { context, .. } => Some(context),
            _ => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration { .. })
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection { .. })
    }

    /// Backend call failures, including HTTP errors reported by the provider.
    pub fn is_generation(&self) -> bool {
        matches!(self, Error::Generation { .. } | Error::Remote { .. })
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse { .. })
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Error::Decode { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        self.context()
            .and_then(|c| c.source.as_deref())
            .map_or(false, |s| s == CANCELLATION_SOURCE)
    }

    /// Whether a caller-side retry may succeed. The library itself never retries.
    /// Missing credentials stay missing until the caller supplies new ones.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Remote { retryable, .. } => *retryable,
            Error::Connection { context, .. } => {
                context.source.as_deref() != Some(MISSING_CREDENTIALS_SOURCE)
            }
            Error::Generation { .. } => self.is_cancelled(),
            _ => false,
        }
    }
}
