use crate::{Error, ErrorContext, Result};
use reqwest::Proxy;
use serde_json::Value;
use std::env;
use std::time::Duration;
use tracing::warn;

/// HTTP client settings, env-overridable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
    pub proxy_url: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            pool_max_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            proxy_url: None,
        }
    }
}

impl HttpConfig {
    /// Defaults overridden by `FLUENT_LLM_HTTP_TIMEOUT_SECS` (or `AI_TIMEOUT_SECS`),
    /// `FLUENT_LLM_HTTP_POOL_MAX_IDLE_PER_HOST`, `FLUENT_LLM_HTTP_POOL_IDLE_TIMEOUT_SECS`
    /// and `FLUENT_LLM_PROXY_URL`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let timeout_secs = env::var("FLUENT_LLM_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .or_else(|| env::var("AI_TIMEOUT_SECS").ok().and_then(|s| s.parse::<u64>().ok()));

        Self {
            timeout: timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            pool_max_idle_per_host: env::var("FLUENT_LLM_HTTP_POOL_MAX_IDLE_PER_HOST")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(defaults.pool_max_idle_per_host),
            pool_idle_timeout: env::var("FLUENT_LLM_HTTP_POOL_IDLE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.pool_idle_timeout),
            proxy_url: env::var("FLUENT_LLM_PROXY_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        }
    }
}

/// Status and decoded body of an HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    /// JSON body, `Value::Null` when the body was not JSON.
    pub body: Value,
    pub text: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Some(config.pool_idle_timeout))
            // Conservative HTTP/2 keepalive defaults for long-lived connections.
            .http2_adaptive_window(true)
            .http2_keep_alive_interval(Some(Duration::from_secs(30)))
            .http2_keep_alive_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy_url {
            match Proxy::all(proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => warn!(proxy = %proxy_url, error = %e, "ignoring invalid proxy url"),
            }
        }

        let client = builder.build().map_err(|e| {
            Error::connection_with_context(
                format!("failed to build HTTP client: {}", e),
                ErrorContext::new().with_source("http_transport"),
            )
        })?;

        Ok(Self { client })
    }

    /// POST a JSON body. Non-2xx statuses are returned, not turned into errors.
    pub async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &Value,
    ) -> Result<HttpReply> {
        let mut req = self.client.post(url).json(body);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }

        let response = req.send().await.map_err(|e| transport_error(url, e))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| transport_error(url, e))?;
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);

        Ok(HttpReply { status, body, text })
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> Error {
    let kind = if e.is_timeout() {
        "timed out"
    } else if e.is_connect() {
        "connect failed"
    } else {
        "failed"
    };
    Error::generation_with_context(
        format!("HTTP request {}: {}", kind, e),
        ErrorContext::new()
            .with_details(url.to_string())
            .with_source("http_transport"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_success_range() {
        let reply = |status| HttpReply {
            status,
            body: Value::Null,
            text: String::new(),
        };
        assert!(reply(200).is_success());
        assert!(reply(204).is_success());
        assert!(!reply(429).is_success());
        assert!(!reply(500).is_success());
    }

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.pool_max_idle_per_host, 32);
        assert!(config.proxy_url.is_none());
    }

    // One test owns every FLUENT_LLM_HTTP_* variable so parallel tests cannot interleave.
    #[test]
    fn test_config_from_env() {
        let vars = [
            "FLUENT_LLM_HTTP_TIMEOUT_SECS",
            "AI_TIMEOUT_SECS",
            "FLUENT_LLM_HTTP_POOL_MAX_IDLE_PER_HOST",
            "FLUENT_LLM_HTTP_POOL_IDLE_TIMEOUT_SECS",
            "FLUENT_LLM_PROXY_URL",
        ];
        let clear = || vars.iter().for_each(|v| env::remove_var(v));

        clear();
        assert_eq!(HttpConfig::from_env(), HttpConfig::default());

        env::set_var("FLUENT_LLM_HTTP_TIMEOUT_SECS", "5");
        env::set_var("AI_TIMEOUT_SECS", "9");
        env::set_var("FLUENT_LLM_HTTP_POOL_MAX_IDLE_PER_HOST", "4");
        env::set_var("FLUENT_LLM_HTTP_POOL_IDLE_TIMEOUT_SECS", "12");
        env::set_var("FLUENT_LLM_PROXY_URL", "http://proxy.local:3128");
        let config = HttpConfig::from_env();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.pool_max_idle_per_host, 4);
        assert_eq!(config.pool_idle_timeout, Duration::from_secs(12));
        assert_eq!(config.proxy_url.as_deref(), Some("http://proxy.local:3128"));

        // Falls back to AI_TIMEOUT_SECS.
        env::remove_var("FLUENT_LLM_HTTP_TIMEOUT_SECS");
        assert_eq!(HttpConfig::from_env().timeout, Duration::from_secs(9));

        // Unparseable values keep the defaults; a blank proxy is no proxy.
        env::set_var("FLUENT_LLM_HTTP_TIMEOUT_SECS", "soon");
        env::set_var("AI_TIMEOUT_SECS", "-1");
        env::set_var("FLUENT_LLM_HTTP_POOL_MAX_IDLE_PER_HOST", "many");
        env::set_var("FLUENT_LLM_PROXY_URL", "  ");
        let config = HttpConfig::from_env();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.pool_max_idle_per_host, 32);
        assert!(config.proxy_url.is_none());

        clear();
    }

    #[tokio::test]
    async fn test_transport_builds_with_invalid_proxy() {
        let config = HttpConfig {
            proxy_url: Some("::not a url::".into()),
            ..HttpConfig::default()
        };
        assert!(HttpTransport::new(&config).is_ok());
    }
}
