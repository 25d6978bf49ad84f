//! Shared HTTP transport for upstream traffic
//!
//! A single lazily-built `reqwest::Client` serves every upstream request so
//! connection pooling and the proxy configuration apply uniformly. The proxy
//! comes from the environment (`PROXY_SERVER`, `PROXY_USERNAME`,
//! `PROXY_PASSWORD`), which keeps credentials out of the config file.

use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;
use tokio::sync::OnceCell;
use url::Url;

/// User agent presented on every upstream request
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36";

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Proxy settings read from the environment
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProxySettings {
    /// Proxy URL, normalized to carry a scheme
    pub server: Option<String>,

    /// Username for proxy basic auth
    pub username: Option<String>,

    /// Password for proxy basic auth
    pub password: Option<String>,
}

impl ProxySettings {
    /// Read `PROXY_SERVER`, `PROXY_USERNAME` and `PROXY_PASSWORD`
    ///
    /// A server value without a scheme gets `http://` prepended. A value that
    /// still does not parse as a URL is a configuration error.
    pub fn from_env() -> Result<Self> {
        let server = match std::env::var("PROXY_SERVER") {
            Ok(v) if !v.is_empty() => Some(normalize_proxy_url(&v)?),
            _ => None,
        };
        Ok(Self {
            server,
            username: std::env::var("PROXY_USERNAME").ok().filter(|v| !v.is_empty()),
            password: std::env::var("PROXY_PASSWORD").ok().filter(|v| !v.is_empty()),
        })
    }
}

/// Normalize a proxy server value into a URL with a scheme
///
/// `host:port` forms are checked before parsing; parsing first would read
/// the host as a URL scheme.
fn normalize_proxy_url(raw: &str) -> Result<String> {
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };
    Url::parse(&candidate).map_err(|e| {
        Error::config(format!("invalid proxy server {raw:?}: {e}"), "PROXY_SERVER")
    })?;
    Ok(candidate)
}

/// Lazily-initialized HTTP client shared across the run
pub struct Transport {
    proxy: ProxySettings,
    client: OnceCell<reqwest::Client>,
}

impl Transport {
    /// Create a transport; the underlying client is built on first use
    pub fn new(proxy: ProxySettings) -> Self {
        Self {
            proxy,
            client: OnceCell::new(),
        }
    }

    /// Get the shared client, building it on the first call
    pub async fn handle(&self) -> Result<&reqwest::Client> {
        self.client
            .get_or_try_init(|| async { self.build_client() })
            .await
    }

    fn build_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT);

        if let Some(server) = &self.proxy.server {
            let mut proxy = reqwest::Proxy::all(server)?;
            if let (Some(user), Some(pass)) = (&self.proxy.username, &self.proxy.password) {
                proxy = proxy.basic_auth(user, pass);
            }
            builder = builder.proxy(proxy);
            tracing::debug!(proxy = %server, "Routing upstream traffic through proxy");
        }

        Ok(builder.build()?)
    }

    /// Drop the underlying client, closing pooled connections
    ///
    /// Safe to call when the client was never built, and safe to call twice.
    pub fn close(&mut self) {
        if self.client.take().is_some() {
            tracing::debug!("Closed HTTP transport");
        }
    }
}

/// Build a [`HeaderMap`] from name/value pairs
///
/// A repeated name keeps the last value. Invalid names or values surface as
/// errors rather than being dropped silently.
pub fn header_map(pairs: &[(&str, String)]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::Other(format!("invalid header name {name:?}: {e}")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| Error::Other(format!("invalid value for header {name:?}: {e}")))?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}
