use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{QueryError, QueryResult};

pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = QueryResult<Value>> + Send + 'a>>;

/// HTTP GET capability injected into the control plane.
///
/// Implementations own timeouts and connection handling; callers only see the
/// decoded JSON body or one of the `QueryError` kinds.
pub trait Fetch: Send + Sync + 'static {
    fn get_json<'a>(&'a self, url: &'a str) -> FetchFuture<'a>;
}

/// Settings for the reqwest-backed fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFetcherConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl HttpFetcherConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("pbmc-core/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Builds a client with the configured timeout and user agent.
    ///
    /// # Errors
    /// Returns `reqwest::Error` if the TLS backend cannot be initialized.
    pub fn new(config: &HttpFetcherConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    async fn fetch(&self, url: &str) -> QueryResult<Value> {
        debug!(url, "upstream request");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "upstream returned an error status");
            return Err(QueryError::UpstreamStatus {
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|err| {
            warn!(url, error = %err, "upstream body is not JSON");
            QueryError::Transport(format!("invalid JSON body: {err}"))
        })
    }
}

impl Fetch for HttpFetcher {
    fn get_json<'a>(&'a self, url: &'a str) -> FetchFuture<'a> {
        Box::pin(self.fetch(url))
    }
}
