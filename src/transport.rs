use crate::error::FeedError;
use crate::feeds::types::ClientConfig;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use tracing::debug;

pub const HEADER_LAST_MODIFIED: &str = "Last-Modified";

/// Response of a full GET: headers plus the raw body.
#[derive(Debug, Clone, Default)]
pub struct Payload {
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// HTTP access used by every feed.
///
/// Anything but `200 OK` is a failure. Nothing is retried; to cancel an
/// in-flight call, drop its future (e.g. through `tokio::time::timeout`).
#[async_trait]
pub trait Transport: Send + Sync {
    /// HEAD request, used as a cheap freshness probe.
    async fn fetch_headers(&self, url: &str) -> Result<HeaderMap, FeedError>;

    /// GET request returning headers and body.
    async fn fetch_body(&self, url: &str) -> Result<Payload, FeedError>;
}

/// `Transport` backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with the default client configuration
    pub fn new() -> Result<Self, FeedError> {
        Self::with_config(&ClientConfig::default())
    }

    /// Create a transport with a custom client configuration
    pub fn with_config(config: &ClientConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(FeedError::Client)?;

        Ok(Self { client })
    }

    async fn send(&self, method: Method, url: &str) -> Result<reqwest::Response, FeedError> {
        debug!("{} {}", method, url);

        let response = self
            .client
            .request(method, url)
            .send()
            .await
            .map_err(|source| FeedError::Request {
                url: url.to_string(),
                source,
            })?;

        if response.status() != StatusCode::OK {
            return Err(FeedError::Status {
                status: response.status(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_headers(&self, url: &str) -> Result<HeaderMap, FeedError> {
        let response = self.send(Method::HEAD, url).await?;
        Ok(response.headers().clone())
    }

    async fn fetch_body(&self, url: &str) -> Result<Payload, FeedError> {
        let response = self.send(Method::GET, url).await?;
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|source| FeedError::Request {
                url: url.to_string(),
                source,
            })?
            .to_vec();

        debug!("Downloaded {} bytes from {}", body.len(), url);

        Ok(Payload { headers, body })
    }
}
