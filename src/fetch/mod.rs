//! Outbound page fetching
//!
//! One GET per call, no retries. Any HTTP response, whatever its status, is
//! a successful fetch; only transport failures become a [`FetchError`].

use crate::error::{FetchError, FetchErrorKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::redirect::Policy;
use std::error::Error as StdError;
use std::time::Duration;

/// Upper bound on a single fetch, connect through last body byte
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// User-agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("page-analyzer/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Bodies beyond this size are truncated, not rejected
pub const DEFAULT_MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// A response that made it back, whatever its status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub status_code: u16,
    pub body: Vec<u8>,
}

/// Something that can retrieve a page
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` exactly once
    async fn fetch(&self, url: &str) -> std::result::Result<FetchResult, FetchError>;
}

/// Settings for [`HttpFetcher`]
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub max_redirects: usize,
    pub max_body_bytes: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: FETCH_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// `reqwest`-backed fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    /// Create a new fetcher
    pub fn new(config: FetcherConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .redirect(Policy::limited(config.max_redirects))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<FetchResult, FetchError> {
        tracing::debug!(url, "fetching page");

        let mut response = self.client.get(url).send().await.map_err(classify)?;
        let status_code = response.status().as_u16();

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(classify)? {
            let room = self.max_body_bytes.saturating_sub(body.len());
            if chunk.len() > room {
                body.extend_from_slice(&chunk[..room]);
                tracing::warn!(url, limit = self.max_body_bytes, "response body truncated");
                break;
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(url, status = status_code, bytes = body.len(), "page fetched");

        Ok(FetchResult { status_code, body })
    }
}

/// Map a transport error onto the fetch error taxonomy.
///
/// Only the source chain is inspected; the request URL is stripped so a host
/// or path that happens to contain `ssl` or `dns` cannot skew the result.
fn classify(err: reqwest::Error) -> FetchError {
    let err = err.without_url();
    let causes = source_chain(&err).to_lowercase();

    let kind = if err.is_timeout() {
        FetchErrorKind::Timeout
    } else if err.is_redirect() {
        FetchErrorKind::HttpError
    } else if causes.contains("dns error") || causes.contains("failed to lookup address") {
        FetchErrorKind::Dns
    } else if TLS_MARKERS.iter().any(|marker| causes.contains(marker)) {
        FetchErrorKind::Tls
    } else if err.is_connect() {
        FetchErrorKind::Connection
    } else {
        FetchErrorKind::HttpError
    };

    let message = if causes.is_empty() {
        err.to_string()
    } else {
        format!("{}: {}", err, source_chain(&err))
    };

    FetchError::new(kind, message)
}

/// Substrings rustls and native TLS stacks put in handshake failures
const TLS_MARKERS: &[&str] = &["certificate", "tls", "ssl", "handshake", "corrupt message"];

/// Join the sources of an error, excluding the error itself
fn source_chain(err: &reqwest::Error) -> String {
    let mut parts = Vec::new();
    let mut source = err.source();
    while let Some(inner) = source {
        parts.push(inner.to_string());
        source = inner.source();
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(FetcherConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<title>Example</title>"))
            .expect(1)
            .mount(&server)
            .await;

        let result = fetcher().fetch(&server.uri()).await.unwrap();
        assert_eq!(result.status_code, 200);
        assert_eq!(result.body, b"<title>Example</title>");
    }

    #[tokio::test]
    async fn test_error_status_is_still_a_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .expect(1)
            .mount(&server)
            .await;

        let result = fetcher().fetch(&server.uri()).await.unwrap();
        assert_eq!(result.status_code, 503);
    }

    #[tokio::test]
    async fn test_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", DEFAULT_USER_AGENT))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let result = fetcher().fetch(&server.uri()).await.unwrap();
        assert_eq!(result.status_code, 200);
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(FetcherConfig {
            timeout: Duration::from_millis(200),
            ..Default::default()
        })
        .unwrap();

        let err = fetcher.fetch(&server.uri()).await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_redirect_loop_is_bounded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/loop"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("Location", format!("{}/loop", server.uri())),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(FetcherConfig {
            max_redirects: 3,
            ..Default::default()
        })
        .unwrap();

        let err = fetcher
            .fetch(&format!("{}/loop", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::HttpError);
    }

    #[tokio::test]
    async fn test_body_truncated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(1000)))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(FetcherConfig {
            max_body_bytes: 100,
            ..Default::default()
        })
        .unwrap();

        let result = fetcher.fetch(&server.uri()).await.unwrap();
        assert_eq!(result.body.len(), 100);
    }

    /// A local port with nothing listening on it
    fn closed_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let port = closed_port();

        let err = fetcher()
            .fetch(&format!("http://127.0.0.1:{port}"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Connection);
    }

    #[tokio::test]
    async fn test_url_text_does_not_affect_classification() {
        let port = closed_port();

        for path in ["ssl", "tls/certificate", "dns-error"] {
            let err = fetcher()
                .fetch(&format!("http://127.0.0.1:{port}/{path}"))
                .await
                .unwrap_err();
            assert_eq!(err.kind, FetchErrorKind::Connection, "path /{path}");
            assert!(!err.message.contains(path), "message leaks url: {}", err.message);
        }
    }

    #[tokio::test]
    async fn test_unresolvable_host() {
        let err = fetcher()
            .fetch("http://nonexistent.invalid")
            .await
            .unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Dns);
    }

    #[tokio::test]
    async fn test_tls_against_plain_http_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let https = server.uri().replacen("http://", "https://", 1);
        let err = fetcher().fetch(&https).await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Tls);
    }
}
