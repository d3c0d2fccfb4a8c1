use crate::feed::parser::{parse_items, FeedItem};
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while loading the blog feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the 30-second timeout
    #[error("Request timed out")]
    Timeout,
    /// Feed XML could not be parsed as RSS or Atom
    #[error("Parse error: {0}")]
    Parse(String),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

/// Loads the most recent posts of one feed on every call.
#[derive(Clone)]
pub struct FeedLoader {
    client: reqwest::Client,
    url: String,
    limit: usize,
}

impl FeedLoader {
    pub fn new(client: reqwest::Client, url: impl Into<String>, limit: usize) -> Self {
        Self {
            client,
            url: url.into(),
            limit,
        }
    }

    /// Fetch and parse the feed, returning an empty list on any failure.
    ///
    /// The landing page renders without the blog section rather than failing,
    /// so errors are logged and swallowed here.
    pub async fn load(&self) -> Vec<FeedItem> {
        match self.try_load().await {
            Ok(items) => {
                tracing::debug!(feed = %self.url, items = items.len(), "Loaded feed");
                items
            }
            Err(e) => {
                tracing::warn!(feed = %self.url, error = %e, "Failed to load feed");
                Vec::new()
            }
        }
    }

    /// Fetch and parse the feed.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Network`] - Connection or TLS errors
    /// - [`FetchError::Timeout`] - Request exceeded 30 seconds
    /// - [`FetchError::HttpStatus`] - Non-2xx HTTP response
    /// - [`FetchError::ResponseTooLarge`] - Response exceeded 10MB
    /// - [`FetchError::Parse`] - Invalid RSS/Atom XML
    pub async fn try_load(&self) -> Result<Vec<FeedItem>, FetchError> {
        let response = tokio::time::timeout(FETCH_TIMEOUT, self.client.get(&self.url).send())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(FetchError::Network)?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;

        parse_items(&bytes, self.limit).map_err(|e| FetchError::Parse(e.to_string()))
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Blog</title>
    <item><title>One</title><link>https://blog.example.com/1</link></item>
    <item><title>Two</title><link>https://blog.example.com/2</link></item>
</channel></rss>"#;

    async fn serve(template: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rss/"))
            .respond_with(template)
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn test_load_success() {
        let mock_server = serve(
            ResponseTemplate::new(200)
                .set_body_string(VALID_RSS)
                .insert_header("Content-Type", "application/rss+xml"),
        )
        .await;

        let loader = FeedLoader::new(
            reqwest::Client::new(),
            format!("{}/rss/", mock_server.uri()),
            3,
        );
        let items = loader.try_load().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].title, "Two");
    }

    #[tokio::test]
    async fn test_404_is_http_status_error() {
        let mock_server = serve(ResponseTemplate::new(404)).await;

        let loader = FeedLoader::new(
            reqwest::Client::new(),
            format!("{}/rss/", mock_server.uri()),
            3,
        );
        match loader.try_load().await.unwrap_err() {
            FetchError::HttpStatus(404) => {}
            e => panic!("Expected HttpStatus(404), got {:?}", e),
        }
        assert!(loader.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_feed_parse_error() {
        let mock_server = serve(ResponseTemplate::new(200).set_body_string("<not valid xml")).await;

        let loader = FeedLoader::new(
            reqwest::Client::new(),
            format!("{}/rss/", mock_server.uri()),
            3,
        );
        assert!(matches!(
            loader.try_load().await.unwrap_err(),
            FetchError::Parse(_)
        ));
        assert!(loader.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_url_yields_empty_list() {
        // Port 9 (discard) on localhost is not listening in test environments
        let loader = FeedLoader::new(reqwest::Client::new(), "http://127.0.0.1:9/rss/", 3);
        assert!(loader.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let body = "x".repeat(MAX_FEED_SIZE + 1);
        let mock_server = serve(ResponseTemplate::new(200).set_body_string(body)).await;

        let loader = FeedLoader::new(
            reqwest::Client::new(),
            format!("{}/rss/", mock_server.uri()),
            3,
        );
        assert!(matches!(
            loader.try_load().await.unwrap_err(),
            FetchError::ResponseTooLarge
        ));
    }
}
