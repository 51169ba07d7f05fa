use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Upper bound on a feed download, connect to last byte.
pub const FEED_TIMEOUT: Duration = Duration::from_secs(30);

pub const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while downloading a feed document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error before a response arrived (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Connect(#[source] reqwest::Error),
    /// The connection broke while the body was streaming
    #[error("Body read failed: {0}")]
    Body(#[source] reqwest::Error),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

/// Downloads `url` and returns the body.
///
/// The status code is not treated as an error: the caller decides whether
/// the body is usable. Non-2xx responses are logged.
pub async fn fetch_feed(client: &reqwest::Client, url: &Url) -> Result<Vec<u8>, FetchError> {
    let response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(FetchError::Connect)?;

    if !response.status().is_success() {
        tracing::warn!(
            feed = %url,
            status = %response.status(),
            "Feed responded with non-success status"
        );
    }

    read_limited_bytes(response, MAX_FEED_SIZE).await
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Body)?;
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
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn server_with(template: ResponseTemplate) -> (MockServer, Url) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(template)
            .mount(&server)
            .await;
        let url = Url::parse(&format!("{}/rss", server.uri())).unwrap();
        (server, url)
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let (_server, url) =
            server_with(ResponseTemplate::new(200).set_body_string("<rss/>")).await;
        let body = fetch_feed(&reqwest::Client::new(), &url).await.unwrap();
        assert_eq!(body, b"<rss/>");
    }

    #[tokio::test]
    async fn test_error_status_still_returns_body() {
        let (_server, url) =
            server_with(ResponseTemplate::new(404).set_body_string("gone")).await;
        let body = fetch_feed(&reqwest::Client::new(), &url).await.unwrap();
        assert_eq!(body, b"gone");
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let url = Url::parse("http://127.0.0.1:1/rss").unwrap();
        let err = fetch_feed(&reqwest::Client::new(), &url).await.unwrap_err();
        assert!(matches!(err, FetchError::Connect(_)));
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let body = vec![b'x'; 64];
        let (_server, url) =
            server_with(ResponseTemplate::new(200).set_body_bytes(body)).await;

        let response = reqwest::Client::new().get(url.as_str()).send().await.unwrap();
        let err = read_limited_bytes(response, 32).await.unwrap_err();
        assert!(matches!(err, FetchError::ResponseTooLarge));
    }
}
