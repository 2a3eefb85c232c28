//! Article HTML downloader.
//!
//! One GET per article with a desktop-browser User-Agent and realistic
//! Accept headers (the platform blocks obvious scrapers), a bounded timeout,
//! and no retry or caching. Failures map to fetch errors; the pipeline skips
//! the article and continues the batch.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use tracing::{debug, instrument};

use articlesync_shared::{ArticleSyncError, Result};

/// Desktop-browser User-Agent sent with every request.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Accept header matching what the browser above would send.
const ACCEPT_VALUE: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8";

/// Accept-Language header matching the platform's primary audience.
const ACCEPT_LANGUAGE_VALUE: &str = "zh-CN,zh;q=0.9,en;q=0.8";

/// Default download timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// HTTP downloader for article pages.
pub struct Downloader {
    client: Client,
}

impl Downloader {
    /// Create a downloader with the given timeout.
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE),
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ArticleSyncError::Fetch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Fetch the raw HTML at `url`. Non-2xx statuses and transport errors
    /// both map to a fetch error.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch(&self, url: &str) -> Result<String> {
        debug!("downloading article");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ArticleSyncError::Fetch(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArticleSyncError::Fetch(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| ArticleSyncError::Fetch(format!("{url}: failed to read body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_returns_body_on_success() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/article"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string("<html><body>hello</body></html>"),
            )
            .mount(&server)
            .await;

        let downloader = Downloader::new(DEFAULT_TIMEOUT_SECS).unwrap();
        let body = downloader
            .fetch(&format!("{}/article", server.uri()))
            .await
            .expect("fetch");
        assert!(body.contains("hello"));
    }

    #[tokio::test]
    async fn fetch_sends_browser_headers() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::header("accept-language", ACCEPT_LANGUAGE_VALUE))
            .and(wiremock::matchers::header("user-agent", USER_AGENT))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let downloader = Downloader::new(DEFAULT_TIMEOUT_SECS).unwrap();
        downloader.fetch(&server.uri()).await.expect("fetch");
    }

    #[tokio::test]
    async fn fetch_maps_non_2xx_to_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let downloader = Downloader::new(DEFAULT_TIMEOUT_SECS).unwrap();
        let err = downloader.fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, ArticleSyncError::Fetch(_)));
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn fetch_maps_connection_error() {
        // Nothing listens on this port.
        let downloader = Downloader::new(1).unwrap();
        let err = downloader
            .fetch("http://127.0.0.1:1/article")
            .await
            .unwrap_err();
        assert!(matches!(err, ArticleSyncError::Fetch(_)));
    }
}
