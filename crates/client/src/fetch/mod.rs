//! HTTP fetch pipeline for snapshot capture.
//!
//! Canonicalizes the requested URL, fetches it with bounded redirects and
//! size/timeout limits, and records the final URL the redirect chain landed
//! on, which is the canonical URL snapshots are filed under.

pub mod url;

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode, Url, header};

pub use url::canonicalize;

use crate::extract;
use pagevault_core::Error;

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "pagevault/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "pagevault/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

/// Raw response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The canonicalized URL that was requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response body decoded as text
    pub html: String,
    /// Wall-clock epoch millis at request start
    pub fetch_started_at_ms: i64,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

/// The fetch-collaborator record the snapshot service ingests: one fetched
/// page plus its extracted metadata.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final destination URL after following all HTTP redirects.
    pub canonical_url: String,
    pub html: String,
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub outlinks: Vec<String>,
    pub fetch_started_at_ms: i64,
    pub fetch_duration_ms: i64,
}

/// HTTP fetch client with size and redirect limits.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Fetch(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Fetch a URL, returning the decoded body and fetch metadata.
    ///
    /// Non-2xx status, network errors, timeouts, and over-size bodies all
    /// fail; redirects are followed up to the configured limit and the
    /// final URL is reported.
    pub async fn fetch(&self, url_str: &str) -> Result<FetchResponse, Error> {
        let fetch_started_at_ms = chrono::Utc::now().timestamp_millis();
        let start = Instant::now();
        let url = canonicalize(url_str)?;

        let request = self.http.get(url.as_str()).header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        );

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::FetchTimeout(format!("{}ms elapsed fetching {}", self.config.timeout.as_millis(), url))
            } else {
                Error::Fetch(format!("network error: {}", e))
            }
        })?;

        let status = response.status();

        if !status.is_success() {
            return Err(Error::Fetch(format!("status {}", status.as_u16())));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Fetch(format!("failed to read response: {}", e)))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                bytes.len(),
                self.config.max_bytes
            )));
        }

        let html = String::from_utf8_lossy(&bytes).into_owned();
        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} bytes)",
            url,
            final_url,
            fetch_ms,
            bytes.len()
        );

        Ok(FetchResponse { url, final_url, status, content_type, html, fetch_started_at_ms, fetch_ms })
    }

    /// Fetch a page and extract the metadata a snapshot stores.
    pub async fn fetch_page(&self, url_str: &str) -> Result<FetchedPage, Error> {
        let response = self.fetch(url_str).await?;
        let meta = extract::page_meta(&response.html);

        Ok(FetchedPage {
            canonical_url: response.final_url.to_string(),
            html: response.html,
            title: meta.title,
            description: meta.description,
            keywords: meta.keywords,
            outlinks: meta.outlinks,
            fetch_started_at_ms: response.fetch_started_at_ms,
            fetch_duration_ms: response.fetch_ms as i64,
        })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}
