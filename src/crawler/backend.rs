//! Render backends
//!
//! The crawler drives a backend that can navigate to a page, report the
//! response status, hand back the rendered HTML and enumerate anchor hrefs.
//! Browser-based backends implement [`RenderBackend`]; [`HttpRenderBackend`]
//! is the built-in implementation that fetches pages over plain HTTP.

use crate::config::CrawlerConfig;
use crate::crawler::parser::extract_hrefs;
use crate::AuditError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Outcome of a successful navigation
#[derive(Debug, Clone, Default)]
pub struct Navigation {
    /// HTTP status of the main document response
    pub status_code: u16,

    /// Full rendered HTML
    pub html: String,

    /// Raw `href` values of all anchors on the page
    pub anchors: Vec<String>,
}

/// A page rendering backend driven by the crawler
#[async_trait]
pub trait RenderBackend: Send + Sync {
    /// Navigates to `url` and captures status, HTML and anchors
    ///
    /// The crawler bounds every call with its navigation timeout.
    async fn navigate(&self, url: &Url) -> Result<Navigation, AuditError>;
}

/// Builds the HTTP client used for page and robots.txt requests
///
/// # Arguments
///
/// * `config` - The crawler configuration (user agent and timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.navigation_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Backend that renders pages by fetching them over HTTP
///
/// No JavaScript is executed; the served HTML is treated as the rendered
/// document.
#[derive(Debug, Clone)]
pub struct HttpRenderBackend {
    client: Client,
}

impl HttpRenderBackend {
    /// Prepares the backend
    ///
    /// Failure here is a setup error: the audit run must not start.
    pub fn launch(config: &CrawlerConfig) -> Result<Self, AuditError> {
        let client = build_http_client(config)
            .map_err(|e| AuditError::Setup(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// The underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl RenderBackend for HttpRenderBackend {
    async fn navigate(&self, url: &Url) -> Result<Navigation, AuditError> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|source| classify_error(url, source))?;

        let status_code = response.status().as_u16();
        let html = response
            .text()
            .await
            .map_err(|source| classify_error(url, source))?;
        let anchors = extract_hrefs(&html);

        Ok(Navigation {
            status_code,
            html,
            anchors,
        })
    }
}

fn classify_error(url: &Url, source: reqwest::Error) -> AuditError {
    if source.is_timeout() {
        AuditError::Timeout {
            url: url.to_string(),
        }
    } else {
        AuditError::Http {
            url: url.to_string(),
            source,
        }
    }
}
