//! Robots.txt handling module
//!
//! This module fetches and parses robots.txt for the audited site and answers
//! whether a path may be crawled.

mod parser;

pub use parser::{PathPattern, RobotsRule, RobotsRules};

use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Timeout for the robots.txt request
const ROBOTS_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the robots.txt URL for a site: `{scheme}://{host[:port]}/robots.txt`
pub fn robots_url(base_url: &Url) -> Option<Url> {
    base_url.join("/robots.txt").ok()
}

/// Fetches robots.txt for the site of `base_url`
///
/// Any fetch error or non-200 response yields rules that allow everything.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `base_url` - Any URL on the audited site
pub async fn fetch_robots(client: &Client, base_url: &Url) -> RobotsRules {
    let Some(url) = robots_url(base_url) else {
        return RobotsRules::allow_all();
    };

    let response = match client.get(url.as_str()).timeout(ROBOTS_TIMEOUT).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("robots.txt fetch failed for {}: {}", url, e);
            return RobotsRules::allow_all();
        }
    };

    if response.status() != StatusCode::OK {
        tracing::debug!(
            "robots.txt returned {} for {}, allowing everything",
            response.status(),
            url
        );
        return RobotsRules::allow_all();
    }

    match response.text().await {
        Ok(body) => {
            let rules = RobotsRules::parse(&body);
            tracing::info!("Loaded {} robots.txt rule blocks from {}", rules.rules().len(), url);
            rules
        }
        Err(e) => {
            tracing::debug!("robots.txt body unreadable for {}: {}", url, e);
            RobotsRules::allow_all()
        }
    }
}
