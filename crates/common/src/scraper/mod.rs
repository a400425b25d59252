//! Competitor heading scraper
//!
//! Fetches competitor pages and extracts their H2/H3 heading text. The
//! contract is deliberately forgiving: a URL that fails to fetch or parse
//! yields an empty heading list for that URL and never aborts the batch.
//! Fetches fan out with a fixed width and fan back in before returning.

use crate::config::ScraperConfig;
use crate::errors::{AppError, Result};
use futures::{stream, StreamExt};
use regex_lite::Regex;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Heading scraper over plain HTTP fetches
pub struct HeadingScraper {
    client: reqwest::Client,
    max_concurrency: usize,
}

impl HeadingScraper {
    /// Create a new scraper from configuration
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            max_concurrency: config.max_concurrency.max(1),
        })
    }

    /// Scrape H2/H3 headings from each URL concurrently.
    ///
    /// Returns a map with one entry per input URL; failed URLs map to an
    /// empty list.
    pub async fn headings(&self, urls: &[String]) -> HashMap<String, Vec<String>> {
        let results: Vec<(String, Vec<String>)> = stream::iter(urls.iter().cloned())
            .map(|url| async move {
                let headings = self.scrape_one(&url).await;
                (url, headings)
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        results.into_iter().collect()
    }

    async fn scrape_one(&self, url: &str) -> Vec<String> {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to fetch competitor page");
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            warn!(url = %url, status = %response.status(), "Competitor page returned error status");
            return Vec::new();
        }

        let html = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to read competitor page body");
                return Vec::new();
            }
        };

        let headings = extract_headings(&html);
        debug!(url = %url, count = headings.len(), "Scraped headings");
        headings
    }
}

/// Extract H2/H3 heading text from an HTML document, in document order.
///
/// Inner markup is stripped and common entities decoded; blank headings are
/// dropped.
pub fn extract_headings(html: &str) -> Vec<String> {
    let heading_re = Regex::new(r"(?is)<h[23][^>]*>(.*?)</h[23]\s*>").unwrap();
    let tag_re = Regex::new(r"(?s)<[^>]*>").unwrap();

    heading_re
        .captures_iter(html)
        .filter_map(|caps| {
            let inner = caps.get(1)?.as_str();
            let text = decode_entities(&tag_re.replace_all(inner, " "));
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            (!text.is_empty()).then_some(text)
        })
        .collect()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_headings_basic() {
        let html = r#"
            <html><body>
            <h1>Page Title</h1>
            <h2>Fit and Sizing</h2>
            <p>Some text</p>
            <h3 class="sub">Width <em>matters</em></h3>
            <h2 id="care">Care &amp; Maintenance</h2>
            </body></html>
        "#;

        let headings = extract_headings(html);
        assert_eq!(
            headings,
            vec!["Fit and Sizing", "Width matters", "Care & Maintenance"]
        );
    }

    #[test]
    fn test_extract_headings_skips_h1_and_blank() {
        let html = "<h1>Only Title</h1><h2>   </h2><h2></h2>";
        assert!(extract_headings(html).is_empty());
    }

    #[test]
    fn test_extract_headings_multiline() {
        let html = "<h2>\n  Waterproofing\n  Options\n</h2>";
        assert_eq!(extract_headings(html), vec!["Waterproofing Options"]);
    }

    #[test]
    fn test_extract_headings_not_html() {
        assert!(extract_headings("plain text, no markup").is_empty());
    }
}
