//! Read `Sitemap:` directives from a site's robots.txt.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::HttpConfig;
use crate::error::{HarvestError, HarvestResult};
use crate::http_client::HttpClient;
use crate::sitemap::{parse_sitemap, SitemapEntry};

const SITEMAP_PREFIX: &str = "Sitemap:";

/// A sitemap URL advertised by robots.txt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SitemapUrl(String);

impl SitemapUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SitemapUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<SitemapUrl> for String {
    fn from(url: SitemapUrl) -> Self {
        url.0
    }
}

/// Fetches robots.txt for one site and lists its sitemaps.
pub struct RobotsSitemapReader {
    base_url: Url,
    client: HttpClient,
}

impl RobotsSitemapReader {
    pub fn new(base_url: &str, http: &HttpConfig) -> HarvestResult<Self> {
        let base_url = Url::parse(base_url).map_err(|source| HarvestError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        Ok(Self {
            base_url,
            client: HttpClient::new(http)?,
        })
    }

    /// `robots.txt` resolved against the base URL.
    pub fn robots_url(&self) -> HarvestResult<Url> {
        self.base_url
            .join("robots.txt")
            .map_err(|source| HarvestError::InvalidUrl {
                url: self.base_url.to_string(),
                source,
            })
    }

    /// Sitemap URLs declared in robots.txt, in file order.
    ///
    /// Network failures and non-2xx responses are logged and yield an
    /// empty list; robots data is advisory.
    pub async fn fetch_sitemaps(&self) -> Vec<SitemapUrl> {
        let robots_url = match self.robots_url() {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!("cannot resolve robots.txt: {e}");
                return Vec::new();
            }
        };

        let response = match self.client.get(robots_url.as_str(), &[]).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("error fetching robots.txt from {robots_url}: {e}");
                return Vec::new();
            }
        };

        if !response.is_success() {
            tracing::warn!(
                "robots.txt not found at {robots_url}: status {}",
                response.status
            );
            return Vec::new();
        }

        let sitemaps = parse_sitemap_directives(&response.body);
        tracing::info!("{} sitemap(s) declared by {robots_url}", sitemaps.len());
        sitemaps
    }

    /// Fetch one sitemap document and parse its entries.
    pub async fn fetch_sitemap_entries(
        &self,
        sitemap: &SitemapUrl,
    ) -> HarvestResult<Vec<SitemapEntry>> {
        let response = self
            .client
            .get(sitemap.as_str(), &[])
            .await?
            .error_for_status()?;
        parse_sitemap(&response.body)
    }
}

/// Extract sitemap URLs from a robots.txt body.
///
/// Only lines beginning with `Sitemap:` count. The URL is whatever follows
/// the first `": "`, trimmed. Lines without that separator, or with nothing
/// after it, are skipped.
pub fn parse_sitemap_directives(body: &str) -> Vec<SitemapUrl> {
    body.lines()
        .enumerate()
        .filter(|(_, line)| line.starts_with(SITEMAP_PREFIX))
        .filter_map(|(n, line)| match line.split_once(": ") {
            Some((_, value)) if !value.trim().is_empty() => {
                Some(SitemapUrl(value.trim().to_string()))
            }
            _ => {
                tracing::warn!("skipping malformed sitemap directive on line {}: {line:?}", n + 1);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(body: &str) -> Vec<String> {
        parse_sitemap_directives(body)
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_single_directive() {
        assert_eq!(
            urls("Sitemap: https://example.com/sitemap.xml\nUser-agent: *"),
            vec!["https://example.com/sitemap.xml"]
        );
    }

    #[test]
    fn test_directives_in_order_with_noise() {
        let txt = "User-agent: *\n\
                   Disallow: /admin\n\
                   Sitemap: https://example.com/a.xml   \n\
                   # Sitemap: https://example.com/commented.xml\n\
                   Sitemap:   https://example.com/b.xml\r\n\
                   Allow: /";
        assert_eq!(
            urls(txt),
            vec!["https://example.com/a.xml", "https://example.com/b.xml"]
        );
    }

    #[test]
    fn test_prefix_is_exact() {
        // Lower-case and indented directives do not match the prefix.
        assert!(urls("sitemap: https://example.com/s.xml").is_empty());
        assert!(urls("  Sitemap: https://example.com/s.xml").is_empty());
        assert!(urls("").is_empty());
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let txt = "Sitemap:https://example.com/no-space.xml\n\
                   Sitemap: \n\
                   Sitemap: https://example.com/ok.xml";
        assert_eq!(urls(txt), vec!["https://example.com/ok.xml"]);
    }

    #[test]
    fn test_robots_url_join() {
        let http = HttpConfig::default();
        let reader = RobotsSitemapReader::new("https://www.fandango.com/", &http).unwrap();
        assert_eq!(
            reader.robots_url().unwrap().as_str(),
            "https://www.fandango.com/robots.txt"
        );

        let reader = RobotsSitemapReader::new("https://example.com/movies/list", &http).unwrap();
        assert_eq!(
            reader.robots_url().unwrap().as_str(),
            "https://example.com/movies/robots.txt"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = RobotsSitemapReader::new("not a url", &HttpConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, HarvestError::InvalidUrl { .. }));
    }
}
