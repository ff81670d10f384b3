//! Configuration for sources, HTTP behaviour, and page selectors.
//!
//! Everything has a default so an empty (or absent) config file is valid.
//! Values are layered: file, then defaults for missing fields, then
//! environment overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HarvestError, HarvestResult};

pub const DEFAULT_SITE_URL: &str = "https://www.fandango.com/";
pub const DEFAULT_API_BASE_URL: &str = "http://bechdeltest.com/api/v1";
pub const DEFAULT_RATINGS_URL: &str =
    "https://editorial.rottentomatoes.com/guide/golden-globes-best-film-winners-by-tomatometer/";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                                  AppleWebKit/537.36 (KHTML, like Gecko) \
                                  Chrome/131.0.0.0 Safari/537.36";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub sources: SourcesConfig,
    pub http: HttpConfig,
    pub selectors: PageSelectors,
}

/// Where each component fetches from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Site whose robots.txt is read.
    pub site_url: String,
    /// Base URL of the Bechdel-test API.
    pub api_base_url: String,
    /// Ranked listing page to scrape.
    pub ratings_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            site_url: DEFAULT_SITE_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            ratings_url: DEFAULT_RATINGS_URL.to_string(),
        }
    }
}

/// Request timeout and retry policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_ms: u64,
    /// Extra attempts after the first, for network errors, 5xx and 429.
    pub max_retries: u32,
    /// Base delay; doubles on every retry.
    pub backoff_ms: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_retries: 2,
            backoff_ms: 500,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// CSS selectors for the ratings listing page.
///
/// The page markup is an unversioned external contract; these are the only
/// place its class names appear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSelectors {
    /// One match per ranked movie.
    pub container: String,
    /// Within a container; first match supplies title and detail URL.
    pub anchor: String,
    pub year: String,
    pub score: String,
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            container: "div.col-sm-18.col-full-xs.countdown-item-content".to_string(),
            anchor: "a".to_string(),
            year: "span.start-year".to_string(),
            score: "span.tMeterScore".to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> HarvestResult<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| HarvestError::Config(format!("{}: {e}", path.display())))
    }

    /// Apply `MOVIE_ANALYSIS_*` environment overrides.
    pub fn apply_env_overrides(&mut self) -> HarvestResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> HarvestResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MOVIE_ANALYSIS_SITE_URL") {
            self.sources.site_url = v;
        }
        if let Some(v) = lookup("MOVIE_ANALYSIS_API_URL") {
            self.sources.api_base_url = v;
        }
        if let Some(v) = lookup("MOVIE_ANALYSIS_RATINGS_URL") {
            self.sources.ratings_url = v;
        }
        if let Some(v) = lookup("MOVIE_ANALYSIS_TIMEOUT_MS") {
            self.http.timeout_ms = v.trim().parse().map_err(|_| {
                HarvestError::Config(format!("MOVIE_ANALYSIS_TIMEOUT_MS is not a number: {v}"))
            })?;
        }
        if let Some(v) = lookup("MOVIE_ANALYSIS_MAX_RETRIES") {
            self.http.max_retries = v.trim().parse().map_err(|_| {
                HarvestError::Config(format!("MOVIE_ANALYSIS_MAX_RETRIES is not a number: {v}"))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"sources": {{"api_base_url": "http://localhost:9000/api"}},
                "http": {{"max_retries": 0}}}}"#
        )
        .unwrap();

        let config = AnalysisConfig::load(file.path()).unwrap();
        assert_eq!(config.sources.api_base_url, "http://localhost:9000/api");
        assert_eq!(config.sources.site_url, DEFAULT_SITE_URL);
        assert_eq!(config.http.max_retries, 0);
        assert_eq!(config.http.timeout_ms, 10_000);
        assert_eq!(config.selectors, PageSelectors::default());
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = AnalysisConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, HarvestError::Config(_)));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("MOVIE_ANALYSIS_RATINGS_URL", "http://127.0.0.1/list"),
            ("MOVIE_ANALYSIS_TIMEOUT_MS", " 2500 "),
        ]
        .into_iter()
        .collect();

        let mut config = AnalysisConfig::default();
        config
            .apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.sources.ratings_url, "http://127.0.0.1/list");
        assert_eq!(config.http.timeout_ms, 2500);
        assert_eq!(config.sources.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_bad_numeric_override() {
        let mut config = AnalysisConfig::default();
        let err = config
            .apply_overrides(|k| (k == "MOVIE_ANALYSIS_MAX_RETRIES").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(matches!(err, HarvestError::Config(_)));
    }
}
