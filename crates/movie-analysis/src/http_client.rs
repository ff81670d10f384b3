//! Async HTTP client wrapping reqwest.
//!
//! One GET at a time, with a per-request timeout, retry on network errors
//! and 5xx, and backoff on 429. Status checking is left to the caller so
//! each component can apply its own error policy.

use std::time::Duration;

use crate::config::HttpConfig;
use crate::error::{HarvestError, HarvestResult};

/// Response from an HTTP GET request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Requested URL, including query string.
    pub url: String,
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into `HarvestError::HttpStatus`.
    pub fn error_for_status(self) -> HarvestResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(HarvestError::HttpStatus {
                url: self.url,
                status: self.status,
            })
        }
    }
}

/// HTTP client owned by a single acquisition component.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    timeout: Duration,
    max_retries: u32,
    backoff: Duration,
}

impl HttpClient {
    /// Create a client with the configured timeout, retry policy and user-agent.
    ///
    /// Fails when the user-agent is not a valid header value.
    pub fn new(config: &HttpConfig) -> HarvestResult<Self> {
        let timeout = Duration::from_millis(config.timeout_ms);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| HarvestError::Config(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout,
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.backoff_ms),
        })
    }

    /// Perform a GET request with query parameters.
    ///
    /// Retries transient failures up to `max_retries` times. The final
    /// response is returned whatever its status.
    pub async fn get(&self, url: &str, query: &[(&str, &str)]) -> HarvestResult<HttpResponse> {
        let mut retries = 0u32;

        loop {
            tracing::debug!("GET {url} (attempt {})", retries + 1);
            let resp = self
                .client
                .get(url)
                .query(query)
                .timeout(self.timeout)
                .send()
                .await;

            match resp {
                Ok(r) => {
                    let status = r.status().as_u16();
                    let final_url = r.url().to_string();

                    // Retry on 5xx
                    if status >= 500 && retries < self.max_retries {
                        retries += 1;
                        tracing::warn!("{final_url} returned {status}, retry {retries}");
                        tokio::time::sleep(self.delay(retries)).await;
                        continue;
                    }

                    // Backoff on 429
                    if status == 429 && retries < self.max_retries {
                        retries += 1;
                        let retry_after = r
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .map(|secs| Duration::from_secs(secs.min(10)))
                            .unwrap_or_else(|| self.delay(retries));
                        tracing::warn!("{final_url} rate limited, retry {retries}");
                        tokio::time::sleep(retry_after).await;
                        continue;
                    }

                    let body = r.text().await.map_err(|source| HarvestError::Network {
                        url: final_url.clone(),
                        source,
                    })?;

                    return Ok(HttpResponse {
                        url: request_url(url, query),
                        final_url,
                        status,
                        body,
                    });
                }
                Err(e) => {
                    if retries < self.max_retries {
                        retries += 1;
                        tracing::warn!("GET {url} failed ({e}), retry {retries}");
                        tokio::time::sleep(self.delay(retries)).await;
                        continue;
                    }
                    return Err(HarvestError::Network {
                        url: url.to_string(),
                        source: e,
                    });
                }
            }
        }
    }

    fn delay(&self, retry: u32) -> Duration {
        self.backoff * 2u32.saturating_pow(retry.saturating_sub(1))
    }
}

fn request_url(url: &str, query: &[(&str, &str)]) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    match url::Url::parse_with_params(url, query) {
        Ok(u) => u.to_string(),
        Err(_) => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> HttpResponse {
        HttpResponse {
            url: "https://example.com/robots.txt".to_string(),
            final_url: "https://example.com/robots.txt".to_string(),
            status,
            body: String::new(),
        }
    }

    #[test]
    fn test_error_for_status() {
        assert!(response(200).error_for_status().is_ok());
        assert!(response(204).error_for_status().is_ok());

        let err = response(404).error_for_status().unwrap_err();
        assert_eq!(err.status_code(), Some(404));
    }

    #[test]
    fn test_backoff_doubles() {
        let client = HttpClient::new(&HttpConfig {
            backoff_ms: 100,
            ..HttpConfig::default()
        })
        .unwrap();
        assert_eq!(client.delay(1), Duration::from_millis(100));
        assert_eq!(client.delay(2), Duration::from_millis(200));
        assert_eq!(client.delay(3), Duration::from_millis(400));
    }

    #[test]
    fn test_invalid_user_agent_rejected() {
        let config = HttpConfig {
            user_agent: "Mozilla/5.0 (Macintosh)\r\nX-Injected: yes".to_string(),
            ..HttpConfig::default()
        };
        assert!(matches!(HttpClient::new(&config), Err(HarvestError::Config(_))));
    }

    #[test]
    fn test_request_url_encodes_query() {
        assert_eq!(
            request_url("http://api.test/getMoviesByTitle", &[("title", "the matrix")]),
            "http://api.test/getMoviesByTitle?title=the+matrix"
        );
        assert_eq!(request_url("http://api.test/x", &[]), "http://api.test/x");
    }
}
