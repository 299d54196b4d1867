// GitHub HTTP client.
// Handles authentication, rate limiting, and request/response processing.

use std::time::Duration;

use reqwest::{
    StatusCode,
    blocking::{Client, Response},
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};

use crate::error::{QuarryError, Result};

use super::types::RateLimit;

const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Host probed before tree requests so offline use fails fast.
const PROBE_URL: &str = "https://github.com";
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Blocking GitHub client with rate limit tracking.
///
/// Works unauthenticated against public repositories; a token raises the
/// API rate ceiling.
pub struct GitHubClient {
    client: Client,
    rate_limit: RateLimit,
}

impl GitHubClient {
    /// Create an unauthenticated client.
    pub fn new() -> Result<Self> {
        Self::build(None)
    }

    /// Create a client authenticated with the given token.
    pub fn with_token(token: &str) -> Result<Self> {
        Self::build(Some(token))
    }

    /// Create a client, using the GITHUB_TOKEN environment variable when set.
    pub fn from_env() -> Result<Self> {
        match std::env::var("GITHUB_TOKEN") {
            Ok(token) => Self::with_token(&token),
            Err(_) => Self::new(),
        }
    }

    fn build(token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();

        if let Some(token) = token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| QuarryError::Other(e.to_string()))?,
            );
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("quarry"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(QuarryError::Api)?;

        Ok(Self {
            client,
            rate_limit: RateLimit::default(),
        })
    }

    /// Get the current rate limit information.
    pub fn rate_limit(&self) -> &RateLimit {
        &self.rate_limit
    }

    /// Bounded-timeout reachability check. Does not touch the API quota.
    pub fn is_online(&self) -> bool {
        let reachable = self
            .client
            .head(PROBE_URL)
            .timeout(PROBE_TIMEOUT)
            .send()
            .is_ok();
        if !reachable {
            log::warn!("connectivity probe to {} failed", PROBE_URL);
        }
        reachable
    }

    /// Make a GET request to the GitHub API.
    pub fn get(&mut self, endpoint: &str) -> Result<Response> {
        let url = format!("{}{}", GITHUB_API_BASE, endpoint);
        self.get_url(&url)
    }

    /// Make a GET request to the GitHub API with query parameters.
    pub fn get_with_params<T: serde::Serialize + ?Sized>(
        &mut self,
        endpoint: &str,
        params: &T,
    ) -> Result<Response> {
        let url = format!("{}{}", GITHUB_API_BASE, endpoint);
        log::debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .map_err(QuarryError::Api)?;

        self.update_rate_limit(&response);
        self.check_response(response)
    }

    /// Make a GET request to an absolute URL (raw downloads, remote manifests).
    pub fn get_url(&mut self, url: &str) -> Result<Response> {
        log::debug!("GET {}", url);
        let response = self.client.get(url).send().map_err(QuarryError::Api)?;

        self.update_rate_limit(&response);
        self.check_response(response)
    }

    /// Update rate limit from response headers.
    fn update_rate_limit(&mut self, response: &Response) {
        if let Some(limit) = response
            .headers()
            .get("x-ratelimit-limit")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
        {
            self.rate_limit.limit = limit;
        }

        if let Some(remaining) = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
        {
            self.rate_limit.remaining = remaining;
        }

        if let Some(reset) = response
            .headers()
            .get("x-ratelimit-reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
        {
            self.rate_limit.reset = reset;
        }
    }

    /// Check response status and convert errors.
    fn check_response(&self, response: Response) -> Result<Response> {
        match response.status() {
            StatusCode::OK | StatusCode::CREATED | StatusCode::ACCEPTED => Ok(response),
            StatusCode::UNAUTHORIZED => Err(QuarryError::Unauthorized),
            StatusCode::NOT_FOUND => {
                let url = response.url().to_string();
                Err(QuarryError::NotFound(url))
            }
            StatusCode::FORBIDDEN => {
                // Check if rate limited
                if self.rate_limit.remaining == 0 {
                    let reset_at =
                        chrono::DateTime::from_timestamp(self.rate_limit.reset as i64, 0)
                            .map(|dt| dt.format("%H:%M:%S").to_string())
                            .unwrap_or_else(|| "unknown".to_string());
                    Err(QuarryError::RateLimited { reset_at })
                } else {
                    Err(QuarryError::Other(format!(
                        "Forbidden: {}",
                        response.text().unwrap_or_default()
                    )))
                }
            }
            status => Err(QuarryError::Other(format!(
                "HTTP {}: {}",
                status,
                response.text().unwrap_or_default()
            ))),
        }
    }
}
