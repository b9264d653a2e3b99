// Mastodon API HTTP client.
// Handles the bearer token, rate limit headers, and form/multipart requests.

use chrono::{DateTime, Utc};
use reqwest::{
    Client, RequestBuilder, Response, StatusCode,
    header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT},
    multipart::Form,
};
use serde::Serialize;
use tracing::debug;

use crate::error::{BotError, Result};
use crate::http::{self, check_response};

use super::types::RateLimit;

/// Mastodon API client for a single server.
pub struct MastodonClient {
    client: Client,
    base_url: String,
    access_token: Option<String>,
    rate_limit: RateLimit,
}

impl MastodonClient {
    /// Create an unauthenticated client for the server at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(http::USER_AGENT));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(BotError::Api)?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
            access_token: None,
            rate_limit: RateLimit::default(),
        })
    }

    pub fn set_access_token(&mut self, token: String) {
        self.access_token = Some(token);
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// POST a URL-encoded form.
    pub async fn post_form<T: Serialize + ?Sized>(
        &mut self,
        endpoint: &str,
        form: &T,
    ) -> Result<Response> {
        let request = self.authorize(self.client.post(self.url(endpoint)).form(form));
        let response = request.send().await.map_err(BotError::Api)?;

        self.update_rate_limit(response.headers());
        self.check(response).await
    }

    /// POST a multipart form.
    pub async fn post_multipart(&mut self, endpoint: &str, form: Form) -> Result<Response> {
        let request = self.authorize(self.client.post(self.url(endpoint)).multipart(form));
        let response = request.send().await.map_err(BotError::Api)?;

        self.update_rate_limit(response.headers());
        self.check(response).await
    }

    /// Check response status, reporting exhausted rate limits with their reset time.
    async fn check(&self, response: Response) -> Result<Response> {
        if response.status() == StatusCode::TOO_MANY_REQUESTS && self.rate_limit.remaining == 0 {
            return Err(self.rate_limited());
        }
        check_response(response).await
    }

    fn rate_limited(&self) -> BotError {
        let reset_at = self
            .rate_limit
            .reset
            .map(|dt| dt.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        BotError::RateLimited { reset_at }
    }

    /// Update rate limit from response headers.
    fn update_rate_limit(&mut self, headers: &HeaderMap) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        if let Some(limit) = header("x-ratelimit-limit").and_then(|v| v.parse().ok()) {
            self.rate_limit.limit = limit;
        }
        if let Some(remaining) = header("x-ratelimit-remaining").and_then(|v| v.parse().ok()) {
            self.rate_limit.remaining = remaining;
        }
        if let Some(reset) = header("x-ratelimit-reset")
            .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
            .map(|dt| dt.with_timezone(&Utc))
        {
            self.rate_limit.reset = Some(reset);
        }

        debug!(
            remaining = self.rate_limit.remaining,
            limit = self.rate_limit.limit,
            "mastodon rate limit"
        );
    }
}

/// Strip trailing slashes and default to https when no scheme is given.
fn normalize_base_url(server: &str) -> String {
    let server = server.trim().trim_end_matches('/');
    if server.starts_with("http://") || server.starts_with("https://") {
        server.to_string()
    } else {
        format!("https://{}", server)
    }
}
