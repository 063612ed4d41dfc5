use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::Instant;

use crate::error::SourceError;
use crate::retry::with_retry;

/// The shared HTTP helper behind every adapter.
///
/// Holds the process-wide `reqwest::Client` (connection pool, default
/// timeout, user agent) and performs request → status check → typed JSON
/// decode with the deadline observed before and during every call.
pub struct Fetcher {
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl Fetcher {
    /// Creates the helper with the configured client timeout, `User-Agent`,
    /// and retry policy for [`Fetcher::get_json_with_retry`].
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Transport`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        retry_delay_ms: u64,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()
            .map_err(SourceError::Transport)?;
        Ok(Self {
            client,
            max_retries,
            retry_delay: Duration::from_millis(retry_delay_ms),
        })
    }

    /// GET `url` and decode the JSON body into `T`.
    ///
    /// # Errors
    ///
    /// Status mapping: 404 → [`SourceError::NotFound`], 401/403 →
    /// [`SourceError::Unauthorised`], 429 → [`SourceError::RateLimited`],
    /// any other non-2xx → [`SourceError::Status`]. Body mismatches are
    /// [`SourceError::Decode`] regardless of HTTP status.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        deadline: Instant,
        source: &str,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        let request = self.client.get(url).headers(merge_headers(headers));
        self.send(deadline, source, url, request).await
    }

    /// GET with the helper's configured retry policy on transient errors.
    ///
    /// # Errors
    ///
    /// As [`Fetcher::get_json`]; the last attempt's error after back-off, or
    /// [`SourceError::Cancelled`] when the deadline expires between attempts.
    pub async fn get_json_with_retry<T: DeserializeOwned>(
        &self,
        deadline: Instant,
        source: &str,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        with_retry(deadline, self.max_retries, self.retry_delay, || {
            self.get_json(deadline, source, url, headers)
        })
        .await
    }

    /// POST `body` as JSON and decode the JSON reply into `T`.
    ///
    /// # Errors
    ///
    /// As [`Fetcher::get_json`].
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        deadline: Instant,
        source: &str,
        url: &str,
        headers: &[(&str, &str)],
        body: &B,
    ) -> Result<T, SourceError> {
        let request = self
            .client
            .post(url)
            .headers(merge_headers(headers))
            .json(body);
        self.send(deadline, source, url, request).await
    }

    /// POST an `application/x-www-form-urlencoded` body and decode the JSON
    /// reply into `T`.
    ///
    /// # Errors
    ///
    /// As [`Fetcher::get_json`].
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        deadline: Instant,
        source: &str,
        url: &str,
        headers: &[(&str, &str)],
        form: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        let request = self
            .client
            .post(url)
            .headers(merge_headers(headers))
            .form(form);
        self.send(deadline, source, url, request).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        deadline: Instant,
        source: &str,
        url: &str,
        request: RequestBuilder,
    ) -> Result<T, SourceError> {
        if Instant::now() >= deadline {
            return Err(SourceError::Timeout);
        }

        let response = tokio::time::timeout_at(deadline, request.send())
            .await
            .map_err(|_| SourceError::Timeout)?
            .map_err(SourceError::from_reqwest)?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(SourceError::Unauthorised {
                    url: url.to_owned(),
                });
            }
            StatusCode::NOT_FOUND => {
                return Err(SourceError::NotFound {
                    url: url.to_owned(),
                });
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(SourceError::RateLimited {
                    url: url.to_owned(),
                });
            }
            _ if !status.is_success() => {
                return Err(SourceError::Status {
                    status: status.as_u16(),
                    url: url.to_owned(),
                });
            }
            _ => {}
        }

        let body = tokio::time::timeout_at(deadline, response.text())
            .await
            .map_err(|_| SourceError::Timeout)?
            .map_err(SourceError::from_reqwest)?;

        serde_json::from_str(&body).map_err(|e| SourceError::Decode {
            context: format!("{source} response from {url}"),
            reason: e.to_string(),
        })
    }
}

/// `Accept: application/json` by default; caller headers win on clash.
/// Unparseable caller header pairs are skipped.
fn merge_headers(headers: &[(&str, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    map.insert(ACCEPT, HeaderValue::from_static("application/json"));
    for (name, value) in headers {
        let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
            tracing::debug!(header = name, "skipping invalid header name");
            continue;
        };
        let Ok(value) = HeaderValue::from_str(value) else {
            tracing::debug!(header = %name, "skipping invalid header value");
            continue;
        };
        map.insert(name, value);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_headers_sets_json_accept_by_default() {
        let map = merge_headers(&[]);
        assert_eq!(map.get(ACCEPT).unwrap(), "application/json");
    }

    #[test]
    fn merge_headers_lets_the_caller_win() {
        let map = merge_headers(&[("accept", "application/geo+json"), ("x-api-key", "k")]);
        assert_eq!(map.get(ACCEPT).unwrap(), "application/geo+json");
        assert_eq!(map.get("x-api-key").unwrap(), "k");
    }

    #[test]
    fn merge_headers_skips_unparseable_pairs() {
        let map = merge_headers(&[("bad name", "v"), ("ok", "fine")]);
        assert!(map.get("ok").is_some());
        assert_eq!(map.len(), 2, "accept + ok");
    }
}
