use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::StatusCode;
use tracing::{debug, warn};

use super::metrics::RequestMetrics;
use super::retry::RetryPolicy;
use super::types::{ApiError, ApiResult};
use crate::clock::{Sleeper, TokioSleeper};

/// HTTP client for the Valorant ranking API.
///
/// Cheap to clone; every clone shares the same rate limiter and metrics.
#[derive(Clone)]
pub struct ValorantClient {
    client: reqwest::Client,
    limiter: Arc<DefaultDirectRateLimiter>,
    base_url: String,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    metrics: Arc<RequestMetrics>,
}

impl std::fmt::Debug for ValorantClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValorantClient")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl ValorantClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        requests_per_minute: NonZeroU32,
        retry: RetryPolicy,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let quota = Quota::per_minute(requests_per_minute);

        Ok(Self {
            client,
            limiter: Arc::new(RateLimiter::direct(quota)),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry,
            sleeper: Arc::new(TokioSleeper),
            metrics: RequestMetrics::new(),
        })
    }

    /// Replace the sleeper used between retries.
    #[cfg(test)]
    pub(crate) fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn metrics(&self) -> Arc<RequestMetrics> {
        self.metrics.clone()
    }

    pub(super) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `url` and return the body as text.
    ///
    /// 429 responses are retried following the [`RetryPolicy`]; any other
    /// failure, timeouts included, is returned immediately.
    pub async fn get_text(&self, url: &str) -> ApiResult<String> {
        let max_attempts = self.retry.max_attempts();

        for attempt in 1..=max_attempts {
            self.limiter.until_ready().await;
            self.metrics.inc();

            tracing::trace!(url, attempt, "[VALORANT::CLIENT] GET");

            let res = self.client.get(url).send().await.map_err(map_reqwest)?;

            match res.status() {
                status if status.is_success() => {
                    return res.text().await.map_err(map_reqwest);
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    self.metrics.inc_rate_limited();

                    if attempt == max_attempts {
                        break;
                    }

                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "🛰️ ⚠️ Rate limited by ranking API, backing off"
                    );
                    self.sleeper.sleep(delay).await;
                }
                status => {
                    debug!(%status, url, "🛰️ ❌ Ranking API request failed");
                    return Err(ApiError::Status(status));
                }
            }
        }

        Err(ApiError::RateLimited {
            attempts: max_attempts,
        })
    }
}

fn map_reqwest(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Reqwest(err)
    }
}
