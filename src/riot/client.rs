use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};

use super::limiter::{LimitPolicy, Permit, RiotRateLimiter};
use super::metrics::RequestMetrics;
use super::region::{Platform, Region};
use crate::config::Config;
use crate::error::AppError;
use crate::outcome::Outcome;

#[derive(Debug, Clone)]
pub struct RiotClient {
    client: reqwest::Client,
    limiter: Arc<RiotRateLimiter>,
    policy: LimitPolicy,
    /// Riot API Key
    key: String,
    /// Replaces every routing host, for tests against a local server.
    base_url: Option<String>,
    metrics: Arc<RequestMetrics>,
}

impl RiotClient {
    pub fn new(key: String, limiter: RiotRateLimiter, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            limiter: Arc::new(limiter),
            policy: LimitPolicy::default(),
            key,
            base_url: None,
            metrics: RequestMetrics::new(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let limiter = RiotRateLimiter::new(config.short_window(), config.long_window())?;

        Ok(Self::new(config.riot_api_key.clone(), limiter, config.request_timeout())?
            .with_policy(config.riot_rate_limit_policy))
    }

    pub fn with_policy(mut self, policy: LimitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn metrics(&self) -> Arc<RequestMetrics> {
        self.metrics.clone()
    }

    pub(crate) fn platform_url(&self, platform: Platform) -> String {
        self.base_url.clone().unwrap_or_else(|| platform.base_url())
    }

    pub(crate) fn region_url(&self, region: Region) -> String {
        self.base_url.clone().unwrap_or_else(|| region.base_url())
    }

    /// Sends an authenticated GET once the rate limiter allows it.
    ///
    /// 404 and 429 are expected answers and come back as [`Outcome`]s; a
    /// denied permit returns [`Outcome::RateLimited`] without touching the
    /// network.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<Outcome<T>, AppError> {
        if let Permit::Denied { retry_after } = self.acquire().await {
            self.metrics.inc_denied();
            debug!(url, ?retry_after, "🛰️ Request budget exhausted, request skipped");
            return Ok(Outcome::RateLimited {
                retry_after: Some(retry_after),
            });
        }

        trace!(url, "🛰️ GET");
        self.metrics.inc();

        let res = self
            .client
            .get(url)
            .header("X-Riot-Token", &self.key)
            .send()
            .await?;

        match res.status() {
            status if status.is_success() => Ok(Outcome::Found(res.json().await?)),
            StatusCode::NOT_FOUND => Ok(Outcome::NotFound),
            StatusCode::TOO_MANY_REQUESTS => {
                self.metrics.inc_throttled();
                let retry_after = res
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(Duration::from_secs);
                warn!(url, ?retry_after, "🛰️ ⚠️ Riot API answered 429");
                Ok(Outcome::RateLimited { retry_after })
            }
            status if status.is_server_error() => Err(AppError::Unavailable {
                status: status.as_u16(),
            }),
            status => {
                let message = res.text().await.unwrap_or_default();
                Err(AppError::RiotApi {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn acquire(&self) -> Permit {
        match self.policy {
            LimitPolicy::Reject => self.limiter.try_acquire().await,
            LimitPolicy::Wait => {
                self.limiter.until_ready().await;
                Permit::Granted
            }
        }
    }
}
