use std::env;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

use nonzero_ext::nonzero;

use crate::error::AppError;
use crate::riot::{LimitPolicy, WindowLimit};

#[derive(Debug, Clone)]
pub struct Config {
    pub riot_api_key: String,
    pub database_url: String,
    pub polling_interval_secs: u64,
    pub riot_rate_limit_per_second: NonZeroU32,
    pub riot_rate_limit_long: NonZeroU32,
    pub riot_rate_limit_long_window_secs: u64,
    pub riot_rate_limit_policy: LimitPolicy,
    pub riot_request_timeout_secs: u64,
    pub recent_match_count: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        const DEFAULT_POLLING_INTERVAL_SECS: u64 = 60;
        const DEFAULT_RIOT_RATE_LIMIT_PER_SECOND: NonZeroU32 = nonzero!(20_u32);
        const DEFAULT_RIOT_RATE_LIMIT_LONG: NonZeroU32 = nonzero!(100_u32);
        const DEFAULT_RIOT_RATE_LIMIT_LONG_WINDOW_SECS: u64 = 120;
        const DEFAULT_RIOT_REQUEST_TIMEOUT_SECS: u64 = 10;
        const DEFAULT_RECENT_MATCH_COUNT: u32 = 20;

        let riot_api_key = var("RIOT_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::Config("RIOT_API_KEY must be set".into()))?;

        let database_url = var("DATABASE_URL").unwrap_or_else(|| "sqlite:riftscout.db".into());

        let polling_interval_secs = parsed(&var, "POLLING_INTERVAL_SECS")
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_POLLING_INTERVAL_SECS);

        let riot_rate_limit_per_second = parsed(&var, "RIOT_RATE_LIMIT_PER_SECOND")
            .and_then(NonZeroU32::new)
            .unwrap_or(DEFAULT_RIOT_RATE_LIMIT_PER_SECOND);

        let riot_rate_limit_long = parsed(&var, "RIOT_RATE_LIMIT_LONG")
            .and_then(NonZeroU32::new)
            .unwrap_or(DEFAULT_RIOT_RATE_LIMIT_LONG);

        let riot_rate_limit_long_window_secs = parsed(&var, "RIOT_RATE_LIMIT_LONG_WINDOW_SECS")
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_RIOT_RATE_LIMIT_LONG_WINDOW_SECS);

        let riot_rate_limit_policy = match var("RIOT_RATE_LIMIT_POLICY") {
            Some(raw) => raw.parse()?,
            None => LimitPolicy::default(),
        };

        let riot_request_timeout_secs = parsed(&var, "RIOT_REQUEST_TIMEOUT_SECS")
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_RIOT_REQUEST_TIMEOUT_SECS);

        let recent_match_count = parsed(&var, "RECENT_MATCH_COUNT")
            .filter(|count| (1..=100).contains(count))
            .unwrap_or(DEFAULT_RECENT_MATCH_COUNT);

        Ok(Self {
            riot_api_key,
            database_url,
            polling_interval_secs,
            riot_rate_limit_per_second,
            riot_rate_limit_long,
            riot_rate_limit_long_window_secs,
            riot_rate_limit_policy,
            riot_request_timeout_secs,
            recent_match_count,
        })
    }

    pub fn short_window(&self) -> WindowLimit {
        WindowLimit::new(self.riot_rate_limit_per_second, Duration::from_secs(1))
    }

    pub fn long_window(&self) -> WindowLimit {
        WindowLimit::new(
            self.riot_rate_limit_long,
            Duration::from_secs(self.riot_rate_limit_long_window_secs),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.riot_request_timeout_secs)
    }
}

fn parsed<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    var(key).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, AppError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn api_key_is_required() {
        assert!(matches!(config_from(&[]), Err(AppError::Config(_))));
        assert!(matches!(
            config_from(&[("RIOT_API_KEY", "  ")]),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn defaults_apply() {
        let config = config_from(&[("RIOT_API_KEY", "RGAPI-test")]).unwrap();

        assert_eq!(config.database_url, "sqlite:riftscout.db");
        assert_eq!(config.polling_interval_secs, 60);
        assert_eq!(config.riot_rate_limit_per_second.get(), 20);
        assert_eq!(config.riot_rate_limit_long.get(), 100);
        assert_eq!(config.riot_rate_limit_long_window_secs, 120);
        assert_eq!(config.riot_rate_limit_policy, LimitPolicy::Reject);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.recent_match_count, 20);
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        let config = config_from(&[
            ("RIOT_API_KEY", "RGAPI-test"),
            ("RIOT_RATE_LIMIT_PER_SECOND", "0"),
            ("POLLING_INTERVAL_SECS", "soon"),
            ("RECENT_MATCH_COUNT", "500"),
        ])
        .unwrap();

        assert_eq!(config.riot_rate_limit_per_second.get(), 20);
        assert_eq!(config.polling_interval_secs, 60);
        assert_eq!(config.recent_match_count, 20);
    }

    #[test]
    fn overrides_are_read() {
        let config = config_from(&[
            ("RIOT_API_KEY", "RGAPI-test"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("RIOT_RATE_LIMIT_PER_SECOND", "5"),
            ("RIOT_RATE_LIMIT_LONG", "50"),
            ("RIOT_RATE_LIMIT_LONG_WINDOW_SECS", "600"),
            ("RIOT_RATE_LIMIT_POLICY", "wait"),
        ])
        .unwrap();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.short_window().requests.get(), 5);
        assert_eq!(config.long_window().window, Duration::from_secs(600));
        assert_eq!(config.riot_rate_limit_policy, LimitPolicy::Wait);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let res = config_from(&[
            ("RIOT_API_KEY", "RGAPI-test"),
            ("RIOT_RATE_LIMIT_POLICY", "sometimes"),
        ]);

        assert!(matches!(res, Err(AppError::Config(_))));
    }
}
