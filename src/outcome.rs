//! Soft results of a data request.
//!
//! Missing upstream entities and exhausted rate-limit budget are expected
//! situations, so they are variants here instead of [`AppError`](crate::error::AppError)s.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The entity, either read from the store or freshly fetched.
    Found(T),
    /// The entity does not exist upstream.
    NotFound,
    /// No request budget left. `retry_after` is a hint when one is known.
    RateLimited { retry_after: Option<Duration> },
}

impl<T> Outcome<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Found(value) => Outcome::Found(f(value)),
            Self::NotFound => Outcome::NotFound,
            Self::RateLimited { retry_after } => Outcome::RateLimited { retry_after },
        }
    }

    /// Splits the found value from the other variants, re-typing them so they
    /// can be returned as-is from a caller producing a different entity.
    pub fn into_found<U>(self) -> Result<T, Outcome<U>> {
        match self {
            Self::Found(value) => Ok(value),
            Self::NotFound => Err(Outcome::NotFound),
            Self::RateLimited { retry_after } => Err(Outcome::RateLimited { retry_after }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_found_keeps_retry_hint() {
        let limited: Outcome<u8> = Outcome::RateLimited {
            retry_after: Some(Duration::from_secs(3)),
        };

        let rest: Outcome<String> = limited.into_found().unwrap_err();
        assert_eq!(
            rest,
            Outcome::RateLimited {
                retry_after: Some(Duration::from_secs(3))
            }
        );
    }

    #[test]
    fn map_only_touches_found() {
        assert_eq!(Outcome::Found(2).map(|v| v * 2), Outcome::Found(4));
        assert_eq!(Outcome::<u8>::NotFound.map(|v| v * 2), Outcome::NotFound);
    }
}
