//! Client-side mirror of the Riot API application rate limits.
//!
//! Riot enforces two rolling windows at once (e.g. 20 requests per second and
//! 100 requests per two minutes). Each window keeps the instants of the
//! permits it granted; a permit is granted only when both windows hold fewer
//! than their budget over the last window length.

use std::collections::VecDeque;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

use crate::error::AppError;

/// `requests` per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLimit {
    pub requests: NonZeroU32,
    pub window: Duration,
}

impl WindowLimit {
    pub fn new(requests: NonZeroU32, window: Duration) -> Self {
        Self { requests, window }
    }
}

/// What to do when no permit is available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LimitPolicy {
    /// Report exhaustion to the caller.
    #[default]
    Reject,
    /// Sleep until both windows have budget again.
    Wait,
}

impl FromStr for LimitPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "wait" => Ok(Self::Wait),
            other => Err(AppError::Config(format!(
                "unknown rate limit policy `{other}` (expected `reject` or `wait`)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permit {
    Granted,
    Denied { retry_after: Duration },
}

impl Permit {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Grant log of one rolling window, oldest first.
#[derive(Debug)]
struct SlidingWindow {
    limit: WindowLimit,
    grants: VecDeque<Instant>,
}

impl SlidingWindow {
    fn new(limit: WindowLimit) -> Result<Self, AppError> {
        if limit.window.is_zero() {
            return Err(AppError::Config(format!(
                "rate limit window must be longer than zero ({} requests per {:?})",
                limit.requests, limit.window
            )));
        }

        Ok(Self {
            limit,
            grants: VecDeque::with_capacity(limit.requests.get() as usize),
        })
    }

    /// Time until this window can grant again, zero when it can now.
    fn wait_time(&mut self, now: Instant) -> Duration {
        while self
            .grants
            .front()
            .is_some_and(|granted| now.duration_since(*granted) >= self.limit.window)
        {
            self.grants.pop_front();
        }

        if self.grants.len() < self.limit.requests.get() as usize {
            return Duration::ZERO;
        }

        // Full: the next slot frees when the oldest grant leaves the window.
        self.grants
            .front()
            .map_or(Duration::ZERO, |oldest| {
                (*oldest + self.limit.window).saturating_duration_since(now)
            })
    }

    fn record(&mut self, now: Instant) {
        self.grants.push_back(now);
    }
}

#[derive(Debug)]
struct Windows {
    short: SlidingWindow,
    long: SlidingWindow,
}

#[derive(Debug)]
pub struct RiotRateLimiter {
    /// Both windows are read and written under this lock so a permit is one decision.
    windows: Mutex<Windows>,
}

impl RiotRateLimiter {
    pub fn new(short: WindowLimit, long: WindowLimit) -> Result<Self, AppError> {
        Ok(Self {
            windows: Mutex::new(Windows {
                short: SlidingWindow::new(short)?,
                long: SlidingWindow::new(long)?,
            }),
        })
    }

    /// Takes a permit if both windows allow it, without waiting.
    ///
    /// A permit is recorded in both windows or in neither. On a denial
    /// `retry_after` is the time until the oldest grant of the exhausted
    /// window (the later one when both are full) leaves it.
    pub async fn try_acquire(&self) -> Permit {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();

        let retry_after = windows
            .short
            .wait_time(now)
            .max(windows.long.wait_time(now));

        if !retry_after.is_zero() {
            return Permit::Denied { retry_after };
        }

        windows.short.record(now);
        windows.long.record(now);
        Permit::Granted
    }

    /// Waits until a permit is available in both windows and takes it.
    pub async fn until_ready(&self) {
        while let Permit::Denied { retry_after } = self.try_acquire().await {
            sleep(retry_after).await;
        }
    }
}
