//! Riot Games API access: routing, rate limiting and typed endpoints.

mod endpoints;

pub mod client;
pub mod limiter;
pub mod match_id;
pub mod metrics;
pub mod region;
pub mod types;

pub use client::RiotClient;
pub use limiter::{LimitPolicy, Permit, RiotRateLimiter, WindowLimit};
pub use match_id::MatchId;
pub use metrics::RequestMetrics;
pub use region::{Platform, Region};
pub use types::{AccountDto, LeagueEntryDto, MatchDto, ParticipantDto, SummonerDto};
