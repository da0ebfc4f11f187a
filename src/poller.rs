use std::time::Duration;

use futures::{StreamExt, stream};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{Span, debug, error, info, instrument, warn};

use crate::db::Player;
use crate::error::AppError;
use crate::manager::DataManager;
use crate::outcome::Outcome;

/// Players refreshed at the same time within one cycle.
const PLAYER_CONCURRENCY: usize = 4;

/// Refreshes tracked players forever, one cycle per `interval_secs`.
pub async fn start_polling(manager: DataManager, interval_secs: u64, match_count: u32) {
    let mut interval = interval(Duration::from_secs(interval_secs));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(interval_secs, "🔄 Refresher started");

    loop {
        interval.tick().await;

        if let Err(e) = poll_players(&manager, match_count).await {
            error!(error = ?e, "🔄 ❌ Polling cycle failed");
        }
    }
}

/// Runs one refresh cycle and returns how many players were refreshed
/// without error.
#[instrument(skip_all, fields(player_count))]
pub async fn poll_players(manager: &DataManager, match_count: u32) -> Result<usize, AppError> {
    let players = manager.tracked_players().await?;

    if players.is_empty() {
        debug!("🔄 No players tracked, skipping poll cycle");
        return Ok(0);
    }

    Span::current().record("player_count", players.len());
    info!(count = players.len(), "🔄 Polling {} player(s)", players.len());

    let refreshed = stream::iter(players)
        .map(|player| async move {
            match refresh_player(manager, &player, match_count).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(
                        error = ?e,
                        player_id = player.id,
                        riot_id = %player.riot_id(),
                        "🔄 ⚠️ Failed to refresh player"
                    );
                    false
                }
            }
        })
        .buffer_unordered(PLAYER_CONCURRENCY)
        .filter(|ok| futures::future::ready(*ok))
        .count()
        .await;

    Ok(refreshed)
}

#[instrument(
    skip(manager, player),
    fields(
        player_id = player.id,
        riot_id = %player.riot_id(),
        platform = %player.platform
    )
)]
async fn refresh_player(
    manager: &DataManager,
    player: &Player,
    match_count: u32,
) -> Result<(), AppError> {
    let platform = player.platform()?;

    match manager.refresh_ranks(&player.puuid, platform).await? {
        Outcome::Found(ranks) => debug!(queues = ranks.len(), "🔄 Ranks refreshed"),
        Outcome::NotFound => debug!("🔄 No league entries"),
        Outcome::RateLimited { retry_after } => {
            debug!(?retry_after, "🔄 Rate limited, ranks deferred to next cycle");
        }
    }

    match manager
        .fetch_recent_matches(&player.puuid, platform, match_count)
        .await?
    {
        Outcome::Found(report) if report.is_complete() => {
            debug!(stored = report.stored.len(), "🔄 Matches up to date");
        }
        Outcome::Found(report) => info!(
            stored = report.stored.len(),
            not_found = report.not_found.len(),
            rate_limited = report.rate_limited.len(),
            failed = report.failed.len(),
            "🔄 Matches partially refreshed"
        ),
        Outcome::NotFound => debug!("🔄 No match history"),
        Outcome::RateLimited { retry_after } => {
            debug!(?retry_after, "🔄 Rate limited, matches deferred to next cycle");
        }
    }

    Ok(())
}
