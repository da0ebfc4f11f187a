//! Store-first access to Riot data.
//!
//! Every read goes to the database first. On a miss the entity is fetched
//! through the rate-limited client, transformed, persisted and returned.
//! Concurrent misses for the same key are collapsed into one upstream call.

use std::collections::HashMap;
use std::sync::Arc;

use futures::{StreamExt, stream};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{Span, debug, info, instrument, warn};

use crate::db::{MatchRecord, Player, RankQueue, RankSnapshot, Repository};
use crate::error::AppError;
use crate::outcome::Outcome;
use crate::riot::{AccountDto, MatchId, Platform, RiotClient};
use crate::transform;
use crate::validate;

/// Match detail requests kept in flight by a batch.
const MATCH_FETCH_CONCURRENCY: usize = 4;

/// Per-key locks for fetches currently running.
#[derive(Debug, Default)]
struct InFlight {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl InFlight {
    async fn lock(&self, key: String) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Entries only referenced by the map have no holder or waiter left.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(key).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// What a batch fetch produced, one bucket per outcome.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Matches available in the store, in the order Riot listed them.
    pub stored: Vec<MatchRecord>,
    pub not_found: Vec<String>,
    pub rate_limited: Vec<String>,
    pub failed: Vec<(String, AppError)>,
}

impl BatchReport {
    pub fn requested(&self) -> usize {
        self.stored.len() + self.not_found.len() + self.rate_limited.len() + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.stored.len() == self.requested()
    }
}

#[derive(Debug, Clone)]
pub struct DataManager {
    repo: Repository,
    riot: RiotClient,
    in_flight: Arc<InFlight>,
}

impl DataManager {
    pub fn new(repo: Repository, riot: RiotClient) -> Self {
        Self {
            repo,
            riot,
            in_flight: Arc::new(InFlight::default()),
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn riot(&self) -> &RiotClient {
        &self.riot
    }

    // === Players ===

    /// Player by PUUID, fetched from the account and summoner endpoints on a miss.
    #[instrument(skip(self))]
    pub async fn get_player(
        &self,
        puuid: &str,
        platform: Platform,
    ) -> Result<Outcome<Player>, AppError> {
        validate::puuid(puuid)?;

        if let Some(player) = self.repo.get_player_by_puuid(puuid).await? {
            debug!("👤 Store hit");
            return Ok(Outcome::Found(player));
        }

        let _guard = self.in_flight.lock(format!("player:{puuid}")).await;
        if let Some(player) = self.repo.get_player_by_puuid(puuid).await? {
            return Ok(Outcome::Found(player));
        }

        self.fetch_player(puuid, platform).await
    }

    /// Player by Riot ID. The stored lookup ignores case.
    #[instrument(skip(self))]
    pub async fn find_player(
        &self,
        game_name: &str,
        tag_line: &str,
        platform: Platform,
    ) -> Result<Outcome<Player>, AppError> {
        validate::riot_id(game_name, tag_line)?;

        if let Some(player) = self.repo.get_player_by_riot_id(game_name, tag_line).await? {
            debug!("👤 Store hit");
            return Ok(Outcome::Found(player));
        }

        let key = format!(
            "riot-id:{}#{}",
            game_name.to_lowercase(),
            tag_line.to_lowercase()
        );
        let _guard = self.in_flight.lock(key).await;
        if let Some(player) = self.repo.get_player_by_riot_id(game_name, tag_line).await? {
            return Ok(Outcome::Found(player));
        }

        let account = match self
            .riot
            .get_account_by_riot_id(platform.to_region(), game_name, tag_line)
            .await?
            .into_found()
        {
            Ok(account) => account,
            Err(outcome) => return Ok(outcome),
        };

        self.store_account(&account, platform, Some((game_name, tag_line)))
            .await
    }

    /// Re-fetches a player even when stored, updating Riot ID, level and icon.
    #[instrument(skip(self))]
    pub async fn refresh_player(
        &self,
        puuid: &str,
        platform: Platform,
    ) -> Result<Outcome<Player>, AppError> {
        validate::puuid(puuid)?;

        let _guard = self.in_flight.lock(format!("player:{puuid}")).await;
        self.fetch_player(puuid, platform).await
    }

    async fn fetch_player(
        &self,
        puuid: &str,
        platform: Platform,
    ) -> Result<Outcome<Player>, AppError> {
        let account = match self
            .riot
            .get_account_by_puuid(platform.to_region(), puuid)
            .await?
            .into_found()
        {
            Ok(account) => account,
            Err(outcome) => return Ok(outcome),
        };

        let fallback = self
            .repo
            .get_player_by_puuid(puuid)
            .await?
            .map(|p| (p.game_name, p.tag_line));

        self.store_account(
            &account,
            platform,
            fallback.as_ref().map(|(name, tag)| (name.as_str(), tag.as_str())),
        )
        .await
    }

    async fn store_account(
        &self,
        account: &AccountDto,
        platform: Platform,
        fallback_riot_id: Option<(&str, &str)>,
    ) -> Result<Outcome<Player>, AppError> {
        let summoner = match self
            .riot
            .get_summoner_by_puuid(platform, &account.puuid)
            .await?
        {
            Outcome::Found(summoner) => Some(summoner),
            Outcome::NotFound => {
                debug!(%platform, "👤 No summoner on this platform");
                None
            }
            Outcome::RateLimited { retry_after } => {
                return Ok(Outcome::RateLimited { retry_after });
            }
        };

        let new_player = transform::player(account, summoner.as_ref(), platform, fallback_riot_id);
        let player = self.repo.upsert_player(&new_player).await?;

        info!(
            player_id = player.id,
            riot_id = %player.riot_id(),
            "👤 ✅ Player stored"
        );
        Ok(Outcome::Found(player))
    }

    /// Resolves a Riot ID and marks the player for periodic refresh.
    #[instrument(skip(self))]
    pub async fn track_player(
        &self,
        game_name: &str,
        tag_line: &str,
        platform: Platform,
    ) -> Result<Outcome<Player>, AppError> {
        let player = match self.find_player(game_name, tag_line, platform).await?.into_found() {
            Ok(player) => player,
            Err(outcome) => return Ok(outcome),
        };

        if !player.is_tracked {
            self.repo.set_player_tracked(&player.puuid, true).await?;
            info!(riot_id = %player.riot_id(), "👤 Player now tracked");
        }

        Ok(self
            .repo
            .get_player_by_puuid(&player.puuid)
            .await?
            .map_or(Outcome::NotFound, Outcome::Found))
    }

    /// Stops refreshing a player. Its stored data is kept.
    pub async fn untrack_player(&self, puuid: &str) -> Result<bool, AppError> {
        validate::puuid(puuid)?;
        self.repo.set_player_tracked(puuid, false).await
    }

    pub async fn set_analyzed(&self, puuid: &str, analyzed: bool) -> Result<bool, AppError> {
        validate::puuid(puuid)?;
        self.repo.set_player_analyzed(puuid, analyzed).await
    }

    pub async fn tracked_players(&self) -> Result<Vec<Player>, AppError> {
        self.repo.get_tracked_players().await
    }

    // === Matches ===

    /// Match by ID. Malformed IDs are rejected before any lookup.
    #[instrument(skip(self))]
    pub async fn get_match(&self, match_id: &str) -> Result<Outcome<MatchRecord>, AppError> {
        let match_id: MatchId = match_id.parse()?;

        if let Some(record) = self.repo.get_match(match_id.as_str()).await? {
            debug!("⚔️ Store hit");
            return Ok(Outcome::Found(record));
        }

        let _guard = self.in_flight.lock(format!("match:{match_id}")).await;
        if let Some(record) = self.repo.get_match(match_id.as_str()).await? {
            return Ok(Outcome::Found(record));
        }

        let dto = match self.riot.get_match(&match_id).await?.into_found() {
            Ok(dto) => dto,
            Err(outcome) => return Ok(outcome),
        };

        self.repo
            .save_match(&transform::match_record(&match_id, &dto))
            .await?;

        // The stored row is what every later read returns.
        let Some(record) = self.repo.get_match(match_id.as_str()).await? else {
            return Ok(Outcome::NotFound);
        };

        info!(
            queue_id = record.queue_id,
            ranked = record.is_ranked(),
            patch = record.patch_version(),
            participants = record.participants.len(),
            "⚔️ ✅ Match stored"
        );
        Ok(Outcome::Found(record))
    }

    /// Lists the player's latest `count` matches and makes sure each is stored.
    ///
    /// A failure on one match does not stop the others; see [`BatchReport`].
    #[instrument(skip(self), fields(stored))]
    pub async fn fetch_recent_matches(
        &self,
        puuid: &str,
        platform: Platform,
        count: u32,
    ) -> Result<Outcome<BatchReport>, AppError> {
        validate::puuid(puuid)?;
        validate::match_count(count)?;

        let match_ids = match self
            .riot
            .get_match_ids(platform.to_region(), puuid, 0, count)
            .await?
            .into_found()
        {
            Ok(ids) => ids,
            Err(outcome) => return Ok(outcome),
        };

        let results: Vec<(String, Result<Outcome<MatchRecord>, AppError>)> =
            stream::iter(match_ids)
                .map(|match_id| async move {
                    let result = self.get_match(&match_id).await;
                    (match_id, result)
                })
                .buffered(MATCH_FETCH_CONCURRENCY)
                .collect()
                .await;

        let mut report = BatchReport::default();
        for (match_id, result) in results {
            match result {
                Ok(Outcome::Found(record)) => report.stored.push(record),
                Ok(Outcome::NotFound) => report.not_found.push(match_id),
                Ok(Outcome::RateLimited { .. }) => report.rate_limited.push(match_id),
                Err(e) => {
                    warn!(error = ?e, match_id, "⚔️ ⚠️ Failed to fetch match");
                    report.failed.push((match_id, e));
                }
            }
        }

        Span::current().record("stored", report.stored.len());
        debug!(
            requested = report.requested(),
            not_found = report.not_found.len(),
            rate_limited = report.rate_limited.len(),
            failed = report.failed.len(),
            "⚔️ Batch finished"
        );
        Ok(Outcome::Found(report))
    }

    /// Stored matches for a player, newest first. Never calls Riot.
    pub async fn player_matches(
        &self,
        puuid: &str,
        limit: u32,
    ) -> Result<Vec<MatchRecord>, AppError> {
        validate::puuid(puuid)?;

        let mut matches = Vec::new();
        for match_id in self.repo.get_player_match_ids(puuid, limit).await? {
            if let Some(record) = self.repo.get_match(&match_id).await? {
                matches.push(record);
            }
        }
        Ok(matches)
    }

    // === Ranks ===

    /// Latest known standing in a queue.
    ///
    /// Unranked queues are not stored, so asking for one always goes to Riot
    /// and answers `NotFound`.
    #[instrument(skip(self))]
    pub async fn get_rank(
        &self,
        puuid: &str,
        platform: Platform,
        queue: RankQueue,
    ) -> Result<Outcome<RankSnapshot>, AppError> {
        validate::puuid(puuid)?;

        if let Some(rank) = self.repo.latest_rank(puuid, queue).await? {
            debug!("🏆 Store hit");
            return Ok(Outcome::Found(rank));
        }

        let _guard = self.in_flight.lock(format!("rank:{puuid}")).await;
        if let Some(rank) = self.repo.latest_rank(puuid, queue).await? {
            return Ok(Outcome::Found(rank));
        }

        let current = match self.fetch_ranks(puuid, platform).await?.into_found() {
            Ok(current) => current,
            Err(outcome) => return Ok(outcome),
        };

        Ok(current
            .into_iter()
            .find(|rank| rank.queue_type == queue.as_str())
            .map_or(Outcome::NotFound, Outcome::Found))
    }

    /// Fetches current standings and appends a snapshot for each changed queue.
    #[instrument(skip(self))]
    pub async fn refresh_ranks(
        &self,
        puuid: &str,
        platform: Platform,
    ) -> Result<Outcome<Vec<RankSnapshot>>, AppError> {
        validate::puuid(puuid)?;

        let _guard = self.in_flight.lock(format!("rank:{puuid}")).await;
        self.fetch_ranks(puuid, platform).await
    }

    async fn fetch_ranks(
        &self,
        puuid: &str,
        platform: Platform,
    ) -> Result<Outcome<Vec<RankSnapshot>>, AppError> {
        let entries = match self
            .riot
            .get_league_entries_by_puuid(platform, puuid)
            .await?
            .into_found()
        {
            Ok(entries) => entries,
            Err(outcome) => return Ok(outcome),
        };

        let mut current = Vec::new();
        for rank in transform::ranks(puuid, &entries) {
            let snapshot = self.repo.record_rank(&rank).await?;
            debug!(
                queue = %snapshot.queue_type,
                tier = %snapshot.tier,
                division = %snapshot.division,
                league_points = snapshot.league_points,
                games = snapshot.games_played(),
                winrate = ?snapshot.winrate(),
                "🏆 Standing"
            );
            current.push(snapshot);
        }

        debug!(queues = current.len(), "🏆 Ranks recorded");
        Ok(Outcome::Found(current))
    }

    pub async fn rank_history(
        &self,
        puuid: &str,
        queue: RankQueue,
        limit: u32,
    ) -> Result<Vec<RankSnapshot>, AppError> {
        validate::puuid(puuid)?;
        self.repo.rank_history(puuid, queue, limit).await
    }
}
