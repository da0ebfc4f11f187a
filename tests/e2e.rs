use riftscout::config::Config;
use riftscout::db::{RankQueue, Repository, run_migrations};
use riftscout::riot::{Platform, RiotClient};
use riftscout::{DataManager, Outcome};
use sqlx::sqlite::SqlitePoolOptions;

const PUUID: &str = "jG0VKFsMuF2aWaQoiDxJ1brhlXyMY7kj4HfIAucciWH_9YVdWVpbQDIRhJWQQGhP89qCrp5EwLxl3Q";

async fn live_manager() -> DataManager {
    let config = Config::from_env().expect("RIOT_API_KEY not set");

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();

    DataManager::new(Repository::new(pool), RiotClient::from_config(&config).unwrap())
}

#[tokio::test]
#[ignore = "API Key required"]
async fn find_player_by_riot_id_returns_expected_puuid() {
    let manager = live_manager().await;

    let player = manager
        .find_player("Le Conservateur", "3012", Platform::EUW1)
        .await
        .unwrap()
        .found()
        .expect("account should exist");

    assert_eq!(player.puuid, PUUID);
    assert!(player.summoner_level.is_some());
}

#[tokio::test]
#[ignore = "API Key required"]
async fn recent_matches_are_stored_and_served_from_store() {
    let manager = live_manager().await;

    let report = manager
        .fetch_recent_matches(PUUID, Platform::EUW1, 2)
        .await
        .unwrap()
        .found()
        .expect("match history should exist");

    for record in &report.stored {
        assert!(record.participant(PUUID).is_some());
    }

    let stored = manager.player_matches(PUUID, 10).await.unwrap();
    assert_eq!(stored.len(), report.stored.len());
}

#[tokio::test]
#[ignore = "API Key required"]
async fn rank_lookup_does_not_error() {
    let manager = live_manager().await;

    let outcome = manager
        .get_rank(PUUID, Platform::EUW1, RankQueue::SoloDuo)
        .await
        .unwrap();

    if let Outcome::Found(rank) = outcome {
        assert!(!rank.tier.is_empty());
    }
}
