use riftscout::config::Config;
use riftscout::db::{self, Repository};
use riftscout::error::AppError;
use riftscout::riot::RiotClient;
use riftscout::{DataManager, logging, poller};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Loads .env first, so LOG_* settings there reach the logger too.
    let config = Config::from_env()?;
    logging::init()?;

    info!("🐙 Starting...");

    let pool = db::connect(&config.database_url).await?;

    let riot = RiotClient::from_config(&config)?;
    tokio::spawn(riot.metrics().log_loop());

    let manager = DataManager::new(Repository::new(pool.clone()), riot);

    tokio::select! {
        _ = poller::start_polling(
            manager,
            config.polling_interval_secs,
            config.recent_match_count,
        ) => {}
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!(error = ?e, "Failed to listen for shutdown signal");
            }
            info!("👋 Shutting down");
        }
    }

    pool.close().await;
    Ok(())
}
