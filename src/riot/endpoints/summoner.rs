use crate::error::AppError;
use crate::outcome::Outcome;
use crate::riot::client::RiotClient;
use crate::riot::region::Platform;
use crate::riot::types::SummonerDto;

impl RiotClient {
    /// Get summoner by PUUID (account level and profile icon)
    /// Uses platform routing (euw1, na1, kr, etc.)
    pub async fn get_summoner_by_puuid(
        &self,
        platform: Platform,
        puuid: &str,
    ) -> Result<Outcome<SummonerDto>, AppError> {
        let url = format!(
            "{}/lol/summoner/v4/summoners/by-puuid/{}",
            self.platform_url(platform),
            urlencoding::encode(puuid)
        );

        self.get(&url).await
    }
}
