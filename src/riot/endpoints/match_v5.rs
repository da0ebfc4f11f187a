use crate::error::AppError;
use crate::outcome::Outcome;
use crate::riot::client::RiotClient;
use crate::riot::match_id::MatchId;
use crate::riot::region::Region;
use crate::riot::types::MatchDto;

impl RiotClient {
    /// Get list of match IDs by PUUID, most recent first
    /// Uses regional routing (americas, europe, asia, sea)
    pub async fn get_match_ids(
        &self,
        region: Region,
        puuid: &str,
        start: u32,
        count: u32,
    ) -> Result<Outcome<Vec<String>>, AppError> {
        let url = format!(
            "{}/lol/match/v5/matches/by-puuid/{}/ids?start={}&count={}",
            self.region_url(region),
            urlencoding::encode(puuid),
            start,
            count
        );

        self.get(&url).await
    }

    /// Get match details by match ID
    /// The regional host is derived from the match ID prefix
    pub async fn get_match(&self, match_id: &MatchId) -> Result<Outcome<MatchDto>, AppError> {
        let url = format!(
            "{}/lol/match/v5/matches/{}",
            self.region_url(match_id.region()),
            match_id
        );

        self.get(&url).await
    }
}
