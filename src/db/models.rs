use std::fmt;
use std::str::FromStr;

use sqlx::FromRow;

use crate::error::AppError;
use crate::riot::Platform;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Player {
    pub id: i64,
    pub puuid: String,
    pub game_name: String,
    pub tag_line: String,
    pub platform: String,
    pub summoner_level: Option<i64>,
    pub profile_icon_id: Option<i32>,
    pub is_tracked: bool,
    pub is_analyzed: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Player {
    pub fn riot_id(&self) -> String {
        format!("{}#{}", self.game_name, self.tag_line)
    }

    pub fn platform(&self) -> Result<Platform, AppError> {
        self.platform.parse()
    }
}

/// Player data as produced from Riot responses, before it gets a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlayer {
    pub puuid: String,
    pub game_name: String,
    pub tag_line: String,
    pub platform: Platform,
    pub summoner_level: Option<i64>,
    pub profile_icon_id: Option<i32>,
}

/// A stored game. Rows never change once written.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct MatchRecord {
    pub match_id: String,
    pub platform_id: String,
    pub queue_id: i32,
    pub game_mode: String,
    pub game_version: String,
    pub map_id: i32,
    pub game_creation: i64,
    /// Seconds.
    pub game_duration: i64,
    #[sqlx(skip)]
    pub participants: Vec<ParticipantRecord>,
}

impl MatchRecord {
    pub fn participant(&self, puuid: &str) -> Option<&ParticipantRecord> {
        self.participants.iter().find(|p| p.puuid == puuid)
    }

    /// Queue IDs 420 (Solo/Duo) and 440 (Flex)
    pub fn is_ranked(&self) -> bool {
        matches!(self.queue_id, 420 | 440)
    }

    /// Short patch version (e.g., "14.24" from "14.24.632.8043")
    pub fn patch_version(&self) -> &str {
        self.game_version
            .match_indices('.')
            .nth(1)
            .map(|(idx, _)| &self.game_version[..idx])
            .unwrap_or(&self.game_version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ParticipantRecord {
    pub match_id: String,
    pub puuid: String,
    pub participant_id: i32,
    pub team_id: i32,
    pub champion_id: i32,
    pub champion_name: String,
    pub team_position: String,
    pub summoner_level: i64,
    pub kills: i32,
    pub deaths: i32,
    pub assists: i32,
    pub cs: i32,
    pub gold_earned: i64,
    pub damage_to_champions: i64,
    pub vision_score: i32,
    pub win: bool,
    pub riot_id_game_name: String,
    pub riot_id_tagline: String,
}

/// Ranked queues a standing is recorded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RankQueue {
    SoloDuo,
    Flex,
}

impl RankQueue {
    pub const ALL: [RankQueue; 2] = [RankQueue::SoloDuo, RankQueue::Flex];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SoloDuo => "RANKED_SOLO_5x5",
            Self::Flex => "RANKED_FLEX_SR",
        }
    }
}

impl FromStr for RankQueue {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RANKED_SOLO_5x5" => Ok(Self::SoloDuo),
            "RANKED_FLEX_SR" => Ok(Self::Flex),
            other => Err(AppError::Validation(format!("unknown ranked queue `{other}`"))),
        }
    }
}

impl fmt::Display for RankQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ranked standing observed from League-v4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRank {
    pub puuid: String,
    pub queue: RankQueue,
    pub tier: String,
    pub division: String,
    pub league_points: i32,
    pub wins: i32,
    pub losses: i32,
    pub hot_streak: bool,
}

/// A stored standing. A new snapshot is written on every observed change.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RankSnapshot {
    pub id: i64,
    pub puuid: String,
    pub queue_type: String,
    pub tier: String,
    pub division: String,
    pub league_points: i32,
    pub wins: i32,
    pub losses: i32,
    pub hot_streak: bool,
    pub recorded_at: i64,
}

impl RankSnapshot {
    pub fn same_standing(&self, rank: &NewRank) -> bool {
        self.queue_type == rank.queue.as_str()
            && self.tier == rank.tier
            && self.division == rank.division
            && self.league_points == rank.league_points
            && self.wins == rank.wins
            && self.losses == rank.losses
            && self.hot_streak == rank.hot_streak
    }

    pub fn games_played(&self) -> i32 {
        self.wins + self.losses
    }

    pub fn winrate(&self) -> Option<f64> {
        match self.games_played() {
            0 => None,
            games => Some(self.wins as f64 / games as f64),
        }
    }
}
