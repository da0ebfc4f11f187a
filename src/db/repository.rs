use sqlx::SqlitePool;

use super::models::{MatchRecord, NewPlayer, NewRank, ParticipantRecord, Player, RankQueue, RankSnapshot};
use crate::error::AppError;

const PLAYER_COLUMN_NAMES: [&str; 11] = [
    "id",
    "puuid",
    "game_name",
    "tag_line",
    "platform",
    "summoner_level",
    "profile_icon_id",
    "is_tracked",
    "is_analyzed",
    "created_at",
    "updated_at",
];

const MATCH_COLUMNS: &str = "match_id, platform_id, queue_id, game_mode, game_version, map_id, \
     game_creation, game_duration";

const PARTICIPANT_COLUMNS: &str = "match_id, puuid, participant_id, team_id, champion_id, \
     champion_name, team_position, summoner_level, kills, deaths, assists, cs, gold_earned, \
     damage_to_champions, vision_score, win, riot_id_game_name, riot_id_tagline";

const RANK_COLUMNS: &str = "id, puuid, queue_type, tier, division, league_points, wins, losses, \
     hot_streak, recorded_at";

fn player_columns(alias: Option<&str>) -> String {
    let prefix = alias.map(|a| format!("{a}.")).unwrap_or_default();
    PLAYER_COLUMN_NAMES
        .iter()
        .map(|col| format!("{prefix}{col}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Clone, Debug)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // === Player operations ===

    /// Inserts the player or refreshes its Riot-owned fields, keeping flags.
    pub async fn upsert_player(&self, player: &NewPlayer) -> Result<Player, AppError> {
        let columns = player_columns(None);
        let query = format!(
            r#"
            INSERT INTO players (puuid, game_name, tag_line, platform, summoner_level, profile_icon_id)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(puuid) DO UPDATE SET
                game_name = excluded.game_name,
                tag_line = excluded.tag_line,
                platform = excluded.platform,
                summoner_level = COALESCE(excluded.summoner_level, players.summoner_level),
                profile_icon_id = COALESCE(excluded.profile_icon_id, players.profile_icon_id),
                updated_at = unixepoch()
            RETURNING {columns}
            "#
        );

        let player = sqlx::query_as::<_, Player>(&query)
            .bind(&player.puuid)
            .bind(&player.game_name)
            .bind(&player.tag_line)
            .bind(player.platform.to_string())
            .bind(player.summoner_level)
            .bind(player.profile_icon_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(player)
    }

    pub async fn get_player_by_puuid(&self, puuid: &str) -> Result<Option<Player>, AppError> {
        let columns = player_columns(None);
        let player = sqlx::query_as::<_, Player>(&format!(
            "SELECT {columns} FROM players WHERE puuid = ?"
        ))
        .bind(puuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(player)
    }

    pub async fn get_player_by_riot_id(
        &self,
        game_name: &str,
        tag_line: &str,
    ) -> Result<Option<Player>, AppError> {
        let columns = player_columns(None);
        let player = sqlx::query_as::<_, Player>(&format!(
            "SELECT {columns} FROM players WHERE LOWER(game_name) = LOWER(?) AND LOWER(tag_line) = LOWER(?)"
        ))
        .bind(game_name)
        .bind(tag_line)
        .fetch_optional(&self.pool)
        .await?;
        Ok(player)
    }

    pub async fn get_tracked_players(&self) -> Result<Vec<Player>, AppError> {
        let columns = player_columns(Some("p"));
        let players = sqlx::query_as::<_, Player>(&format!(
            r#"
            SELECT {columns}
            FROM players p
            WHERE p.is_tracked = 1
            ORDER BY p.game_name ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(players)
    }

    /// Returns whether a player row was affected.
    pub async fn set_player_tracked(&self, puuid: &str, tracked: bool) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE players SET is_tracked = ?, updated_at = unixepoch() WHERE puuid = ?",
        )
        .bind(tracked)
        .bind(puuid)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns whether a player row was affected.
    pub async fn set_player_analyzed(&self, puuid: &str, analyzed: bool) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE players SET is_analyzed = ?, updated_at = unixepoch() WHERE puuid = ?",
        )
        .bind(analyzed)
        .bind(puuid)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_players(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM players")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // === Match operations ===

    pub async fn get_match(&self, match_id: &str) -> Result<Option<MatchRecord>, AppError> {
        let record = sqlx::query_as::<_, MatchRecord>(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE match_id = ?"
        ))
        .bind(match_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut record) = record else {
            return Ok(None);
        };

        record.participants = sqlx::query_as::<_, ParticipantRecord>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE match_id = ? ORDER BY participant_id ASC"
        ))
        .bind(match_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(record))
    }

    /// Stores a match with its participants in one transaction. A match that
    /// is already stored is left untouched.
    pub async fn save_match(&self, record: &MatchRecord) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(&format!(
            "INSERT INTO matches ({MATCH_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(match_id) DO NOTHING"
        ))
        .bind(&record.match_id)
        .bind(&record.platform_id)
        .bind(record.queue_id)
        .bind(&record.game_mode)
        .bind(&record.game_version)
        .bind(record.map_id)
        .bind(record.game_creation)
        .bind(record.game_duration)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            return Ok(());
        }

        for p in &record.participants {
            sqlx::query(&format!(
                "INSERT INTO participants ({PARTICIPANT_COLUMNS})
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(match_id, puuid) DO NOTHING"
            ))
            .bind(&p.match_id)
            .bind(&p.puuid)
            .bind(p.participant_id)
            .bind(p.team_id)
            .bind(p.champion_id)
            .bind(&p.champion_name)
            .bind(&p.team_position)
            .bind(p.summoner_level)
            .bind(p.kills)
            .bind(p.deaths)
            .bind(p.assists)
            .bind(p.cs)
            .bind(p.gold_earned)
            .bind(p.damage_to_champions)
            .bind(p.vision_score)
            .bind(p.win)
            .bind(&p.riot_id_game_name)
            .bind(&p.riot_id_tagline)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Stored match IDs the player took part in, newest first.
    pub async fn get_player_match_ids(
        &self,
        puuid: &str,
        limit: u32,
    ) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            r#"
            SELECT m.match_id
            FROM matches m
            INNER JOIN participants p ON m.match_id = p.match_id
            WHERE p.puuid = ?
            ORDER BY m.game_creation DESC
            LIMIT ?
            "#,
        )
        .bind(puuid)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    pub async fn count_matches(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM matches")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // === Rank operations ===

    pub async fn latest_rank(
        &self,
        puuid: &str,
        queue: RankQueue,
    ) -> Result<Option<RankSnapshot>, AppError> {
        let rank = sqlx::query_as::<_, RankSnapshot>(&format!(
            "SELECT {RANK_COLUMNS} FROM ranks WHERE puuid = ? AND queue_type = ? ORDER BY id DESC LIMIT 1"
        ))
        .bind(puuid)
        .bind(queue.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(rank)
    }

    /// Appends a snapshot unless the latest one for the queue already shows
    /// the same standing. Returns the snapshot now current.
    pub async fn record_rank(&self, rank: &NewRank) -> Result<RankSnapshot, AppError> {
        let mut tx = self.pool.begin().await?;

        let latest = sqlx::query_as::<_, RankSnapshot>(&format!(
            "SELECT {RANK_COLUMNS} FROM ranks WHERE puuid = ? AND queue_type = ? ORDER BY id DESC LIMIT 1"
        ))
        .bind(&rank.puuid)
        .bind(rank.queue.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(latest) = latest.filter(|l| l.same_standing(rank)) {
            tx.commit().await?;
            return Ok(latest);
        }

        let inserted = sqlx::query_as::<_, RankSnapshot>(&format!(
            r#"
            INSERT INTO ranks (puuid, queue_type, tier, division, league_points, wins, losses, hot_streak)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {RANK_COLUMNS}
            "#
        ))
        .bind(&rank.puuid)
        .bind(rank.queue.as_str())
        .bind(&rank.tier)
        .bind(&rank.division)
        .bind(rank.league_points)
        .bind(rank.wins)
        .bind(rank.losses)
        .bind(rank.hot_streak)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(inserted)
    }

    /// Snapshots for a queue, newest first.
    pub async fn rank_history(
        &self,
        puuid: &str,
        queue: RankQueue,
        limit: u32,
    ) -> Result<Vec<RankSnapshot>, AppError> {
        let ranks = sqlx::query_as::<_, RankSnapshot>(&format!(
            "SELECT {RANK_COLUMNS} FROM ranks WHERE puuid = ? AND queue_type = ? ORDER BY id DESC LIMIT ?"
        ))
        .bind(puuid)
        .bind(queue.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(ranks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use crate::riot::Platform;

    async fn repo() -> Repository {
        Repository::new(memory_pool().await)
    }

    fn new_player(puuid: &str, level: Option<i64>) -> NewPlayer {
        NewPlayer {
            puuid: puuid.into(),
            game_name: "Chalop".into(),
            tag_line: "3012".into(),
            platform: Platform::EUW1,
            summoner_level: level,
            profile_icon_id: Some(29),
        }
    }

    fn sample_match(match_id: &str, puuids: &[&str]) -> MatchRecord {
        MatchRecord {
            match_id: match_id.into(),
            platform_id: "EUW1".into(),
            queue_id: 420,
            game_mode: "CLASSIC".into(),
            game_version: "14.24.632.8043".into(),
            map_id: 11,
            game_creation: 1_700_000_000_000,
            game_duration: 1_845,
            participants: puuids
                .iter()
                .enumerate()
                .map(|(i, puuid)| ParticipantRecord {
                    match_id: match_id.into(),
                    puuid: puuid.to_string(),
                    participant_id: i as i32 + 1,
                    team_id: if i < 5 { 100 } else { 200 },
                    champion_id: 99,
                    champion_name: "Lux".into(),
                    team_position: "MIDDLE".into(),
                    summoner_level: 30,
                    kills: 5,
                    deaths: 2,
                    assists: 8,
                    cs: 210,
                    gold_earned: 12_400,
                    damage_to_champions: 23_000,
                    vision_score: 21,
                    win: i < 5,
                    riot_id_game_name: "Game".into(),
                    riot_id_tagline: "Tag".into(),
                })
                .collect(),
        }
    }

    fn solo_rank(league_points: i32) -> NewRank {
        NewRank {
            puuid: "abc".into(),
            queue: RankQueue::SoloDuo,
            tier: "GOLD".into(),
            division: "II".into(),
            league_points,
            wins: 10,
            losses: 8,
            hot_streak: false,
        }
    }

    #[tokio::test]
    async fn upsert_keeps_one_row_and_flags() {
        let repo = repo().await;

        let created = repo.upsert_player(&new_player("abc", Some(30))).await.unwrap();
        assert!(repo.set_player_tracked("abc", true).await.unwrap());

        let mut renamed = new_player("abc", None);
        renamed.game_name = "Renamed".into();
        let updated = repo.upsert_player(&renamed).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.game_name, "Renamed");
        assert_eq!(updated.summoner_level, Some(30));
        assert!(updated.is_tracked);
        assert_eq!(repo.count_players().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn player_platform_is_spelled_like_match_platforms() {
        let repo = repo().await;
        let player = repo.upsert_player(&new_player("abc", None)).await.unwrap();
        let record = sample_match("EUW1_1", &["abc"]);
        repo.save_match(&record).await.unwrap();

        let stored = repo.get_match("EUW1_1").await.unwrap().unwrap();
        assert_eq!(player.platform, "EUW1");
        assert_eq!(player.platform, stored.platform_id);
        assert_eq!(player.platform().unwrap(), Platform::EUW1);
    }

    #[tokio::test]
    async fn riot_id_lookup_ignores_case() {
        let repo = repo().await;
        repo.upsert_player(&new_player("abc", Some(30))).await.unwrap();

        let found = repo.get_player_by_riot_id("CHALOP", "3012").await.unwrap();
        assert_eq!(found.map(|p| p.puuid), Some("abc".to_string()));
        assert!(repo.get_player_by_riot_id("Other", "3012").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn tracked_players_follow_the_flag() {
        let repo = repo().await;
        repo.upsert_player(&new_player("a", None)).await.unwrap();
        repo.upsert_player(&new_player("b", None)).await.unwrap();

        repo.set_player_tracked("b", true).await.unwrap();
        let tracked = repo.get_tracked_players().await.unwrap();
        assert_eq!(tracked.len(), 1);
        assert_eq!(tracked[0].puuid, "b");

        repo.set_player_tracked("b", false).await.unwrap();
        assert!(repo.get_tracked_players().await.unwrap().is_empty());
        assert!(!repo.set_player_tracked("missing", true).await.unwrap());
    }

    #[tokio::test]
    async fn saved_match_reads_back_equal() {
        let repo = repo().await;
        let record = sample_match("EUW1_1", &["a", "b", "c"]);

        repo.save_match(&record).await.unwrap();

        assert_eq!(repo.get_match("EUW1_1").await.unwrap(), Some(record));
        assert!(repo.get_match("EUW1_2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn saving_a_match_twice_is_a_no_op() {
        let repo = repo().await;
        let record = sample_match("EUW1_1", &["a", "b"]);

        repo.save_match(&record).await.unwrap();
        let mut altered = record.clone();
        altered.game_duration = 1;
        repo.save_match(&altered).await.unwrap();

        assert_eq!(repo.count_matches().await.unwrap(), 1);
        assert_eq!(repo.get_match("EUW1_1").await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn player_match_ids_are_newest_first() {
        let repo = repo().await;
        let mut older = sample_match("EUW1_1", &["a", "b"]);
        older.game_creation = 1;
        let mut newer = sample_match("EUW1_2", &["a"]);
        newer.game_creation = 2;

        repo.save_match(&older).await.unwrap();
        repo.save_match(&newer).await.unwrap();

        assert_eq!(
            repo.get_player_match_ids("a", 10).await.unwrap(),
            vec!["EUW1_2".to_string(), "EUW1_1".to_string()]
        );
        assert_eq!(repo.get_player_match_ids("b", 10).await.unwrap(), vec!["EUW1_1".to_string()]);
        assert_eq!(repo.get_player_match_ids("a", 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ranks_only_grow_on_change() {
        let repo = repo().await;

        let first = repo.record_rank(&solo_rank(40)).await.unwrap();
        let same = repo.record_rank(&solo_rank(40)).await.unwrap();
        let changed = repo.record_rank(&solo_rank(58)).await.unwrap();

        assert_eq!(first.id, same.id);
        assert_ne!(changed.id, first.id);

        let history = repo.rank_history("abc", RankQueue::SoloDuo, 10).await.unwrap();
        assert_eq!(
            history.iter().map(|r| r.league_points).collect::<Vec<_>>(),
            vec![58, 40]
        );
        assert_eq!(
            repo.latest_rank("abc", RankQueue::SoloDuo).await.unwrap(),
            Some(changed)
        );
        assert!(repo.latest_rank("abc", RankQueue::Flex).await.unwrap().is_none());
    }
}
