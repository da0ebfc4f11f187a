//! Riot responses to stored shapes. Pure functions, no I/O.

use std::collections::HashSet;

use crate::db::{MatchRecord, NewPlayer, NewRank, ParticipantRecord, RankQueue};
use crate::riot::{AccountDto, LeagueEntryDto, MatchDto, MatchId, ParticipantDto, Platform, SummonerDto};

/// Builds a player row from its account and, when known, its summoner.
///
/// `fallback_riot_id` is used when the account comes back without a Riot ID,
/// which happens for accounts that never picked one.
pub fn player(
    account: &AccountDto,
    summoner: Option<&SummonerDto>,
    platform: Platform,
    fallback_riot_id: Option<(&str, &str)>,
) -> NewPlayer {
    let (fallback_name, fallback_tag) = fallback_riot_id.unwrap_or(("", ""));

    NewPlayer {
        puuid: account.puuid.clone(),
        game_name: non_empty(account.game_name.as_deref()).unwrap_or(fallback_name).to_string(),
        tag_line: non_empty(account.tag_line.as_deref()).unwrap_or(fallback_tag).to_string(),
        platform,
        summoner_level: summoner.and_then(|s| s.summoner_level),
        profile_icon_id: summoner.and_then(|s| s.profile_icon_id),
    }
}

/// Builds a match and its participants.
///
/// The ID the caller asked for is the stored key; the payload metadata is not
/// read. Participants without a PUUID (bots) are dropped, and a PUUID listed
/// twice keeps its lowest participant ID.
pub fn match_record(match_id: &MatchId, dto: &MatchDto) -> MatchRecord {
    let info = &dto.info;

    let platform_id = if info.platform_id.is_empty() {
        match_id.platform().to_string()
    } else {
        info.platform_id.to_uppercase()
    };

    let mut participants: Vec<ParticipantRecord> = info
        .participants
        .iter()
        .filter(|p| !p.puuid.is_empty())
        .map(|p| participant(match_id, p))
        .collect();
    participants.sort_by_key(|p| p.participant_id);
    let mut seen = HashSet::new();
    participants.retain(|p| seen.insert(p.puuid.clone()));

    MatchRecord {
        match_id: match_id.to_string(),
        platform_id,
        queue_id: info.queue_id,
        game_mode: info.game_mode.clone(),
        game_version: info.game_version.clone(),
        map_id: info.map_id,
        game_creation: info.game_creation,
        game_duration: duration_secs(info.game_duration, info.game_end_timestamp),
        participants,
    }
}

fn participant(match_id: &MatchId, p: &ParticipantDto) -> ParticipantRecord {
    let team_position = if p.team_position.is_empty() {
        p.individual_position.clone()
    } else {
        p.team_position.clone()
    };

    ParticipantRecord {
        match_id: match_id.to_string(),
        puuid: p.puuid.clone(),
        participant_id: p.participant_id,
        team_id: p.team_id,
        champion_id: p.champion_id,
        champion_name: p.champion_name.clone(),
        team_position,
        summoner_level: p.summoner_level,
        kills: p.kills,
        deaths: p.deaths,
        assists: p.assists,
        cs: p.cs_total(),
        gold_earned: p.gold_earned,
        damage_to_champions: p.total_damage_dealt_to_champions,
        vision_score: p.vision_score,
        win: p.win,
        riot_id_game_name: p.riot_id_game_name.clone(),
        riot_id_tagline: p.riot_id_tagline.clone(),
    }
}

/// Payloads older than patch 11.20 carry no `gameEndTimestamp` and report the
/// duration in milliseconds.
fn duration_secs(game_duration: i64, game_end_timestamp: Option<i64>) -> i64 {
    match game_end_timestamp {
        Some(_) => game_duration,
        None => game_duration / 1000,
    }
}

/// Keeps the entries of ranked queues we record, skipping unknown ones.
pub fn ranks(puuid: &str, entries: &[LeagueEntryDto]) -> Vec<NewRank> {
    entries
        .iter()
        .filter_map(|entry| {
            let queue = entry.queue_type.parse::<RankQueue>().ok()?;
            Some(NewRank {
                puuid: puuid.to_string(),
                queue,
                tier: entry.tier.clone(),
                division: entry.rank.clone(),
                league_points: entry.league_points,
                wins: entry.wins,
                losses: entry.losses,
                hot_streak: entry.hot_streak,
            })
        })
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
pub(crate) mod tests {
    use serde_json::{Value, json};

    use super::*;

    /// A trimmed Match-v5 payload with one participant per puuid.
    pub fn match_json(match_id: &str, puuids: &[&str]) -> Value {
        let participants: Vec<Value> = puuids
            .iter()
            .enumerate()
            .map(|(i, puuid)| {
                json!({
                    "puuid": puuid,
                    "participantId": i + 1,
                    "teamId": if i < 5 { 100 } else { 200 },
                    "championId": 99,
                    "championName": "Lux",
                    "teamPosition": "MIDDLE",
                    "summonerLevel": 212,
                    "kills": 5,
                    "deaths": 2,
                    "assists": 8,
                    "totalMinionsKilled": 180,
                    "neutralMinionsKilled": 12,
                    "goldEarned": 12400,
                    "totalDamageDealtToChampions": 23000,
                    "visionScore": 21,
                    "win": i < 5,
                    "riotIdGameName": "Game",
                    "riotIdTagline": "Tag"
                })
            })
            .collect();

        json!({
            "metadata": { "matchId": match_id, "participants": puuids },
            "info": {
                "platformId": "EUW1",
                "gameCreation": 1_700_000_000_000_i64,
                "gameDuration": 1845,
                "gameEndTimestamp": 1_700_000_001_845_i64,
                "gameMode": "CLASSIC",
                "gameVersion": "14.24.632.8043",
                "mapId": 11,
                "queueId": 420,
                "participants": participants
            }
        })
    }

    fn match_dto(value: Value) -> MatchDto {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn match_fields_are_mapped() {
        let id: MatchId = "EUW1_1".parse().unwrap();
        let record = match_record(&id, &match_dto(match_json("EUW1_1", &["a", "b"])));

        assert_eq!(record.match_id, "EUW1_1");
        assert_eq!(record.platform_id, "EUW1");
        assert_eq!(record.game_duration, 1845);
        assert_eq!(record.participants.len(), 2);

        let a = record.participant("a").unwrap();
        assert_eq!(a.cs, 192);
        assert_eq!(a.team_id, 100);
        assert_eq!(a.damage_to_champions, 23000);
        assert!(a.win);
    }

    #[test]
    fn legacy_duration_is_converted_to_seconds() {
        let mut payload = match_json("EUW1_1", &["a"]);
        payload["info"]["gameDuration"] = json!(1_845_000);
        payload["info"]
            .as_object_mut()
            .unwrap()
            .remove("gameEndTimestamp");

        let id: MatchId = "EUW1_1".parse().unwrap();
        assert_eq!(match_record(&id, &match_dto(payload)).game_duration, 1845);
    }

    #[test]
    fn sparse_payload_is_tolerated() {
        let dto = match_dto(json!({
            "info": {
                "participants": [
                    { "puuid": "", "participantId": 1 },
                    { "puuid": "b", "participantId": 3, "individualPosition": "JUNGLE" },
                    { "puuid": "a", "participantId": 2 }
                ]
            }
        }));
        let id: MatchId = "KR_77".parse().unwrap();

        let record = match_record(&id, &dto);

        assert_eq!(record.platform_id, "KR");
        assert_eq!(
            record.participants.iter().map(|p| p.puuid.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert_eq!(record.participant("b").unwrap().team_position, "JUNGLE");
    }

    #[test]
    fn duplicate_puuid_keeps_first_participant() {
        let mut payload = match_json("EUW1_5", &["a", "b", "a"]);
        payload["info"]["participants"][2]["kills"] = json!(30);

        let id: MatchId = "EUW1_5".parse().unwrap();
        let record = match_record(&id, &match_dto(payload));

        assert_eq!(record.participants.len(), 2);
        assert_eq!(record.participant("a").unwrap().participant_id, 1);
        assert_eq!(record.participant("a").unwrap().kills, 5);
    }

    #[test]
    fn player_falls_back_to_known_riot_id() {
        let account = AccountDto {
            puuid: "abc".into(),
            game_name: None,
            tag_line: Some(" ".into()),
        };

        let player = player(&account, None, Platform::EUW1, Some(("Chalop", "3012")));

        assert_eq!(player.game_name, "Chalop");
        assert_eq!(player.tag_line, "3012");
        assert_eq!(player.summoner_level, None);
    }

    #[test]
    fn player_takes_summoner_details() {
        let account = AccountDto {
            puuid: "abc".into(),
            game_name: Some("Chalop".into()),
            tag_line: Some("3012".into()),
        };
        let summoner = SummonerDto {
            profile_icon_id: Some(29),
            summoner_level: Some(412),
        };

        let player = player(&account, Some(&summoner), Platform::NA1, None);

        assert_eq!(player.summoner_level, Some(412));
        assert_eq!(player.profile_icon_id, Some(29));
        assert_eq!(player.platform, Platform::NA1);
    }

    #[test]
    fn only_known_queues_become_ranks() {
        let entries: Vec<LeagueEntryDto> = serde_json::from_value(json!([
            { "queueType": "RANKED_SOLO_5x5", "tier": "GOLD", "rank": "II", "leaguePoints": 40, "wins": 10, "losses": 8 },
            { "queueType": "RANKED_FLEX_SR", "tier": "SILVER", "rank": "I", "leaguePoints": 0 },
            { "queueType": "CHERRY", "tier": "", "rank": "" }
        ]))
        .unwrap();

        let ranks = ranks("abc", &entries);

        assert_eq!(ranks.len(), 2);
        assert_eq!(ranks[0].queue, RankQueue::SoloDuo);
        assert_eq!(ranks[0].division, "II");
        assert_eq!(ranks[1].queue, RankQueue::Flex);
        assert_eq!(ranks[1].wins, 0);
    }
}
