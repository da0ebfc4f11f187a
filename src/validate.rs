//! Caller input checks, run before anything reaches the network.

use crate::error::AppError;

const MAX_PUUID_LEN: usize = 78;
/// Match-v5 accepts at most 100 ids per page.
pub const MAX_MATCH_COUNT: u32 = 100;

pub fn puuid(puuid: &str) -> Result<(), AppError> {
    let valid = !puuid.is_empty()
        && puuid.len() <= MAX_PUUID_LEN
        && puuid
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');

    if valid {
        Ok(())
    } else {
        Err(AppError::Validation(format!("malformed puuid `{puuid}`")))
    }
}

/// Game names are 3 to 16 characters, tag lines 3 to 5 letters or digits.
pub fn riot_id(game_name: &str, tag_line: &str) -> Result<(), AppError> {
    let name_len = game_name.trim().chars().count();
    if !(3..=16).contains(&name_len) {
        return Err(AppError::Validation(format!(
            "game name `{game_name}` must be 3 to 16 characters"
        )));
    }

    let tag_len = tag_line.chars().count();
    if !(3..=5).contains(&tag_len) || !tag_line.chars().all(char::is_alphanumeric) {
        return Err(AppError::Validation(format!(
            "tag line `{tag_line}` must be 3 to 5 letters or digits"
        )));
    }

    Ok(())
}

pub fn match_count(count: u32) -> Result<(), AppError> {
    if (1..=MAX_MATCH_COUNT).contains(&count) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "match count must be between 1 and {MAX_MATCH_COUNT}, got {count}"
        )))
    }
}
