/*
 * Responsibility
 * - Admin users API の request/response DTO
 * - validate() で UID の形式チェック
 */
use serde::{Deserialize, Serialize};

pub const MAX_UID_LEN: usize = 256;

pub fn validate_uid(uid: &str) -> Result<(), &'static str> {
    if uid.trim().is_empty() {
        return Err("uid is required");
    }
    if uid.len() > MAX_UID_LEN {
        return Err("uid must be <= 256 chars");
    }
    if uid.chars().any(char::is_whitespace) {
        return Err("uid must not contain whitespace");
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct ReplaceUsersRequest {
    pub users: Vec<String>,
}

impl ReplaceUsersRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        self.users.iter().try_for_each(|uid| validate_uid(uid))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncResponse {
    pub users: usize,
}
