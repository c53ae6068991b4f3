use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_NICKNAME_LENGTH: usize = 16;

/// Transport-assigned identifier of one connection. It changes whenever the
/// client reconnects.
pub type ConnectionId = u64;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PlayerRef {
    pub connection_id: ConnectionId,
    pub nickname: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NicknameError {
    #[error("nickname cannot be empty")]
    Empty,
    #[error("nickname is too long (max {MAX_NICKNAME_LENGTH} characters)")]
    TooLong,
    #[error("nickname contains a control character")]
    ControlCharacter,
}

pub fn sanitize_nickname(input: &str) -> Result<String, NicknameError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(NicknameError::Empty);
    }

    if trimmed.chars().count() > MAX_NICKNAME_LENGTH {
        return Err(NicknameError::TooLong);
    }

    if trimmed.chars().any(char::is_control) {
        return Err(NicknameError::ControlCharacter);
    }

    Ok(trimmed.to_string())
}
