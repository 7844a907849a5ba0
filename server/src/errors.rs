use huddle_shared::{error_code::ErrorCode, server_event::ErrorPayload};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("Room {0} does not exist.")]
    RoomNotFound(String),

    #[error("The name {0} is already used in this room. Please choose another name.")]
    NameAlreadyTaken(String),

    #[error("A room named {0} already exists.")]
    NameAlreadyExists(String),

    #[error("The room id {0} is already in use.")]
    IdAlreadyExists(String),

    #[error("Only the creator of the room can end the meeting.")]
    NotAuthorized,

    #[error("Names must be 1 to {max} characters without control characters.")]
    InvalidName { max: usize },
}

impl RoomError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RoomError::RoomNotFound(_) => ErrorCode::RoomNotFound,
            RoomError::NameAlreadyTaken(_) => ErrorCode::NameAlreadyTaken,
            RoomError::NameAlreadyExists(_) => ErrorCode::NameAlreadyExists,
            RoomError::IdAlreadyExists(_) => ErrorCode::IdAlreadyExists,
            RoomError::NotAuthorized => ErrorCode::NotAuthorized,
            RoomError::InvalidName { .. } => ErrorCode::InvalidName,
        }
    }

    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            error: Some(self.code()),
            message: self.to_string(),
        }
    }
}
