use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Failure codes surfaced to clients through acks and `roomError`/`error` events.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    RoomNotFound,
    NameAlreadyTaken,
    NameAlreadyExists,
    IdAlreadyExists,
    NotAuthorized,
    InvalidName,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn wire_and_display_forms_agree() {
        for code in [
            ErrorCode::RoomNotFound,
            ErrorCode::NameAlreadyTaken,
            ErrorCode::NameAlreadyExists,
            ErrorCode::IdAlreadyExists,
            ErrorCode::NotAuthorized,
            ErrorCode::InvalidName,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code));
            assert_eq!(ErrorCode::from_str(code.as_ref()).unwrap(), code);
        }
    }

    #[test]
    fn uses_screaming_snake_case() {
        assert_eq!(ErrorCode::IdAlreadyExists.to_string(), "ID_ALREADY_EXISTS");
        assert_eq!(ErrorCode::NameAlreadyTaken.as_ref(), "NAME_ALREADY_TAKEN");
    }
}
