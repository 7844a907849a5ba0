pub mod client_event;
pub mod error_code;
pub mod server_event;

pub type RoomID = String;
pub type ConnID = String;

pub const DEFAULT_PORT: u16 = 3001;

pub const MAX_NAME_LENGTH: usize = 64;

pub fn is_valid_name(name: &str) -> bool {
    let trimmed = name.trim();

    !trimmed.is_empty()
        && name.chars().count() <= MAX_NAME_LENGTH
        && !name.chars().any(|c| c.is_control())
}
