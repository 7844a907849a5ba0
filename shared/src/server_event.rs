use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ConnID, RoomID, error_code::ErrorCode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    Welcome(Welcome),
    Ack(Ack),
    Error(ErrorPayload),
    RoomsList(Vec<RoomSummary>),
    RoomCreated(RoomCreated),
    RoomError(ErrorPayload),
    UserJoined(UserJoined),
    UserLeft(UserLeft),
    AdminDisconnected(Notice),
    MeetingEnded(Notice),
    GetUsers(Vec<MemberView>),
    #[serde(rename = "user-connected")]
    UserConnected(ConnID),
    #[serde(rename = "user-disconnected")]
    UserDisconnected(ConnID),
    StreamStarted(StreamChange),
    StreamStopped(StreamChange),
    ScreenStarted(StreamChange),
    ScreenStopped(StreamChange),
    Offer(RelayedOffer),
    Answer(RelayedAnswer),
    #[serde(rename = "ice-candidate")]
    IceCandidate(RelayedIceCandidate),
    Message(ChatMessage),
}

impl ServerEvent {
    pub fn ack(id: u64, args: Vec<Value>) -> Self {
        ServerEvent::Ack(Ack { id, args })
    }

    pub fn error(error: Option<ErrorCode>, message: impl Into<String>) -> Self {
        ServerEvent::Error(ErrorPayload {
            error,
            message: message.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Welcome {
    pub connection_id: ConnID,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub id: u64,
    pub args: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCode>,
    pub message: String,
}

/// Public view of one room, broadcast to every connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: RoomID,
    pub name: String,
    pub persistent: bool,
    pub created_at: String,
    pub users: Vec<UserSummary>,
    pub disconnected_users: usize,
    pub total_users: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub name: String,
    pub is_creator: bool,
    pub is_streaming: bool,
    pub is_screen_sharing: bool,
}

/// Member entry as seen by the other members of a room; carries the connection id
/// peers need to address negotiation messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub id: ConnID,
    pub name: String,
    pub is_creator: bool,
    pub is_streaming: bool,
    pub is_screen_sharing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCreated {
    pub room_id: RoomID,
    pub room_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserJoined {
    pub user_name: String,
    pub user_id: ConnID,
    pub is_creator: bool,

    #[serde(default)]
    pub rejoining: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLeft {
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamChange {
    pub user_name: String,
    pub user_id: ConnID,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayedOffer {
    pub offer: Value,
    pub user_id: ConnID,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayedAnswer {
    pub answer: Value,
    pub from: ConnID,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayedIceCandidate {
    pub candidate: Value,
    pub from: ConnID,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub user_name: String,
    pub message: String,
}
