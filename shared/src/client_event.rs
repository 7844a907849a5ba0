use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ConnID, RoomID};

/// One inbound frame: the event plus an optional acknowledgment id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientFrame {
    #[serde(flatten)]
    pub event: ClientEvent,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack: Option<u64>,
}

impl ClientFrame {
    pub fn new(event: ClientEvent) -> Self {
        Self { event, ack: None }
    }

    pub fn with_ack(event: ClientEvent, ack: u64) -> Self {
        Self {
            event,
            ack: Some(ack),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    CreateRoom(CreateRoom),
    CheckRoom(RoomRef),
    JoinRoom(RoomMembership),
    LeaveRoom(RoomMembership),
    EndMeeting(RoomMembership),
    StartStream(RoomRef),
    StopStream(RoomRef),
    StartScreen(RoomRef),
    StopScreen(RoomRef),
    Offer(OfferRequest),
    Answer(AnswerRequest),
    #[serde(rename = "ice-candidate")]
    IceCandidate(IceCandidateRequest),
    Message(ChatRequest),
    GetRoomsList,
    GetUsers(RoomRef),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoom {
    pub room_name: String,
    pub user_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_room_id: Option<RoomID>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRef {
    pub room_id: RoomID,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMembership {
    pub room_id: RoomID,
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferRequest {
    pub offer: Value,
    pub to: ConnID,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub answer: Value,
    pub to: ConnID,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceCandidateRequest {
    pub candidate: Value,
    pub to: ConnID,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub room_id: RoomID,
    pub message: String,
}
