use huddle_shared::server_event::{
    ChatMessage, Notice, ServerEvent, StreamChange, UserJoined, UserLeft,
};
use log::{info, warn};

use crate::{
    errors::RoomError,
    lifecycle::LifecycleController,
    outbox::Outbox,
    registry::{RoomRegistry, validate_name},
    room::{StreamKind, User},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOutcome {
    pub is_creator: bool,
    pub rejoined: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Departure {
    Leave,
    Disconnect,
}

/// Join, leave, reconnect and disconnect handling for room members.
///
/// Creators are tombstoned instead of removed so that they can take their entry
/// back by rejoining under the same name.
pub struct MembershipManager;

impl MembershipManager {
    pub fn join(
        registry: &mut RoomRegistry,
        outbox: &mut Outbox,
        room_id: &str,
        user_name: &str,
        conn_id: &str,
    ) -> Result<JoinOutcome, RoomError> {
        validate_name(user_name)?;

        let room = registry
            .lookup(room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))?;

        if room.has_active_name(user_name) {
            warn!("Join to {} rejected: name {} is taken", room_id, user_name);
            return Err(RoomError::NameAlreadyTaken(user_name.to_string()));
        }

        if let Some(previous) = registry.room_of(conn_id).cloned() {
            Self::depart(registry, outbox, &previous, conn_id, Departure::Leave);
        }

        let member_id = registry.allocate_member_id();
        let room = registry
            .lookup_mut(room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))?;

        let rejoined = match room.reconnect_candidate_mut(user_name) {
            Some(user) => {
                user.conn_id = conn_id.to_string();
                user.disconnected = false;
                true
            }
            None => {
                room.push_user(User::new(member_id, conn_id, user_name));
                false
            }
        };

        let is_creator = room
            .find_active_by_conn(conn_id)
            .is_some_and(|user| room.is_creator(user));

        if rejoined {
            info!("{} rejoined room {} (creator: {})", user_name, room_id, is_creator);
        } else {
            info!("{} joined room {}", user_name, room_id);
        }

        outbox.to_room(
            room,
            ServerEvent::UserJoined(UserJoined {
                user_name: user_name.to_string(),
                user_id: conn_id.to_string(),
                is_creator,
                rejoining: rejoined,
            }),
        );
        outbox.to_room(room, ServerEvent::GetUsers(room.member_views()));
        outbox.to_room_except(room, conn_id, ServerEvent::UserConnected(conn_id.to_string()));

        for user in room.active_users().filter(|user| user.conn_id != conn_id) {
            let change = StreamChange {
                user_name: user.name.clone(),
                user_id: user.conn_id.clone(),
            };

            if user.is_streaming {
                outbox.to_connection(conn_id, ServerEvent::StreamStarted(change.clone()));
            }
            if user.is_screen_sharing {
                outbox.to_connection(conn_id, ServerEvent::ScreenStarted(change));
            }
        }

        registry.attach(conn_id, room_id);
        LifecycleController::broadcast_room_summaries(registry, outbox);

        Ok(JoinOutcome {
            is_creator,
            rejoined,
        })
    }

    /// Voluntary departure. Never deletes the room, even when it ends up empty.
    pub fn leave(
        registry: &mut RoomRegistry,
        outbox: &mut Outbox,
        room_id: &str,
        conn_id: &str,
    ) -> bool {
        if !Self::depart(registry, outbox, room_id, conn_id, Departure::Leave) {
            return false;
        }

        LifecycleController::broadcast_room_summaries(registry, outbox);
        true
    }

    /// Transport-level disconnect of `conn_id`, wherever it is a member.
    pub fn on_disconnect(registry: &mut RoomRegistry, outbox: &mut Outbox, conn_id: &str) -> bool {
        let room_id = match registry.room_of(conn_id) {
            Some(room_id) => room_id.clone(),
            None => return false,
        };

        if !Self::depart(registry, outbox, &room_id, conn_id, Departure::Disconnect) {
            return false;
        }

        LifecycleController::broadcast_room_summaries(registry, outbox);
        true
    }

    pub fn set_stream_flag(
        registry: &mut RoomRegistry,
        outbox: &mut Outbox,
        room_id: &str,
        conn_id: &str,
        kind: StreamKind,
        value: bool,
    ) -> bool {
        let Some(room) = registry.lookup_mut(room_id) else {
            return false;
        };
        let Some(user) = room.find_active_by_conn_mut(conn_id) else {
            return false;
        };

        user.set_stream_flag(kind, value);

        let change = StreamChange {
            user_name: user.name.clone(),
            user_id: user.conn_id.clone(),
        };
        let event = match (kind, value) {
            (StreamKind::Camera, true) => ServerEvent::StreamStarted(change),
            (StreamKind::Camera, false) => ServerEvent::StreamStopped(change),
            (StreamKind::Screen, true) => ServerEvent::ScreenStarted(change),
            (StreamKind::Screen, false) => ServerEvent::ScreenStopped(change),
        };

        outbox.to_room(room, event);
        outbox.to_room(room, ServerEvent::GetUsers(room.member_views()));

        LifecycleController::broadcast_room_summaries(registry, outbox);
        true
    }

    /// Chat line from an active member, echoed to the whole room.
    pub fn post_message(
        registry: &RoomRegistry,
        outbox: &mut Outbox,
        room_id: &str,
        conn_id: &str,
        message: &str,
    ) -> bool {
        let Some(room) = registry.lookup(room_id) else {
            return false;
        };
        let Some(user) = room.find_active_by_conn(conn_id) else {
            return false;
        };

        outbox.to_room(
            room,
            ServerEvent::Message(ChatMessage {
                user_name: user.name.clone(),
                message: message.to_string(),
            }),
        );
        true
    }

    /// Removes or tombstones `conn_id` in `room_id` and notifies the remaining
    /// members. Does not broadcast room summaries.
    pub(crate) fn depart(
        registry: &mut RoomRegistry,
        outbox: &mut Outbox,
        room_id: &str,
        conn_id: &str,
        departure: Departure,
    ) -> bool {
        let Some(room) = registry.lookup_mut(room_id) else {
            return false;
        };
        let Some(is_creator) = room
            .find_active_by_conn(conn_id)
            .map(|user| room.is_creator(user))
        else {
            return false;
        };

        let mut delete_room = false;

        if is_creator {
            let Some(user) = room.find_active_by_conn_mut(conn_id) else {
                return false;
            };
            user.disconnected = true;
            user.is_streaming = false;
            user.is_screen_sharing = false;
            let user_name = user.name.clone();

            info!(
                "Creator {} is offline in room {}; room stays active",
                user_name, room_id
            );

            match departure {
                Departure::Leave => outbox.to_room(
                    room,
                    ServerEvent::UserLeft(UserLeft { user_name }),
                ),
                Departure::Disconnect => outbox.to_room(
                    room,
                    ServerEvent::AdminDisconnected(Notice {
                        message: format!(
                            "The administrator {} disconnected but the meeting stays active.",
                            user_name
                        ),
                    }),
                ),
            }
            outbox.to_room(room, ServerEvent::UserDisconnected(conn_id.to_string()));
            outbox.to_room(room, ServerEvent::GetUsers(room.member_views()));
        } else {
            let Some(user) = room.remove_active_by_conn(conn_id) else {
                return false;
            };

            info!("{} left room {}", user.name, room_id);

            outbox.to_room(
                room,
                ServerEvent::UserLeft(UserLeft {
                    user_name: user.name,
                }),
            );

            if departure == Departure::Disconnect && room.active_count() == 0 {
                delete_room = true;
            } else {
                outbox.to_room(room, ServerEvent::GetUsers(room.member_views()));
                outbox.to_room(room, ServerEvent::UserDisconnected(conn_id.to_string()));
            }
        }

        if registry.room_of(conn_id).is_some_and(|current| current == room_id) {
            registry.detach(conn_id);
        }

        if delete_room {
            info!("Deleting room {}: no active members left", room_id);
            registry.remove(room_id);
        }

        true
    }
}
