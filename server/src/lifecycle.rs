use huddle_shared::{
    client_event::CreateRoom,
    server_event::{Notice, RoomCreated, ServerEvent},
};
use log::{info, warn};

use crate::{
    errors::RoomError,
    membership::{Departure, MembershipManager},
    outbox::Outbox,
    registry::RoomRegistry,
};

pub struct LifecycleController;

impl LifecycleController {
    /// Creates a room owned by `conn_id`, moving the connection out of any room it
    /// is currently in.
    pub fn create_room(
        registry: &mut RoomRegistry,
        outbox: &mut Outbox,
        conn_id: &str,
        request: &CreateRoom,
    ) -> Result<RoomCreated, RoomError> {
        let previous = registry.room_of(conn_id).cloned();

        let room_id = registry
            .create_room(
                &request.room_name,
                request.custom_room_id.as_deref(),
                &request.user_name,
                conn_id,
            )
            .inspect_err(|e| warn!("Room creation rejected: {}", e))?;

        if let Some(previous) = previous {
            MembershipManager::depart(registry, outbox, &previous, conn_id, Departure::Leave);
        }

        let created = RoomCreated {
            room_id,
            room_name: request.room_name.clone(),
        };

        outbox.to_connection(conn_id, ServerEvent::RoomCreated(created.clone()));
        Self::broadcast_room_summaries(registry, outbox);

        Ok(created)
    }

    /// Ends the meeting for everyone. Members are notified before the room is
    /// removed; the refreshed room list then goes to every connection.
    pub fn request_termination(
        registry: &mut RoomRegistry,
        outbox: &mut Outbox,
        room_id: &str,
        conn_id: &str,
    ) -> Result<(), RoomError> {
        let room = registry.authorize_termination(room_id, conn_id).inspect_err(|e| {
            warn!(
                "Termination of room {} by {} rejected: {}",
                room_id, conn_id, e
            )
        })?;

        let ended_by = room
            .find_active_by_conn(conn_id)
            .map(|user| user.name.clone())
            .unwrap_or_default();

        outbox.to_room(
            room,
            ServerEvent::MeetingEnded(Notice {
                message: format!("The meeting was ended by {}.", ended_by),
            }),
        );

        registry.remove(room_id);
        info!("Room {} ended by {}", room_id, ended_by);

        Self::broadcast_room_summaries(registry, outbox);
        Ok(())
    }

    pub fn broadcast_room_summaries(registry: &RoomRegistry, outbox: &mut Outbox) {
        outbox.to_everyone(ServerEvent::RoomsList(registry.summaries()));
    }
}
