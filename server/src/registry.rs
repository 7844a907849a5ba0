use std::collections::HashMap;

use huddle_shared::{ConnID, RoomID, is_valid_name, server_event::RoomSummary};
use indexmap::IndexMap;
use log::info;
use rand::{Rng, rng};

use crate::{
    errors::RoomError,
    room::{MemberID, Room, User},
};

const ROOM_ID_LENGTH: usize = 8;
const ROOM_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Process-wide room state. Rooms iterate in creation order.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: IndexMap<RoomID, Room>,
    connection_rooms: HashMap<ConnID, RoomID>,
    next_member_id: MemberID,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a room with `creator_conn` as its creator and only member.
    ///
    /// The caller must already have detached `creator_conn` from any other room.
    pub fn create_room(
        &mut self,
        room_name: &str,
        requested_id: Option<&str>,
        creator_name: &str,
        creator_conn: &str,
    ) -> Result<RoomID, RoomError> {
        validate_name(room_name)?;
        validate_name(creator_name)?;

        let room_id = match requested_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => {
                if self.rooms.contains_key(id) {
                    return Err(RoomError::IdAlreadyExists(id.to_string()));
                }
                id.to_string()
            }
            None => self.generate_room_id(),
        };

        if self.rooms.values().any(|room| room.name == room_name) {
            return Err(RoomError::NameAlreadyExists(room_name.to_string()));
        }

        let creator = User::new(self.allocate_member_id(), creator_conn, creator_name);
        self.rooms
            .insert(room_id.clone(), Room::new(room_name, creator));
        self.attach(creator_conn, &room_id);

        info!(
            "Room {} ({}) created by {}",
            room_id, room_name, creator_name
        );

        Ok(room_id)
    }

    pub fn lookup(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn lookup_mut(&mut self, room_id: &str) -> Option<&mut Room> {
        self.rooms.get_mut(room_id)
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// The room `conn_id` is an active member of, if any.
    pub fn room_of(&self, conn_id: &str) -> Option<&RoomID> {
        self.connection_rooms.get(conn_id)
    }

    /// Checks that `conn_id` is the active creator of `room_id`.
    ///
    /// The creator entry is never removed and is always first in join order, so
    /// the creator-identity test also covers "first member of the room".
    pub fn authorize_termination(&self, room_id: &str, conn_id: &str) -> Result<&Room, RoomError> {
        let room = self
            .rooms
            .get(room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))?;

        match room.find_active_by_conn(conn_id) {
            Some(user) if room.is_creator(user) => Ok(room),
            _ => Err(RoomError::NotAuthorized),
        }
    }

    /// Authorizes and deletes `room_id`, returning the removed room.
    pub fn terminate(&mut self, room_id: &str, conn_id: &str) -> Result<Room, RoomError> {
        self.authorize_termination(room_id, conn_id)?;

        self.remove(room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))
    }

    /// Unconditionally deletes a room and forgets its members' connections.
    pub fn remove(&mut self, room_id: &str) -> Option<Room> {
        let room = self.rooms.shift_remove(room_id)?;

        for conn_id in room.active_connections() {
            self.connection_rooms.remove(&conn_id);
        }

        Some(room)
    }

    pub fn summaries(&self) -> Vec<RoomSummary> {
        self.rooms
            .iter()
            .map(|(room_id, room)| room.summary(room_id))
            .collect()
    }

    pub(crate) fn allocate_member_id(&mut self) -> MemberID {
        self.next_member_id += 1;
        self.next_member_id
    }

    pub(crate) fn attach(&mut self, conn_id: &str, room_id: &str) {
        self.connection_rooms
            .insert(conn_id.to_string(), room_id.to_string());
    }

    pub(crate) fn detach(&mut self, conn_id: &str) {
        self.connection_rooms.remove(conn_id);
    }

    fn generate_room_id(&self) -> RoomID {
        let mut rng = rng();

        loop {
            let candidate: String = (0..ROOM_ID_LENGTH)
                .map(|_| char::from(ROOM_ID_ALPHABET[rng.random_range(0..ROOM_ID_ALPHABET.len())]))
                .collect();

            if !self.rooms.contains_key(&candidate) {
                return candidate;
            }
        }
    }
}

pub(crate) fn validate_name(name: &str) -> Result<(), RoomError> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(RoomError::InvalidName {
            max: huddle_shared::MAX_NAME_LENGTH,
        })
    }
}
