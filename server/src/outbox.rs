use huddle_shared::{ConnID, server_event::ServerEvent};

use crate::room::Room;

#[derive(Debug, Clone, PartialEq)]
pub enum Recipients {
    Connections(Vec<ConnID>),
    Everyone,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub recipients: Recipients,
    pub event: ServerEvent,
}

/// Deliveries produced while handling one event, in emission order. Room
/// recipients are resolved when queued, so a room torn down later in the same
/// event still reaches the members it had.
#[derive(Debug, Default)]
pub struct Outbox {
    deliveries: Vec<Delivery>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_connection(&mut self, conn_id: &str, event: ServerEvent) {
        self.push(Recipients::Connections(vec![conn_id.to_string()]), event);
    }

    pub fn to_room(&mut self, room: &Room, event: ServerEvent) {
        self.push(Recipients::Connections(room.active_connections()), event);
    }

    pub fn to_room_except(&mut self, room: &Room, excluded: &str, event: ServerEvent) {
        let connections = room
            .active_connections()
            .into_iter()
            .filter(|conn_id| conn_id != excluded)
            .collect();

        self.push(Recipients::Connections(connections), event);
    }

    pub fn to_everyone(&mut self, event: ServerEvent) {
        self.push(Recipients::Everyone, event);
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    pub fn deliveries(&self) -> &[Delivery] {
        &self.deliveries
    }

    pub fn into_deliveries(self) -> Vec<Delivery> {
        self.deliveries
    }

    fn push(&mut self, recipients: Recipients, event: ServerEvent) {
        if let Recipients::Connections(connections) = &recipients {
            if connections.is_empty() {
                return;
            }
        }

        self.deliveries.push(Delivery { recipients, event });
    }

    /// Events addressed to `conn_id`, directly or through a broadcast.
    #[cfg(test)]
    pub fn events_for(&self, conn_id: &str) -> Vec<&ServerEvent> {
        self.deliveries
            .iter()
            .filter(|delivery| match &delivery.recipients {
                Recipients::Connections(connections) => {
                    connections.iter().any(|conn| conn == conn_id)
                }
                Recipients::Everyone => true,
            })
            .map(|delivery| &delivery.event)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use huddle_shared::server_event::UserLeft;

    use super::*;
    use crate::room::User;

    fn left(name: &str) -> ServerEvent {
        ServerEvent::UserLeft(UserLeft {
            user_name: name.to_string(),
        })
    }

    #[test]
    fn room_delivery_skips_excluded_connection() {
        let mut room = Room::new("r", User::new(1, "a", "Alice"));
        room.push_user(User::new(2, "b", "Bob"));

        let mut outbox = Outbox::new();
        outbox.to_room_except(&room, "a", left("x"));

        assert_eq!(
            outbox.deliveries()[0].recipients,
            Recipients::Connections(vec!["b".to_string()])
        );
        assert!(outbox.events_for("a").is_empty());
    }

    #[test]
    fn deliveries_without_recipients_are_dropped() {
        let room = Room::new("r", User::new(1, "a", "Alice"));

        let mut outbox = Outbox::new();
        outbox.to_room_except(&room, "a", left("x"));

        assert!(outbox.is_empty());
    }
}
