use huddle_shared::{
    client_event::{ClientEvent, ClientFrame},
    server_event::ServerEvent,
};
use log::debug;
use serde_json::{Value, json};

use crate::{
    errors::RoomError,
    lifecycle::LifecycleController,
    membership::MembershipManager,
    outbox::Outbox,
    registry::RoomRegistry,
    relay::{RelayKind, SignalingRelay},
    room::StreamKind,
};

pub struct CommandHandler;

impl CommandHandler {
    /// Applies one client event to the registry and returns everything that has
    /// to be sent as a result, acknowledgment included.
    pub fn handle_command(
        registry: &mut RoomRegistry,
        conn_id: &str,
        frame: ClientFrame,
    ) -> Outbox {
        let mut outbox = Outbox::new();
        let ack = frame.ack;

        match frame.event {
            ClientEvent::CreateRoom(request) => {
                match LifecycleController::create_room(registry, &mut outbox, conn_id, &request) {
                    Ok(created) => reply(&mut outbox, conn_id, ack, vec![
                        json!(true),
                        json!({ "roomId": created.room_id, "roomName": created.room_name }),
                    ]),
                    Err(e) => {
                        outbox.to_connection(conn_id, ServerEvent::RoomError(e.to_payload()));
                        reply(&mut outbox, conn_id, ack, failure(&e));
                    }
                }
            }

            ClientEvent::CheckRoom(room) => {
                let exists = registry.contains(&room.room_id);
                debug!("Room {} exists: {}", room.room_id, exists);
                reply(&mut outbox, conn_id, ack, vec![json!(exists)]);
            }

            ClientEvent::JoinRoom(join) => {
                match MembershipManager::join(
                    registry,
                    &mut outbox,
                    &join.room_id,
                    &join.user_name,
                    conn_id,
                ) {
                    Ok(outcome) => reply(&mut outbox, conn_id, ack, vec![
                        json!(true),
                        json!({ "isCreator": outcome.is_creator, "rejoined": outcome.rejoined }),
                    ]),
                    Err(e) => fail(&mut outbox, conn_id, ack, &e),
                }
            }

            ClientEvent::LeaveRoom(leave) => {
                MembershipManager::leave(registry, &mut outbox, &leave.room_id, conn_id);
            }

            ClientEvent::EndMeeting(end) => {
                match LifecycleController::request_termination(
                    registry,
                    &mut outbox,
                    &end.room_id,
                    conn_id,
                ) {
                    Ok(()) => reply(&mut outbox, conn_id, ack, vec![json!(true)]),
                    Err(e) => fail(&mut outbox, conn_id, ack, &e),
                }
            }

            ClientEvent::StartStream(room) => {
                MembershipManager::set_stream_flag(
                    registry,
                    &mut outbox,
                    &room.room_id,
                    conn_id,
                    StreamKind::Camera,
                    true,
                );
            }
            ClientEvent::StopStream(room) => {
                MembershipManager::set_stream_flag(
                    registry,
                    &mut outbox,
                    &room.room_id,
                    conn_id,
                    StreamKind::Camera,
                    false,
                );
            }
            ClientEvent::StartScreen(room) => {
                MembershipManager::set_stream_flag(
                    registry,
                    &mut outbox,
                    &room.room_id,
                    conn_id,
                    StreamKind::Screen,
                    true,
                );
            }
            ClientEvent::StopScreen(room) => {
                MembershipManager::set_stream_flag(
                    registry,
                    &mut outbox,
                    &room.room_id,
                    conn_id,
                    StreamKind::Screen,
                    false,
                );
            }

            ClientEvent::Offer(offer) => {
                SignalingRelay::relay(
                    &mut outbox,
                    RelayKind::Offer,
                    offer.offer,
                    conn_id,
                    &offer.to,
                );
            }
            ClientEvent::Answer(answer) => {
                SignalingRelay::relay(
                    &mut outbox,
                    RelayKind::Answer,
                    answer.answer,
                    conn_id,
                    &answer.to,
                );
            }
            ClientEvent::IceCandidate(ice) => {
                SignalingRelay::relay(
                    &mut outbox,
                    RelayKind::IceCandidate,
                    ice.candidate,
                    conn_id,
                    &ice.to,
                );
            }

            ClientEvent::Message(chat) => {
                MembershipManager::post_message(
                    registry,
                    &mut outbox,
                    &chat.room_id,
                    conn_id,
                    &chat.message,
                );
            }

            ClientEvent::GetRoomsList => {
                outbox.to_connection(conn_id, ServerEvent::RoomsList(registry.summaries()));
            }

            ClientEvent::GetUsers(room) => {
                let members = registry
                    .lookup(&room.room_id)
                    .map(|room| room.member_views())
                    .unwrap_or_default();

                match (ack, registry.lookup(&room.room_id)) {
                    (Some(_), _) => reply(&mut outbox, conn_id, ack, vec![json!(members)]),
                    (None, Some(found)) => outbox.to_room(found, ServerEvent::GetUsers(members)),
                    (None, None) => {}
                }
            }
        }

        outbox
    }
}

fn reply(outbox: &mut Outbox, conn_id: &str, ack: Option<u64>, args: Vec<Value>) {
    if let Some(id) = ack {
        outbox.to_connection(conn_id, ServerEvent::ack(id, args));
    }
}

fn failure(e: &RoomError) -> Vec<Value> {
    vec![json!(false), json!(e.to_payload())]
}

/// Reports `e` through the ack when one was requested, otherwise as an `error`
/// event.
fn fail(outbox: &mut Outbox, conn_id: &str, ack: Option<u64>, e: &RoomError) {
    match ack {
        Some(_) => reply(outbox, conn_id, ack, failure(e)),
        None => {
            outbox.to_connection(conn_id, ServerEvent::error(Some(e.code()), e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use huddle_shared::client_event::{CreateRoom, OfferRequest, RoomMembership, RoomRef};
    use huddle_shared::server_event::Ack;

    use super::*;

    fn frame(event: ClientEvent, ack: Option<u64>) -> ClientFrame {
        ClientFrame { event, ack }
    }

    fn ack_of(outbox: &Outbox, id: u64) -> Option<Vec<Value>> {
        outbox.deliveries().iter().find_map(|d| match &d.event {
            ServerEvent::Ack(Ack { id: ack_id, args }) if *ack_id == id => Some(args.clone()),
            _ => None,
        })
    }

    fn create(registry: &mut RoomRegistry, id: &str, user: &str, conn: &str) -> Outbox {
        CommandHandler::handle_command(
            registry,
            conn,
            frame(
                ClientEvent::CreateRoom(CreateRoom {
                    room_name: format!("room {}", id),
                    user_name: user.to_string(),
                    custom_room_id: Some(id.to_string()),
                }),
                None,
            ),
        )
    }

    #[test]
    fn check_room_acks_existence() {
        let mut registry = RoomRegistry::new();
        create(&mut registry, "a", "Alice", "c1");

        let outbox = CommandHandler::handle_command(
            &mut registry,
            "c9",
            frame(ClientEvent::CheckRoom(RoomRef { room_id: "a".to_string() }), Some(1)),
        );
        assert_eq!(ack_of(&outbox, 1), Some(vec![json!(true)]));

        let outbox = CommandHandler::handle_command(
            &mut registry,
            "c9",
            frame(ClientEvent::CheckRoom(RoomRef { room_id: "b".to_string() }), Some(2)),
        );
        assert_eq!(ack_of(&outbox, 2), Some(vec![json!(false)]));
    }

    #[test]
    fn duplicate_create_sends_room_error() {
        let mut registry = RoomRegistry::new();
        create(&mut registry, "a", "Alice", "c1");

        let outbox = create(&mut registry, "a", "Bob", "c2");

        let events = outbox.events_for("c2");
        assert_eq!(events.len(), 1);
        match events[0] {
            ServerEvent::RoomError(payload) => {
                assert_eq!(
                    payload.error,
                    Some(huddle_shared::error_code::ErrorCode::IdAlreadyExists)
                );
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn join_acks_creator_flag_and_name_collisions() {
        let mut registry = RoomRegistry::new();
        create(&mut registry, "a", "Alice", "c1");
        let join = |name: &str| {
            ClientEvent::JoinRoom(RoomMembership {
                room_id: "a".to_string(),
                user_name: name.to_string(),
            })
        };

        let outbox =
            CommandHandler::handle_command(&mut registry, "c2", frame(join("Bob"), Some(5)));
        assert_eq!(
            ack_of(&outbox, 5),
            Some(vec![json!(true), json!({ "isCreator": false, "rejoined": false })])
        );

        let outbox =
            CommandHandler::handle_command(&mut registry, "c3", frame(join("Bob"), Some(6)));
        let args = ack_of(&outbox, 6).unwrap();
        assert_eq!(args[0], json!(false));
        assert_eq!(args[1]["error"], json!("NAME_ALREADY_TAKEN"));
    }

    #[test]
    fn unauthorized_end_meeting_reports_error_event() {
        let mut registry = RoomRegistry::new();
        create(&mut registry, "a", "Alice", "c1");
        CommandHandler::handle_command(
            &mut registry,
            "c2",
            frame(
                ClientEvent::JoinRoom(RoomMembership {
                    room_id: "a".to_string(),
                    user_name: "Bob".to_string(),
                }),
                None,
            ),
        );

        let outbox = CommandHandler::handle_command(
            &mut registry,
            "c2",
            frame(
                ClientEvent::EndMeeting(RoomMembership {
                    room_id: "a".to_string(),
                    user_name: "Bob".to_string(),
                }),
                None,
            ),
        );

        assert_eq!(
            outbox.events_for("c2"),
            vec![&ServerEvent::Error(RoomError::NotAuthorized.to_payload())]
        );
        assert!(registry.contains("a"));
    }

    #[test]
    fn offer_is_relayed_without_room_membership() {
        let mut registry = RoomRegistry::new();

        let outbox = CommandHandler::handle_command(
            &mut registry,
            "stranger",
            frame(
                ClientEvent::Offer(OfferRequest {
                    offer: json!({ "sdp": "v=0" }),
                    to: "peer".to_string(),
                }),
                None,
            ),
        );

        assert_eq!(outbox.events_for("peer").len(), 1);
        assert!(outbox.events_for("stranger").is_empty());
    }

    #[test]
    fn get_users_acks_or_broadcasts() {
        let mut registry = RoomRegistry::new();
        create(&mut registry, "a", "Alice", "c1");

        let outbox = CommandHandler::handle_command(
            &mut registry,
            "c9",
            frame(ClientEvent::GetUsers(RoomRef { room_id: "a".to_string() }), Some(3)),
        );
        let args = ack_of(&outbox, 3).unwrap();
        assert_eq!(args[0][0]["name"], json!("Alice"));
        assert_eq!(args[0][0]["isCreator"], json!(true));

        let outbox = CommandHandler::handle_command(
            &mut registry,
            "c9",
            frame(ClientEvent::GetUsers(RoomRef { room_id: "a".to_string() }), None),
        );
        assert_eq!(outbox.events_for("c1").len(), 1);
        assert!(outbox.events_for("c9").is_empty());

        let outbox = CommandHandler::handle_command(
            &mut registry,
            "c9",
            frame(ClientEvent::GetUsers(RoomRef { room_id: "zzz".to_string() }), Some(4)),
        );
        assert_eq!(ack_of(&outbox, 4), Some(vec![json!([])]));
    }
}
