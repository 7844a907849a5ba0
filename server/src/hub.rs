use std::{collections::HashMap, sync::Arc};

use huddle_shared::{
    ConnID,
    client_event::ClientFrame,
    server_event::{ServerEvent, Welcome},
};
use log::{debug, info};
use rand::{Rng, distr::Alphanumeric, rng};
use tokio::sync::{Mutex, mpsc};

use crate::{
    command_handler::CommandHandler,
    membership::MembershipManager,
    outbox::{Outbox, Recipients},
    registry::RoomRegistry,
};

const CONN_ID_LENGTH: usize = 20;

struct HubState {
    registry: RoomRegistry,
    sessions: HashMap<ConnID, mpsc::Sender<ServerEvent>>,
}

impl HubState {
    fn dispatch(&mut self, outbox: Outbox) {
        for delivery in outbox.into_deliveries() {
            match delivery.recipients {
                Recipients::Connections(connections) => {
                    for conn_id in connections {
                        self.send(&conn_id, delivery.event.clone());
                    }
                }
                Recipients::Everyone => {
                    for (conn_id, tx) in &self.sessions {
                        if let Err(e) = tx.try_send(delivery.event.clone()) {
                            debug!("Dropped broadcast to {}: {}", conn_id, e);
                        }
                    }
                }
            }
        }
    }

    fn send(&self, conn_id: &str, event: ServerEvent) {
        match self.sessions.get(conn_id) {
            Some(tx) => {
                if let Err(e) = tx.try_send(event) {
                    debug!("Dropped event for {}: {}", conn_id, e);
                }
            }
            None => debug!("Dropped event for unknown connection {}", conn_id),
        }
    }
}

/// Shared handle over the room registry and every live connection's outbound
/// queue. Each event runs to completion, fan-out included, under one lock.
#[derive(Clone)]
pub struct Hub {
    state: Arc<Mutex<HubState>>,
    queue_depth: usize,
}

impl Hub {
    pub fn new(queue_depth: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(HubState {
                registry: RoomRegistry::new(),
                sessions: HashMap::new(),
            })),
            queue_depth: queue_depth.max(1),
        }
    }

    /// Registers a new connection. The returned receiver yields its `welcome`
    /// and the current room list first.
    pub async fn connect(&self) -> (ConnID, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(self.queue_depth);
        let mut state = self.state.lock().await;

        let conn_id = loop {
            let candidate = generate_conn_id();
            if !state.sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        state.sessions.insert(conn_id.clone(), tx);
        info!("{} has connected", conn_id);

        let mut outbox = Outbox::new();
        outbox.to_connection(
            &conn_id,
            ServerEvent::Welcome(Welcome {
                connection_id: conn_id.clone(),
            }),
        );
        outbox.to_connection(&conn_id, ServerEvent::RoomsList(state.registry.summaries()));
        state.dispatch(outbox);

        (conn_id, rx)
    }

    pub async fn handle(&self, conn_id: &str, frame: ClientFrame) {
        let mut state = self.state.lock().await;

        let outbox = CommandHandler::handle_command(&mut state.registry, conn_id, frame);
        state.dispatch(outbox);
    }

    pub async fn disconnect(&self, conn_id: &str) {
        let mut state = self.state.lock().await;

        if state.sessions.remove(conn_id).is_none() {
            return;
        }
        info!("{} has disconnected", conn_id);

        let mut outbox = Outbox::new();
        MembershipManager::on_disconnect(&mut state.registry, &mut outbox, conn_id);
        state.dispatch(outbox);
    }

    pub async fn connection_count(&self) -> usize {
        self.state.lock().await.sessions.len()
    }

    pub async fn room_count(&self) -> usize {
        self.state.lock().await.registry.room_count()
    }
}

fn generate_conn_id() -> ConnID {
    rng()
        .sample_iter(&Alphanumeric)
        .take(CONN_ID_LENGTH)
        .map(char::from)
        .collect()
}
