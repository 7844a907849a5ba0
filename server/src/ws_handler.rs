use core::error::Error;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use huddle_shared::{client_event::ClientFrame, server_event::ServerEvent};
use log::{debug, error, info, warn};
use tokio::{
    sync::mpsc,
    time::{self, Instant, MissedTickBehavior},
};

use crate::{hub::Hub, server::AppState};

const MAX_FRAME_SIZE: usize = 256 * 1024;

/// Liveness probing for one session. A ping goes out every `interval`; a peer
/// that has sent nothing, pongs included, for longer than `timeout` is dropped.
/// A write that stalls for `timeout` drops the peer as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heartbeat {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(25),
            timeout: Duration::from_secs(30),
        }
    }
}

pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.max_message_size(MAX_FRAME_SIZE)
        .on_upgrade(move |socket| async move {
            WsHandler::handle_socket(socket, state.hub, state.heartbeat).await;
        })
}

pub struct WsHandler;

impl WsHandler {
    pub async fn handle_socket(socket: WebSocket, hub: Hub, heartbeat: Heartbeat) {
        let (conn_id, mut outbound_rx) = hub.connect().await;

        if let Err(e) =
            Self::handle_stream(socket, &conn_id, &hub, &mut outbound_rx, heartbeat).await
        {
            error!("Error handling WebSocket {}: {}", conn_id, e);
        }

        hub.disconnect(&conn_id).await;
    }

    async fn handle_stream(
        socket: WebSocket,
        conn_id: &str,
        hub: &Hub,
        outbound_rx: &mut mpsc::Receiver<ServerEvent>,
        heartbeat: Heartbeat,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let (mut ws_tx, mut ws_rx) = socket.split();

        let mut ping_interval =
            time::interval_at(Instant::now() + heartbeat.interval, heartbeat.interval);
        ping_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_seen = Instant::now();

        loop {
            tokio::select! {

                incoming = ws_rx.next() => {

                    let message = match incoming {
                        Some(message) => message?,
                        None => return Ok(()),
                    };
                    last_seen = Instant::now();

                    match message {
                        Message::Text(text) => {
                            match serde_json::from_str::<ClientFrame>(text.as_str()) {
                                Ok(frame) => hub.handle(conn_id, frame).await,
                                Err(e) => warn!("Ignoring malformed frame from {}: {}", conn_id, e),
                            }
                        }
                        Message::Close(_) => return Ok(()),
                        Message::Binary(_) => debug!("Ignoring binary frame from {}", conn_id),
                        Message::Ping(_) | Message::Pong(_) => {}
                    }
                }

                outgoing = outbound_rx.recv() => {

                    let event = match outgoing {
                        Some(event) => event,
                        None => return Ok(()),
                    };

                    let json = serde_json::to_string(&event)?;
                    let send = ws_tx.send(Message::Text(json.into()));
                    time::timeout(heartbeat.timeout, send).await??;
                }

                _ = ping_interval.tick() => {

                    if last_seen.elapsed() > heartbeat.timeout {
                        info!("{} missed its heartbeat, dropping", conn_id);
                        return Ok(());
                    }

                    let ping = ws_tx.send(Message::Ping(Bytes::new()));
                    time::timeout(heartbeat.timeout, ping).await??;
                }
            }
        }
    }
}
