//! WebSocket server and connection handling.

use crate::hub::{HubEvent, Outbox, OUTBOX_CAPACITY};
use crate::protocol::{ClientMessage, ServerMessage};
use futures_util::{SinkExt, StreamExt};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Pause after a failed `accept` before trying again
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// State shared by all connection tasks.
///
/// Connections only hold the hub's inbox and the outbox; lobby state lives
/// in the hub task.
#[derive(Clone)]
pub struct ServerState {
    pub outbox: Arc<Outbox>,
    pub hub: mpsc::Sender<HubEvent>,
}

impl ServerState {
    pub fn new(outbox: Arc<Outbox>, hub: mpsc::Sender<HubEvent>) -> Self {
        Self { outbox, hub }
    }

    async fn forward(&self, event: HubEvent) {
        if self.hub.send(event).await.is_err() {
            error!("Hub is gone, dropping event");
        }
    }
}

/// Run the WebSocket server.
///
/// Only a failure to bind is returned; failed accepts are logged and retried.
pub async fn run_server(addr: SocketAddr, state: ServerState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Gridlock server listening on {}", addr);

    loop {
        if let Some(backoff) = handle_accept(listener.accept().await, &state) {
            tokio::time::sleep(backoff).await;
        }
    }
}

/// Spawn a connection task for an accepted socket.
///
/// Returns how long to wait before the next `accept` when it failed.
pub fn handle_accept(
    accepted: io::Result<(TcpStream, SocketAddr)>,
    state: &ServerState,
) -> Option<Duration> {
    match accepted {
        Ok((stream, peer_addr)) => {
            let state = state.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, peer_addr, state).await {
                    error!("Connection error from {}: {}", peer_addr, e);
                }
            });
            None
        }
        Err(e) => {
            error!("Accept failed: {}", e);
            Some(ACCEPT_BACKOFF)
        }
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: ServerState,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let participant = Uuid::new_v4();

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(OUTBOX_CAPACITY);
    state.outbox.register(participant, tx);
    state.outbox.send(
        participant,
        ServerMessage::Welcome {
            participant_id: participant,
        },
    );

    // Spawn task to forward messages from channel to WebSocket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    });

    loop {
        tokio::select! {
            msg = ws_receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(message) => {
                        state
                            .forward(HubEvent::Message {
                                participant,
                                message,
                            })
                            .await
                    }
                    Err(e) => warn!("Dropping malformed message from {}: {}", participant, e),
                },
                Some(Ok(Message::Close(_))) | None => {
                    info!("Client {} closing connection", participant);
                    break;
                }
                Some(Err(e)) => {
                    error!("WebSocket error from {}: {}", participant, e);
                    break;
                }
                Some(Ok(_)) => {}
            },
            // Writer stops when the socket fails or the outbox dropped a slow reader
            _ = &mut send_task => {
                warn!("Outbound stream for {} ended", participant);
                break;
            }
        }
    }

    // A dropped connection leaves its lobby
    state.forward(HubEvent::Disconnected { participant }).await;
    state.outbox.unregister(participant);
    send_task.abort();

    info!("Connection closed for {}", participant);
    Ok(())
}
