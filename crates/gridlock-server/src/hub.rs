//! Event hub: the single owner of all lobby state.
//!
//! Connection tasks never touch the registry. They forward [`HubEvent`]s
//! over a channel and the hub handles them one at a time, each to
//! completion, so no two state transitions ever interleave.

use dashmap::DashMap;
use gridlock_core::Variant;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use crate::coordinator::submit_move;
use crate::error::Rejection;
use crate::lobby::{LobbyPhase, ParticipantId, Seat};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::registry::{Departure, Registry};

/// Queued events the hub accepts before connection tasks wait
pub const HUB_INBOX_CAPACITY: usize = 1024;

/// Messages buffered per connection before it counts as a stalled reader
pub const OUTBOX_CAPACITY: usize = 256;

/// Per-connection outbound channels.
///
/// Channels are bounded. A participant whose channel is full is not reading
/// its socket; its sender is dropped, which ends that connection's writer.
#[derive(Debug, Default)]
pub struct Outbox {
    senders: DashMap<ParticipantId, mpsc::Sender<ServerMessage>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, participant: ParticipantId, sender: mpsc::Sender<ServerMessage>) {
        self.senders.insert(participant, sender);
    }

    pub fn unregister(&self, participant: ParticipantId) {
        self.senders.remove(&participant);
    }

    pub fn is_registered(&self, participant: ParticipantId) -> bool {
        self.senders.contains_key(&participant)
    }

    /// Send a message to a specific participant.
    pub fn send(&self, participant: ParticipantId, msg: ServerMessage) {
        let stalled = match self.senders.get(&participant) {
            Some(sender) => matches!(sender.try_send(msg), Err(TrySendError::Full(_))),
            None => false,
        };

        if stalled {
            warn!("Outbox for {} is full, dropping connection", participant);
            self.unregister(participant);
        }
    }

    /// Send a message to each of the given participants.
    pub fn broadcast(&self, participants: &[ParticipantId], msg: ServerMessage) {
        for participant in participants {
            self.send(*participant, msg.clone());
        }
    }
}

/// Input to the hub
#[derive(Debug)]
pub enum HubEvent {
    Message {
        participant: ParticipantId,
        message: ClientMessage,
    },
    Disconnected {
        participant: ParticipantId,
    },
}

/// Lobby state plus the means to reach participants
pub struct Hub {
    registry: Registry,
    outbox: Arc<Outbox>,
    rng: StdRng,
    idle_timeout: Option<Duration>,
}

impl Hub {
    pub fn new(outbox: Arc<Outbox>, idle_timeout: Option<Duration>) -> Self {
        Self {
            registry: Registry::new(),
            outbox,
            rng: StdRng::from_entropy(),
            idle_timeout,
        }
    }

    /// Use a fixed seed for lobby ids
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Process events until every sender is dropped
    pub async fn run(mut self, mut events: mpsc::Receiver<HubEvent>, sweep_interval: Duration) {
        let mut sweep = tokio::time::interval(sweep_interval);
        sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle(event),
                    None => break,
                },
                _ = sweep.tick(), if self.idle_timeout.is_some() => {
                    self.sweep(Instant::now());
                }
            }
        }

        info!("Hub stopped with {} live lobbies", self.registry.lobby_count());
    }

    /// Handle one event to completion
    pub fn handle(&mut self, event: HubEvent) {
        match event {
            HubEvent::Message {
                participant,
                message,
            } => self.handle_message(participant, message),
            HubEvent::Disconnected { participant } => {
                debug!("{} disconnected", participant);
                if let Some(departure) = self.registry.remove_participant(participant) {
                    self.notify_departure(&departure);
                }
            }
        }
    }

    fn handle_message(&mut self, participant: ParticipantId, message: ClientMessage) {
        match message {
            ClientMessage::CreateLobby { variant, size } => {
                self.create_lobby(participant, &variant, size)
            }

            ClientMessage::JoinLobby { lobby_id } => {
                match self.registry.join_lobby(participant, &lobby_id) {
                    Ok(joined) => {
                        if let Some(previous) = &joined.previous {
                            self.notify_departure(previous);
                        }
                        let recipients: Vec<ParticipantId> = joined.seats.values().copied().collect();
                        self.outbox.broadcast(
                            &recipients,
                            ServerMessage::PlayerJoined {
                                lobby_id: joined.lobby_id,
                                seats: joined.seats,
                                turn: joined.turn,
                                board: joined.board,
                            },
                        );
                    }
                    Err(Rejection::LobbyFull) => {
                        self.outbox.send(participant, ServerMessage::LobbyFull {});
                    }
                    Err(e) => {
                        warn!("{} could not join {}: {}", participant, lobby_id, e);
                        self.outbox.send(participant, ServerMessage::error(&e));
                    }
                }
            }

            ClientMessage::MakeMove {
                lobby_id,
                position,
            } => match submit_move(&mut self.registry, participant, &lobby_id, position) {
                Ok(applied) => {
                    self.outbox.broadcast(
                        &applied.recipients,
                        ServerMessage::MoveMade {
                            lobby_id: applied.lobby_id,
                            seat: applied.seat,
                            position: applied.position,
                            board: applied.board,
                            next_turn: applied.next_turn,
                            result: applied.result,
                        },
                    );
                }
                Err(e) => {
                    debug!("Move by {} in {} rejected: {}", participant, lobby_id, e);
                    self.outbox
                        .send(participant, ServerMessage::move_rejected(lobby_id, &e));
                }
            },

            ClientMessage::LeaveLobby => {
                if let Some(departure) = self.registry.remove_participant(participant) {
                    self.outbox.send(
                        participant,
                        ServerMessage::LeftLobby {
                            lobby_id: departure.lobby_id.clone(),
                        },
                    );
                    self.notify_departure(&departure);
                }
            }

            ClientMessage::Ping => {
                self.outbox.send(participant, ServerMessage::Pong {});
            }
        }
    }

    fn create_lobby(&mut self, participant: ParticipantId, kind: &str, size: Option<u8>) {
        let created = Variant::from_kind(kind, size)
            .map_err(Rejection::from)
            .and_then(|variant| self.registry.create_lobby(participant, variant, &mut self.rng));

        match created {
            Ok(created) => {
                if let Some(previous) = &created.previous {
                    self.notify_departure(previous);
                }
                self.outbox.send(
                    participant,
                    ServerMessage::LobbyCreated {
                        lobby_id: created.lobby_id,
                        seat: Seat::First,
                        variant: created.variant,
                    },
                );
            }
            Err(e) => {
                warn!("{} could not create a lobby: {}", participant, e);
                self.outbox.send(participant, ServerMessage::error(&e));
            }
        }
    }

    /// Tell whoever is still seated that their opponent is gone
    fn notify_departure(&self, departure: &Departure) {
        if departure.phase == LobbyPhase::WaitingForSecondPlayer {
            return;
        }
        self.outbox.broadcast(
            &departure.remaining,
            ServerMessage::OpponentLeft {
                lobby_id: departure.lobby_id.clone(),
                seat: departure.seat,
            },
        );
    }

    /// Close lobbies idle for longer than the configured timeout
    pub fn sweep(&mut self, now: Instant) {
        let Some(timeout) = self.idle_timeout else {
            return;
        };

        for closed in self.registry.sweep_idle(now, timeout) {
            self.outbox.broadcast(
                &closed.participants,
                ServerMessage::LobbyClosed {
                    lobby_id: closed.lobby_id,
                    reason: "idle".to_string(),
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RejectReason;
    use uuid::Uuid;

    struct Client {
        id: ParticipantId,
        rx: mpsc::Receiver<ServerMessage>,
    }

    impl Client {
        fn connect(outbox: &Outbox) -> Self {
            let (tx, rx) = mpsc::channel(OUTBOX_CAPACITY);
            let id = Uuid::new_v4();
            outbox.register(id, tx);
            Self { id, rx }
        }

        fn drain(&mut self) -> Vec<ServerMessage> {
            let mut messages = Vec::new();
            while let Ok(msg) = self.rx.try_recv() {
                messages.push(msg);
            }
            messages
        }
    }

    fn send(hub: &mut Hub, client: &Client, message: ClientMessage) {
        hub.handle(HubEvent::Message {
            participant: client.id,
            message,
        });
    }

    fn create(hub: &mut Hub, host: &mut Client) -> String {
        send(
            hub,
            host,
            ClientMessage::CreateLobby {
                variant: "classic".into(),
                size: None,
            },
        );
        match host.drain().pop() {
            Some(ServerMessage::LobbyCreated { lobby_id, .. }) => lobby_id,
            other => panic!("expected lobby-created, got {:?}", other),
        }
    }

    fn hub_with(outbox: &Arc<Outbox>, idle_timeout: Option<Duration>) -> Hub {
        Hub::new(Arc::clone(outbox), idle_timeout).with_seed(9)
    }

    #[test]
    fn test_join_broadcasts_to_both_seats() {
        let outbox = Arc::new(Outbox::new());
        let mut hub = hub_with(&outbox, None);
        let mut host = Client::connect(&outbox);
        let mut guest = Client::connect(&outbox);

        let lobby_id = create(&mut hub, &mut host);
        send(&mut hub, &guest, ClientMessage::JoinLobby { lobby_id });

        for client in [&mut host, &mut guest] {
            let messages = client.drain();
            assert!(matches!(
                messages.as_slice(),
                [ServerMessage::PlayerJoined { seats, .. }] if seats.len() == 2
            ));
        }
    }

    #[test]
    fn test_move_reaches_both_rejection_only_submitter() {
        let outbox = Arc::new(Outbox::new());
        let mut hub = hub_with(&outbox, None);
        let mut host = Client::connect(&outbox);
        let mut guest = Client::connect(&outbox);

        let lobby_id = create(&mut hub, &mut host);
        send(&mut hub, &guest, ClientMessage::JoinLobby { lobby_id: lobby_id.clone() });
        host.drain();
        guest.drain();

        send(&mut hub, &host, ClientMessage::MakeMove { lobby_id: lobby_id.clone(), position: 4 });
        assert!(matches!(host.drain().as_slice(), [ServerMessage::MoveMade { .. }]));
        assert!(matches!(guest.drain().as_slice(), [ServerMessage::MoveMade { .. }]));

        send(&mut hub, &host, ClientMessage::MakeMove { lobby_id, position: 0 });
        assert!(matches!(
            host.drain().as_slice(),
            [ServerMessage::MoveRejected { reason: RejectReason::NotYourTurn, .. }]
        ));
        assert!(guest.drain().is_empty());
    }

    #[test]
    fn test_full_lobby_and_unknown_variant() {
        let outbox = Arc::new(Outbox::new());
        let mut hub = hub_with(&outbox, None);
        let mut host = Client::connect(&outbox);
        let guest = Client::connect(&outbox);
        let mut late = Client::connect(&outbox);

        let lobby_id = create(&mut hub, &mut host);
        send(&mut hub, &guest, ClientMessage::JoinLobby { lobby_id: lobby_id.clone() });
        send(&mut hub, &late, ClientMessage::JoinLobby { lobby_id });
        assert!(matches!(late.drain().as_slice(), [ServerMessage::LobbyFull {}]));

        send(
            &mut hub,
            &late,
            ClientMessage::CreateLobby { variant: "hexagon".into(), size: None },
        );
        assert!(matches!(
            late.drain().as_slice(),
            [ServerMessage::Error { reason: RejectReason::InvalidVariant, .. }]
        ));
        assert_eq!(hub.registry().lobby_count(), 1);
    }

    #[test]
    fn test_disconnect_notifies_opponent() {
        let outbox = Arc::new(Outbox::new());
        let mut hub = hub_with(&outbox, None);
        let mut host = Client::connect(&outbox);
        let mut guest = Client::connect(&outbox);

        let lobby_id = create(&mut hub, &mut host);
        send(&mut hub, &guest, ClientMessage::JoinLobby { lobby_id: lobby_id.clone() });
        guest.drain();

        hub.handle(HubEvent::Disconnected { participant: host.id });
        assert!(matches!(
            guest.drain().as_slice(),
            [ServerMessage::OpponentLeft { seat: Seat::First, .. }]
        ));

        send(&mut hub, &guest, ClientMessage::LeaveLobby);
        assert!(matches!(guest.drain().as_slice(), [ServerMessage::LeftLobby { .. }]));
        assert!(hub.registry().lobby(&lobby_id).is_none());
    }

    #[test]
    fn test_idle_sweep_closes_lobby() {
        let outbox = Arc::new(Outbox::new());
        let timeout = Duration::from_secs(120);
        let mut hub = hub_with(&outbox, Some(timeout));
        let mut host = Client::connect(&outbox);

        create(&mut hub, &mut host);
        hub.sweep(Instant::now() + timeout);

        assert!(matches!(
            host.drain().as_slice(),
            [ServerMessage::LobbyClosed { reason, .. }] if reason == "idle"
        ));
        assert_eq!(hub.registry().lobby_count(), 0);
    }

    #[test]
    fn test_ping() {
        let outbox = Arc::new(Outbox::new());
        let mut hub = hub_with(&outbox, None);
        let mut client = Client::connect(&outbox);

        send(&mut hub, &client, ClientMessage::Ping);
        assert!(matches!(client.drain().as_slice(), [ServerMessage::Pong {}]));
    }

    #[test]
    fn test_stalled_reader_is_dropped() {
        let outbox = Outbox::new();
        let participant = Uuid::new_v4();
        let (tx, mut rx) = mpsc::channel(1);
        outbox.register(participant, tx);

        outbox.send(participant, ServerMessage::Pong {});
        assert!(outbox.is_registered(participant));

        // Second message finds the channel full
        outbox.send(participant, ServerMessage::Pong {});
        assert!(!outbox.is_registered(participant));

        assert!(matches!(rx.try_recv(), Ok(ServerMessage::Pong {})));
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_ping_flood_is_bounded() {
        let outbox = Arc::new(Outbox::new());
        let mut hub = hub_with(&outbox, None);
        let mut client = Client::connect(&outbox);

        for _ in 0..OUTBOX_CAPACITY + 10 {
            send(&mut hub, &client, ClientMessage::Ping);
        }

        assert!(!outbox.is_registered(client.id));
        assert_eq!(client.drain().len(), OUTBOX_CAPACITY);
    }
}
