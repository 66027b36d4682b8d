//! Lobby registry.
//!
//! The registry is the only writer of the lobby collection and of the
//! participant bindings. Seat assignment and storage happen in the same
//! call, so a lobby is never observable half-created.

use gridlock_core::{Board, Variant};
use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::binder::{Binder, Binding};
use crate::error::Rejection;
use crate::lobby::{generate_lobby_id, Lobby, LobbyId, LobbyPhase, ParticipantId, Seat};

/// Attempts at drawing an unused lobby id before giving up
pub const MAX_ID_ATTEMPTS: usize = 32;

/// A participant left (or was moved out of) a lobby
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub lobby_id: LobbyId,
    pub seat: Seat,
    /// Participants still seated, to be told about the departure
    pub remaining: Vec<ParticipantId>,
    pub phase: LobbyPhase,
    /// The lobby emptied and was deleted
    pub lobby_closed: bool,
}

/// Result of a successful create
#[derive(Debug, Clone)]
pub struct Created {
    pub lobby_id: LobbyId,
    pub variant: Variant,
    /// Lobby the creator was implicitly removed from
    pub previous: Option<Departure>,
}

/// Snapshot broadcast to both seats once the second seat fills
#[derive(Debug, Clone)]
pub struct Joined {
    pub lobby_id: LobbyId,
    pub seats: BTreeMap<Seat, ParticipantId>,
    pub turn: Seat,
    pub board: Board,
    pub previous: Option<Departure>,
}

/// A lobby removed by the idle sweep
#[derive(Debug, Clone)]
pub struct ClosedLobby {
    pub lobby_id: LobbyId,
    pub participants: Vec<ParticipantId>,
}

/// All live lobbies plus the participant bindings
#[derive(Debug, Default)]
pub struct Registry {
    lobbies: HashMap<LobbyId, Lobby>,
    binder: Binder,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a lobby with `requester` in the first seat.
    ///
    /// A requester already seated elsewhere leaves that lobby first.
    pub fn create_lobby<R: Rng + ?Sized>(
        &mut self,
        requester: ParticipantId,
        variant: Variant,
        rng: &mut R,
    ) -> Result<Created, Rejection> {
        let lobby_id = self.fresh_id(rng)?;
        let previous = self.remove_participant(requester);

        self.lobbies.insert(
            lobby_id.clone(),
            Lobby::new(lobby_id.clone(), variant, requester),
        );
        self.binder.bind(requester, lobby_id.clone(), Seat::First);
        info!("Lobby {} created ({}) by {}", lobby_id, variant, requester);

        Ok(Created {
            lobby_id,
            variant,
            previous,
        })
    }

    /// Seat `requester` as the second player of an existing lobby
    pub fn join_lobby(
        &mut self,
        requester: ParticipantId,
        lobby_id: &str,
    ) -> Result<Joined, Rejection> {
        let lobby = self.lobbies.get(lobby_id).ok_or(Rejection::NoSuchLobby)?;
        if lobby.seat_of(requester).is_some() {
            return Err(Rejection::AlreadySeated);
        }
        if lobby.phase() != LobbyPhase::WaitingForSecondPlayer || lobby.is_full() {
            return Err(Rejection::LobbyFull);
        }

        // The requester is not in this lobby, so leaving elsewhere cannot delete it
        let previous = self.remove_participant(requester);

        let lobby = self
            .lobbies
            .get_mut(lobby_id)
            .ok_or(Rejection::NoSuchLobby)?;
        lobby.seat_second(requester)?;
        let board = lobby.board().cloned().ok_or(Rejection::GameNotActive)?;
        let joined = Joined {
            lobby_id: lobby.id.clone(),
            seats: lobby.seats().clone(),
            turn: lobby.turn(),
            board,
            previous,
        };

        self.binder.bind(requester, joined.lobby_id.clone(), Seat::Second);
        info!("{} joined lobby {}", requester, lobby_id);
        Ok(joined)
    }

    /// Remove a participant from whatever lobby it is seated in.
    ///
    /// Deletes the lobby once its last seat empties. Calling this for an
    /// unbound participant does nothing.
    pub fn remove_participant(&mut self, participant: ParticipantId) -> Option<Departure> {
        let Binding { lobby_id, seat } = self.binder.unbind(participant)?;

        let Some(lobby) = self.lobbies.get_mut(&lobby_id) else {
            warn!("{} was bound to missing lobby {}", participant, lobby_id);
            return None;
        };

        lobby.vacate(participant);
        let departure = Departure {
            remaining: lobby.participants(),
            phase: lobby.phase(),
            lobby_closed: lobby.is_empty(),
            lobby_id,
            seat,
        };

        if departure.lobby_closed {
            self.lobbies.remove(&departure.lobby_id);
            info!("Lobby {} closed", departure.lobby_id);
        } else {
            debug!("{} left lobby {}", participant, departure.lobby_id);
        }

        Some(departure)
    }

    /// Delete every lobby with no activity for `timeout`
    pub fn sweep_idle(&mut self, now: Instant, timeout: Duration) -> Vec<ClosedLobby> {
        let idle: Vec<LobbyId> = self
            .lobbies
            .values()
            .filter(|lobby| lobby.is_idle(now, timeout))
            .map(|lobby| lobby.id.clone())
            .collect();

        idle.into_iter()
            .filter_map(|lobby_id| {
                let lobby = self.lobbies.remove(&lobby_id)?;
                let participants = lobby.participants();
                for participant in &participants {
                    self.binder.unbind(*participant);
                }
                info!("Lobby {} closed after idling", lobby_id);
                Some(ClosedLobby {
                    lobby_id,
                    participants,
                })
            })
            .collect()
    }

    pub fn lobby(&self, lobby_id: &str) -> Option<&Lobby> {
        self.lobbies.get(lobby_id)
    }

    pub(crate) fn lobby_mut(&mut self, lobby_id: &str) -> Option<&mut Lobby> {
        self.lobbies.get_mut(lobby_id)
    }

    pub fn lookup(&self, participant: ParticipantId) -> Option<&Binding> {
        self.binder.lookup(participant)
    }

    pub fn lobby_count(&self) -> usize {
        self.lobbies.len()
    }

    pub fn participant_count(&self) -> usize {
        self.binder.len()
    }

    fn fresh_id<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<LobbyId, Rejection> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = generate_lobby_id(rng);
            if !self.lobbies.contains_key(&candidate) {
                return Ok(candidate);
            }
            debug!("Lobby id {} already taken, drawing again", candidate);
        }
        warn!("Gave up allocating a lobby id after {} attempts", MAX_ID_ATTEMPTS);
        Err(Rejection::LobbyIdExhausted)
    }
}
