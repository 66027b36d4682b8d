//! Participant to lobby bindings.

use std::collections::HashMap;

use crate::lobby::{LobbyId, ParticipantId, Seat};

/// Where a participant is seated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub lobby_id: LobbyId,
    pub seat: Seat,
}

/// One-to-one map from participant to (lobby, seat).
///
/// A participant is bound to at most one lobby; binding again replaces the
/// previous entry.
#[derive(Debug, Default)]
pub struct Binder {
    bindings: HashMap<ParticipantId, Binding>,
}

impl Binder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a participant, returning any binding it replaced
    pub fn bind(&mut self, participant: ParticipantId, lobby_id: LobbyId, seat: Seat) -> Option<Binding> {
        self.bindings.insert(participant, Binding { lobby_id, seat })
    }

    pub fn unbind(&mut self, participant: ParticipantId) -> Option<Binding> {
        self.bindings.remove(&participant)
    }

    pub fn lookup(&self, participant: ParticipantId) -> Option<&Binding> {
        self.bindings.get(&participant)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
