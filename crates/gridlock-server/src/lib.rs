//! Gridlock multiplayer server.
//!
//! Two participants share one authoritative game per lobby. The pieces,
//! from the inside out:
//!
//! - [`lobby`]: seats, turn and board of a single game
//! - [`binder`]: which lobby and seat each participant occupies
//! - [`registry`]: creates, joins and tears down lobbies
//! - [`coordinator`]: validates and applies moves
//! - [`hub`]: the task that owns the registry and fans out messages
//! - [`server`]: WebSocket transport

pub mod binder;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod hub;
pub mod lobby;
pub mod protocol;
pub mod registry;
pub mod server;

pub use config::ServerConfig;
pub use coordinator::{submit_move, MoveApplied};
pub use error::Rejection;
pub use hub::{Hub, HubEvent, Outbox, HUB_INBOX_CAPACITY, OUTBOX_CAPACITY};
pub use lobby::{GameResult, Lobby, LobbyId, LobbyPhase, ParticipantId, Seat};
pub use registry::{Departure, Registry};
