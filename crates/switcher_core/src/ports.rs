//! Seams between the engine and its adapters.
//!
//! The engine never stores, authenticates or broadcasts on its own; a host
//! application plugs an implementation of each port into its service layer.

use crate::{Game, GameError, GameId, GameSnapshot, GameStatus, PlayerId, PlayerProfile};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Storage for games and player identities.
///
/// `save` replaces the whole aggregate; callers serialize writers to one
/// game themselves.
pub trait PersistencePort: Send + Sync {
    /// Reserves a fresh game id.
    fn next_game_id(&self) -> Result<GameId, GameError>;

    /// Loads a game.
    fn load(&self, id: GameId) -> Result<Game, GameError>;

    /// Stores a game, replacing any previous version.
    fn save(&self, game: &Game) -> Result<(), GameError>;

    /// All games, optionally filtered by status, ordered by id.
    fn list(&self, status: Option<GameStatus>) -> Result<Vec<Game>, GameError>;

    /// Registers a player identity and returns it.
    fn create_player(&self, name: &str) -> Result<PlayerProfile, GameError>;

    /// Loads a player identity.
    fn load_player(&self, id: PlayerId) -> Result<PlayerProfile, GameError>;

    /// Records that `player` belongs to `game`.
    ///
    /// Fails with [`GameError::AlreadyInGame`] if the player already
    /// belongs to a game.
    fn claim_membership(&self, player: PlayerId, game: GameId) -> Result<(), GameError>;

    /// Clears the player's membership, but only while it still points at
    /// `game`. A membership in any other game is left alone.
    fn release_membership(&self, player: PlayerId, game: GameId) -> Result<(), GameError>;
}

/// Resolves caller credentials to a player.
pub trait AuthPort: Send + Sync {
    /// Issues a credential for a freshly registered player.
    fn issue(&self, player: PlayerId) -> Result<String, GameError>;

    /// Maps a credential back to its player.
    ///
    /// Fails with [`GameError::InvalidCredentials`] for unknown tokens.
    fn resolve(&self, token: &str) -> Result<PlayerId, GameError>;
}

/// Outbound event sink.
pub trait NotificationPort: Send + Sync {
    /// Delivers a notification to the game's listeners. Best effort.
    fn publish(&self, notification: Notification);

    /// Drops whatever the sink keeps for a game that is over.
    fn retire(&self, game: GameId);
}

/// Kind of state change being announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    /// A player joined.
    PlayerConnected,
    /// A player left.
    PlayerDisconnected,
    /// The host started the game.
    GameStarted,
    /// A turn was committed.
    FinishTurn,
    /// A partial move was applied or undone.
    BoardUpdate,
    /// A single player remains.
    GameWon,
}

/// A state change of one game, with the state it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_new::new)]
pub struct Notification {
    game_id: GameId,
    kind: EventKind,
    message: String,
    snapshot: GameSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&EventKind::PlayerConnected).expect("serializes"),
            "\"player_connected\""
        );
        assert_eq!(EventKind::GameWon.to_string(), "game_won");
    }
}
