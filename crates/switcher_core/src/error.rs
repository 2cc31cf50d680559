//! Error taxonomy for engine commands.

use crate::{Difficulty, GameId, GameStatus, MovementType, PlayerId};
use serde::{Deserialize, Serialize};

/// Broad class of a [`GameError`], used by adapters to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The command was well-formed but breaks a game rule.
    #[display("validation")]
    Validation,
    /// A referenced game or player does not exist.
    #[display("not_found")]
    NotFound,
    /// The caller is not allowed to perform the command right now.
    #[display("authorization")]
    Authorization,
    /// An internal invariant was violated.
    #[display("consistency")]
    Consistency,
}

/// Every way an engine command can fail.
///
/// A failed command never leaves partial side effects behind.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum GameError {
    /// Name is empty, too long or contains forbidden characters.
    #[display("Invalid name {:?}: {}", name, reason)]
    InvalidName {
        /// Offending name.
        name: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Game capacity outside the supported 2-4 range.
    #[display("Capacity must be between 2 and 4, got {}", _0)]
    InvalidCapacity(#[error(not(source))] u8),

    /// The game already holds as many players as it admits.
    #[display("Game {} reached its capacity", _0)]
    CapacityReached(#[error(not(source))] GameId),

    /// The roster size does not match the declared capacity.
    #[display("Game needs {} players to start, has {}", capacity, joined)]
    PlayerCountMismatch {
        /// Players currently joined.
        joined: usize,
        /// Declared capacity.
        capacity: u8,
    },

    /// Command requires a running game.
    #[display("Game has not started (status {})", _0)]
    GameNotStarted(#[error(not(source))] GameStatus),

    /// Command requires a game that has not started yet.
    #[display("Game already started (status {})", _0)]
    GameAlreadyStarted(#[error(not(source))] GameStatus),

    /// The game is over; it accepts no further commands.
    #[display("Game {} is finished", _0)]
    GameFinished(#[error(not(source))] GameId),

    /// The player is already a member of another game.
    #[display("Player {} is already in game {}", player, game)]
    AlreadyInGame {
        /// Player trying to join.
        player: PlayerId,
        /// Game the player belongs to.
        game: GameId,
    },

    /// Coordinates are not a legal swap for the card.
    #[display("Illegal movement for card {}", _0)]
    IllegalMovement(#[error(not(source))] MovementType),

    /// Unrecognized movement card type.
    #[display("Unknown movement type {:?}", _0)]
    UnknownMovementType(#[error(not(source))] String),

    /// The player holds no playable card of this type.
    #[display("Card {} not in hand", _0)]
    CardNotInHand(#[error(not(source))] MovementType),

    /// No such game.
    #[display("Game {} not found", _0)]
    GameNotFound(#[error(not(source))] GameId),

    /// No such player.
    #[display("Player {} not found", _0)]
    PlayerNotFound(#[error(not(source))] PlayerId),

    /// The player is not part of the game's roster.
    #[display("Player {} is not in game {}", player, game)]
    PlayerNotInGame {
        /// Player referenced by the command.
        player: PlayerId,
        /// Game the command targeted.
        game: GameId,
    },

    /// Credentials could not be resolved to a player.
    #[display("Invalid or missing credentials")]
    InvalidCredentials,

    /// Host-only command issued by another player.
    #[display("Player {} is not the host", _0)]
    NotHost(#[error(not(source))] PlayerId),

    /// The host tried to leave a game that has not started.
    #[display("Host cannot quit before the game starts")]
    HostCannotQuit,

    /// Turn-bound command issued out of turn.
    #[display("Not your turn, waiting for player {}", _0)]
    NotYourTurn(#[error(not(source))] PlayerId),

    /// Undo requested with an empty partial-move stack.
    #[display("No partial movement to undo")]
    NoPartialMovement,

    /// The figure partition ran out of eligible types.
    #[display("No {} figure type left to deal", _0)]
    FigurePoolExhausted(#[error(not(source))] Difficulty),

    /// A post-command invariant check failed.
    #[display("Invariant violation: {}", _0)]
    InvariantViolation(#[error(not(source))] String),

    /// A lock guarding shared state was poisoned by a panicking writer.
    #[display("State lock poisoned")]
    LockPoisoned,
}

impl GameError {
    /// Classifies the error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidName { .. }
            | Self::InvalidCapacity(_)
            | Self::CapacityReached(_)
            | Self::PlayerCountMismatch { .. }
            | Self::GameNotStarted(_)
            | Self::GameAlreadyStarted(_)
            | Self::GameFinished(_)
            | Self::AlreadyInGame { .. }
            | Self::IllegalMovement(_)
            | Self::UnknownMovementType(_)
            | Self::CardNotInHand(_) => ErrorCategory::Validation,
            Self::GameNotFound(_) | Self::PlayerNotFound(_) | Self::PlayerNotInGame { .. } => {
                ErrorCategory::NotFound
            }
            Self::InvalidCredentials
            | Self::NotHost(_)
            | Self::HostCannotQuit
            | Self::NotYourTurn(_) => ErrorCategory::Authorization,
            Self::NoPartialMovement
            | Self::FigurePoolExhausted(_)
            | Self::InvariantViolation(_)
            | Self::LockPoisoned => ErrorCategory::Consistency,
        }
    }
}
