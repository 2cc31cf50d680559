//! Player identity and per-game player state.

use crate::turn::MoveStack;
use crate::{FigureHand, GameError, GameId, MovementHand};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

/// Longest accepted player or game name, in characters.
pub const MAX_NAME_LEN: usize = 20;

/// Unique identifier for a player.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct PlayerId(u64);

/// Registered player identity, independent of any game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct PlayerProfile {
    id: PlayerId,
    name: String,
    game: Option<GameId>,
}

impl PlayerProfile {
    /// Creates a profile after validating the name.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidName`] for an empty or overlong name.
    #[instrument]
    pub fn new(id: PlayerId, name: &str) -> Result<Self, GameError> {
        let name = validate_player_name(name)?;
        Ok(Self {
            id,
            name,
            game: None,
        })
    }

    /// Records the game the player belongs to, or `None` once they leave.
    pub fn set_game(&mut self, game: Option<GameId>) {
        self.game = game;
    }
}

/// Validates a player display name and returns it trimmed.
///
/// # Errors
///
/// Returns [`GameError::InvalidName`] for an empty or overlong name.
pub fn validate_player_name(name: &str) -> Result<String, GameError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        warn!("Rejected empty player name");
        return Err(GameError::InvalidName {
            name: name.to_string(),
            reason: "name is empty",
        });
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        warn!(name, "Rejected overlong player name");
        return Err(GameError::InvalidName {
            name: name.to_string(),
            reason: "name is longer than 20 characters",
        });
    }
    Ok(trimmed.to_string())
}

/// A player's state inside one game: both hands and the partial moves of
/// the current turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Player {
    pub(crate) id: PlayerId,
    pub(crate) name: String,
    pub(crate) movement_cards: MovementHand,
    pub(crate) figure_cards: FigureHand,
    pub(crate) partial_moves: MoveStack,
}

impl Player {
    /// A player with empty hands.
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            movement_cards: MovementHand::default(),
            figure_cards: FigureHand::default(),
            partial_moves: MoveStack::default(),
        }
    }

    /// Drops every movement and figure card the player owns.
    #[instrument(skip(self), fields(player_id = %self.id))]
    pub fn clear_cards(&mut self) {
        self.movement_cards.clear();
        self.figure_cards.clear();
    }
}
