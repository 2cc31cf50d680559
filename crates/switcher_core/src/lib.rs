//! Rules engine for Switcher, a turn-based color-swapping board game.
//!
//! Two to four players share a 6x6 board of colored tiles. On their turn a
//! player spends movement cards to swap pairs of tiles, may undo those
//! tentative swaps in reverse order, and finally commits them. Figure cards
//! are dealt at start and flipped into hand over time.
//!
//! This crate holds only the pure game state and rules. Storage, identity
//! and event delivery are reached through the traits in [`PersistencePort`],
//! [`AuthPort`] and [`NotificationPort`].

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod board;
mod error;
mod figure_deck;
mod game;
mod invariants;
mod movement;
mod movement_deck;
mod player;
mod ports;
mod snapshot;
mod turn;

pub use board::{Board, CELLS_PER_COLOR, Color};
pub use error::{ErrorCategory, GameError};
pub use figure_deck::{
    COPIES_PER_TYPE, DIFFICULT_TYPES, Difficulty, EASY_TYPES, FigureCard, FigureHand,
    FigurePartition, FigureType,
};
pub use game::{Game, GameId, GameStatus, MAX_PLAYERS, MIN_PLAYERS, QuitOutcome, validate_game_name};
pub use invariants::{
    GameInvariants, HandsBounded, Invariant, InvariantSet, PartialMovesMatchDiscards,
    StatusMatchesRoster, TurnInBounds,
};
pub use movement::{BOARD_SIZE, Coordinate, MoveCatalog, Movement, MovementType};
pub use movement_deck::{HAND_SIZE, MovementCard, MovementHand};
pub use player::{MAX_NAME_LEN, Player, PlayerId, PlayerProfile, validate_player_name};
pub use ports::{AuthPort, EventKind, Notification, NotificationPort, PersistencePort};
pub use snapshot::{GameSnapshot, PlayerSnapshot};
pub use turn::{
    MoveStack, PartialMove, TurnEngine, apply_partial_move, committed_board, partial_view,
    revert_all, undo_partial_move,
};
