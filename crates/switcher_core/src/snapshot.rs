//! Read-only views of a game, safe to hand to any player.

use crate::{Board, FigureType, Game, GameId, GameStatus, MovementCard, PlayerId};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Public state of one roster member.
///
/// Face-down figure cards are reported only as a count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct PlayerSnapshot {
    id: PlayerId,
    name: String,
    movement_cards: Vec<MovementCard>,
    figure_cards: Vec<FigureType>,
    figure_reserve: usize,
    pending_moves: usize,
}

/// Public state of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct GameSnapshot {
    id: GameId,
    name: String,
    capacity: u8,
    status: GameStatus,
    host: PlayerId,
    current_turn: Option<PlayerId>,
    players: Vec<PlayerSnapshot>,
    /// Board without the in-turn player's partial moves.
    board: Option<Board>,
    /// Board with the in-turn player's partial moves applied.
    partial_board: Option<Board>,
    winner: Option<PlayerId>,
}

impl GameSnapshot {
    /// Roster entry by id.
    pub fn player(&self, id: PlayerId) -> Option<&PlayerSnapshot> {
        self.players.iter().find(|p| p.id == id)
    }
}

impl Game {
    /// Captures the game's public state.
    pub fn snapshot(&self) -> GameSnapshot {
        let players = self
            .players()
            .iter()
            .map(|player| PlayerSnapshot {
                id: *player.id(),
                name: player.name().clone(),
                movement_cards: player.movement_cards().cards().to_vec(),
                figure_cards: player.figure_cards().face_up().map(|card| card.kind).collect(),
                figure_reserve: player.figure_cards().reserve_len(),
                pending_moves: player.partial_moves().len(),
            })
            .collect();
        GameSnapshot {
            id: *self.id(),
            name: self.name().clone(),
            capacity: *self.capacity(),
            status: *self.status(),
            host: *self.host(),
            current_turn: self.current_player().map(|p| *p.id()),
            players,
            board: self.committed_board(),
            partial_board: self.board().clone(),
            winner: self.winner(),
        }
    }
}
