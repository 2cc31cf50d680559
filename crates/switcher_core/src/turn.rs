//! Turn rotation and the per-turn stack of tentative swaps.

use crate::{Board, GameError, MoveCatalog, Movement, Player};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

/// A swap applied during the current turn and not yet committed.
pub type PartialMove = Movement;

/// Last-in first-out record of a player's partial moves.
///
/// Entries live in an arena addressed by `top`; popping only lowers `top`,
/// and the next push overwrites the freed slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<PartialMove>", into = "Vec<PartialMove>")]
pub struct MoveStack {
    arena: Vec<PartialMove>,
    top: usize,
}

impl MoveStack {
    /// Pushes a move on top.
    pub fn push(&mut self, entry: PartialMove) {
        self.arena.truncate(self.top);
        self.arena.push(entry);
        self.top += 1;
    }

    /// Removes and returns the most recent move.
    pub fn pop(&mut self) -> Option<PartialMove> {
        if self.top == 0 {
            return None;
        }
        self.top -= 1;
        Some(self.arena[self.top])
    }

    /// Most recent move, if any.
    pub fn peek(&self) -> Option<&PartialMove> {
        self.live().last()
    }

    /// Moves in the order they were applied.
    pub fn iter(&self) -> std::slice::Iter<'_, PartialMove> {
        self.live().iter()
    }

    /// Number of live moves.
    pub fn len(&self) -> usize {
        self.top
    }

    /// Whether no move is pending.
    pub fn is_empty(&self) -> bool {
        self.top == 0
    }

    /// Drops every move, making the swaps permanent.
    pub fn commit(&mut self) {
        self.arena.clear();
        self.top = 0;
    }

    fn live(&self) -> &[PartialMove] {
        &self.arena[..self.top]
    }
}

impl PartialEq for MoveStack {
    fn eq(&self, other: &Self) -> bool {
        self.live() == other.live()
    }
}

impl Eq for MoveStack {}

impl From<Vec<PartialMove>> for MoveStack {
    fn from(arena: Vec<PartialMove>) -> Self {
        let top = arena.len();
        Self { arena, top }
    }
}

impl From<MoveStack> for Vec<PartialMove> {
    fn from(stack: MoveStack) -> Self {
        let mut arena = stack.arena;
        arena.truncate(stack.top);
        arena
    }
}

/// Index of the roster member whose turn it is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnEngine {
    index: usize,
}

impl TurnEngine {
    /// Picks a uniformly random starting player.
    #[instrument(skip(rng))]
    pub fn random_initial<R: Rng>(player_count: usize, rng: &mut R) -> Self {
        let index = if player_count == 0 {
            0
        } else {
            rng.random_range(0..player_count)
        };
        debug!(index, "Initial turn chosen");
        Self { index }
    }

    /// Engine pointing at an explicit roster slot.
    pub fn at(index: usize) -> Self {
        Self { index }
    }

    /// Current roster index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Hands the turn to the next player in roster order.
    pub fn advance(&mut self, player_count: usize) -> usize {
        self.index = if player_count == 0 {
            0
        } else {
            (self.index + 1) % player_count
        };
        self.index
    }

    /// Keeps the turn on the right player after roster slot `removed` is
    /// vacated. `remaining` is the roster size after removal.
    pub fn on_player_removed(&mut self, removed: usize, remaining: usize) {
        if removed < self.index {
            self.index -= 1;
        }
        if self.index >= remaining {
            self.index = 0;
        }
    }

    /// Closes `player`'s turn: partial moves become permanent, played
    /// movement cards are replaced, figure cards are topped up from the
    /// reserve, and the turn passes on.
    #[instrument(skip(self, player, rng), fields(player_id = %player.id))]
    pub fn commit<R: Rng>(&mut self, player: &mut Player, player_count: usize, rng: &mut R) {
        let replaced = player.movement_cards.replenish(rng);
        let flipped = player.figure_cards.deal_to_hand(rng);
        player.partial_moves.commit();
        let next = self.advance(player_count);
        debug!(replaced, flipped, next, "Turn committed");
    }
}

/// Validates and applies one swap, recording it on the player's stack.
///
/// Nothing changes unless the swap is legal for the card and the player
/// holds that card.
///
/// # Errors
///
/// [`GameError::IllegalMovement`] or [`GameError::CardNotInHand`].
#[instrument(skip(board, player, movement), fields(player_id = %player.id, %movement))]
pub fn apply_partial_move(
    board: &mut Board,
    player: &mut Player,
    movement: Movement,
) -> Result<(), GameError> {
    MoveCatalog::global().validate(&movement)?;
    player.movement_cards.discard(movement.card)?;
    board.swap(movement.from, movement.to);
    player.partial_moves.push(movement);
    debug!(pending = player.partial_moves.len(), "Partial move applied");
    Ok(())
}

/// Reverts the player's most recent partial move and returns it.
///
/// # Errors
///
/// [`GameError::NoPartialMovement`] when the stack is empty.
#[instrument(skip(board, player), fields(player_id = %player.id))]
pub fn undo_partial_move(board: &mut Board, player: &mut Player) -> Result<PartialMove, GameError> {
    let Some(last) = player.partial_moves.peek().copied() else {
        error!("Undo requested with no partial movement");
        return Err(GameError::NoPartialMovement);
    };
    player.movement_cards.restore(last.card)?;
    player.partial_moves.pop();
    board.swap(last.from, last.to);
    debug!(%last, pending = player.partial_moves.len(), "Partial move undone");
    Ok(last)
}

/// Undoes every pending move of the player, newest first.
///
/// Returns how many moves were reverted.
///
/// # Errors
///
/// The first undo failure, typically [`GameError::CardNotInHand`] when a
/// pending move has no discarded card to return. The board and hand are
/// left part-way reverted; callers discard the game copy.
#[instrument(skip(board, player), fields(player_id = %player.id))]
pub fn revert_all(board: &mut Board, player: &mut Player) -> Result<usize, GameError> {
    let mut reverted = 0;
    while !player.partial_moves.is_empty() {
        undo_partial_move(board, player)?;
        reverted += 1;
    }
    Ok(reverted)
}

/// The board as it stood before any of `stack` was applied to `live`.
pub fn committed_board(live: &Board, stack: &MoveStack) -> Board {
    let mut board = live.clone();
    for entry in stack.iter().rev() {
        board.swap(entry.from, entry.to);
    }
    board
}

/// `committed` with every move of `stack` replayed in order.
pub fn partial_view(committed: &Board, stack: &MoveStack) -> Board {
    let mut board = committed.clone();
    for entry in stack.iter() {
        board.swap(entry.from, entry.to);
    }
    board
}
