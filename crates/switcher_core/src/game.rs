//! The game aggregate and its lifecycle commands.
//!
//! Every command validates first and mutates after, so a returned error
//! leaves the game untouched.

use crate::player::MAX_NAME_LEN;
use crate::turn::{self, PartialMove, TurnEngine};
use crate::{Board, FigurePartition, GameError, Movement, Player, PlayerId};
use derive_getters::Getters;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Smallest allowed capacity.
pub const MIN_PLAYERS: u8 = 2;
/// Largest allowed capacity.
pub const MAX_PLAYERS: u8 = 4;

/// Unique identifier for a game.
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
pub struct GameId(u64);

/// Lifecycle stage of a game.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum GameStatus {
    /// Accepting players.
    Waiting,
    /// Roster complete, not started.
    Full,
    /// Turns are being played.
    InGame,
    /// Over; no further commands apply.
    Finished,
}

impl GameStatus {
    /// Whether players may still join or the host may start.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Waiting | Self::Full)
    }
}

/// What a successful quit changed.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct QuitOutcome {
    removed: Player,
    reverted: usize,
    winner: Option<PlayerId>,
}

/// A single match: roster, board, turn and status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Game {
    id: GameId,
    name: String,
    capacity: u8,
    status: GameStatus,
    host: PlayerId,
    players: Vec<Player>,
    turn: TurnEngine,
    /// Live board, in-turn partial moves included.
    board: Option<Board>,
}

/// Validates a game name: 1 to 20 characters, letters and spaces only.
///
/// # Errors
///
/// Returns [`GameError::InvalidName`] describing the first broken rule.
pub fn validate_game_name(name: &str) -> Result<String, GameError> {
    let reason = if name.trim().is_empty() {
        Some("name is empty")
    } else if name.chars().count() > MAX_NAME_LEN {
        Some("name is longer than 20 characters")
    } else if !name.chars().all(|c| c.is_ascii_alphabetic() || c == ' ') {
        Some("only letters and spaces are allowed")
    } else {
        None
    };
    match reason {
        Some(reason) => {
            warn!(name, reason, "Rejected game name");
            Err(GameError::InvalidName {
                name: name.to_string(),
                reason,
            })
        }
        None => Ok(name.to_string()),
    }
}

impl Game {
    /// Creates a waiting game with the host as its only member.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidName`] or [`GameError::InvalidCapacity`].
    #[instrument(skip(host_name))]
    pub fn create(
        id: GameId,
        host: PlayerId,
        host_name: &str,
        name: &str,
        capacity: u8,
    ) -> Result<Self, GameError> {
        let name = validate_game_name(name)?;
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&capacity) {
            warn!(capacity, "Rejected game capacity");
            return Err(GameError::InvalidCapacity(capacity));
        }
        info!(%id, %host, "Game created");
        Ok(Self {
            id,
            name,
            capacity,
            status: GameStatus::Waiting,
            host,
            players: vec![Player::new(host, host_name)],
            turn: TurnEngine::default(),
            board: None,
        })
    }

    /// Adds a player to a game that has not started.
    ///
    /// # Errors
    ///
    /// [`GameError::GameAlreadyStarted`], [`GameError::AlreadyInGame`] or
    /// [`GameError::CapacityReached`].
    #[instrument(skip(self, name), fields(game_id = %self.id))]
    pub fn join(&mut self, player: PlayerId, name: &str) -> Result<(), GameError> {
        if !self.status.is_open() {
            warn!(status = %self.status, "Join after start");
            return Err(GameError::GameAlreadyStarted(self.status));
        }
        if self.position(player).is_some() {
            warn!(%player, "Player already joined");
            return Err(GameError::AlreadyInGame {
                player,
                game: self.id,
            });
        }
        if self.players.len() >= usize::from(self.capacity) {
            warn!(capacity = self.capacity, "Join on full game");
            return Err(GameError::CapacityReached(self.id));
        }

        self.players.push(Player::new(player, name));
        if self.players.len() == usize::from(self.capacity) {
            self.status = GameStatus::Full;
        }
        info!(%player, joined = self.players.len(), status = %self.status, "Player joined");
        Ok(())
    }

    /// Removes a player.
    ///
    /// Before the game starts the host may not leave. During play the
    /// quitter's partial moves are undone, capacity shrinks, the turn stays
    /// with the same player where possible, and a lone survivor wins.
    ///
    /// # Errors
    ///
    /// [`GameError::GameFinished`], [`GameError::PlayerNotInGame`],
    /// [`GameError::HostCannotQuit`], or the undo fault that stopped the
    /// quitter's moves from being reverted.
    #[instrument(skip(self), fields(game_id = %self.id))]
    pub fn quit(&mut self, player: PlayerId) -> Result<QuitOutcome, GameError> {
        if self.status == GameStatus::Finished {
            warn!(%player, "Quit on finished game");
            return Err(GameError::GameFinished(self.id));
        }
        let index = self.require_member(player)?;
        if player == self.host && self.status != GameStatus::InGame {
            warn!(%player, status = %self.status, "Host tried to quit");
            return Err(GameError::HostCannotQuit);
        }

        let mut reverted = 0;
        if let Some(board) = self.board.as_mut() {
            reverted = turn::revert_all(board, &mut self.players[index])?;
        }
        let mut removed = self.players.remove(index);
        removed.clear_cards();

        let mut winner = None;
        if self.status == GameStatus::InGame {
            self.capacity = self.capacity.saturating_sub(1);
            self.turn.on_player_removed(index, self.players.len());
            winner = self.check_victory();
            if winner.is_some() {
                self.end_game();
            }
        } else {
            self.status = GameStatus::Waiting;
        }
        info!(%player, reverted, remaining = self.players.len(), ?winner, "Player quit");
        Ok(QuitOutcome {
            removed,
            reverted,
            winner,
        })
    }

    /// Starts the game: board, first turn, and both decks.
    ///
    /// # Errors
    ///
    /// [`GameError::PlayerNotInGame`], [`GameError::NotHost`],
    /// [`GameError::GameAlreadyStarted`], [`GameError::PlayerCountMismatch`]
    /// or [`GameError::FigurePoolExhausted`].
    #[instrument(skip(self, rng), fields(game_id = %self.id))]
    pub fn start<R: Rng>(&mut self, requester: PlayerId, rng: &mut R) -> Result<(), GameError> {
        self.require_member(requester)?;
        if requester != self.host {
            warn!(%requester, "Non-host tried to start");
            return Err(GameError::NotHost(requester));
        }
        if !self.status.is_open() {
            warn!(status = %self.status, "Start on started game");
            return Err(GameError::GameAlreadyStarted(self.status));
        }
        if self.players.len() != usize::from(self.capacity) {
            warn!(joined = self.players.len(), capacity = self.capacity, "Start with wrong player count");
            return Err(GameError::PlayerCountMismatch {
                joined: self.players.len(),
                capacity: self.capacity,
            });
        }

        let reserves = FigurePartition::deal_reserves(self.players.len(), rng)?;
        self.turn = TurnEngine::random_initial(self.players.len(), rng);
        let board = Board::initialize(rng);
        debug!(board = %board, "Board dealt");
        self.board = Some(board);
        for (player, reserve) in self.players.iter_mut().zip(reserves) {
            player.movement_cards.deal_initial(rng);
            player.figure_cards = reserve;
            player.figure_cards.deal_to_hand(rng);
            player.partial_moves.commit();
        }
        self.status = GameStatus::InGame;
        info!(first = %self.players[self.turn.index()].id, "Game started");
        Ok(())
    }

    /// Applies a tentative swap for the player in turn.
    ///
    /// # Errors
    ///
    /// Turn errors from [`Self::require_turn`], then
    /// [`GameError::IllegalMovement`] or [`GameError::CardNotInHand`].
    #[instrument(skip(self), fields(game_id = %self.id))]
    pub fn apply_move(&mut self, player: PlayerId, movement: Movement) -> Result<(), GameError> {
        let index = self.require_turn(player)?;
        let board = self.board.as_mut().ok_or_else(missing_board)?;
        turn::apply_partial_move(board, &mut self.players[index], movement)
    }

    /// Reverts the in-turn player's latest partial move.
    ///
    /// # Errors
    ///
    /// Turn errors from [`Self::require_turn`], then
    /// [`GameError::NoPartialMovement`].
    #[instrument(skip(self), fields(game_id = %self.id))]
    pub fn undo_move(&mut self, player: PlayerId) -> Result<PartialMove, GameError> {
        let index = self.require_turn(player)?;
        let board = self.board.as_mut().ok_or_else(missing_board)?;
        turn::undo_partial_move(board, &mut self.players[index])
    }

    /// Commits the in-turn player's moves and passes the turn.
    ///
    /// Returns the player now in turn.
    ///
    /// # Errors
    ///
    /// Turn errors from [`Self::require_turn`].
    #[instrument(skip(self, rng), fields(game_id = %self.id))]
    pub fn finish_turn<R: Rng>(&mut self, player: PlayerId, rng: &mut R) -> Result<PlayerId, GameError> {
        let index = self.require_turn(player)?;
        let count = self.players.len();
        self.turn.commit(&mut self.players[index], count, rng);
        let next = self.players[self.turn.index()].id;
        info!(%player, %next, "Turn finished");
        Ok(next)
    }

    /// The lone remaining player of a running game, if any.
    pub fn check_victory(&self) -> Option<PlayerId> {
        match (self.status, self.players.as_slice()) {
            (GameStatus::InGame, [last]) => Some(last.id),
            _ => None,
        }
    }

    /// Marks the game finished and drops every card.
    #[instrument(skip(self), fields(game_id = %self.id))]
    pub fn end_game(&mut self) {
        for player in &mut self.players {
            player.clear_cards();
            player.partial_moves.commit();
        }
        self.status = GameStatus::Finished;
        info!(winner = ?self.winner(), "Game finished");
    }

    /// Survivor of a finished game.
    pub fn winner(&self) -> Option<PlayerId> {
        match (self.status, self.players.as_slice()) {
            (GameStatus::Finished, [last]) => Some(last.id),
            _ => None,
        }
    }

    /// Player whose turn it is, while the game runs.
    pub fn current_player(&self) -> Option<&Player> {
        if self.status != GameStatus::InGame {
            return None;
        }
        self.players.get(self.turn.index())
    }

    /// Roster entry for a player.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Whether the player is in the roster.
    pub fn contains(&self, id: PlayerId) -> bool {
        self.position(id).is_some()
    }

    /// Board without the in-turn player's partial moves.
    pub fn committed_board(&self) -> Option<Board> {
        let board = self.board.as_ref()?;
        Some(match self.current_player() {
            Some(current) => turn::committed_board(board, &current.partial_moves),
            None => board.clone(),
        })
    }

    /// Committed board with `player`'s partial moves replayed on top.
    ///
    /// # Errors
    ///
    /// [`GameError::PlayerNotInGame`] or [`GameError::GameNotStarted`].
    pub fn partial_view(&self, player: PlayerId) -> Result<Board, GameError> {
        let index = self.require_member(player)?;
        let committed = self
            .committed_board()
            .ok_or(GameError::GameNotStarted(self.status))?;
        Ok(turn::partial_view(&committed, &self.players[index].partial_moves))
    }

    fn position(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    fn require_member(&self, player: PlayerId) -> Result<usize, GameError> {
        self.position(player).ok_or_else(|| {
            warn!(%player, game_id = %self.id, "Player not in game");
            GameError::PlayerNotInGame {
                player,
                game: self.id,
            }
        })
    }

    /// Checks that the game runs, the player belongs to it and holds the
    /// turn; returns their roster index.
    ///
    /// # Errors
    ///
    /// [`GameError::GameNotStarted`], [`GameError::PlayerNotInGame`] or
    /// [`GameError::NotYourTurn`].
    pub fn require_turn(&self, player: PlayerId) -> Result<usize, GameError> {
        if self.status != GameStatus::InGame {
            warn!(status = %self.status, "Turn command outside a running game");
            return Err(GameError::GameNotStarted(self.status));
        }
        let index = self.require_member(player)?;
        if index != self.turn.index() {
            let current = self.players[self.turn.index()].id;
            warn!(%player, %current, "Out of turn");
            return Err(GameError::NotYourTurn(current));
        }
        debug!(%player, index, "Turn check passed");
        Ok(index)
    }
}

fn missing_board() -> GameError {
    GameError::InvariantViolation("running game has no board".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn pid(n: u64) -> PlayerId {
        PlayerId::from(n)
    }

    fn full_game(capacity: u8) -> Game {
        let mut game = Game::create(GameId::from(1), pid(1), "Host", "Table", capacity).expect("create");
        for n in 2..=u64::from(capacity) {
            game.join(pid(n), "Guest").expect("join");
        }
        game
    }

    #[test]
    fn test_game_name_rules() {
        assert!(validate_game_name("Friday Night").is_ok());
        assert!(validate_game_name("").is_err());
        assert!(validate_game_name("Room 42").is_err());
        assert!(validate_game_name(&"a".repeat(21)).is_err());
    }

    #[test]
    fn test_create_rejects_capacity() {
        assert_eq!(
            Game::create(GameId::from(1), pid(1), "Host", "Table", 5),
            Err(GameError::InvalidCapacity(5))
        );
        assert_eq!(
            Game::create(GameId::from(1), pid(1), "Host", "Table", 1),
            Err(GameError::InvalidCapacity(1))
        );
    }

    #[test]
    fn test_join_fills_then_rejects() {
        let mut game = full_game(2);
        assert_eq!(game.status(), &GameStatus::Full);
        assert_eq!(
            game.join(pid(3), "Late"),
            Err(GameError::CapacityReached(GameId::from(1)))
        );
        assert_eq!(game.players().len(), 2);
    }

    #[test]
    fn test_quit_before_start_reopens() {
        let mut game = full_game(3);
        let outcome = game.quit(pid(3)).expect("guest quits");
        assert_eq!(outcome.removed().id(), &pid(3));
        assert_eq!(game.status(), &GameStatus::Waiting);
        assert_eq!(game.quit(pid(1)), Err(GameError::HostCannotQuit));
    }

    #[test]
    fn test_start_requires_host_and_full_roster() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut game = Game::create(GameId::from(1), pid(1), "Host", "Table", 3).expect("create");
        game.join(pid(2), "Guest").expect("join");
        assert_eq!(
            game.start(pid(1), &mut rng),
            Err(GameError::PlayerCountMismatch {
                joined: 2,
                capacity: 3
            })
        );
        assert_eq!(game.status(), &GameStatus::Waiting);

        game.join(pid(3), "Guest").expect("join");
        assert_eq!(game.start(pid(2), &mut rng), Err(GameError::NotHost(pid(2))));
        game.start(pid(1), &mut rng).expect("start");
        assert_eq!(game.status(), &GameStatus::InGame);
        assert!(game.board().is_some());
    }

    #[test]
    fn test_start_deals_hands() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut game = full_game(4);
        game.start(pid(1), &mut rng).expect("start");
        for player in game.players() {
            assert_eq!(player.movement_cards().playable(), 3);
            assert_eq!(player.figure_cards().face_up().count(), 3);
            // 3 easy + 9 difficult per player at four players.
            assert_eq!(player.figure_cards().cards().len(), 12);
        }
    }

    #[test]
    fn test_finish_turn_rotates() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut game = full_game(3);
        game.start(pid(1), &mut rng).expect("start");
        let first = game.current_player().expect("in game").id;
        let next = game.finish_turn(first, &mut rng).expect("finish");
        assert_ne!(first, next);
        assert_eq!(game.finish_turn(first, &mut rng), Err(GameError::NotYourTurn(next)));
    }
}
