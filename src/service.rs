//! Command service: runs every engine command as a per-game transaction.
//!
//! A command takes the game's lock, loads an owned copy, mutates it, checks
//! invariants, saves it back and publishes, all before releasing the lock.
//! Any error before the save drops the copy, so the stored game never sees
//! a rejected command, and events of one game go out in commit order.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use switcher_core::{
    AuthPort, Board, EventKind, Game, GameError, GameId, GameSnapshot, GameStatus, Movement,
    Notification, NotificationPort, PersistencePort, PlayerId, PlayerProfile,
};
use tokio::sync::{Mutex as GameLock, OwnedMutexGuard};
use tracing::{debug, error, info, instrument, warn};

/// A freshly registered player and their bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Registration {
    player_id: PlayerId,
    name: String,
    token: String,
}

/// Entry point for every game command; cheap to clone.
#[derive(Clone)]
pub struct GameService {
    store: Arc<dyn PersistencePort>,
    auth: Arc<dyn AuthPort>,
    notifier: Arc<dyn NotificationPort>,
    locks: Arc<Mutex<HashMap<GameId, Arc<GameLock<()>>>>>,
}

impl std::fmt::Debug for GameService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameService").finish_non_exhaustive()
    }
}

impl GameService {
    /// Wires the service to its adapters.
    #[instrument(skip_all)]
    pub fn new(
        store: Arc<dyn PersistencePort>,
        auth: Arc<dyn AuthPort>,
        notifier: Arc<dyn NotificationPort>,
    ) -> Self {
        info!("Creating game service");
        Self {
            store,
            auth,
            notifier,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Creates a player identity and issues its token.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidName`].
    #[instrument(skip(self))]
    pub fn register_player(&self, name: &str) -> Result<Registration, GameError> {
        let profile = self.store.create_player(name)?;
        let token = self.auth.issue(*profile.id())?;
        Ok(Registration {
            player_id: *profile.id(),
            name: profile.name().clone(),
            token,
        })
    }

    /// Resolves a bearer token to a registered player.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidCredentials`].
    pub fn authenticate(&self, token: &str) -> Result<PlayerId, GameError> {
        let player = self.auth.resolve(token)?;
        self.store.load_player(player)?;
        Ok(player)
    }

    /// Player identity lookup.
    ///
    /// # Errors
    ///
    /// [`GameError::PlayerNotFound`].
    pub fn player(&self, id: PlayerId) -> Result<PlayerProfile, GameError> {
        self.store.load_player(id)
    }

    /// Creates a game hosted by `host`.
    ///
    /// # Errors
    ///
    /// [`GameError::AlreadyInGame`], [`GameError::InvalidName`] or
    /// [`GameError::InvalidCapacity`].
    #[instrument(skip(self))]
    pub async fn create_game(
        &self,
        host: PlayerId,
        name: &str,
        capacity: u8,
    ) -> Result<GameSnapshot, GameError> {
        let profile = self.store.load_player(host)?;
        if let Some(current) = *profile.game() {
            warn!(player_id = %host, current_game = %current, "Host already in a game");
            return Err(GameError::AlreadyInGame {
                player: host,
                game: current,
            });
        }
        let id = self.store.next_game_id()?;
        let game = Game::create(id, host, profile.name(), name, capacity)?;

        let _guard = self.acquire(id).await?;
        self.store.claim_membership(host, id)?;
        if let Err(err) = self.commit(&game) {
            self.store.release_membership(host, id)?;
            return Err(err);
        }
        Ok(game.snapshot())
    }

    /// Adds `player` to a waiting game.
    ///
    /// # Errors
    ///
    /// [`GameError::GameNotFound`], [`GameError::AlreadyInGame`],
    /// [`GameError::GameAlreadyStarted`] or [`GameError::CapacityReached`].
    #[instrument(skip(self))]
    pub async fn join_game(
        &self,
        player: PlayerId,
        game_id: GameId,
    ) -> Result<GameSnapshot, GameError> {
        let profile = self.store.load_player(player)?;
        let _guard = self.acquire(game_id).await?;
        let mut game = self.store.load(game_id)?;
        game.join(player, profile.name())?;

        self.store.claim_membership(player, game_id)?;
        if let Err(err) = self.commit(&game) {
            self.store.release_membership(player, game_id)?;
            return Err(err);
        }
        self.publish(
            &game,
            EventKind::PlayerConnected,
            format!("{} joined", profile.name()),
        );
        Ok(game.snapshot())
    }

    /// Removes `player` from a game, ending it if one player remains.
    ///
    /// # Errors
    ///
    /// [`GameError::GameNotFound`], [`GameError::PlayerNotInGame`] or
    /// [`GameError::HostCannotQuit`].
    #[instrument(skip(self))]
    pub async fn quit_game(
        &self,
        player: PlayerId,
        game_id: GameId,
    ) -> Result<GameSnapshot, GameError> {
        let _guard = self.acquire(game_id).await?;
        let mut game = self.store.load(game_id)?;
        let outcome = game.quit(player)?;
        self.commit(&game)?;

        self.store.release_membership(player, game_id)?;
        self.publish(
            &game,
            EventKind::PlayerDisconnected,
            format!("{} left", outcome.removed().name()),
        );
        if let Some(winner) = *outcome.winner() {
            self.close_finished(&game, winner)?;
        }
        Ok(game.snapshot())
    }

    /// Starts a full game; host only.
    ///
    /// # Errors
    ///
    /// [`GameError::NotHost`], [`GameError::GameAlreadyStarted`] or
    /// [`GameError::PlayerCountMismatch`].
    #[instrument(skip(self))]
    pub async fn start_game(
        &self,
        player: PlayerId,
        game_id: GameId,
    ) -> Result<GameSnapshot, GameError> {
        let _guard = self.acquire(game_id).await?;
        let mut game = self.store.load(game_id)?;
        game.start(player, &mut rand::rng())?;
        self.commit(&game)?;

        let first = game
            .current_player()
            .map(|p| p.name().clone())
            .unwrap_or_default();
        self.publish(
            &game,
            EventKind::GameStarted,
            format!("Game started, {} plays first", first),
        );
        Ok(game.snapshot())
    }

    /// Applies a partial move for the player in turn.
    ///
    /// # Errors
    ///
    /// Turn errors, [`GameError::IllegalMovement`] or
    /// [`GameError::CardNotInHand`].
    #[instrument(skip(self, movement), fields(%movement))]
    pub async fn apply_move(
        &self,
        player: PlayerId,
        game_id: GameId,
        movement: Movement,
    ) -> Result<GameSnapshot, GameError> {
        let _guard = self.acquire(game_id).await?;
        let mut game = self.store.load(game_id)?;
        game.apply_move(player, movement)?;
        self.commit(&game)?;

        self.publish(&game, EventKind::BoardUpdate, format!("Played {}", movement));
        Ok(game.snapshot())
    }

    /// Reverts the latest partial move of the player in turn.
    ///
    /// # Errors
    ///
    /// Turn errors or [`GameError::NoPartialMovement`].
    #[instrument(skip(self))]
    pub async fn undo_move(
        &self,
        player: PlayerId,
        game_id: GameId,
    ) -> Result<GameSnapshot, GameError> {
        let _guard = self.acquire(game_id).await?;
        let mut game = self.store.load(game_id)?;
        let undone = game.undo_move(player)?;
        self.commit(&game)?;

        self.publish(&game, EventKind::BoardUpdate, format!("Undid {}", undone));
        Ok(game.snapshot())
    }

    /// Commits the turn and passes it on.
    ///
    /// # Errors
    ///
    /// [`GameError::GameNotStarted`] or [`GameError::NotYourTurn`].
    #[instrument(skip(self))]
    pub async fn finish_turn(
        &self,
        player: PlayerId,
        game_id: GameId,
    ) -> Result<GameSnapshot, GameError> {
        let _guard = self.acquire(game_id).await?;
        let mut game = self.store.load(game_id)?;
        let next = game.finish_turn(player, &mut rand::rng())?;
        self.commit(&game)?;

        let next_name = game
            .player(next)
            .map(|p| p.name().clone())
            .unwrap_or_else(|| next.to_string());
        self.publish(
            &game,
            EventKind::FinishTurn,
            format!("Turn passes to {}", next_name),
        );
        Ok(game.snapshot())
    }

    /// Snapshots of every game, optionally only those with `status`.
    ///
    /// # Errors
    ///
    /// Storage failures only.
    #[instrument(skip(self))]
    pub fn list_games(&self, status: Option<GameStatus>) -> Result<Vec<GameSnapshot>, GameError> {
        Ok(self
            .store
            .list(status)?
            .iter()
            .map(Game::snapshot)
            .collect())
    }

    /// Snapshot of one game.
    ///
    /// # Errors
    ///
    /// [`GameError::GameNotFound`].
    pub fn game(&self, game_id: GameId) -> Result<GameSnapshot, GameError> {
        Ok(self.store.load(game_id)?.snapshot())
    }

    /// The board as `player` currently sees it, partial moves included.
    ///
    /// # Errors
    ///
    /// [`GameError::GameNotFound`], [`GameError::PlayerNotInGame`] or
    /// [`GameError::GameNotStarted`].
    pub fn partial_view(&self, player: PlayerId, game_id: GameId) -> Result<Board, GameError> {
        self.store.load(game_id)?.partial_view(player)
    }

    /// Waits for exclusive access to one game.
    async fn acquire(&self, game_id: GameId) -> Result<OwnedMutexGuard<()>, GameError> {
        let lock = {
            let mut locks = self.locks.lock().map_err(|_| {
                error!("Lock table poisoned");
                GameError::LockPoisoned
            })?;
            Arc::clone(locks.entry(game_id).or_default())
        };
        Ok(lock.lock_owned().await)
    }

    /// Checks invariants and replaces the stored game.
    fn commit(&self, game: &Game) -> Result<(), GameError> {
        game.check_invariants()?;
        self.store.save(game)?;
        debug!(game_id = %game.id(), status = %game.status(), "Command committed");
        Ok(())
    }

    /// Frees every survivor's membership, announces the winner and drops
    /// the game's lock and event channel.
    fn close_finished(&self, game: &Game, winner: PlayerId) -> Result<(), GameError> {
        for player in game.players() {
            self.store.release_membership(*player.id(), *game.id())?;
        }
        let name = game
            .player(winner)
            .map(|p| p.name().clone())
            .unwrap_or_else(|| winner.to_string());
        info!(game_id = %game.id(), %winner, "Game won");
        self.publish(game, EventKind::GameWon, format!("{} wins", name));
        self.notifier.retire(*game.id());
        self.locks
            .lock()
            .map_err(|_| {
                error!("Lock table poisoned");
                GameError::LockPoisoned
            })?
            .remove(game.id());
        Ok(())
    }

    fn publish(&self, game: &Game, kind: EventKind, message: String) {
        self.notifier
            .publish(Notification::new(*game.id(), kind, message, game.snapshot()));
    }
}
