//! In-memory persistence adapter.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use switcher_core::{
    Game, GameError, GameId, GameStatus, PersistencePort, PlayerId, PlayerProfile,
};
use tracing::{debug, error, info, instrument, warn};

/// Games and player identities held in process memory.
///
/// Each `save` replaces the stored game wholesale, so readers only ever see
/// fully applied commands.
#[derive(Debug, Default)]
pub struct MemoryStore {
    games: RwLock<BTreeMap<GameId, Game>>,
    players: RwLock<HashMap<PlayerId, PlayerProfile>>,
    next_game: AtomicU64,
    next_player: AtomicU64,
}

fn poisoned<T>(_: PoisonError<T>) -> GameError {
    error!("Store lock poisoned");
    GameError::LockPoisoned
}

impl MemoryStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating in-memory store");
        Self::default()
    }
}

impl PersistencePort for MemoryStore {
    fn next_game_id(&self) -> Result<GameId, GameError> {
        Ok(GameId::from(self.next_game.fetch_add(1, Ordering::Relaxed) + 1))
    }

    #[instrument(skip(self))]
    fn load(&self, id: GameId) -> Result<Game, GameError> {
        let games = self.games.read().map_err(poisoned)?;
        games.get(&id).cloned().ok_or_else(|| {
            debug!(game_id = %id, "Game not found");
            GameError::GameNotFound(id)
        })
    }

    #[instrument(skip(self, game), fields(game_id = %game.id()))]
    fn save(&self, game: &Game) -> Result<(), GameError> {
        let mut games = self.games.write().map_err(poisoned)?;
        games.insert(*game.id(), game.clone());
        debug!(status = %game.status(), "Game saved");
        Ok(())
    }

    #[instrument(skip(self))]
    fn list(&self, status: Option<GameStatus>) -> Result<Vec<Game>, GameError> {
        let games = self.games.read().map_err(poisoned)?;
        let listed: Vec<Game> = games
            .values()
            .filter(|game| status.is_none_or(|wanted| *game.status() == wanted))
            .cloned()
            .collect();
        debug!(count = listed.len(), "Listed games");
        Ok(listed)
    }

    #[instrument(skip(self))]
    fn create_player(&self, name: &str) -> Result<PlayerProfile, GameError> {
        let id = PlayerId::from(self.next_player.fetch_add(1, Ordering::Relaxed) + 1);
        let profile = PlayerProfile::new(id, name)?;
        self.players
            .write()
            .map_err(poisoned)?
            .insert(id, profile.clone());
        info!(player_id = %id, "Player registered");
        Ok(profile)
    }

    #[instrument(skip(self))]
    fn load_player(&self, id: PlayerId) -> Result<PlayerProfile, GameError> {
        let players = self.players.read().map_err(poisoned)?;
        players.get(&id).cloned().ok_or_else(|| {
            warn!(player_id = %id, "Player not found");
            GameError::PlayerNotFound(id)
        })
    }

    #[instrument(skip(self))]
    fn claim_membership(&self, player: PlayerId, game: GameId) -> Result<(), GameError> {
        let mut players = self.players.write().map_err(poisoned)?;
        let profile = players
            .get_mut(&player)
            .ok_or(GameError::PlayerNotFound(player))?;
        if let Some(current) = *profile.game() {
            warn!(player_id = %player, current_game = %current, "Player already in a game");
            return Err(GameError::AlreadyInGame {
                player,
                game: current,
            });
        }
        profile.set_game(Some(game));
        debug!("Membership claimed");
        Ok(())
    }

    #[instrument(skip(self))]
    fn release_membership(&self, player: PlayerId, game: GameId) -> Result<(), GameError> {
        let mut players = self.players.write().map_err(poisoned)?;
        match players.get_mut(&player) {
            Some(profile) if *profile.game() == Some(game) => {
                profile.set_game(None);
                debug!("Membership released");
            }
            Some(profile) => {
                debug!(current_game = ?profile.game(), "Membership belongs to another game, kept");
            }
            None => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential() {
        let store = MemoryStore::new();
        assert_eq!(store.next_game_id(), Ok(GameId::from(1)));
        assert_eq!(store.next_game_id(), Ok(GameId::from(2)));
        let first = store.create_player("Ana").expect("Valid name");
        let second = store.create_player("Bruno").expect("Valid name");
        assert_eq!(first.id(), &PlayerId::from(1));
        assert_eq!(second.id(), &PlayerId::from(2));
    }

    #[test]
    fn test_membership_is_exclusive() {
        let store = MemoryStore::new();
        let player = *store.create_player("Ana").expect("Valid name").id();
        store
            .claim_membership(player, GameId::from(1))
            .expect("First claim");
        assert_eq!(
            store.claim_membership(player, GameId::from(2)),
            Err(GameError::AlreadyInGame {
                player,
                game: GameId::from(1)
            })
        );
        store.release_membership(player, GameId::from(1)).expect("Release");
        store
            .claim_membership(player, GameId::from(2))
            .expect("Claim after release");
    }

    #[test]
    fn test_release_ignores_other_games() {
        let store = MemoryStore::new();
        let player = *store.create_player("Ana").expect("Valid name").id();
        store
            .claim_membership(player, GameId::from(2))
            .expect("Claim");
        store
            .release_membership(player, GameId::from(1))
            .expect("Stale release is a no-op");
        assert_eq!(
            store.load_player(player).expect("Registered").game(),
            &Some(GameId::from(2))
        );
    }

    #[test]
    fn test_list_filters_by_status() {
        let store = MemoryStore::new();
        let mut full = Game::create(GameId::from(1), PlayerId::from(1), "Ana", "One", 2)
            .expect("Valid game");
        full.join(PlayerId::from(2), "Bruno").expect("Join");
        let waiting = Game::create(GameId::from(2), PlayerId::from(3), "Caro", "Two", 3)
            .expect("Valid game");
        store.save(&full).expect("Save");
        store.save(&waiting).expect("Save");

        assert_eq!(store.list(None).expect("List").len(), 2);
        let open = store.list(Some(GameStatus::Waiting)).expect("List");
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id(), &GameId::from(2));
    }

    #[test]
    fn test_unknown_ids() {
        let store = MemoryStore::new();
        assert_eq!(
            store.load(GameId::from(7)),
            Err(GameError::GameNotFound(GameId::from(7)))
        );
        assert_eq!(
            store.load_player(PlayerId::from(7)),
            Err(GameError::PlayerNotFound(PlayerId::from(7)))
        );
    }
}
