//! First-class invariants over [`Game`].
//!
//! Each invariant is a zero-sized type; sets are tuples checked together
//! after every command.

use crate::movement_deck::HAND_SIZE;
use crate::{Game, GameError, GameStatus, MovementType};
use tracing::error;

/// A property that must hold for every reachable state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Invariants checked together; implemented for tuples.
pub trait InvariantSet<S> {
    /// Descriptions of every violated invariant, or `Ok` if all hold.
    fn check_all(state: &S) -> Result<(), Vec<&'static str>>;
}

impl<S, I1, I2> InvariantSet<S> for (I1, I2)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<&'static str>> {
        let mut violations = Vec::new();
        if !I1::holds(state) {
            violations.push(I1::description());
        }
        if !I2::holds(state) {
            violations.push(I2::description());
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

impl<S, I1, I2, I3, I4> InvariantSet<S> for (I1, I2, I3, I4)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
    I4: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<&'static str>> {
        let mut violations = Vec::new();
        if !I1::holds(state) {
            violations.push(I1::description());
        }
        if !I2::holds(state) {
            violations.push(I2::description());
        }
        if !I3::holds(state) {
            violations.push(I3::description());
        }
        if !I4::holds(state) {
            violations.push(I4::description());
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// The turn index addresses a roster member while the game runs.
pub struct TurnInBounds;

impl Invariant<Game> for TurnInBounds {
    fn holds(game: &Game) -> bool {
        *game.status() != GameStatus::InGame || game.turn().index() < game.players().len()
    }

    fn description() -> &'static str {
        "Turn index points at a roster member"
    }
}

/// Nobody holds more than three movement cards or three face-up figures.
pub struct HandsBounded;

impl Invariant<Game> for HandsBounded {
    fn holds(game: &Game) -> bool {
        game.players().iter().all(|player| {
            player.movement_cards().cards().len() <= HAND_SIZE
                && player.figure_cards().face_up().count() <= HAND_SIZE
        })
    }

    fn description() -> &'static str {
        "Hands hold at most three movement and three face-up figure cards"
    }
}

/// Played movement cards are exactly the ones on the partial-move stack,
/// and only the player in turn has pending moves.
pub struct PartialMovesMatchDiscards;

impl Invariant<Game> for PartialMovesMatchDiscards {
    fn holds(game: &Game) -> bool {
        let current = game.current_player().map(|p| *p.id());
        game.players().iter().all(|player| {
            if Some(*player.id()) != current && !player.partial_moves().is_empty() {
                return false;
            }
            MovementType::ALL.iter().all(|&kind| {
                let played = player
                    .movement_cards()
                    .cards()
                    .iter()
                    .filter(|card| !card.in_hand && card.kind == kind)
                    .count();
                let pending = player.partial_moves().iter().filter(|m| m.card == kind).count();
                played == pending
            })
        })
    }

    fn description() -> &'static str {
        "Played movement cards match the pending partial moves"
    }
}

/// Status agrees with roster size and board presence.
pub struct StatusMatchesRoster;

impl Invariant<Game> for StatusMatchesRoster {
    fn holds(game: &Game) -> bool {
        let joined = game.players().len();
        let capacity = usize::from(*game.capacity());
        match game.status() {
            GameStatus::Waiting => joined < capacity && game.board().is_none(),
            GameStatus::Full => joined == capacity && game.board().is_none(),
            GameStatus::InGame => joined == capacity && joined >= 2 && game.board().is_some(),
            GameStatus::Finished => true,
        }
    }

    fn description() -> &'static str {
        "Status agrees with roster size and board"
    }
}

/// Every invariant checked after a game command.
pub type GameInvariants = (
    TurnInBounds,
    HandsBounded,
    PartialMovesMatchDiscards,
    StatusMatchesRoster,
);

impl Game {
    /// Runs [`GameInvariants`] against the game.
    ///
    /// # Errors
    ///
    /// [`GameError::InvariantViolation`] listing every failed invariant.
    pub fn check_invariants(&self) -> Result<(), GameError> {
        GameInvariants::check_all(self).map_err(|violations| {
            let joined = violations.join("; ");
            error!(game_id = %self.id(), violations = %joined, "Invariant violation");
            GameError::InvariantViolation(joined)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GameId, Movement, PlayerId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn running_game(rng: &mut StdRng) -> Game {
        let mut game =
            Game::create(GameId::from(1), PlayerId::from(1), "Host", "Table", 2).expect("create");
        game.join(PlayerId::from(2), "Guest").expect("join");
        game.start(PlayerId::from(1), rng).expect("start");
        game
    }

    #[test]
    fn test_invariants_hold_for_new_game() {
        let game =
            Game::create(GameId::from(1), PlayerId::from(1), "Host", "Table", 2).expect("create");
        assert!(game.check_invariants().is_ok());
    }

    #[test]
    fn test_invariants_hold_through_a_turn() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut game = running_game(&mut rng);
        assert!(game.check_invariants().is_ok());

        let current = *game.current_player().expect("running").id();
        let card = game.current_player().expect("running").movement_cards().cards()[0].kind;
        let (from, to) = *crate::MoveCatalog::global()
            .legal_moves(card)
            .iter()
            .next()
            .expect("non-empty table");
        game.apply_move(current, Movement::new(card, from, to)).expect("legal");
        assert!(game.check_invariants().is_ok());

        game.finish_turn(current, &mut rng).expect("finish");
        assert!(game.check_invariants().is_ok());
    }

    #[test]
    fn test_two_invariants_as_set() {
        type Pair = (TurnInBounds, HandsBounded);
        let mut rng = StdRng::seed_from_u64(4);
        let game = running_game(&mut rng);
        assert!(Pair::check_all(&game).is_ok());
    }
}
