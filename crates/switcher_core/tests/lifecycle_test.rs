//! End-to-end rules scenarios on the game aggregate.

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashMap;
use switcher_core::{
    Difficulty, FigurePartition, FigureType, Game, GameError, GameId, GameStatus, MoveCatalog,
    Movement, MovementType, PlayerId,
};

fn pid(n: u64) -> PlayerId {
    PlayerId::from(n)
}

fn game_with(capacity: u8, joined: u64) -> Game {
    let mut game = Game::create(GameId::from(1), pid(1), "Ana", "Sunday Game", capacity)
        .expect("Valid game");
    for n in 2..=joined {
        game.join(pid(n), &format!("Guest {n}")).expect("Join succeeds");
    }
    game
}

fn started(capacity: u8, seed: u64) -> (Game, StdRng) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut game = game_with(capacity, u64::from(capacity));
    game.start(pid(1), &mut rng).expect("Start succeeds");
    (game, rng)
}

fn current(game: &Game) -> PlayerId {
    *game.current_player().expect("Game running").id()
}

/// A legal movement for the first playable card of the player in turn.
fn some_legal_move(game: &Game) -> Movement {
    let player = game.current_player().expect("Game running");
    let card = player
        .movement_cards()
        .cards()
        .iter()
        .find(|c| c.in_hand)
        .expect("Playable card")
        .kind;
    let (from, to) = *MoveCatalog::global()
        .legal_moves(card)
        .iter()
        .min()
        .expect("Non-empty table");
    Movement::new(card, from, to)
}

#[test]
fn test_apply_then_undo_round_trip() {
    let (mut game, _) = started(2, 10);
    let mover = current(&game);
    let before = game.clone();

    let movement = some_legal_move(&game);
    game.apply_move(mover, movement).expect("Legal move");
    assert_ne!(game.player(mover), before.player(mover));

    let undone = game.undo_move(mover).expect("Undo succeeds");
    assert_eq!(undone, movement);
    assert_eq!(game, before);
}

#[test]
fn test_repeated_undo_walks_stack_to_empty() {
    let (mut game, _) = started(3, 11);
    let mover = current(&game);
    let before = game.clone();

    for _ in 0..3 {
        let movement = some_legal_move(&game);
        game.apply_move(mover, movement).expect("Legal move");
    }
    assert_eq!(game.player(mover).expect("member").partial_moves().len(), 3);
    assert_eq!(game.committed_board().as_ref(), before.board().as_ref());
    assert_eq!(game.partial_view(mover).ok().as_ref(), game.board().as_ref());

    for _ in 0..3 {
        game.undo_move(mover).expect("Undo succeeds");
    }
    assert_eq!(game.undo_move(mover), Err(GameError::NoPartialMovement));
    assert_eq!(game, before);
}

#[test]
fn test_rejected_move_leaves_game_untouched() {
    let (mut game, _) = started(2, 12);
    let mover = current(&game);
    let before = game.clone();

    let card = some_legal_move(&game).card;
    let bad = Movement::new(
        card,
        switcher_core::Coordinate::new(0, 0),
        switcher_core::Coordinate::new(0, 0),
    );
    assert_eq!(game.apply_move(mover, bad), Err(GameError::IllegalMovement(card)));

    let other = game
        .players()
        .iter()
        .map(|p| *p.id())
        .find(|id| *id != mover)
        .expect("Second player");
    let legal = some_legal_move(&game);
    assert_eq!(game.apply_move(other, legal), Err(GameError::NotYourTurn(mover)));
    assert_eq!(game, before);
}

#[test]
fn test_three_player_deck_quotas() {
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let hands = FigurePartition::deal_reserves(3, &mut rng).expect("Deck deals");
        let mut total: HashMap<FigureType, usize> = HashMap::new();
        for hand in &hands {
            let easy = hand
                .cards()
                .iter()
                .filter(|c| c.kind.difficulty() == Difficulty::Easy)
                .count();
            assert_eq!(easy, 4);
            assert_eq!(hand.cards().len() - easy, 12);

            let mut per_type: HashMap<FigureType, usize> = HashMap::new();
            for card in hand.cards() {
                *per_type.entry(card.kind).or_default() += 1;
                *total.entry(card.kind).or_default() += 1;
            }
            assert!(per_type.values().all(|&n| n <= 2));
        }
        assert!(total.values().all(|&n| n <= 2));
    }
}

#[test]
fn test_start_with_missing_player_is_rejected() {
    let mut rng = StdRng::seed_from_u64(13);
    let mut game = game_with(3, 2);
    let before = game.clone();
    assert_eq!(
        game.start(pid(1), &mut rng),
        Err(GameError::PlayerCountMismatch {
            joined: 2,
            capacity: 3
        })
    );
    assert_eq!(game.status(), &GameStatus::Waiting);
    assert_eq!(game, before);
}

#[test]
fn test_host_quit_rules() {
    let mut game = game_with(2, 2);
    assert_eq!(game.quit(pid(1)), Err(GameError::HostCannotQuit));

    game.quit(pid(2)).expect("Guest may leave");
    assert_eq!(game.status(), &GameStatus::Waiting);
    assert_eq!(game.players().len(), 1);

    let (mut game, _) = started(2, 14);
    let outcome = game.quit(pid(1)).expect("Host may leave a running game");
    assert_eq!(outcome.winner(), &Some(pid(2)));
    assert_eq!(game.status(), &GameStatus::Finished);
    assert_eq!(game.winner(), Some(pid(2)));
    let survivor = game.player(pid(2)).expect("Survivor listed");
    assert!(survivor.movement_cards().cards().is_empty());
    assert!(survivor.figure_cards().cards().is_empty());
}

#[test]
fn test_finished_game_rejects_quit() {
    let (mut game, _) = started(2, 16);
    game.quit(pid(1)).expect("Host eliminated");
    let finished = game.clone();

    assert_eq!(game.quit(pid(2)), Err(GameError::GameFinished(GameId::from(1))));
    assert_eq!(game, finished);
    assert_eq!(game.winner(), Some(pid(2)));
}

#[test]
fn test_quit_unknown_player() {
    let mut game = game_with(2, 1);
    assert_eq!(
        game.quit(pid(9)),
        Err(GameError::PlayerNotInGame {
            player: pid(9),
            game: GameId::from(1)
        })
    );
}

#[test]
fn test_in_turn_quit_reverts_partial_moves() {
    let (mut game, _) = started(3, 15);
    let mover = current(&game);
    let board_before = game.board().clone();

    let movement = some_legal_move(&game);
    game.apply_move(mover, movement).expect("Legal move");
    let outcome = game.quit(mover).expect("Quit succeeds");
    assert_eq!(*outcome.reverted(), 1);
    assert_eq!(game.board(), &board_before);
    assert_eq!(game.status(), &GameStatus::InGame);
    assert_eq!(*game.capacity(), 2);
    assert!(game.check_invariants().is_ok());
}

#[test]
fn test_turn_advances_modulo_after_quit() {
    let (mut game, mut rng) = started(4, 16);
    let roster: Vec<PlayerId> = game.players().iter().map(|p| *p.id()).collect();
    let holder = current(&game);

    // Remove a non-host player who is not in turn; the turn stays put.
    let leaver = roster
        .iter()
        .copied()
        .find(|id| *id != holder && *id != pid(1))
        .expect("Third player");
    game.quit(leaver).expect("Quit succeeds");
    assert_eq!(current(&game), holder);

    let old = game.turn().index();
    let count = game.players().len();
    let next = game.finish_turn(holder, &mut rng).expect("Finish succeeds");
    assert_eq!(game.turn().index(), (old + 1) % count);
    assert_eq!(*game.players()[game.turn().index()].id(), next);
    assert!(game.check_invariants().is_ok());
}

#[test]
fn test_commands_require_running_game() {
    let mut rng = StdRng::seed_from_u64(17);
    let mut game = game_with(2, 2);
    let movement = Movement::new(
        MovementType::Mov03,
        switcher_core::Coordinate::new(0, 0),
        switcher_core::Coordinate::new(0, 1),
    );
    assert_eq!(
        game.apply_move(pid(1), movement),
        Err(GameError::GameNotStarted(GameStatus::Full))
    );
    assert_eq!(
        game.finish_turn(pid(1), &mut rng),
        Err(GameError::GameNotStarted(GameStatus::Full))
    );

    game.start(pid(1), &mut rng).expect("Start succeeds");
    assert_eq!(
        game.join(pid(3), "Late"),
        Err(GameError::GameAlreadyStarted(GameStatus::InGame))
    );
}

#[test]
fn test_game_serializes_through_json() {
    let (mut game, _) = started(2, 18);
    let mover = current(&game);
    let movement = some_legal_move(&game);
    game.apply_move(mover, movement).expect("Legal move");

    let json = serde_json::to_string(&game).expect("Serializes");
    let restored: Game = serde_json::from_str(&json).expect("Deserializes");
    assert_eq!(restored, game);
}
