//! Whole-game checks that drive the rules engine with generated and bot moves.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use starhop_core::{
    all_moves, bot, Board, BotEvaluator, Cell, Color, DistanceTable, Game, MoveError,
    PIECES_PER_PLAYER,
};

/// Through a long random playout, players may submit every enumerated move
/// except a lone jump, which the generator reports as two cells
#[test]
fn enumerated_moves_follow_player_rules() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut game = Game::new(Color::ALL).unwrap();

    for _ in 0..300 {
        if game.winner().is_some() {
            break;
        }
        let mut accepted = Vec::new();
        for candidate in all_moves(&game) {
            let mut trial = game.clone();
            match trial.apply_move(&candidate) {
                Ok(()) => accepted.push(candidate),
                Err(e) => {
                    assert_eq!(e, MoveError::IllegalMove, "{candidate:?}");
                    assert_eq!(candidate.len(), 2, "{candidate:?}");
                    assert!(game.board().is_jump(candidate[0], candidate[1]));
                }
            }
        }
        match accepted.choose(&mut rng) {
            Some(chosen) => game.apply_move(chosen).unwrap(),
            None => game.apply_move(&[]).unwrap(),
        }
    }

    for &color in game.players() {
        assert_eq!(game.board().count(color), PIECES_PER_PLAYER);
    }
}

/// Bots playing each other keep every color at ten pieces and make progress
#[test]
fn bots_advance_toward_goal() {
    let table = DistanceTable::build();
    let mut rng = StdRng::seed_from_u64(9);
    let players = [Color::new(1).unwrap(), Color::new(4).unwrap()];
    let mut game = Game::new(players).unwrap();

    let start_score = BotEvaluator::new(&table, &game).score(players[0]).unwrap();
    for _ in 0..20 {
        bot::play_turn(&table, &mut game, &mut rng).unwrap();
        for color in players {
            assert_eq!(game.board().count(color), PIECES_PER_PLAYER);
        }
    }
    let end_score = BotEvaluator::new(&table, &game).score(players[0]).unwrap();
    assert!(end_score < start_score, "{end_score} >= {start_score}");
}

/// A lone piece one hop from its last goal cell takes it and wins
#[test]
fn bot_takes_winning_hop() {
    let table = DistanceTable::build();
    let red = Color::new(1).unwrap();
    let blue = Color::new(4).unwrap();
    let goal = red.goal();

    let mut board = Board::empty();
    for &cell in &goal[1..] {
        board.set(cell, Some(red));
    }
    // goal[0] is (9, 13); its neighbour (8, 12) is outside the region
    board.set(Cell::new(8, 12), Some(red));
    for x in 2..12 {
        board.set(Cell::new(x, 6), Some(blue));
    }

    let mut game = Game::with_board([red, blue], board).unwrap();
    let chosen = BotEvaluator::new(&table, &game)
        .best_move(&mut StdRng::seed_from_u64(0))
        .unwrap();
    assert_eq!(chosen, vec![Cell::new(8, 12), Cell::new(9, 13)]);
    game.apply_move(&chosen).unwrap();
    assert_eq!(game.winner(), Some(blue));
}
