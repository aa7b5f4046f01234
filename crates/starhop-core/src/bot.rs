//! Bot move selection.
//!
//! A position is scored for a color by matching its pieces to the cells of its
//! goal region at minimum total distance, then adding a small penalty for
//! pieces that are spread out. The bot plays the move with the lowest resulting
//! score, breaking ties at random.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::assignment;
use crate::board::{Board, Cell, Color, PIECES_PER_PLAYER};
use crate::distance::DistanceTable;
use crate::game::{Game, MoveError};
use crate::movegen;

/// Exponent applied to each matched distance.
const DISTANCE_EXPONENT: f64 = 1.4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BotError {
    #[error("color {color} holds {found} pieces, expected 10")]
    PieceCount { color: Color, found: usize },
    #[error("no candidate moves to choose from")]
    NoCandidates,
    #[error(transparent)]
    Move(#[from] MoveError),
}

/// Scores `board` for `player` in a game of `num_players` colors. Lower is better.
pub fn score_board(
    distances: &DistanceTable,
    board: &Board,
    player: Color,
    num_players: usize,
) -> Result<i64, BotError> {
    let pieces: Vec<Cell> = board.cells_of(player).collect();
    if pieces.len() != PIECES_PER_PLAYER {
        return Err(BotError::PieceCount {
            color: player,
            found: pieces.len(),
        });
    }

    let costs: Vec<Vec<i64>> = player
        .goal()
        .iter()
        .map(|&target| {
            pieces
                .iter()
                .map(|&piece| i64::from(distances.distance(target, piece)))
                .collect()
        })
        .collect();
    let matching = assignment::solve(&costs);

    let mut score: f64 = matching
        .row_of_column
        .iter()
        .enumerate()
        .map(|(col, &row)| (costs[row][col] as f64).powf(DISTANCE_EXPONENT))
        .sum();

    let spread_weight = (PIECES_PER_PLAYER * num_players.max(1)) as f64;
    for &a in &pieces {
        for &b in &pieces {
            score += f64::from(distances.distance(a, b)) / spread_weight;
        }
    }

    Ok(score as i64)
}

/// Evaluates moves on a private copy of a game.
pub struct BotEvaluator<'a> {
    distances: &'a DistanceTable,
    game: Game,
}

impl<'a> BotEvaluator<'a> {
    pub fn new(distances: &'a DistanceTable, game: &Game) -> Self {
        Self {
            distances,
            game: game.clone(),
        }
    }

    /// Score of the current position for `player`.
    pub fn score(&self, player: Color) -> Result<i64, BotError> {
        score_board(
            self.distances,
            self.game.board(),
            player,
            self.game.players().len(),
        )
    }

    /// Picks a move for the player to move.
    ///
    /// Passing is always a candidate, scored on the unchanged board. Returns the
    /// empty move when nothing improves on it.
    pub fn best_move<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Vec<Cell>, BotError> {
        let player = self.game.current_player();
        let mut best_score = self.score(player)?;
        let mut options: Vec<Vec<Cell>> = vec![Vec::new()];

        for candidate in movegen::all_moves(&self.game) {
            let (Some(&from), Some(&to)) = (candidate.first(), candidate.last()) else {
                continue;
            };
            self.game.board_mut().swap(from, to);
            let score = self.score(player);
            self.game.board_mut().swap(from, to);
            let score = score?;

            if score < best_score {
                best_score = score;
                options.clear();
            }
            if score == best_score {
                options.push(candidate);
            }
        }

        tracing::trace!(
            player = %player,
            score = best_score,
            options = options.len(),
            "evaluated bot moves"
        );
        options.choose(rng).cloned().ok_or(BotError::NoCandidates)
    }
}

/// Chooses and plays the bot move for the color to move. Returns the move played.
pub fn play_turn<R: Rng + ?Sized>(
    distances: &DistanceTable,
    game: &mut Game,
    rng: &mut R,
) -> Result<Vec<Cell>, BotError> {
    let chosen = BotEvaluator::new(distances, game).best_move(rng)?;
    game.apply_generated_move(&chosen)?;
    Ok(chosen)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn color(raw: u8) -> Color {
        Color::new(raw).unwrap()
    }

    #[test]
    fn finished_position_scores_only_spread() {
        let table = DistanceTable::build();
        let mut board = Board::empty();
        for &cell in color(1).goal() {
            board.set(cell, Some(color(1)));
        }
        let spread: u32 = color(1)
            .goal()
            .iter()
            .flat_map(|&a| color(1).goal().iter().map(move |&b| (a, b)))
            .map(|(a, b)| table.distance(a, b))
            .sum();
        let expected = i64::from(spread / 20);
        let score = score_board(&table, &board, color(1), 2).unwrap();
        assert!((score - expected).abs() <= 1, "{score} vs {expected}");
    }

    #[test]
    fn wrong_piece_count_is_reported() {
        let table = DistanceTable::build();
        let mut board = Board::starting(&[color(1)]);
        board.set(Cell::new(4, 0), None);
        assert_eq!(
            score_board(&table, &board, color(1), 1),
            Err(BotError::PieceCount {
                color: color(1),
                found: 9
            })
        );
    }

    #[test]
    fn opening_move_is_legal_and_improves() {
        let table = DistanceTable::build();
        let game = Game::new([color(1), color(4)]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut evaluator = BotEvaluator::new(&table, &game);
        let before = evaluator.score(color(1)).unwrap();

        let chosen = evaluator.best_move(&mut rng).unwrap();
        assert!(!chosen.is_empty());

        let mut after = game.clone();
        after.apply_generated_move(&chosen).unwrap();
        let score = score_board(&table, after.board(), color(1), 2).unwrap();
        assert!(score < before);
    }

    #[test]
    fn play_turn_applies_single_jump() {
        let table = DistanceTable::build();
        let mut board = Board::empty();
        for &cell in color(1).home() {
            board.set(cell, Some(color(1)));
        }
        // a wall on the first row out of the home leaves only single jumps
        for x in 4..9 {
            board.set(Cell::new(x, 4), Some(color(4)));
        }
        let game = Game::with_board([color(1), color(4)], board).unwrap();

        let mut played_game = game.clone();
        let played = play_turn(&table, &mut played_game, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(played.len(), 2);
        assert_eq!(played_game.current_player(), color(4));
        assert_eq!(played_game.last_move(), played.as_slice());
        assert_eq!(played_game.board().count(color(1)), PIECES_PER_PLAYER);

        let mut by_hand = game;
        assert_eq!(by_hand.apply_move(&played), Err(MoveError::IllegalMove));
    }

    #[test]
    fn evaluator_leaves_board_untouched() {
        let table = DistanceTable::build();
        let game = Game::new(Color::ALL).unwrap();
        let mut evaluator = BotEvaluator::new(&table, &game);
        evaluator.best_move(&mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(evaluator.game.board(), game.board());
    }
}
