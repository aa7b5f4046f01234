//! Legal move enumeration.

use std::collections::VecDeque;

use crate::board::{Board, Cell, BOARD_SIZE, DIRECTIONS};
use crate::game::Game;

const SLOTS: usize = BOARD_SIZE * BOARD_SIZE;

/// Every legal move of the piece on `origin`, one per reachable destination.
///
/// Jump destinations are found breadth-first so each path is a shortest jump
/// chain. Adjacent hops are added only where no jump already lands. Results come
/// back in scan order of their destination.
pub fn moves_from(board: &Board, origin: Cell) -> Vec<Vec<Cell>> {
    let Some(origin_index) = origin.index() else {
        return Vec::new();
    };
    if !board.is_occupied(origin) {
        return Vec::new();
    }

    let mut came_from: Vec<Option<Cell>> = vec![None; SLOTS];
    came_from[origin_index] = Some(origin);

    let mut queue = VecDeque::from([origin]);
    while let Some(current) = queue.pop_front() {
        for direction in DIRECTIONS {
            let next = current.step(direction, 2);
            if !board.is_jump(current, next) {
                continue;
            }
            // is_jump implies next is on the board
            let Some(slot) = next.index() else { continue };
            if came_from[slot].is_none() {
                came_from[slot] = Some(current);
                queue.push_back(next);
            }
        }
    }

    for next in origin.neighbors() {
        if !board.is_hop(origin, next) {
            continue;
        }
        if let Some(slot) = next.index() {
            if came_from[slot].is_none() {
                came_from[slot] = Some(origin);
            }
        }
    }

    Cell::all()
        .filter(|&cell| cell != origin)
        .filter_map(|destination| {
            let slot = destination.index()?;
            came_from[slot]?;
            Some(reconstruct_path(&came_from, origin, destination))
        })
        .collect()
}

fn reconstruct_path(came_from: &[Option<Cell>], origin: Cell, destination: Cell) -> Vec<Cell> {
    let mut path = vec![destination];
    let mut current = destination;
    while current != origin {
        match current.index().and_then(|slot| came_from[slot]) {
            Some(previous) => {
                path.push(previous);
                current = previous;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

/// All legal non-pass moves for the player to move, grouped by origin in scan order.
pub fn all_moves(game: &Game) -> Vec<Vec<Cell>> {
    let board = game.board();
    board
        .cells_of(game.current_player())
        .flat_map(|origin| moves_from(board, origin))
        .collect()
}
