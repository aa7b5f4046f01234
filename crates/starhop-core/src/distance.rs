//! Shortest hop distances between every pair of cells.

use std::collections::VecDeque;

use crate::board::{Cell, BOARD_SIZE};

const SLOTS: usize = BOARD_SIZE * BOARD_SIZE;

/// Stored for pairs involving a cell off the star.
pub const UNREACHABLE: u32 = u32::MAX;

/// All-pairs hop distances on the empty star.
///
/// Built once at start-up and shared read-only between rooms.
#[derive(Clone, Debug)]
pub struct DistanceTable {
    dist: Vec<u8>,
}

impl DistanceTable {
    /// One breadth-first search over single-step neighbours per valid cell.
    pub fn build() -> Self {
        let mut dist = vec![u8::MAX; SLOTS * SLOTS];
        for source in Cell::all() {
            let Some(src) = source.index() else { continue };
            let row = &mut dist[src * SLOTS..(src + 1) * SLOTS];
            row[src] = 0;
            let mut queue = VecDeque::from([source]);
            while let Some(current) = queue.pop_front() {
                let Some(cur) = current.index() else { continue };
                let next_distance = row[cur] + 1;
                for neighbor in current.neighbors() {
                    let Some(n) = neighbor.index() else { continue };
                    if row[n] == u8::MAX {
                        row[n] = next_distance;
                        queue.push_back(neighbor);
                    }
                }
            }
        }
        tracing::debug!(cells = SLOTS, "built distance table");
        Self { dist }
    }

    /// Hop distance from `a` to `b`; [`UNREACHABLE`] if either is off the star.
    pub fn distance(&self, a: Cell, b: Cell) -> u32 {
        match (a.index(), b.index()) {
            (Some(i), Some(j)) => match self.dist[i * SLOTS + j] {
                u8::MAX => UNREACHABLE,
                d => u32::from(d),
            },
            _ => UNREACHABLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_is_zero_and_neighbours_are_one() {
        let table = DistanceTable::build();
        for cell in Cell::all() {
            assert_eq!(table.distance(cell, cell), 0);
            for n in cell.neighbors() {
                assert_eq!(table.distance(cell, n), 1);
            }
        }
    }

    #[test]
    fn symmetric() {
        let table = DistanceTable::build();
        let cells: Vec<_> = Cell::all().collect();
        for &a in &cells {
            for &b in &cells {
                assert_eq!(table.distance(a, b), table.distance(b, a));
            }
        }
    }

    #[test]
    fn opposite_tips_are_sixteen_apart() {
        let table = DistanceTable::build();
        assert_eq!(table.distance(Cell::new(4, 0), Cell::new(12, 16)), 16);
    }

    #[test]
    fn off_board_is_unreachable() {
        let table = DistanceTable::build();
        assert_eq!(table.distance(Cell::new(0, 0), Cell::new(4, 0)), UNREACHABLE);
    }
}
