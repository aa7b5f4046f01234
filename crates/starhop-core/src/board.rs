//! Star board geometry and occupancy.
//!
//! The board is addressed by `(x, y)` pairs on a 17×17 grid. Each `y` line has a
//! half-open range of valid `x`, which together carve out the six-pointed star.
//! Six directions connect neighbouring cells.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Side length of the addressable grid.
pub const BOARD_SIZE: usize = 17;

/// Number of valid cells on the star.
pub const CELL_COUNT: usize = 121;

/// Pieces owned by each active color.
pub const PIECES_PER_PLAYER: usize = 10;

/// Valid `x` range (`start..end`) for each `y` line.
const LIMITS: [(i32, i32); BOARD_SIZE] = [
    (4, 5),
    (4, 6),
    (4, 7),
    (4, 8),
    (0, 13),
    (1, 13),
    (2, 13),
    (3, 13),
    (4, 13),
    (4, 14),
    (4, 15),
    (4, 16),
    (4, 17),
    (9, 13),
    (10, 13),
    (11, 13),
    (12, 13),
];

/// The six unit steps between neighbouring cells.
pub const DIRECTIONS: [(i32, i32); 6] = [(-1, -1), (-1, 0), (0, -1), (0, 1), (1, 0), (1, 1)];

const fn cell(x: i32, y: i32) -> Cell {
    Cell { x, y }
}

/// Home regions in color order 1..=6.
static HOMES: [[Cell; PIECES_PER_PLAYER]; 6] = [
    [
        cell(4, 0),
        cell(4, 1),
        cell(4, 2),
        cell(4, 3),
        cell(5, 1),
        cell(5, 2),
        cell(5, 3),
        cell(6, 2),
        cell(6, 3),
        cell(7, 3),
    ],
    [
        cell(0, 4),
        cell(1, 4),
        cell(1, 5),
        cell(2, 4),
        cell(2, 5),
        cell(2, 6),
        cell(3, 4),
        cell(3, 5),
        cell(3, 6),
        cell(3, 7),
    ],
    [
        cell(4, 9),
        cell(4, 10),
        cell(4, 11),
        cell(4, 12),
        cell(5, 10),
        cell(5, 11),
        cell(5, 12),
        cell(6, 11),
        cell(6, 12),
        cell(7, 12),
    ],
    [
        cell(9, 13),
        cell(10, 13),
        cell(10, 14),
        cell(11, 13),
        cell(11, 14),
        cell(11, 15),
        cell(12, 13),
        cell(12, 14),
        cell(12, 15),
        cell(12, 16),
    ],
    [
        cell(13, 9),
        cell(13, 10),
        cell(13, 11),
        cell(13, 12),
        cell(14, 10),
        cell(14, 11),
        cell(14, 12),
        cell(15, 11),
        cell(15, 12),
        cell(16, 12),
    ],
    [
        cell(9, 4),
        cell(10, 4),
        cell(10, 5),
        cell(11, 4),
        cell(11, 5),
        cell(11, 6),
        cell(12, 4),
        cell(12, 5),
        cell(12, 6),
        cell(12, 7),
    ],
];

/// A board coordinate. Serialized as a two-element array `[x, y]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Whether the cell lies on the star.
    pub fn is_valid(self) -> bool {
        if self.y < 0 || self.y >= BOARD_SIZE as i32 {
            return false;
        }
        let (start, end) = LIMITS[self.y as usize];
        (start..end).contains(&self.x)
    }

    /// The cell `distance` steps away along `direction`.
    #[inline]
    pub fn step(self, direction: (i32, i32), distance: i32) -> Cell {
        Cell {
            x: self.x + direction.0 * distance,
            y: self.y + direction.1 * distance,
        }
    }

    /// Valid neighbours, in [`DIRECTIONS`] order.
    pub fn neighbors(self) -> impl Iterator<Item = Cell> {
        DIRECTIONS
            .into_iter()
            .map(move |d| self.step(d, 1))
            .filter(|c| c.is_valid())
    }

    /// Dense index into a 17×17 grid; `None` off the star.
    #[inline]
    pub fn index(self) -> Option<usize> {
        if self.is_valid() {
            Some(self.x as usize * BOARD_SIZE + self.y as usize)
        } else {
            None
        }
    }

    /// Every valid cell in scan order (x-major, then y).
    pub fn all() -> impl Iterator<Item = Cell> {
        (0..BOARD_SIZE as i32)
            .flat_map(|x| (0..BOARD_SIZE as i32).map(move |y| Cell { x, y }))
            .filter(|c| c.is_valid())
    }
}

impl From<(i32, i32)> for Cell {
    fn from((x, y): (i32, i32)) -> Self {
        Cell { x, y }
    }
}

impl From<Cell> for (i32, i32) {
    fn from(cell: Cell) -> Self {
        (cell.x, cell.y)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A player color, 1 through 6.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Color(u8);

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("color must be between 1 and 6, got {0}")]
pub struct InvalidColor(pub u8);

impl Color {
    pub const ALL: [Color; 6] = [Color(1), Color(2), Color(3), Color(4), Color(5), Color(6)];

    pub const fn new(raw: u8) -> Option<Self> {
        if raw >= 1 && raw <= 6 {
            Some(Color(raw))
        } else {
            None
        }
    }

    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// The color across the board (1↔4, 2↔5, 3↔6).
    pub const fn opposite(self) -> Color {
        Color((self.0 + 2) % 6 + 1)
    }

    /// This color's starting region.
    pub fn home(self) -> &'static [Cell; PIECES_PER_PLAYER] {
        &HOMES[(self.0 - 1) as usize]
    }

    /// The region this color has to fill: the opposite color's home.
    pub fn goal(self) -> &'static [Cell; PIECES_PER_PLAYER] {
        self.opposite().home()
    }
}

impl TryFrom<u8> for Color {
    type Error = InvalidColor;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Color::new(raw).ok_or(InvalidColor(raw))
    }
}

impl From<Color> for u8 {
    fn from(color: Color) -> Self {
        color.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Occupancy grid: 0 for empty, otherwise the raw color.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    cells: [[u8; BOARD_SIZE]; BOARD_SIZE],
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    pub fn empty() -> Self {
        Self {
            cells: [[0; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// A board with every listed color sitting on its own home region.
    pub fn starting(players: &[Color]) -> Self {
        let mut board = Self::empty();
        for &color in players {
            for &cell in color.home() {
                board.set(cell, Some(color));
            }
        }
        board
    }

    /// Occupant of `cell`; `None` when empty or off the star.
    pub fn get(&self, cell: Cell) -> Option<Color> {
        if !cell.is_valid() {
            return None;
        }
        Color::new(self.cells[cell.x as usize][cell.y as usize])
    }

    /// Places (or clears) a piece. Cells off the star are ignored.
    pub fn set(&mut self, cell: Cell, occupant: Option<Color>) {
        if cell.is_valid() {
            self.cells[cell.x as usize][cell.y as usize] = occupant.map_or(0, Color::get);
        }
    }

    /// Exchanges the contents of two cells. Applying it twice restores the board.
    pub fn swap(&mut self, a: Cell, b: Cell) {
        let (pa, pb) = (self.get(a), self.get(b));
        self.set(a, pb);
        self.set(b, pa);
    }

    pub fn is_valid_and_empty(&self, cell: Cell) -> bool {
        cell.is_valid() && self.get(cell).is_none()
    }

    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.get(cell).is_some()
    }

    /// Single-step hop from `from` to an adjacent empty cell.
    pub fn is_hop(&self, from: Cell, to: Cell) -> bool {
        if !from.is_valid() || !to.is_valid() {
            return false;
        }
        let offset = (to.x - from.x, to.y - from.y);
        self.is_valid_and_empty(to) && DIRECTIONS.contains(&offset)
    }

    /// Two-space jump from `from` over an occupied midpoint into an empty cell.
    pub fn is_jump(&self, from: Cell, to: Cell) -> bool {
        if !from.is_valid() || !to.is_valid() {
            return false;
        }
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        if dx % 2 != 0 || dy % 2 != 0 {
            return false;
        }
        let half = (dx / 2, dy / 2);
        DIRECTIONS.contains(&half)
            && self.is_valid_and_empty(to)
            && self.is_occupied(from.step(half, 1))
    }

    /// Cells held by `color` in scan order.
    pub fn cells_of(&self, color: Color) -> impl Iterator<Item = Cell> + '_ {
        Cell::all().filter(move |&c| self.get(c) == Some(color))
    }

    pub fn count(&self, color: Color) -> usize {
        self.cells_of(color).count()
    }

    /// Raw grid, indexed `[x][y]`, for snapshots.
    pub fn rows(&self) -> Vec<Vec<u8>> {
        self.cells.iter().map(|column| column.to_vec()).collect()
    }
}
