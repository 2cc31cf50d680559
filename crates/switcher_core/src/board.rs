//! The 6x6 color grid.

use crate::movement::{BOARD_SIZE, Coordinate};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};
use tracing::{debug, instrument};

/// Tile color.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Color {
    /// Red tile.
    Red,
    /// Green tile.
    Green,
    /// Blue tile.
    Blue,
    /// Yellow tile.
    Yellow,
}

/// Cells of each color on a freshly initialized board.
pub const CELLS_PER_COLOR: usize = 9;

const SIDE: usize = BOARD_SIZE as usize;

/// Square grid of colored tiles, indexed `[x][y]` (row, column).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    cells: [[Color; SIDE]; SIDE],
}

impl Board {
    /// Lays out nine tiles of each color and shuffles them uniformly.
    #[instrument(skip(rng))]
    pub fn initialize<R: Rng>(rng: &mut R) -> Self {
        let mut tiles: Vec<Color> = Color::iter()
            .flat_map(|color| std::iter::repeat_n(color, CELLS_PER_COLOR))
            .collect();
        tiles.shuffle(rng);

        let mut cells = [[Color::Red; SIDE]; SIDE];
        for (index, color) in tiles.into_iter().enumerate() {
            cells[index / SIDE][index % SIDE] = color;
        }
        debug!("Board initialized");
        Self { cells }
    }

    /// Builds a board from explicit rows.
    pub fn from_cells(cells: [[Color; SIDE]; SIDE]) -> Self {
        Self { cells }
    }

    /// Color at a cell, `None` off the board.
    pub fn get(&self, at: Coordinate) -> Option<Color> {
        self.cells
            .get(usize::from(at.x))
            .and_then(|row| row.get(usize::from(at.y)))
            .copied()
    }

    /// Exchanges the colors of two cells.
    ///
    /// Legality is checked by the caller against the movement catalog;
    /// both coordinates must be on the board.
    pub fn swap(&mut self, a: Coordinate, b: Coordinate) {
        let (ax, ay) = (usize::from(a.x), usize::from(a.y));
        let (bx, by) = (usize::from(b.x), usize::from(b.y));
        let first = self.cells[ax][ay];
        self.cells[ax][ay] = self.cells[bx][by];
        self.cells[bx][by] = first;
    }

    /// Rows of the grid.
    pub fn cells(&self) -> &[[Color; SIDE]; SIDE] {
        &self.cells
    }

    /// Number of tiles of a color.
    pub fn count(&self, color: Color) -> usize {
        self.cells.iter().flatten().filter(|&&c| c == color).count()
    }
}

/// Color initials, one row per line.
impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (x, row) in self.cells.iter().enumerate() {
            if x > 0 {
                writeln!(f)?;
            }
            for color in row {
                let initial = match color {
                    Color::Red => 'R',
                    Color::Green => 'G',
                    Color::Blue => 'B',
                    Color::Yellow => 'Y',
                };
                write!(f, "{}", initial)?;
            }
        }
        Ok(())
    }
}
