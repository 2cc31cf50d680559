//! Movement cards and the catalog of legal swaps.
//!
//! Each of the seven movement patterns owns a precomputed set of
//! `(from, to)` coordinate pairs on the 6x6 board. Sets are built once,
//! are symmetric, and never contain a cell paired with itself or a
//! coordinate outside the board.

use crate::GameError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::LazyLock;
use strum::{EnumIter, IntoEnumIterator};
use tracing::{debug, instrument, warn};

/// Side length of the square board.
pub const BOARD_SIZE: u8 = 6;

/// One of the seven movement patterns printed on movement cards.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    strum::Display,
    strum::EnumString,
)]
pub enum MovementType {
    /// Diagonal swap across one cell.
    #[serde(rename = "MOV_01")]
    #[strum(serialize = "MOV_01")]
    Mov01,
    /// Orthogonal swap across one cell.
    #[serde(rename = "MOV_02")]
    #[strum(serialize = "MOV_02")]
    Mov02,
    /// Orthogonal swap with an adjacent cell.
    #[serde(rename = "MOV_03")]
    #[strum(serialize = "MOV_03")]
    Mov03,
    /// Diagonal swap with an adjacent cell.
    #[serde(rename = "MOV_04")]
    #[strum(serialize = "MOV_04")]
    Mov04,
    /// Knight-like swap, offsets (-2,+1) and (-1,-2).
    #[serde(rename = "MOV_05")]
    #[strum(serialize = "MOV_05")]
    Mov05,
    /// Knight-like swap, offsets (-2,-1) and (-1,+2).
    #[serde(rename = "MOV_06")]
    #[strum(serialize = "MOV_06")]
    Mov06,
    /// Orthogonal swap across three cells.
    #[serde(rename = "MOV_07")]
    #[strum(serialize = "MOV_07")]
    Mov07,
}

impl MovementType {
    /// All seven movement types in card order.
    pub const ALL: [MovementType; 7] = [
        MovementType::Mov01,
        MovementType::Mov02,
        MovementType::Mov03,
        MovementType::Mov04,
        MovementType::Mov05,
        MovementType::Mov06,
        MovementType::Mov07,
    ];

    /// Card number as printed (1-7).
    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    /// Base offsets of the pattern. The catalog also adds their negations.
    fn offsets(self) -> &'static [(i8, i8)] {
        match self {
            Self::Mov01 => &[(2, 2), (2, -2)],
            Self::Mov02 => &[(2, 0), (0, 2)],
            Self::Mov03 => &[(1, 0), (0, 1)],
            Self::Mov04 => &[(1, 1), (1, -1)],
            Self::Mov05 => &[(-2, 1), (-1, -2)],
            Self::Mov06 => &[(-2, -1), (-1, 2)],
            Self::Mov07 => &[(4, 0), (0, 4)],
        }
    }

    /// Parses a card type given either as `MOV_0n` or as its number.
    #[instrument]
    pub fn parse(raw: &str) -> Result<Self, GameError> {
        let trimmed = raw.trim();
        if let Ok(number) = trimmed.parse::<u8>() {
            return Self::try_from(number);
        }
        Self::from_str(trimmed).map_err(|_| {
            warn!(raw, "Unknown movement type");
            GameError::UnknownMovementType(raw.to_string())
        })
    }
}

impl TryFrom<u8> for MovementType {
    type Error = GameError;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        number
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(usize::from(index)).copied())
            .ok_or_else(|| GameError::UnknownMovementType(number.to_string()))
    }
}

/// A cell on the board. `x` is the row and `y` the column, both 0-based.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_new::new,
)]
pub struct Coordinate {
    /// Row.
    pub x: u8,
    /// Column.
    pub y: u8,
}

impl Coordinate {
    /// Whether the coordinate lies on the board.
    pub fn on_board(self) -> bool {
        self.x < BOARD_SIZE && self.y < BOARD_SIZE
    }

    fn offset(self, (dx, dy): (i8, i8)) -> Option<Self> {
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        let moved = Self { x, y };
        moved.on_board().then_some(moved)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A requested swap: the card being played and the two cells it exchanges.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_new::new,
)]
pub struct Movement {
    /// Card played.
    pub card: MovementType,
    /// First cell.
    pub from: Coordinate,
    /// Second cell.
    pub to: Coordinate,
}

impl std::fmt::Display for Movement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} <-> {}", self.card, self.from, self.to)
    }
}

/// Precomputed legal swaps for every movement type.
#[derive(Debug)]
pub struct MoveCatalog {
    tables: [HashSet<(Coordinate, Coordinate)>; 7],
}

static CATALOG: LazyLock<MoveCatalog> = LazyLock::new(MoveCatalog::build);

impl MoveCatalog {
    /// Process-wide catalog, built on first use.
    pub fn global() -> &'static Self {
        &CATALOG
    }

    /// Generates all seven tables.
    #[instrument]
    pub fn build() -> Self {
        let tables = MovementType::ALL.map(Self::table_for);
        let catalog = Self { tables };
        debug!(
            sizes = ?MovementType::iter().map(|k| catalog.legal_moves(k).len()).collect::<Vec<_>>(),
            "Movement catalog built"
        );
        catalog
    }

    fn table_for(kind: MovementType) -> HashSet<(Coordinate, Coordinate)> {
        let mut table = HashSet::new();
        for x in 0..BOARD_SIZE {
            for y in 0..BOARD_SIZE {
                let from = Coordinate { x, y };
                for &(dx, dy) in kind.offsets() {
                    for delta in [(dx, dy), (-dx, -dy)] {
                        if let Some(to) = from.offset(delta) {
                            table.insert((from, to));
                            table.insert((to, from));
                        }
                    }
                }
            }
        }
        table
    }

    /// All legal `(from, to)` pairs for a movement type.
    pub fn legal_moves(&self, kind: MovementType) -> &HashSet<(Coordinate, Coordinate)> {
        &self.tables[kind as usize]
    }

    /// O(1) membership test.
    pub fn is_legal(&self, kind: MovementType, from: Coordinate, to: Coordinate) -> bool {
        self.legal_moves(kind).contains(&(from, to))
    }

    /// Validates a movement against its card's table.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::IllegalMovement`] if the pair is not in the table.
    #[instrument(skip(self), fields(movement = %movement))]
    pub fn validate(&self, movement: &Movement) -> Result<(), GameError> {
        if self.is_legal(movement.card, movement.from, movement.to) {
            Ok(())
        } else {
            warn!("Movement rejected by catalog");
            Err(GameError::IllegalMovement(movement.card))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: u8, y: u8) -> Coordinate {
        Coordinate::new(x, y)
    }

    #[test]
    fn test_every_table_is_symmetric() {
        let catalog = MoveCatalog::build();
        for kind in MovementType::iter() {
            for &(from, to) in catalog.legal_moves(kind) {
                assert!(
                    catalog.is_legal(kind, to, from),
                    "{kind} missing reverse of {from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_no_self_pairs_or_off_board_cells() {
        let catalog = MoveCatalog::build();
        for kind in MovementType::iter() {
            for &(from, to) in catalog.legal_moves(kind) {
                assert_ne!(from, to);
                assert!(from.on_board() && to.on_board());
            }
        }
    }

    #[test]
    fn test_contiguous_orthogonal() {
        let catalog = MoveCatalog::global();
        assert!(catalog.is_legal(MovementType::Mov03, c(0, 0), c(0, 1)));
        assert!(!catalog.is_legal(MovementType::Mov03, c(0, 0), c(0, 2)));
        assert!(catalog.is_legal(MovementType::Mov02, c(0, 0), c(0, 2)));
    }

    #[test]
    fn test_long_orthogonal() {
        let catalog = MoveCatalog::global();
        assert!(catalog.is_legal(MovementType::Mov07, c(0, 0), c(0, 4)));
        assert!(!catalog.is_legal(MovementType::Mov07, c(0, 0), c(0, 5)));
        assert!(!catalog.is_legal(MovementType::Mov07, c(0, 0), c(0, 3)));
        assert!(catalog.is_legal(MovementType::Mov07, c(5, 1), c(1, 1)));
    }

    #[test]
    fn test_diagonals() {
        let catalog = MoveCatalog::global();
        assert!(catalog.is_legal(MovementType::Mov01, c(2, 2), c(0, 0)));
        assert!(catalog.is_legal(MovementType::Mov01, c(2, 0), c(0, 2)));
        assert!(!catalog.is_legal(MovementType::Mov01, c(1, 1), c(0, 0)));
        assert!(catalog.is_legal(MovementType::Mov04, c(1, 1), c(0, 0)));
        assert!(catalog.is_legal(MovementType::Mov04, c(1, 0), c(0, 1)));
    }

    #[test]
    fn test_knight_variants_are_disjoint() {
        let catalog = MoveCatalog::global();
        assert!(catalog.is_legal(MovementType::Mov05, c(2, 0), c(0, 1)));
        assert!(catalog.is_legal(MovementType::Mov05, c(1, 2), c(0, 0)));
        assert!(!catalog.is_legal(MovementType::Mov06, c(2, 0), c(0, 1)));
        assert!(catalog.is_legal(MovementType::Mov06, c(2, 1), c(0, 0)));
        assert!(catalog.is_legal(MovementType::Mov06, c(1, 0), c(0, 2)));
        let five = catalog.legal_moves(MovementType::Mov05);
        let six = catalog.legal_moves(MovementType::Mov06);
        assert!(five.is_disjoint(six));
    }

    #[test]
    fn test_table_sizes() {
        let catalog = MoveCatalog::global();
        // 2 directions * 6 lines * 5 adjacent pairs, both orders
        assert_eq!(catalog.legal_moves(MovementType::Mov03).len(), 120);
        // 2 directions * 6 lines * 2 pairs four apart, both orders
        assert_eq!(catalog.legal_moves(MovementType::Mov07).len(), 48);
        // 2 diagonal directions * 25 unit squares, both orders
        assert_eq!(catalog.legal_moves(MovementType::Mov04).len(), 100);
    }

    #[test]
    fn test_parse_movement_type() {
        assert_eq!(MovementType::parse("MOV_05"), Ok(MovementType::Mov05));
        assert_eq!(MovementType::parse("7"), Ok(MovementType::Mov07));
        assert!(matches!(
            MovementType::parse("MOV_08"),
            Err(GameError::UnknownMovementType(_))
        ));
        assert!(matches!(
            MovementType::try_from(0),
            Err(GameError::UnknownMovementType(_))
        ));
    }

    #[test]
    fn test_validate_reports_card() {
        let movement = Movement::new(MovementType::Mov02, c(0, 0), c(0, 1));
        assert_eq!(
            MoveCatalog::global().validate(&movement),
            Err(GameError::IllegalMovement(MovementType::Mov02))
        );
        let reversed = Movement::new(movement.card, movement.to, movement.from);
        assert!(MoveCatalog::global().validate(&reversed).is_err());
    }
}
