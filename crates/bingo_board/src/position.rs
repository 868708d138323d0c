//! Board dimensions and cell coordinates.

use crate::BoardError;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Smallest supported board edge.
pub const MIN_BOARD_SIZE: usize = 3;

/// Largest supported board edge.
pub const MAX_BOARD_SIZE: usize = 10;

/// Board edge used when none (or an invalid one) is requested.
pub const DEFAULT_BOARD_SIZE: usize = 5;

/// Edge length N of an N×N board, always within 3..=10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct BoardSize(usize);

impl BoardSize {
    /// Creates a board size, rejecting values outside 3..=10.
    pub fn new(size: usize) -> Result<Self, BoardError> {
        if (MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&size) {
            Ok(Self(size))
        } else {
            Err(BoardError::InvalidSize { size })
        }
    }

    /// Resolves a requested size, falling back to the default when the
    /// request is missing or out of range.
    pub fn resolve(requested: Option<usize>) -> Self {
        requested
            .and_then(|size| Self::new(size).ok())
            .unwrap_or_default()
    }

    /// Edge length.
    pub fn get(self) -> usize {
        self.0
    }

    /// Number of cells (N²).
    pub fn cells(self) -> usize {
        self.0 * self.0
    }

    /// Whether the coordinate lies on the board.
    pub fn contains(self, coord: Coord) -> bool {
        coord.row < self.0 && coord.col < self.0
    }

    /// All coordinates in row-major order.
    pub fn coords(self) -> impl Iterator<Item = Coord> {
        let n = self.0;
        (0..n * n).map(move |i| Coord::new(i / n, i % n))
    }
}

impl Default for BoardSize {
    fn default() -> Self {
        Self(DEFAULT_BOARD_SIZE)
    }
}

impl TryFrom<usize> for BoardSize {
    type Error = BoardError;

    fn try_from(size: usize) -> Result<Self, Self::Error> {
        Self::new(size)
    }
}

impl From<BoardSize> for usize {
    fn from(size: BoardSize) -> Self {
        size.0
    }
}

/// Zero-based cell coordinate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize,
)]
#[display("({row}, {col})")]
pub struct Coord {
    /// Row index.
    pub row: usize,
    /// Column index.
    pub col: usize,
}

impl Coord {
    /// Creates a coordinate.
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}
