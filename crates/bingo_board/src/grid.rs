//! Card grid and shared-card mark sets.

use crate::{BoardError, BoardSize, Coord};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// One prompt on a card.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
pub struct Cell {
    /// Prompt text.
    prompt: String,
    /// Whether the owner has marked this prompt.
    marked: bool,
}

impl Cell {
    /// Creates an unmarked cell.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            marked: false,
        }
    }
}

/// N×N card of prompts, stored row by row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    size: BoardSize,
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    /// Builds a card from exactly N² prompts in row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::PromptCount`] if the prompt count is not N².
    #[instrument(skip(prompts), fields(count = prompts.len()))]
    pub fn new(size: BoardSize, prompts: Vec<String>) -> Result<Self, BoardError> {
        if prompts.len() != size.cells() {
            return Err(BoardError::PromptCount {
                expected: size.cells(),
                actual: prompts.len(),
            });
        }
        let n = size.get();
        let mut cells = prompts.into_iter().map(Cell::new);
        let rows = (0..n).map(|_| cells.by_ref().take(n).collect()).collect();
        Ok(Self { size, rows })
    }

    /// Edge length of the card.
    pub fn size(&self) -> BoardSize {
        self.size
    }

    /// Rows of cells.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Cell at the coordinate, if on the board.
    pub fn cell(&self, coord: Coord) -> Option<&Cell> {
        self.rows.get(coord.row).and_then(|row| row.get(coord.col))
    }

    fn cell_mut(&mut self, coord: Coord) -> Option<&mut Cell> {
        self.rows
            .get_mut(coord.row)
            .and_then(|row| row.get_mut(coord.col))
    }

    /// Whether the cell is marked. Off-board coordinates are unmarked.
    pub fn is_marked(&self, coord: Coord) -> bool {
        self.cell(coord).is_some_and(|cell| cell.marked)
    }

    /// Flips the mark on a cell.
    ///
    /// Returns `false` without changing anything for off-board coordinates.
    #[instrument(skip(self))]
    pub fn toggle_mark(&mut self, coord: Coord) -> bool {
        match self.cell_mut(coord) {
            Some(cell) => {
                cell.marked = !cell.marked;
                debug!(marked = cell.marked, "Toggled cell");
                true
            }
            None => {
                debug!("Toggle ignored, coordinate off board");
                false
            }
        }
    }

    /// Clears the mark on a cell. Returns whether it was marked.
    pub fn unmark(&mut self, coord: Coord) -> bool {
        match self.cell_mut(coord) {
            Some(cell) if cell.marked => {
                cell.marked = false;
                true
            }
            _ => false,
        }
    }

    /// Replaces the prompt at a cell and clears its mark.
    pub(crate) fn replace(&mut self, coord: Coord, prompt: String) -> bool {
        match self.cell_mut(coord) {
            Some(cell) => {
                *cell = Cell::new(prompt);
                true
            }
            None => false,
        }
    }

    /// Clears every mark on the card.
    pub fn clear_marks(&mut self) {
        self.rows
            .iter_mut()
            .flatten()
            .for_each(|cell| cell.marked = false);
    }

    /// All prompts in row-major order.
    pub fn prompts(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().map(|cell| cell.prompt.as_str())
    }

    /// Marked state as a boolean matrix for [`crate::evaluate`].
    pub fn marks(&self) -> Vec<Vec<bool>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.marked).collect())
            .collect()
    }

    /// Number of marked cells.
    pub fn marked_count(&self) -> usize {
        self.rows.iter().flatten().filter(|cell| cell.marked).count()
    }

    /// Whether both cards carry the same prompts in the same places.
    pub fn same_prompts(&self, other: &Grid) -> bool {
        self.size == other.size && self.prompts().eq(other.prompts())
    }
}

/// Result of a mark request on a shared card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedMark {
    /// The coordinate was free and now belongs to the actor.
    Marked,
    /// The actor already held the coordinate and released it.
    Unmarked,
    /// Another player holds the coordinate; nothing changed.
    Blocked,
    /// Coordinate is off the board; nothing changed.
    OffBoard,
}

/// Coordinates one player holds on a shared card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkSet(BTreeSet<Coord>);

impl MarkSet {
    /// Creates an empty mark set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the coordinate is held.
    pub fn contains(&self, coord: Coord) -> bool {
        self.0.contains(&coord)
    }

    /// Number of held coordinates.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no coordinate is held.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Held coordinates in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Coord> {
        self.0.iter()
    }

    /// Releases a coordinate. Returns whether it was held.
    pub fn remove(&mut self, coord: Coord) -> bool {
        self.0.remove(&coord)
    }

    /// Releases every coordinate in `coords`.
    pub fn release_all(&mut self, coords: &[Coord]) {
        for coord in coords {
            self.0.remove(coord);
        }
    }

    /// Toggles the actor's claim on a coordinate of a shared card.
    ///
    /// A coordinate may be held by at most one player: the claim is refused
    /// with [`SharedMark::Blocked`] when any set in `others` holds it.
    #[instrument(skip(self, others))]
    pub fn mark_shared<'a>(
        &mut self,
        size: BoardSize,
        coord: Coord,
        others: impl IntoIterator<Item = &'a MarkSet>,
    ) -> SharedMark {
        if !size.contains(coord) {
            return SharedMark::OffBoard;
        }
        if self.0.remove(&coord) {
            return SharedMark::Unmarked;
        }
        if others.into_iter().any(|other| other.contains(coord)) {
            debug!("Coordinate already held by another player");
            return SharedMark::Blocked;
        }
        self.0.insert(coord);
        SharedMark::Marked
    }

    /// Held coordinates as a boolean matrix for [`crate::evaluate`].
    pub fn to_matrix(&self, size: BoardSize) -> Vec<Vec<bool>> {
        let n = size.get();
        let mut matrix = vec![vec![false; n]; n];
        for coord in self.0.iter().filter(|c| size.contains(**c)) {
            matrix[coord.row][coord.col] = true;
        }
        matrix
    }
}

impl FromIterator<Coord> for MarkSet {
    fn from_iter<I: IntoIterator<Item = Coord>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
