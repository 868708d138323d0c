//! Reroll region selectors.

use crate::{BoardSize, Coord};
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use tracing::{debug, instrument};

/// One of the two full-length diagonals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Diagonal {
    /// Top-left to bottom-right, cells (i, i).
    Main,
    /// Top-right to bottom-left, cells (i, N-1-i).
    Anti,
}

/// A validated region of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSelector {
    /// A single cell.
    Tile(Coord),
    /// A full row.
    Row(usize),
    /// A full column.
    Column(usize),
    /// A full diagonal.
    Diagonal(Diagonal),
    /// Every cell.
    Board,
    /// A row picked at random when resolved.
    RandomRow,
    /// A column picked at random when resolved.
    RandomColumn,
    /// A diagonal picked at random when resolved.
    RandomDiagonal,
}

impl RegionSelector {
    /// Resolves the region to concrete coordinates.
    ///
    /// Random variants draw from `rng` once, so callers must resolve once and
    /// reuse the coordinates.
    pub fn coords<R: Rng + ?Sized>(&self, size: BoardSize, rng: &mut R) -> Vec<Coord> {
        let n = size.get();
        match *self {
            Self::Tile(coord) if size.contains(coord) => vec![coord],
            Self::Tile(_) => Vec::new(),
            Self::Row(row) if row < n => (0..n).map(|col| Coord::new(row, col)).collect(),
            Self::Column(col) if col < n => (0..n).map(|row| Coord::new(row, col)).collect(),
            Self::Row(_) | Self::Column(_) => Vec::new(),
            Self::Diagonal(Diagonal::Main) => (0..n).map(|i| Coord::new(i, i)).collect(),
            Self::Diagonal(Diagonal::Anti) => (0..n).map(|i| Coord::new(i, n - 1 - i)).collect(),
            Self::Board => size.coords().collect(),
            Self::RandomRow => Self::Row(rng.gen_range(0..n)).coords(size, rng),
            Self::RandomColumn => Self::Column(rng.gen_range(0..n)).coords(size, rng),
            Self::RandomDiagonal => {
                let diagonal = if rng.gen_bool(0.5) {
                    Diagonal::Main
                } else {
                    Diagonal::Anti
                };
                Self::Diagonal(diagonal).coords(size, rng)
            }
        }
    }
}

/// Region selector as it arrives from a client, with one-based indices.
///
/// | kind | arg |
/// |---|---|
/// | `tile` | `"row,col"` |
/// | `row` / `column` | `"n"` |
/// | `diagonal` | `"main"` or `"anti"` |
/// | `card` | none |
/// | `random_row` / `random_column` / `random_diagonal` | none |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRequest {
    /// Selector kind.
    pub kind: String,
    /// Kind-specific argument.
    #[serde(default)]
    pub arg: Option<String>,
}

impl RegionRequest {
    /// Creates a request.
    pub fn new(kind: impl Into<String>, arg: Option<&str>) -> Self {
        Self {
            kind: kind.into(),
            arg: arg.map(str::to_string),
        }
    }

    /// Validates the request against the board size.
    ///
    /// Unknown kinds, unparsable arguments, and indices outside 1..=N all
    /// give `None`.
    #[instrument(skip(self), fields(kind = %self.kind, arg = ?self.arg))]
    pub fn resolve(&self, size: BoardSize) -> Option<RegionSelector> {
        let arg = self.arg.as_deref().map(str::trim);
        let index = |raw: &str| {
            raw.trim()
                .parse::<usize>()
                .ok()
                .filter(|i| (1..=size.get()).contains(i))
                .map(|i| i - 1)
        };
        let selector = match self.kind.trim() {
            "tile" => {
                let (row, col) = arg?.split_once(',')?;
                Some(RegionSelector::Tile(Coord::new(index(row)?, index(col)?)))
            }
            "row" => index(arg?).map(RegionSelector::Row),
            "column" => index(arg?).map(RegionSelector::Column),
            "diagonal" => arg?.parse::<Diagonal>().ok().map(RegionSelector::Diagonal),
            "card" | "board" => Some(RegionSelector::Board),
            "random_row" => Some(RegionSelector::RandomRow),
            "random_column" => Some(RegionSelector::RandomColumn),
            "random_diagonal" => Some(RegionSelector::RandomDiagonal),
            _ => None,
        };
        if selector.is_none() {
            debug!("Rejected region selector");
        }
        selector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn size(n: usize) -> BoardSize {
        BoardSize::new(n).unwrap()
    }

    #[test]
    fn test_resolve_one_based_tile() {
        let request = RegionRequest::new("tile", Some("2,3"));
        assert_eq!(
            request.resolve(size(5)),
            Some(RegionSelector::Tile(Coord::new(1, 2)))
        );
    }

    #[test]
    fn test_resolve_rejects_out_of_range_for_board_size() {
        assert_eq!(RegionRequest::new("row", Some("4")).resolve(size(3)), None);
        assert_eq!(
            RegionRequest::new("row", Some("4")).resolve(size(4)),
            Some(RegionSelector::Row(3))
        );
        assert_eq!(RegionRequest::new("column", Some("0")).resolve(size(5)), None);
        assert_eq!(RegionRequest::new("tile", Some("1")).resolve(size(5)), None);
        assert_eq!(RegionRequest::new("tile", Some("a,b")).resolve(size(5)), None);
        assert_eq!(RegionRequest::new("diagonal", Some("sideways")).resolve(size(5)), None);
        assert_eq!(RegionRequest::new("spiral", None).resolve(size(5)), None);
        assert_eq!(RegionRequest::new("row", None).resolve(size(5)), None);
    }

    #[test]
    fn test_anti_diagonal_coords() {
        let mut rng = StdRng::seed_from_u64(1);
        let coords = RegionSelector::Diagonal(Diagonal::Anti).coords(size(3), &mut rng);
        assert_eq!(coords, vec![Coord::new(0, 2), Coord::new(1, 1), Coord::new(2, 0)]);
    }

    #[test]
    fn test_random_row_is_a_full_row() {
        let mut rng = StdRng::seed_from_u64(9);
        let coords = RegionSelector::RandomRow.coords(size(6), &mut rng);
        assert_eq!(coords.len(), 6);
        assert!(coords.iter().all(|c| c.row == coords[0].row));
    }
}
