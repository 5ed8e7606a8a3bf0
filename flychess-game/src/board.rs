//! Board track model: the ordered path of cells tokens travel along.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{BOARD_GRID_SIZE, STAR_CELLS, TRAP_CELLS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Start,
    Path,
    Star,
    Trap,
    End,
}

/// A single cell on the track with its grid coordinates for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathCell {
    pub id: usize,
    pub x: i32,
    pub y: i32,
    #[serde(rename = "type")]
    pub cell_type: CellType,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("a board needs at least two cells, got {0}")]
    TooShort(usize),
    #[error("cell at index {index} has id {id}")]
    IdMismatch { index: usize, id: usize },
    #[error("first cell must be the start cell")]
    MissingStart,
    #[error("last cell must be the end cell")]
    MissingEnd,
    #[error("cell {0} repeats a start or end marker")]
    MisplacedTerminal(usize),
}

/// Build the standard track: a serpentine walk over a 7x7 grid.
///
/// Even rows run left to right, odd rows right to left, so consecutive cells
/// are always grid neighbours. Cell typing is fixed; the same sequence is
/// returned on every call.
#[must_use]
pub fn create_board_path() -> Vec<PathCell> {
    let total = usize::try_from(BOARD_GRID_SIZE * BOARD_GRID_SIZE).unwrap_or_default();
    let mut cells = Vec::with_capacity(total);
    for y in 0..BOARD_GRID_SIZE {
        for step in 0..BOARD_GRID_SIZE {
            let x = if y % 2 == 0 {
                step
            } else {
                BOARD_GRID_SIZE - 1 - step
            };
            let id = cells.len();
            cells.push(PathCell {
                id,
                x,
                y,
                cell_type: classify(id, total),
            });
        }
    }
    cells
}

fn classify(id: usize, total: usize) -> CellType {
    if id == 0 {
        CellType::Start
    } else if id + 1 == total {
        CellType::End
    } else if STAR_CELLS.contains(&id) {
        CellType::Star
    } else if TRAP_CELLS.contains(&id) {
        CellType::Trap
    } else {
        CellType::Path
    }
}

/// Validated, immutable track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Board {
    cells: Vec<PathCell>,
}

impl Board {
    /// Wrap a cell sequence after checking the track invariants.
    ///
    /// # Errors
    ///
    /// Returns an error if the sequence is shorter than two cells, ids are not
    /// sequential, or start/end markers are missing or repeated.
    pub fn new(cells: Vec<PathCell>) -> Result<Self, BoardError> {
        if cells.len() < 2 {
            return Err(BoardError::TooShort(cells.len()));
        }
        let last = cells.len() - 1;
        for (index, cell) in cells.iter().enumerate() {
            if cell.id != index {
                return Err(BoardError::IdMismatch { index, id: cell.id });
            }
            let terminal = matches!(cell.cell_type, CellType::Start | CellType::End);
            if terminal && index != 0 && index != last {
                return Err(BoardError::MisplacedTerminal(index));
            }
        }
        if cells[0].cell_type != CellType::Start {
            return Err(BoardError::MissingStart);
        }
        if cells[last].cell_type != CellType::End {
            return Err(BoardError::MissingEnd);
        }
        Ok(Self { cells })
    }

    /// The standard serpentine board.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            cells: create_board_path(),
        }
    }

    /// A straight track of `len` cells with the given star and trap indices.
    /// Indices outside the interior are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if `len` is below two.
    pub fn linear(len: usize, stars: &[usize], traps: &[usize]) -> Result<Self, BoardError> {
        if len < 2 {
            return Err(BoardError::TooShort(len));
        }
        let cells = (0..len)
            .map(|id| {
                let cell_type = if id == 0 {
                    CellType::Start
                } else if id + 1 == len {
                    CellType::End
                } else if stars.contains(&id) {
                    CellType::Star
                } else if traps.contains(&id) {
                    CellType::Trap
                } else {
                    CellType::Path
                };
                PathCell {
                    id,
                    x: i32::try_from(id).unwrap_or(i32::MAX),
                    y: 0,
                    cell_type,
                }
            })
            .collect();
        Self::new(cells)
    }

    #[must_use]
    pub fn cells(&self) -> &[PathCell] {
        &self.cells
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Index of the end cell.
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }

    #[must_use]
    pub fn cell_type(&self, position: usize) -> Option<CellType> {
        self.cells.get(position).map(|cell| cell.cell_type)
    }

    /// True for cells strictly between start and end.
    #[must_use]
    pub fn is_interior(&self, position: usize) -> bool {
        position > 0 && position < self.last_index()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_path_has_single_start_and_end() {
        let path = create_board_path();
        assert_eq!(path.len(), 49);
        assert_eq!(path[0].cell_type, CellType::Start);
        assert_eq!(path[48].cell_type, CellType::End);
        let starts = path.iter().filter(|c| c.cell_type == CellType::Start).count();
        let ends = path.iter().filter(|c| c.cell_type == CellType::End).count();
        assert_eq!((starts, ends), (1, 1));
    }

    #[test]
    fn generation_is_deterministic() {
        assert_eq!(create_board_path(), create_board_path());
    }

    #[test]
    fn consecutive_cells_are_grid_neighbours() {
        let path = create_board_path();
        for pair in path.windows(2) {
            let dx = (pair[0].x - pair[1].x).abs();
            let dy = (pair[0].y - pair[1].y).abs();
            assert_eq!(dx + dy, 1, "cells {} and {} are not adjacent", pair[0].id, pair[1].id);
        }
    }

    #[test]
    fn fixed_star_and_trap_cells() {
        let board = Board::standard();
        for id in STAR_CELLS {
            assert_eq!(board.cell_type(id), Some(CellType::Star));
        }
        for id in TRAP_CELLS {
            assert_eq!(board.cell_type(id), Some(CellType::Trap));
        }
        assert_eq!(board.cell_type(1), Some(CellType::Path));
        assert_eq!(board.cell_type(99), None);
    }

    #[test]
    fn validation_rejects_broken_tracks() {
        assert_eq!(Board::linear(1, &[], &[]), Err(BoardError::TooShort(1)));

        let mut cells = create_board_path();
        cells[0].cell_type = CellType::Path;
        assert_eq!(Board::new(cells), Err(BoardError::MissingStart));

        let mut cells = create_board_path();
        cells[5].cell_type = CellType::End;
        assert_eq!(Board::new(cells), Err(BoardError::MisplacedTerminal(5)));

        let mut cells = create_board_path();
        cells[3].id = 9;
        assert_eq!(
            Board::new(cells),
            Err(BoardError::IdMismatch { index: 3, id: 9 })
        );
    }

    #[test]
    fn linear_board_ignores_terminal_indices_for_effects() {
        let board = Board::linear(10, &[0, 3], &[9, 5]).unwrap();
        assert_eq!(board.last_index(), 9);
        assert_eq!(board.cell_type(0), Some(CellType::Start));
        assert_eq!(board.cell_type(3), Some(CellType::Star));
        assert_eq!(board.cell_type(5), Some(CellType::Trap));
        assert_eq!(board.cell_type(9), Some(CellType::End));
        assert!(board.is_interior(4));
        assert!(!board.is_interior(9));
    }

    #[test]
    fn path_cell_serializes_type_field() {
        let json = serde_json::to_value(create_board_path()[0]).unwrap();
        assert_eq!(json["type"], "start");
    }
}
