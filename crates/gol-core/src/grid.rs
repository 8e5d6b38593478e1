//! Fixed-size toroidal boolean grid.
//!
//! A [`Grid`] is allocated once per run and never resized. Reads through
//! [`Grid::alive`] wrap both coordinates, so the left neighbour of column 0
//! is the last column and the neighbour above row 0 is the last row. Writes
//! through [`Grid::set`] do not wrap.
//!
//! Cells are stored column-major: every column is one contiguous run of
//! `height` cells. This lets the step engine hand each worker a disjoint
//! mutable slice covering exactly its column range.

use gol_types::Cell;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a grid.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// Width or height is zero.
    #[error("grid dimensions must be non-zero (got {width}x{height})")]
    ZeroDimension {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },

    /// `width * height` does not fit in `usize`.
    #[error("grid dimensions {width}x{height} overflow")]
    TooLarge {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },

    /// The supplied cell buffer has the wrong length.
    #[error("expected {expected} cells, got {actual}")]
    CellCount {
        /// `width * height`.
        expected: usize,
        /// Length of the supplied buffer.
        actual: usize,
    },

    /// A seeded cell lies outside the grid.
    #[error("cell ({}, {}) is outside a {width}x{height} grid", .cell.row, .cell.col)]
    OutOfBounds {
        /// The offending cell.
        cell: Cell,
        /// Grid width.
        width: usize,
        /// Grid height.
        height: usize,
    },
}

/// Apply the Game of Life rule to one cell.
///
/// Exactly three live neighbours gives a live cell; exactly two keeps the
/// current state; anything else is dead.
pub const fn rule(alive: bool, neighbors: u8) -> bool {
    match neighbors {
        3 => true,
        2 => alive,
        _ => false,
    }
}

/// A `width` x `height` toroidal grid of live/dead cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridRepr", into = "GridRepr")]
pub struct Grid {
    width: usize,
    height: usize,
    /// Column-major cell storage, `width * height` long.
    cells: Vec<bool>,
}

impl Grid {
    /// Create an all-dead grid.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::ZeroDimension`] or [`GridError::TooLarge`].
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        let len = cell_count(width, height)?;
        Ok(Self {
            width,
            height,
            cells: vec![false; len],
        })
    }

    /// Create a grid from row-major cell states (the order images are
    /// streamed in).
    ///
    /// # Errors
    ///
    /// Returns [`GridError::CellCount`] if `rows.len() != width * height`.
    pub fn from_row_major(width: usize, height: usize, rows: &[bool]) -> Result<Self, GridError> {
        let mut grid = Self::new(width, height)?;
        if rows.len() != grid.cells.len() {
            return Err(GridError::CellCount {
                expected: grid.cells.len(),
                actual: rows.len(),
            });
        }
        for (row, line) in rows.chunks_exact(width).enumerate() {
            for (col, &alive) in line.iter().enumerate() {
                grid.set(row, col, alive);
            }
        }
        Ok(grid)
    }

    /// Create a grid with exactly the given cells alive.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfBounds`] if any cell lies outside the grid.
    pub fn with_alive<I>(width: usize, height: usize, alive: I) -> Result<Self, GridError>
    where
        I: IntoIterator<Item = Cell>,
    {
        let mut grid = Self::new(width, height)?;
        for cell in alive {
            if grid.index(cell.row, cell.col).is_none() {
                return Err(GridError::OutOfBounds {
                    cell,
                    width,
                    height,
                });
            }
            grid.set(cell.row, cell.col, true);
        }
        Ok(grid)
    }

    /// An all-dead grid with the same dimensions.
    pub fn cleared(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            cells: vec![false; self.cells.len()],
        }
    }

    /// Number of columns.
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Whether the cell at (`row`, `col`) is alive.
    ///
    /// Both coordinates wrap modulo the grid dimensions, including negative
    /// values, so this never fails.
    pub fn alive(&self, row: i64, col: i64) -> bool {
        match (wrap_signed(row, self.height), wrap_signed(col, self.width)) {
            (Some(row), Some(col)) => self.get(row, col),
            _ => false,
        }
    }

    /// Set the cell at (`row`, `col`). Coordinates are not wrapped; writes
    /// outside the grid are dropped.
    pub fn set(&mut self, row: usize, col: usize, alive: bool) {
        if let Some(cell) = self.index(row, col).and_then(|i| self.cells.get_mut(i)) {
            *cell = alive;
        }
    }

    /// Count live cells among the 8 surrounding positions, wrapping at the
    /// edges. The cell itself is not counted.
    pub fn neighbor_count(&self, row: usize, col: usize) -> u8 {
        let row = row.checked_rem(self.height).unwrap_or(0);
        let col = col.checked_rem(self.width).unwrap_or(0);
        let rows = [
            step_back(row, self.height),
            row,
            step_forward(row, self.height),
        ];
        let cols = [
            step_back(col, self.width),
            col,
            step_forward(col, self.width),
        ];

        let mut count: u8 = 0;
        for (i, &r) in rows.iter().enumerate() {
            for (j, &c) in cols.iter().enumerate() {
                if (i, j) != (1, 1) && self.get(r, c) {
                    count = count.saturating_add(1);
                }
            }
        }
        count
    }

    /// The state of (`row`, `col`) in the next turn.
    pub fn next_state(&self, row: usize, col: usize) -> bool {
        let neighbors = self.neighbor_count(row, col);
        // Most cells have no live neighbours at all.
        if neighbors == 0 {
            return false;
        }
        let row = row.checked_rem(self.height).unwrap_or(0);
        let col = col.checked_rem(self.width).unwrap_or(0);
        rule(self.get(row, col), neighbors)
    }

    /// Number of live cells.
    pub fn alive_count(&self) -> usize {
        self.cells.iter().filter(|&&alive| alive).count()
    }

    /// Live cells in row-major order.
    pub fn alive_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.row_major_cells()
            .filter(move |cell| self.get(cell.row, cell.col))
    }

    /// Cells whose state differs from `previous`, in row-major order.
    ///
    /// Both grids are expected to have the same dimensions.
    pub fn flips<'a>(&'a self, previous: &'a Self) -> impl Iterator<Item = Cell> + 'a {
        self.row_major_cells()
            .filter(move |cell| self.get(cell.row, cell.col) != previous.get(cell.row, cell.col))
    }

    /// Cell states in row-major order.
    pub fn to_row_major(&self) -> Vec<bool> {
        self.row_major_cells()
            .map(|cell| self.get(cell.row, cell.col))
            .collect()
    }

    /// Column-major storage for the step engine.
    pub(crate) fn columns_mut(&mut self) -> &mut [bool] {
        &mut self.cells
    }

    /// In-range lookup; out-of-range coordinates read as dead.
    fn get(&self, row: usize, col: usize) -> bool {
        self.index(row, col)
            .and_then(|i| self.cells.get(i))
            .copied()
            .unwrap_or(false)
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.height || col >= self.width {
            return None;
        }
        col.checked_mul(self.height)?.checked_add(row)
    }

    fn row_major_cells(&self) -> impl Iterator<Item = Cell> + use<> {
        let width = self.width;
        (0..self.height).flat_map(move |row| (0..width).map(move |col| Cell::new(row, col)))
    }
}

/// Serialized form: dimensions plus row-major cells.
#[derive(Serialize, Deserialize)]
struct GridRepr {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl TryFrom<GridRepr> for Grid {
    type Error = GridError;

    fn try_from(repr: GridRepr) -> Result<Self, Self::Error> {
        Self::from_row_major(repr.width, repr.height, &repr.cells)
    }
}

impl From<Grid> for GridRepr {
    fn from(grid: Grid) -> Self {
        Self {
            width: grid.width,
            height: grid.height,
            cells: grid.to_row_major(),
        }
    }
}

fn cell_count(width: usize, height: usize) -> Result<usize, GridError> {
    if width == 0 || height == 0 {
        return Err(GridError::ZeroDimension { width, height });
    }
    width
        .checked_mul(height)
        .ok_or(GridError::TooLarge { width, height })
}

fn wrap_signed(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    usize::try_from(index.checked_rem_euclid(len)?).ok()
}

fn step_back(index: usize, len: usize) -> usize {
    index
        .checked_sub(1)
        .unwrap_or_else(|| len.saturating_sub(1))
}

fn step_forward(index: usize, len: usize) -> usize {
    let next = index.saturating_add(1);
    if next >= len { 0 } else { next }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// The eight cells around (1, 1) on a 3x3 torus, each distinct.
    const RING: [(usize, usize); 8] = [
        (0, 0),
        (0, 1),
        (0, 2),
        (1, 0),
        (1, 2),
        (2, 0),
        (2, 1),
        (2, 2),
    ];

    fn glider(width: usize, height: usize) -> Grid {
        Grid::with_alive(
            width,
            height,
            [(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)]
                .into_iter()
                .map(|(r, c)| Cell::new(r, c)),
        )
        .unwrap()
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(matches!(
            Grid::new(0, 4),
            Err(GridError::ZeroDimension { width: 0, height: 4 })
        ));
        assert!(Grid::new(4, 0).is_err());
    }

    #[test]
    fn row_major_length_checked() {
        let err = Grid::from_row_major(4, 4, &[true; 15]).unwrap_err();
        assert!(matches!(
            err,
            GridError::CellCount {
                expected: 16,
                actual: 15
            }
        ));
    }

    #[test]
    fn row_major_layout_preserved() {
        // 3 wide, 2 tall: row 0 = [T, F, F], row 1 = [F, F, T]
        let rows = [true, false, false, false, false, true];
        let grid = Grid::from_row_major(3, 2, &rows).unwrap();
        assert!(grid.alive(0, 0));
        assert!(grid.alive(1, 2));
        assert!(!grid.alive(0, 2));
        assert_eq!(grid.to_row_major(), rows.to_vec());
    }

    #[test]
    fn seeding_outside_grid_fails() {
        let err = Grid::with_alive(4, 4, [Cell::new(4, 0)]).unwrap_err();
        assert!(matches!(err, GridError::OutOfBounds { .. }));
    }

    #[test]
    fn alive_wraps_toroidally() {
        let grid = glider(7, 5);
        let (w, h) = (7_i64, 5_i64);
        for row in 0..h {
            for col in 0..w {
                let base = grid.alive(row, col);
                for k in [-3_i64, -1, 1, 2, 10] {
                    assert_eq!(grid.alive(row + k * h, col), base, "({row},{col}) k={k}");
                    assert_eq!(grid.alive(row, col + k * w), base, "({row},{col}) k={k}");
                    assert_eq!(grid.alive(row + k * h, col + k * w), base);
                }
            }
        }
    }

    #[test]
    fn set_does_not_wrap() {
        let mut grid = Grid::new(3, 3).unwrap();
        grid.set(3, 0, true);
        grid.set(0, 3, true);
        assert_eq!(grid.alive_count(), 0);
    }

    #[test]
    fn neighbors_wrap_across_edges() {
        // Corners of a 4x4 torus are mutual neighbours.
        let grid = Grid::with_alive(
            4,
            4,
            [Cell::new(0, 3), Cell::new(3, 0), Cell::new(3, 3)],
        )
        .unwrap();
        assert_eq!(grid.neighbor_count(0, 0), 3);
        assert_eq!(grid.neighbor_count(3, 3), 2);
        assert_eq!(grid.neighbor_count(1, 1), 0);
    }

    #[test]
    fn neighbor_count_excludes_self() {
        let grid = Grid::with_alive(5, 5, [Cell::new(2, 2)]).unwrap();
        assert_eq!(grid.neighbor_count(2, 2), 0);
        assert_eq!(grid.neighbor_count(1, 1), 1);
    }

    #[test]
    fn rule_table_is_exhaustive() {
        for neighbors in 0..=8_u8 {
            for alive in [false, true] {
                let expected = neighbors == 3 || (neighbors == 2 && alive);
                assert_eq!(rule(alive, neighbors), expected, "n={neighbors} alive={alive}");

                // The same outcome through a real 3x3 torus neighbourhood.
                let mut grid = Grid::new(3, 3).unwrap();
                grid.set(1, 1, alive);
                for &(r, c) in RING.iter().take(usize::from(neighbors)) {
                    grid.set(r, c, true);
                }
                assert_eq!(grid.neighbor_count(1, 1), neighbors);
                assert_eq!(grid.next_state(1, 1), expected, "n={neighbors} alive={alive}");
            }
        }
    }

    #[test]
    fn rule_examples() {
        assert!(rule(false, 3));
        assert!(rule(true, 2));
        assert!(!rule(true, 4));
        assert!(!rule(false, 2));
        assert!(!rule(true, 1));
    }

    #[test]
    fn alive_cells_are_row_major() {
        let grid = glider(8, 8);
        let cells: Vec<Cell> = grid.alive_cells().collect();
        assert_eq!(
            cells,
            vec![
                Cell::new(0, 1),
                Cell::new(1, 2),
                Cell::new(2, 0),
                Cell::new(2, 1),
                Cell::new(2, 2),
            ]
        );
        assert_eq!(grid.alive_count(), 5);
    }

    #[test]
    fn flips_against_cleared_grid_are_alive_cells() {
        let grid = glider(8, 8);
        let blank = grid.cleared();
        let flips: Vec<Cell> = grid.flips(&blank).collect();
        let alive: Vec<Cell> = grid.alive_cells().collect();
        assert_eq!(flips, alive);
        assert_eq!(grid.flips(&grid).count(), 0);
    }

    #[test]
    fn serde_validates_dimensions() {
        let grid = glider(4, 4);
        let json = serde_json::to_string(&grid).unwrap();
        let back: Grid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grid);

        let bad = r#"{"width":2,"height":2,"cells":[true,false,true]}"#;
        assert!(serde_json::from_str::<Grid>(bad).is_err());
    }
}
