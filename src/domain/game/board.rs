use super::errors::BoardError;
use super::value_objects::Mark;

// ============================================================================
// Board - N×N grid of marks
// ============================================================================
//
// Cells go from Empty to X/O exactly once. Nothing outside the aggregate can
// reach a &mut Board; readers get an owned snapshot.
//
// ============================================================================

pub const MIN_BOARD_SIZE: usize = 3;
pub const MAX_BOARD_SIZE: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Mark>,
    empty_cells: usize,
}

impl Board {
    pub fn new(size: usize) -> Result<Self, BoardError> {
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&size) {
            return Err(BoardError::InvalidDimension(size));
        }

        Ok(Self {
            size,
            cells: vec![Mark::Empty; size * size],
            empty_cells: size * size,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn empty_cells(&self) -> usize {
        self.empty_cells
    }

    pub fn is_full(&self) -> bool {
        self.empty_cells == 0
    }

    pub fn get_cell(&self, row: usize, column: usize) -> Result<Mark, BoardError> {
        self.index(row, column).map(|index| self.cells[index])
    }

    /// Check that a mark could be placed at (row, column) without placing it
    pub fn check_placement(&self, row: usize, column: usize) -> Result<(), BoardError> {
        let index = self.index(row, column)?;
        if self.cells[index] != Mark::Empty {
            return Err(BoardError::CellOccupied { row, column });
        }
        Ok(())
    }

    pub fn place_mark(&mut self, row: usize, column: usize, mark: Mark) -> Result<(), BoardError> {
        if mark == Mark::Empty {
            return Err(BoardError::EmptyMark { row, column });
        }
        self.check_placement(row, column)?;

        let index = row * self.size + column;
        self.cells[index] = mark;
        self.empty_cells -= 1;
        Ok(())
    }

    /// Row-major copy of every cell
    pub fn cells(&self) -> Vec<Vec<Mark>> {
        self.cells.chunks(self.size).map(<[Mark]>::to_vec).collect()
    }

    /// Count contiguous `mark` cells starting one step away from
    /// (row, column) in direction (delta_row, delta_column), stopping at
    /// `limit`, the board edge, or the first different cell.
    pub fn count_run(
        &self,
        row: usize,
        column: usize,
        (delta_row, delta_column): (isize, isize),
        mark: Mark,
        limit: usize,
    ) -> usize {
        let mut count = 0;
        let mut row = row as isize;
        let mut column = column as isize;

        while count < limit {
            row += delta_row;
            column += delta_column;

            let in_bounds = (0..self.size as isize).contains(&row)
                && (0..self.size as isize).contains(&column);
            if !in_bounds || self.cells[row as usize * self.size + column as usize] != mark {
                break;
            }
            count += 1;
        }

        count
    }

    fn index(&self, row: usize, column: usize) -> Result<usize, BoardError> {
        if row >= self.size || column >= self.size {
            return Err(BoardError::OutOfBounds {
                row,
                column,
                size: self.size,
            });
        }
        Ok(row * self.size + column)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
