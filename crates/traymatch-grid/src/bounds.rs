//! The playable board rectangle.

use traymatch_core::Cell;

use crate::error::GridError;

/// A `width × depth` board centred on `origin`.
///
/// For an even width the extra column falls on the negative side:
/// a width-4 board at origin 0 spans x ∈ [−2, 1], a width-5 board spans
/// x ∈ [−2, 2]. Depth follows the same rule on z.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridBounds {
    width: u32,
    depth: u32,
    origin: Cell,
}

impl GridBounds {
    /// Maximum dimension: half of it must still fit an `i32` offset.
    pub const MAX_DIM: u32 = i32::MAX as u32;

    /// Create a board of `width × depth` cells centred on `origin`.
    pub fn new(width: u32, depth: u32, origin: Cell) -> Result<Self, GridError> {
        if width == 0 || depth == 0 {
            return Err(GridError::EmptyGrid { width, depth });
        }
        for (name, value) in [("width", width), ("depth", depth)] {
            if value > Self::MAX_DIM {
                return Err(GridError::DimensionTooLarge {
                    name,
                    value,
                    max: Self::MAX_DIM,
                });
            }
        }
        Ok(Self {
            width,
            depth,
            origin,
        })
    }

    /// Board width in cells.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Board depth in cells.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Centre cell.
    pub fn origin(&self) -> Cell {
        self.origin
    }

    /// Inclusive `(min, max)` corner cells.
    pub fn extent(&self) -> (Cell, Cell) {
        let (min_x, max_x) = axis_extent(self.origin.x, self.width);
        let (min_z, max_z) = axis_extent(self.origin.z, self.depth);
        (Cell::new(min_x, min_z), Cell::new(max_x, max_z))
    }

    /// Whether `cell` lies on the board.
    pub fn contains(&self, cell: Cell) -> bool {
        let (min, max) = self.extent();
        cell.x >= min.x && cell.x <= max.x && cell.z >= min.z && cell.z <= max.z
    }

    /// Number of cells on the board.
    pub fn cell_count(&self) -> usize {
        (self.width as usize) * (self.depth as usize)
    }
}

fn axis_extent(center: i32, len: u32) -> (i32, i32) {
    let half = (len / 2) as i32;
    let min = center - half;
    let max = center + half - 1 + (len % 2) as i32;
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn odd_board_is_symmetric() {
        let b = GridBounds::new(5, 3, Cell::ZERO).unwrap();
        assert_eq!(b.extent(), (Cell::new(-2, -1), Cell::new(2, 1)));
    }

    #[test]
    fn even_board_extends_negative() {
        let b = GridBounds::new(4, 4, Cell::new(10, 0)).unwrap();
        assert_eq!(b.extent(), (Cell::new(8, -2), Cell::new(11, 1)));
        assert!(b.contains(Cell::new(8, -2)));
        assert!(!b.contains(Cell::new(12, 0)));
    }

    #[test]
    fn empty_board_rejected() {
        assert_eq!(
            GridBounds::new(0, 3, Cell::ZERO),
            Err(GridError::EmptyGrid { width: 0, depth: 3 })
        );
    }

    proptest! {
        #[test]
        fn contained_cells_match_cell_count(
            w in 1u32..9,
            d in 1u32..9,
            ox in -5i32..5,
            oz in -5i32..5,
        ) {
            let b = GridBounds::new(w, d, Cell::new(ox, oz)).unwrap();
            let mut count = 0usize;
            for x in (ox - 10)..(ox + 10) {
                for z in (oz - 10)..(oz + 10) {
                    if b.contains(Cell::new(x, z)) {
                        count += 1;
                    }
                }
            }
            prop_assert_eq!(count, b.cell_count());
        }
    }
}
