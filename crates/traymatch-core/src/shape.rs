//! Container shapes, movement axes, and spawn directions.

use smallvec::SmallVec;

use crate::color::Color;
use crate::error::ShapeError;
use crate::id::Cell;

/// Item slots per footprint axis unit: each unit cell holds a
/// `SLOT_SCALE × SLOT_SCALE` block of item slots.
pub const SLOT_SCALE: u32 = 2;

/// Footprint offsets of a shape. Inline for footprints up to 8 cells.
pub type Footprint = SmallVec<[Cell; 8]>;

/// The static description of a container: footprint, holes, home color.
///
/// The footprint is a `width × depth` rectangle of unit cells anchored at
/// its lower-left cell. Excluded offsets are holes: the container does not
/// occupy those grid cells, and each hole closes the front row of its
/// `2 × 2` slot block, so
///
/// ```text
/// capacity = 4 · width · depth − 2 · |excluded|
/// ```
///
/// A `(2, 1)` shape with one hole therefore holds six items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerShape {
    width: u32,
    depth: u32,
    excluded: SmallVec<[Cell; 4]>,
    home: Color,
}

impl ContainerShape {
    /// Create a solid `width × depth` shape with the given home color.
    ///
    /// Returns `Err(ShapeError::EmptyFootprint)` if either dimension is 0.
    pub fn new(width: u32, depth: u32, home: Color) -> Result<Self, ShapeError> {
        if width == 0 || depth == 0 {
            return Err(ShapeError::EmptyFootprint { width, depth });
        }
        Ok(Self {
            width,
            depth,
            excluded: SmallVec::new(),
            home,
        })
    }

    /// Add holes to the footprint.
    ///
    /// Every offset must lie inside the footprint, duplicates are ignored,
    /// and at least one unit cell must remain.
    pub fn with_excluded(
        mut self,
        offsets: impl IntoIterator<Item = Cell>,
    ) -> Result<Self, ShapeError> {
        for offset in offsets {
            if offset.x < 0
                || offset.z < 0
                || offset.x as u32 >= self.width
                || offset.z as u32 >= self.depth
            {
                return Err(ShapeError::ExcludedOutsideFootprint {
                    offset,
                    width: self.width,
                    depth: self.depth,
                });
            }
            if !self.excluded.contains(&offset) {
                self.excluded.push(offset);
            }
        }
        if self.excluded.len() as u32 >= self.width * self.depth {
            return Err(ShapeError::FullyExcluded);
        }
        Ok(self)
    }

    /// Footprint width (x extent) in unit cells.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Footprint depth (z extent) in unit cells.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// The color this container wants to collect.
    pub fn home(&self) -> Color {
        self.home
    }

    /// Excluded footprint offsets.
    pub fn excluded(&self) -> &[Cell] {
        &self.excluded
    }

    /// Whether `offset` is a hole in the footprint.
    pub fn is_excluded(&self, offset: Cell) -> bool {
        self.excluded.contains(&offset)
    }

    /// Number of item slots.
    pub fn capacity(&self) -> usize {
        let slots_x = self.width * SLOT_SCALE;
        let slots_z = self.depth * SLOT_SCALE;
        let mut count = 0;
        for x in 0..slots_x {
            for z in 0..slots_z {
                let unit = Cell::new((x / SLOT_SCALE) as i32, (z / SLOT_SCALE) as i32);
                // A hole closes only the front row of its slot block.
                if self.is_excluded(unit) && z % SLOT_SCALE == 0 {
                    continue;
                }
                count += 1;
            }
        }
        count
    }

    /// Occupied offsets relative to the anchor, x-major then z.
    pub fn footprint_offsets(&self) -> Footprint {
        let mut out = Footprint::new();
        for x in 0..self.width as i32 {
            for z in 0..self.depth as i32 {
                let offset = Cell::new(x, z);
                if !self.is_excluded(offset) {
                    out.push(offset);
                }
            }
        }
        out
    }

    /// Grid cells occupied when anchored at `anchor`.
    pub fn footprint(&self, anchor: Cell) -> Footprint {
        self.footprint_offsets()
            .into_iter()
            .map(|o| anchor + o)
            .collect()
    }

    /// Every cell of the bounding rectangle at `anchor`, holes included.
    pub fn bounding_cells(&self, anchor: Cell) -> Footprint {
        let mut out = Footprint::new();
        for x in 0..self.width as i32 {
            for z in 0..self.depth as i32 {
                out.push(anchor.offset(x, z));
            }
        }
        out
    }
}

/// Movement constraint of a directional container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// May only slide along x (its row stays fixed).
    Horizontal,
    /// May only slide along z (its column stays fixed).
    Vertical,
}

impl Axis {
    /// Whether a move from `from` to `to` keeps to this axis.
    pub fn permits(self, from: Cell, to: Cell) -> bool {
        match self {
            Self::Horizontal => from.z == to.z,
            Self::Vertical => from.x == to.x,
        }
    }
}

/// Emission direction of a spawner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Toward +z.
    Up,
    /// Toward −z.
    Down,
    /// Toward −x.
    Left,
    /// Toward +x.
    Right,
}

impl Direction {
    /// Anchor of a `width × depth` container emitted from a spawner at `origin`.
    ///
    /// The container lands flush against the spawner on the emission side.
    pub fn spawn_anchor(self, origin: Cell, width: u32, depth: u32) -> Cell {
        match self {
            Self::Up => origin.offset(0, 1),
            Self::Down => origin.offset(0, -(depth as i32)),
            Self::Left => origin.offset(-(width as i32), 0),
            Self::Right => origin.offset(1, 0),
        }
    }
}
