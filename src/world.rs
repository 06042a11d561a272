use glam::Vec2;
use thiserror::Error;

/// Opaque wall identifier. Resolved to a texture by the asset registry.
pub type WallId = u16;

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("cell data length {got} does not match grid size {cols}x{rows}")]
    DimensionMismatch { cols: usize, rows: usize, got: usize },
    #[error("cell ({x}, {y}) out of bounds for grid {cols}x{rows}")]
    OutOfBounds { x: usize, y: usize, cols: usize, rows: usize },
    #[error("map row {row} has {got} columns, expected {expected}")]
    RaggedRow { row: usize, got: usize, expected: usize },
    #[error("unknown map glyph {glyph:?} at row {row}, column {col}")]
    UnknownGlyph { glyph: char, row: usize, col: usize },
    #[error("map is empty")]
    Empty,
}

/// Uniform axis-aligned grid of square cells, row-major.
#[derive(Debug, Clone)]
pub struct Grid {
    cell_size: f32,
    cols: usize,
    rows: usize,
    cells: Vec<Option<WallId>>, // index = y * cols + x
}

impl Grid {
    /// Empty grid. Panics on zero dimensions or a non-positive cell size.
    pub fn new(cols: usize, rows: usize, cell_size: f32) -> Self {
        assert!(cols > 0 && rows > 0, "grid needs at least one cell");
        assert!(cell_size > 0.0, "cell size must be positive");
        Self {
            cell_size,
            cols,
            rows,
            cells: vec![None; cols * rows],
        }
    }

    pub fn from_cells(
        cols: usize,
        rows: usize,
        cell_size: f32,
        cells: Vec<Option<WallId>>,
    ) -> Result<Self, GridError> {
        if cols == 0 || rows == 0 {
            return Err(GridError::Empty);
        }
        if cells.len() != cols * rows {
            return Err(GridError::DimensionMismatch {
                cols,
                rows,
                got: cells.len(),
            });
        }
        let mut grid = Self::new(cols, rows, cell_size);
        grid.cells = cells;
        Ok(grid)
    }

    /// Parses an ASCII map. `.` and space are empty, `#` is wall 1 and
    /// the digits `1`..=`9` are the matching wall ids.
    pub fn parse(text: &str, cell_size: f32) -> Result<Self, GridError> {
        let lines: Vec<&str> = text
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| !l.trim().is_empty())
            .collect();
        let Some(first) = lines.first() else {
            return Err(GridError::Empty);
        };

        let cols = first.chars().count();
        let rows = lines.len();
        let mut cells = Vec::with_capacity(cols * rows);

        for (row, line) in lines.iter().enumerate() {
            let got = line.chars().count();
            if got != cols {
                return Err(GridError::RaggedRow {
                    row,
                    got,
                    expected: cols,
                });
            }
            for (col, glyph) in line.chars().enumerate() {
                let cell = match glyph {
                    '.' | ' ' => None,
                    '#' => Some(1),
                    '1'..='9' => Some(glyph as WallId - '0' as WallId),
                    _ => return Err(GridError::UnknownGlyph { glyph, row, col }),
                };
                cells.push(cell);
            }
        }

        Self::from_cells(cols, rows, cell_size, cells)
    }

    /// The built-in 16x16 level: blocks (2) on every 14th cell, bricks (1)
    /// on every 7th cell and around the border.
    pub fn demo(cell_size: f32) -> Self {
        const SIDE: usize = 16;
        let mut grid = Self::new(SIDE, SIDE, cell_size);
        for (i, cell) in grid.cells.iter_mut().enumerate() {
            let (x, y) = (i % SIDE, i / SIDE);
            let border = x == 0 || y == 0 || x == SIDE - 1 || y == SIDE - 1;
            if i % 14 == 0 {
                *cell = Some(2);
            } else if i % 7 == 0 || border {
                *cell = Some(1);
            }
        }
        grid
    }

    /// Construction-time assignment. The renderer never calls this.
    pub fn set(&mut self, x: usize, y: usize, wall: Option<WallId>) -> Result<(), GridError> {
        if x >= self.cols || y >= self.rows {
            return Err(GridError::OutOfBounds {
                x,
                y,
                cols: self.cols,
                rows: self.rows,
            });
        }
        let idx = y * self.cols + x;
        self.cells[idx] = wall;
        Ok(())
    }

    /// Wall at a cell coordinate. Out-of-range cells read as empty.
    #[inline]
    pub fn tile_at(&self, x: i32, y: i32) -> Option<WallId> {
        if x < 0 || y < 0 || x as usize >= self.cols || y as usize >= self.rows {
            return None;
        }
        self.cells[y as usize * self.cols + x as usize]
    }

    /// Whether a world-space point lies inside the grid.
    #[inline]
    pub fn in_bounds(&self, x: f32, y: f32) -> bool {
        let cx = x / self.cell_size;
        let cy = y / self.cell_size;
        cx >= 0.0 && cx < self.cols as f32 && cy >= 0.0 && cy < self.rows as f32
    }

    /// Cell containing a world-space point (floored, may be out of range).
    #[inline]
    pub fn cell_of(&self, p: Vec2) -> (i32, i32) {
        (
            (p.x / self.cell_size).floor() as i32,
            (p.y / self.cell_size).floor() as i32,
        )
    }

    #[inline]
    pub fn wall_at_point(&self, p: Vec2) -> Option<WallId> {
        let (x, y) = self.cell_of(p);
        self.tile_at(x, y)
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// World-space extent of the grid.
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(
            self.cols as f32 * self.cell_size,
            self.rows as f32 * self.cell_size,
        )
    }
}
