use glam::Vec2;

use crate::world::Grid;

/// Position, per-step velocity and a box, moved against the grid one axis
/// at a time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,  // displacement applied by one `move_step`
    pub size: Vec2, // full width/height, half of it on each side of `pos`
}

impl Body {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            size,
        }
    }

    /// Applies the velocity without looking at the grid.
    pub fn move_free(&mut self) {
        self.pos += self.vel;
    }

    /// Moves by `vel`, testing the x-only and y-only sub-moves separately.
    /// Returns true when at least one axis was blocked.
    pub fn move_step(&mut self, grid: &Grid) -> bool {
        let next = self.pos + self.vel;
        let (tile_x, tile_y) = grid.cell_of(self.pos);
        let (next_x, next_y) = grid.cell_of(next);

        let move_x = grid.tile_at(next_x, tile_y).is_none();
        let move_y = grid.tile_at(tile_x, next_y).is_none();

        match (move_x, move_y) {
            (true, true) => {
                if grid.tile_at(tile_x, tile_y).is_none() {
                    self.pos = next;
                } else if self.vel.x.abs() > self.vel.y.abs() {
                    // already inside a wall cell, slide along the dominant axis
                    self.pos.x = next.x;
                } else {
                    self.pos.y = next.y;
                }
            }
            (true, false) => self.pos.x = next.x,
            (false, true) => self.pos.y = next.y,
            (false, false) => {}
        }

        !(move_x && move_y)
    }

    pub fn half_extents(&self) -> Vec2 {
        self.size * 0.5
    }

    /// Axis-aligned box overlap. Touching edges do not count.
    pub fn collide(&self, other: &Body) -> bool {
        let reach = self.half_extents() + other.half_extents();
        let d = (self.pos - other.pos).abs();
        d.x < reach.x && d.y < reach.y
    }
}
