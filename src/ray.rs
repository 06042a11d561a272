//! Single ray against the tile grid.
//!
//! Crossings with horizontal grid lines (constant y) and vertical grid
//! lines (constant x) are searched independently, each capped at
//! `max_depth` lines, and the nearer of the two candidates wins.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::Vec2;

use crate::world::{Grid, WallId};

// Below this |tan| the ray runs along x and never meets a horizontal line.
const MIN_SLOPE: f32 = 1e-4;
// Above this |tan| the ray runs along y and never meets a vertical line.
const MAX_SLOPE: f32 = 1e3;

/// Which family of grid lines the ray hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal, // constant-y line, a north/south face
    Vertical,   // constant-x line, an east/west face
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub axis: Axis,
    pub offset: Vec2, // hit point relative to the ray origin
    pub point: Vec2,  // absolute world point
    pub cell: (i32, i32),
    pub wall: WallId,
    pub cell_fraction: Vec2, // position inside the cell, both axes in [0, 1)
    pub distance: f32,       // euclidean
}

impl RayHit {
    /// Position along the struck face, used to pick a texture column.
    #[inline]
    pub fn face_offset(&self) -> f32 {
        match self.axis {
            Axis::Horizontal => self.cell_fraction.x,
            Axis::Vertical => self.cell_fraction.y,
        }
    }

    /// Texture column for a texture cut into `slice_count` slices.
    #[inline]
    pub fn slice_index(&self, slice_count: usize) -> usize {
        if slice_count == 0 {
            return 0;
        }
        ((self.face_offset() * slice_count as f32) as usize).min(slice_count - 1)
    }
}

struct Crossing {
    point: Vec2,
    cell: (i32, i32),
    wall: WallId,
}

#[derive(Debug, Clone)]
pub struct Ray {
    origin: Vec2,
    angle: f32, // radians, [0, TAU)
    max_depth: u32,

    // derived from the angle
    slope: f32,
    run_per_rise: Option<f32>, // dx per unit dy, None for horizontal rays
    rise_per_run: Option<f32>, // dy per unit dx, None for vertical rays
    sign_y: i32,               // +1 when heading towards +y
    sign_x: i32,               // +1 when heading towards +x

    hit: Option<RayHit>,
    plane_dist: Option<f32>,
}

impl Ray {
    pub fn new(origin: Vec2, angle: f32, max_depth: u32) -> Self {
        assert!(max_depth >= 1, "ray needs a search depth of at least one cell");
        let mut ray = Self {
            origin,
            angle: 0.0,
            max_depth,
            slope: 0.0,
            run_per_rise: None,
            rise_per_run: None,
            sign_y: 1,
            sign_x: 1,
            hit: None,
            plane_dist: None,
        };
        ray.set_angle(angle);
        ray
    }

    pub fn set_xy(&mut self, x: f32, y: f32) {
        self.origin = Vec2::new(x, y);
    }

    pub fn set_origin(&mut self, origin: Vec2) {
        self.origin = origin;
    }

    /// Sets the direction, wrapped into `[0, TAU)`, and re-derives slope
    /// and step signs.
    pub fn set_angle(&mut self, angle: f32) {
        let angle = wrap_angle(angle);
        self.angle = angle;
        self.slope = angle.tan();

        self.run_per_rise = (self.slope.abs() > MIN_SLOPE).then(|| 1.0 / self.slope);
        self.rise_per_run = (self.slope.abs() < MAX_SLOPE).then_some(self.slope);

        self.sign_y = if angle < PI { 1 } else { -1 };
        self.sign_x = if angle > FRAC_PI_2 && angle < 3.0 * FRAC_PI_2 {
            -1
        } else {
            1
        };
    }

    /// Recomputes the intersection. Clears the plane distance until
    /// [`Ray::update_plane_dist`] is called again.
    pub fn update(&mut self, grid: &Grid) {
        self.hit = self.intersect(grid);
        self.plane_dist = None;
    }

    /// Perpendicular distance to the hit relative to a viewing heading.
    pub fn update_plane_dist(&mut self, view_angle: f32) {
        self.plane_dist = self
            .hit
            .map(|hit| hit.distance * (self.angle - view_angle).cos());
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn slope(&self) -> f32 {
        self.slope
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Unit direction vector.
    pub fn direction(&self) -> Vec2 {
        Vec2::from_angle(self.angle)
    }

    pub fn hit(&self) -> Option<&RayHit> {
        self.hit.as_ref()
    }

    pub fn has_hit(&self) -> bool {
        self.hit.is_some()
    }

    pub fn plane_dist(&self) -> Option<f32> {
        self.plane_dist
    }

    fn intersect(&self, grid: &Grid) -> Option<RayHit> {
        let size = grid.cell_size();
        let horizontal = self.cross_horizontal(grid);
        let vertical = self.cross_vertical(grid);

        let (crossing, axis) = match (horizontal, vertical) {
            (None, None) => return None,
            (Some(h), None) => (h, Axis::Horizontal),
            (None, Some(v)) => (v, Axis::Vertical),
            (Some(h), Some(v)) => {
                let dh = (h.point.x - self.origin.x).abs();
                let dv = (v.point.x - self.origin.x).abs();
                if dh < dv {
                    (h, Axis::Horizontal)
                } else {
                    (v, Axis::Vertical)
                }
            }
        };

        let offset = crossing.point - self.origin;
        let limit = self.max_depth as f32 * size;
        if offset.max_element() > limit || offset.min_element() < -limit {
            return None;
        }
        let distance = offset.length();
        if distance > limit {
            return None;
        }

        let scaled = crossing.point / size;
        Some(RayHit {
            axis,
            offset,
            point: crossing.point,
            cell: crossing.cell,
            wall: crossing.wall,
            cell_fraction: scaled - scaled.floor(),
            distance,
        })
    }

    /// First occupied cell behind a constant-y grid line.
    fn cross_horizontal(&self, grid: &Grid) -> Option<Crossing> {
        let run_per_rise = self.run_per_rise?;
        let size = grid.cell_size();
        let sign = self.sign_y;

        let first_line = (if sign > 0 {
            (self.origin.y / size).ceil()
        } else {
            (self.origin.y / size).floor()
        }) as i32;
        let first_y = first_line as f32 * size;
        let first_x = self.origin.x + (first_y - self.origin.y) * run_per_rise;
        let step_x = size * run_per_rise * sign as f32;

        for t in 0..self.max_depth as i32 {
            let line = first_line + t * sign;
            let x = first_x + step_x * t as f32;
            let y = line as f32 * size;
            if !grid.in_bounds(x, y) {
                return None;
            }

            let cell = (
                (x / size).floor() as i32,
                if sign > 0 { line } else { line - 1 },
            );
            if let Some(wall) = grid.tile_at(cell.0, cell.1) {
                return Some(Crossing {
                    point: Vec2::new(x, y),
                    cell,
                    wall,
                });
            }
        }
        None
    }

    /// First occupied cell behind a constant-x grid line.
    fn cross_vertical(&self, grid: &Grid) -> Option<Crossing> {
        let rise_per_run = self.rise_per_run?;
        let size = grid.cell_size();
        let sign = self.sign_x;

        let first_line = (if sign > 0 {
            (self.origin.x / size).ceil()
        } else {
            (self.origin.x / size).floor()
        }) as i32;
        let first_x = first_line as f32 * size;
        let first_y = self.origin.y + (first_x - self.origin.x) * rise_per_run;
        let step_y = size * rise_per_run * sign as f32;

        for t in 0..self.max_depth as i32 {
            let line = first_line + t * sign;
            let x = line as f32 * size;
            let y = first_y + step_y * t as f32;
            if !grid.in_bounds(x, y) {
                return None;
            }

            let cell = (
                if sign > 0 { line } else { line - 1 },
                (y / size).floor() as i32,
            );
            if let Some(wall) = grid.tile_at(cell.0, cell.1) {
                return Some(Crossing {
                    point: Vec2::new(x, y),
                    cell,
                    wall,
                });
            }
        }
        None
    }
}

/// Wraps an angle into `[0, TAU)`.
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid rounds tiny negative inputs up to TAU itself
    if wrapped >= TAU { 0.0 } else { wrapped }
}
