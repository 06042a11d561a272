use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use glam::Vec2;

use crate::body::Body;
use crate::projection::{DepthScale, Projection};
use crate::ray::{Ray, wrap_angle};
use crate::world::Grid;

/// Field of view and ray fan shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lens {
    pub fov: f32,         // radians
    pub ray_count: usize, // one ray per screen column strip
    pub max_depth: u32,   // render distance in cells
}

impl Default for Lens {
    fn default() -> Self {
        Self {
            fov: FRAC_PI_2,
            ray_count: 128,
            max_depth: 8,
        }
    }
}

/// Points where the line through a query point, perpendicular to the
/// heading, crosses the two frustum boundary rays. Camera-relative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraEdges {
    pub left: Vec2,
    pub right: Vec2,
}

/// First-person viewpoint: a body that moves through the grid plus a
/// left-to-right fan of rays spanning the field of view.
#[derive(Debug, Clone)]
pub struct Viewpoint {
    pub body: Body,
    heading: f32, // radians, [0, TAU)
    lens: Lens,
    rays: Vec<Ray>,
}

impl Viewpoint {
    pub fn new(pos: Vec2, heading: f32, lens: Lens) -> Self {
        assert!(lens.ray_count >= 2, "a ray fan needs at least two rays");
        assert!(lens.fov > 0.0 && lens.fov < PI, "field of view must be in (0, 180) degrees");

        let heading = wrap_angle(heading);
        let rays = (0..lens.ray_count)
            .map(|i| Ray::new(pos, fan_angle(heading, lens, i), lens.max_depth))
            .collect();

        Self {
            body: Body::new(pos, Vec2::splat(8.0)),
            heading,
            lens,
            rays,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.body.pos
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }

    pub fn lens(&self) -> &Lens {
        &self.lens
    }

    /// Unit vector along the heading.
    pub fn forward(&self) -> Vec2 {
        Vec2::from_angle(self.heading)
    }

    /// Unit vector pointing to the right-hand side of the screen.
    pub fn right(&self) -> Vec2 {
        Vec2::from_angle(self.heading + FRAC_PI_2)
    }

    /// Rays ordered left to right, matching screen columns.
    pub fn rays(&self) -> &[Ray] {
        &self.rays
    }

    pub fn set_heading(&mut self, heading: f32) {
        self.heading = wrap_angle(heading);
        self.aim_rays();
    }

    pub fn turn(&mut self, delta: f32) {
        self.set_heading(self.heading + delta);
    }

    /// Sets the per-step velocity from forward/strafe input in `[-1, 1]`.
    pub fn set_velocity(&mut self, forward: f32, strafe: f32, speed: f32) {
        self.body.vel = (self.forward() * forward + self.right() * strafe) * speed;
    }

    /// Moves with collision. Returns true if a wall blocked an axis.
    pub fn step(&mut self, grid: &Grid) -> bool {
        self.body.move_step(grid)
    }

    /// Re-aims every ray from the current position and heading and
    /// recomputes hits and plane distances.
    pub fn update_rays(&mut self, grid: &Grid) {
        let (pos, heading) = (self.body.pos, self.heading);
        for (i, ray) in self.rays.iter_mut().enumerate() {
            ray.set_angle(fan_angle(heading, self.lens, i));
            ray.set_origin(pos);
            ray.update(grid);
            ray.update_plane_dist(heading);
        }
    }

    fn aim_rays(&mut self) {
        let heading = self.heading;
        for (i, ray) in self.rays.iter_mut().enumerate() {
            ray.set_angle(fan_angle(heading, self.lens, i));
        }
    }

    fn boundary(&self) -> (Vec2, Vec2) {
        let left = self.rays[0].direction();
        let right = self.rays[self.rays.len() - 1].direction();
        (left, right)
    }

    /// Strictly inside the wedge between the leftmost and rightmost rays.
    ///
    /// Side tests use the perp-dot product with each boundary direction,
    /// which is the slope comparison multiplied through by the direction's
    /// x component, so it keeps its sign in every quadrant.
    pub fn point_in_view(&self, p: Vec2) -> bool {
        let rel = p - self.body.pos;
        let (left, right) = self.boundary();
        left.perp_dot(rel) > 0.0 && rel.perp_dot(right) > 0.0
    }

    pub fn camera_edges(&self, p: Vec2) -> CameraEdges {
        let rel = p - self.body.pos;
        let forward = self.forward();
        let depth = rel.dot(forward);
        let (left, right) = self.boundary();
        CameraEdges {
            left: left * (depth / left.dot(forward)),
            right: right * (depth / right.dot(forward)),
        }
    }

    /// Horizontal screen position of a world point, 0 at the left edge.
    pub fn screen_fraction(&self, p: Vec2, edges: &CameraEdges) -> Option<f32> {
        if !self.point_in_view(p) {
            return None;
        }
        let rel = p - self.body.pos;
        let (n, m) = (edges.left, edges.right);

        // the edge segment is nearly vertical when facing along x and
        // nearly horizontal when facing along y
        let t = if in_diagonal_band(self.heading) {
            (rel.x - m.x) / (n.x - m.x)
        } else {
            (rel.y - m.y) / (n.y - m.y)
        };
        Some(1.0 - t)
    }

    /// Perpendicular distance to a world point, consistent with the
    /// plane distance of the rays.
    pub fn plane_distance(&self, p: Vec2, edges: &CameraEdges) -> Option<f32> {
        if !self.point_in_view(p) {
            return None;
        }
        let half = (edges.right - edges.left) * 0.5;
        Some((edges.left.length_squared() - half.length_squared()).max(0.0).sqrt())
    }

    /// Screen column and depth of an off-grid point, or None outside the frustum.
    pub fn project(&self, p: Vec2, depth: &DepthScale) -> Option<Projection> {
        let edges = self.camera_edges(p);
        let plane_dist = self.plane_distance(p, &edges)?;
        let fraction = self.screen_fraction(p, &edges)?;
        Some(Projection::new(plane_dist, fraction, depth))
    }
}

/// Angle of ray `i` in the fan.
#[inline]
fn fan_angle(heading: f32, lens: Lens, i: usize) -> f32 {
    let t = i as f32 / (lens.ray_count - 1) as f32;
    wrap_angle(heading + t * lens.fov - lens.fov / 2.0)
}

#[inline]
fn in_diagonal_band(heading: f32) -> bool {
    (FRAC_PI_4..3.0 * FRAC_PI_4).contains(&heading)
        || (5.0 * FRAC_PI_4..7.0 * FRAC_PI_4).contains(&heading)
}

#[cfg(test)]
mod tests {
    use std::f32::consts::TAU;

    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use super::*;

    fn view(heading: f32) -> Viewpoint {
        Viewpoint::new(Vec2::new(150.0, 150.0), heading, Lens::default())
    }

    fn headings() -> impl Iterator<Item = f32> {
        (0..72).map(|i| i as f32 * TAU / 72.0 + 0.013)
    }

    #[test]
    fn fan_spans_fov_left_to_right() {
        let v = view(0.0);
        assert_eq!(v.rays().len(), 128);
        assert_relative_eq!(v.rays()[0].angle(), wrap_angle(-FRAC_PI_4));
        assert_relative_eq!(v.rays()[127].angle(), FRAC_PI_4);
        // strictly increasing offset from the heading
        let offsets: Vec<f32> = v
            .rays()
            .iter()
            .map(|r| (r.angle() - v.heading() + PI).rem_euclid(TAU) - PI)
            .collect();
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn heading_point_is_in_view() {
        for h in headings().chain([0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2]) {
            let v = view(h);
            let ahead = v.position() + v.forward() * 40.0;
            let behind = v.position() - v.forward() * 40.0;
            assert!(v.point_in_view(ahead), "heading {h}");
            assert!(!v.point_in_view(behind), "heading {h}");
        }
    }

    #[test]
    fn points_outside_wedge() {
        let v = view(0.0);
        assert!(!v.point_in_view(Vec2::new(150.0, 250.0))); // 90 degrees right
        assert!(!v.point_in_view(Vec2::new(150.0, 50.0))); // 90 degrees left
        assert!(v.point_in_view(Vec2::new(200.0, 190.0)));
        assert!(!v.point_in_view(v.position()));
    }

    #[test]
    fn centre_maps_to_half() {
        for h in headings().chain([FRAC_PI_4, 3.0 * FRAC_PI_4, 5.0 * FRAC_PI_4]) {
            let v = view(h);
            let p = v.position() + v.forward() * 100.0;
            let edges = v.camera_edges(p);
            let frac = v.screen_fraction(p, &edges).expect("in view");
            assert_abs_diff_eq!(frac, 0.5, epsilon = 1e-3);
            let plane = v.plane_distance(p, &edges).expect("in view");
            assert_relative_eq!(plane, 100.0, epsilon = 1e-2);
        }
    }

    #[test]
    fn fraction_follows_perspective() {
        for h in headings() {
            let v = view(h);
            for i in [1usize, 20, 64, 100, 126] {
                let angle = v.rays()[i].angle();
                let offset = angle - v.heading();
                let p = v.position() + Vec2::from_angle(angle) * 80.0;
                let edges = v.camera_edges(p);
                let frac = v.screen_fraction(p, &edges).expect("in view");
                // fov 90: lateral position tan(offset) in [-1, 1]
                let expected = (offset.tan() + 1.0) / 2.0;
                assert_abs_diff_eq!(frac, expected, epsilon = 2e-3);
            }
        }
    }

    #[test]
    fn left_side_is_small_fraction() {
        let v = view(0.0);
        // heading 0 with y down: the left edge points towards -y
        let p = Vec2::new(250.0, 60.0);
        let edges = v.camera_edges(p);
        let frac = v.screen_fraction(p, &edges).expect("in view");
        assert!(frac < 0.1);
    }

    #[test]
    fn out_of_view_projects_to_none() {
        let v = view(1.0);
        let p = v.position() - v.forward() * 30.0;
        let edges = v.camera_edges(p);
        assert!(v.screen_fraction(p, &edges).is_none());
        assert!(v.plane_distance(p, &edges).is_none());
        let depth = DepthScale::new(32.0, 8, 0.2, 0.8);
        assert!(v.project(p, &depth).is_none());
    }

    #[test]
    fn ray_hits_round_trip() {
        let grid = Grid::demo(32.0);
        for h in headings() {
            let mut v = view(h);
            v.update_rays(&grid);
            for ray in &v.rays()[1..127] {
                let (Some(hit), Some(plane)) = (ray.hit(), ray.plane_dist()) else {
                    continue;
                };
                if hit.distance < 1.0 {
                    continue;
                }
                let edges = v.camera_edges(hit.point);
                let projected = v.plane_distance(hit.point, &edges).expect("hit is in view");
                assert_relative_eq!(projected, plane, max_relative = 1e-3, epsilon = 1e-2);
                assert!(plane <= hit.distance + 1e-3);
            }
        }
    }

    #[test]
    fn middle_ray_plane_equals_distance() {
        let grid = Grid::demo(32.0);
        let lens = Lens {
            ray_count: 129,
            ..Lens::default()
        };
        let mut v = Viewpoint::new(Vec2::new(150.0, 150.0), 0.4, lens);
        v.update_rays(&grid);
        let middle = &v.rays()[64];
        assert_relative_eq!(middle.angle(), v.heading());
        let hit = middle.hit().expect("demo map is closed");
        assert_relative_eq!(middle.plane_dist().unwrap(), hit.distance);
    }

    #[test]
    fn project_matches_parts() {
        let v = view(2.0);
        let depth = DepthScale::new(32.0, 8, 0.2, 0.8);
        let p = v.position() + Vec2::from_angle(2.1) * 64.0;
        let projection = v.project(p, &depth).expect("in view");
        let edges = v.camera_edges(p);
        assert_eq!(Some(projection.plane_dist), v.plane_distance(p, &edges));
        assert_eq!(Some(projection.screen_fraction), v.screen_fraction(p, &edges));
        assert_relative_eq!(projection.plane_dist, 64.0 * 0.1f32.cos(), epsilon = 1e-2);
        assert!(projection.screen_fraction > 0.5);
    }

    #[test]
    fn forward_motion_stops_at_wall() {
        let mut grid = Grid::new(16, 16, 32.0);
        grid.set(5, 4, Some(1)).unwrap();
        let mut v = view(0.0);
        v.set_velocity(1.0, 0.0, 0.75);
        for _ in 0..40 {
            v.step(&grid);
            v.update_rays(&grid);
        }
        assert!(v.position().x < 160.0);
        assert_relative_eq!(v.position().y, 150.0, epsilon = 1e-4);

        // heading diagonally into the wall slides along y
        v.set_heading(FRAC_PI_4);
        v.set_velocity(1.0, 0.0, 0.75);
        let before = v.position();
        assert!(v.step(&grid));
        assert_eq!(v.position().x, before.x);
        assert!(v.position().y > before.y);
    }

    #[test]
    fn turning_re_aims_the_fan() {
        let mut v = view(0.0);
        v.turn(-FRAC_PI_2);
        assert_relative_eq!(v.heading(), 3.0 * FRAC_PI_2, epsilon = 1e-5);
        assert_relative_eq!(v.rays()[127].angle(), 7.0 * FRAC_PI_4, epsilon = 1e-5);
        assert!(v.point_in_view(v.position() + Vec2::new(0.0, -50.0)));
    }
}
