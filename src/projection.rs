//! Depth mapping shared by wall columns and free-floating objects.
//!
//! Walls and sprites both go through [`DepthScale`], so a sprite standing
//! next to a wall at the same plane distance is scaled exactly like the
//! wall slice behind it.

/// Maps plane distances to the `[min_height, max_height]` screen range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthScale {
    pub far_clip: f32,   // cell_size * max_depth
    pub min_height: f32, // slice height at the far clip, as a fraction of screen height
    pub max_height: f32, // slice height at the camera
}

impl DepthScale {
    pub fn new(cell_size: f32, max_depth: u32, min_height: f32, max_height: f32) -> Self {
        assert!(max_depth >= 1, "render depth must be at least one cell");
        assert!(min_height <= max_height, "inverted height range");
        Self {
            far_clip: cell_size * max_depth as f32,
            min_height,
            max_height,
        }
    }

    #[inline]
    pub fn height_diff(&self) -> f32 {
        self.max_height - self.min_height
    }

    /// `1 - plane_dist / far_clip`: 1 at the camera, <= 0 at or past the far clip.
    #[inline]
    pub fn inverse_depth(&self, plane_dist: f32) -> f32 {
        1.0 - plane_dist / self.far_clip
    }

    /// Slice height as a fraction of screen height. Quadratic falloff.
    #[inline]
    pub fn wall_scale(&self, inv_depth: f32) -> f32 {
        self.height_diff() * inv_depth * inv_depth + self.min_height
    }
}

/// Where an off-grid point lands on screen this frame.
///
/// Produced fresh every frame; an object outside the frustum simply has
/// no projection instead of keeping last frame's numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub plane_dist: f32,
    pub screen_fraction: f32, // 0 = left edge, 1 = right edge
    pub inv_depth: f32,
    pub scale: f32,
}

impl Projection {
    pub fn new(plane_dist: f32, screen_fraction: f32, depth: &DepthScale) -> Self {
        let inv_depth = depth.inverse_depth(plane_dist);
        Self {
            plane_dist,
            screen_fraction,
            inv_depth,
            scale: depth.wall_scale(inv_depth),
        }
    }

    /// On screen and nearer than the far clip.
    pub fn is_visible(&self) -> bool {
        (0.0..=1.0).contains(&self.screen_fraction) && self.inv_depth >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn inverse_depth_range() {
        let depth = DepthScale::new(32.0, 8, 0.2, 0.8);
        assert_relative_eq!(depth.far_clip, 256.0);
        assert_relative_eq!(depth.inverse_depth(0.0), 1.0);
        assert_relative_eq!(depth.inverse_depth(128.0), 0.5);
        assert_relative_eq!(depth.inverse_depth(256.0), 0.0);
        assert!(depth.inverse_depth(300.0) < 0.0);
    }

    #[test]
    fn wall_scale_is_quadratic() {
        let depth = DepthScale::new(32.0, 8, 0.2, 0.8);
        assert_relative_eq!(depth.wall_scale(1.0), 0.8);
        assert_relative_eq!(depth.wall_scale(0.0), 0.2);
        assert_relative_eq!(depth.wall_scale(0.5), 0.6 * 0.25 + 0.2);
    }

    #[test]
    fn wall_scale_monotonic() {
        let depth = DepthScale::new(32.0, 8, 0.2, 0.8);
        let mut last = f32::MIN;
        for d in (0..=256).rev() {
            let s = depth.wall_scale(depth.inverse_depth(d as f32));
            assert!(s >= last);
            last = s;
        }
    }

    #[test]
    fn projection_visibility() {
        let depth = DepthScale::new(32.0, 8, 0.2, 0.8);
        assert!(Projection::new(100.0, 0.5, &depth).is_visible());
        assert!(!Projection::new(100.0, 1.2, &depth).is_visible());
        assert!(!Projection::new(400.0, 0.5, &depth).is_visible());
    }
}
