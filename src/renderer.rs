use glam::Vec2;

use crate::assets::SliceProvider;
use crate::camera::Viewpoint;
use crate::compositor::{DrawItem, draw_order};
use crate::entity::Entity;
use crate::projection::DepthScale;
use crate::ray::{Axis, Ray};
use crate::scaler::{COLOR_KEY, fill_mirrored_gradient, modulate, pack_rgb};
use crate::world::Grid;

pub const MINIMAP_SIZE: usize = 128;

const HORIZON: u32 = 0x000A_0A18;
const EDGE: u32 = 0x005A_5A78;

/// Everything one frame needs, borrowed from the game state.
pub struct Scene<'a> {
    pub grid: &'a Grid,
    pub view: &'a Viewpoint,
    pub entities: Vec<&'a Entity>,
    pub depth: &'a DepthScale,
    pub minimap: bool,
}

/// Flat colour for a wall with no texture: red for faces on constant-y
/// lines, orange for constant-x lines, darker with distance.
pub fn fallback_color(axis: Axis, inv_depth: f32) -> u32 {
    let inv = inv_depth.clamp(0.0, 1.0);
    let red = (inv * 255.0) as u8;
    match axis {
        Axis::Horizontal => pack_rgb(red, 0, 0),
        Axis::Vertical => pack_rgb(red, (inv * 128.0) as u8, 0),
    }
}

pub fn render_frame(
    buf: &mut [u32],
    width: usize,
    height: usize,
    scene: &Scene,
    assets: &impl SliceProvider,
) {
    if width == 0 || height == 0 {
        return;
    }
    fill_mirrored_gradient(buf, width, height, HORIZON, EDGE);

    let rays = scene.view.rays();
    let column_w = width as f32 / rays.len() as f32;
    let mut target = Target { buf, width, height };

    for item in draw_order(rays, scene.entities.as_slice()) {
        match item {
            DrawItem::Column(i) => {
                let x0 = (i as f32 * column_w).round() as usize;
                let x1 = (((i + 1) as f32 * column_w).round() as usize).min(width);
                draw_column(&mut target, x0..x1, &rays[i], scene.depth, assets);
            }
            DrawItem::Object(i) => draw_sprite(&mut target, scene.entities[i], assets),
        }
    }

    if scene.minimap {
        draw_minimap(&mut target, scene);
    }
}

struct Target<'b> {
    buf: &'b mut [u32],
    width: usize,
    height: usize,
}

impl Target<'_> {
    #[inline]
    fn put(&mut self, x: i32, y: i32, c: u32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.buf[y as usize * self.width + x as usize] = c;
        }
    }

    fn fill_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, c: u32) {
        let x0 = x0.clamp(0, self.width as i32);
        let x1 = x1.clamp(x0, self.width as i32);
        let y0 = y0.max(0);
        let y1 = y1.min(self.height as i32);
        for y in y0..y1 {
            let row = y as usize * self.width;
            self.buf[row + x0 as usize..row + x1 as usize].fill(c);
        }
    }

    // Bresenham
    fn line(&mut self, from: (i32, i32), to: (i32, i32), c: u32) {
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let sx = if x < to.0 { 1 } else { -1 };
        let sy = if y < to.1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.put(x, y, c);
            if (x, y) == to {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }
}

fn draw_column(
    target: &mut Target,
    xs: std::ops::Range<usize>,
    ray: &Ray,
    depth: &DepthScale,
    assets: &impl SliceProvider,
) {
    let (Some(hit), Some(plane_dist)) = (ray.hit(), ray.plane_dist()) else {
        return;
    };
    let inv = depth.inverse_depth(plane_dist);
    if inv <= 0.0 {
        return;
    }

    let h = target.height as f32;
    let slice_h = depth.wall_scale(inv) * h;
    let top = (h - slice_h) * 0.5;
    let y0 = top.max(0.0) as usize;
    let y1 = ((top + slice_h).ceil() as usize).min(target.height);

    let texels = assets.wall_slice(hit);
    let tint = (inv.min(1.0) * 255.0) as u8;
    let flat = fallback_color(hit.axis, inv);

    for y in y0..y1 {
        let color = match texels {
            Some(col) if !col.is_empty() => {
                let v = (y as f32 + 0.5 - top) / slice_h;
                let ty = ((v * col.len() as f32) as usize).min(col.len() - 1);
                modulate(col[ty], tint)
            }
            _ => flat,
        };
        let row = y * target.width;
        target.buf[row + xs.start..row + xs.end].fill(color);
    }
}

/// Bottom-aligned with the floor line of a wall at the same depth.
fn draw_sprite(target: &mut Target, entity: &Entity, assets: &impl SliceProvider) {
    let Some(p) = entity.projection() else {
        return;
    };
    if !p.is_visible() {
        return;
    }

    let h = target.height as f32;
    let wall_h = p.scale * h;
    let sprite_h = wall_h * entity.kind.relative_height();
    if sprite_h < 1.0 {
        return;
    }
    let bottom = h * 0.5 + wall_h * 0.5;
    let top = bottom - sprite_h;
    let tint = (p.inv_depth.max(0.0).sqrt() * 255.0) as u8;

    let texture = assets.sprite(entity.kind);
    let aspect = texture.map_or(1.0, |t| t.width() as f32 / t.height() as f32);
    let sprite_w = sprite_h * aspect;
    let left = p.screen_fraction * target.width as f32 - sprite_w * 0.5;

    let x0 = left.max(0.0) as usize;
    let x1 = ((left + sprite_w).ceil().max(0.0) as usize).min(target.width);
    let y0 = top.max(0.0) as usize;
    let y1 = (bottom.ceil().max(0.0) as usize).min(target.height);

    for y in y0..y1 {
        let v = (y as f32 + 0.5 - top) / sprite_h;
        let row = y * target.width;
        for x in x0..x1 {
            let texel = match texture {
                Some(t) => t.sample((x as f32 + 0.5 - left) / sprite_w, v),
                None => pack_rgb(255, 255, 255),
            };
            if texel != COLOR_KEY {
                target.buf[row + x] = modulate(texel, tint);
            }
        }
    }
}

const MAP_FLOOR: u32 = 0x0010_1010;
const MAP_WALL: u32 = 0x0090_5030;
const MAP_BLOCK: u32 = 0x0080_8090;
const MAP_RAY: u32 = 0x0030_6030;
const MAP_PLAYER: u32 = 0x00FF_E040;
const MAP_OBJECT: u32 = 0x00E0_3030;

/// Top-down overview in the top-left corner.
fn draw_minimap(target: &mut Target, scene: &Scene) {
    let grid = scene.grid;
    let extent = grid.world_size().max_element();
    if extent <= 0.0 {
        return;
    }
    let scale = MINIMAP_SIZE as f32 / extent;
    let to_map = |p: Vec2| ((p.x * scale) as i32, (p.y * scale) as i32);
    let cell = grid.cell_size() * scale;

    target.fill_rect(0, 0, MINIMAP_SIZE as i32, MINIMAP_SIZE as i32, MAP_FLOOR);
    for row in 0..grid.rows() as i32 {
        for col in 0..grid.cols() as i32 {
            let Some(wall) = grid.tile_at(col, row) else {
                continue;
            };
            let color = if wall == 2 { MAP_BLOCK } else { MAP_WALL };
            let (x0, y0) = ((col as f32 * cell) as i32, (row as f32 * cell) as i32);
            let (x1, y1) = (((col + 1) as f32 * cell) as i32, ((row + 1) as f32 * cell) as i32);
            target.fill_rect(x0, y0, x1, y1, color);
        }
    }

    let eye = scene.view.position();
    let reach = grid.cell_size() * scene.view.lens().max_depth as f32;
    for ray in scene.view.rays() {
        let end = ray
            .hit()
            .map_or(eye + ray.direction() * reach, |hit| hit.point);
        target.line(to_map(eye), to_map(end), MAP_RAY);
    }

    for entity in &scene.entities {
        let (x, y) = to_map(entity.pos());
        target.fill_rect(x - 1, y - 1, x + 2, y + 2, MAP_OBJECT);
    }
    let (x, y) = to_map(eye);
    target.fill_rect(x - 1, y - 1, x + 2, y + 2, MAP_PLAYER);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Texture;
    use crate::camera::Lens;
    use crate::entity::SpriteKind;
    use crate::scaler::unpack_rgb;
    use crate::world::WallId;

    const W: usize = 256;
    const H: usize = 128;

    /// No wall textures, optionally a solid white sprite.
    struct Stub {
        sprite: Option<Texture>,
    }

    impl SliceProvider for Stub {
        fn wall_texture(&self, _: WallId) -> Option<&Texture> {
            None
        }

        fn sprite(&self, _: SpriteKind) -> Option<&Texture> {
            self.sprite.as_ref()
        }
    }

    fn depth() -> DepthScale {
        DepthScale::new(32.0, 8, 0.2, 0.8)
    }

    fn view(grid: &Grid) -> Viewpoint {
        let mut view = Viewpoint::new(Vec2::new(150.0, 150.0), 0.0, Lens::default());
        view.update_rays(grid);
        view
    }

    fn render(scene: &Scene, assets: &impl SliceProvider) -> Vec<u32> {
        let mut buf = vec![0; W * H];
        render_frame(&mut buf, W, H, scene, assets);
        buf
    }

    #[test]
    fn empty_grid_is_background_only() {
        let grid = Grid::new(16, 16, 32.0);
        let view = view(&grid);
        let depth = depth();
        let scene = Scene {
            grid: &grid,
            view: &view,
            entities: Vec::new(),
            depth: &depth,
            minimap: false,
        };
        let buf = render(&scene, &Stub { sprite: None });

        let mut expected = vec![0; W * H];
        fill_mirrored_gradient(&mut expected, W, H, HORIZON, EDGE);
        assert_eq!(buf, expected);
    }

    #[test]
    fn untextured_wall_uses_axis_colour() {
        // straight ahead is the brick at cell (6, 4), struck on its west face
        let grid = Grid::demo(32.0);
        let view = view(&grid);
        let depth = depth();
        let scene = Scene {
            grid: &grid,
            view: &view,
            entities: Vec::new(),
            depth: &depth,
            minimap: false,
        };
        let buf = render(&scene, &Stub { sprite: None });

        let (r, g, b) = unpack_rgb(buf[H / 2 * W + W / 2]);
        assert!(r > g && g > 0, "expected orange, got {r} {g} {b}");
        assert_eq!(b, 0);
        // nearer walls are brighter
        assert_eq!(unpack_rgb(fallback_color(Axis::Horizontal, 1.0)), (255, 0, 0));
        assert_eq!(unpack_rgb(fallback_color(Axis::Vertical, 0.5)), (127, 64, 0));
    }

    #[test]
    fn sprite_in_front_of_wall_is_painted_over_it() {
        let grid = Grid::demo(32.0);
        let view = view(&grid);
        let depth = depth();
        let mut ghost = Entity::ghost(Vec2::new(180.0, 150.0));
        ghost.project(&view, &depth);
        let scene = Scene {
            grid: &grid,
            view: &view,
            entities: vec![&ghost],
            depth: &depth,
            minimap: false,
        };
        let assets = Stub {
            sprite: Some(Texture::from_fn(2, 2, |_, _| pack_rgb(255, 255, 255))),
        };
        let buf = render(&scene, &assets);

        // lower half of the sprite, tinted grey
        let (r, g, b) = unpack_rgb(buf[100 * W + W / 2]);
        assert_eq!((r, g), (b, b));
        assert!(b > 200);
        // above the sprite the wall shows through
        let (_, _, b) = unpack_rgb(buf[40 * W + W / 2]);
        assert_eq!(b, 0);
    }

    #[test]
    fn colour_keyed_texels_are_skipped() {
        let grid = Grid::new(16, 16, 32.0);
        let view = view(&grid);
        let depth = depth();
        let mut ghost = Entity::ghost(Vec2::new(180.0, 150.0));
        ghost.project(&view, &depth);
        let scene = Scene {
            grid: &grid,
            view: &view,
            entities: vec![&ghost],
            depth: &depth,
            minimap: false,
        };
        let assets = Stub {
            sprite: Some(Texture::from_fn(1, 1, |_, _| COLOR_KEY)),
        };
        let buf = render(&scene, &assets);

        let mut expected = vec![0; W * H];
        fill_mirrored_gradient(&mut expected, W, H, HORIZON, EDGE);
        assert_eq!(buf, expected);
    }

    #[test]
    fn minimap_shows_border_walls_and_player() {
        let grid = Grid::demo(32.0);
        let view = view(&grid);
        let depth = depth();
        let scene = Scene {
            grid: &grid,
            view: &view,
            entities: Vec::new(),
            depth: &depth,
            minimap: true,
        };
        let buf = render(&scene, &Stub { sprite: None });

        // 512 world units onto 128 pixels: one cell is 8 pixels
        assert_eq!(buf[2 * W + 2], MAP_BLOCK);
        assert_eq!(buf[2 * W + 10], MAP_WALL);
        assert_eq!(buf[20 * W + 20], MAP_FLOOR);
        assert_eq!(buf[37 * W + 37], MAP_PLAYER);
        // the middle ray runs east to the brick at x = 192
        assert_eq!(buf[37 * W + 42], MAP_RAY);
    }
}
