//! Wall textures and sprites, owned by the caller and handed to the
//! renderer. Nothing here is global.

use std::collections::HashMap;

use crate::entity::SpriteKind;
use crate::ray::RayHit;
use crate::scaler::{COLOR_KEY, pack_rgb};
use crate::world::WallId;

/// Column-major image, so a wall slice is one contiguous run of texels.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    width: usize,
    height: usize,
    texels: Vec<u32>, // index = x * height + y
}

impl Texture {
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> u32) -> Self {
        assert!(width > 0 && height > 0, "empty texture");
        let mut texels = Vec::with_capacity(width * height);
        for x in 0..width {
            for y in 0..height {
                texels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            texels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// One vertical slice, top to bottom.
    #[inline]
    pub fn column(&self, x: usize) -> &[u32] {
        let x = x.min(self.width - 1);
        &self.texels[x * self.height..(x + 1) * self.height]
    }

    /// Nearest texel for normalised coordinates.
    #[inline]
    pub fn sample(&self, u: f32, v: f32) -> u32 {
        let x = ((u * self.width as f32) as usize).min(self.width - 1);
        let y = ((v * self.height as f32) as usize).min(self.height - 1);
        self.texels[x * self.height + y]
    }
}

/// Source of the pixels the renderer paints.
pub trait SliceProvider {
    fn wall_texture(&self, wall: WallId) -> Option<&Texture>;

    fn sprite(&self, kind: SpriteKind) -> Option<&Texture>;

    /// The texture column for a ray hit, or None when the wall id has no
    /// texture.
    fn wall_slice(&self, hit: &RayHit) -> Option<&[u32]> {
        let texture = self.wall_texture(hit.wall)?;
        Some(texture.column(hit.slice_index(texture.width())))
    }
}

#[derive(Debug, Default, Clone)]
pub struct AssetRegistry {
    walls: HashMap<WallId, Texture>,
    sprites: HashMap<SpriteKind, Texture>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bricks for wall 1, stone blocks for wall 2, and both sprites.
    pub fn procedural() -> Self {
        let mut assets = Self::new();
        assets.insert_wall(1, brick_texture(64));
        assets.insert_wall(2, block_texture(64));
        assets.insert_sprite(SpriteKind::Ghost, ghost_sprite(32));
        assets.insert_sprite(SpriteKind::Bullet, bullet_sprite(8));
        assets
    }

    pub fn insert_wall(&mut self, wall: WallId, texture: Texture) {
        self.walls.insert(wall, texture);
    }

    pub fn insert_sprite(&mut self, kind: SpriteKind, texture: Texture) {
        self.sprites.insert(kind, texture);
    }

    pub fn wall_count(&self) -> usize {
        self.walls.len()
    }
}

impl SliceProvider for AssetRegistry {
    fn wall_texture(&self, wall: WallId) -> Option<&Texture> {
        self.walls.get(&wall)
    }

    fn sprite(&self, kind: SpriteKind) -> Option<&Texture> {
        self.sprites.get(&kind)
    }
}

// cheap integer hash for texel noise
fn noise(x: usize, y: usize) -> u8 {
    let mut h = (x as u32).wrapping_mul(0x9E37_79B1) ^ (y as u32).wrapping_mul(0x85EB_CA77);
    h ^= h >> 15;
    h = h.wrapping_mul(0xC2B2_AE3D);
    (h >> 24) as u8
}

fn brick_texture(size: usize) -> Texture {
    let course = size / 4;
    Texture::from_fn(size, size, |x, y| {
        let row = y / course;
        let shift = if row % 2 == 0 { 0 } else { size / 4 };
        let mortar = y % course == 0 || (x + shift) % (size / 2) == 0;
        let n = noise(x, y) / 8;
        if mortar {
            pack_rgb(150 + n, 150 + n, 140 + n)
        } else {
            pack_rgb(150 + n, 60 + n / 2, 40 + n / 2)
        }
    })
}

fn block_texture(size: usize) -> Texture {
    let edge = size / 16;
    Texture::from_fn(size, size, |x, y| {
        let n = noise(x, y) / 6;
        let lit = x < edge || y < edge;
        let shade = x >= size - edge || y >= size - edge;
        let base = if lit {
            170
        } else if shade {
            70
        } else {
            120
        };
        pack_rgb(base + n, base + n, base + 10 + n)
    })
}

fn ghost_sprite(size: usize) -> Texture {
    let r = size as f32 / 2.0;
    Texture::from_fn(size, size, |x, y| {
        let dx = x as f32 + 0.5 - r;
        let dy = y as f32 + 0.5 - r;
        // round head over a straight skirt with a ragged hem
        let head = dy < 0.0 && dx * dx + dy * dy < r * r;
        let body = dy >= 0.0 && dx.abs() < r && (y + 2 < size || x % 4 < 2);
        if !(head || body) {
            return COLOR_KEY;
        }
        let eye = (dy + r * 0.25).abs() < r * 0.15 && (dx.abs() - r * 0.35).abs() < r * 0.12;
        if eye {
            pack_rgb(20, 20, 40)
        } else {
            pack_rgb(230, 230, 255)
        }
    })
}

fn bullet_sprite(size: usize) -> Texture {
    let r = size as f32 / 2.0;
    Texture::from_fn(size, size, |x, y| {
        let dx = x as f32 + 0.5 - r;
        let dy = y as f32 + 0.5 - r;
        if dx * dx + dy * dy < r * r {
            pack_rgb(255, 220, 60)
        } else {
            COLOR_KEY
        }
    })
}
