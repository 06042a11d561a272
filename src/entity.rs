use glam::Vec2;

use crate::body::Body;
use crate::camera::Viewpoint;
use crate::projection::{DepthScale, Projection};
use crate::world::Grid;

/// Which sprite an entity is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteKind {
    Ghost,
    Bullet,
}

impl SpriteKind {
    pub fn name(self) -> &'static str {
        match self {
            SpriteKind::Ghost => "ghost",
            SpriteKind::Bullet => "bullet",
        }
    }

    /// Sprite height relative to a wall slice at the same depth.
    pub fn relative_height(self) -> f32 {
        match self {
            SpriteKind::Ghost => 0.6,
            SpriteKind::Bullet => 0.12,
        }
    }
}

/// A map object or projectile: a body plus this frame's projection.
#[derive(Debug, Clone)]
pub struct Entity {
    pub kind: SpriteKind,
    pub body: Body,
    pub velocity: Vec2, // world units per second
    pub collide_walls: bool,
    projection: Option<Projection>,
}

impl Entity {
    pub fn new(kind: SpriteKind, pos: Vec2, size: Vec2) -> Self {
        Self {
            kind,
            body: Body::new(pos, size),
            velocity: Vec2::ZERO,
            collide_walls: true,
            projection: None,
        }
    }

    pub fn ghost(pos: Vec2) -> Self {
        Self::new(SpriteKind::Ghost, pos, Vec2::splat(8.0))
    }

    /// Projectile travelling along `heading` at `speed` units per second.
    pub fn bullet(pos: Vec2, heading: f32, speed: f32) -> Self {
        let mut bullet = Self::new(SpriteKind::Bullet, pos, Vec2::splat(12.0));
        bullet.velocity = Vec2::from_angle(heading) * speed;
        bullet
    }

    pub fn pos(&self) -> Vec2 {
        self.body.pos
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    /// Advances by `dt` seconds. Returns true when a wall blocked the move.
    pub fn advance(&mut self, grid: &Grid, dt: f32) -> bool {
        if self.velocity == Vec2::ZERO {
            return false;
        }
        self.body.vel = self.velocity * dt;
        if self.collide_walls {
            self.body.move_step(grid)
        } else {
            self.body.move_free();
            false
        }
    }

    /// Recomputes where this entity lands on screen.
    pub fn project(&mut self, view: &Viewpoint, depth: &DepthScale) {
        self.projection = view.project(self.body.pos, depth);
    }

    /// `advance` followed by `project`.
    pub fn update(&mut self, grid: &Grid, view: &Viewpoint, depth: &DepthScale, dt: f32) -> bool {
        let blocked = self.advance(grid, dt);
        self.project(view, depth);
        blocked
    }
}
