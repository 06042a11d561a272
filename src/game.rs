//! One simulation step per frame: input, movement, ray fan, entities.

use glam::Vec2;
use log::{debug, warn};

use crate::camera::Viewpoint;
use crate::config::EngineConfig;
use crate::entity::Entity;
use crate::input::Intent;
use crate::projection::DepthScale;
use crate::renderer::Scene;
use crate::world::Grid;

#[derive(Debug, Clone, Copy)]
struct Tuning {
    move_speed: f32,
    turn_speed: f32,
    mouse_sensitivity: f32,
    bullet_speed: f32,
    fire_cooldown: f32,
    minimap: bool,
}

pub struct Game {
    grid: Grid,
    view: Viewpoint,
    objects: Vec<Entity>,
    projectiles: Vec<Entity>,
    depth: DepthScale,
    tuning: Tuning,
    cooldown: f32, // seconds until the next shot is allowed
}

impl Game {
    pub fn new(grid: Grid, config: &EngineConfig) -> Self {
        let spawn = config.spawn();
        if !grid.in_bounds(spawn.x, spawn.y) || grid.wall_at_point(spawn).is_some() {
            warn!("spawn point {spawn} is outside the map or inside a wall");
        }
        let mut view = Viewpoint::new(spawn, 0.0, config.lens());
        view.update_rays(&grid);

        Self {
            grid,
            view,
            objects: Vec::new(),
            projectiles: Vec::new(),
            depth: config.depth_scale(),
            tuning: Tuning {
                move_speed: config.move_speed,
                turn_speed: config.turn_speed,
                mouse_sensitivity: config.mouse_sensitivity,
                bullet_speed: config.bullet_speed,
                fire_cooldown: config.fire_cooldown,
                minimap: config.minimap,
            },
            cooldown: 0.0,
        }
    }

    /// Places a stationary object. Returns false if the point is
    /// off the map or inside a wall.
    pub fn add_object(&mut self, mut entity: Entity) -> bool {
        let pos = entity.pos();
        if !self.grid.in_bounds(pos.x, pos.y) || self.grid.wall_at_point(pos).is_some() {
            return false;
        }
        entity.project(&self.view, &self.depth);
        self.objects.push(entity);
        true
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn view(&self) -> &Viewpoint {
        &self.view
    }

    pub fn objects(&self) -> &[Entity] {
        &self.objects
    }

    pub fn projectiles(&self) -> &[Entity] {
        &self.projectiles
    }

    pub fn depth(&self) -> &DepthScale {
        &self.depth
    }

    /// Advances the world by `dt` seconds.
    pub fn tick(&mut self, intent: &Intent, dt: f32) {
        let t = self.tuning;
        let turn = intent.turn * t.turn_speed * dt + intent.look * t.mouse_sensitivity;
        if turn != 0.0 {
            self.view.turn(turn);
        }

        // normalise diagonal speed
        let mut wish = Vec2::new(intent.forward, intent.strafe);
        if wish != Vec2::ZERO {
            wish = wish.normalize();
            self.view.set_velocity(wish.x, wish.y, t.move_speed * dt);
            self.view.step(&self.grid);
        }
        self.view.update_rays(&self.grid);

        self.cooldown = (self.cooldown - dt).max(0.0);
        if intent.fire {
            if self.cooldown > 0.0 {
                debug!("fire ignored, {:.2}s cooldown left", self.cooldown);
            } else {
                let bullet = Entity::bullet(self.view.position(), self.view.heading(), t.bullet_speed);
                self.projectiles.push(bullet);
                self.cooldown = t.fire_cooldown;
            }
        }

        let (grid, view, depth) = (&self.grid, &self.view, &self.depth);
        for object in &mut self.objects {
            object.update(grid, view, depth, dt);
        }
        self.projectiles.retain_mut(|bullet| {
            let blocked = bullet.update(grid, view, depth, dt);
            let pos = bullet.pos();
            !blocked && grid.in_bounds(pos.x, pos.y)
        });
    }

    /// Borrowed view of everything the renderer paints this frame.
    pub fn scene(&self) -> Scene<'_> {
        Scene {
            grid: &self.grid,
            view: &self.view,
            entities: self.objects.iter().chain(&self.projectiles).collect(),
            depth: &self.depth,
            minimap: self.tuning.minimap,
        }
    }
}
