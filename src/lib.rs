//! Tile-grid raycaster: wall columns from a ray fan, billboard sprites
//! placed with the same depth mapping, painted far to near.

pub mod assets;
pub mod body;
pub mod camera;
pub mod compositor;
pub mod config;
pub mod entity;
pub mod game;
pub mod input;
pub mod projection;
pub mod ray;
pub mod renderer;
pub mod scaler;
pub mod world;
