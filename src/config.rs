//! Engine settings, loadable from JSON.
//!
//! ```json
//! { "fov_degrees": 75, "ray_count": 256, "minimap": false }
//! ```
//!
//! Missing fields keep their defaults.

use std::f32::consts::PI;
use std::path::Path;

use anyhow::Context;
use glam::Vec2;
use serde::Deserialize;
use thiserror::Error;

use crate::camera::Lens;
use crate::projection::DepthScale;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ray_count must be at least 2, got {0}")]
    TooFewRays(usize),
    #[error("max_depth must be at least 1")]
    ZeroDepth,
    #[error("fov_degrees must be in (0, 180), got {0}")]
    FieldOfView(f32),
    #[error("height range must satisfy 0 <= min <= max, got {min}..{max}")]
    HeightRange { min: f32, max: f32 },
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub fov_degrees: f32,
    pub ray_count: usize,
    pub max_depth: u32,
    pub min_height: f32,
    pub max_height: f32,
    pub cell_size: f32,

    pub move_speed: f32,        // world units per second
    pub turn_speed: f32,        // radians per second
    pub mouse_sensitivity: f32, // radians per pixel
    pub bullet_speed: f32,      // world units per second
    pub fire_cooldown: f32,     // seconds

    pub window_width: u32,
    pub window_height: u32,
    pub internal_height: usize,
    pub minimap: bool,
    pub spawn: [f32; 2],
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 90.0,
            ray_count: 128,
            max_depth: 8,
            min_height: 0.2,
            max_height: 0.8,
            cell_size: 32.0,
            move_speed: 45.0,
            turn_speed: PI,
            mouse_sensitivity: PI / 512.0,
            bullet_speed: 90.0,
            fire_cooldown: 0.25,
            window_width: 768,
            window_height: 512,
            internal_height: 480,
            minimap: true,
            spawn: [150.0, 150.0],
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("load config: {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ray_count < 2 {
            return Err(ConfigError::TooFewRays(self.ray_count));
        }
        if self.max_depth < 1 {
            return Err(ConfigError::ZeroDepth);
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(ConfigError::FieldOfView(self.fov_degrees));
        }
        if !(self.min_height >= 0.0 && self.min_height <= self.max_height) {
            return Err(ConfigError::HeightRange {
                min: self.min_height,
                max: self.max_height,
            });
        }
        let positive = [
            ("cell_size", self.cell_size),
            ("move_speed", self.move_speed),
            ("turn_speed", self.turn_speed),
            ("mouse_sensitivity", self.mouse_sensitivity),
            ("bullet_speed", self.bullet_speed),
            ("window_width", self.window_width as f32),
            ("window_height", self.window_height as f32),
            ("internal_height", self.internal_height as f32),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        if !(self.fire_cooldown >= 0.0) {
            return Err(ConfigError::NotPositive {
                field: "fire_cooldown",
                value: self.fire_cooldown,
            });
        }
        Ok(())
    }

    pub fn lens(&self) -> Lens {
        Lens {
            fov: self.fov_degrees.to_radians(),
            ray_count: self.ray_count,
            max_depth: self.max_depth,
        }
    }

    pub fn depth_scale(&self) -> DepthScale {
        DepthScale::new(self.cell_size, self.max_depth, self.min_height, self.max_height)
    }

    pub fn spawn(&self) -> Vec2 {
        Vec2::from(self.spawn)
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.lens().ray_count, 128);
        assert_relative_eq!(config.lens().fov, FRAC_PI_2);
        assert_relative_eq!(config.depth_scale().far_clip, 256.0);
        assert_eq!(config.spawn(), Vec2::new(150.0, 150.0));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json_str(r#"{ "ray_count": 64, "minimap": false }"#).unwrap();
        assert_eq!(config.ray_count, 64);
        assert!(!config.minimap);
        assert_eq!(config.max_depth, 8);
        assert_eq!(config.window_width, 768);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "ray_count": 1 }"#),
            Err(ConfigError::TooFewRays(1))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "max_depth": 0 }"#),
            Err(ConfigError::ZeroDepth)
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "fov_degrees": 180 }"#),
            Err(ConfigError::FieldOfView(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "min_height": 0.9 }"#),
            Err(ConfigError::HeightRange { .. })
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "cell_size": 0 }"#),
            Err(ConfigError::NotPositive { field: "cell_size", .. })
        ));
        assert!(matches!(
            EngineConfig::from_json_str("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = EngineConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.json"));
    }
}
