use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub path: String,
    pub scale: f32,
    pub rotation_offset_x: f32,
    pub rotation_offset_y: f32,
    pub rotation_offset_z: f32,
    pub position_offset_y: f32,
    /// Flat color applied to every vertex; `None` keeps the model's own colors.
    pub color: Option<[f32; 3]>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            path: String::new(),
            scale: 1.0,
            rotation_offset_x: 0.0,
            rotation_offset_y: 0.0,
            rotation_offset_z: 0.0,
            position_offset_y: 0.0,
            color: None,
        }
    }
}

/// Gameplay constants. Rates are per frame.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub road_width: f32,
    pub segment_length: f32,
    pub num_segments: usize,
    pub trees_per_segment: usize,
    pub tree_spread: f32,
    pub num_obstacles: usize,
    pub starting_lives: u32,

    pub max_speed: f32,
    pub min_speed: f32,
    pub acceleration: f32,
    pub braking: f32,
    pub speed_decay: f32,
    pub max_steering: f32,
    pub steering_rate: f32,
    pub steering_decay: f32,
    pub lateral_factor: f32,

    /// World units scrolled per unit of speed.
    pub scroll_factor: f32,
    /// Meters counted per unit of speed.
    pub distance_factor: f32,

    pub first_spawn_distance: f32,
    pub spawn_interval_min: f32,
    pub spawn_interval_max: f32,
    pub obstacle_height: f32,
    pub obstacle_depth: f32,
    pub obstacle_spawn_y: f32,

    pub vehicle_y: f32,
    pub camera_height: f32,
    pub camera_distance: f32,
    pub camera_fov_degrees: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            road_width: 30.0,
            segment_length: 20.0,
            num_segments: 20,
            trees_per_segment: 10,
            tree_spread: 10.0,
            num_obstacles: 35,
            starting_lives: 3,

            max_speed: 2.0,
            min_speed: -0.2,
            acceleration: 0.02,
            braking: 0.02,
            speed_decay: 0.01,
            max_steering: 0.7,
            steering_rate: 0.2,
            steering_decay: 0.02,
            lateral_factor: 0.8,

            scroll_factor: 2.0,
            distance_factor: 0.1,

            first_spawn_distance: 40.0,
            spawn_interval_min: 50.0,
            spawn_interval_max: 150.0,
            obstacle_height: 4.0,
            obstacle_depth: 2.0,
            obstacle_spawn_y: 3.0,

            vehicle_y: 1.0,
            camera_height: 10.0,
            camera_distance: 15.0,
            camera_fov_degrees: 75.0,
        }
    }
}

impl GameConfig {
    pub fn half_road_width(&self) -> f32 {
        self.road_width / 2.0
    }

    pub fn lane_width(&self) -> f32 {
        self.road_width / 3.0
    }

    /// Obstacles leave a one-unit gap on each side of their lane.
    pub fn obstacle_width(&self) -> f32 {
        self.lane_width() - 2.0
    }

    pub fn tree_count(&self) -> usize {
        self.num_segments * self.trees_per_segment
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason| Err(ConfigError::Invalid { field, reason });
        if self.road_width <= 0.0 {
            return invalid("road_width", "must be positive");
        }
        if self.segment_length <= 0.0 {
            return invalid("segment_length", "must be positive");
        }
        if self.num_segments < 2 {
            return invalid("num_segments", "need at least two segments to recycle");
        }
        if self.min_speed > 0.0 || self.max_speed < 0.0 {
            return invalid("min_speed", "speed range must contain zero");
        }
        if self.max_steering < 0.0 {
            return invalid("max_steering", "must not be negative");
        }
        if self.spawn_interval_min >= self.spawn_interval_max {
            return invalid("spawn_interval_min", "must be below spawn_interval_max");
        }
        if self.obstacle_width() <= 0.0 {
            return invalid("road_width", "lanes too narrow for obstacles");
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub car_model: ModelConfig,
    pub tree_model: ModelConfig,
    pub grass_texture: String,
    pub obstacle_texture: String,
    pub tuning: GameConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            car_model: ModelConfig {
                path: "/assets/models/car.glb".to_string(),
                scale: 1.25,
                rotation_offset_y: std::f32::consts::PI,
                color: Some([0.302, 0.059, 0.059]),
                ..ModelConfig::default()
            },
            tree_model: ModelConfig {
                path: "/assets/models/tree.glb".to_string(),
                scale: 0.32,
                color: Some([0.0, 0.392, 0.0]),
                ..ModelConfig::default()
            },
            grass_texture: "/assets/textures/grass.jpg".to_string(),
            obstacle_texture: "/assets/textures/brick_wall.png".to_string(),
            tuning: GameConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(text)?;
        config.tuning.validate()?;
        Ok(config)
    }
}
